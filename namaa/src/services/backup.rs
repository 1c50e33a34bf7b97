//! Backup service
//!
//! Export, import and reset of everything a user owns. Backups are plain
//! JSON documents with optional `tasks`, `prayers`, `quran`, `lessons`,
//! `reminders` and `settings` fields. Imports are validated as a whole
//! before any slot is written and are then applied in one transaction.

use crate::database::{
    LessonDay, PrayerDay, QuranGoal, Reminder, SlotWrite, Task, UserSettings, Validate,
};
use crate::error::{AppError, Result};
use crate::storage::codec::encode;
use crate::storage::{Collection, RecordStore, StorageKey, USER_COLLECTIONS};
use chrono::Local;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Everything a user owns, as written to a backup file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupSnapshot {
    pub tasks: Vec<Task>,
    pub prayers: Vec<PrayerDay>,
    pub quran: Option<QuranGoal>,
    pub lessons: Vec<LessonDay>,
    pub reminders: Vec<Reminder>,
    pub settings: UserSettings,
}

#[derive(Clone)]
pub struct BackupService {
    store: RecordStore,
}

impl BackupService {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    fn key(collection: Collection, user_id: &str) -> Result<StorageKey> {
        StorageKey::for_user(collection, user_id)
    }

    pub async fn export_all(&self, user_id: &str) -> Result<BackupSnapshot> {
        let snapshot = BackupSnapshot {
            tasks: self.store.load_list(&Self::key(Collection::Tasks, user_id)?).await?,
            prayers: self.store.load_list(&Self::key(Collection::Prayers, user_id)?).await?,
            quran: self.store.load(&Self::key(Collection::Quran, user_id)?).await?,
            lessons: self.store.load_list(&Self::key(Collection::Lessons, user_id)?).await?,
            reminders: self
                .store
                .load_list(&Self::key(Collection::Reminders, user_id)?)
                .await?,
            settings: self
                .store
                .load(&Self::key(Collection::Settings, user_id)?)
                .await?
                .unwrap_or_else(|| UserSettings::defaults_for(user_id)),
        };

        tracing::info!(
            "Exported {} tasks, {} prayer days, {} lessons, {} reminders for user {}",
            snapshot.tasks.len(),
            snapshot.prayers.len(),
            snapshot.lessons.len(),
            snapshot.reminders.len(),
            user_id
        );
        Ok(snapshot)
    }

    /// Import a backup document. Returns the collections that were replaced.
    ///
    /// Fields missing from the document leave their collection untouched.
    /// Records are re-owned by `user_id`.
    pub async fn import_all(&self, user_id: &str, payload: &Value) -> Result<Vec<Collection>> {
        let fields = payload
            .as_object()
            .ok_or_else(|| AppError::InvalidImport("backup must be a JSON object".to_string()))?;

        let mut writes = Vec::new();

        if let Some(mut tasks) = field::<Vec<Task>>(fields, "tasks")? {
            tasks.iter_mut().for_each(|t| t.user_id = user_id.to_string());
            writes.push((Collection::Tasks, encode(&tasks)?));
        }

        if let Some(mut prayers) = prayers_field(fields)? {
            prayers.iter_mut().for_each(|p| p.user_id = user_id.to_string());
            writes.push((Collection::Prayers, encode(&prayers)?));
        }

        if let Some(mut goal) = field::<QuranGoal>(fields, "quran")? {
            goal.user_id = user_id.to_string();
            writes.push((Collection::Quran, encode(&goal)?));
        }

        if let Some(mut lessons) = field::<Vec<LessonDay>>(fields, "lessons")? {
            lessons.iter_mut().for_each(|l| l.user_id = user_id.to_string());
            writes.push((Collection::Lessons, encode(&lessons)?));
        }

        if let Some(mut reminders) = field::<Vec<Reminder>>(fields, "reminders")? {
            reminders.iter_mut().for_each(|r| r.user_id = user_id.to_string());
            writes.push((Collection::Reminders, encode(&reminders)?));
        }

        if let Some(mut settings) = field::<UserSettings>(fields, "settings")? {
            settings.user_id = user_id.to_string();
            writes.push((Collection::Settings, encode(&settings)?));
        }

        let imported: Vec<Collection> = writes.iter().map(|(c, _)| *c).collect();
        let batch = writes
            .into_iter()
            .map(|(collection, text)| Ok((Self::key(collection, user_id)?, SlotWrite::Set(text))))
            .collect::<Result<Vec<_>>>()?;

        self.store.apply_batch(batch).await?;

        tracing::info!("Imported {:?} for user {}", imported, user_id);
        Ok(imported)
    }

    /// Import from backup text
    pub async fn import_json(&self, user_id: &str, text: &str) -> Result<Vec<Collection>> {
        let payload: Value = serde_json::from_str(text)
            .map_err(|e| AppError::InvalidImport(format!("not valid JSON: {}", e)))?;
        self.import_all(user_id, &payload).await
    }

    /// Delete every collection owned by the user. Quotes and other users are
    /// not touched.
    pub async fn reset_all(&self, user_id: &str) -> Result<()> {
        let batch = USER_COLLECTIONS
            .iter()
            .map(|c| Ok((Self::key(*c, user_id)?, SlotWrite::Remove)))
            .collect::<Result<Vec<_>>>()?;

        self.store.apply_batch(batch).await?;

        tracing::info!("Reset all data for user {}", user_id);
        Ok(())
    }

    /// Write `namaa-backup-YYYY-MM-DD.json` into `dir`
    pub async fn export_to_file(&self, user_id: &str, dir: &Path) -> Result<PathBuf> {
        fs::create_dir_all(dir).await?;

        let snapshot = self.export_all(user_id).await?;
        let file_name = format!("namaa-backup-{}.json", Local::now().format("%Y-%m-%d"));
        let path = dir.join(file_name);

        fs::write(&path, serde_json::to_string_pretty(&snapshot)?).await?;

        tracing::info!("Backup written to {:?}", path);
        Ok(path)
    }

    pub async fn import_from_file(&self, user_id: &str, path: &Path) -> Result<Vec<Collection>> {
        tracing::info!("Importing backup from {:?}", path);
        let text = fs::read_to_string(path).await?;
        self.import_json(user_id, &text).await
    }
}

/// Decode an optional top-level field. `null` counts as absent.
fn field<T>(fields: &Map<String, Value>, name: &str) -> Result<Option<T>>
where
    T: DeserializeOwned + Validate,
{
    match fields.get(name) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => decode_field(name, value.clone()).map(Some),
    }
}

/// Prayers may also arrive as a string holding the encoded list
fn prayers_field(fields: &Map<String, Value>) -> Result<Option<Vec<PrayerDay>>> {
    match fields.get("prayers") {
        Some(Value::String(text)) => {
            let value: Value = serde_json::from_str(text)
                .map_err(|e| AppError::InvalidImport(format!("prayers: {}", e)))?;
            decode_field("prayers", value).map(Some)
        }
        _ => field(fields, "prayers"),
    }
}

fn decode_field<T>(name: &str, value: Value) -> Result<T>
where
    T: DeserializeOwned + Validate,
{
    let decoded: T = serde_json::from_value(value)
        .map_err(|e| AppError::InvalidImport(format!("{}: {}", name, e)))?;
    decoded
        .validate()
        .map_err(|e| AppError::InvalidImport(format!("{}: {}", name, e)))?;
    Ok(decoded)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{NewTask, Prayer, PrayerUpdate, Theme};
    use crate::services::{
        test_store, PrayersService, QuotesService, SettingsService, TasksService,
    };
    use chrono::NaiveDate;
    use serde_json::json;
    use tempfile::TempDir;

    struct Fixture {
        backup: BackupService,
        tasks: TasksService,
        prayers: PrayersService,
        settings: SettingsService,
        quotes: QuotesService,
    }

    async fn fixture() -> Fixture {
        let store = test_store().await;
        Fixture {
            backup: BackupService::new(store.clone()),
            tasks: TasksService::new(store.clone()),
            prayers: PrayersService::new(store.clone()),
            settings: SettingsService::new(store.clone()),
            quotes: QuotesService::new(store),
        }
    }

    fn task(title: &str) -> NewTask {
        NewTask {
            title: title.to_string(),
            ..NewTask::default()
        }
    }

    #[tokio::test]
    async fn test_export_of_empty_user() {
        let f = fixture().await;

        let snapshot = f.backup.export_all("u1").await.unwrap();
        assert!(snapshot.tasks.is_empty());
        assert_eq!(snapshot.quran, None);
        assert_eq!(snapshot.settings, UserSettings::defaults_for("u1"));

        let json = serde_json::to_value(&snapshot).unwrap();
        assert!(json["quran"].is_null());
    }

    #[tokio::test]
    async fn test_export_import_restores_collections() {
        let f = fixture().await;
        f.tasks.add("u1", task("Read")).await.unwrap();
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        f.prayers
            .update("u1", date, PrayerUpdate::mark(Prayer::Fajr, true))
            .await
            .unwrap();

        let snapshot = f.backup.export_all("u1").await.unwrap();
        f.backup.reset_all("u1").await.unwrap();
        assert!(f.tasks.list("u1").await.unwrap().is_empty());

        let payload = serde_json::to_value(&snapshot).unwrap();
        f.backup.import_all("u1", &payload).await.unwrap();

        assert_eq!(f.backup.export_all("u1").await.unwrap(), snapshot);
    }

    #[tokio::test]
    async fn test_partial_import_leaves_other_collections() {
        let f = fixture().await;
        let existing = f.tasks.add("u1", task("Keep me")).await.unwrap();

        let imported = f
            .backup
            .import_all("u1", &json!({"settings": {"theme": "dark"}}))
            .await
            .unwrap();

        assert_eq!(imported, vec![Collection::Settings]);
        assert_eq!(f.settings.get("u1").await.unwrap().theme, Theme::Dark);
        assert_eq!(f.tasks.list("u1").await.unwrap(), vec![existing]);
    }

    #[tokio::test]
    async fn test_invalid_import_writes_nothing() {
        let f = fixture().await;
        f.tasks.add("u1", task("Keep me")).await.unwrap();

        let payload = json!({
            "settings": {"theme": "dark"},
            "tasks": {"not": "a list"}
        });
        let err = f.backup.import_all("u1", &payload).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidImport(_)));

        assert_eq!(f.tasks.list("u1").await.unwrap().len(), 1);
        assert_eq!(f.settings.get("u1").await.unwrap().theme, Theme::Light);
    }

    #[tokio::test]
    async fn test_non_object_payload_rejected() {
        let f = fixture().await;
        assert!(matches!(
            f.backup.import_all("u1", &json!([1, 2])).await,
            Err(AppError::InvalidImport(_))
        ));
        assert!(matches!(
            f.backup.import_json("u1", "{oops").await,
            Err(AppError::InvalidImport(_))
        ));
    }

    #[tokio::test]
    async fn test_import_restamps_owner_and_accepts_string_prayers() {
        let f = fixture().await;
        let prayers = r#"[{"id":"p1","userId":"someone","date":"2024-01-01",
            "fajr":true,"dhuhr":false,"asr":false,"maghrib":false,"isha":false}]"#;

        f.backup
            .import_all("u1", &json!({"prayers": prayers, "quran": null}))
            .await
            .unwrap();

        let days = f.prayers.list("u1").await.unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].user_id, "u1");
        assert!(days[0].fajr);
    }

    #[tokio::test]
    async fn test_reset_is_scoped_to_user() {
        let f = fixture().await;
        f.tasks.add("u1", task("mine")).await.unwrap();
        f.tasks.add("u2", task("theirs")).await.unwrap();
        f.quotes
            .add(crate::database::NewQuote::custom("shared"))
            .await
            .unwrap();

        f.backup.reset_all("u1").await.unwrap();

        assert!(f.tasks.list("u1").await.unwrap().is_empty());
        assert_eq!(f.tasks.list("u2").await.unwrap().len(), 1);
        assert_eq!(f.quotes.list().await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_file_round_trip() {
        let f = fixture().await;
        let temp_dir = TempDir::new().unwrap();
        f.tasks.add("u1", task("Read")).await.unwrap();

        let path = f.backup.export_to_file("u1", temp_dir.path()).await.unwrap();
        let name = path.file_name().unwrap().to_string_lossy().to_string();
        assert!(name.starts_with("namaa-backup-") && name.ends_with(".json"));

        f.backup.reset_all("u1").await.unwrap();
        f.backup.import_from_file("u1", &path).await.unwrap();
        assert_eq!(f.tasks.list("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_import_with_duplicate_prayer_dates_rejected() {
        let f = fixture().await;
        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        f.prayers
            .update("u1", date, PrayerUpdate::mark(Prayer::Isha, true))
            .await
            .unwrap();
        let before = f.prayers.list("u1").await.unwrap();

        let day = |id: &str, fajr: bool| {
            json!({"id": id, "userId": "u1", "date": "2024-01-01", "fajr": fajr,
                   "dhuhr": false, "asr": false, "maghrib": false, "isha": false})
        };
        let payload = json!({"prayers": [day("a", true), day("b", false)]});

        let err = f.backup.import_all("u1", &payload).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidImport(_)));
        assert_eq!(f.prayers.list("u1").await.unwrap(), before);
    }

    #[tokio::test]
    async fn test_import_with_duplicate_task_ids_rejected() {
        let f = fixture().await;
        let existing = f.tasks.add("u1", task("Keep me")).await.unwrap();

        let item = |title: &str| {
            json!({"id": "same", "userId": "u1", "title": title, "completed": false,
                   "priority": "medium", "createdAt": "2024-01-01T10:00:00Z"})
        };
        let payload = json!({"tasks": [item("a"), item("b")]});

        let err = f.backup.import_all("u1", &payload).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidImport(_)));
        assert_eq!(f.tasks.list("u1").await.unwrap(), vec![existing]);
    }

    #[tokio::test]
    async fn test_import_with_duplicate_reminder_or_lesson_ids_rejected() {
        let f = fixture().await;

        let reminder = json!({"id": "r", "userId": "u1", "title": "Fajr", "time": "05:00",
                              "repeat": "daily", "type": "prayer", "enabled": true});
        let lesson = json!({"id": "l", "userId": "u1", "date": "2024-01-01", "focus": 3,
                            "interaction": 3, "homework": 3, "mistakeReduction": 3,
                            "respectDiscipline": 3});

        for payload in [
            json!({"reminders": [reminder.clone(), reminder]}),
            json!({"lessons": [lesson.clone(), lesson]}),
        ] {
            let err = f.backup.import_all("u1", &payload).await.unwrap_err();
            assert!(matches!(err, AppError::InvalidImport(_)));
        }
        assert!(f.backup.export_all("u1").await.unwrap().reminders.is_empty());
        assert!(f.backup.export_all("u1").await.unwrap().lessons.is_empty());
    }
}
