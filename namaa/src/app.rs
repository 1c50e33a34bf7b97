//! Application state and initialization
//!
//! All services are built here on one shared record store and handed out
//! through `AppState`.

use crate::config::{BACKUPS_DIR_NAME, DB_FILE_NAME};
use crate::database::{create_memory_pool, create_pool, Repository};
use crate::error::Result;
use crate::services::{
    AuthService, BackupService, FocusLog, LessonsService, PrayersService, ProgressService,
    QuotesService, QuranService, RemindersService, SettingsService, TasksService,
};
use crate::storage::RecordStore;
use sqlx::SqlitePool;
use std::path::{Path, PathBuf};

/// Central application state holding all services
#[derive(Clone)]
pub struct AppState {
    pub app_data_dir: Option<PathBuf>,
    pub auth: AuthService,
    pub tasks: TasksService,
    pub prayers: PrayersService,
    pub quran: QuranService,
    pub lessons: LessonsService,
    pub reminders: RemindersService,
    pub quotes: QuotesService,
    pub settings: SettingsService,
    pub backup: BackupService,
    pub progress: ProgressService,
    pub focus_log: FocusLog,
}

impl AppState {
    pub fn new(pool: SqlitePool, app_data_dir: Option<PathBuf>) -> Self {
        let store = RecordStore::new(Repository::new(pool));

        Self {
            app_data_dir,
            auth: AuthService::new(store.clone()),
            tasks: TasksService::new(store.clone()),
            prayers: PrayersService::new(store.clone()),
            quran: QuranService::new(store.clone()),
            lessons: LessonsService::new(store.clone()),
            reminders: RemindersService::new(store.clone()),
            quotes: QuotesService::new(store.clone()),
            settings: SettingsService::new(store.clone()),
            backup: BackupService::new(store.clone()),
            progress: ProgressService::new(store.clone()),
            focus_log: FocusLog::new(store),
        }
    }

    /// State backed by a private in-memory database
    pub async fn in_memory() -> Result<Self> {
        Ok(Self::new(create_memory_pool().await?, None))
    }

    /// Where backup files are written by default
    pub fn backups_dir(&self) -> PathBuf {
        match &self.app_data_dir {
            Some(dir) => dir.join(BACKUPS_DIR_NAME),
            None => PathBuf::from("."),
        }
    }
}

/// Application setup - called once on startup
pub async fn setup(app_data_dir: &Path) -> Result<AppState> {
    tracing::info!("Initializing application");
    tracing::info!("App data directory: {:?}", app_data_dir);

    std::fs::create_dir_all(app_data_dir)?;
    std::fs::create_dir_all(app_data_dir.join(BACKUPS_DIR_NAME))?;

    let pool = create_pool(&app_data_dir.join(DB_FILE_NAME)).await?;
    let state = AppState::new(pool, Some(app_data_dir.to_path_buf()));

    tracing::info!("Application initialized successfully");

    Ok(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_setup_creates_layout() {
        let temp_dir = TempDir::new().unwrap();
        let data_dir = temp_dir.path().join("namaa");

        let state = setup(&data_dir).await.unwrap();

        assert!(data_dir.join(DB_FILE_NAME).exists());
        assert!(data_dir.join(BACKUPS_DIR_NAME).is_dir());
        assert_eq!(state.backups_dir(), data_dir.join(BACKUPS_DIR_NAME));
    }

    #[tokio::test]
    async fn test_data_survives_reopen() {
        let temp_dir = TempDir::new().unwrap();

        {
            let state = setup(temp_dir.path()).await.unwrap();
            state.auth.signup("amina", "pw", "Amina").await.unwrap();
        }

        let state = setup(temp_dir.path()).await.unwrap();
        let user = state.auth.current_user().await.unwrap().unwrap();
        assert_eq!(user.username, "amina");
    }
}
