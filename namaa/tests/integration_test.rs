//! Integration tests for Namaa
//!
//! These tests drive `AppState` end-to-end against an on-disk database:
//! - Per-user collections and isolation
//! - Backup export, import and reset
//! - Corruption handling

use chrono::NaiveDate;
use namaa::app::{setup, AppState};
use namaa::database::{
    NewLessonDay, NewQuranGoal, NewReminder, NewTask, Prayer, PrayerUpdate, Priority,
    QuranGoalType, Rating, ReminderKind, Repeat, Theme, parse_hhmm,
};
use namaa::error::AppError;
use namaa::services::TaskFilter;
use serde_json::json;
use tempfile::TempDir;

/// Helper to create an app state in a fresh data directory
async fn create_test_app() -> (AppState, TempDir) {
    let temp_dir = TempDir::new().unwrap();
    let state = setup(temp_dir.path()).await.unwrap();
    (state, temp_dir)
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

#[tokio::test]
async fn test_add_high_priority_task() {
    let (state, _temp) = create_test_app().await;
    let user = state.auth.signup("amina", "pw", "Amina").await.unwrap().unwrap();

    state
        .tasks
        .add(
            &user.id,
            NewTask {
                title: "Pray".to_string(),
                priority: Priority::High,
                ..NewTask::default()
            },
        )
        .await
        .unwrap();

    let tasks = state.tasks.list(&user.id).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Pray");
    assert_eq!(tasks[0].priority, Priority::High);
    assert!(!tasks[0].completed);
    assert_eq!(tasks[0].user_id, user.id);
}

#[tokio::test]
async fn test_prayer_update_without_prior_day() {
    let (state, _temp) = create_test_app().await;

    let day = state
        .prayers
        .update("u1", date(2024, 1, 1), PrayerUpdate::mark(Prayer::Fajr, true))
        .await
        .unwrap();

    assert!(day.fajr);
    assert!(!day.dhuhr && !day.asr && !day.maghrib && !day.isha);
    assert_eq!(state.prayers.list("u1").await.unwrap(), vec![day]);
}

#[tokio::test]
async fn test_partial_import_keeps_tasks() {
    let (state, _temp) = create_test_app().await;
    let task = state
        .tasks
        .add(
            "u1",
            NewTask {
                title: "Existing".to_string(),
                ..NewTask::default()
            },
        )
        .await
        .unwrap();

    state
        .backup
        .import_all("u1", &json!({"settings": {"theme": "dark"}}))
        .await
        .unwrap();

    assert_eq!(state.settings.get("u1").await.unwrap().theme, Theme::Dark);
    assert_eq!(state.tasks.list("u1").await.unwrap(), vec![task]);
}

#[tokio::test]
async fn test_rejected_import_mutates_nothing() {
    let (state, _temp) = create_test_app().await;
    state
        .tasks
        .add(
            "u1",
            NewTask {
                title: "Existing".to_string(),
                ..NewTask::default()
            },
        )
        .await
        .unwrap();
    let before = state.backup.export_all("u1").await.unwrap();

    let result = state
        .backup
        .import_all(
            "u1",
            &json!({
                "reminders": [],
                "settings": {"theme": "dark"},
                "tasks": "not a list"
            }),
        )
        .await;

    assert!(matches!(result, Err(AppError::InvalidImport(_))));
    assert_eq!(state.backup.export_all("u1").await.unwrap(), before);
}

#[tokio::test]
async fn test_full_backup_round_trip_between_users() {
    let (state, temp) = create_test_app().await;

    state
        .tasks
        .add(
            "u1",
            NewTask {
                title: "Memorize".to_string(),
                due_date: Some(date(2024, 4, 1)),
                ..NewTask::default()
            },
        )
        .await
        .unwrap();
    state
        .quran
        .save(
            "u1",
            NewQuranGoal {
                goal_type: QuranGoalType::Hizb,
                quantity: 4,
            },
        )
        .await
        .unwrap();
    state.quran.toggle_progress("u1", 3).await.unwrap();
    state
        .lessons
        .add(
            "u1",
            NewLessonDay {
                date: date(2024, 4, 1),
                focus: Rating::try_from(5).unwrap(),
                interaction: Rating::default(),
                homework: Rating::default(),
                mistake_reduction: Rating::default(),
                respect_discipline: Rating::default(),
                tasks: vec!["surah al-mulk".to_string()],
            },
        )
        .await
        .unwrap();
    state
        .reminders
        .add(
            "u1",
            NewReminder {
                title: "Fajr".to_string(),
                time: parse_hhmm("05:10").unwrap(),
                repeat: Repeat::Daily,
                kind: ReminderKind::Prayer,
                enabled: true,
            },
        )
        .await
        .unwrap();

    let path = state
        .backup
        .export_to_file("u1", &temp.path().join("out"))
        .await
        .unwrap();
    state.backup.import_from_file("u2", &path).await.unwrap();

    let u1 = state.backup.export_all("u1").await.unwrap();
    let u2 = state.backup.export_all("u2").await.unwrap();

    assert_eq!(u2.tasks.len(), 1);
    assert_eq!(u2.tasks[0].title, u1.tasks[0].title);
    assert_eq!(u2.tasks[0].user_id, "u2");
    assert_eq!(u2.quran.as_ref().unwrap().progress, u1.quran.as_ref().unwrap().progress);
    assert_eq!(u2.lessons[0].tasks, vec!["surah al-mulk".to_string()]);
    assert_eq!(u2.reminders[0].time, parse_hhmm("05:10").unwrap());
    assert_eq!(u2.settings.user_id, "u2");
}

#[tokio::test]
async fn test_reset_only_touches_one_user() {
    let (state, _temp) = create_test_app().await;

    for user in ["u1", "u2"] {
        state
            .tasks
            .add(
                user,
                NewTask {
                    title: "t".to_string(),
                    ..NewTask::default()
                },
            )
            .await
            .unwrap();
        state
            .prayers
            .update(user, date(2024, 1, 1), PrayerUpdate::mark(Prayer::Isha, true))
            .await
            .unwrap();
    }
    state
        .quotes
        .add(namaa::database::NewQuote::custom("shared"))
        .await
        .unwrap();

    state.backup.reset_all("u1").await.unwrap();

    let u1 = state.backup.export_all("u1").await.unwrap();
    assert!(u1.tasks.is_empty());
    assert!(u1.prayers.is_empty());
    assert_eq!(u1.quran, None);

    let u2 = state.backup.export_all("u2").await.unwrap();
    assert_eq!(u2.tasks.len(), 1);
    assert_eq!(u2.prayers.len(), 1);
    assert_eq!(state.quotes.list().await.unwrap().len(), 5);
}

#[tokio::test]
async fn test_corrupted_slot_is_reported() {
    let (state, temp) = create_test_app().await;
    state
        .tasks
        .add(
            "u1",
            NewTask {
                title: "t".to_string(),
                ..NewTask::default()
            },
        )
        .await
        .unwrap();

    let pool = namaa::database::create_pool(&temp.path().join(namaa::config::DB_FILE_NAME))
        .await
        .unwrap();
    sqlx::query("UPDATE kv_items SET value = '{broken' WHERE key = 'tasks:u1'")
        .execute(&pool)
        .await
        .unwrap();

    match state.tasks.list("u1").await {
        Err(AppError::StorageCorruption { key, .. }) => assert_eq!(key, "tasks:u1"),
        other => panic!("expected corruption error, got {:?}", other.map(|t| t.len())),
    }

    // Other users and collections still work
    assert!(state.tasks.list("u2").await.unwrap().is_empty());
    assert!(state.reminders.list("u1").await.unwrap().is_empty());
}

#[tokio::test]
async fn test_filters_and_progress() {
    let (state, _temp) = create_test_app().await;
    let today = date(2024, 1, 3);

    for (title, due) in [("a", Some(today)), ("b", Some(date(2024, 1, 5))), ("c", None)] {
        state
            .tasks
            .add(
                "u1",
                NewTask {
                    title: title.to_string(),
                    due_date: due,
                    ..NewTask::default()
                },
            )
            .await
            .unwrap();
    }

    let due_today = state
        .tasks
        .list_filtered("u1", TaskFilter::Today, today)
        .await
        .unwrap();
    assert_eq!(due_today.len(), 1);

    let this_week = state
        .tasks
        .list_filtered("u1", TaskFilter::ThisWeek, today)
        .await
        .unwrap();
    assert_eq!(this_week.len(), 2);

    let week = state.progress.weekly_summary("u1", today).await.unwrap();
    assert_eq!(week.tasks_total, 2);
}

#[tokio::test]
async fn test_in_memory_state() {
    let state = AppState::in_memory().await.unwrap();
    assert!(state.auth.current_user().await.unwrap().is_none());
    assert_eq!(state.quotes.list().await.unwrap().len(), 4);
}
