//! Services module
//!
//! Business logic for each collection, built on the record store.

pub mod auth;
pub mod backup;
pub mod focus;
pub mod lessons;
pub mod prayers;
pub mod progress;
pub mod quotes;
pub mod quran;
pub mod reminders;
pub mod settings;
pub mod tasks;

pub use auth::AuthService;
pub use backup::{BackupService, BackupSnapshot};
pub use focus::{FocusLog, FocusTimer, Phase, TimerDriver, TimerEvent};
pub use lessons::LessonsService;
pub use prayers::PrayersService;
pub use progress::{DailyProgress, DayOverview, ProgressService, WeeklySummary};
pub use quotes::QuotesService;
pub use quran::QuranService;
pub use reminders::{ReminderFired, RemindersService};
pub use settings::SettingsService;
pub use tasks::{TaskFilter, TasksService};

#[cfg(test)]
pub(crate) async fn test_store() -> crate::storage::RecordStore {
    let pool = crate::database::create_memory_pool().await.unwrap();
    crate::storage::RecordStore::new(crate::database::Repository::new(pool))
}
