//! Application configuration constants
//!
//! Central location for all configuration constants, resource limits,
//! and validation boundaries used throughout the application.

// ===== Storage =====

/// SQLite database file name inside the data directory
pub const DB_FILE_NAME: &str = "namaa.sqlite";

/// Connection pool size for the on-disk database
pub const DB_POOL_SIZE: u32 = 5;

/// Environment variable overriding the data directory
pub const DATA_DIR_ENV: &str = "NAMAA_DATA_DIR";

/// Sub-directory of the data directory that receives backup files
pub const BACKUPS_DIR_NAME: &str = "backups";

// ===== Focus Timer =====

/// Default focus phase length in minutes
pub const DEFAULT_FOCUS_MINUTES: u32 = 25;

/// Default break phase length in minutes
pub const DEFAULT_BREAK_MINUTES: u32 = 5;

/// Minimum focus phase length in minutes
pub const MIN_FOCUS_MINUTES: u32 = 1;

/// Maximum focus phase length in minutes
pub const MAX_FOCUS_MINUTES: u32 = 60;

/// Minimum break phase length in minutes
pub const MIN_BREAK_MINUTES: u32 = 1;

/// Maximum break phase length in minutes
pub const MAX_BREAK_MINUTES: u32 = 30;

/// Minutes credited to the focus log for every completed focus phase.
/// The log credits a fixed amount regardless of the configured duration.
pub const FOCUS_SESSION_CREDIT_MINUTES: u32 = 25;

// ===== Lessons =====

/// Lowest lesson rating
pub const MIN_RATING: u8 = 1;

/// Highest lesson rating
pub const MAX_RATING: u8 = 5;

// ===== Quran Goals =====

/// Pages in a standard mushaf
pub const QURAN_PAGES: u32 = 604;

/// Number of juz
pub const QURAN_JUZ: u32 = 30;

/// Number of hizb (two per juz)
pub const QURAN_HIZB: u32 = 60;

/// Number of quarters (four per hizb)
pub const QURAN_QUARTERS: u32 = 240;

// ===== Reminders =====

/// How often the reminder scheduler wakes up, in seconds
pub const REMINDER_CHECK_INTERVAL_SECS: u64 = 60;

/// Days between two firings of a weekly reminder
pub const WEEKLY_REPEAT_DAYS: i64 = 7;

// ===== Prayers =====

/// Number of daily prayers tracked per day
pub const DAILY_PRAYERS: u32 = 5;
