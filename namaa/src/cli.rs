use chrono::{NaiveDate, NaiveTime};
use clap::{Parser, Subcommand, ValueEnum};
use namaa::config::DATA_DIR_ENV;
use namaa::database::{
    parse_hhmm, Prayer, Priority, QuoteCategory, QuranGoalType, ReminderKind, Repeat,
};
use namaa::services::TaskFilter;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "namaa")]
#[command(about = "Track prayers, tasks, Quran reading, lessons and reminders", long_about = None)]
pub struct Cli {
    /// Directory holding the database and backups
    #[arg(long, global = true, env = DATA_DIR_ENV)]
    pub data_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create an account and sign in
    Signup {
        username: String,
        /// Display name
        name: String,
        #[arg(short, long)]
        password: String,
    },

    /// Sign in
    Login {
        username: String,
        #[arg(short, long)]
        password: String,
    },

    /// Sign out
    Logout,

    /// Show the signed-in user
    Whoami,

    /// Manage tasks
    #[command(subcommand)]
    Task(TaskCommand),

    /// Track daily prayers
    #[command(subcommand)]
    Prayer(PrayerCommand),

    /// Quran reading goal
    #[command(subcommand)]
    Quran(QuranCommand),

    /// Manage reminders
    #[command(subcommand)]
    Reminder(ReminderCommand),

    /// Show a motivational quote
    Quote {
        #[arg(short, long)]
        category: Option<CategoryArg>,
        /// Add a custom quote instead of showing one
        #[arg(long)]
        add: Option<String>,
    },

    /// Today's progress and the current week
    Progress {
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },

    /// Write a backup file
    Export {
        /// Target directory (defaults to the backups directory)
        #[arg(short, long)]
        dir: Option<PathBuf>,
    },

    /// Restore from a backup file
    Import { path: PathBuf },

    /// Delete all of your data
    Reset {
        #[arg(long)]
        yes: bool,
    },

    /// Run the focus timer
    Focus {
        #[arg(short, long, default_value_t = 25)]
        focus_minutes: u32,
        #[arg(short, long, default_value_t = 5)]
        break_minutes: u32,
        /// Number of focus phases to run
        #[arg(short, long, default_value_t = 1)]
        cycles: u32,
    },
}

#[derive(Subcommand, Debug)]
pub enum TaskCommand {
    /// Add a task
    Add {
        title: String,
        #[arg(short, long, default_value = "medium")]
        priority: Priority,
        /// Due date (YYYY-MM-DD)
        #[arg(short, long)]
        due: Option<NaiveDate>,
    },

    /// List tasks
    #[command(alias = "ls")]
    List {
        #[arg(short, long, value_enum, default_value_t = FilterArg::All)]
        filter: FilterArg,
    },

    /// Toggle completion of a task
    Done { id: String },

    /// Delete a task
    #[command(alias = "rm")]
    Delete { id: String },
}

#[derive(Subcommand, Debug)]
pub enum PrayerCommand {
    /// Mark a prayer as prayed
    Mark {
        prayer: Prayer,
        #[arg(short, long)]
        date: Option<NaiveDate>,
        /// Clear the mark instead
        #[arg(long)]
        undo: bool,
    },

    /// Show the prayers of a day
    Show {
        #[arg(short, long)]
        date: Option<NaiveDate>,
    },
}

#[derive(Subcommand, Debug)]
pub enum QuranCommand {
    /// Start a new goal
    Goal {
        goal_type: QuranGoalType,
        quantity: u32,
    },

    /// Toggle one unit (1-based)
    Toggle { unit: u32 },

    /// Show the current goal
    Show,

    /// Remove the current goal
    Clear,
}

#[derive(Subcommand, Debug)]
pub enum ReminderCommand {
    /// Add a reminder
    Add {
        title: String,
        /// Time of day (HH:MM)
        #[arg(value_parser = parse_hhmm)]
        time: NaiveTime,
        #[arg(short, long, value_enum, default_value_t = RepeatArg::None)]
        repeat: RepeatArg,
        #[arg(short, long, value_enum, default_value_t = KindArg::Other)]
        kind: KindArg,
    },

    /// List reminders
    #[command(alias = "ls")]
    List,

    /// Delete a reminder
    #[command(alias = "rm")]
    Delete { id: String },

    /// Stay in the foreground and print reminders as they come due
    Watch,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum FilterArg {
    All,
    Today,
    Week,
}

impl From<FilterArg> for TaskFilter {
    fn from(arg: FilterArg) -> Self {
        match arg {
            FilterArg::All => TaskFilter::All,
            FilterArg::Today => TaskFilter::Today,
            FilterArg::Week => TaskFilter::ThisWeek,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum RepeatArg {
    None,
    Daily,
    Weekly,
}

impl From<RepeatArg> for Repeat {
    fn from(arg: RepeatArg) -> Self {
        match arg {
            RepeatArg::None => Repeat::Once,
            RepeatArg::Daily => Repeat::Daily,
            RepeatArg::Weekly => Repeat::Weekly,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum KindArg {
    Task,
    Prayer,
    Lesson,
    Other,
}

impl From<KindArg> for ReminderKind {
    fn from(arg: KindArg) -> Self {
        match arg {
            KindArg::Task => ReminderKind::Task,
            KindArg::Prayer => ReminderKind::Prayer,
            KindArg::Lesson => ReminderKind::Lesson,
            KindArg::Other => ReminderKind::Other,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum CategoryArg {
    Faith,
    Productivity,
    Custom,
}

impl From<CategoryArg> for QuoteCategory {
    fn from(arg: CategoryArg) -> Self {
        match arg {
            CategoryArg::Faith => QuoteCategory::Faith,
            CategoryArg::Productivity => QuoteCategory::Productivity,
            CategoryArg::Custom => QuoteCategory::Custom,
        }
    }
}
