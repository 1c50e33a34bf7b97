//! Database models
//!
//! Rust structs representing the records kept in the key-value store.
//! Field names serialize in camelCase so backups stay readable by the
//! browser build of Namaa.

use crate::config::{
    MAX_RATING, MIN_RATING, QURAN_HIZB, QURAN_JUZ, QURAN_PAGES, QURAN_QUARTERS,
};
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::str::FromStr;

/// Schema checks applied to every value decoded from storage.
///
/// Serde already rejects wrong shapes and unknown enum tags; this covers the
/// invariants that span fields.
pub trait Validate {
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }

    /// Key that must be unique among the items of one list slot
    fn unique_key(&self) -> Option<String> {
        None
    }
}

impl<T: Validate> Validate for Vec<T> {
    fn validate(&self) -> Result<(), String> {
        let mut seen = HashSet::new();
        for (i, item) in self.iter().enumerate() {
            item.validate().map_err(|e| format!("item {}: {}", i, e))?;
            if let Some(key) = item.unique_key() {
                if !seen.insert(key.clone()) {
                    return Err(format!("item {}: duplicate {}", i, key));
                }
            }
        }
        Ok(())
    }
}

impl<T: Validate> Validate for Option<T> {
    fn validate(&self) -> Result<(), String> {
        match self {
            Some(value) => value.validate(),
            None => Ok(()),
        }
    }
}

impl Validate for u32 {}

// ===== Users =====

/// Public view of an account
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub username: String,
    pub name: String,
}

impl Validate for User {}

/// Entry of the user directory. The password is stored as typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub id: String,
    pub username: String,
    pub name: String,
    pub password: String,
}

impl UserRecord {
    pub fn public(&self) -> User {
        User {
            id: self.id.clone(),
            username: self.username.clone(),
            name: self.name.clone(),
        }
    }
}

/// Username -> account
pub type UserDirectory = BTreeMap<String, UserRecord>;

impl Validate for UserDirectory {
    fn validate(&self) -> Result<(), String> {
        for (username, record) in self {
            if &record.username != username {
                return Err(format!(
                    "directory entry '{}' holds user '{}'",
                    username, record.username
                ));
            }
        }
        Ok(())
    }
}

// ===== Tasks =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(format!("Unknown priority '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub completed: bool,
    pub priority: Priority,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "optional_date"
    )]
    pub due_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
}

impl Validate for Task {
    fn unique_key(&self) -> Option<String> {
        Some(format!("id '{}'", self.id))
    }
}

/// Fields supplied by the caller when adding a task
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub title: String,
    pub completed: bool,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
}

/// Shallow update of a task. `None` leaves the field untouched;
/// `due_date: Some(None)` clears the due date.
#[derive(Debug, Clone, Default)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub completed: Option<bool>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<NaiveDate>>,
}

impl TaskUpdate {
    pub fn completed(completed: bool) -> Self {
        Self {
            completed: Some(completed),
            ..Self::default()
        }
    }

    pub fn apply(&self, task: &mut Task) {
        if let Some(title) = &self.title {
            task.title = title.clone();
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
        if let Some(priority) = self.priority {
            task.priority = priority;
        }
        if let Some(due_date) = self.due_date {
            task.due_date = due_date;
        }
    }
}

// ===== Prayers =====

/// The five daily prayers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Prayer {
    Fajr,
    Dhuhr,
    Asr,
    Maghrib,
    Isha,
}

impl Prayer {
    pub const ALL: [Prayer; 5] = [
        Prayer::Fajr,
        Prayer::Dhuhr,
        Prayer::Asr,
        Prayer::Maghrib,
        Prayer::Isha,
    ];
}

impl FromStr for Prayer {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "fajr" => Ok(Prayer::Fajr),
            "dhuhr" => Ok(Prayer::Dhuhr),
            "asr" => Ok(Prayer::Asr),
            "maghrib" => Ok(Prayer::Maghrib),
            "isha" => Ok(Prayer::Isha),
            other => Err(format!("Unknown prayer '{}'", other)),
        }
    }
}

/// Prayer checklist for one day. The date is the natural key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrayerDay {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub fajr: bool,
    pub dhuhr: bool,
    pub asr: bool,
    pub maghrib: bool,
    pub isha: bool,
}

impl PrayerDay {
    /// A day with nothing prayed yet
    pub fn empty(id: String, user_id: &str, date: NaiveDate) -> Self {
        Self {
            id,
            user_id: user_id.to_string(),
            date,
            fajr: false,
            dhuhr: false,
            asr: false,
            maghrib: false,
            isha: false,
        }
    }

    pub fn is_prayed(&self, prayer: Prayer) -> bool {
        match prayer {
            Prayer::Fajr => self.fajr,
            Prayer::Dhuhr => self.dhuhr,
            Prayer::Asr => self.asr,
            Prayer::Maghrib => self.maghrib,
            Prayer::Isha => self.isha,
        }
    }

    pub fn completed_count(&self) -> u32 {
        Prayer::ALL.iter().filter(|p| self.is_prayed(**p)).count() as u32
    }
}

impl Validate for PrayerDay {
    fn unique_key(&self) -> Option<String> {
        Some(format!("date {}", self.date))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PrayerUpdate {
    pub fajr: Option<bool>,
    pub dhuhr: Option<bool>,
    pub asr: Option<bool>,
    pub maghrib: Option<bool>,
    pub isha: Option<bool>,
}

impl PrayerUpdate {
    /// Update touching a single prayer
    pub fn mark(prayer: Prayer, prayed: bool) -> Self {
        let mut update = Self::default();
        match prayer {
            Prayer::Fajr => update.fajr = Some(prayed),
            Prayer::Dhuhr => update.dhuhr = Some(prayed),
            Prayer::Asr => update.asr = Some(prayed),
            Prayer::Maghrib => update.maghrib = Some(prayed),
            Prayer::Isha => update.isha = Some(prayed),
        }
        update
    }

    pub fn apply(&self, day: &mut PrayerDay) {
        if let Some(v) = self.fajr {
            day.fajr = v;
        }
        if let Some(v) = self.dhuhr {
            day.dhuhr = v;
        }
        if let Some(v) = self.asr {
            day.asr = v;
        }
        if let Some(v) = self.maghrib {
            day.maghrib = v;
        }
        if let Some(v) = self.isha {
            day.isha = v;
        }
    }
}

// ===== Quran =====

/// Unit a reading goal is counted in
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuranGoalType {
    Page,
    Juz,
    Quarter,
    Hizb,
}

impl QuranGoalType {
    /// Number of units of this type in the whole Quran
    pub fn max_units(self) -> u32 {
        match self {
            QuranGoalType::Page => QURAN_PAGES,
            QuranGoalType::Juz => QURAN_JUZ,
            QuranGoalType::Quarter => QURAN_QUARTERS,
            QuranGoalType::Hizb => QURAN_HIZB,
        }
    }
}

impl FromStr for QuranGoalType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "page" => Ok(QuranGoalType::Page),
            "juz" => Ok(QuranGoalType::Juz),
            "quarter" => Ok(QuranGoalType::Quarter),
            "hizb" => Ok(QuranGoalType::Hizb),
            other => Err(format!("Unknown goal type '{}'", other)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuranGoal {
    pub id: String,
    pub user_id: String,
    #[serde(rename = "type")]
    pub goal_type: QuranGoalType,
    pub quantity: u32,
    /// Completed unit indices, each in `0..quantity`
    pub progress: BTreeSet<u32>,
    pub created_at: DateTime<Utc>,
}

impl QuranGoal {
    pub fn completion_percent(&self) -> f64 {
        if self.quantity == 0 {
            return 0.0;
        }
        self.progress.len() as f64 / self.quantity as f64 * 100.0
    }

    pub fn is_complete(&self) -> bool {
        self.progress.len() as u32 == self.quantity
    }
}

impl Validate for QuranGoal {
    fn validate(&self) -> Result<(), String> {
        if self.quantity == 0 {
            return Err("quantity must be at least 1".to_string());
        }
        if let Some(max) = self.progress.iter().next_back() {
            if *max >= self.quantity {
                return Err(format!(
                    "progress index {} outside goal of {} units",
                    max, self.quantity
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NewQuranGoal {
    pub goal_type: QuranGoalType,
    pub quantity: u32,
}

// ===== Lessons =====

/// Lesson quality score from 1 to 5
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Rating(u8);

impl Rating {
    pub fn value(self) -> u8 {
        self.0
    }
}

impl Default for Rating {
    fn default() -> Self {
        Rating(3)
    }
}

impl TryFrom<u8> for Rating {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (MIN_RATING..=MAX_RATING).contains(&value) {
            Ok(Rating(value))
        } else {
            Err(format!(
                "rating {} outside {}..={}",
                value, MIN_RATING, MAX_RATING
            ))
        }
    }
}

impl From<Rating> for u8 {
    fn from(rating: Rating) -> Self {
        rating.0
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LessonDay {
    pub id: String,
    pub user_id: String,
    pub date: NaiveDate,
    pub focus: Rating,
    pub interaction: Rating,
    pub homework: Rating,
    pub mistake_reduction: Rating,
    pub respect_discipline: Rating,
    /// Free-form references to related tasks
    #[serde(default)]
    pub tasks: Vec<String>,
}

impl LessonDay {
    pub fn average(&self) -> f64 {
        let sum: u32 = [
            self.focus,
            self.interaction,
            self.homework,
            self.mistake_reduction,
            self.respect_discipline,
        ]
        .iter()
        .map(|r| r.value() as u32)
        .sum();
        sum as f64 / 5.0
    }
}

impl Validate for LessonDay {
    fn unique_key(&self) -> Option<String> {
        Some(format!("id '{}'", self.id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewLessonDay {
    pub date: NaiveDate,
    pub focus: Rating,
    pub interaction: Rating,
    pub homework: Rating,
    pub mistake_reduction: Rating,
    pub respect_discipline: Rating,
    pub tasks: Vec<String>,
}

#[derive(Debug, Clone, Default)]
pub struct LessonUpdate {
    pub date: Option<NaiveDate>,
    pub focus: Option<Rating>,
    pub interaction: Option<Rating>,
    pub homework: Option<Rating>,
    pub mistake_reduction: Option<Rating>,
    pub respect_discipline: Option<Rating>,
    pub tasks: Option<Vec<String>>,
}

impl LessonUpdate {
    pub fn apply(&self, lesson: &mut LessonDay) {
        if let Some(date) = self.date {
            lesson.date = date;
        }
        if let Some(r) = self.focus {
            lesson.focus = r;
        }
        if let Some(r) = self.interaction {
            lesson.interaction = r;
        }
        if let Some(r) = self.homework {
            lesson.homework = r;
        }
        if let Some(r) = self.mistake_reduction {
            lesson.mistake_reduction = r;
        }
        if let Some(r) = self.respect_discipline {
            lesson.respect_discipline = r;
        }
        if let Some(tasks) = &self.tasks {
            lesson.tasks = tasks.clone();
        }
    }
}

// ===== Reminders =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Repeat {
    #[default]
    #[serde(rename = "none")]
    Once,
    #[serde(rename = "daily")]
    Daily,
    #[serde(rename = "weekly")]
    Weekly,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReminderKind {
    Task,
    Prayer,
    Lesson,
    #[default]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reminder {
    pub id: String,
    pub user_id: String,
    pub title: String,
    /// Local wall-clock time, stored as "HH:MM"
    #[serde(with = "hhmm")]
    pub time: NaiveTime,
    pub repeat: Repeat,
    #[serde(rename = "type")]
    pub kind: ReminderKind,
    pub enabled: bool,
}

impl Validate for Reminder {
    fn unique_key(&self) -> Option<String> {
        Some(format!("id '{}'", self.id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReminder {
    pub title: String,
    pub time: NaiveTime,
    pub repeat: Repeat,
    pub kind: ReminderKind,
    pub enabled: bool,
}

#[derive(Debug, Clone, Default)]
pub struct ReminderUpdate {
    pub title: Option<String>,
    pub time: Option<NaiveTime>,
    pub repeat: Option<Repeat>,
    pub kind: Option<ReminderKind>,
    pub enabled: Option<bool>,
}

impl ReminderUpdate {
    pub fn apply(&self, reminder: &mut Reminder) {
        if let Some(title) = &self.title {
            reminder.title = title.clone();
        }
        if let Some(time) = self.time {
            reminder.time = time;
        }
        if let Some(repeat) = self.repeat {
            reminder.repeat = repeat;
        }
        if let Some(kind) = self.kind {
            reminder.kind = kind;
        }
        if let Some(enabled) = self.enabled {
            reminder.enabled = enabled;
        }
    }
}

/// Parse a "HH:MM" wall-clock time
pub fn parse_hhmm(s: &str) -> Result<NaiveTime, String> {
    NaiveTime::parse_from_str(s.trim(), hhmm::FORMAT)
        .map_err(|e| format!("invalid time '{}': {}", s, e))
}

// ===== Quotes =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteCategory {
    Faith,
    Productivity,
    Custom,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Quote {
    pub id: String,
    pub text: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    pub category: QuoteCategory,
    pub is_custom: bool,
}

impl Validate for Quote {
    fn unique_key(&self) -> Option<String> {
        Some(format!("id '{}'", self.id))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewQuote {
    pub text: String,
    pub author: Option<String>,
    pub category: QuoteCategory,
    pub is_custom: bool,
}

impl NewQuote {
    /// A quote typed in by the user
    pub fn custom(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            author: None,
            category: QuoteCategory::Custom,
            is_custom: true,
        }
    }
}

/// Built-in quotes shown until the collection is first written
pub fn seed_quotes() -> Vec<Quote> {
    fn seed(id: &str, text: &str, author: Option<&str>, category: QuoteCategory) -> Quote {
        Quote {
            id: id.to_string(),
            text: text.to_string(),
            author: author.map(str::to_string),
            category,
            is_custom: false,
        }
    }

    vec![
        seed(
            "1",
            "The best among you are those who have the best manners and character.",
            Some("Prophet Muhammad (PBUH)"),
            QuoteCategory::Faith,
        ),
        seed(
            "2",
            "Verily, with hardship comes ease.",
            Some("Quran 94:6"),
            QuoteCategory::Faith,
        ),
        seed(
            "3",
            "The only way to do great work is to love what you do.",
            Some("Steve Jobs"),
            QuoteCategory::Productivity,
        ),
        seed(
            "4",
            "Success is not final, failure is not fatal: \
             it is the courage to continue that counts.",
            None,
            QuoteCategory::Productivity,
        ),
    ]
}

// ===== Settings =====

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    #[default]
    En,
    Ar,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FontSize {
    Small,
    #[default]
    Medium,
    Large,
}

/// Per-user preferences. Missing fields decode to their defaults so partial
/// settings objects from backups are accepted.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserSettings {
    pub user_id: String,
    pub theme: Theme,
    pub language: Language,
    pub font_size: FontSize,
    pub daily_intention: String,
}

impl UserSettings {
    pub fn defaults_for(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            ..Self::default()
        }
    }
}

impl Validate for UserSettings {}

#[derive(Debug, Clone, Default)]
pub struct SettingsUpdate {
    pub theme: Option<Theme>,
    pub language: Option<Language>,
    pub font_size: Option<FontSize>,
    pub daily_intention: Option<String>,
}

impl SettingsUpdate {
    pub fn apply(&self, settings: &mut UserSettings) {
        if let Some(theme) = self.theme {
            settings.theme = theme;
        }
        if let Some(language) = self.language {
            settings.language = language;
        }
        if let Some(font_size) = self.font_size {
            settings.font_size = font_size;
        }
        if let Some(intention) = &self.daily_intention {
            settings.daily_intention = intention.clone();
        }
    }
}

// ===== Focus log =====

/// One completed focus phase
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusSession {
    pub date: NaiveDate,
}

impl Validate for FocusSession {}

mod hhmm {
    use chrono::NaiveTime;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const FORMAT: &str = "%H:%M";

    pub fn serialize<S: Serializer>(time: &NaiveTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&time.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveTime, D::Error> {
        let s = String::deserialize(deserializer)?;
        NaiveTime::parse_from_str(&s, FORMAT).map_err(serde::de::Error::custom)
    }
}

/// `YYYY-MM-DD`, with an empty string read as no date
mod optional_date {
    use chrono::NaiveDate;
    use serde::{Deserialize, Deserializer, Serializer};

    const FORMAT: &str = "%Y-%m-%d";

    pub fn serialize<S: Serializer>(
        date: &Option<NaiveDate>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match date {
            Some(d) => serializer.serialize_str(&d.format(FORMAT).to_string()),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDate>, D::Error> {
        let raw: Option<String> = Option::deserialize(deserializer)?;
        match raw.as_deref().map(str::trim) {
            None | Some("") => Ok(None),
            Some(s) => NaiveDate::parse_from_str(s, FORMAT)
                .map(Some)
                .map_err(serde::de::Error::custom),
        }
    }
}
