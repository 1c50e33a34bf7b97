//! Storage key derivation
//!
//! Per-user collections live under `"{collection}:{user_id}"`; global ones
//! under their bare name. Collection names never contain `:`, so the
//! mapping is injective.

use crate::error::{AppError, Result};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Tasks,
    Prayers,
    Quran,
    Lessons,
    Reminders,
    Settings,
    Quotes,
    Users,
    CurrentUser,
    FocusSessions,
    FocusTotal,
}

/// Collections owned by a single user. Reset and export work on these.
pub const USER_COLLECTIONS: [Collection; 6] = [
    Collection::Tasks,
    Collection::Prayers,
    Collection::Quran,
    Collection::Lessons,
    Collection::Reminders,
    Collection::Settings,
];

impl Collection {
    pub fn name(self) -> &'static str {
        match self {
            Collection::Tasks => "tasks",
            Collection::Prayers => "prayers",
            Collection::Quran => "quran",
            Collection::Lessons => "lessons",
            Collection::Reminders => "reminders",
            Collection::Settings => "settings",
            Collection::Quotes => "quotes",
            Collection::Users => "users",
            Collection::CurrentUser => "current-user",
            Collection::FocusSessions => "focus-sessions",
            Collection::FocusTotal => "focus-total",
        }
    }

    pub fn is_per_user(self) -> bool {
        USER_COLLECTIONS.contains(&self)
    }
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Fully derived key of a storage slot
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    /// Key of a per-user collection. The user id must be non-empty.
    pub fn for_user(collection: Collection, user_id: &str) -> Result<Self> {
        if !collection.is_per_user() {
            return Err(AppError::Validation(format!(
                "'{}' is not a per-user collection",
                collection
            )));
        }
        if user_id.is_empty() {
            return Err(AppError::Validation(format!(
                "user id required for '{}'",
                collection
            )));
        }
        Ok(Self(format!("{}:{}", collection.name(), user_id)))
    }

    /// Key of a global collection
    pub fn global(collection: Collection) -> Result<Self> {
        if collection.is_per_user() {
            return Err(AppError::Validation(format!(
                "'{}' is a per-user collection",
                collection
            )));
        }
        Ok(Self(collection.name().to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the key for `collection`, scoped to `user_id` when it is per-user
pub fn storage_key(collection: Collection, user_id: Option<&str>) -> Result<StorageKey> {
    match user_id {
        Some(id) => StorageKey::for_user(collection, id),
        None => StorageKey::global(collection),
    }
}
