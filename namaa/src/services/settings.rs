//! Settings service
//!
//! Per-user preferences. Reads of an absent slot return defaults without
//! writing them; the first update materializes the record.

use crate::database::{SettingsUpdate, UserSettings};
use crate::error::Result;
use crate::storage::{Collection, RecordStore, StorageKey};

#[derive(Clone)]
pub struct SettingsService {
    store: RecordStore,
}

impl SettingsService {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    fn key(user_id: &str) -> Result<StorageKey> {
        StorageKey::for_user(Collection::Settings, user_id)
    }

    pub async fn get(&self, user_id: &str) -> Result<UserSettings> {
        Ok(self
            .store
            .load(&Self::key(user_id)?)
            .await?
            .unwrap_or_else(|| UserSettings::defaults_for(user_id)))
    }

    /// Store `settings` as given, owned by `user_id`
    pub async fn save(&self, user_id: &str, mut settings: UserSettings) -> Result<UserSettings> {
        settings.user_id = user_id.to_string();
        self.store.store(&Self::key(user_id)?, &settings).await?;

        tracing::info!("Settings saved for user {}", user_id);
        Ok(settings)
    }

    pub async fn update(&self, user_id: &str, update: SettingsUpdate) -> Result<UserSettings> {
        self.store
            .modify(&Self::key(user_id)?, |slot: &mut Option<UserSettings>| {
                let settings = slot.get_or_insert_with(|| UserSettings::defaults_for(user_id));
                update.apply(settings);
                Ok(settings.clone())
            })
            .await
    }
}
