//! Prayers service
//!
//! One `PrayerDay` per user and date. Looking a day up creates it.

use crate::database::{PrayerDay, PrayerUpdate};
use crate::error::Result;
use crate::storage::{new_record_id, Collection, RecordStore, StorageKey};
use chrono::NaiveDate;

#[derive(Clone)]
pub struct PrayersService {
    store: RecordStore,
}

impl PrayersService {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    fn key(user_id: &str) -> Result<StorageKey> {
        StorageKey::for_user(Collection::Prayers, user_id)
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<PrayerDay>> {
        self.store.load_list(&Self::key(user_id)?).await
    }

    /// Day record for `date` without creating it
    pub async fn find(&self, user_id: &str, date: NaiveDate) -> Result<Option<PrayerDay>> {
        let days = self.list(user_id).await?;
        Ok(days.into_iter().find(|d| d.date == date))
    }

    /// Day record for `date`, creating and persisting an empty one if missing
    pub async fn get(&self, user_id: &str, date: NaiveDate) -> Result<PrayerDay> {
        self.store
            .modify_list(&Self::key(user_id)?, |days: &mut Vec<PrayerDay>| {
                if let Some(day) = days.iter().find(|d| d.date == date) {
                    return Ok(day.clone());
                }
                tracing::debug!("Creating prayer day {} for user {}", date, user_id);
                let day = PrayerDay::empty(new_record_id(), user_id, date);
                days.push(day.clone());
                Ok(day)
            })
            .await
    }

    /// Merge `update` into the day record, creating it if missing
    pub async fn update(
        &self,
        user_id: &str,
        date: NaiveDate,
        update: PrayerUpdate,
    ) -> Result<PrayerDay> {
        let day = self
            .store
            .modify_list(&Self::key(user_id)?, |days: &mut Vec<PrayerDay>| {
                let day = match days.iter_mut().find(|d| d.date == date) {
                    Some(day) => {
                        update.apply(day);
                        day.clone()
                    }
                    None => {
                        let mut day = PrayerDay::empty(new_record_id(), user_id, date);
                        update.apply(&mut day);
                        days.push(day.clone());
                        day
                    }
                };
                Ok(day)
            })
            .await?;

        tracing::info!(
            "Prayers for {} updated: {}/5 completed",
            date,
            day.completed_count()
        );
        Ok(day)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::Prayer;
    use crate::services::test_store;

    fn jan(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[tokio::test]
    async fn test_get_creates_and_persists_empty_day() {
        let service = PrayersService::new(test_store().await);

        let day = service.get("u1", jan(1)).await.unwrap();
        assert_eq!(day.date, jan(1));
        assert_eq!(day.completed_count(), 0);

        let again = service.get("u1", jan(1)).await.unwrap();
        assert_eq!(again.id, day.id);
        assert_eq!(service.list("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_update_creates_missing_day() {
        let service = PrayersService::new(test_store().await);

        let day = service
            .update("u1", jan(2), PrayerUpdate::mark(Prayer::Fajr, true))
            .await
            .unwrap();
        assert!(day.fajr);
        assert!(!day.isha);

        let days = service.list("u1").await.unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0], day);
    }

    #[tokio::test]
    async fn test_update_merges_into_existing_day() {
        let service = PrayersService::new(test_store().await);

        let first = service
            .update("u1", jan(2), PrayerUpdate::mark(Prayer::Fajr, true))
            .await
            .unwrap();
        let second = service
            .update("u1", jan(2), PrayerUpdate::mark(Prayer::Asr, true))
            .await
            .unwrap();

        assert_eq!(first.id, second.id);
        assert!(second.fajr && second.asr);
        assert_eq!(second.completed_count(), 2);
        assert_eq!(service.list("u1").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_find_does_not_create() {
        let service = PrayersService::new(test_store().await);
        assert_eq!(service.find("u1", jan(3)).await.unwrap(), None);
        assert!(service.list("u1").await.unwrap().is_empty());
    }
}
