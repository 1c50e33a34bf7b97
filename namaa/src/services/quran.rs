//! Quran goal service
//!
//! Each user has at most one reading goal. Saving always starts a fresh
//! goal; progress is only changed through toggling unit indices.

use crate::database::{NewQuranGoal, QuranGoal};
use crate::error::{AppError, Result};
use crate::storage::{new_record_id, Collection, RecordStore, StorageKey};
use chrono::Utc;
use std::collections::BTreeSet;

#[derive(Clone)]
pub struct QuranService {
    store: RecordStore,
}

impl QuranService {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    fn key(user_id: &str) -> Result<StorageKey> {
        StorageKey::for_user(Collection::Quran, user_id)
    }

    pub async fn get(&self, user_id: &str) -> Result<Option<QuranGoal>> {
        self.store.load(&Self::key(user_id)?).await
    }

    /// Replace any existing goal with a new one that has no progress
    pub async fn save(&self, user_id: &str, new_goal: NewQuranGoal) -> Result<QuranGoal> {
        let max = new_goal.goal_type.max_units();
        if new_goal.quantity == 0 || new_goal.quantity > max {
            return Err(AppError::Validation(format!(
                "quantity must be between 1 and {} for {:?} goals",
                max, new_goal.goal_type
            )));
        }

        let goal = QuranGoal {
            id: new_record_id(),
            user_id: user_id.to_string(),
            goal_type: new_goal.goal_type,
            quantity: new_goal.quantity,
            progress: BTreeSet::new(),
            created_at: Utc::now(),
        };

        self.store.store(&Self::key(user_id)?, &goal).await?;

        tracing::info!(
            "New Quran goal for user {}: {} x {:?}",
            user_id,
            goal.quantity,
            goal.goal_type
        );
        Ok(goal)
    }

    /// Flip completion of one unit. Returns the updated goal, or `None` when
    /// the user has no goal.
    pub async fn toggle_progress(&self, user_id: &str, index: u32) -> Result<Option<QuranGoal>> {
        self.store
            .modify(&Self::key(user_id)?, |slot: &mut Option<QuranGoal>| {
                let Some(goal) = slot.as_mut() else {
                    return Ok(None);
                };
                if index >= goal.quantity {
                    return Err(AppError::Validation(format!(
                        "unit {} outside goal of {} units",
                        index, goal.quantity
                    )));
                }
                if !goal.progress.remove(&index) {
                    goal.progress.insert(index);
                }
                tracing::debug!(
                    "Quran progress {}/{} for user {}",
                    goal.progress.len(),
                    goal.quantity,
                    user_id
                );
                Ok(Some(goal.clone()))
            })
            .await
    }

    /// Replace the set of completed units
    pub async fn set_progress(
        &self,
        user_id: &str,
        indices: BTreeSet<u32>,
    ) -> Result<Option<QuranGoal>> {
        self.store
            .modify(&Self::key(user_id)?, |slot: &mut Option<QuranGoal>| {
                let Some(goal) = slot.as_mut() else {
                    return Ok(None);
                };
                if let Some(max) = indices.iter().next_back() {
                    if *max >= goal.quantity {
                        return Err(AppError::Validation(format!(
                            "unit {} outside goal of {} units",
                            max, goal.quantity
                        )));
                    }
                }
                goal.progress = indices;
                Ok(Some(goal.clone()))
            })
            .await
    }

    /// Drop the goal entirely
    pub async fn remove(&self, user_id: &str) -> Result<()> {
        self.store.remove(&Self::key(user_id)?).await?;
        tracing::info!("Quran goal removed for user {}", user_id);
        Ok(())
    }
}
