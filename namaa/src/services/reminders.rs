//! Reminders service
//!
//! CRUD for per-user reminders plus a background scheduler that checks the
//! signed-in user's reminders every minute and emits `ReminderFired` events
//! on a channel. One-shot reminders are disabled after they fire.

use super::auth::AuthService;
use crate::config::{REMINDER_CHECK_INTERVAL_SECS, WEEKLY_REPEAT_DAYS};
use crate::database::{NewReminder, Reminder, ReminderUpdate, Repeat};
use crate::error::Result;
use crate::storage::{new_record_id, Collection, RecordStore, StorageKey};
use chrono::{Local, NaiveDateTime, Timelike};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{mpsc, Mutex};
use tokio::task::JoinHandle;

/// Emitted when a reminder comes due
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReminderFired {
    pub user_id: String,
    pub reminder: Reminder,
    pub fired_at: NaiveDateTime,
}

#[derive(Clone)]
pub struct RemindersService {
    store: RecordStore,
    /// Reminder id -> last time it fired in this process
    last_fired: Arc<Mutex<HashMap<String, NaiveDateTime>>>,
}

impl RemindersService {
    pub fn new(store: RecordStore) -> Self {
        Self {
            store,
            last_fired: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    fn key(user_id: &str) -> Result<StorageKey> {
        StorageKey::for_user(Collection::Reminders, user_id)
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<Reminder>> {
        self.store.load_list(&Self::key(user_id)?).await
    }

    pub async fn add(&self, user_id: &str, new_reminder: NewReminder) -> Result<Reminder> {
        let reminder = Reminder {
            id: new_record_id(),
            user_id: user_id.to_string(),
            title: new_reminder.title,
            time: new_reminder.time,
            repeat: new_reminder.repeat,
            kind: new_reminder.kind,
            enabled: new_reminder.enabled,
        };

        let stored = reminder.clone();
        self.store
            .modify_list(&Self::key(user_id)?, move |reminders: &mut Vec<Reminder>| {
                reminders.push(stored);
                Ok(())
            })
            .await?;

        tracing::info!(
            "Added reminder {} at {} for user {}",
            reminder.id,
            reminder.time.format("%H:%M"),
            user_id
        );
        Ok(reminder)
    }

    pub async fn update(&self, user_id: &str, id: &str, update: ReminderUpdate) -> Result<bool> {
        self.store
            .modify_list(&Self::key(user_id)?, |reminders: &mut Vec<Reminder>| {
                Ok(match reminders.iter_mut().find(|r| r.id == id) {
                    Some(reminder) => {
                        update.apply(reminder);
                        true
                    }
                    None => false,
                })
            })
            .await
    }

    pub async fn delete(&self, user_id: &str, id: &str) -> Result<bool> {
        let removed = self
            .store
            .modify_list(&Self::key(user_id)?, |reminders: &mut Vec<Reminder>| {
                let before = reminders.len();
                reminders.retain(|r| r.id != id);
                Ok(reminders.len() != before)
            })
            .await?;

        if removed {
            self.last_fired.lock().await.remove(id);
            tracing::info!("Deleted reminder {}", id);
        }
        Ok(removed)
    }

    /// Start the background scheduler.
    ///
    /// Abort the returned handle to stop it.
    pub fn start_scheduler(
        self,
        auth: AuthService,
        events: mpsc::Sender<ReminderFired>,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            tracing::info!("Starting reminders scheduler");

            let period = tokio::time::Duration::from_secs(REMINDER_CHECK_INTERVAL_SECS);
            let mut interval = tokio::time::interval(period);

            loop {
                interval.tick().await;

                let user = match auth.current_user().await {
                    Ok(Some(user)) => user,
                    Ok(None) => continue,
                    Err(e) => {
                        tracing::error!("Error reading current user: {}", e);
                        continue;
                    }
                };

                let fired = match self.check_due(&user.id, Local::now().naive_local()).await {
                    Ok(fired) => fired,
                    Err(e) => {
                        tracing::error!("Error checking reminders: {}", e);
                        continue;
                    }
                };

                for event in fired {
                    if events.send(event).await.is_err() {
                        tracing::info!("Reminder receiver dropped, stopping scheduler");
                        return;
                    }
                }
            }
        })
    }

    /// Reminders of `user_id` due at the minute of `now`.
    ///
    /// Each reminder fires at most once per minute. Weekly reminders wait
    /// seven days between firings; one-shot reminders are disabled.
    pub async fn check_due(&self, user_id: &str, now: NaiveDateTime) -> Result<Vec<ReminderFired>> {
        let minute = now.with_second(0).and_then(|t| t.with_nanosecond(0)).unwrap_or(now);
        let reminders = self.list(user_id).await?;
        let mut last_fired = self.last_fired.lock().await;
        let mut fired = Vec::new();

        for reminder in reminders {
            let same_minute = reminder.time.hour() == minute.hour()
                && reminder.time.minute() == minute.minute();
            if !reminder.enabled || !same_minute {
                continue;
            }

            let due = match (reminder.repeat, last_fired.get(&reminder.id)) {
                (_, None) => true,
                (_, Some(last)) if *last == minute => false,
                (Repeat::Weekly, Some(last)) => {
                    (minute.date() - last.date()).num_days() >= WEEKLY_REPEAT_DAYS
                }
                (_, Some(_)) => true,
            };
            if !due {
                continue;
            }

            tracing::info!("Reminder {} fired: {}", reminder.id, reminder.title);
            last_fired.insert(reminder.id.clone(), minute);

            if reminder.repeat == Repeat::Once {
                let update = ReminderUpdate {
                    enabled: Some(false),
                    ..ReminderUpdate::default()
                };
                self.update(user_id, &reminder.id, update).await?;
            }

            fired.push(ReminderFired {
                user_id: user_id.to_string(),
                reminder,
                fired_at: minute,
            });
        }

        Ok(fired)
    }
}
