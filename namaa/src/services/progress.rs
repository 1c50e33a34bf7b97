//! Progress service
//!
//! Read-only summaries for the dashboard and weekly views. Nothing here
//! writes to storage; missing prayer days count as nothing prayed.

use crate::config::DAILY_PRAYERS;
use crate::database::{LessonDay, PrayerDay, QuranGoal, Task};
use crate::error::Result;
use crate::storage::{Collection, RecordStore, StorageKey};
use chrono::{Datelike, Duration, NaiveDate};
use serde::Serialize;

/// Completion percentages (0 to 100) for one day
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyProgress {
    pub date: NaiveDate,
    pub tasks: f64,
    pub prayers: f64,
    pub quran: f64,
    pub lessons: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DayOverview {
    pub date: NaiveDate,
    pub tasks_completed: usize,
    pub tasks_total: usize,
    pub prayers_completed: u32,
    pub has_lesson: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySummary {
    pub week_start: NaiveDate,
    pub days: Vec<DayOverview>,
    pub tasks_completed: usize,
    pub tasks_total: usize,
    pub prayers_completed: u32,
    pub lesson_days: usize,
}

#[derive(Clone)]
pub struct ProgressService {
    store: RecordStore,
}

impl ProgressService {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    async fn load_all(
        &self,
        user_id: &str,
    ) -> Result<(Vec<Task>, Vec<PrayerDay>, Option<QuranGoal>, Vec<LessonDay>)> {
        let tasks = self
            .store
            .load_list(&StorageKey::for_user(Collection::Tasks, user_id)?)
            .await?;
        let prayers = self
            .store
            .load_list(&StorageKey::for_user(Collection::Prayers, user_id)?)
            .await?;
        let quran = self
            .store
            .load(&StorageKey::for_user(Collection::Quran, user_id)?)
            .await?;
        let lessons = self
            .store
            .load_list(&StorageKey::for_user(Collection::Lessons, user_id)?)
            .await?;
        Ok((tasks, prayers, quran, lessons))
    }

    /// Dashboard numbers. Tasks count when due on `date` or undated.
    pub async fn daily_progress(&self, user_id: &str, date: NaiveDate) -> Result<DailyProgress> {
        let (tasks, prayers, quran, lessons) = self.load_all(user_id).await?;

        let relevant: Vec<&Task> = tasks
            .iter()
            .filter(|t| t.due_date.is_none() || t.due_date == Some(date))
            .collect();
        let done = relevant.iter().filter(|t| t.completed).count();

        let prayed = prayers
            .iter()
            .find(|d| d.date == date)
            .map(PrayerDay::completed_count)
            .unwrap_or(0);

        Ok(DailyProgress {
            date,
            tasks: percent(done, relevant.len()),
            prayers: percent(prayed as usize, DAILY_PRAYERS as usize),
            quran: quran.as_ref().map(QuranGoal::completion_percent).unwrap_or(0.0),
            lessons: if lessons.iter().any(|l| l.date == date) {
                100.0
            } else {
                0.0
            },
        })
    }

    /// Sunday-to-Saturday week containing `date`
    pub async fn weekly_summary(&self, user_id: &str, date: NaiveDate) -> Result<WeeklySummary> {
        let (tasks, prayers, _, lessons) = self.load_all(user_id).await?;
        let week_start = date - Duration::days(date.weekday().num_days_from_sunday() as i64);

        let days: Vec<DayOverview> = (0..7)
            .map(|offset| {
                let day = week_start + Duration::days(offset);
                let due: Vec<&Task> = tasks.iter().filter(|t| t.due_date == Some(day)).collect();
                DayOverview {
                    date: day,
                    tasks_completed: due.iter().filter(|t| t.completed).count(),
                    tasks_total: due.len(),
                    prayers_completed: prayers
                        .iter()
                        .find(|p| p.date == day)
                        .map(PrayerDay::completed_count)
                        .unwrap_or(0),
                    has_lesson: lessons.iter().any(|l| l.date == day),
                }
            })
            .collect();

        tracing::debug!("Weekly summary for user {} from {}", user_id, week_start);

        Ok(WeeklySummary {
            week_start,
            tasks_completed: days.iter().map(|d| d.tasks_completed).sum(),
            tasks_total: days.iter().map(|d| d.tasks_total).sum(),
            prayers_completed: days.iter().map(|d| d.prayers_completed).sum(),
            lesson_days: days.iter().filter(|d| d.has_lesson).count(),
            days,
        })
    }
}

fn percent(part: usize, whole: usize) -> f64 {
    if whole == 0 {
        0.0
    } else {
        part as f64 / whole as f64 * 100.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::{NewQuranGoal, NewTask, Prayer, PrayerUpdate, QuranGoalType, TaskUpdate};
    use crate::services::{test_store, PrayersService, QuranService, TasksService};

    fn jan(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
    }

    #[tokio::test]
    async fn test_empty_day() {
        let service = ProgressService::new(test_store().await);
        let progress = service.daily_progress("u1", jan(1)).await.unwrap();
        assert_eq!(progress.tasks, 0.0);
        assert_eq!(progress.prayers, 0.0);
        assert_eq!(progress.quran, 0.0);
        assert_eq!(progress.lessons, 0.0);
    }

    #[tokio::test]
    async fn test_daily_progress() {
        let store = test_store().await;
        let tasks = TasksService::new(store.clone());
        let prayers = PrayersService::new(store.clone());
        let quran = QuranService::new(store.clone());
        let service = ProgressService::new(store);

        let today = tasks
            .add(
                "u1",
                NewTask {
                    title: "today".to_string(),
                    due_date: Some(jan(1)),
                    ..NewTask::default()
                },
            )
            .await
            .unwrap();
        tasks
            .add(
                "u1",
                NewTask {
                    title: "undated".to_string(),
                    ..NewTask::default()
                },
            )
            .await
            .unwrap();
        tasks
            .add(
                "u1",
                NewTask {
                    title: "later".to_string(),
                    due_date: Some(jan(9)),
                    ..NewTask::default()
                },
            )
            .await
            .unwrap();
        tasks
            .update("u1", &today.id, TaskUpdate::completed(true))
            .await
            .unwrap();

        for prayer in [Prayer::Fajr, Prayer::Dhuhr] {
            prayers
                .update("u1", jan(1), PrayerUpdate::mark(prayer, true))
                .await
                .unwrap();
        }

        quran
            .save(
                "u1",
                NewQuranGoal {
                    goal_type: QuranGoalType::Page,
                    quantity: 4,
                },
            )
            .await
            .unwrap();
        quran.toggle_progress("u1", 0).await.unwrap();

        let progress = service.daily_progress("u1", jan(1)).await.unwrap();
        assert_eq!(progress.tasks, 50.0);
        assert_eq!(progress.prayers, 40.0);
        assert_eq!(progress.quran, 25.0);
    }

    #[tokio::test]
    async fn test_weekly_summary_spans_sunday_to_saturday() {
        let store = test_store().await;
        let prayers = PrayersService::new(store.clone());
        let service = ProgressService::new(store);

        // 2024-01-03 is a Wednesday
        prayers
            .update("u1", jan(1), PrayerUpdate::mark(Prayer::Isha, true))
            .await
            .unwrap();
        prayers
            .update("u1", jan(8), PrayerUpdate::mark(Prayer::Isha, true))
            .await
            .unwrap();

        let summary = service.weekly_summary("u1", jan(3)).await.unwrap();
        assert_eq!(summary.week_start, NaiveDate::from_ymd_opt(2023, 12, 31).unwrap());
        assert_eq!(summary.days.len(), 7);
        assert_eq!(summary.days[6].date, jan(6));
        assert_eq!(summary.prayers_completed, 1);
        assert_eq!(summary.lesson_days, 0);
    }
}
