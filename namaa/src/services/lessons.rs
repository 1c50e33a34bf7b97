//! Lessons service
//!
//! Daily lesson quality ratings. Several entries may share a date.

use crate::database::{LessonDay, LessonUpdate, NewLessonDay};
use crate::error::Result;
use crate::storage::{new_record_id, Collection, RecordStore, StorageKey};

#[derive(Clone)]
pub struct LessonsService {
    store: RecordStore,
}

impl LessonsService {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    fn key(user_id: &str) -> Result<StorageKey> {
        StorageKey::for_user(Collection::Lessons, user_id)
    }

    pub async fn list(&self, user_id: &str) -> Result<Vec<LessonDay>> {
        self.store.load_list(&Self::key(user_id)?).await
    }

    pub async fn add(&self, user_id: &str, new_lesson: NewLessonDay) -> Result<LessonDay> {
        let lesson = LessonDay {
            id: new_record_id(),
            user_id: user_id.to_string(),
            date: new_lesson.date,
            focus: new_lesson.focus,
            interaction: new_lesson.interaction,
            homework: new_lesson.homework,
            mistake_reduction: new_lesson.mistake_reduction,
            respect_discipline: new_lesson.respect_discipline,
            tasks: new_lesson.tasks,
        };

        let stored = lesson.clone();
        self.store
            .modify_list(&Self::key(user_id)?, move |lessons: &mut Vec<LessonDay>| {
                lessons.push(stored);
                Ok(())
            })
            .await?;

        tracing::info!("Added lesson {} on {} for user {}", lesson.id, lesson.date, user_id);
        Ok(lesson)
    }

    pub async fn update(&self, user_id: &str, id: &str, update: LessonUpdate) -> Result<bool> {
        self.store
            .modify_list(&Self::key(user_id)?, |lessons: &mut Vec<LessonDay>| {
                Ok(match lessons.iter_mut().find(|l| l.id == id) {
                    Some(lesson) => {
                        update.apply(lesson);
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
            .modify_list(&Self::key(user_id)?, |lessons: &mut Vec<LessonDay>| {
                let before = lessons.len();
                lessons.retain(|l| l.id != id);
                Ok(lessons.len() != before)
            })
            .await?;

        if removed {
            tracing::info!("Deleted lesson {}", id);
        }
        Ok(removed)
    }
}
