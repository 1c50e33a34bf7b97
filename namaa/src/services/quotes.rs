//! Quotes service
//!
//! Global motivational quotes shared by all users. Until the collection is
//! first written, the built-in seed list is served without being persisted.

use crate::database::{seed_quotes, NewQuote, Quote, QuoteCategory};
use crate::error::{AppError, Result};
use crate::storage::{new_record_id, Collection, RecordStore, StorageKey};
use rand::seq::SliceRandom;

#[derive(Clone)]
pub struct QuotesService {
    store: RecordStore,
}

impl QuotesService {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    fn key() -> Result<StorageKey> {
        StorageKey::global(Collection::Quotes)
    }

    pub async fn list(&self) -> Result<Vec<Quote>> {
        Ok(self
            .store
            .load::<Vec<Quote>>(&Self::key()?)
            .await?
            .unwrap_or_else(seed_quotes))
    }

    pub async fn list_by_category(&self, category: QuoteCategory) -> Result<Vec<Quote>> {
        let quotes = self.list().await?;
        Ok(quotes.into_iter().filter(|q| q.category == category).collect())
    }

    pub async fn add(&self, new_quote: NewQuote) -> Result<Quote> {
        if new_quote.text.trim().is_empty() {
            return Err(AppError::Validation("quote text must not be empty".to_string()));
        }

        let quote = Quote {
            id: new_record_id(),
            text: new_quote.text,
            author: new_quote.author,
            category: new_quote.category,
            is_custom: new_quote.is_custom,
        };

        let stored = quote.clone();
        self.store
            .modify(&Self::key()?, move |slot: &mut Option<Vec<Quote>>| {
                slot.get_or_insert_with(seed_quotes).push(stored);
                Ok(())
            })
            .await?;

        tracing::info!("Added quote {}", quote.id);
        Ok(quote)
    }

    /// Delete a custom quote. Built-in quotes cannot be deleted.
    pub async fn delete(&self, id: &str) -> Result<bool> {
        self.store
            .modify(&Self::key()?, |slot: &mut Option<Vec<Quote>>| {
                let Some(quotes) = slot.as_mut() else {
                    return Ok(false);
                };
                let before = quotes.len();
                quotes.retain(|q| !(q.id == id && q.is_custom));
                Ok(quotes.len() != before)
            })
            .await
    }

    /// Pick a quote at random, optionally from one category
    pub async fn random(&self, category: Option<QuoteCategory>) -> Result<Option<Quote>> {
        let quotes = match category {
            Some(category) => self.list_by_category(category).await?,
            None => self.list().await?,
        };
        Ok(quotes.choose(&mut rand::thread_rng()).cloned())
    }
}
