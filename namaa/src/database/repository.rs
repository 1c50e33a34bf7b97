//! Repository layer for database operations
//!
//! Every collection lives in a single `kv_items` row keyed by its storage
//! key. Read-modify-write cycles run inside one transaction, and writers in
//! this process are serialized so no two cycles interleave on a key.

use crate::error::Result;
use chrono::Utc;
use sqlx::{Sqlite, SqlitePool, Transaction};
use std::sync::Arc;
use tokio::sync::Mutex;

/// What to do with a slot at the end of a read-modify-write cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SlotWrite {
    Keep,
    Set(String),
    Remove,
}

/// Repository for database operations
#[derive(Clone)]
pub struct Repository {
    pool: SqlitePool,
    write_lock: Arc<Mutex<()>>,
}

impl Repository {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            write_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Read the raw text stored under `key`
    pub async fn get_item(&self, key: &str) -> Result<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM kv_items WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value)
    }

    /// Replace the text stored under `key`
    pub async fn set_item(&self, key: &str, value: &str) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;
        upsert(&mut tx, key, value).await?;
        tx.commit().await?;

        tracing::debug!("Set item: {} ({} bytes)", key, value.len());
        Ok(())
    }

    /// Delete the slot. Removing an absent key is not an error.
    pub async fn remove_item(&self, key: &str) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let result = sqlx::query("DELETE FROM kv_items WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await?;

        tracing::debug!("Removed item: {}", key);
        Ok(result.rows_affected() > 0)
    }

    /// Read the slot, let `f` decide its new content, and write it back
    /// atomically. If `f` fails nothing is written.
    pub async fn modify_item<T, F>(&self, key: &str, f: F) -> Result<T>
    where
        F: FnOnce(Option<&str>) -> Result<(SlotWrite, T)>,
    {
        self.modify_items(&[key], |current| {
            let (write, output) = f(current[0].as_deref())?;
            Ok((vec![write], output))
        })
        .await
    }

    /// Read-modify-write of several slots in one transaction.
    ///
    /// `f` receives the current text of each key in order and returns one
    /// write per key. Missing trailing writes count as `Keep`.
    pub async fn modify_items<T, F>(&self, keys: &[&str], f: F) -> Result<T>
    where
        F: FnOnce(&[Option<String>]) -> Result<(Vec<SlotWrite>, T)>,
    {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        let mut current = Vec::with_capacity(keys.len());
        for key in keys {
            let value: Option<String> =
                sqlx::query_scalar("SELECT value FROM kv_items WHERE key = ?")
                    .bind(*key)
                    .fetch_optional(&mut *tx)
                    .await?;
            current.push(value);
        }

        let (writes, output) = f(&current)?;

        for (key, write) in keys.iter().zip(&writes) {
            match write {
                SlotWrite::Keep => {}
                SlotWrite::Set(value) => upsert(&mut tx, key, value).await?,
                SlotWrite::Remove => delete(&mut tx, key).await?,
            }
        }

        tx.commit().await?;

        for (key, write) in keys.iter().zip(&writes) {
            if *write != SlotWrite::Keep {
                tracing::debug!("Modified item: {}", key);
            }
        }
        Ok(output)
    }

    /// Apply several slot writes in one transaction
    pub async fn write_batch(&self, writes: Vec<(String, SlotWrite)>) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await?;

        for (key, write) in &writes {
            match write {
                SlotWrite::Keep => {}
                SlotWrite::Set(value) => upsert(&mut tx, key, value).await?,
                SlotWrite::Remove => delete(&mut tx, key).await?,
            }
        }

        tx.commit().await?;

        tracing::debug!("Applied batch of {} writes", writes.len());
        Ok(())
    }
}

async fn upsert(tx: &mut Transaction<'_, Sqlite>, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO kv_items (key, value, updated_at) VALUES (?, ?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
        "#,
    )
    .bind(key)
    .bind(value)
    .bind(Utc::now().to_rfc3339())
    .execute(&mut **tx)
    .await?;

    Ok(())
}

async fn delete(tx: &mut Transaction<'_, Sqlite>, key: &str) -> Result<()> {
    sqlx::query("DELETE FROM kv_items WHERE key = ?")
        .bind(key)
        .execute(&mut **tx)
        .await?;

    Ok(())
}
