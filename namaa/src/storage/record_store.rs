//! Typed access to key-value slots
//!
//! `RecordStore` pairs the repository with the codec. Reads of an absent
//! slot yield `None` (or an empty list); reads of a slot that fails to
//! decode yield `AppError::StorageCorruption` and never a silent default.

use super::codec::{decode, encode};
use super::keys::StorageKey;
use crate::database::{Repository, SlotWrite, Validate};
use crate::error::Result;
use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

/// Fresh identifier for a new record
pub fn new_record_id() -> String {
    Uuid::new_v4().to_string()
}

#[derive(Clone)]
pub struct RecordStore {
    repo: Repository,
}

impl RecordStore {
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    pub async fn load<T>(&self, key: &StorageKey) -> Result<Option<T>>
    where
        T: DeserializeOwned + Validate,
    {
        match self.repo.get_item(key.as_str()).await? {
            Some(text) => decode(key.as_str(), &text).map(Some),
            None => Ok(None),
        }
    }

    /// Load a list collection; an absent slot is an empty list
    pub async fn load_list<T>(&self, key: &StorageKey) -> Result<Vec<T>>
    where
        T: DeserializeOwned + Validate,
    {
        Ok(self.load::<Vec<T>>(key).await?.unwrap_or_default())
    }

    pub async fn store<T: Serialize + ?Sized>(&self, key: &StorageKey, value: &T) -> Result<()> {
        let text = encode(value)?;
        self.repo.set_item(key.as_str(), &text).await
    }

    pub async fn remove(&self, key: &StorageKey) -> Result<()> {
        self.repo.remove_item(key.as_str()).await?;
        Ok(())
    }

    /// Read-modify-write of one slot as a single atomic step.
    ///
    /// `f` sees the decoded value (`None` when absent) and may change it or
    /// set it to `None` to remove the slot. The slot is only rewritten when
    /// the encoded text actually changes. Errors from decoding or from `f`
    /// leave the slot untouched.
    pub async fn modify<T, R, F>(&self, key: &StorageKey, f: F) -> Result<R>
    where
        T: Serialize + DeserializeOwned + Validate,
        F: FnOnce(&mut Option<T>) -> Result<R>,
    {
        let key_name = key.as_str();
        self.repo
            .modify_item(key_name, |current| {
                let mut value: Option<T> = decode_slot(key_name, current)?;
                let output = f(&mut value)?;
                Ok((slot_write(value, current)?, output))
            })
            .await
    }

    /// Read-modify-write of two slots in one transaction. Both slots are
    /// written together or not at all.
    pub async fn modify_pair<A, B, R, F>(
        &self,
        first: &StorageKey,
        second: &StorageKey,
        f: F,
    ) -> Result<R>
    where
        A: Serialize + DeserializeOwned + Validate,
        B: Serialize + DeserializeOwned + Validate,
        F: FnOnce(&mut Option<A>, &mut Option<B>) -> Result<R>,
    {
        let (first, second) = (first.as_str(), second.as_str());
        self.repo
            .modify_items(&[first, second], |current| {
                let (a_text, b_text) = (current[0].as_deref(), current[1].as_deref());
                let mut a: Option<A> = decode_slot(first, a_text)?;
                let mut b: Option<B> = decode_slot(second, b_text)?;
                let output = f(&mut a, &mut b)?;
                let writes = vec![slot_write(a, a_text)?, slot_write(b, b_text)?];
                Ok((writes, output))
            })
            .await
    }

    /// Read-modify-write of a list collection.
    ///
    /// An absent slot is presented as an empty list and stays absent if `f`
    /// leaves it empty.
    pub async fn modify_list<T, R, F>(&self, key: &StorageKey, f: F) -> Result<R>
    where
        T: Serialize + DeserializeOwned + Validate,
        F: FnOnce(&mut Vec<T>) -> Result<R>,
    {
        self.modify::<Vec<T>, R, _>(key, |slot| {
            let was_absent = slot.is_none();
            let mut list = slot.take().unwrap_or_default();
            let output = f(&mut list)?;
            if !(was_absent && list.is_empty()) {
                *slot = Some(list);
            }
            Ok(output)
        })
        .await
    }

    /// Apply several writes atomically
    pub async fn apply_batch(&self, writes: Vec<(StorageKey, SlotWrite)>) -> Result<()> {
        let writes = writes
            .into_iter()
            .map(|(key, write)| (key.as_str().to_string(), write))
            .collect();
        self.repo.write_batch(writes).await
    }
}

fn decode_slot<T>(key: &str, text: Option<&str>) -> Result<Option<T>>
where
    T: DeserializeOwned + Validate,
{
    text.map(|text| decode(key, text)).transpose()
}

/// Write needed to move a slot from `current` to `value`; unchanged text is kept
fn slot_write<T: Serialize>(value: Option<T>, current: Option<&str>) -> Result<SlotWrite> {
    Ok(match (value, current) {
        (None, None) => SlotWrite::Keep,
        (None, Some(_)) => SlotWrite::Remove,
        (Some(v), previous) => {
            let text = encode(&v)?;
            if previous == Some(text.as_str()) {
                SlotWrite::Keep
            } else {
                SlotWrite::Set(text)
            }
        }
    })
}
