//! Storage module
//!
//! Maps collections onto key-value slots and converts between stored text
//! and typed records.

pub mod codec;
pub mod keys;
pub mod record_store;

pub use keys::{storage_key, Collection, StorageKey, USER_COLLECTIONS};
pub use record_store::{new_record_id, RecordStore};
