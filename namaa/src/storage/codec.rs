//! Text codec for stored collections
//!
//! Values are stored as JSON text. Decoding also runs the record's
//! `Validate` checks, so a slot that parses but breaks an invariant is
//! reported as corrupt.

use crate::database::Validate;
use crate::error::{AppError, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;

pub fn encode<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    Ok(serde_json::to_string(value)?)
}

/// Decode the text stored under `key`
pub fn decode<T>(key: &str, text: &str) -> Result<T>
where
    T: DeserializeOwned + Validate,
{
    let value: T = serde_json::from_str(text).map_err(|e| AppError::StorageCorruption {
        key: key.to_string(),
        reason: e.to_string(),
    })?;

    value.validate().map_err(|reason| AppError::StorageCorruption {
        key: key.to_string(),
        reason,
    })?;

    Ok(value)
}
