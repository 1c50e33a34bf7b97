//! Error types for Namaa
//!
//! All errors use thiserror for structured error handling.
//! These errors can be serialized for UI collaborators.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Stored text under `key` could not be decoded into its collection type.
    #[error("Storage corruption under '{key}': {reason}")]
    StorageCorruption { key: String, reason: String },

    #[error("Invalid import payload: {0}")]
    InvalidImport(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    Generic(String),
}

impl serde::Serialize for AppError {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
