//! Error types for the onboarding service.

use serde::{Deserialize, Serialize};

/// Top-level error type for the service.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Onboarding error: {0}")]
    Onboarding(#[from] OnboardingError),

    #[error("Upload error: {0}")]
    Upload(#[from] UploadError),
}

/// Database-related errors.
///
/// A missing row is never an error: `get_*` repository calls return
/// `Option::None` for absent records.
#[derive(Debug, thiserror::Error)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    Pool(String),

    #[error("Query failed: {0}")]
    Query(String),

    #[error("Constraint violation: {0}")]
    Constraint(String),

    #[error("Migration failed: {0}")]
    Migration(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

/// Wizard-level errors surfaced by the controller and progress store.
#[derive(Debug, thiserror::Error)]
pub enum OnboardingError {
    #[error("Too many {action} attempts, try again later")]
    RateLimited { action: &'static str },

    #[error("Invalid transition from step {step}: {reason}")]
    InvalidTransition { step: u32, reason: String },

    #[error("Backend failure: {0}")]
    Backend(#[from] DatabaseError),
}

/// Upload constraint errors, checked before any network or disk I/O.
#[derive(Debug, thiserror::Error)]
pub enum UploadError {
    #[error("File too large: {size} bytes (max {max})")]
    TooLarge { size: usize, max: usize },

    #[error("Unsupported file type: {mime}")]
    UnsupportedType { mime: String },

    #[error("Upload failed: {0}")]
    Backend(String),
}

/// A field-level validation error.
///
/// Validation returns all errors for a step at once; it never fails fast
/// and never panics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

impl FieldError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
