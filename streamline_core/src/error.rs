//! Error types for the streamline_core library.

use std::io;

use crate::pricing::PricingError;
use crate::recipe::RecipeError;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for streamline_core operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error occurred
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// TOML parsing error
    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),

    /// Configuration validation error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Recipe text could not be parsed
    #[error("Recipe error: {0}")]
    Recipe(#[from] RecipeError),

    /// A drink could not be priced
    #[error("Pricing error: {0}")]
    Pricing(#[from] PricingError),

    /// Requested entity does not exist for this user
    #[error("{kind} not found: {key}")]
    NotFound { kind: &'static str, key: String },

    /// An entity with the same name already exists
    #[error("{kind} already exists: {name}")]
    Duplicate { kind: &'static str, name: String },

    /// The user id is missing or not acceptable
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Entity failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// A persisted collection exists but cannot be read
    #[error("Corrupt data file {path}: {reason}")]
    Corrupt { path: String, reason: String },
}

impl Error {
    pub(crate) fn not_found(kind: &'static str, key: impl Into<String>) -> Self {
        Error::NotFound {
            kind,
            key: key.into(),
        }
    }
}
