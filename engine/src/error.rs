//! Engine error types

use thiserror::Error;

/// Result type for engine operations
pub type EngineResult<T> = Result<T, EngineError>;

/// Engine error types
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{message}")]
    Config { message: String },

    #[error("json must be set")]
    MissingTemplate,

    #[error("Template error: {message}")]
    Template { message: String },

    #[error("Publish failed: {message}")]
    Publish { message: String },

    #[error("Topic publisher has not been initialized for this scenario")]
    PublisherNotInitialized,

    #[error("HTTP client error: {message}")]
    Http { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config { message: message.into() }
    }

    pub fn template(message: impl Into<String>) -> Self {
        Self::Template { message: message.into() }
    }

    pub fn publish(message: impl Into<String>) -> Self {
        Self::Publish { message: message.into() }
    }
}
