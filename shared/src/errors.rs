//! Shared error types for script loading and step parsing

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SharedError {
    #[error("Failed to read script {path}: {source}")]
    ScriptRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse script: {message}")]
    ScriptParse { message: String },

    #[error("Invalid step: {message}")]
    InvalidStep { message: String },

    #[error("Invalid think duration: {value}")]
    InvalidThink { value: String },
}

pub type SharedResult<T> = Result<T, SharedError>;
