use std::path::PathBuf;
use thiserror::Error;

/// Main error type for crossport operations
#[derive(Error, Debug)]
pub enum CrossportError {
    #[error("Project root not found: {}", .0.display())]
    RootNotFound(PathBuf),

    #[error("Project root {} is not readable: {source}", path.display())]
    RootUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid rule '{id}': {reason}")]
    InvalidRule { id: String, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Regex error: {0}")]
    Regex(#[from] regex::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Persistence error in {sink}: {reason}")]
    Persistence { sink: String, reason: String },
}

pub type Result<T> = std::result::Result<T, CrossportError>;
