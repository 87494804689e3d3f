//! Error type shared by the chemsafe crates

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
    /// Store query or transaction failed
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Root folder or database file could not be prepared
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Config file missing, unreadable or malformed
    #[error("Config file {}: {reason}", path.display())]
    Config { path: PathBuf, reason: String },

    /// Store left in a state it should never reach
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    pub fn config(path: impl Into<PathBuf>, reason: impl std::fmt::Display) -> Self {
        Error::Config {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
