//! Error types for chemsafe-loader
//!
//! Per-candidate failures (`Fetch`, `UnnormalizableUri`, `MissingData`) are
//! contained by the resolver: the candidate is logged and skipped. "Nothing
//! found" is not an error at all, resolution returns `Ok(None)`.

use thiserror::Error;

/// Loader error type
#[derive(Debug, Error)]
pub enum LoaderError {
    /// Both the primary and the fallback transport failed for one URI
    #[error("Fetch failed for {uri}: {reason}")]
    Fetch { uri: String, reason: String },

    /// A scraped link does not have the shape of the source's URLs
    #[error("URL {uri} could not be normalized against {base}")]
    UnnormalizableUri { uri: String, base: String },

    /// Expected structural content is absent from a fetched page
    #[error("Missing data in {uri}: {what}")]
    MissingData { uri: String, what: String },

    /// Malformed content or configuration value
    #[error("Parse error: {0}")]
    Parse(String),

    /// HTTP client could not be constructed
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON decoding error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Canonical store error
    #[error("Store error: {0}")]
    Store(#[from] chemsafe_common::Error),
}

impl LoaderError {
    /// Failure confined to a single candidate; siblings keep being processed
    pub fn is_candidate_scoped(&self) -> bool {
        matches!(
            self,
            LoaderError::Fetch { .. }
                | LoaderError::UnnormalizableUri { .. }
                | LoaderError::MissingData { .. }
                | LoaderError::Parse(_)
                | LoaderError::Json(_)
        )
    }

    pub fn missing(uri: &str, what: impl Into<String>) -> Self {
        LoaderError::MissingData {
            uri: uri.to_string(),
            what: what.into(),
        }
    }
}

impl From<sqlx::Error> for LoaderError {
    fn from(err: sqlx::Error) -> Self {
        LoaderError::Store(chemsafe_common::Error::Database(err))
    }
}

/// Result type for loader operations
pub type LoaderResult<T> = Result<T, LoaderError>;
