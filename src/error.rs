//! Error types for zone-reconcile.

use thiserror::Error;

use crate::record::RecordError;

/// Boxed error produced by a client implementation.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Result alias used throughout the crate.
pub type Result<T, E = Error> = std::result::Result<T, E>;

/// Errors that can occur while reconciling a zone.
#[derive(Debug, Error)]
pub enum Error {
    /// The remote zone changed between fetch and submit.
    ///
    /// Clients return this from `submit` to ask for a fresh attempt.
    #[error("update failed because remote was changed")]
    Conflict,

    /// The caller's cancellation token fired.
    #[error("operation cancelled")]
    Cancelled,

    /// A bounded retry policy ran out of attempts on conflicts.
    #[error("gave up after {attempts} conflicting attempts")]
    RetriesExhausted {
        /// Number of attempts made.
        attempts: u32,
    },

    /// A fetched record could not be converted into its typed form.
    #[error("Record parse error: {0}")]
    Record(#[from] RecordError),

    /// The store refused the submitted snapshot.
    #[error("zone update rejected: {0}")]
    Rejected(String),

    /// Any other failure reported by a client.
    #[error("Client error: {0}")]
    Client(#[source] BoxError),

    /// IO error (file store, sinks).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON encoding or decoding failed.
    #[error("Serialization error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP client error.
    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl Error {
    /// Wrap a foreign client error.
    pub fn client(err: impl Into<BoxError>) -> Self {
        Error::Client(err.into())
    }

    /// True for the optimistic-concurrency sentinel.
    pub fn is_conflict(&self) -> bool {
        matches!(self, Error::Conflict)
    }
}
