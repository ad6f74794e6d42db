//! Error taxonomy for request handling.
//!
//! Startup code (CLI, config loading) works with [`anyhow::Result`]. Anything
//! that runs per request returns [`SynapsisError`], which the HTTP layer maps
//! to a status code and a machine-readable error code.
//!
//! Publish failures are deliberately absent: they are reported through
//! [`PublishOutcome`](crate::models::PublishOutcome) instead.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SynapsisError {
    /// Startup-fatal misconfiguration (missing API key, bad mode file).
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("invalid filename: {0:?}")]
    InvalidFilename(String),

    #[error("invalid mode id: {0}")]
    InvalidMode(String),

    #[error("failed to save file {}: {source}", path.display())]
    Persistence {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The language-model API failed; the message carries its diagnostic.
    #[error("AI request failed: {0}")]
    Upstream(String),
}

impl SynapsisError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn upstream(msg: impl Into<String>) -> Self {
        Self::Upstream(msg.into())
    }

    /// Machine-readable code used in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "configuration",
            Self::InvalidFilename(_) => "invalid_filename",
            Self::InvalidMode(_) => "invalid_mode",
            Self::Persistence { .. } => "persistence",
            Self::Upstream(_) => "upstream",
        }
    }

    /// `true` for errors caused by the caller's input.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::InvalidFilename(_) | Self::InvalidMode(_))
    }
}

pub type SynapsisResult<T> = Result<T, SynapsisError>;
