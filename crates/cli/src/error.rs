//! Error types for CLI operations.

use capture::CaptureError;
use contracts::ContractError;
use dispatcher::DispatcherError;
use ingestion::IngestionError;
use thiserror::Error;

/// CLI-specific error types
#[derive(Error, Debug)]
pub enum CliError {
    /// Configuration file not found
    #[error("Configuration file not found: {path}")]
    ConfigNotFound { path: String },

    /// Configuration parsing or validation error
    #[error(transparent)]
    Config(#[from] ContractError),

    /// Byte source could not be opened
    #[error("Failed to open {source_kind} source: {source}")]
    Source {
        source_kind: &'static str,
        #[source]
        source: IngestionError,
    },

    /// Sink setup failed
    #[error("Failed to set up sinks: {0}")]
    Sinks(#[from] DispatcherError),

    /// Capture session error
    #[error("Capture session failed: {0}")]
    Session(#[from] CaptureError),

    /// Generic error wrapper
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl CliError {
    pub fn config_not_found(path: impl Into<String>) -> Self {
        Self::ConfigNotFound { path: path.into() }
    }

    pub fn open_source(source_kind: &'static str, source: IngestionError) -> Self {
        Self::Source {
            source_kind,
            source,
        }
    }
}

/// Result type alias for CLI operations
pub type Result<T> = std::result::Result<T, CliError>;
