//! Capture session errors

use dispatcher::DispatcherError;
use sync_engine::AssemblerError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum CaptureError {
    /// Rejected before any transport interaction
    #[error("invalid session configuration: {0}")]
    Config(#[from] AssemblerError),

    #[error("dispatch failed: {0}")]
    Dispatch(#[from] DispatcherError),

    /// The session task panicked or was aborted
    #[error("session task failed: {0}")]
    Task(String),
}

pub type Result<T> = std::result::Result<T, CaptureError>;
