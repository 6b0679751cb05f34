//! Error types for the engine module.

use thiserror::Error;

/// Errors that can occur while invoking the parsing engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// Processing was attempted before model initialization completed.
    /// Seeing this at runtime indicates a startup-ordering bug.
    #[error("Parsing models are not loaded yet")]
    ModelsNotReady,

    /// The engine itself failed on this document.
    #[error("Engine failed: {0}")]
    ParseFailed(String),

    /// The engine produced output that does not match the wire contract.
    #[error("Engine produced invalid output: {0}")]
    InvalidOutput(String),

    /// The engine invocation exceeded its configured time limit.
    #[error("Engine timed out after {timeout_secs} seconds")]
    Timeout { timeout_secs: u64 },

    /// I/O error talking to the engine or loading models.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
