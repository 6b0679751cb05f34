//! Processor configuration, result, and error types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;

use crate::engine::EngineError;

/// Processor configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProcessorConfig {
    /// Whether extracted images are included in results.
    #[serde(default = "default_extract_images")]
    pub extract_images: bool,
    /// Per-document deadline in seconds. `None` means no deadline beyond
    /// the engine's own timeout.
    #[serde(default)]
    pub timeout_secs: Option<u64>,
}

fn default_extract_images() -> bool {
    true
}

impl Default for ProcessorConfig {
    fn default() -> Self {
        Self {
            extract_images: default_extract_images(),
            timeout_secs: None,
        }
    }
}

/// Error type for processing a single document.
#[derive(Debug, Error)]
pub enum ProcessError {
    /// The engine rejected or failed on the document.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The processor deadline elapsed before the engine finished.
    #[error("Processing exceeded deadline of {timeout_secs}s")]
    DeadlineExceeded { timeout_secs: u64 },
}

/// Outcome of converting one document.
///
/// This is the shape batch and background responses are built from. A
/// failed conversion is still a result (`status: "error"`), never a missing
/// entry.
#[derive(Debug, Clone, Serialize)]
pub struct DocumentResult {
    /// Source document name.
    pub filename: String,
    /// Converted Markdown; empty on failure.
    pub markdown: String,
    /// Engine-reported metadata; `null` on failure.
    pub metadata: serde_json::Value,
    /// Extracted images, base64-encoded, keyed by image name.
    pub images: BTreeMap<String, String>,
    /// `"ok"` or `"error"`.
    pub status: String,
    /// Wall-clock processing time in seconds.
    pub time: f64,
    /// Failure message; present only when `status` is `"error"`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl DocumentResult {
    /// Build a success result.
    pub fn ok(
        filename: String,
        markdown: String,
        metadata: serde_json::Value,
        images: BTreeMap<String, String>,
        time: f64,
    ) -> Self {
        Self {
            filename,
            markdown,
            metadata,
            images,
            status: "ok".to_string(),
            time,
            error: None,
        }
    }

    /// Build a failure result carrying the error message.
    pub fn error(filename: String, error: String, time: f64) -> Self {
        Self {
            filename,
            markdown: String::new(),
            metadata: serde_json::Value::Null,
            images: BTreeMap::new(),
            status: "error".to_string(),
            time,
            error: Some(error),
        }
    }

    /// Whether this result reports a successful conversion.
    pub fn is_ok(&self) -> bool {
        self.status == "ok"
    }
}
