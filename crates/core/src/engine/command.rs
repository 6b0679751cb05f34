//! Subprocess-backed parsing engine implementation.
//!
//! Wire contract: the engine executable receives the raw document on stdin
//! and writes a single JSON object to stdout:
//!
//! ```json
//! {
//!   "markdown": "...",
//!   "metadata": { ... },
//!   "images": { "figure_1.png": "<base64>" }
//! }
//! ```
//!
//! A non-zero exit code fails the document; stderr is captured into the
//! error message.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::process::Stdio;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tokio::time::{timeout, Duration};
use tracing::debug;

use crate::config::CommandConfig;

use super::error::EngineError;
use super::models::ModelHandle;
use super::traits::ParseEngine;
use super::types::ParseOutput;

/// JSON document emitted by the engine executable.
#[derive(Debug, Deserialize)]
struct EngineWireOutput {
    markdown: String,
    #[serde(default)]
    metadata: serde_json::Value,
    #[serde(default)]
    images: BTreeMap<String, String>,
}

/// Parsing engine that shells out to an external executable.
pub struct CommandEngine {
    config: CommandConfig,
}

impl CommandEngine {
    /// Creates a new subprocess engine with the given configuration.
    pub fn new(config: CommandConfig) -> Self {
        Self { config }
    }

    fn decode_wire_output(wire: EngineWireOutput) -> Result<ParseOutput, EngineError> {
        let mut images = BTreeMap::new();
        for (name, encoded) in wire.images {
            let bytes = STANDARD.decode(encoded.as_bytes()).map_err(|e| {
                EngineError::InvalidOutput(format!("image {} is not valid base64: {}", name, e))
            })?;
            images.insert(name, bytes);
        }

        Ok(ParseOutput {
            markdown: wire.markdown,
            images,
            metadata: wire.metadata,
        })
    }

    async fn run_engine(&self, bytes: &[u8], models: &ModelHandle) -> Result<Vec<u8>, EngineError> {
        let mut child = Command::new(&self.config.program)
            .args(&self.config.args)
            .env("PAPERMILL_MODEL_DIR", models.model_dir())
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::ParseFailed("engine stdin unavailable".to_string()))?;
        stdin.write_all(bytes).await?;
        stdin.shutdown().await?;
        drop(stdin);

        let output = child.wait_with_output().await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::ParseFailed(format!(
                "engine exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        Ok(output.stdout)
    }
}

#[async_trait]
impl ParseEngine for CommandEngine {
    fn name(&self) -> &str {
        "command"
    }

    async fn parse(
        &self,
        bytes: &[u8],
        models: &ModelHandle,
    ) -> Result<ParseOutput, EngineError> {
        debug!(
            "Invoking engine {} on {} bytes",
            self.config.program,
            bytes.len()
        );

        let timeout_secs = self.config.timeout_secs;
        let stdout = timeout(
            Duration::from_secs(timeout_secs),
            self.run_engine(bytes, models),
        )
        .await
        .map_err(|_| EngineError::Timeout { timeout_secs })??;

        let wire: EngineWireOutput = serde_json::from_slice(&stdout)
            .map_err(|e| EngineError::InvalidOutput(e.to_string()))?;

        Self::decode_wire_output(wire)
    }
}
