//! Trait definitions for the engine module.

use async_trait::async_trait;

use super::error::EngineError;
use super::models::ModelHandle;
use super::types::ParseOutput;

/// A parsing engine that converts document bytes into Markdown.
///
/// Implementations must be safe to call concurrently; the model handle is
/// read-only and shared across all invocations. Output is assumed
/// deterministic for identical input and model set.
#[async_trait]
pub trait ParseEngine: Send + Sync {
    /// Returns the name of this engine implementation.
    fn name(&self) -> &str;

    /// Parses one document.
    async fn parse(
        &self,
        bytes: &[u8],
        models: &ModelHandle,
    ) -> Result<ParseOutput, EngineError>;
}
