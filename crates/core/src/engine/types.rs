//! Types for the engine module.

use std::collections::BTreeMap;

/// Raw output of one engine invocation.
///
/// Images are keyed by the engine-generated artifact name and carried as raw
/// encoded image bytes (PNG); downstream components decide how to present
/// them. Metadata is an opaque JSON document owned by the engine.
#[derive(Debug, Clone, Default)]
pub struct ParseOutput {
    /// Extracted document text as Markdown.
    pub markdown: String,
    /// Embedded images, name to raw image bytes.
    pub images: BTreeMap<String, Vec<u8>>,
    /// Engine-reported metadata (page count, languages, ...).
    pub metadata: serde_json::Value,
}
