//! Document processing on top of a parse engine.
//!
//! The processor wraps an engine with the concerns every conversion shares:
//! model availability, wall-clock measurement, an optional deadline, and
//! packaging of the outcome into a per-document result that reports failure
//! instead of propagating it.

mod document;
mod types;

pub use document::DocumentProcessor;
pub use types::{DocumentResult, ProcessError, ProcessorConfig};
