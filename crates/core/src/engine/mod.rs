//! Parsing engine abstraction.
//!
//! The engine converts one document's raw bytes into Markdown plus image and
//! metadata artifacts. The conversion itself is an opaque external concern;
//! this module defines the contract ([`ParseEngine`]), the read-only model
//! handle every invocation requires, and the subprocess-backed production
//! implementation ([`CommandEngine`]).

mod command;
mod error;
mod models;
mod traits;
mod types;

pub use command::CommandEngine;
pub use error::EngineError;
pub use models::{LoadedModel, ModelHandle, ModelLoader};
pub use traits::ParseEngine;
pub use types::ParseOutput;
