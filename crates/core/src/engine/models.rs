//! Model handle loading and lifecycle.
//!
//! The parsing engine depends on a set of model artifacts that are expensive
//! to load and must never be reloaded while the process runs. The loader
//! performs a single-shot initialization; after that the handle is read-only
//! and safe for unbounded concurrent readers.

use std::path::PathBuf;
use std::sync::Arc;

use tokio::sync::OnceCell;
use tracing::{debug, info};

use crate::config::EngineConfig;

use super::error::EngineError;

/// One model artifact available to the engine.
#[derive(Debug, Clone)]
pub struct LoadedModel {
    /// Artifact name (file name inside the model directory).
    pub name: String,
    /// Absolute path on disk.
    pub path: PathBuf,
    /// Artifact size in bytes.
    pub size_bytes: u64,
}

/// Read-only view of the loaded model set.
///
/// Built exactly once at startup; never mutated afterwards. Every document
/// processing call requires a reference to this handle.
#[derive(Debug)]
pub struct ModelHandle {
    model_dir: PathBuf,
    models: Vec<LoadedModel>,
}

impl ModelHandle {
    /// Directory the models were loaded from.
    pub fn model_dir(&self) -> &PathBuf {
        &self.model_dir
    }

    /// The loaded model artifacts.
    pub fn models(&self) -> &[LoadedModel] {
        &self.models
    }

    /// Total bytes across all loaded artifacts.
    pub fn total_size_bytes(&self) -> u64 {
        self.models.iter().map(|m| m.size_bytes).sum()
    }
}

/// Single-shot loader guarding model initialization.
pub struct ModelLoader {
    config: EngineConfig,
    handle: OnceCell<Arc<ModelHandle>>,
}

impl ModelLoader {
    /// Create a loader; no models are touched until [`initialize`] is called.
    ///
    /// [`initialize`]: ModelLoader::initialize
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            handle: OnceCell::new(),
        }
    }

    /// Load all models. Idempotent: concurrent and repeated calls share the
    /// one initialization; only the first does the work.
    pub async fn initialize(&self) -> Result<Arc<ModelHandle>, EngineError> {
        self.handle
            .get_or_try_init(|| async {
                let handle = Self::load(&self.config).await?;
                info!(
                    "Loaded {} model artifacts ({} bytes) from {:?}",
                    handle.models.len(),
                    handle.total_size_bytes(),
                    handle.model_dir
                );
                Ok(Arc::new(handle))
            })
            .await
            .cloned()
    }

    /// Return the ready handle, or fail if initialization has not completed.
    pub fn get(&self) -> Result<Arc<ModelHandle>, EngineError> {
        self.handle
            .get()
            .cloned()
            .ok_or(EngineError::ModelsNotReady)
    }

    async fn load(config: &EngineConfig) -> Result<ModelHandle, EngineError> {
        let model_dir = config.model_dir.clone();
        let mut entries = tokio::fs::read_dir(&model_dir).await?;

        let mut models = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let metadata = entry.metadata().await?;
            if !metadata.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            debug!("Registering model artifact: {}", name);
            models.push(LoadedModel {
                name,
                path: entry.path(),
                size_bytes: metadata.len(),
            });
        }

        models.sort_by(|a, b| a.name.cmp(&b.name));

        Ok(ModelHandle { model_dir, models })
    }
}
