//! Testing utilities and mock implementations for E2E tests.
//!
//! Provides a controllable in-process parse engine so orchestration can be
//! tested without spawning real engine subprocesses.

mod mock_engine;

pub use mock_engine::MockEngine;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::engine::ModelLoader;

static FIXTURE_SEQ: AtomicU64 = AtomicU64::new(0);

/// Owns a fixture model directory and removes it on drop.
pub struct ModelDirGuard {
    dir: PathBuf,
}

impl ModelDirGuard {
    /// Path of the model directory, for planting model files before use.
    pub fn path(&self) -> &Path {
        &self.dir
    }
}

impl Drop for ModelDirGuard {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.dir);
    }
}

/// Build an already-initialized model loader over a fresh empty model
/// directory. The guard removes the directory when dropped; hold it for
/// as long as the directory must exist on disk.
pub async fn ready_models() -> (Arc<ModelLoader>, ModelDirGuard) {
    let dir = std::env::temp_dir().join(format!(
        "papermill-models-{}-{}",
        std::process::id(),
        FIXTURE_SEQ.fetch_add(1, Ordering::Relaxed)
    ));
    std::fs::create_dir_all(&dir).expect("create model fixture dir");
    let loader = Arc::new(ModelLoader::new(EngineConfig {
        model_dir: dir.clone(),
        ..Default::default()
    }));
    loader.initialize().await.expect("initialize model fixture");
    (loader, ModelDirGuard { dir })
}
