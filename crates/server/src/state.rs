use std::sync::Arc;

use papermill_core::{
    BackgroundExecutor, BatchCoordinator, Config, DocumentStore, ModelLoader, ParseEngine,
    SanitizedConfig, TaskStore, WorkerPool,
};

/// Shared application state, generic over the parse engine so tests can
/// run the full router against a mock.
pub struct AppState<E: ParseEngine> {
    config: Config,
    models: Arc<ModelLoader>,
    tasks: Arc<dyn TaskStore>,
    documents: Arc<dyn DocumentStore>,
    executor: BackgroundExecutor<E>,
    coordinator: BatchCoordinator<E>,
    pool: WorkerPool,
}

impl<E: ParseEngine + 'static> AppState<E> {
    pub fn new(
        config: Config,
        models: Arc<ModelLoader>,
        tasks: Arc<dyn TaskStore>,
        documents: Arc<dyn DocumentStore>,
        executor: BackgroundExecutor<E>,
        coordinator: BatchCoordinator<E>,
        pool: WorkerPool,
    ) -> Self {
        Self {
            config,
            models,
            tasks,
            documents,
            executor,
            coordinator,
            pool,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn models(&self) -> &ModelLoader {
        &self.models
    }

    pub fn tasks(&self) -> &dyn TaskStore {
        self.tasks.as_ref()
    }

    pub fn documents(&self) -> &dyn DocumentStore {
        self.documents.as_ref()
    }

    pub fn executor(&self) -> &BackgroundExecutor<E> {
        &self.executor
    }

    pub fn coordinator(&self) -> &BatchCoordinator<E> {
        &self.coordinator
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }
}
