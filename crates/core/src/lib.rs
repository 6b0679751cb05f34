pub mod batch;
pub mod config;
pub mod engine;
pub mod executor;
pub mod metrics;
pub mod pool;
pub mod processor;
pub mod storage;
pub mod task;
pub mod testing;

pub use batch::{BatchCoordinator, BatchDocument};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, SanitizedConfig,
};
pub use engine::{CommandEngine, EngineError, ModelHandle, ModelLoader, ParseEngine};
pub use executor::{BackgroundExecutor, TASK_SUCCESS_MESSAGE};
pub use pool::{PoolStatus, WorkerPool};
pub use processor::{DocumentProcessor, DocumentResult, ProcessorConfig};
pub use storage::{DocumentStore, SqliteDocumentStore, StorageError, StoredDocument};
pub use task::{SqliteTaskStore, Task, TaskError, TaskFilter, TaskStatus, TaskStore};
