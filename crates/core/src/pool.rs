//! Shared bounded worker pool for engine invocations.
//!
//! One pool caps engine concurrency process-wide: batch conversions and
//! background tasks draw permits from the same semaphore, so the configured
//! limit holds across both paths combined. Waiting for a permit queues;
//! nothing is rejected for load.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::{OwnedSemaphorePermit, Semaphore};

use crate::config::PoolConfig;

/// Pool error type.
#[derive(Debug, Error)]
pub enum PoolError {
    /// The pool semaphore was closed. Does not happen in normal operation.
    #[error("Worker pool is shut down")]
    Closed,
}

/// Tracks statistics for the worker pool.
struct PoolStats {
    active: AtomicU64,
    queued: AtomicU64,
    total_processed: AtomicU64,
    total_failed: AtomicU64,
}

impl Default for PoolStats {
    fn default() -> Self {
        Self {
            active: AtomicU64::new(0),
            queued: AtomicU64::new(0),
            total_processed: AtomicU64::new(0),
            total_failed: AtomicU64::new(0),
        }
    }
}

/// Point-in-time snapshot of pool occupancy.
#[derive(Debug, Clone, Serialize)]
pub struct PoolStatus {
    pub max_workers: usize,
    pub active_jobs: usize,
    pub queued_jobs: usize,
    pub total_processed: u64,
    pub total_failed: u64,
}

/// Cheap-to-clone handle to the shared pool.
#[derive(Clone)]
pub struct WorkerPool {
    semaphore: Arc<Semaphore>,
    stats: Arc<PoolStats>,
    max_workers: usize,
}

impl WorkerPool {
    /// Create a pool admitting at most `config.max_workers` jobs at once.
    pub fn new(config: &PoolConfig) -> Self {
        Self {
            semaphore: Arc::new(Semaphore::new(config.max_workers)),
            stats: Arc::new(PoolStats::default()),
            max_workers: config.max_workers,
        }
    }

    /// Wait for a worker slot. The returned permit releases the slot on
    /// drop; while waiting, the job is counted as queued.
    pub async fn acquire(&self) -> Result<PoolPermit, PoolError> {
        self.stats.queued.fetch_add(1, Ordering::Relaxed);
        let acquired = Arc::clone(&self.semaphore).acquire_owned().await;
        self.stats.queued.fetch_sub(1, Ordering::Relaxed);
        let permit = acquired.map_err(|_| PoolError::Closed)?;
        self.stats.active.fetch_add(1, Ordering::Relaxed);
        Ok(PoolPermit {
            _permit: permit,
            stats: Arc::clone(&self.stats),
        })
    }

    /// Record the outcome of a job after its permit is released.
    pub fn record_outcome(&self, success: bool) {
        if success {
            self.stats.total_processed.fetch_add(1, Ordering::Relaxed);
        } else {
            self.stats.total_failed.fetch_add(1, Ordering::Relaxed);
        }
    }

    /// Snapshot current occupancy.
    pub fn status(&self) -> PoolStatus {
        PoolStatus {
            max_workers: self.max_workers,
            active_jobs: self.stats.active.load(Ordering::Relaxed) as usize,
            queued_jobs: self.stats.queued.load(Ordering::Relaxed) as usize,
            total_processed: self.stats.total_processed.load(Ordering::Relaxed),
            total_failed: self.stats.total_failed.load(Ordering::Relaxed),
        }
    }

    /// Configured concurrency limit.
    pub fn max_workers(&self) -> usize {
        self.max_workers
    }
}

/// RAII worker slot; dropping it frees the slot for the next waiter.
pub struct PoolPermit {
    _permit: OwnedSemaphorePermit,
    stats: Arc<PoolStats>,
}

impl Drop for PoolPermit {
    fn drop(&mut self) {
        self.stats.active.fetch_sub(1, Ordering::Relaxed);
    }
}
