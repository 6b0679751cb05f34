//! Bounded concurrent batch conversion.
//!
//! A batch fans its documents out over the shared worker pool and gathers
//! one result per document, in the order the documents arrived. Failures
//! are isolated: each document's outcome is independent of its neighbors.

use futures::future::join_all;
use tracing::info;

use crate::engine::ParseEngine;
use crate::metrics;
use crate::pool::{PoolStatus, WorkerPool};
use crate::processor::{DocumentProcessor, DocumentResult};

/// One document in a batch request.
#[derive(Debug, Clone)]
pub struct BatchDocument {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Runs batches of conversions over the shared worker pool.
pub struct BatchCoordinator<E: ParseEngine> {
    processor: DocumentProcessor<E>,
    pool: WorkerPool,
}

impl<E: ParseEngine + 'static> BatchCoordinator<E> {
    /// Creates a new coordinator over the shared worker pool.
    pub fn new(processor: DocumentProcessor<E>, pool: WorkerPool) -> Self {
        Self { processor, pool }
    }

    /// Convert every document in the batch.
    ///
    /// Returns exactly `documents.len()` results in input order; an empty
    /// batch yields an empty vector. At most the pool's worker limit run
    /// at once, counted jointly with background tasks.
    pub async fn convert_batch(&self, documents: Vec<BatchDocument>) -> Vec<DocumentResult> {
        let total = documents.len();
        metrics::BATCH_SIZE.with_label_values(&[]).observe(total as f64);
        info!("Converting batch of {} documents", total);

        let conversions = documents.into_iter().map(|doc| {
            let processor = self.processor.clone();
            let pool = self.pool.clone();
            async move {
                let permit = match pool.acquire().await {
                    Ok(permit) => permit,
                    Err(e) => {
                        return DocumentResult::error(doc.filename, e.to_string(), 0.0);
                    }
                };
                let result = processor.convert(&doc.filename, &doc.bytes).await;
                drop(permit);
                pool.record_outcome(result.is_ok());
                result
            }
        });

        let results = join_all(conversions).await;
        let failed = results.iter().filter(|r| !r.is_ok()).count();
        info!(
            "Batch finished: {} ok, {} failed",
            results.len() - failed,
            failed
        );
        results
    }

    /// Convert a single document on the shared pool.
    ///
    /// Same permit discipline as a batch member, without the batch
    /// bookkeeping; used by the synchronous conversion endpoint.
    pub async fn convert_one(&self, doc: BatchDocument) -> DocumentResult {
        let permit = match self.pool.acquire().await {
            Ok(permit) => permit,
            Err(e) => return DocumentResult::error(doc.filename, e.to_string(), 0.0),
        };
        let result = self.processor.convert(&doc.filename, &doc.bytes).await;
        drop(permit);
        self.pool.record_outcome(result.is_ok());
        result
    }

    /// Snapshot of the shared pool this coordinator draws from.
    pub fn pool_status(&self) -> PoolStatus {
        self.pool.status()
    }
}
