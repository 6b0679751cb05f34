//! The document processor.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;
use tokio::time::{timeout, Duration};
use tracing::{debug, warn};

use crate::engine::{ModelLoader, ParseEngine, ParseOutput};
use crate::metrics;

use super::types::{DocumentResult, ProcessError, ProcessorConfig};

/// Converts single documents through a parse engine.
///
/// Cheap to clone and share; every conversion resolves the model handle
/// through the loader, so a processor constructed before model loading
/// reports `ModelsNotReady` rather than panicking.
pub struct DocumentProcessor<E: ParseEngine> {
    engine: Arc<E>,
    models: Arc<ModelLoader>,
    config: ProcessorConfig,
}

impl<E: ParseEngine> Clone for DocumentProcessor<E> {
    fn clone(&self) -> Self {
        Self {
            engine: self.engine.clone(),
            models: self.models.clone(),
            config: self.config.clone(),
        }
    }
}

impl<E: ParseEngine> DocumentProcessor<E> {
    /// Creates a new processor.
    pub fn new(engine: Arc<E>, models: Arc<ModelLoader>, config: ProcessorConfig) -> Self {
        Self {
            engine,
            models,
            config,
        }
    }

    /// Runs the engine on one document, applying the configured deadline.
    pub async fn process(&self, bytes: &[u8]) -> Result<ParseOutput, ProcessError> {
        let models = self.models.get()?;
        match self.config.timeout_secs {
            Some(timeout_secs) => timeout(
                Duration::from_secs(timeout_secs),
                self.engine.parse(bytes, &models),
            )
            .await
            .map_err(|_| ProcessError::DeadlineExceeded { timeout_secs })?
            .map_err(ProcessError::from),
            None => self
                .engine
                .parse(bytes, &models)
                .await
                .map_err(ProcessError::from),
        }
    }

    /// Converts one document into a [`DocumentResult`].
    ///
    /// Never returns an error: engine failures, missing models, and
    /// deadline overruns all land in an `"error"` result carrying the
    /// message. Elapsed time is measured either way.
    pub async fn convert(&self, filename: &str, bytes: &[u8]) -> DocumentResult {
        let start = Instant::now();
        match self.process(bytes).await {
            Ok(output) => {
                let images = if self.config.extract_images {
                    encode_images(filename, output.images)
                } else {
                    BTreeMap::new()
                };
                let time = start.elapsed().as_secs_f64();
                metrics::CONVERSIONS_TOTAL.with_label_values(&["ok"]).inc();
                metrics::CONVERSION_DURATION
                    .with_label_values(&["ok"])
                    .observe(time);
                debug!(
                    "Converted {} in {:.3}s ({} bytes of markdown, {} images)",
                    filename,
                    time,
                    output.markdown.len(),
                    images.len()
                );
                DocumentResult::ok(
                    filename.to_string(),
                    output.markdown,
                    output.metadata,
                    images,
                    time,
                )
            }
            Err(e) => {
                let time = start.elapsed().as_secs_f64();
                metrics::CONVERSIONS_TOTAL
                    .with_label_values(&["error"])
                    .inc();
                metrics::CONVERSION_DURATION
                    .with_label_values(&["error"])
                    .observe(time);
                warn!("Conversion of {} failed after {:.3}s: {}", filename, time, e);
                DocumentResult::error(filename.to_string(), e.to_string(), time)
            }
        }
    }
}

/// Base64-encode extracted images in memory.
///
/// A malformed entry (empty name or empty payload) is dropped with a
/// warning; one bad image must not fail a document that otherwise
/// converted.
fn encode_images(
    filename: &str,
    images: BTreeMap<String, Vec<u8>>,
) -> BTreeMap<String, String> {
    let mut encoded = BTreeMap::new();
    for (name, bytes) in images {
        if name.is_empty() || bytes.is_empty() {
            warn!(
                "Skipping malformed image from {} (name: {:?}, {} bytes)",
                filename,
                name,
                bytes.len()
            );
            continue;
        }
        encoded.insert(name, STANDARD.encode(&bytes));
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ready_models, MockEngine};

    async fn processor(engine: MockEngine, config: ProcessorConfig) -> DocumentProcessor<MockEngine> {
        let (models, _guard) = ready_models().await;
        DocumentProcessor::new(Arc::new(engine), models, config)
    }

    #[tokio::test]
    async fn test_convert_success() {
        let processor = processor(MockEngine::new(), ProcessorConfig::default()).await;
        let result = processor.convert("doc.pdf", b"# hello").await;
        assert!(result.is_ok());
        assert_eq!(result.filename, "doc.pdf");
        assert_eq!(result.markdown, "# hello");
        assert!(result.time >= 0.0);
        assert!(result.error.is_none());
    }

    #[tokio::test]
    async fn test_convert_engine_failure_becomes_error_result() {
        let processor = processor(MockEngine::new(), ProcessorConfig::default()).await;
        let result = processor.convert("bad.pdf", b"FAIL:corrupt header").await;
        assert_eq!(result.status, "error");
        assert!(result.error.unwrap().contains("corrupt header"));
        assert!(result.markdown.is_empty());
    }

    #[tokio::test]
    async fn test_convert_before_models_ready() {
        let temp_dir = tempfile::tempdir().unwrap();
        let loader = Arc::new(ModelLoader::new(crate::config::EngineConfig {
            model_dir: temp_dir.path().to_path_buf(),
            ..Default::default()
        }));
        // Loader deliberately not initialized.
        let processor = DocumentProcessor::new(
            Arc::new(MockEngine::new()),
            loader,
            ProcessorConfig::default(),
        );
        let result = processor.convert("doc.pdf", b"content").await;
        assert_eq!(result.status, "error");
        assert!(result.error.unwrap().contains("not loaded"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_deadline_exceeded() {
        let engine = MockEngine::new().with_delay(Duration::from_secs(10));
        let processor = processor(
            engine,
            ProcessorConfig {
                extract_images: true,
                timeout_secs: Some(1),
            },
        )
        .await;
        let result = processor.convert("slow.pdf", b"content").await;
        assert_eq!(result.status, "error");
        assert!(result.error.unwrap().contains("deadline"));
    }

    #[tokio::test]
    async fn test_images_encoded_in_memory() {
        let engine = MockEngine::new().with_images(BTreeMap::from([(
            "fig1.png".to_string(),
            vec![1u8, 2, 3],
        )]));
        let processor = processor(engine, ProcessorConfig::default()).await;
        let result = processor.convert("doc.pdf", b"content").await;
        assert_eq!(result.images["fig1.png"], STANDARD.encode([1u8, 2, 3]));
    }

    #[tokio::test]
    async fn test_extract_images_disabled() {
        let engine = MockEngine::new().with_images(BTreeMap::from([(
            "fig1.png".to_string(),
            vec![1u8, 2, 3],
        )]));
        let processor = processor(
            engine,
            ProcessorConfig {
                extract_images: false,
                timeout_secs: None,
            },
        )
        .await;
        let result = processor.convert("doc.pdf", b"content").await;
        assert!(result.is_ok());
        assert!(result.images.is_empty());
    }

    #[tokio::test]
    async fn test_malformed_images_skipped() {
        let engine = MockEngine::new().with_images(BTreeMap::from([
            ("".to_string(), vec![1u8]),
            ("empty.png".to_string(), vec![]),
            ("good.png".to_string(), vec![9u8]),
        ]));
        let processor = processor(engine, ProcessorConfig::default()).await;
        let result = processor.convert("doc.pdf", b"content").await;
        assert!(result.is_ok());
        assert_eq!(result.images.len(), 1);
        assert!(result.images.contains_key("good.png"));
    }
}
