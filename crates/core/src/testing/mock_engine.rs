//! Mock parse engine for testing.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use crate::engine::{EngineError, ModelHandle, ParseEngine, ParseOutput};

/// In-process [`ParseEngine`] with controllable behavior.
///
/// - Documents whose bytes start with `FAIL:` fail with the rest of the
///   payload as the error message; everything else succeeds with the
///   document bytes echoed back as markdown.
/// - `DELAY:<ms>:` at the start of a document sleeps that long before
///   processing the remainder, so individual documents can be made slow.
/// - An optional per-call delay simulates uniformly slow parsing.
/// - Call and concurrency counters support pool-limit assertions.
pub struct MockEngine {
    delay: Option<Duration>,
    images: BTreeMap<String, Vec<u8>>,
    metadata: serde_json::Value,
    calls: AtomicUsize,
    in_flight: AtomicUsize,
    max_in_flight: AtomicUsize,
}

impl Default for MockEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl MockEngine {
    /// Create a mock that succeeds instantly with no images.
    pub fn new() -> Self {
        Self {
            delay: None,
            images: BTreeMap::new(),
            metadata: serde_json::json!({}),
            calls: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            max_in_flight: AtomicUsize::new(0),
        }
    }

    /// Sleep for `delay` inside every parse call.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Attach raw image payloads to every successful parse.
    pub fn with_images(mut self, images: BTreeMap<String, Vec<u8>>) -> Self {
        self.images = images;
        self
    }

    /// Attach metadata to every successful parse.
    pub fn with_metadata(mut self, metadata: serde_json::Value) -> Self {
        self.metadata = metadata;
        self
    }

    /// Total number of parse calls so far.
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Highest number of parse calls observed in flight at once.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ParseEngine for MockEngine {
    fn name(&self) -> &str {
        "mock"
    }

    async fn parse(
        &self,
        bytes: &[u8],
        _models: &ModelHandle,
    ) -> Result<ParseOutput, EngineError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        let bytes = match parse_delay_prefix(bytes) {
            Some((delay, rest)) => {
                tokio::time::sleep(delay).await;
                rest
            }
            None => bytes,
        };

        let result = match bytes.strip_prefix(b"FAIL:") {
            Some(reason) => Err(EngineError::ParseFailed(
                String::from_utf8_lossy(reason).into_owned(),
            )),
            None => Ok(ParseOutput {
                markdown: String::from_utf8_lossy(bytes).into_owned(),
                images: self.images.clone(),
                metadata: self.metadata.clone(),
            }),
        };

        self.in_flight.fetch_sub(1, Ordering::SeqCst);
        result
    }
}

fn parse_delay_prefix(bytes: &[u8]) -> Option<(Duration, &[u8])> {
    let rest = bytes.strip_prefix(b"DELAY:")?;
    let colon = rest.iter().position(|&b| b == b':')?;
    let ms: u64 = std::str::from_utf8(&rest[..colon]).ok()?.parse().ok()?;
    Some((Duration::from_millis(ms), &rest[colon + 1..]))
}
