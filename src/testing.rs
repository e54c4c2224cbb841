//! Testing utilities including mock implementations.
//!
//! These are useful for testing applications that use the orchestrator
//! without making real network or model calls. Both mocks are
//! deterministic and track their calls for assertions.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Map, Value};

use crate::error::{PipelineError, PipelineResult, SynthesisError, SynthesisResult};
use crate::pipeline::merge::SynthesisContext;
use crate::traits::{SourcePipeline, Synthesizer};
use crate::types::{source::Source, task::Task};

/// Scripted failure for a mock pipeline invocation.
#[derive(Debug, Clone)]
enum ScriptedFailure {
    Fetch(String),
    Extraction(String),
}

/// Record of a call made to the mock pipeline.
#[derive(Debug, Clone)]
pub struct MockPipelineCall {
    /// Value of the source that was invoked
    pub source: String,
}

/// A mock per-source pipeline for testing.
///
/// Returns scripted payloads or failures keyed by source value, with
/// optional artificial latency. Tracks the in-flight high-water mark so
/// tests can assert the concurrency bound.
#[derive(Default)]
pub struct MockPipeline {
    /// Scripted payloads by source value
    payloads: Arc<RwLock<HashMap<String, Value>>>,

    /// Scripted failures by source value
    failures: Arc<RwLock<HashMap<String, ScriptedFailure>>>,

    /// Artificial latency by source value
    delays: Arc<RwLock<HashMap<String, Duration>>>,

    /// Latency applied when no per-source delay is scripted
    default_delay: Option<Duration>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockPipelineCall>>>,

    /// Invocations currently in flight
    in_flight: Arc<AtomicUsize>,

    /// Highest simultaneous in-flight count observed
    max_in_flight: Arc<AtomicUsize>,
}

/// Decrements the in-flight counter even when the invocation future is
/// dropped by a timeout or cancellation.
struct FlightGuard(Arc<AtomicUsize>);

impl Drop for FlightGuard {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl MockPipeline {
    /// Create a new mock pipeline with default behavior.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a payload for a source value.
    pub fn with_payload(self, source: impl Into<String>, payload: Value) -> Self {
        self.payloads.write().unwrap().insert(source.into(), payload);
        self
    }

    /// Script a fetch failure for a source value.
    pub fn fail_fetch(self, source: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures
            .write()
            .unwrap()
            .insert(source.into(), ScriptedFailure::Fetch(message.into()));
        self
    }

    /// Script an extraction failure for a source value.
    pub fn fail_extraction(self, source: impl Into<String>, message: impl Into<String>) -> Self {
        self.failures
            .write()
            .unwrap()
            .insert(source.into(), ScriptedFailure::Extraction(message.into()));
        self
    }

    /// Script latency for a source value.
    pub fn with_delay(self, source: impl Into<String>, delay: Duration) -> Self {
        self.delays.write().unwrap().insert(source.into(), delay);
        self
    }

    /// Apply latency to every unscripted source.
    pub fn with_default_delay(mut self, delay: Duration) -> Self {
        self.default_delay = Some(delay);
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockPipelineCall> {
        self.calls.read().unwrap().clone()
    }

    /// Highest number of simultaneous invocations observed.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn default_payload(task: &Task, source: &Source) -> Value {
        json!({
            "source": source.value,
            "content": format!("extracted for: {}", task.prompt),
        })
    }
}

#[async_trait]
impl SourcePipeline for MockPipeline {
    async fn invoke(&self, task: &Task, source: &Source) -> PipelineResult<Value> {
        self.calls.write().unwrap().push(MockPipelineCall {
            source: source.value.clone(),
        });

        let current = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(current, Ordering::SeqCst);
        let _guard = FlightGuard(Arc::clone(&self.in_flight));

        let delay = self
            .delays
            .read()
            .unwrap()
            .get(&source.value)
            .copied()
            .or(self.default_delay);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let failure = self.failures.read().unwrap().get(&source.value).cloned();
        if let Some(failure) = failure {
            return Err(match failure {
                ScriptedFailure::Fetch(message) => PipelineError::fetch(std::io::Error::new(
                    std::io::ErrorKind::ConnectionRefused,
                    message,
                )),
                ScriptedFailure::Extraction(message) => PipelineError::extraction(message),
            });
        }

        Ok(self
            .payloads
            .read()
            .unwrap()
            .get(&source.value)
            .cloned()
            .unwrap_or_else(|| Self::default_payload(task, source)))
    }
}

/// Record of a call made to the mock synthesizer.
#[derive(Debug, Clone)]
pub struct MockSynthesisCall {
    /// Successful payloads the synthesizer was given
    pub payload_count: usize,

    /// Failed sources noted in the context
    pub failed_count: usize,

    /// Labels of the contributing sources, in source order
    pub labels: Vec<String>,
}

/// A mock synthesizer for testing.
///
/// By default merges object payloads deterministically: the union of
/// their fields, first source wins on conflict. Non-object payloads are
/// collected under an `items` array. A scripted answer or failure
/// overrides this.
#[derive(Default)]
pub struct MockSynthesizer {
    /// Scripted answer, returned for every call
    answer: Arc<RwLock<Option<Value>>>,

    /// When set, every call fails with this backend message
    fail_message: Option<String>,

    /// Call tracking for assertions
    calls: Arc<RwLock<Vec<MockSynthesisCall>>>,
}

impl MockSynthesizer {
    /// Create a new mock synthesizer with default merge behavior.
    pub fn new() -> Self {
        Self::default()
    }

    /// Script a fixed answer.
    pub fn with_answer(self, answer: Value) -> Self {
        *self.answer.write().unwrap() = Some(answer);
        self
    }

    /// Make every synthesis call fail.
    pub fn failing(mut self, message: impl Into<String>) -> Self {
        self.fail_message = Some(message.into());
        self
    }

    /// Get all calls made to this mock.
    pub fn calls(&self) -> Vec<MockSynthesisCall> {
        self.calls.read().unwrap().clone()
    }

    /// Deterministic default merge: field union, first source wins.
    fn default_merge(context: &SynthesisContext) -> Value {
        if context
            .payloads
            .iter()
            .all(|tagged| tagged.payload.is_object())
        {
            let mut merged = Map::new();
            for tagged in &context.payloads {
                if let Some(object) = tagged.payload.as_object() {
                    for (key, value) in object {
                        merged.entry(key.clone()).or_insert_with(|| value.clone());
                    }
                }
            }
            Value::Object(merged)
        } else {
            json!({
                "items": context
                    .payloads
                    .iter()
                    .map(|tagged| tagged.payload.clone())
                    .collect::<Vec<_>>(),
            })
        }
    }
}

#[async_trait]
impl Synthesizer for MockSynthesizer {
    async fn synthesize(
        &self,
        _task: &Task,
        context: &SynthesisContext,
    ) -> SynthesisResult<Value> {
        self.calls.write().unwrap().push(MockSynthesisCall {
            payload_count: context.payloads.len(),
            failed_count: context.failures.len(),
            labels: context
                .payloads
                .iter()
                .map(|tagged| tagged.label.clone())
                .collect(),
        });

        if let Some(message) = &self.fail_message {
            return Err(SynthesisError::backend(std::io::Error::new(
                std::io::ErrorKind::Other,
                message.clone(),
            )));
        }

        Ok(self
            .answer
            .read()
            .unwrap()
            .clone()
            .unwrap_or_else(|| Self::default_merge(context)))
    }
}

/// Builder for common orchestration test setups.
pub struct TestScenario {
    pipeline: MockPipeline,
    synthesizer: MockSynthesizer,
    sources: Vec<Source>,
}

impl TestScenario {
    /// Create a new empty scenario.
    pub fn new() -> Self {
        Self {
            pipeline: MockPipeline::new(),
            synthesizer: MockSynthesizer::new(),
            sources: Vec::new(),
        }
    }

    /// Add a URL source whose pipeline yields the given payload.
    pub fn with_source(mut self, url: &str, payload: Value) -> Self {
        self.sources.push(Source::url(url));
        self.pipeline = self.pipeline.with_payload(url, payload);
        self
    }

    /// Add a URL source whose fetch fails.
    pub fn with_unreachable_source(mut self, url: &str) -> Self {
        self.sources.push(Source::url(url));
        self.pipeline = self.pipeline.fail_fetch(url, "connection refused");
        self
    }

    /// Get the mocks and source list.
    pub fn build(self) -> (MockPipeline, MockSynthesizer, Vec<Source>) {
        (self.pipeline, self.synthesizer, self.sources)
    }
}

impl Default for TestScenario {
    fn default() -> Self {
        Self::new()
    }
}
