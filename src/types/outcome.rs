//! Per-source outcomes and the settled outcome set.
//!
//! Each source produces exactly one [`SourceOutcome`] when its pipeline
//! invocation terminates. The [`OutcomeSet`] is indexed by original
//! source position, so downstream consumers see a stable ordering
//! independent of completion timing.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PipelineError;
use crate::types::source::Source;

/// Classification of a per-source failure.
///
/// All of these are non-fatal to the run; they are recorded in the run
/// report and the source is excluded from synthesis.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Source unreachable or unreadable
    Fetch,

    /// Pipeline ran but produced no usable structured result
    Extraction,

    /// Payload did not conform to the task schema
    Schema,

    /// Per-source time budget exceeded
    Timeout,

    /// Run was cancelled before this source settled
    Cancelled,
}

/// A recorded per-source failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl SourceFailure {
    pub fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    /// Timeout failure with the budget that was exceeded.
    pub fn timeout(budget: Duration) -> Self {
        Self::new(
            FailureKind::Timeout,
            format!("per-source budget of {:?} exceeded", budget),
        )
    }

    /// Failure for a source that never settled before the run ended.
    pub fn unsettled_timeout() -> Self {
        Self::new(FailureKind::Timeout, "run deadline expired")
    }

    /// Failure for a source cut off by external cancellation.
    pub fn cancelled() -> Self {
        Self::new(FailureKind::Cancelled, "run cancelled")
    }
}

impl From<&PipelineError> for SourceFailure {
    fn from(err: &PipelineError) -> Self {
        match err {
            PipelineError::Fetch(_) => Self::new(FailureKind::Fetch, err.to_string()),
            PipelineError::Extraction { .. } => {
                Self::new(FailureKind::Extraction, err.to_string())
            }
        }
    }
}

/// The terminal result of processing one source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceOutcome {
    /// Pipeline produced a structured payload (already schema-checked)
    Success(Value),

    /// Pipeline terminated without a usable payload
    Failure(SourceFailure),
}

impl SourceOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, SourceOutcome::Success(_))
    }

    /// The payload, if this outcome is a success.
    pub fn payload(&self) -> Option<&Value> {
        match self {
            SourceOutcome::Success(value) => Some(value),
            SourceOutcome::Failure(_) => None,
        }
    }

    /// The failure record, if any.
    pub fn failure(&self) -> Option<&SourceFailure> {
        match self {
            SourceOutcome::Success(_) => None,
            SourceOutcome::Failure(failure) => Some(failure),
        }
    }
}

/// One settled entry of an [`OutcomeSet`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SettledSource {
    /// The source as originally enqueued
    pub source: Source,

    /// Its terminal outcome
    pub outcome: SourceOutcome,

    /// Wall time from admission to settlement. Zero for sources that
    /// were filled in at finalization (deadline or cancellation).
    pub elapsed: Duration,
}

/// The complete, ordered set of outcomes for one run.
///
/// Complete by construction: the collector only hands this out once
/// every source has settled (or been filled in as timed out/cancelled).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutcomeSet {
    entries: Vec<SettledSource>,
}

impl OutcomeSet {
    /// Build from settled entries. Crate-internal: only the collector
    /// constructs these.
    pub(crate) fn new(entries: Vec<SettledSource>) -> Self {
        Self { entries }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// All entries in original source order.
    pub fn entries(&self) -> &[SettledSource] {
        &self.entries
    }

    /// Successful entries with their payloads, in source order.
    pub fn successes(&self) -> impl Iterator<Item = (&SettledSource, &Value)> {
        self.entries
            .iter()
            .filter_map(|entry| entry.outcome.payload().map(|payload| (entry, payload)))
    }

    /// Failed entries with their failure records, in source order.
    pub fn failures(&self) -> impl Iterator<Item = (&SettledSource, &SourceFailure)> {
        self.entries
            .iter()
            .filter_map(|entry| entry.outcome.failure().map(|failure| (entry, failure)))
    }

    /// Count of successful sources.
    pub fn succeeded(&self) -> usize {
        self.successes().count()
    }

    /// Count of failed sources.
    pub fn failed(&self) -> usize {
        self.failures().count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn settled(value: &str, outcome: SourceOutcome) -> SettledSource {
        SettledSource {
            source: Source::url(format!("https://example.com/{}", value)),
            outcome,
            elapsed: Duration::from_millis(5),
        }
    }

    #[test]
    fn test_outcome_set_partitions_in_order() {
        let set = OutcomeSet::new(vec![
            settled("a", SourceOutcome::Success(json!({"x": 1}))),
            settled(
                "b",
                SourceOutcome::Failure(SourceFailure::new(FailureKind::Fetch, "refused")),
            ),
            settled("c", SourceOutcome::Success(json!({"x": 3}))),
        ]);

        assert_eq!(set.len(), 3);
        assert_eq!(set.succeeded(), 2);
        assert_eq!(set.failed(), 1);

        let payloads: Vec<_> = set.successes().map(|(_, p)| p.clone()).collect();
        assert_eq!(payloads, vec![json!({"x": 1}), json!({"x": 3})]);

        let (entry, failure) = set.failures().next().unwrap();
        assert!(entry.source.value.ends_with("/b"));
        assert_eq!(failure.kind, FailureKind::Fetch);
    }

    #[test]
    fn test_failure_from_pipeline_error() {
        let fetch: SourceFailure = (&PipelineError::fetch(std::io::Error::new(
            std::io::ErrorKind::ConnectionRefused,
            "refused",
        )))
            .into();
        assert_eq!(fetch.kind, FailureKind::Fetch);

        let extraction: SourceFailure = (&PipelineError::extraction("no fields found")).into();
        assert_eq!(extraction.kind, FailureKind::Extraction);
        assert!(extraction.message.contains("no fields found"));
    }
}
