//! Merge engine: combine a settled outcome set into one answer.
//!
//! The engine partitions outcomes, builds a synthesis context from the
//! successful payloads (explicitly noting which sources failed), makes
//! exactly one synthesis call, and gates the result against the task
//! schema. Conflict resolution between sources is the synthesizer's
//! job; no precedence rule is imposed here.

use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::error::{MergeError, MergeResult};
use crate::traits::Synthesizer;
use crate::types::{
    options::MergeConfig,
    outcome::{FailureKind, OutcomeSet},
    task::Task,
};

/// A successful payload tagged with its source identity.
#[derive(Debug, Clone)]
pub struct TaggedPayload {
    /// Source label (URL, path, or truncated text)
    pub label: String,

    /// The structured payload the source's pipeline produced
    pub payload: Value,
}

/// A failed source, summarized for the synthesizer.
#[derive(Debug, Clone)]
pub struct FailureNote {
    pub label: String,
    pub kind: FailureKind,
    pub message: String,
}

/// Everything the synthesizer sees: the surviving payloads plus an
/// explicit account of what is missing.
#[derive(Debug, Clone)]
pub struct SynthesisContext {
    /// Successful payloads in original source order
    pub payloads: Vec<TaggedPayload>,

    /// Failed sources in original source order
    pub failures: Vec<FailureNote>,

    /// Total number of sources in the run
    pub total_sources: usize,
}

impl SynthesisContext {
    /// Build the context from a settled outcome set.
    pub fn from_outcomes(outcomes: &OutcomeSet) -> Self {
        let payloads = outcomes
            .successes()
            .map(|(entry, payload)| TaggedPayload {
                label: entry.source.label(),
                payload: payload.clone(),
            })
            .collect();

        let failures = outcomes
            .failures()
            .map(|(entry, failure)| FailureNote {
                label: entry.source.label(),
                kind: failure.kind,
                message: failure.message.clone(),
            })
            .collect();

        Self {
            payloads,
            failures,
            total_sources: outcomes.len(),
        }
    }

    /// One-line account of source coverage for the prompt.
    pub fn failure_summary(&self) -> String {
        if self.failures.is_empty() {
            return format!("all {} sources succeeded", self.total_sources);
        }

        let reasons: Vec<String> = self
            .failures
            .iter()
            .map(|f| format!("{} ({:?}: {})", f.label, f.kind, f.message))
            .collect();

        format!(
            "{} of {} sources failed: {}",
            self.failures.len(),
            self.total_sources,
            reasons.join("; ")
        )
    }

    /// Render the payload blocks for the prompt.
    pub fn render_content(&self) -> String {
        self.payloads
            .iter()
            .map(|tagged| {
                format!(
                    "=== SOURCE: {} ===\n{}",
                    tagged.label,
                    serde_json::to_string_pretty(&tagged.payload)
                        .unwrap_or_else(|_| tagged.payload.to_string())
                )
            })
            .collect::<Vec<_>>()
            .join("\n---\n")
    }
}

/// Merge a settled outcome set into a single answer.
///
/// Fails with [`MergeError::NoViableSources`] when nothing succeeded;
/// no synthesis call is made in that case. The synthesizer is invoked
/// at most once. If the task carries a schema, the synthesized answer
/// must conform or the merge fails with [`MergeError::SchemaViolation`]
/// (no repair is attempted).
///
/// When `config.concat_threshold` is non-zero and the number of
/// successes is at or below it, payloads are combined mechanically
/// without a synthesis call: a single payload is returned as the answer
/// (it already passed the per-source schema gate), several become an
/// object keyed `item_1..item_n`.
pub async fn merge<Y: Synthesizer>(
    task: &Task,
    outcomes: &OutcomeSet,
    config: &MergeConfig,
    synthesizer: &Y,
) -> MergeResult<Value> {
    let context = SynthesisContext::from_outcomes(outcomes);

    if context.payloads.is_empty() {
        return Err(MergeError::NoViableSources {
            failed: context.total_sources,
        });
    }

    debug!(
        succeeded = context.payloads.len(),
        failed = context.failures.len(),
        "merging outcomes"
    );

    if config.concat_threshold > 0 && context.payloads.len() <= config.concat_threshold {
        debug!(
            threshold = config.concat_threshold,
            "below concat threshold, skipping synthesis"
        );
        return Ok(concat_payloads(&context));
    }

    let answer = synthesizer.synthesize(task, &context).await?;

    if let Some(schema) = &task.schema {
        schema.validate(&answer)?;
    }

    info!(
        succeeded = context.payloads.len(),
        failed = context.failures.len(),
        "merge complete"
    );
    Ok(answer)
}

/// Mechanical combination for small success sets.
fn concat_payloads(context: &SynthesisContext) -> Value {
    if context.payloads.len() == 1 {
        return context.payloads[0].payload.clone();
    }

    let mut items = Map::new();
    for (i, tagged) in context.payloads.iter().enumerate() {
        items.insert(format!("item_{}", i + 1), tagged.payload.clone());
    }
    Value::Object(items)
}
