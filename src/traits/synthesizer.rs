//! Synthesizer trait - the single merge operation.
//!
//! Implementations wrap an LLM provider (or anything else) that can
//! combine several per-source payloads into one answer. The merge
//! engine calls this exactly once per run; retry policy, if any, lives
//! inside the implementation.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::SynthesisResult;
use crate::pipeline::merge::SynthesisContext;
use crate::types::task::Task;

/// Combines per-source payloads into one consolidated answer.
///
/// The context carries every successful payload tagged by source
/// identity, plus a summary of which sources failed, so implementations
/// can express partial coverage instead of presenting the surviving
/// subset as complete. Conflicting values across sources are resolved
/// here; the orchestrator imposes no precedence rule.
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Produce the merged answer for a task.
    ///
    /// The output must be a JSON value; if the task carries a schema,
    /// the merge engine validates the output against it afterwards.
    async fn synthesize(&self, task: &Task, context: &SynthesisContext)
        -> SynthesisResult<Value>;
}
