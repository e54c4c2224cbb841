//! Typed errors for the orchestration library.
//!
//! Uses `thiserror` for library errors (not `anyhow`) to provide
//! strongly-typed, composable error handling. The taxonomy mirrors the
//! two failure scopes: per-source errors are non-fatal and end up in the
//! run report; run-level errors are returned to the caller.

use thiserror::Error;

/// Errors returned by a [`SourcePipeline`](crate::traits::SourcePipeline)
/// invocation for one source.
///
/// These never abort a run; the fan-out layer records them as per-source
/// failures and continues with the remaining sources.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Source could not be fetched or read
    #[error("fetch error: {0}")]
    Fetch(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Pipeline ran but produced no usable structured result
    #[error("extraction error: {reason}")]
    Extraction { reason: String },
}

impl PipelineError {
    /// Fetch error from any boxed cause.
    pub fn fetch(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Fetch(cause.into())
    }

    /// Extraction error with a reason.
    pub fn extraction(reason: impl Into<String>) -> Self {
        Self::Extraction {
            reason: reason.into(),
        }
    }
}

/// Error from the single synthesis (merge) operation.
#[derive(Debug, Error)]
pub enum SynthesisError {
    /// Synthesis backend unavailable or failed
    #[error("synthesis backend error: {0}")]
    Backend(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// Synthesis produced output that could not be parsed as JSON
    #[error("synthesis output was not valid JSON: {0}")]
    InvalidOutput(#[from] serde_json::Error),
}

impl SynthesisError {
    /// Backend error from any boxed cause.
    pub fn backend(cause: impl Into<Box<dyn std::error::Error + Send + Sync>>) -> Self {
        Self::Backend(cause.into())
    }
}

/// A payload did not conform to the task's output schema.
///
/// Collects every issue found rather than stopping at the first, so the
/// report can show the full shape mismatch.
#[derive(Debug, Clone, Error)]
#[error("schema validation failed: {}", .issues.join("; "))]
pub struct ValidationError {
    /// Human-readable issues, one per violated field
    pub issues: Vec<String>,
}

impl ValidationError {
    /// Create from a list of issues.
    pub fn new(issues: Vec<String>) -> Self {
        Self { issues }
    }
}

/// Errors from the merge step. Fatal to the run.
#[derive(Debug, Error)]
pub enum MergeError {
    /// Every source failed or timed out; there is nothing to merge
    #[error("no viable sources: all {failed} sources failed")]
    NoViableSources { failed: usize },

    /// The single synthesis call failed
    #[error("synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),

    /// Synthesized output did not conform to the task schema
    #[error("merged output violates schema: {0}")]
    SchemaViolation(#[from] ValidationError),
}

/// Errors returned by the orchestrator entry point.
#[derive(Debug, Error)]
pub enum OrchestratorError {
    /// Inputs were rejected before any source was dispatched
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInput),

    /// The merge step failed after fan-out settled
    #[error("merge failed: {0}")]
    Merge(#[from] MergeError),
}

/// Input validation failures.
#[derive(Debug, Error)]
pub enum InvalidInput {
    /// The source list was empty
    #[error("no sources provided")]
    NoSources,

    /// Concurrency limit must be at least 1
    #[error("concurrency limit must be >= 1")]
    ZeroConcurrency,

    /// The task schema is malformed
    #[error("malformed schema: {reason}")]
    MalformedSchema { reason: String },
}

/// Result type alias for pipeline invocations.
pub type PipelineResult<T> = std::result::Result<T, PipelineError>;

/// Result type alias for synthesis operations.
pub type SynthesisResult<T> = std::result::Result<T, SynthesisError>;

/// Result type alias for merge operations.
pub type MergeResult<T> = std::result::Result<T, MergeError>;

/// Result type alias for orchestrator runs.
pub type RunResult<T> = std::result::Result<T, OrchestratorError>;
