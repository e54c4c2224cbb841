//! SourcePipeline trait - the opaque per-source extractor.
//!
//! The orchestrator treats the single-source pipeline (fetch, parse,
//! chunk, model extraction) as a black box behind this seam.
//! Implementations wrap whatever stack actually does the work.

use async_trait::async_trait;
use serde_json::Value;

use crate::error::PipelineResult;
use crate::types::{source::Source, task::Task};

/// Per-source extraction pipeline.
///
/// Must be safely callable concurrently: the fan-out layer runs up to
/// `concurrency_limit` invocations at once against one instance. The
/// caller imposes the per-invocation timeout; implementations only need
/// to be cancel-safe at await points.
#[async_trait]
pub trait SourcePipeline: Send + Sync {
    /// Run the extraction pipeline for one source.
    ///
    /// Returns the structured payload on success. Errors are classified
    /// by the fan-out layer: [`PipelineError::Fetch`] for unreachable or
    /// unreadable sources, [`PipelineError::Extraction`] when the
    /// pipeline ran but could not produce a structured result.
    ///
    /// [`PipelineError::Fetch`]: crate::error::PipelineError::Fetch
    /// [`PipelineError::Extraction`]: crate::error::PipelineError::Extraction
    async fn invoke(&self, task: &Task, source: &Source) -> PipelineResult<Value>;
}
