//! The orchestrator - main entry point for multi-source extraction.
//!
//! Wires fan-out, collection, and merge for one run: validate inputs,
//! dispatch every source under the concurrency bound, wait for the set
//! to settle (or the run budget to expire), then merge the surviving
//! payloads into one answer.
//!
//! # Example
//!
//! ```rust,ignore
//! use multisource::{Orchestrator, RunOptions, Source, Task};
//!
//! let orchestrator = Orchestrator::new(pipeline, synthesizer)
//!     .with_options(RunOptions::new().with_concurrency_limit(8));
//!
//! let task = Task::new("What is this product's price?");
//! let sources = vec![
//!     Source::url("https://shop-a.example/widget"),
//!     Source::url("https://shop-b.example/widget"),
//! ];
//!
//! let result = orchestrator.run(&task, &sources).await?;
//! println!("{} of {} sources contributed", result.succeeded(), sources.len());
//! ```

use std::time::Instant;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::info;
use uuid::Uuid;

use crate::error::{InvalidInput, RunResult};
use crate::pipeline::{collect, fan_out, merge};
use crate::traits::{SourcePipeline, Synthesizer};
use crate::types::{
    options::RunOptions,
    report::{MergedResult, RunReport},
    source::Source,
    task::Task,
};

/// Multi-source extraction orchestrator.
///
/// Holds the two collaborators (the opaque per-source pipeline and the
/// synthesizer) plus the run options. One instance can serve many runs;
/// each run owns its task, source list, and outcome set.
pub struct Orchestrator<P: SourcePipeline, Y: Synthesizer> {
    pipeline: P,
    synthesizer: Y,
    options: RunOptions,
}

impl<P: SourcePipeline, Y: Synthesizer> Orchestrator<P, Y> {
    /// Create an orchestrator with default options.
    pub fn new(pipeline: P, synthesizer: Y) -> Self {
        Self {
            pipeline,
            synthesizer,
            options: RunOptions::default(),
        }
    }

    /// Set the run options.
    pub fn with_options(mut self, options: RunOptions) -> Self {
        self.options = options;
        self
    }

    /// Get a reference to the options.
    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    /// Run a task across sources to a merged result.
    pub async fn run(&self, task: &Task, sources: &[Source]) -> RunResult<MergedResult> {
        self.run_with_cancel(task, sources, CancellationToken::new())
            .await
    }

    /// Run with external cancellation support.
    ///
    /// Cancelling the token finalizes collection early: settled sources
    /// keep their real outcome, unsettled ones are recorded as
    /// cancelled, and the run proceeds to merge with whatever survived.
    pub async fn run_with_cancel(
        &self,
        task: &Task,
        sources: &[Source],
        cancel: CancellationToken,
    ) -> RunResult<MergedResult> {
        validate_inputs(task, sources, &self.options)?;

        let run_id = Uuid::new_v4();
        let started_at = Utc::now();
        let start = Instant::now();
        let deadline = self
            .options
            .run_timeout
            .map(|budget| tokio::time::Instant::now() + budget);

        info!(
            %run_id,
            sources = sources.len(),
            concurrency = self.options.concurrency_limit,
            "run started"
        );

        let settlements = fan_out(task, sources, &self.options, &self.pipeline, cancel.clone());
        let outcomes = collect(settlements, sources, deadline, &cancel).await;

        info!(
            %run_id,
            succeeded = outcomes.succeeded(),
            failed = outcomes.failed(),
            "fan-out settled"
        );

        let answer = merge(task, &outcomes, &self.options.merge, &self.synthesizer).await?;
        let report = RunReport::from_outcomes(run_id, started_at, start.elapsed(), &outcomes);

        info!(%run_id, elapsed = ?report.elapsed, "run complete");
        Ok(MergedResult { answer, report })
    }

    /// Get a reference to the pipeline.
    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Get a reference to the synthesizer.
    pub fn synthesizer(&self) -> &Y {
        &self.synthesizer
    }
}

/// Run a task across sources with explicit options and collaborators.
///
/// Convenience wrapper for one-shot use; [`Orchestrator`] is the
/// reusable form.
pub async fn run_multi_source_extraction<P: SourcePipeline, Y: Synthesizer>(
    task: &Task,
    sources: &[Source],
    options: RunOptions,
    pipeline: P,
    synthesizer: Y,
) -> RunResult<MergedResult> {
    Orchestrator::new(pipeline, synthesizer)
        .with_options(options)
        .run(task, sources)
        .await
}

fn validate_inputs(task: &Task, sources: &[Source], options: &RunOptions) -> Result<(), InvalidInput> {
    if sources.is_empty() {
        return Err(InvalidInput::NoSources);
    }
    if options.concurrency_limit == 0 {
        return Err(InvalidInput::ZeroConcurrency);
    }
    if let Some(schema) = &task.schema {
        schema.check_well_formed()?;
    }
    Ok(())
}
