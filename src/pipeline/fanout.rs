//! Task fan-out: one bounded, concurrent pipeline invocation per source.
//!
//! Every source gets an independent invocation; a failure in one never
//! aborts, cancels, or delays another. The only thing invocations share
//! is admission through the bounded stream.

use std::time::{Duration, Instant};

use futures::{stream, Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::traits::SourcePipeline;
use crate::types::{
    options::RunOptions,
    outcome::{FailureKind, SourceFailure, SourceOutcome},
    source::Source,
    task::Task,
};

/// One settled fan-out item: which source, how it ended, how long it took.
#[derive(Debug, Clone)]
pub struct Settlement {
    /// Position of the source in the original list
    pub index: usize,

    /// Terminal outcome for that source
    pub outcome: SourceOutcome,

    /// Wall time from admission to settlement
    pub elapsed: Duration,
}

/// Fan a task out across sources under bounded concurrency.
///
/// Yields one [`Settlement`] per source, in completion order (the
/// collector re-indexes them). At most `options.concurrency_limit`
/// invocations are in flight at once; the orchestrator guarantees the
/// limit is at least 1.
///
/// Cancellation settles in-flight sources as [`FailureKind::Cancelled`];
/// the pipeline's own side effects are not aborted mid-flight, the
/// stream just stops waiting on them.
pub fn fan_out<'a, P: SourcePipeline>(
    task: &'a Task,
    sources: &'a [Source],
    options: &RunOptions,
    pipeline: &'a P,
    cancel: CancellationToken,
) -> impl Stream<Item = Settlement> + 'a {
    let per_source_timeout = options.per_source_timeout;
    let limit = options.concurrency_limit.max(1);

    stream::iter(sources.iter().enumerate())
        .map(move |(index, source)| {
            let cancel = cancel.clone();
            async move {
                debug!(index, source = %source.label(), "source admitted");
                let start = Instant::now();
                let outcome =
                    invoke_one(task, source, per_source_timeout, pipeline, cancel).await;
                let elapsed = start.elapsed();

                if let Some(failure) = outcome.failure() {
                    warn!(
                        index,
                        source = %source.label(),
                        kind = ?failure.kind,
                        "source failed: {}",
                        failure.message
                    );
                } else {
                    debug!(index, source = %source.label(), ?elapsed, "source succeeded");
                }

                Settlement {
                    index,
                    outcome,
                    elapsed,
                }
            }
        })
        .buffer_unordered(limit)
}

/// Run one pipeline invocation to its terminal outcome.
async fn invoke_one<P: SourcePipeline>(
    task: &Task,
    source: &Source,
    budget: Option<Duration>,
    pipeline: &P,
    cancel: CancellationToken,
) -> SourceOutcome {
    let invocation = async {
        let result = match budget {
            Some(budget) => match tokio::time::timeout(budget, pipeline.invoke(task, source)).await
            {
                Ok(result) => result,
                Err(_) => return SourceOutcome::Failure(SourceFailure::timeout(budget)),
            },
            None => pipeline.invoke(task, source).await,
        };

        match result {
            Ok(payload) => gate_payload(task, payload),
            Err(err) => SourceOutcome::Failure((&err).into()),
        }
    };

    tokio::select! {
        _ = cancel.cancelled() => SourceOutcome::Failure(SourceFailure::cancelled()),
        outcome = invocation => outcome,
    }
}

/// Apply the task's schema gate to a successful payload.
fn gate_payload(task: &Task, payload: serde_json::Value) -> SourceOutcome {
    match &task.schema {
        Some(schema) => match schema.validate(&payload) {
            Ok(()) => SourceOutcome::Success(payload),
            Err(err) => {
                SourceOutcome::Failure(SourceFailure::new(FailureKind::Schema, err.to_string()))
            }
        },
        None => SourceOutcome::Success(payload),
    }
}
