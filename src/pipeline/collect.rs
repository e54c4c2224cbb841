//! Result collection: settle every source into its indexed slot.
//!
//! Outcomes arrive in arbitrary completion order; the collector places
//! each into the slot for its original source position. Collection ends
//! when every slot is filled, the run deadline expires, or cancellation
//! fires. Deadline and cancellation are equivalent in effect: remaining
//! slots are filled with a degraded outcome and collection returns
//! immediately, never leaving a source unaccounted for.

use futures::{Stream, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::pipeline::fanout::Settlement;
use crate::types::{
    outcome::{OutcomeSet, SettledSource, SourceFailure, SourceOutcome},
    source::Source,
};

/// How collection for unsettled slots was finalized.
enum Finalize {
    /// Every source settled on its own
    Complete,

    /// The run deadline expired
    Deadline,

    /// External cancellation fired
    Cancelled,
}

/// Collect settlements into a complete [`OutcomeSet`].
///
/// `deadline` is the run-level budget expressed as an instant; `None`
/// waits for every source. The returned set always has exactly one
/// entry per source, in original source order.
///
/// Duplicate settlements for the same index are rejected: the first
/// write wins. Each source produces exactly one settlement by
/// construction, so a duplicate indicates a bug upstream and is logged.
pub async fn collect<S>(
    stream: S,
    sources: &[Source],
    deadline: Option<tokio::time::Instant>,
    cancel: &CancellationToken,
) -> OutcomeSet
where
    S: Stream<Item = Settlement>,
{
    let total = sources.len();
    let mut slots: Vec<Option<(SourceOutcome, std::time::Duration)>> = vec![None; total];
    let mut filled = 0usize;

    let deadline_expired = async {
        match deadline {
            Some(at) => tokio::time::sleep_until(at).await,
            None => std::future::pending().await,
        }
    };

    tokio::pin!(stream);
    tokio::pin!(deadline_expired);

    let finalize = loop {
        if filled == total {
            break Finalize::Complete;
        }

        tokio::select! {
            // Drain settlements that already completed before observing
            // cancellation or the deadline, so finished sources keep
            // their real outcome.
            biased;

            settlement = stream.next() => match settlement {
                Some(Settlement { index, outcome, elapsed }) => {
                    if slots[index].is_some() {
                        warn!(index, "duplicate outcome for source, keeping first");
                        continue;
                    }
                    debug!(index, filled = filled + 1, total, "outcome collected");
                    slots[index] = Some((outcome, elapsed));
                    filled += 1;
                }
                // Stream exhausted; every remaining slot is already filled
                // or will be filled by finalization below.
                None => break Finalize::Complete,
            },
            _ = cancel.cancelled() => break Finalize::Cancelled,
            _ = &mut deadline_expired => break Finalize::Deadline,
        }
    };

    let unsettled = total - filled;
    match finalize {
        Finalize::Complete => {}
        Finalize::Deadline => {
            info!(unsettled, "run deadline expired, settling remaining sources as timed out");
        }
        Finalize::Cancelled => {
            info!(unsettled, "run cancelled, settling remaining sources as cancelled");
        }
    }

    let entries = sources
        .iter()
        .zip(slots)
        .map(|(source, slot)| {
            let (outcome, elapsed) = slot.unwrap_or_else(|| {
                let failure = match finalize {
                    Finalize::Cancelled => SourceFailure::cancelled(),
                    _ => SourceFailure::unsettled_timeout(),
                };
                (SourceOutcome::Failure(failure), std::time::Duration::ZERO)
            });
            SettledSource {
                source: source.clone(),
                outcome,
                elapsed,
            }
        })
        .collect();

    OutcomeSet::new(entries)
}
