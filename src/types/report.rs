//! Run reports and the merged result handed back to the caller.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::types::outcome::{FailureKind, OutcomeSet};

/// Terminal status of one source, as reported to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum SourceStatus {
    /// Pipeline produced a payload that passed the schema gate
    Succeeded,

    /// Pipeline terminated without a usable payload
    Failed { kind: FailureKind, message: String },
}

/// Per-source execution record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceReport {
    /// Source label (URL, path, or truncated text)
    pub label: String,

    /// Terminal status
    pub status: SourceStatus,

    /// Wall time from admission to settlement
    pub elapsed: Duration,
}

impl SourceReport {
    pub fn is_success(&self) -> bool {
        matches!(self.status, SourceStatus::Succeeded)
    }
}

/// Execution report for one orchestration run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique id for this run
    pub run_id: Uuid,

    /// When the run was admitted
    pub started_at: DateTime<Utc>,

    /// Total wall time for the run
    pub elapsed: Duration,

    /// One record per source, in original source order
    pub sources: Vec<SourceReport>,
}

impl RunReport {
    /// Build a report from a settled outcome set.
    pub(crate) fn from_outcomes(
        run_id: Uuid,
        started_at: DateTime<Utc>,
        elapsed: Duration,
        outcomes: &OutcomeSet,
    ) -> Self {
        let sources = outcomes
            .entries()
            .iter()
            .map(|entry| SourceReport {
                label: entry.source.label(),
                status: match entry.outcome.failure() {
                    None => SourceStatus::Succeeded,
                    Some(failure) => SourceStatus::Failed {
                        kind: failure.kind,
                        message: failure.message.clone(),
                    },
                },
                elapsed: entry.elapsed,
            })
            .collect();

        Self {
            run_id,
            started_at,
            elapsed,
            sources,
        }
    }

    /// Count of sources that succeeded.
    pub fn succeeded(&self) -> usize {
        self.sources.iter().filter(|s| s.is_success()).count()
    }

    /// Count of sources that failed.
    pub fn failed(&self) -> usize {
        self.sources.len() - self.succeeded()
    }

    /// Failure reasons by source label, in source order.
    pub fn failure_reasons(&self) -> Vec<(&str, FailureKind, &str)> {
        self.sources
            .iter()
            .filter_map(|s| match &s.status {
                SourceStatus::Failed { kind, message } => {
                    Some((s.label.as_str(), *kind, message.as_str()))
                }
                SourceStatus::Succeeded => None,
            })
            .collect()
    }
}

/// The consolidated answer plus its execution report.
///
/// Owned by the caller once returned; never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MergedResult {
    /// The synthesized structured answer
    pub answer: Value,

    /// Per-source execution report
    pub report: RunReport,
}

impl MergedResult {
    /// Count of sources that contributed to the answer.
    pub fn succeeded(&self) -> usize {
        self.report.succeeded()
    }

    /// Count of sources that did not.
    pub fn failed(&self) -> usize {
        self.report.failed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::outcome::{OutcomeSet, SettledSource, SourceFailure, SourceOutcome};
    use crate::types::source::Source;
    use serde_json::json;

    #[test]
    fn test_report_counts_and_reasons() {
        let outcomes = OutcomeSet::new(vec![
            SettledSource {
                source: Source::url("https://a.com"),
                outcome: SourceOutcome::Success(json!({"price": 10})),
                elapsed: Duration::from_millis(12),
            },
            SettledSource {
                source: Source::url("https://b.com"),
                outcome: SourceOutcome::Failure(SourceFailure::new(
                    FailureKind::Fetch,
                    "connection refused",
                )),
                elapsed: Duration::from_millis(3),
            },
        ]);

        let report = RunReport::from_outcomes(
            Uuid::new_v4(),
            Utc::now(),
            Duration::from_millis(20),
            &outcomes,
        );

        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);

        let reasons = report.failure_reasons();
        assert_eq!(reasons.len(), 1);
        assert_eq!(reasons[0].0, "https://b.com");
        assert_eq!(reasons[0].1, FailureKind::Fetch);
    }
}
