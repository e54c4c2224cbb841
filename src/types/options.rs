//! Configuration for orchestration runs.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Configuration for the merge step.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MergeConfig {
    /// When the number of successful sources is at or below this
    /// threshold, combine payloads mechanically instead of calling the
    /// synthesizer. 0 disables concatenation (always synthesize).
    pub concat_threshold: usize,
}

impl MergeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the concat threshold.
    pub fn with_concat_threshold(mut self, threshold: usize) -> Self {
        self.concat_threshold = threshold;
        self
    }
}

/// Options for one orchestration run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOptions {
    /// Maximum pipeline invocations in flight at once. Must be >= 1.
    pub concurrency_limit: usize,

    /// Time budget for a single source's pipeline invocation.
    /// None means unbounded.
    pub per_source_timeout: Option<Duration>,

    /// Time budget for the whole run. On expiry, unsettled sources are
    /// recorded as timed out and the run proceeds to merge.
    /// None means unbounded.
    pub run_timeout: Option<Duration>,

    /// Merge step configuration
    #[serde(default)]
    pub merge: MergeConfig,
}

impl Default for RunOptions {
    fn default() -> Self {
        Self {
            concurrency_limit: 4,
            per_source_timeout: None,
            run_timeout: None,
            merge: MergeConfig::default(),
        }
    }
}

impl RunOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the concurrency limit.
    pub fn with_concurrency_limit(mut self, limit: usize) -> Self {
        self.concurrency_limit = limit;
        self
    }

    /// Set the per-source timeout.
    pub fn with_per_source_timeout(mut self, timeout: Duration) -> Self {
        self.per_source_timeout = Some(timeout);
        self
    }

    /// Set the run-level timeout.
    pub fn with_run_timeout(mut self, timeout: Duration) -> Self {
        self.run_timeout = Some(timeout);
        self
    }

    /// Set the merge configuration.
    pub fn with_merge(mut self, merge: MergeConfig) -> Self {
        self.merge = merge;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = RunOptions::default();
        assert_eq!(options.concurrency_limit, 4);
        assert!(options.per_source_timeout.is_none());
        assert!(options.run_timeout.is_none());
        assert_eq!(options.merge.concat_threshold, 0);
    }

    #[test]
    fn test_builder() {
        let options = RunOptions::new()
            .with_concurrency_limit(8)
            .with_per_source_timeout(Duration::from_secs(30))
            .with_run_timeout(Duration::from_secs(120))
            .with_merge(MergeConfig::new().with_concat_threshold(2));

        assert_eq!(options.concurrency_limit, 8);
        assert_eq!(options.per_source_timeout, Some(Duration::from_secs(30)));
        assert_eq!(options.run_timeout, Some(Duration::from_secs(120)));
        assert_eq!(options.merge.concat_threshold, 2);
    }
}
