//! Dispatcher metric recording
//!
//! Prometheus counters for publishes, ticks and executions, plus an in-memory
//! aggregator of execution durations for run summaries.

use std::collections::BTreeMap;
use std::fmt;

use contracts::{ExecutionOutcome, PublishOutcome, TickOutcome};
use metrics::{counter, gauge, histogram};

/// Record one publish
pub fn record_publish(outcome: &PublishOutcome) {
    counter!(
        "tick_dispatcher_publish_total",
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Record one tick and the busy flag after it
///
/// Idle ticks only update the busy gauge.
pub fn record_tick(outcome: &TickOutcome, busy: bool) {
    gauge!("tick_dispatcher_busy").set(if busy { 1.0 } else { 0.0 });

    if matches!(outcome, TickOutcome::Idle) {
        return;
    }
    counter!(
        "tick_dispatcher_tick_total",
        "outcome" => outcome.as_str()
    )
    .increment(1);
}

/// Record a reconciled execution
pub fn record_execution(topic: &str, outcome: ExecutionOutcome, elapsed_ms: f64) {
    counter!(
        "tick_dispatcher_executions_total",
        "topic" => topic.to_string(),
        "outcome" => outcome.as_str()
    )
    .increment(1);

    histogram!(
        "tick_dispatcher_execution_duration_ms",
        "topic" => topic.to_string()
    )
    .record(elapsed_ms);
}

/// Per-topic execution statistics
///
/// Durations are measured from start to reconciliation, so they include up
/// to one tick of delay.
#[derive(Debug, Clone, Default)]
pub struct ExecutionStats {
    topics: BTreeMap<String, TopicStats>,
}

#[derive(Debug, Clone, Default)]
struct TopicStats {
    durations_ms: RunningStats,
    failures: u64,
}

impl ExecutionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add one reconciled execution
    pub fn update(&mut self, topic: &str, outcome: ExecutionOutcome, elapsed_ms: f64) {
        let stats = self.topics.entry(topic.to_string()).or_default();
        stats.durations_ms.push(elapsed_ms);
        if outcome != ExecutionOutcome::Completed {
            stats.failures += 1;
        }
    }

    /// Summary report, ordered by topic
    pub fn summary(&self) -> ExecutionSummary {
        ExecutionSummary {
            topics: self
                .topics
                .iter()
                .map(|(topic, stats)| TopicSummary {
                    topic: topic.clone(),
                    failures: stats.failures,
                    duration_ms: StatsSummary::from(&stats.durations_ms),
                })
                .collect(),
        }
    }
}

/// Execution summary
#[derive(Debug, Clone, Default)]
pub struct ExecutionSummary {
    pub topics: Vec<TopicSummary>,
}

/// One topic's line in an [`ExecutionSummary`]
#[derive(Debug, Clone, Default)]
pub struct TopicSummary {
    pub topic: String,
    pub failures: u64,
    pub duration_ms: StatsSummary,
}

impl fmt::Display for ExecutionSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "=== Execution Summary ===")?;
        if self.topics.is_empty() {
            return writeln!(f, "No executions");
        }
        for topic in &self.topics {
            writeln!(
                f,
                "{}: failures={}, duration_ms: {}",
                topic.topic, topic.failures, topic.duration_ms
            )?;
        }
        Ok(())
    }
}

/// Statistics summary
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.1}, max={:.1}, mean={:.1}, std={:.1} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// Online statistics (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    pub fn count(&self) -> u64 {
        self.count
    }

    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// Sample variance
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    pub fn min(&self) -> f64 {
        self.min
    }

    pub fn max(&self) -> f64 {
        self.max
    }
}
