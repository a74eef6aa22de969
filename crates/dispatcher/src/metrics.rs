//! Dispatcher metrics for observability

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

use contracts::{ExecutionOutcome, PublishOutcome, TickOutcome};

/// Counters for a single dispatcher
#[derive(Debug, Default)]
pub struct DispatcherMetrics {
    /// Total ticks
    tick_count: AtomicU64,
    /// Executions launched
    started_count: AtomicU64,
    /// Executions reconciled (any outcome)
    reconciled_count: AtomicU64,
    /// Executions that panicked or were cancelled
    failed_count: AtomicU64,
    /// Ticks skipped because the handler was still running
    skipped_count: AtomicU64,
    /// Ticks that found no handler for the pending topic
    unknown_topic_count: AtomicU64,
    /// Publishes stored into an empty slot
    accepted_count: AtomicU64,
    /// Publishes that overwrote an unconsumed message
    replaced_count: AtomicU64,
    /// Publishes discarded while busy
    dropped_count: AtomicU64,
}

impl DispatcherMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one tick by its outcome
    pub fn record_tick(&self, outcome: &TickOutcome) {
        self.tick_count.fetch_add(1, Ordering::Relaxed);
        match outcome {
            TickOutcome::Idle => {}
            TickOutcome::UnknownTopic => {
                self.unknown_topic_count.fetch_add(1, Ordering::Relaxed);
            }
            TickOutcome::Skipped => {
                self.skipped_count.fetch_add(1, Ordering::Relaxed);
            }
            TickOutcome::Started => {
                self.started_count.fetch_add(1, Ordering::Relaxed);
            }
            TickOutcome::Reconciled(execution) => {
                self.reconciled_count.fetch_add(1, Ordering::Relaxed);
                if *execution != ExecutionOutcome::Completed {
                    self.failed_count.fetch_add(1, Ordering::Relaxed);
                }
            }
        }
    }

    /// Count one publish by its outcome
    pub fn record_publish(&self, outcome: &PublishOutcome) {
        let counter = match outcome {
            PublishOutcome::Accepted => &self.accepted_count,
            PublishOutcome::Replaced => &self.replaced_count,
            PublishOutcome::DroppedBusy => &self.dropped_count,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count.load(Ordering::Relaxed)
    }

    pub fn started_count(&self) -> u64 {
        self.started_count.load(Ordering::Relaxed)
    }

    pub fn reconciled_count(&self) -> u64 {
        self.reconciled_count.load(Ordering::Relaxed)
    }

    pub fn failed_count(&self) -> u64 {
        self.failed_count.load(Ordering::Relaxed)
    }

    pub fn skipped_count(&self) -> u64 {
        self.skipped_count.load(Ordering::Relaxed)
    }

    pub fn unknown_topic_count(&self) -> u64 {
        self.unknown_topic_count.load(Ordering::Relaxed)
    }

    pub fn accepted_count(&self) -> u64 {
        self.accepted_count.load(Ordering::Relaxed)
    }

    pub fn replaced_count(&self) -> u64 {
        self.replaced_count.load(Ordering::Relaxed)
    }

    pub fn dropped_count(&self) -> u64 {
        self.dropped_count.load(Ordering::Relaxed)
    }

    /// Get snapshot of all metrics
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            tick_count: self.tick_count(),
            started_count: self.started_count(),
            reconciled_count: self.reconciled_count(),
            failed_count: self.failed_count(),
            skipped_count: self.skipped_count(),
            unknown_topic_count: self.unknown_topic_count(),
            accepted_count: self.accepted_count(),
            replaced_count: self.replaced_count(),
            dropped_count: self.dropped_count(),
        }
    }
}

/// Snapshot of dispatcher metrics (for reporting)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub tick_count: u64,
    pub started_count: u64,
    pub reconciled_count: u64,
    pub failed_count: u64,
    pub skipped_count: u64,
    pub unknown_topic_count: u64,
    pub accepted_count: u64,
    pub replaced_count: u64,
    pub dropped_count: u64,
}

impl MetricsSnapshot {
    /// Publishes offered, whether stored or dropped
    pub fn publish_count(&self) -> u64 {
        self.accepted_count + self.replaced_count + self.dropped_count
    }
}

impl fmt::Display for MetricsSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "ticks:          {}", self.tick_count)?;
        writeln!(f, "  started:      {}", self.started_count)?;
        writeln!(f, "  reconciled:   {}", self.reconciled_count)?;
        writeln!(f, "  failed:       {}", self.failed_count)?;
        writeln!(f, "  skipped:      {}", self.skipped_count)?;
        writeln!(f, "  unknown:      {}", self.unknown_topic_count)?;
        writeln!(f, "publishes:      {}", self.publish_count())?;
        writeln!(f, "  accepted:     {}", self.accepted_count)?;
        writeln!(f, "  replaced:     {}", self.replaced_count)?;
        write!(f, "  dropped busy: {}", self.dropped_count)
    }
}
