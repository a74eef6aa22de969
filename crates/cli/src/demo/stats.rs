//! Demo run statistics.

use std::time::Duration;

use dispatcher::MetricsSnapshot;
use observability::ExecutionSummary;

/// Statistics from a demo run
#[derive(Debug, Clone, Default)]
pub struct DemoStats {
    /// Wall-clock duration of the run
    pub duration: Duration,

    /// Ticks performed by the driver
    pub ticks: u64,

    /// Publishes attempted by the demo publisher
    pub publishes: u64,

    /// Dispatcher counters at shutdown
    pub metrics: MetricsSnapshot,

    /// Per-topic execution durations
    pub executions: ExecutionSummary,

    /// A handler was still running at shutdown
    pub busy_at_shutdown: bool,
}

impl DemoStats {
    /// Share of publishes dropped while busy, as a percentage
    pub fn drop_rate(&self) -> f64 {
        let total = self.metrics.publish_count();
        if total > 0 {
            (self.metrics.dropped_count as f64 / total as f64) * 100.0
        } else {
            0.0
        }
    }

    /// Print detailed summary
    pub fn print_summary(&self) {
        println!("\n=== Demo Statistics ===\n");
        println!("Duration: {:.2}s", self.duration.as_secs_f64());
        println!("Driver ticks: {}", self.ticks);
        println!("Publisher attempts: {}", self.publishes);
        println!("Drop rate: {:.1}%", self.drop_rate());
        if self.busy_at_shutdown {
            println!("A handler was still running at shutdown");
        }
        println!("\n{}\n", self.metrics);
        print!("{}", self.executions);
        println!();
    }
}
