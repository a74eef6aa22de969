//! Tick and execution outcomes
//!
//! What a single tick did, and how a finished execution ended.

/// How a detached action execution ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionOutcome {
    /// The action's future resolved
    Completed,
    /// The action panicked
    Panicked,
    /// The action was aborted before completing (e.g. runtime shutdown)
    Cancelled,
}

impl ExecutionOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Completed => "completed",
            Self::Panicked => "panicked",
            Self::Cancelled => "cancelled",
        }
    }
}

/// Result of one tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No pending message
    Idle,
    /// Pending message has no registered handler; left in place
    UnknownTopic,
    /// Handler still running; pending message kept for a later tick
    Skipped,
    /// A new execution was launched
    Started,
    /// A finished execution was cleared along with the pending message
    Reconciled(ExecutionOutcome),
}

impl TickOutcome {
    /// Stable label for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Idle => "idle",
            Self::UnknownTopic => "unknown_topic",
            Self::Skipped => "skipped",
            Self::Started => "started",
            Self::Reconciled(_) => "reconciled",
        }
    }
}
