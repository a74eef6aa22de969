//! Execution - a detached action run with an explicit completion signal

use std::time::{Duration, Instant};

use tokio::sync::oneshot;
use tracing::{info_span, Instrument};

use contracts::ExecutionOutcome;

use crate::action::ActionFuture;

/// Handle to one in-flight (or finished, not yet reconciled) action run
///
/// The action runs on its own task. A supervising task awaits it and reports
/// how it ended over a one-shot channel, which [`Execution::outcome`] checks
/// without blocking.
#[derive(Debug)]
pub struct Execution {
    done_rx: oneshot::Receiver<ExecutionOutcome>,
    finished: Option<ExecutionOutcome>,
    started_at: Instant,
}

impl Execution {
    /// Spawn `future` on the current Tokio runtime
    ///
    /// # Panics
    /// Panics when called outside a Tokio runtime.
    pub fn spawn(topic: &str, future: ActionFuture) -> Self {
        let (done_tx, done_rx) = oneshot::channel();
        let span = info_span!("action", topic = %topic);

        tokio::spawn(
            async move {
                let outcome = match tokio::spawn(future.in_current_span()).await {
                    Ok(()) => ExecutionOutcome::Completed,
                    Err(e) if e.is_panic() => ExecutionOutcome::Panicked,
                    Err(_) => ExecutionOutcome::Cancelled,
                };
                // Receiver is gone only if the handler was dropped
                let _ = done_tx.send(outcome);
            }
            .instrument(span),
        );

        Self {
            done_rx,
            finished: None,
            started_at: Instant::now(),
        }
    }

    /// How the run ended, or `None` while it is still live
    pub fn outcome(&mut self) -> Option<ExecutionOutcome> {
        if self.finished.is_none() {
            self.finished = match self.done_rx.try_recv() {
                Ok(outcome) => Some(outcome),
                Err(oneshot::error::TryRecvError::Empty) => None,
                Err(oneshot::error::TryRecvError::Closed) => Some(ExecutionOutcome::Cancelled),
            };
        }
        self.finished
    }

    /// Whether the run is still live
    pub fn is_live(&mut self) -> bool {
        self.outcome().is_none()
    }

    /// Time since the run was started
    pub fn elapsed(&self) -> Duration {
        self.started_at.elapsed()
    }
}
