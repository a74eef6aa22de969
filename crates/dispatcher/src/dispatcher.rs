//! Dispatcher - single pending slot polled by a tick

use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tracing::{debug, error, info, warn};

use contracts::{ContractError, ExecutionOutcome, Message, PublishOutcome, TickOutcome};
use observability::{ExecutionStats, ExecutionSummary};

use crate::action::Action;
use crate::error::DispatcherError;
use crate::handler::{Handler, HandlerState};
use crate::metrics::DispatcherMetrics;

/// At-most-one-in-flight dispatcher
///
/// Holds one pending message and a registry of handlers. Each [`tick`]
/// advances the pending message's handler one step:
/// `Idle -> Running -> Finished -> Idle`. While any execution is in flight
/// the dispatcher is busy and [`publish`] discards new messages.
///
/// All state sits behind one mutex so a driver task and publishers on other
/// tasks can share an `Arc<Dispatcher<T>>`. Actions are invoked on their own
/// task, never under that lock, so they may call back into the dispatcher.
///
/// [`tick`]: Dispatcher::tick
/// [`publish`]: Dispatcher::publish
#[derive(Debug)]
pub struct Dispatcher<T> {
    state: Mutex<DispatcherState<T>>,
    metrics: Arc<DispatcherMetrics>,
}

#[derive(Debug)]
struct DispatcherState<T> {
    handlers: HashMap<String, Handler<T>>,
    pending: Option<Message<T>>,
    busy: bool,
    execution_stats: ExecutionStats,
    /// Unknown-topic warning already emitted for the current pending message
    stranded_reported: bool,
    /// Skip already logged at info for the current execution
    skip_reported: bool,
}

impl<T> Default for Dispatcher<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Dispatcher<T> {
    /// Create an empty dispatcher
    pub fn new() -> Self {
        Self {
            state: Mutex::new(DispatcherState {
                handlers: HashMap::new(),
                pending: None,
                busy: false,
                execution_stats: ExecutionStats::new(),
                stranded_reported: false,
                skip_reported: false,
            }),
            metrics: Arc::new(DispatcherMetrics::new()),
        }
    }

    /// Register `action` under `topic`
    ///
    /// Returns `Ok(false)` when the topic is already registered; the existing
    /// action is kept and `action` is dropped.
    ///
    /// # Errors
    /// `topic` is empty.
    pub fn register(
        &self,
        topic: impl Into<String>,
        action: Action<T>,
    ) -> Result<bool, DispatcherError> {
        let topic = topic.into();
        if topic.is_empty() {
            return Err(ContractError::invalid_topic(topic, "topic must not be empty").into());
        }

        let mut state = self.lock();
        if state.handlers.contains_key(&topic) {
            debug!(topic = %topic, "Topic already registered, keeping first handler");
            return Ok(false);
        }

        debug!(topic = %topic, arity = action.arity(), "Handler registered");
        state
            .handlers
            .insert(topic.clone(), Handler::new(topic, action));
        Ok(true)
    }

    /// Register an action that takes no value
    pub fn register_nullary<F, Fut>(
        &self,
        topic: impl Into<String>,
        f: F,
    ) -> Result<bool, DispatcherError>
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.register(topic, Action::nullary(f))
    }

    /// Register an action that receives the message value
    pub fn register_unary<F, Fut>(
        &self,
        topic: impl Into<String>,
        f: F,
    ) -> Result<bool, DispatcherError>
    where
        F: Fn(Option<T>) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        self.register(topic, Action::unary(f))
    }

    /// Offer a message to the pending slot
    ///
    /// Stored (overwriting any unconsumed message) when idle; discarded while
    /// busy. Never queues.
    pub fn publish(&self, message: Message<T>) -> PublishOutcome {
        let outcome = {
            let mut state = self.lock();
            if state.busy {
                debug!(topic = %message.topic, "Dispatcher busy, publish dropped");
                PublishOutcome::DroppedBusy
            } else {
                let topic_for_log = message.topic.clone();
                state.stranded_reported = false;
                match state.pending.replace(message) {
                    Some(previous) => {
                        debug!(
                            topic = %topic_for_log,
                            replaced = %previous.topic,
                            "Unconsumed message replaced"
                        );
                        PublishOutcome::Replaced
                    }
                    None => {
                        debug!(topic = %topic_for_log, "Message accepted");
                        PublishOutcome::Accepted
                    }
                }
            }
        };

        self.metrics.record_publish(&outcome);
        observability::record_publish(&outcome);
        outcome
    }

    /// Whether an execution was started and not yet reconciled
    pub fn is_busy(&self) -> bool {
        self.lock().busy
    }

    /// Whether a message occupies the pending slot
    pub fn has_pending(&self) -> bool {
        self.lock().pending.is_some()
    }

    /// Number of registered topics
    pub fn handler_count(&self) -> usize {
        self.lock().handlers.len()
    }

    /// Whether `topic` has a handler
    pub fn is_registered(&self, topic: &str) -> bool {
        self.lock().handlers.contains_key(topic)
    }

    /// Whether `topic`'s handler holds a live execution
    pub fn is_running(&self, topic: &str) -> bool {
        self.lock()
            .handlers
            .get_mut(topic)
            .is_some_and(|handler| handler.state() == HandlerState::Running)
    }

    /// Per-topic duration statistics of reconciled executions
    pub fn execution_summary(&self) -> ExecutionSummary {
        self.lock().execution_stats.summary()
    }

    /// Shared counters
    pub fn metrics(&self) -> &Arc<DispatcherMetrics> {
        &self.metrics
    }

    fn lock(&self) -> MutexGuard<'_, DispatcherState<T>> {
        // No user code runs under the lock; recover from poisoning anyway
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl<T: Clone> Dispatcher<T> {
    /// Copy of the pending message, if any
    pub fn pending(&self) -> Option<Message<T>> {
        self.lock().pending.clone()
    }
}

impl<T: Clone + Send + 'static> Dispatcher<T> {
    /// Advance the pending message's handler by one step
    ///
    /// Synchronous and non-blocking. Starting an action spawns it on the
    /// current Tokio runtime.
    ///
    /// # Panics
    /// Panics when an action must be started outside a Tokio runtime.
    pub fn tick(&self) -> TickOutcome {
        let (outcome, busy) = {
            let mut state = self.lock();
            let outcome = state.tick();
            (outcome, state.busy)
        };

        self.metrics.record_tick(&outcome);
        observability::record_tick(&outcome, busy);
        outcome
    }
}

impl<T: Clone + Send + 'static> DispatcherState<T> {
    fn tick(&mut self) -> TickOutcome {
        let Some(pending) = self.pending.as_ref() else {
            return TickOutcome::Idle;
        };

        let Some(handler) = self.handlers.get_mut(&pending.topic) else {
            if self.stranded_reported {
                debug!(topic = %pending.topic, "No handler for pending message");
            } else {
                warn!(
                    topic = %pending.topic,
                    "No handler registered for pending message, leaving it in place"
                );
                self.stranded_reported = true;
            }
            return TickOutcome::UnknownTopic;
        };

        match handler.state() {
            HandlerState::Running => {
                if self.skip_reported {
                    debug!(topic = %pending.topic, "Handler already running, tick skipped");
                } else {
                    info!(topic = %pending.topic, "Handler already running, tick skipped");
                    self.skip_reported = true;
                }
                TickOutcome::Skipped
            }
            HandlerState::Finished(outcome) => {
                let elapsed = handler
                    .clear()
                    .map(|execution| execution.elapsed())
                    .unwrap_or_default();
                log_finished(&pending.topic, outcome, elapsed);
                let elapsed_ms = elapsed.as_secs_f64() * 1000.0;
                self.execution_stats
                    .update(&pending.topic, outcome, elapsed_ms);
                observability::record_execution(&pending.topic, outcome, elapsed_ms);
                self.pending = None;
                self.busy = false;
                TickOutcome::Reconciled(outcome)
            }
            HandlerState::Idle => {
                handler.start(pending);
                self.busy = true;
                self.skip_reported = false;
                TickOutcome::Started
            }
        }
    }
}

fn log_finished(topic: &str, outcome: ExecutionOutcome, elapsed: Duration) {
    let elapsed_ms = elapsed.as_millis() as u64;
    match outcome {
        ExecutionOutcome::Completed => {
            info!(topic = %topic, elapsed_ms, "Handler finished");
        }
        ExecutionOutcome::Panicked => {
            error!(topic = %topic, elapsed_ms, "Handler panicked");
        }
        ExecutionOutcome::Cancelled => {
            warn!(topic = %topic, elapsed_ms, "Handler cancelled");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Notify;
    use tokio::time::{sleep, timeout};

    /// Nullary action that blocks on `gate` and counts its starts
    fn gated(gate: &Arc<Notify>, starts: &Arc<AtomicUsize>) -> Action<String> {
        let gate = Arc::clone(gate);
        let starts = Arc::clone(starts);
        Action::nullary(move || {
            let gate = Arc::clone(&gate);
            starts.fetch_add(1, Ordering::SeqCst);
            async move {
                gate.notified().await;
            }
        })
    }

    async fn wait_until_finished(dispatcher: &Dispatcher<String>, topic: &str) {
        timeout(Duration::from_secs(1), async {
            while dispatcher.is_running(topic) {
                sleep(Duration::from_millis(1)).await;
            }
        })
        .await
        .expect("handler did not finish");
    }

    #[tokio::test]
    async fn test_tick_without_pending_is_idle() {
        let dispatcher: Dispatcher<String> = Dispatcher::new();
        assert_eq!(dispatcher.tick(), TickOutcome::Idle);
        assert!(!dispatcher.is_busy());
    }

    #[test]
    fn test_duplicate_registration_keeps_first() {
        let dispatcher: Dispatcher<String> = Dispatcher::new();
        assert!(dispatcher.register_nullary("t1", || async {}).unwrap());
        assert!(!dispatcher
            .register_unary("t1", |_value| async {})
            .unwrap());
        assert_eq!(dispatcher.handler_count(), 1);

        let state = dispatcher.lock();
        assert_eq!(state.handlers["t1"].action().arity(), 0);
    }

    #[test]
    fn test_empty_topic_rejected() {
        let dispatcher: Dispatcher<String> = Dispatcher::new();
        let result = dispatcher.register_nullary("", || async {});
        assert!(matches!(
            result,
            Err(DispatcherError::Contract(ContractError::InvalidTopic { .. }))
        ));
        assert_eq!(dispatcher.handler_count(), 0);
    }

    #[test]
    fn test_idle_publish_overwrites_pending() {
        let dispatcher: Dispatcher<String> = Dispatcher::new();
        assert_eq!(
            dispatcher.publish(Message::new("a")),
            PublishOutcome::Accepted
        );
        assert_eq!(
            dispatcher.publish(Message::with_value("b", "v".to_string())),
            PublishOutcome::Replaced
        );
        assert_eq!(
            dispatcher.pending(),
            Some(Message::with_value("b", "v".to_string()))
        );
        assert_eq!(dispatcher.metrics().replaced_count(), 1);
    }

    #[tokio::test]
    async fn test_full_cycle_with_drop_while_busy() {
        let dispatcher = Dispatcher::new();
        let gate = Arc::new(Notify::new());
        let starts = Arc::new(AtomicUsize::new(0));
        dispatcher.register("t1", gated(&gate, &starts)).unwrap();

        dispatcher.publish(Message::new("t1"));
        assert_eq!(dispatcher.tick(), TickOutcome::Started);
        assert!(dispatcher.is_busy());
        // Pending slot is kept until reconciliation
        assert_eq!(dispatcher.pending(), Some(Message::new("t1")));

        let dropped = Message::with_value("t1", "late".to_string());
        assert_eq!(dispatcher.publish(dropped), PublishOutcome::DroppedBusy);
        assert_eq!(dispatcher.pending(), Some(Message::new("t1")));

        for _ in 0..3 {
            assert_eq!(dispatcher.tick(), TickOutcome::Skipped);
        }

        gate.notify_one();
        wait_until_finished(&dispatcher, "t1").await;
        assert!(dispatcher.is_busy());
        assert_eq!(starts.load(Ordering::SeqCst), 1);

        assert_eq!(
            dispatcher.tick(),
            TickOutcome::Reconciled(ExecutionOutcome::Completed)
        );
        assert!(!dispatcher.is_busy());
        assert_eq!(dispatcher.pending(), None);
        assert_eq!(dispatcher.tick(), TickOutcome::Idle);

        let snap = dispatcher.metrics().snapshot();
        assert_eq!(snap.started_count, 1);
        assert_eq!(snap.skipped_count, 3);
        assert_eq!(snap.reconciled_count, 1);
        assert_eq!(snap.dropped_count, 1);
    }

    #[tokio::test]
    async fn test_unary_receives_pending_value() {
        let dispatcher = Dispatcher::new();
        let seen = Arc::new(StdMutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        dispatcher
            .register_unary("t2", move |value: Option<String>| {
                let sink = Arc::clone(&sink);
                async move {
                    sink.lock().unwrap().push(value);
                }
            })
            .unwrap();

        dispatcher.publish(Message::with_value("t2", "X".to_string()));
        assert_eq!(dispatcher.tick(), TickOutcome::Started);
        wait_until_finished(&dispatcher, "t2").await;
        dispatcher.tick();

        dispatcher.publish(Message::new("t2"));
        dispatcher.tick();
        wait_until_finished(&dispatcher, "t2").await;
        dispatcher.tick();

        assert_eq!(
            *seen.lock().unwrap(),
            vec![Some("X".to_string()), None]
        );
    }

    #[tokio::test]
    async fn test_unknown_topic_is_stranded() {
        let dispatcher: Dispatcher<String> = Dispatcher::new();
        dispatcher.register_nullary("known", || async {}).unwrap();

        dispatcher.publish(Message::new("unknown"));
        assert_eq!(dispatcher.tick(), TickOutcome::UnknownTopic);
        assert_eq!(dispatcher.tick(), TickOutcome::UnknownTopic);
        assert_eq!(dispatcher.pending(), Some(Message::new("unknown")));
        assert!(!dispatcher.is_busy());

        assert_eq!(
            dispatcher.publish(Message::new("known")),
            PublishOutcome::Replaced
        );
        assert_eq!(dispatcher.tick(), TickOutcome::Started);
        assert_eq!(dispatcher.metrics().unknown_topic_count(), 2);
    }

    #[tokio::test]
    async fn test_panicking_action_is_reconciled() {
        let dispatcher: Dispatcher<String> = Dispatcher::new();
        dispatcher
            .register_nullary("boom", || async {
                panic!("action failure");
            })
            .unwrap();

        dispatcher.publish(Message::new("boom"));
        assert_eq!(dispatcher.tick(), TickOutcome::Started);
        wait_until_finished(&dispatcher, "boom").await;

        assert_eq!(
            dispatcher.tick(),
            TickOutcome::Reconciled(ExecutionOutcome::Panicked)
        );
        assert!(!dispatcher.is_busy());
        assert_eq!(dispatcher.metrics().failed_count(), 1);

        let summary = dispatcher.execution_summary();
        assert_eq!(summary.topics.len(), 1);
        assert_eq!(summary.topics[0].failures, 1);
    }

    #[tokio::test]
    async fn test_panic_before_future_is_reconciled() {
        let dispatcher: Dispatcher<String> = Dispatcher::new();
        dispatcher
            .register_nullary("boom", || -> std::future::Ready<()> {
                panic!("closure failure");
            })
            .unwrap();
        dispatcher.register_nullary("ok", || async {}).unwrap();

        dispatcher.publish(Message::new("boom"));
        assert_eq!(dispatcher.tick(), TickOutcome::Started);
        assert!(dispatcher.is_busy());
        wait_until_finished(&dispatcher, "boom").await;

        assert_eq!(
            dispatcher.tick(),
            TickOutcome::Reconciled(ExecutionOutcome::Panicked)
        );
        assert!(!dispatcher.is_busy());
        assert_eq!(dispatcher.pending(), None);

        assert_eq!(dispatcher.publish(Message::new("ok")), PublishOutcome::Accepted);
        assert_eq!(dispatcher.tick(), TickOutcome::Started);
        wait_until_finished(&dispatcher, "ok").await;
        assert_eq!(
            dispatcher.tick(),
            TickOutcome::Reconciled(ExecutionOutcome::Completed)
        );
        assert_eq!(dispatcher.metrics().failed_count(), 1);
    }

    #[tokio::test]
    async fn test_action_may_publish_from_closure() {
        let dispatcher: Arc<Dispatcher<String>> = Arc::new(Dispatcher::new());
        let inner = Arc::clone(&dispatcher);
        dispatcher
            .register_nullary("t1", move || {
                // Runs off the state lock, so this does not deadlock
                let outcome = inner.publish(Message::new("late"));
                async move {
                    assert_eq!(outcome, PublishOutcome::DroppedBusy);
                }
            })
            .unwrap();

        dispatcher.publish(Message::new("t1"));
        assert_eq!(dispatcher.tick(), TickOutcome::Started);
        wait_until_finished(&dispatcher, "t1").await;
        assert_eq!(
            dispatcher.tick(),
            TickOutcome::Reconciled(ExecutionOutcome::Completed)
        );
        assert_eq!(dispatcher.metrics().dropped_count(), 1);
    }

    #[tokio::test]
    async fn test_skip_reported_once_per_execution() {
        let dispatcher = Dispatcher::new();
        let gate = Arc::new(Notify::new());
        let starts = Arc::new(AtomicUsize::new(0));
        dispatcher.register("t1", gated(&gate, &starts)).unwrap();

        for _ in 0..2 {
            dispatcher.publish(Message::new("t1"));
            assert_eq!(dispatcher.tick(), TickOutcome::Started);
            assert!(!dispatcher.lock().skip_reported);

            assert_eq!(dispatcher.tick(), TickOutcome::Skipped);
            assert!(dispatcher.lock().skip_reported);
            assert_eq!(dispatcher.tick(), TickOutcome::Skipped);
            assert!(dispatcher.lock().skip_reported);

            gate.notify_one();
            wait_until_finished(&dispatcher, "t1").await;
            assert!(matches!(dispatcher.tick(), TickOutcome::Reconciled(_)));
        }
        assert_eq!(dispatcher.metrics().skipped_count(), 4);
    }

    #[tokio::test]
    async fn test_second_cycle_runs_like_first() {
        let dispatcher = Dispatcher::new();
        let gate = Arc::new(Notify::new());
        let starts = Arc::new(AtomicUsize::new(0));
        dispatcher.register("t1", gated(&gate, &starts)).unwrap();

        for cycle in 1..=2 {
            assert_eq!(
                dispatcher.publish(Message::new("t1")),
                PublishOutcome::Accepted
            );
            assert_eq!(dispatcher.tick(), TickOutcome::Started);
            gate.notify_one();
            wait_until_finished(&dispatcher, "t1").await;
            assert_eq!(
                dispatcher.tick(),
                TickOutcome::Reconciled(ExecutionOutcome::Completed)
            );
            assert_eq!(starts.load(Ordering::SeqCst), cycle);
        }
    }
}
