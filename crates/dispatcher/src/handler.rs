//! Handler - an action bound to a topic plus its execution slot

use std::sync::Arc;

use contracts::{ExecutionOutcome, Message};
use tracing::info;

use crate::action::{Action, ActionFuture};
use crate::execution::Execution;

/// Execution state of a handler, as seen by a tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerState {
    /// No execution held
    Idle,
    /// Execution still live
    Running,
    /// Execution ended, waiting for reconciliation
    Finished(ExecutionOutcome),
}

/// A registered action and its at-most-one execution
#[derive(Debug)]
pub struct Handler<T> {
    topic: String,
    action: Arc<Action<T>>,
    execution: Option<Execution>,
}

impl<T> Handler<T> {
    pub fn new(topic: impl Into<String>, action: Action<T>) -> Self {
        Self {
            topic: topic.into(),
            action: Arc::new(action),
            execution: None,
        }
    }

    pub fn action(&self) -> &Action<T> {
        &self.action
    }

    /// Current state; checks the completion signal without blocking
    pub fn state(&mut self) -> HandlerState {
        match self.execution.as_mut() {
            None => HandlerState::Idle,
            Some(execution) => match execution.outcome() {
                None => HandlerState::Running,
                Some(outcome) => HandlerState::Finished(outcome),
            },
        }
    }

    /// Drop the finished execution, returning to Idle
    pub(crate) fn clear(&mut self) -> Option<Execution> {
        self.execution.take()
    }
}

impl<T: Clone + Send + 'static> Handler<T> {
    /// Launch the action for `message`
    ///
    /// The action is invoked on the spawned task, so a panic while building
    /// its future ends the run as [`ExecutionOutcome::Panicked`] like any
    /// other failure. Callers must check the handler is
    /// [`HandlerState::Idle`] first.
    pub(crate) fn start(&mut self, message: &Message<T>) {
        debug_assert!(self.execution.is_none());
        let action = Arc::clone(&self.action);
        let value = message.value.clone();
        let future: ActionFuture = Box::pin(async move { action.invoke(value).await });
        self.execution = Some(Execution::spawn(&self.topic, future));
        info!(
            topic = %self.topic,
            arity = self.action.arity(),
            "Handler execution started"
        );
    }
}
