//! # Dispatcher
//!
//! Tick-driven, at-most-one-in-flight message dispatch.
//!
//! Responsibilities:
//! - Hold a single pending message, overwritten by publishes while idle
//! - Launch the handler registered for its topic on the next tick
//! - Drop publishes while an execution is in flight
//! - Reconcile finished executions on the tick after they end

pub mod action;
pub mod dispatcher;
pub mod driver;
pub mod error;
pub mod execution;
pub mod handler;
pub mod metrics;

pub use action::{Action, ActionFuture};
pub use contracts::{ExecutionOutcome, Message, PublishOutcome, TickOutcome};
pub use dispatcher::Dispatcher;
pub use driver::{TickDriver, DEFAULT_TICK_INTERVAL};
pub use error::DispatcherError;
pub use execution::Execution;
pub use handler::{Handler, HandlerState};
pub use metrics::{DispatcherMetrics, MetricsSnapshot};
