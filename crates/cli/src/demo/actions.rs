//! Demo actions built from `HandlerConfig`.

use std::sync::Arc;
use std::time::Duration;

use contracts::{HandlerConfig, HandlerKind};
use dispatcher::{Action, Dispatcher, DispatcherError};
use tokio::time::sleep;
use tracing::{info, warn};

/// Build the action described by `config`
///
/// `counter` and `sequence` are nullary; `echo` receives the message value.
pub fn build_action(config: &HandlerConfig) -> Action<String> {
    let topic: Arc<str> = Arc::from(config.topic.as_str());
    let step = config.step_interval();
    let steps = config.steps;

    match config.kind {
        HandlerKind::Counter => Action::nullary(move || count(Arc::clone(&topic), steps, step)),
        HandlerKind::Sequence => {
            let labels: Arc<[String]> = config.labels.iter().cloned().collect();
            Action::nullary(move || walk(Arc::clone(&topic), Arc::clone(&labels), step))
        }
        HandlerKind::Echo => Action::unary(move |value: Option<String>| {
            echo(Arc::clone(&topic), value, steps, step)
        }),
    }
}

/// Register every configured handler, returning how many were inserted
pub fn register_handlers(
    dispatcher: &Dispatcher<String>,
    handlers: &[HandlerConfig],
) -> Result<usize, DispatcherError> {
    let mut registered = 0;
    for config in handlers {
        if dispatcher.register(config.topic.clone(), build_action(config))? {
            registered += 1;
        } else {
            warn!(topic = %config.topic, "Duplicate handler ignored");
        }
    }
    Ok(registered)
}

async fn count(topic: Arc<str>, steps: u32, step: Duration) {
    for i in 1..=steps {
        info!(topic = %topic, step = i, "Counter: {i}");
        sleep(step).await;
    }
    info!(topic = %topic, "Counter finished");
}

async fn walk(topic: Arc<str>, labels: Arc<[String]>, step: Duration) {
    for label in labels.iter() {
        info!(topic = %topic, label = %label, "Counter: {label}");
        sleep(step).await;
    }
    info!(topic = %topic, "Counter finished");
}

async fn echo(topic: Arc<str>, value: Option<String>, steps: u32, step: Duration) {
    let value = value.unwrap_or_else(|| "<none>".to_string());
    info!(topic = %topic, value = %value, "Received value");
    for i in 1..=steps {
        info!(topic = %topic, step = i, "Processing {value} - step {i}");
        sleep(step).await;
    }
    info!(topic = %topic, value = %value, "Finished processing");
}
