//! Random demo publisher.

use std::sync::Arc;
use std::time::Duration;

use contracts::{DemoSettings, Message};
use dispatcher::Dispatcher;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use tokio::time::sleep;
use tracing::{info, warn};

/// Publishes a random payload from the pool, then sleeps a random interval
pub struct DemoPublisher {
    messages: Vec<Message<String>>,
    min_interval: Duration,
    max_interval: Duration,
    rng: StdRng,
}

impl DemoPublisher {
    /// Create a publisher; `seed` makes payload and interval choices repeatable
    pub fn new(settings: &DemoSettings, seed: Option<u64>) -> Self {
        let (min_interval, max_interval) = settings.publish_interval_bounds();
        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            messages: settings.messages.clone(),
            min_interval,
            max_interval,
            rng,
        }
    }

    /// Pick the next payload
    pub fn next_message(&mut self) -> Option<Message<String>> {
        self.messages.choose(&mut self.rng).cloned()
    }

    /// Pick the next delay, uniform in `[min, max]` at millisecond resolution
    pub fn next_delay(&mut self) -> Duration {
        let min = self.min_interval.as_millis() as u64;
        let max = self.max_interval.as_millis() as u64;
        if min >= max {
            return self.max_interval;
        }
        Duration::from_millis(self.rng.random_range(min..=max))
    }

    /// Publish until `limit` publishes were made (forever when `None`)
    ///
    /// Returns the number of publishes, including dropped ones.
    pub async fn run(mut self, dispatcher: Arc<Dispatcher<String>>, limit: Option<u64>) -> u64 {
        if self.messages.is_empty() {
            warn!("Demo payload pool is empty, publisher idle");
            std::future::pending::<()>().await;
        }

        let mut published: u64 = 0;
        while let Some(message) = self.next_message() {
            let topic = message.topic.clone();
            let value = message.value.clone();
            let outcome = dispatcher.publish(message);
            published += 1;

            info!(
                topic = %topic,
                value = ?value,
                outcome = outcome.as_str(),
                "Published"
            );

            if limit.is_some_and(|limit| published >= limit) {
                break;
            }
            sleep(self.next_delay()).await;
        }
        published
    }
}
