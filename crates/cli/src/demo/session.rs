//! Demo session - wires handlers, driver and publisher around one dispatcher.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use contracts::TickerBlueprint;
use dispatcher::{Dispatcher, TickDriver};
use tokio::time::sleep;
use tracing::{info, warn};

use super::{register_handlers, DemoPublisher, DemoStats};
use crate::error::Result;

/// Demo session configuration
#[derive(Debug, Clone)]
pub struct DemoConfig {
    /// Handlers, cadences and payload pool
    pub blueprint: TickerBlueprint,

    /// Stop publishing after this many publishes (None = unlimited)
    pub max_publishes: Option<u64>,

    /// Session timeout (None = no timeout)
    pub timeout: Option<Duration>,

    /// RNG seed for the publisher
    pub seed: Option<u64>,
}

/// One demo run
pub struct DemoSession {
    config: DemoConfig,
}

impl DemoSession {
    pub fn new(config: DemoConfig) -> Self {
        Self { config }
    }

    /// Run until the publish limit is reached and drained, the timeout
    /// expires or `shutdown` resolves
    pub async fn run<S>(self, shutdown: S) -> Result<DemoStats>
    where
        S: Future<Output = ()>,
    {
        let start_time = Instant::now();
        let blueprint = &self.config.blueprint;
        let tick_interval = blueprint.dispatcher.tick_interval();

        let dispatcher = Arc::new(Dispatcher::new());
        let registered = register_handlers(&dispatcher, &blueprint.handlers)?;
        info!(handlers = registered, "Handlers registered");

        let driver = TickDriver::spawn(Arc::clone(&dispatcher), tick_interval)?;
        info!(
            tick_interval_ms = blueprint.dispatcher.tick_interval_ms,
            "Tick driver running"
        );

        let publisher = DemoPublisher::new(&blueprint.demo, self.config.seed);
        let work = async {
            let published = publisher
                .run(Arc::clone(&dispatcher), self.config.max_publishes)
                .await;
            info!(published, "Publish limit reached, draining");
            drain(&dispatcher, tick_interval).await;
        };

        let timeout = async {
            match self.config.timeout {
                Some(timeout) => sleep(timeout).await,
                None => std::future::pending::<()>().await,
            }
        };

        tokio::select! {
            _ = work => {
                info!("Demo finished");
            }
            _ = timeout => {
                info!("Demo timeout reached");
            }
            _ = shutdown => {
                warn!("Received shutdown signal, stopping demo...");
            }
        }

        let ticks = driver.shutdown().await?;
        let metrics = dispatcher.metrics().snapshot();

        Ok(DemoStats {
            duration: start_time.elapsed(),
            ticks,
            publishes: metrics.publish_count(),
            metrics,
            executions: dispatcher.execution_summary(),
            busy_at_shutdown: dispatcher.is_busy(),
        })
    }
}

/// Wait until nothing routable is pending and no handler is running
async fn drain(dispatcher: &Dispatcher<String>, poll: Duration) {
    loop {
        let routable = dispatcher
            .pending()
            .is_some_and(|msg| dispatcher.is_registered(&msg.topic));
        if !dispatcher.is_busy() && !routable {
            return;
        }
        sleep(poll).await;
    }
}
