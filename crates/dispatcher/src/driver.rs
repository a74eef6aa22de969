//! TickDriver - background loop calling `Dispatcher::tick` on a fixed cadence

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, instrument};

use crate::dispatcher::Dispatcher;
use crate::error::DispatcherError;

/// Reference tick cadence
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(100);

/// Handle to a running tick loop
///
/// The loop never awaits handlers; it only sleeps between ticks. Dropping the
/// handle stops the loop at its next wake-up. In-flight actions keep running
/// either way.
#[derive(Debug)]
pub struct TickDriver {
    shutdown_tx: oneshot::Sender<()>,
    worker_handle: JoinHandle<u64>,
}

impl TickDriver {
    /// Spawn the tick loop for `dispatcher` on the current Tokio runtime
    ///
    /// The first tick fires one `interval` after spawning.
    ///
    /// # Errors
    /// `interval` is zero.
    pub fn spawn<T>(
        dispatcher: Arc<Dispatcher<T>>,
        interval: Duration,
    ) -> Result<Self, DispatcherError>
    where
        T: Clone + Send + 'static,
    {
        if interval.is_zero() {
            return Err(DispatcherError::InvalidInterval { interval });
        }

        let (shutdown_tx, shutdown_rx) = oneshot::channel();
        let worker_handle = tokio::spawn(async move {
            tick_loop(dispatcher, interval, shutdown_rx).await
        });

        Ok(Self {
            shutdown_tx,
            worker_handle,
        })
    }

    /// Whether the loop has exited
    pub fn is_finished(&self) -> bool {
        self.worker_handle.is_finished()
    }

    /// Stop the loop and wait for it, returning the number of ticks performed
    #[instrument(name = "tick_driver_shutdown", skip(self))]
    pub async fn shutdown(self) -> Result<u64, DispatcherError> {
        // Loop may already be gone
        let _ = self.shutdown_tx.send(());
        match self.worker_handle.await {
            Ok(ticks) => {
                debug!(ticks, "TickDriver shutdown complete");
                Ok(ticks)
            }
            Err(e) => {
                error!(error = ?e, "Tick loop task failed");
                Err(DispatcherError::driver(e.to_string()))
            }
        }
    }
}

#[instrument(
    name = "tick_driver_loop",
    skip(dispatcher, shutdown_rx),
    fields(interval_ms = interval.as_millis() as u64)
)]
async fn tick_loop<T: Clone + Send + 'static>(
    dispatcher: Arc<Dispatcher<T>>,
    interval: Duration,
    mut shutdown_rx: oneshot::Receiver<()>,
) -> u64 {
    info!("Tick driver started");

    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut tick_count: u64 = 0;

    loop {
        tokio::select! {
            _ = &mut shutdown_rx => break,
            _ = ticker.tick() => {
                dispatcher.tick();
                tick_count += 1;

                if tick_count.is_multiple_of(1000) {
                    debug!(ticks = tick_count, "Tick driver progress");
                }
            }
        }
    }

    info!(ticks = tick_count, "Tick driver stopped");
    tick_count
}
