//! `run` command implementation.

use anyhow::{Context, Result};
use std::time::Duration;
use tracing::info;

use crate::cli::RunArgs;
use crate::config::{load_blueprint, source_label};
use crate::demo::{DemoConfig, DemoSession};

/// Execute the `run` command
pub async fn run_demo(args: &RunArgs) -> Result<()> {
    let mut blueprint = load_blueprint(args.config.as_deref()).with_context(|| {
        format!(
            "Failed to load config from {}",
            source_label(args.config.as_deref())
        )
    })?;

    // Apply CLI overrides
    if let Some(tick_interval_ms) = args.tick_interval_ms {
        info!(tick_interval_ms, "Overriding tick interval from CLI");
        blueprint.dispatcher.tick_interval_ms = tick_interval_ms;
        config_loader::ConfigLoader::validate(&blueprint)
            .context("Invalid tick interval override")?;
    }

    info!(
        tick_interval_ms = blueprint.dispatcher.tick_interval_ms,
        handlers = blueprint.handlers.len(),
        payloads = blueprint.demo.messages.len(),
        min_publish_interval_ms = blueprint.demo.min_publish_interval_ms,
        max_publish_interval_ms = blueprint.demo.max_publish_interval_ms,
        "Configuration loaded"
    );

    if args.metrics_port != 0 {
        observability::init_metrics_only(args.metrics_port)?;
        info!("Metrics endpoint available on port {}", args.metrics_port);
    }

    let session = DemoSession::new(DemoConfig {
        blueprint,
        max_publishes: (args.max_publishes != 0).then_some(args.max_publishes),
        timeout: (args.timeout != 0).then(|| Duration::from_secs(args.timeout)),
        seed: args.seed,
    });

    info!("Starting demo...");

    let stats = session
        .run(shutdown_signal())
        .await
        .context("Demo execution failed")?;

    info!(
        ticks = stats.ticks,
        publishes = stats.publishes,
        executions = stats.metrics.started_count,
        duration_secs = stats.duration.as_secs_f64(),
        "Demo completed"
    );
    stats.print_summary();

    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
