//! `info` command implementation.

use anyhow::{Context, Result};
use contracts::TickerBlueprint;
use serde::Serialize;
use tracing::info;

use crate::cli::InfoArgs;
use crate::config::{load_blueprint, source_label};

/// Configuration info for JSON output
#[derive(Serialize)]
struct ConfigInfo {
    version: String,
    tick_interval_ms: u64,
    publish_interval_ms: [u64; 2],
    handlers: Vec<HandlerInfo>,
    payloads: Vec<PayloadInfo>,
}

#[derive(Serialize)]
struct HandlerInfo {
    topic: String,
    kind: String,
    takes_value: bool,
    steps: u32,
    step_interval_ms: u64,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    labels: Vec<String>,
}

#[derive(Serialize)]
struct PayloadInfo {
    topic: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    value: Option<String>,
    routed: bool,
}

/// Execute the `info` command
pub fn run_info(args: &InfoArgs) -> Result<()> {
    let source = source_label(args.config.as_deref());
    info!(config = %source, "Loading configuration info");

    let blueprint = load_blueprint(args.config.as_deref())
        .with_context(|| format!("Failed to load config from {source}"))?;

    if args.json {
        let info = build_config_info(&blueprint);
        let json =
            serde_json::to_string_pretty(&info).context("Failed to serialize config info")?;
        println!("{}", json);
    } else {
        print_config_info(&blueprint, &source);
    }

    Ok(())
}

fn build_config_info(blueprint: &TickerBlueprint) -> ConfigInfo {
    let unrouted = blueprint.unrouted_topics();
    ConfigInfo {
        version: format!("{:?}", blueprint.version),
        tick_interval_ms: blueprint.dispatcher.tick_interval_ms,
        publish_interval_ms: [
            blueprint.demo.min_publish_interval_ms,
            blueprint.demo.max_publish_interval_ms,
        ],
        handlers: blueprint
            .handlers
            .iter()
            .map(|h| HandlerInfo {
                topic: h.topic.clone(),
                kind: format!("{:?}", h.kind).to_lowercase(),
                takes_value: h.kind.takes_value(),
                steps: h.steps,
                step_interval_ms: h.step_interval_ms,
                labels: h.labels.clone(),
            })
            .collect(),
        payloads: blueprint
            .demo
            .messages
            .iter()
            .map(|m| PayloadInfo {
                topic: m.topic.clone(),
                value: m.value.clone(),
                routed: !unrouted.contains(&m.topic.as_str()),
            })
            .collect(),
    }
}

fn print_config_info(blueprint: &TickerBlueprint, source: &str) {
    let info = build_config_info(blueprint);

    println!("\n=== Dispatcher Configuration ===\n");
    println!("Source: {}", source);
    println!("Version: {}", info.version);
    println!("Tick interval: {}ms", info.tick_interval_ms);
    println!(
        "Publish interval: {}-{}ms",
        info.publish_interval_ms[0], info.publish_interval_ms[1]
    );

    println!("\nHandlers ({}):", info.handlers.len());
    for handler in &info.handlers {
        let arity = if handler.takes_value { "value" } else { "no value" };
        println!(
            "  - {} ({}, {}) - {} steps every {}ms",
            handler.topic, handler.kind, arity, handler.steps, handler.step_interval_ms
        );
        if !handler.labels.is_empty() {
            println!("      labels: {}", handler.labels.join(", "));
        }
    }

    println!("\nDemo payloads ({}):", info.payloads.len());
    for payload in &info.payloads {
        let value = payload.value.as_deref().unwrap_or("-");
        let note = if payload.routed { "" } else { "  [no handler]" };
        println!("  - {} value={}{}", payload.topic, value, note);
    }

    println!();
}
