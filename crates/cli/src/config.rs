//! Blueprint resolution shared by all commands.

use std::path::Path;

use config_loader::ConfigLoader;
use contracts::TickerBlueprint;
use tracing::info;

use crate::error::{CliError, Result};

/// Load the blueprint at `path`, or the built-in demo when `None`
pub fn load_blueprint(path: Option<&Path>) -> Result<TickerBlueprint> {
    match path {
        Some(path) => {
            if !path.exists() {
                return Err(CliError::config_not_found(path.display().to_string()));
            }
            info!(config = %path.display(), "Loading configuration");
            Ok(ConfigLoader::load_from_path(path)?)
        }
        None => {
            info!("No configuration file given, using built-in demo");
            Ok(TickerBlueprint::default())
        }
    }
}

/// Human-readable label for where a blueprint came from
pub fn source_label(path: Option<&Path>) -> String {
    path.map(|p| p.display().to_string())
        .unwrap_or_else(|| "<built-in demo>".to_string())
}

/// Non-fatal issues worth reporting
pub fn collect_warnings(blueprint: &TickerBlueprint) -> Vec<String> {
    let mut warnings = Vec::new();

    if blueprint.handlers.is_empty() {
        warnings.push("No handlers configured - every message will be stranded".to_string());
    }

    if blueprint.demo.messages.is_empty() {
        warnings.push("demo.messages is empty - the demo publisher will idle".to_string());
    }

    for topic in blueprint.unrouted_topics() {
        warnings.push(format!(
            "Demo topic '{topic}' has no handler - its messages stay pending until overwritten"
        ));
    }

    warnings
}
