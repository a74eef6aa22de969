//! Configuration validation
//!
//! Rules:
//! - tick_interval_ms > 0
//! - 0 < max_publish_interval_ms, min <= max
//! - handler topics non-empty and unique
//! - steps > 0, sequence handlers carry labels
//! - demo message topics non-empty

use std::collections::HashSet;

use contracts::{ContractError, HandlerKind, TickerBlueprint};

/// Validate a TickerBlueprint
///
/// Returns the first error encountered, or Ok(()).
pub fn validate(blueprint: &TickerBlueprint) -> Result<(), ContractError> {
    validate_dispatcher(blueprint)?;
    validate_handlers(blueprint)?;
    validate_demo(blueprint)?;
    Ok(())
}

fn validate_dispatcher(blueprint: &TickerBlueprint) -> Result<(), ContractError> {
    if blueprint.dispatcher.tick_interval_ms == 0 {
        return Err(ContractError::config_validation(
            "dispatcher.tick_interval_ms",
            "tick_interval_ms must be > 0",
        ));
    }
    Ok(())
}

fn validate_handlers(blueprint: &TickerBlueprint) -> Result<(), ContractError> {
    let mut seen = HashSet::new();
    for (idx, handler) in blueprint.handlers.iter().enumerate() {
        if handler.topic.is_empty() {
            return Err(ContractError::config_validation(
                format!("handlers[{idx}].topic"),
                "topic must not be empty",
            ));
        }
        if !seen.insert(&handler.topic) {
            return Err(ContractError::config_validation(
                format!("handlers[topic={}]", handler.topic),
                "duplicate handler topic",
            ));
        }
        if handler.steps == 0 {
            return Err(ContractError::config_validation(
                format!("handlers[{}].steps", handler.topic),
                "steps must be > 0",
            ));
        }
        if handler.kind == HandlerKind::Sequence && handler.labels.is_empty() {
            return Err(ContractError::config_validation(
                format!("handlers[{}].labels", handler.topic),
                "sequence handler requires at least one label",
            ));
        }
    }
    Ok(())
}

fn validate_demo(blueprint: &TickerBlueprint) -> Result<(), ContractError> {
    let demo = &blueprint.demo;

    if demo.max_publish_interval_ms == 0 {
        return Err(ContractError::config_validation(
            "demo.max_publish_interval_ms",
            "max_publish_interval_ms must be > 0",
        ));
    }
    if demo.min_publish_interval_ms > demo.max_publish_interval_ms {
        return Err(ContractError::config_validation(
            "demo.min_publish_interval_ms",
            format!(
                "min_publish_interval_ms ({}) > max_publish_interval_ms ({})",
                demo.min_publish_interval_ms, demo.max_publish_interval_ms
            ),
        ));
    }
    for (idx, msg) in demo.messages.iter().enumerate() {
        if msg.topic.is_empty() {
            return Err(ContractError::config_validation(
                format!("demo.messages[{idx}].topic"),
                "topic must not be empty",
            ));
        }
    }
    Ok(())
}
