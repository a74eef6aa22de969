//! Configuration parsing
//!
//! TOML (primary) and JSON.

use contracts::{ContractError, TickerBlueprint};

/// Configuration file format
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    /// TOML (recommended)
    Toml,
    /// JSON
    Json,
}

impl ConfigFormat {
    /// Infer format from a file extension
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "toml" => Some(Self::Toml),
            "json" => Some(Self::Json),
            _ => None,
        }
    }
}

/// Parse TOML configuration
pub fn parse_toml(content: &str) -> Result<TickerBlueprint, ContractError> {
    toml::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("TOML parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse JSON configuration
pub fn parse_json(content: &str) -> Result<TickerBlueprint, ContractError> {
    serde_json::from_str(content).map_err(|e| ContractError::ConfigParse {
        message: format!("JSON parse error: {e}"),
        source: Some(Box::new(e)),
    })
}

/// Parse configuration in the given format
pub fn parse(content: &str, format: ConfigFormat) -> Result<TickerBlueprint, ContractError> {
    match format {
        ConfigFormat::Toml => parse_toml(content),
        ConfigFormat::Json => parse_json(content),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::HandlerKind;

    #[test]
    fn test_parse_toml_minimal() {
        let content = r#"
[dispatcher]
tick_interval_ms = 50

[[handlers]]
topic = "count_5"
kind = "counter"
steps = 5

[[demo.messages]]
topic = "count_5"
"#;
        let result = parse_toml(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.dispatcher.tick_interval_ms, 50);
        assert_eq!(bp.handlers.len(), 1);
        assert_eq!(bp.handlers[0].kind, HandlerKind::Counter);
        assert_eq!(bp.handlers[0].step_interval_ms, 1_000);
        assert_eq!(bp.demo.messages[0].value, None);
    }

    #[test]
    fn test_parse_json_minimal() {
        let content = r#"{
            "handlers": [{ "topic": "with_param", "kind": "echo" }],
            "demo": {
                "min_publish_interval_ms": 10,
                "max_publish_interval_ms": 20,
                "messages": [{ "topic": "with_param", "value": "Hello" }]
            }
        }"#;
        let result = parse_json(content);
        assert!(result.is_ok(), "Failed: {:?}", result.err());
        let bp = result.unwrap();
        assert_eq!(bp.demo.messages[0].value.as_deref(), Some("Hello"));
        assert_eq!(bp.dispatcher.tick_interval_ms, 100);
    }

    #[test]
    fn test_parse_toml_syntax_error() {
        let content = "invalid toml [[[";
        let result = parse_toml(content);
        assert!(result.is_err());
        let err = result.unwrap_err();
        assert!(matches!(err, ContractError::ConfigParse { .. }));
    }

    #[test]
    fn test_parse_unknown_handler_kind() {
        let content = r#"
[[handlers]]
topic = "x"
kind = "teleport"
"#;
        assert!(matches!(
            parse_toml(content),
            Err(ContractError::ConfigParse { .. })
        ));
    }

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_extension("toml"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("TOML"),
            Some(ConfigFormat::Toml)
        );
        assert_eq!(
            ConfigFormat::from_extension("json"),
            Some(ConfigFormat::Json)
        );
        assert_eq!(ConfigFormat::from_extension("yaml"), None);
    }
}
