//! TickerBlueprint - Config Loader output
//!
//! Describes a complete dispatcher setup: tick cadence, demo handlers and the
//! demo publisher's payload pool.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::Message;

/// Configuration version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// Complete dispatcher blueprint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TickerBlueprint {
    /// Configuration version
    #[serde(default)]
    pub version: ConfigVersion,

    /// Dispatcher settings
    #[serde(default)]
    pub dispatcher: DispatcherSettings,

    /// Demo publisher settings
    #[serde(default)]
    pub demo: DemoSettings,

    /// Handlers to register, in order; topics must be unique
    #[serde(default)]
    pub handlers: Vec<HandlerConfig>,
}

impl TickerBlueprint {
    /// Topics of handlers declared in this blueprint
    pub fn handler_topics(&self) -> impl Iterator<Item = &str> {
        self.handlers.iter().map(|h| h.topic.as_str())
    }

    /// Demo payload topics with no declared handler
    ///
    /// Publishing to these is legal; the message is stranded at tick time.
    pub fn unrouted_topics(&self) -> Vec<&str> {
        let mut unrouted: Vec<&str> = Vec::new();
        for msg in &self.demo.messages {
            let topic = msg.topic.as_str();
            if !self.handlers.iter().any(|h| h.topic == topic) && !unrouted.contains(&topic) {
                unrouted.push(topic);
            }
        }
        unrouted
    }
}

impl Default for TickerBlueprint {
    /// Demo wiring: two nullary counters and one value-taking handler
    fn default() -> Self {
        Self {
            version: ConfigVersion::V1,
            dispatcher: DispatcherSettings::default(),
            demo: DemoSettings {
                messages: vec![
                    Message::new("count_5"),
                    Message::new("count_ABC"),
                    Message::with_value("with_param", "Hello".to_string()),
                    Message::with_value("with_param", "World".to_string()),
                ],
                ..DemoSettings::default()
            },
            handlers: vec![
                HandlerConfig {
                    topic: "count_5".to_string(),
                    kind: HandlerKind::Counter,
                    steps: 5,
                    step_interval_ms: default_step_interval_ms(),
                    labels: Vec::new(),
                },
                HandlerConfig {
                    topic: "count_ABC".to_string(),
                    kind: HandlerKind::Sequence,
                    steps: 3,
                    step_interval_ms: default_step_interval_ms(),
                    labels: vec!["A".to_string(), "B".to_string(), "C".to_string()],
                },
                HandlerConfig {
                    topic: "with_param".to_string(),
                    kind: HandlerKind::Echo,
                    steps: 3,
                    step_interval_ms: default_step_interval_ms(),
                    labels: Vec::new(),
                },
            ],
        }
    }
}

/// Dispatcher settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DispatcherSettings {
    /// Tick period in milliseconds
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
}

impl DispatcherSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

impl Default for DispatcherSettings {
    fn default() -> Self {
        Self {
            tick_interval_ms: default_tick_interval_ms(),
        }
    }
}

fn default_tick_interval_ms() -> u64 {
    100
}

/// Demo publisher settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DemoSettings {
    /// Lower bound of the randomized publish interval (ms)
    #[serde(default = "default_min_publish_interval_ms")]
    pub min_publish_interval_ms: u64,

    /// Upper bound of the randomized publish interval (ms)
    #[serde(default = "default_max_publish_interval_ms")]
    pub max_publish_interval_ms: u64,

    /// Payload pool the publisher picks from at random
    #[serde(default)]
    pub messages: Vec<Message<String>>,
}

impl DemoSettings {
    /// Publish interval bounds as a `(min, max)` pair
    pub fn publish_interval_bounds(&self) -> (Duration, Duration) {
        (
            Duration::from_millis(self.min_publish_interval_ms),
            Duration::from_millis(self.max_publish_interval_ms),
        )
    }
}

impl Default for DemoSettings {
    fn default() -> Self {
        Self {
            min_publish_interval_ms: default_min_publish_interval_ms(),
            max_publish_interval_ms: default_max_publish_interval_ms(),
            messages: Vec::new(),
        }
    }
}

fn default_min_publish_interval_ms() -> u64 {
    5_000
}

fn default_max_publish_interval_ms() -> u64 {
    10_000
}

/// A demo handler declaration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerConfig {
    /// Topic this handler is registered under
    pub topic: String,

    /// Behaviour of the action
    pub kind: HandlerKind,

    /// Number of steps the action performs
    #[serde(default = "default_steps")]
    pub steps: u32,

    /// Delay between steps (ms)
    #[serde(default = "default_step_interval_ms")]
    pub step_interval_ms: u64,

    /// Labels walked by `sequence` handlers
    #[serde(default)]
    pub labels: Vec<String>,
}

impl HandlerConfig {
    pub fn step_interval(&self) -> Duration {
        Duration::from_millis(self.step_interval_ms)
    }
}

fn default_steps() -> u32 {
    3
}

fn default_step_interval_ms() -> u64 {
    1_000
}

/// Demo action behaviour
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HandlerKind {
    /// Nullary: counts 1..=steps
    Counter,
    /// Nullary: walks `labels`
    Sequence,
    /// Unary: processes the message value in `steps` steps
    Echo,
}

impl HandlerKind {
    /// Whether the action takes the message value
    pub fn takes_value(&self) -> bool {
        matches!(self, Self::Echo)
    }
}
