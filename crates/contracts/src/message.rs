//! Message - publish input
//!
//! The payload offered to the dispatcher's single pending slot.

use serde::{Deserialize, Serialize};

/// A message routed to the handler registered for `topic`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message<T> {
    /// Routing key
    pub topic: String,

    /// Optional payload, handed to unary actions
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<T>,
}

impl<T> Message<T> {
    /// Create a message without a value
    pub fn new(topic: impl Into<String>) -> Self {
        Self {
            topic: topic.into(),
            value: None,
        }
    }

    /// Create a message carrying `value`
    pub fn with_value(topic: impl Into<String>, value: T) -> Self {
        Self {
            topic: topic.into(),
            value: Some(value),
        }
    }
}

/// Result of offering a message to the dispatcher
///
/// Informational only: the dispatcher never fails a publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PublishOutcome {
    /// Stored into an empty slot
    Accepted,
    /// Stored, overwriting an unconsumed message
    Replaced,
    /// Discarded because an execution is in flight
    DroppedBusy,
}

impl PublishOutcome {
    /// Whether the message now occupies the pending slot
    pub fn is_stored(&self) -> bool {
        !matches!(self, Self::DroppedBusy)
    }

    /// Stable label for logs and metrics
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Accepted => "accepted",
            Self::Replaced => "replaced",
            Self::DroppedBusy => "dropped_busy",
        }
    }
}
