//! # Contracts
//!
//! Shared interface contracts between the dispatcher, its configuration and
//! its observers. Business crates depend on this crate only; it depends on
//! none of them.
//!
//! ## Delivery model
//! - A single pending [`Message`] slot, polled on a fixed tick
//! - At most one in-flight execution per topic
//! - Publishes are dropped while an execution is in flight, never queued

mod blueprint;
mod error;
mod message;
mod outcome;

pub use blueprint::*;
pub use error::*;
pub use message::*;
pub use outcome::*;
