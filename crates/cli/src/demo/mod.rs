//! Demo wiring: handlers built from configuration, a random publisher and
//! the session that ties them to a running dispatcher.

mod actions;
mod publisher;
mod session;
mod stats;

pub use actions::{build_action, register_handlers};
pub use publisher::DemoPublisher;
pub use session::{DemoConfig, DemoSession};
pub use stats::DemoStats;
