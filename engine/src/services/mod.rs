//! Engine services implementations

pub mod helpers;
pub mod metrics;
pub mod pubsub_client;
pub mod template;

#[cfg(test)]
pub mod tests;

pub use helpers::*;
pub use metrics::*;
pub use pubsub_client::*;
pub use template::*;
