//! Test fixtures and utilities

pub mod fake_pubsub;
pub mod scripts;

pub use fake_pubsub::*;
#[allow(unused_imports)]
pub use scripts::*;
