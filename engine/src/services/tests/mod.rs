//! Tests for engine services
//!
//! Real implementations are exercised directly; the Pub/Sub client runs
//! against a local wiremock server.

pub mod helpers;
