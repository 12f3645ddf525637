//! HTTP server for the `authgate` authentication core.
//!
//! Exposes signup and signin, plus routes guarded by bearer tokens.

pub mod api;
pub mod config;
pub mod logging;
pub mod metrics;
