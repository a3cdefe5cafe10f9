//! Shared utilities for the krypt transfer client.

pub mod logging;

pub use logging::{init_logging, LogFormat};
