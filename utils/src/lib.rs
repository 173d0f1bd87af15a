//! Shared utilities for the oracle service.

pub mod logging;

pub use logging::{init_logging, LogFormat, UnknownLogFormat};
