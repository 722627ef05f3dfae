//! Logging utilities.
//!
//! Centralizes logger initialization behind the standard `log` facade.
//! Load failures, display fallbacks, and uniform mismatches all report
//! through `log::warn!`, so most diagnostics are invisible until a logger
//! is installed.

mod init;

pub use init::{init_logging, LoggingConfig};
