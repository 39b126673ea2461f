//! Application configuration and constants.
//!
//! This module provides:
//! - Configuration constants (backend defaults, timeouts, poll cadence)
//! - The library-level `ClientConfig`
//! - CLI option types and parsing

mod constants;
mod types;

// Re-export all constants
pub use constants::*;
pub use types::{ClientConfig, Command, LogFormat, LogLevel, Opt};
