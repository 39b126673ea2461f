//! Application initialization and resource setup.
//!
//! This module provides functions to initialize shared resources:
//! - The logger (plain or JSON output)
//! - The HTTP client used to talk to the analysis backend
//!
//! All initialization functions return proper error types for error handling.

mod client;
mod logger;

// Re-export public API
pub use client::{init_client, parse_base_url};
pub use logger::init_logger_with;
