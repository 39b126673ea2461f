//! CLI application layer.
//!
//! Command handlers, terminal rendering, and Ctrl-C handling used by the
//! binary. Everything here is presentation over the library modules.

mod commands;
mod render;
mod shutdown;

// Re-export public API
pub use commands::run_command;
pub use render::{format_load_time, render_report, score_label};
