//! Main application entry point (CLI binary).
//!
//! This is a thin wrapper around the `seo_report_client` library that handles:
//! - Command-line argument parsing
//! - Environment variable loading (.env file)
//! - Logger initialization
//! - Exit codes
//!
//! All core functionality is implemented in the library crate.

use anyhow::{Context, Result};
use clap::Parser;
use std::process;

use seo_report_client::config::Opt;
use seo_report_client::initialization::init_logger_with;
use seo_report_client::run_command;

#[tokio::main]
async fn main() -> Result<()> {
    // SEO_API_URL / SEO_API_VERSION may live in a .env file; a missing file is fine
    if dotenvy::dotenv().is_err() {
        if let Ok(exe_path) = std::env::current_exe() {
            if let Some(exe_dir) = exe_path.parent() {
                let env_path = exe_dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                }
            }
        }
    }

    let opt = Opt::parse();

    init_logger_with(opt.log_level.clone().into(), opt.log_format.clone())
        .context("Failed to initialize logger")?;

    let config = opt.client_config();
    if let Err(e) = run_command(config, opt.command).await {
        eprintln!("seo_report_client error: {:#}", e);
        process::exit(1);
    }
    Ok(())
}
