//! Ctrl-C handling.

use log::warn;

/// Completes when the user interrupts the process.
///
/// If the signal handler cannot be installed this never completes, so the
/// command keeps running until it finishes on its own.
pub async fn interrupted() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for Ctrl-C: {}", e);
        std::future::pending::<()>().await;
    }
}
