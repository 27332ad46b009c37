// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Signal-driven shutdown for the serve loop.
//!
//! One [`CancellationToken`] fans out to both consumer loops and the
//! registry sweeper; cancelling it lets each loop finish its current item
//! and exit. Work still sitting in the in-memory queues is discarded, so
//! the only cost of a shutdown is the queued-but-unstarted requests.

use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

/// Spawns the signal watcher and returns the token it will cancel.
///
/// SIGINT (Ctrl+C) and, on unix, SIGTERM both trigger cancellation.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    tokio::spawn(cancel_on_signal(token.clone()));
    token
}

async fn cancel_on_signal(token: CancellationToken) {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{SignalKind, signal};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {
                        info!("SIGINT received, shutting down");
                    }
                    _ = sigterm.recv() => {
                        info!("SIGTERM received, shutting down");
                    }
                }
            }
            Err(error) => {
                warn!(%error, "SIGTERM handler unavailable, watching SIGINT only");
                let _ = tokio::signal::ctrl_c().await;
                info!("SIGINT received, shutting down");
            }
        }
    }

    #[cfg(not(unix))]
    {
        let _ = tokio::signal::ctrl_c().await;
        info!("Ctrl+C received, shutting down");
    }

    token.cancel();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn token_starts_uncancelled() {
        let token = install_signal_handler();
        assert!(!token.is_cancelled());
        token.cancel();
    }

    #[tokio::test]
    async fn clones_observe_cancellation() {
        // Each consumer loop and the sweeper hold a clone of the root
        // token; cancelling the root must reach all of them.
        let root = install_signal_handler();
        let generation = root.clone();
        let product = root.clone();

        root.cancel();

        generation.cancelled().await;
        product.cancelled().await;
    }
}
