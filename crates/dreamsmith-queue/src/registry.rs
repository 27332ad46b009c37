// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Pending-request registry: a time-bounded cache mapping a request id to
//! the context needed to deliver an eventual result.
//!
//! Shared between producers (writers), one consumer per pipeline stage
//! (readers/deleters), and the sweep task (deleter). Access is mutually
//! exclusive via a single registry-wide lock; granularity is coarse by
//! design, since volume is tens of in-flight requests, not thousands.
//!
//! The sweep is a memory-bound safety valve, not a correctness mechanism:
//! an unusually slow pipeline can lose its reply context before the result
//! arrives, and the delivery attempt then falls through all tiers.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use dreamsmith_core::types::{ReplyTarget, RequestId};
use tokio::sync::Mutex;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Context held for one in-flight request.
#[derive(Debug, Clone)]
pub struct PendingEntry {
    pub request_id: RequestId,
    pub reply: ReplyTarget,
    pub created_at: Instant,
    /// Snapshot of the original prompt, for result captions.
    pub prompt: Option<String>,
}

/// Lock-guarded map of in-flight request contexts.
#[derive(Default)]
pub struct PendingRegistry {
    entries: Mutex<HashMap<RequestId, PendingEntry>>,
}

impl PendingRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entry timestamped now.
    ///
    /// Overwrites silently if the id is already present; that should not
    /// happen under correct producer behavior but is not an error.
    pub async fn register(&self, request_id: RequestId, reply: ReplyTarget, prompt: Option<String>) {
        let entry = PendingEntry {
            request_id: request_id.clone(),
            reply,
            created_at: Instant::now(),
            prompt,
        };
        self.entries.lock().await.insert(request_id, entry);
    }

    pub async fn lookup(&self, request_id: &RequestId) -> Option<PendingEntry> {
        self.entries.lock().await.get(request_id).cloned()
    }

    /// Remove an entry. Idempotent.
    pub async fn remove(&self, request_id: &RequestId) {
        if self.entries.lock().await.remove(request_id).is_some() {
            debug!(request_id = %request_id, "pending entry removed");
        }
    }

    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }

    /// Remove all entries strictly older than `max_age`, returning how many
    /// were evicted — completed or not.
    pub async fn sweep(&self, max_age: Duration) -> usize {
        let now = Instant::now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, entry| now.duration_since(entry.created_at) <= max_age);
        before - entries.len()
    }
}

/// Periodic sweep task. Runs for the lifetime of the process until cancelled.
pub async fn run_sweeper(
    registry: Arc<PendingRegistry>,
    interval: Duration,
    max_age: Duration,
    cancel: CancellationToken,
) {
    info!(interval_secs = interval.as_secs(), max_age_secs = max_age.as_secs(),
        "registry sweeper started");
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            _ = tokio::time::sleep(interval) => {}
        }
        let removed = registry.sweep(max_age).await;
        if removed > 0 {
            info!(removed, "swept stale pending entries");
        }
    }
    info!("registry sweeper stopped");
}
