// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Cancellable polling consumer loop that drains one queue.
//!
//! Each cycle attempts one dequeue. Handler errors are caught, logged, and
//! the item is dropped — processing is at-most-once, never auto-requeued.
//! Crediting back or other compensation is the handler's own business.
//! On an empty queue the loop sleeps briefly; after a failed handler it
//! backs off longer to avoid tight error loops against a misbehaving
//! dependency. Both sleeps are interruptible by cancellation.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dreamsmith_core::error::DreamsmithError;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use crate::queue::{BoundedQueue, QueueError};

/// Per-item processing logic invoked by a [`ConsumerLoop`].
#[async_trait]
pub trait WorkHandler<T>: Send + Sync {
    async fn handle(&self, item: T) -> Result<(), DreamsmithError>;
}

/// Cadence and timeout knobs for a consumer loop.
#[derive(Debug, Clone)]
pub struct ConsumerOptions {
    /// Sleep between cycles when the queue is empty.
    pub idle_delay: Duration,
    /// Backoff after a failed handler invocation.
    pub error_delay: Duration,
    /// Optional bound on a single handler invocation. Elapse is treated as
    /// a handler failure and the item is dropped. `None` leaves handler
    /// execution unbounded: a hung external call stalls this loop until it
    /// resolves, which is a known limitation of the unbounded mode.
    pub handler_timeout: Option<Duration>,
}

impl Default for ConsumerOptions {
    fn default() -> Self {
        Self {
            idle_delay: Duration::from_millis(100),
            error_delay: Duration::from_secs(1),
            handler_timeout: None,
        }
    }
}

/// Drains one [`BoundedQueue`] through a handler until cancelled.
pub struct ConsumerLoop<T> {
    queue: Arc<BoundedQueue<T>>,
    options: ConsumerOptions,
}

impl<T: Send + 'static> ConsumerLoop<T> {
    pub fn new(queue: Arc<BoundedQueue<T>>, options: ConsumerOptions) -> Self {
        Self { queue, options }
    }

    /// Run until `cancel` fires.
    ///
    /// Cancellation is observed at the top of each cycle and during sleeps,
    /// never between a successful dequeue and the handler invocation — an
    /// already-dequeued item always reaches its handler.
    pub async fn run(&self, handler: Arc<dyn WorkHandler<T>>, cancel: CancellationToken) {
        let queue_name = self.queue.name().to_string();
        info!(queue = %queue_name, "consumer loop started");

        loop {
            if cancel.is_cancelled() {
                break;
            }

            match self.queue.dequeue().await {
                Ok(item) => {
                    let result = match self.options.handler_timeout {
                        Some(limit) => {
                            match tokio::time::timeout(limit, handler.handle(item)).await {
                                Ok(result) => result,
                                Err(_) => Err(DreamsmithError::Timeout { duration: limit }),
                            }
                        }
                        None => handler.handle(item).await,
                    };

                    if let Err(e) = result {
                        error!(queue = %queue_name, error = %e,
                            "work item handler failed, item dropped");
                        tokio::select! {
                            _ = cancel.cancelled() => break,
                            _ = tokio::time::sleep(self.options.error_delay) => {}
                        }
                    }
                }
                Err(QueueError::Empty) => {
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.options.idle_delay) => {}
                    }
                }
                // Dequeue only reports Empty today; this arm keeps the
                // error backoff in place if QueueError grows a variant.
                Err(e) => {
                    warn!(queue = %queue_name, error = %e, "unexpected dequeue error");
                    tokio::select! {
                        _ = cancel.cancelled() => break,
                        _ = tokio::time::sleep(self.options.error_delay) => {}
                    }
                }
            }
        }

        info!(queue = %queue_name, "consumer loop stopped");
    }
}
