// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Bounded in-process FIFO queue with explicit full/empty signaling.
//!
//! No operation blocks waiting for space or items; callers poll and handle
//! [`QueueError::Full`] / [`QueueError::Empty`] explicitly. This keeps the
//! consumer loop free to interleave sleep-and-retry with cancellation
//! checks. All mutation is serialized by one mutex scoped to the queue
//! instance, held only across the in-memory update — never across a
//! network call.

use std::collections::VecDeque;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::debug;

/// Routine queue conditions signaled to callers. Not failures of the system.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueueError {
    /// The queue is at capacity or closed. Producers must reject the
    /// triggering request rather than buffer further.
    #[error("queue is full")]
    Full,

    /// No items are buffered.
    #[error("queue is empty")]
    Empty,
}

/// Read-only observability snapshot of one queue.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueStats {
    pub name: String,
    pub current_size: usize,
    pub max_size: usize,
    pub total_enqueued: u64,
    pub total_dequeued: u64,
    pub is_full: bool,
    pub is_empty: bool,
    pub is_closed: bool,
}

struct Inner<T> {
    items: VecDeque<T>,
    closed: bool,
    total_enqueued: u64,
    total_dequeued: u64,
}

/// A bounded FIFO work queue.
///
/// Owns the items it buffers exclusively; external code never reaches into
/// the internal sequence. Two independent queues never contend with each
/// other.
pub struct BoundedQueue<T> {
    name: String,
    max_size: usize,
    inner: Mutex<Inner<T>>,
}

impl<T> BoundedQueue<T> {
    /// Create a queue holding at most `max_size` items.
    pub fn new(name: impl Into<String>, max_size: usize) -> Self {
        Self {
            name: name.into(),
            max_size,
            inner: Mutex::new(Inner {
                items: VecDeque::with_capacity(max_size),
                closed: false,
                total_enqueued: 0,
                total_dequeued: 0,
            }),
        }
    }

    /// Name of the queue, used in log fields.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fixed capacity of the queue.
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Append an item, failing with [`QueueError::Full`] at capacity or
    /// after [`close`](Self::close).
    pub async fn enqueue(&self, item: T) -> Result<(), QueueError> {
        let mut inner = self.inner.lock().await;
        if inner.closed || inner.items.len() >= self.max_size {
            return Err(QueueError::Full);
        }
        inner.items.push_back(item);
        inner.total_enqueued += 1;
        debug!(queue = %self.name, size = inner.items.len(), "item enqueued");
        Ok(())
    }

    /// Remove and return the head item, failing with [`QueueError::Empty`]
    /// when nothing is buffered (closed or not).
    pub async fn dequeue(&self) -> Result<T, QueueError> {
        let mut inner = self.inner.lock().await;
        let item = inner.items.pop_front().ok_or(QueueError::Empty)?;
        inner.total_dequeued += 1;
        debug!(queue = %self.name, size = inner.items.len(), "item dequeued");
        Ok(item)
    }

    /// Non-destructive read of the head item.
    pub async fn peek(&self) -> Option<T>
    where
        T: Clone,
    {
        let inner = self.inner.lock().await;
        inner.items.front().cloned()
    }

    /// Current number of buffered items.
    pub async fn len(&self) -> usize {
        self.inner.lock().await.items.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.inner.lock().await.items.is_empty()
    }

    pub async fn is_full(&self) -> bool {
        self.inner.lock().await.items.len() >= self.max_size
    }

    pub async fn is_closed(&self) -> bool {
        self.inner.lock().await.closed
    }

    /// Drop all buffered items.
    pub async fn clear(&self) {
        let mut inner = self.inner.lock().await;
        inner.items.clear();
        debug!(queue = %self.name, "queue cleared");
    }

    /// Mark the queue closed. Subsequent enqueues fail; dequeue continues
    /// to drain what is already buffered.
    pub async fn close(&self) {
        let mut inner = self.inner.lock().await;
        inner.closed = true;
        debug!(queue = %self.name, remaining = inner.items.len(), "queue closed");
    }

    /// Read-only statistics snapshot.
    pub async fn statistics(&self) -> QueueStats {
        let inner = self.inner.lock().await;
        QueueStats {
            name: self.name.clone(),
            current_size: inner.items.len(),
            max_size: self.max_size,
            total_enqueued: inner.total_enqueued,
            total_dequeued: inner.total_dequeued,
            is_full: inner.items.len() >= self.max_size,
            is_empty: inner.items.is_empty(),
            is_closed: inner.closed,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[tokio::test]
    async fn enqueue_past_capacity_signals_full() {
        let queue = BoundedQueue::new("test", 3);
        for i in 0..3 {
            queue.enqueue(i).await.unwrap();
        }
        assert_eq!(queue.enqueue(99).await, Err(QueueError::Full));
        assert!(queue.is_full().await);
    }

    #[tokio::test]
    async fn drain_then_empty() {
        let queue = BoundedQueue::new("test", 3);
        for i in 0..3 {
            queue.enqueue(i).await.unwrap();
        }
        for i in 0..3 {
            assert_eq!(queue.dequeue().await.unwrap(), i);
        }
        assert_eq!(queue.dequeue().await, Err(QueueError::Empty));
    }

    #[tokio::test]
    async fn fifo_order_preserved() {
        let queue = BoundedQueue::new("test", 10);
        for i in 0..5 {
            queue.enqueue(i).await.unwrap();
        }
        queue.dequeue().await.unwrap();
        queue.enqueue(5).await.unwrap();

        let mut out = Vec::new();
        while let Ok(item) = queue.dequeue().await {
            out.push(item);
        }
        assert_eq!(out, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn peek_is_non_destructive() {
        let queue = BoundedQueue::new("test", 3);
        assert_eq!(queue.peek().await, None);
        queue.enqueue("a").await.unwrap();
        assert_eq!(queue.peek().await, Some("a"));
        assert_eq!(queue.len().await, 1);
    }

    #[tokio::test]
    async fn close_rejects_enqueue_but_drains() {
        let queue = BoundedQueue::new("test", 3);
        queue.enqueue(1).await.unwrap();
        queue.enqueue(2).await.unwrap();
        queue.close().await;

        assert_eq!(queue.enqueue(3).await, Err(QueueError::Full));
        assert_eq!(queue.dequeue().await.unwrap(), 1);
        assert_eq!(queue.dequeue().await.unwrap(), 2);
        assert_eq!(queue.dequeue().await, Err(QueueError::Empty));
    }

    #[tokio::test]
    async fn statistics_snapshot() {
        let queue = BoundedQueue::new("stats", 2);
        queue.enqueue(1).await.unwrap();
        queue.enqueue(2).await.unwrap();
        queue.dequeue().await.unwrap();

        let stats = queue.statistics().await;
        assert_eq!(stats.name, "stats");
        assert_eq!(stats.current_size, 1);
        assert_eq!(stats.max_size, 2);
        assert_eq!(stats.total_enqueued, 2);
        assert_eq!(stats.total_dequeued, 1);
        assert!(!stats.is_full);
        assert!(!stats.is_empty);
        assert!(!stats.is_closed);
    }

    #[tokio::test]
    async fn clear_empties_the_queue() {
        let queue = BoundedQueue::new("test", 3);
        queue.enqueue(1).await.unwrap();
        queue.clear().await;
        assert!(queue.is_empty().await);
        // Counters are cumulative, not reset by clear.
        assert_eq!(queue.statistics().await.total_enqueued, 1);
    }

    proptest! {
        #[test]
        fn dequeue_order_matches_enqueue_order(items in prop::collection::vec(any::<u32>(), 0..64)) {
            let rt = tokio::runtime::Builder::new_current_thread()
                .build()
                .unwrap();
            rt.block_on(async {
                let queue = BoundedQueue::new("prop", items.len().max(1));
                for item in &items {
                    queue.enqueue(*item).await.unwrap();
                }
                let mut out = Vec::new();
                while let Ok(item) = queue.dequeue().await {
                    out.push(item);
                }
                prop_assert_eq!(out, items);
                Ok(())
            })?;
        }
    }
}
