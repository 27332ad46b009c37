// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! In-process work buffering for Dreamsmith: a bounded FIFO queue with
//! explicit full/empty signaling, a cancellable polling consumer loop, and
//! the pending-request registry that bridges producers and consumers.
//!
//! None of this persists across process restarts, fans out to multiple
//! consumers, or orders beyond FIFO. Producers treat [`QueueError::Full`]
//! as backpressure and reject the triggering user request.

pub mod consumer;
pub mod queue;
pub mod registry;

pub use consumer::{ConsumerLoop, ConsumerOptions, WorkHandler};
pub use queue::{BoundedQueue, QueueError, QueueStats};
pub use registry::{PendingEntry, PendingRegistry, run_sweeper};
