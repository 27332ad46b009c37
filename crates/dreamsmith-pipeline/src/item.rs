// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Work item types buffered by the two pipeline queues.
//!
//! Each item carries the request id tying it back to its pending-request
//! registry entry. Items are delivered to exactly one consumer invocation
//! and never re-enqueued automatically.

use dreamsmith_core::types::{ProductDraft, RequestId};

/// One queued image generation request.
#[derive(Debug, Clone)]
pub struct GenerationRequest {
    pub request_id: RequestId,
    pub prompt: String,
    /// Display name of the requesting user; becomes the product vendor.
    pub username: String,
}

/// One queued product creation request, chained from a completed generation.
#[derive(Debug, Clone)]
pub struct ProductRequest {
    pub request_id: RequestId,
    pub draft: ProductDraft,
    pub username: String,
}
