// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP clients for the external services behind the pipeline traits:
//! the image generation API, the object storage API, and the shop
//! catalog API.
//!
//! Each client owns a pooled [`reqwest::Client`] with auth headers baked
//! in at construction, and maps HTTP failures into the corresponding
//! [`dreamsmith_core::error::DreamsmithError`] variant.

pub mod catalog;
pub mod generation;
pub mod storage;

pub use catalog::ShopCatalogClient;
pub use generation::FluxClient;
pub use storage::StorageApiClient;

/// Whether an HTTP status warrants one retry before giving up.
pub(crate) fn is_transient(status: reqwest::StatusCode) -> bool {
    matches!(status.as_u16(), 429 | 500 | 503)
}
