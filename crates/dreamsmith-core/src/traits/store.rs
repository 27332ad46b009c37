// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Object storage client trait.

use async_trait::async_trait;

use crate::error::DreamsmithError;

/// Client for uploading image bytes to public object storage.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Upload `bytes` under `name` and return the public URL.
    async fn upload(&self, name: &str, bytes: Vec<u8>) -> Result<String, DreamsmithError>;
}
