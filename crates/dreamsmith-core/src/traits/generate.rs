// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Image generation client trait.

use async_trait::async_trait;

use crate::error::DreamsmithError;
use crate::types::{ImageReference, ImageSize};

/// Client for a hosted image generation API.
///
/// Generation may take tens of seconds. Callers are responsible for bounded
/// retries with backoff on transient failure.
#[async_trait]
pub trait ImageGenerator: Send + Sync {
    /// Generate an image for the prompt, returning a reference resolvable
    /// to downloadable bytes.
    async fn generate(
        &self,
        prompt: &str,
        size: ImageSize,
    ) -> Result<ImageReference, DreamsmithError>;

    /// Download the bytes behind a generated image reference.
    async fn download(&self, reference: &ImageReference) -> Result<Vec<u8>, DreamsmithError>;
}
