// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client for the hosted FLUX image generation API.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use dreamsmith_core::error::DreamsmithError;
use dreamsmith_core::traits::ImageGenerator;
use dreamsmith_core::types::{ImageReference, ImageSize};

/// One generation submission.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    prompt: &'a str,
    image_size: ImageSize,
    num_images: u32,
    output_format: &'static str,
    enable_safety_checker: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    images: Vec<GeneratedImage>,
}

#[derive(Debug, Deserialize)]
struct GeneratedImage {
    url: String,
}

/// HTTP client for the image generation API.
///
/// One submission per `generate` call; bounded retry on transient failure
/// belongs to the pipeline stage driving this client.
#[derive(Debug, Clone)]
pub struct FluxClient {
    client: reqwest::Client,
    endpoint: String,
}

impl FluxClient {
    pub fn new(api_key: &str, endpoint: String) -> Result<Self, DreamsmithError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Key {api_key}"))
            .map_err(|e| DreamsmithError::Config(format!("invalid generation API key: {e}")))?;
        headers.insert("authorization", auth);
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        // Generation routinely takes tens of seconds.
        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(120))
            .build()
            .map_err(|e| DreamsmithError::Generation {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self { client, endpoint })
    }
}

#[async_trait]
impl ImageGenerator for FluxClient {
    async fn generate(
        &self,
        prompt: &str,
        size: ImageSize,
    ) -> Result<ImageReference, DreamsmithError> {
        let request = GenerateRequest {
            prompt,
            image_size: size,
            num_images: 1,
            output_format: "jpeg",
            enable_safety_checker: true,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| DreamsmithError::Generation {
                message: format!("generation request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        debug!(status = %status, "generation response received");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DreamsmithError::Generation {
                message: format!("generation API returned {status}: {body}"),
                source: None,
            });
        }

        let parsed: GenerateResponse =
            response.json().await.map_err(|e| DreamsmithError::Generation {
                message: format!("malformed generation response: {e}"),
                source: Some(Box::new(e)),
            })?;

        let image = parsed
            .images
            .into_iter()
            .next()
            .ok_or_else(|| DreamsmithError::Generation {
                message: "no images in generation response".to_string(),
                source: None,
            })?;

        info!(url = %image.url, "image generated");
        Ok(ImageReference { url: image.url })
    }

    async fn download(&self, reference: &ImageReference) -> Result<Vec<u8>, DreamsmithError> {
        let response = self
            .client
            .get(&reference.url)
            .send()
            .await
            .map_err(|e| DreamsmithError::Generation {
                message: format!("image download failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DreamsmithError::Generation {
                message: format!("image download returned {status}"),
                source: None,
            });
        }

        let bytes = response.bytes().await.map_err(|e| DreamsmithError::Generation {
            message: format!("image download body failed: {e}"),
            source: Some(Box::new(e)),
        })?;
        Ok(bytes.to_vec())
    }
}
