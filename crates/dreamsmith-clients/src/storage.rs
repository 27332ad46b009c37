// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client for the S3-compatible object storage API.
//!
//! Objects are uploaded with a public-read ACL; the returned URL is served
//! straight from the bucket and is what ends up in chat messages and
//! product listings.

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use reqwest::header::{HeaderMap, HeaderValue};
use tracing::{info, warn};

use dreamsmith_core::error::DreamsmithError;
use dreamsmith_core::traits::ObjectStore;

use crate::is_transient;

/// HTTP client for bucket uploads.
#[derive(Debug, Clone)]
pub struct StorageApiClient {
    client: reqwest::Client,
    endpoint: String,
    bucket: String,
}

impl StorageApiClient {
    /// `api_key` is the `key_id:application_key` pair for basic auth.
    pub fn new(
        api_key: &str,
        endpoint: String,
        bucket: String,
    ) -> Result<Self, DreamsmithError> {
        let encoded = BASE64.encode(api_key.as_bytes());
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(&format!("Basic {encoded}"))
            .map_err(|e| DreamsmithError::Config(format!("invalid storage API key: {e}")))?;
        headers.insert("authorization", auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(60))
            .build()
            .map_err(|e| DreamsmithError::ObjectStorage {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            endpoint,
            bucket,
        })
    }

    fn object_url(&self, name: &str) -> String {
        format!("{}/{}/{}", self.endpoint, self.bucket, name)
    }
}

#[async_trait]
impl ObjectStore for StorageApiClient {
    async fn upload(&self, name: &str, bytes: Vec<u8>) -> Result<String, DreamsmithError> {
        let url = self.object_url(name);
        let size = bytes.len();

        // One retry on transient status, matching the other API clients.
        for attempt in 0..=1u32 {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .put(&url)
                .header("content-type", "image/jpeg")
                .header("x-amz-acl", "public-read")
                .body(bytes.clone())
                .send()
                .await
                .map_err(|e| DreamsmithError::ObjectStorage {
                    message: format!("upload request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            if status.is_success() {
                info!(object = %name, size, "object uploaded");
                return Ok(url);
            }
            if is_transient(status) && attempt == 0 {
                warn!(object = %name, status = %status, "transient upload failure, retrying");
                continue;
            }

            let body = response.text().await.unwrap_or_default();
            return Err(DreamsmithError::ObjectStorage {
                message: format!("storage API returned {status}: {body}"),
                source: None,
            });
        }
        unreachable!("upload retry loop always returns")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn upload_puts_the_object_and_returns_its_url() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/atc/atc-1.jpg"))
            .and(header("content-type", "image/jpeg"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client =
            StorageApiClient::new("key:secret", server.uri(), "atc".to_string()).unwrap();
        let url = client.upload("atc-1.jpg", b"jpeg".to_vec()).await.unwrap();
        assert_eq!(url, format!("{}/atc/atc-1.jpg", server.uri()));
    }

    #[tokio::test]
    async fn transient_failure_is_retried_once() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(503))
            .up_to_n_times(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let client =
            StorageApiClient::new("key:secret", server.uri(), "atc".to_string()).unwrap();
        client.upload("atc-2.jpg", b"jpeg".to_vec()).await.unwrap();
    }

    #[tokio::test]
    async fn denied_upload_is_an_error() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(403).set_body_string("forbidden"))
            .mount(&server)
            .await;

        let client =
            StorageApiClient::new("key:secret", server.uri(), "atc".to_string()).unwrap();
        let err = client.upload("atc-3.jpg", b"jpeg".to_vec()).await.unwrap_err();
        assert!(err.to_string().contains("403"));
    }
}
