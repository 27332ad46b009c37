// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Client for the shop admin (catalog) API.
//!
//! Products are created under the admin API root, e.g.
//! `https://example.myshopify.com/admin/api/2024-07`; the public listing
//! URL is derived from the shop host and the product handle.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info, warn};

use dreamsmith_core::error::DreamsmithError;
use dreamsmith_core::traits::ProductCatalog;
use dreamsmith_core::types::{CreatedProduct, ProductDraft};

use crate::is_transient;

const PRODUCT_TYPE: &str = "Artist Trading Card";
const INVENTORY_QUANTITY: u32 = 100;

#[derive(Debug, Serialize)]
struct CreateProductRequest<'a> {
    product: ProductPayload<'a>,
}

#[derive(Debug, Serialize)]
struct ProductPayload<'a> {
    title: &'a str,
    body_html: &'a str,
    vendor: &'a str,
    product_type: &'static str,
    tags: String,
    images: Vec<ImagePayload<'a>>,
    variants: Vec<VariantPayload<'a>>,
}

#[derive(Debug, Serialize)]
struct ImagePayload<'a> {
    src: &'a str,
}

#[derive(Debug, Serialize)]
struct VariantPayload<'a> {
    price: &'a str,
    inventory_management: &'static str,
    inventory_quantity: u32,
}

#[derive(Debug, Deserialize)]
struct CreateProductResponse {
    product: ProductBody,
}

#[derive(Debug, Deserialize)]
struct ProductBody {
    id: i64,
    handle: String,
}

#[derive(Debug, Deserialize)]
struct CollectionListResponse {
    #[serde(default)]
    custom_collections: Vec<CollectionBody>,
}

#[derive(Debug, Deserialize)]
struct CollectionBody {
    id: i64,
}

#[derive(Debug, Deserialize)]
struct CreateCollectionResponse {
    custom_collection: CollectionBody,
}

/// HTTP client for the catalog admin API.
#[derive(Debug, Clone)]
pub struct ShopCatalogClient {
    client: reqwest::Client,
    endpoint: String,
    storefront_base: String,
}

impl ShopCatalogClient {
    pub fn new(token: &str, endpoint: String) -> Result<Self, DreamsmithError> {
        let mut headers = HeaderMap::new();
        let auth = HeaderValue::from_str(token)
            .map_err(|e| DreamsmithError::Config(format!("invalid catalog token: {e}")))?;
        headers.insert("x-shopify-access-token", auth);
        headers.insert("content-type", HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| DreamsmithError::Catalog {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        // Public listings live at the shop host, not under /admin.
        let storefront_base = endpoint
            .split("/admin")
            .next()
            .unwrap_or(endpoint.as_str())
            .to_string();

        Ok(Self {
            client,
            endpoint,
            storefront_base,
        })
    }

    /// POST `body` to `{endpoint}/{path}`, with one retry on transient status.
    async fn post_json(&self, path: &str, body: &Value) -> Result<Value, DreamsmithError> {
        for attempt in 0..=1u32 {
            if attempt > 0 {
                tokio::time::sleep(Duration::from_secs(1)).await;
            }

            let response = self
                .client
                .post(format!("{}/{path}", self.endpoint))
                .json(body)
                .send()
                .await
                .map_err(|e| DreamsmithError::Catalog {
                    message: format!("catalog request failed: {e}"),
                    source: Some(Box::new(e)),
                })?;

            let status = response.status();
            debug!(path, status = %status, attempt, "catalog response received");
            if status.is_success() {
                return response.json().await.map_err(|e| DreamsmithError::Catalog {
                    message: format!("malformed catalog response: {e}"),
                    source: Some(Box::new(e)),
                });
            }
            if is_transient(status) && attempt == 0 {
                warn!(path, status = %status, "transient catalog failure, retrying");
                continue;
            }

            let text = response.text().await.unwrap_or_default();
            return Err(DreamsmithError::Catalog {
                message: format!("catalog API returned {status}: {text}"),
                source: None,
            });
        }
        unreachable!("catalog retry loop always returns")
    }

    /// Find the collection by title, creating it if absent.
    async fn ensure_collection(&self, title: &str) -> Result<i64, DreamsmithError> {
        let response = self
            .client
            .get(format!("{}/custom_collections.json", self.endpoint))
            .query(&[("title", title)])
            .send()
            .await
            .map_err(|e| DreamsmithError::Catalog {
                message: format!("collection lookup failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(DreamsmithError::Catalog {
                message: format!("collection lookup returned {status}"),
                source: None,
            });
        }

        let listed: CollectionListResponse =
            response.json().await.map_err(|e| DreamsmithError::Catalog {
                message: format!("malformed collection list: {e}"),
                source: Some(Box::new(e)),
            })?;
        if let Some(existing) = listed.custom_collections.first() {
            return Ok(existing.id);
        }

        let created = self
            .post_json(
                "custom_collections.json",
                &serde_json::json!({ "custom_collection": { "title": title } }),
            )
            .await?;
        let created: CreateCollectionResponse =
            serde_json::from_value(created).map_err(|e| DreamsmithError::Catalog {
                message: format!("malformed collection response: {e}"),
                source: Some(Box::new(e)),
            })?;
        info!(collection = %title, id = created.custom_collection.id, "collection created");
        Ok(created.custom_collection.id)
    }
}

#[async_trait]
impl ProductCatalog for ShopCatalogClient {
    async fn create_product(
        &self,
        draft: &ProductDraft,
    ) -> Result<CreatedProduct, DreamsmithError> {
        let request = CreateProductRequest {
            product: ProductPayload {
                title: &draft.title,
                body_html: &draft.description,
                vendor: &draft.vendor,
                product_type: PRODUCT_TYPE,
                tags: draft.tags.join(","),
                images: vec![ImagePayload {
                    src: &draft.image_url,
                }],
                variants: vec![VariantPayload {
                    price: &draft.price,
                    inventory_management: "shopify",
                    inventory_quantity: INVENTORY_QUANTITY,
                }],
            },
        };
        let body = serde_json::to_value(&request).map_err(|e| DreamsmithError::Catalog {
            message: format!("failed to encode product: {e}"),
            source: Some(Box::new(e)),
        })?;

        let response = self.post_json("products.json", &body).await?;
        let created: CreateProductResponse =
            serde_json::from_value(response).map_err(|e| DreamsmithError::Catalog {
                message: format!("malformed product response: {e}"),
                source: Some(Box::new(e)),
            })?;

        let url = format!(
            "{}/products/{}",
            self.storefront_base, created.product.handle
        );
        info!(product_id = created.product.id, url = %url, "product created");
        Ok(CreatedProduct {
            id: created.product.id.to_string(),
            url,
        })
    }

    async fn associate_with_collection(
        &self,
        product_id: &str,
        collection: &str,
    ) -> Result<(), DreamsmithError> {
        let numeric_id: i64 = product_id.parse().map_err(|_| DreamsmithError::Catalog {
            message: format!("non-numeric product id: {product_id}"),
            source: None,
        })?;

        let collection_id = self.ensure_collection(collection).await?;
        self.post_json(
            "collects.json",
            &serde_json::json!({
                "collect": { "product_id": numeric_id, "collection_id": collection_id }
            }),
        )
        .await?;
        info!(product_id = numeric_id, collection_id, "product added to collection");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn draft() -> ProductDraft {
        ProductDraft {
            title: "A Quiet Fox Artist Trading Card (ATC) by ada".into(),
            description: "desc".into(),
            image_url: "https://cdn.example/atc-1.jpg".into(),
            vendor: "ada".into(),
            price: "6.99".into(),
            tags: vec!["Artist-ada".into()],
        }
    }

    async fn client(server: &MockServer) -> ShopCatalogClient {
        ShopCatalogClient::new("token", format!("{}/admin/api/2024-07", server.uri())).unwrap()
    }

    #[tokio::test]
    async fn create_product_posts_the_draft_and_builds_the_listing_url() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/admin/api/2024-07/products.json"))
            .and(body_partial_json(serde_json::json!({
                "product": {
                    "title": "A Quiet Fox Artist Trading Card (ATC) by ada",
                    "vendor": "ada",
                    "tags": "Artist-ada",
                    "variants": [{ "price": "6.99" }]
                }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "product": { "id": 42, "handle": "a-quiet-fox-atc" }
            })))
            .mount(&server)
            .await;

        let created = client(&server).await.create_product(&draft()).await.unwrap();
        assert_eq!(created.id, "42");
        assert_eq!(
            created.url,
            format!("{}/products/a-quiet-fox-atc", server.uri())
        );
    }

    #[tokio::test]
    async fn association_reuses_an_existing_collection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/api/2024-07/custom_collections.json"))
            .and(query_param("title", "ada Collection"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "custom_collections": [{ "id": 9 }]
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/admin/api/2024-07/collects.json"))
            .and(body_partial_json(serde_json::json!({
                "collect": { "product_id": 42, "collection_id": 9 }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "collect": { "id": 1 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .await
            .associate_with_collection("42", "ada Collection")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn association_creates_a_missing_collection() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/admin/api/2024-07/custom_collections.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "custom_collections": []
            })))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/admin/api/2024-07/custom_collections.json"))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "custom_collection": { "id": 11 }
            })))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/admin/api/2024-07/collects.json"))
            .and(body_partial_json(serde_json::json!({
                "collect": { "collection_id": 11 }
            })))
            .respond_with(ResponseTemplate::new(201).set_body_json(serde_json::json!({
                "collect": { "id": 2 }
            })))
            .expect(1)
            .mount(&server)
            .await;

        client(&server)
            .await
            .associate_with_collection("42", "ada Collection")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn api_rejection_is_surfaced() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(422).set_body_string("invalid"))
            .mount(&server)
            .await;

        let err = client(&server).await.create_product(&draft()).await.unwrap_err();
        assert!(err.to_string().contains("422"));
    }
}
