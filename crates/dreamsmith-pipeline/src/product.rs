// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Product creation pipeline stage.
//!
//! Consumes [`ProductRequest`] items chained from completed generations:
//! publishes the listing, attaches it to the creator's collection, and
//! delivers the listing URL. This is the final stage, so the pending
//! registry entry is retired on every exit path.

use std::sync::Arc;

use async_trait::async_trait;
use dreamsmith_core::error::DreamsmithError;
use dreamsmith_core::traits::{DeliverySink, ProductCatalog};
use dreamsmith_core::types::OutboundReply;
use dreamsmith_queue::{PendingRegistry, WorkHandler};
use tracing::{info, warn};

use crate::delivery::deliver;
use crate::item::ProductRequest;
use crate::messages;

/// Handler for the product creation queue.
pub struct ProductCreationHandler {
    catalog: Arc<dyn ProductCatalog>,
    sink: Arc<dyn DeliverySink>,
    registry: Arc<PendingRegistry>,
}

impl ProductCreationHandler {
    pub fn new(
        catalog: Arc<dyn ProductCatalog>,
        sink: Arc<dyn DeliverySink>,
        registry: Arc<PendingRegistry>,
    ) -> Self {
        Self {
            catalog,
            sink,
            registry,
        }
    }
}

#[async_trait]
impl WorkHandler<ProductRequest> for ProductCreationHandler {
    async fn handle(&self, item: ProductRequest) -> Result<(), DreamsmithError> {
        let ProductRequest {
            request_id,
            draft,
            username,
        } = item;

        let result = self.catalog.create_product(&draft).await;
        let outcome = match result {
            Ok(product) => {
                // Collection membership is cosmetic; a failure here must not
                // cost the user their listing.
                let collection = format!("{username} Collection");
                if let Err(e) = self
                    .catalog
                    .associate_with_collection(&product.id, &collection)
                    .await
                {
                    warn!(request_id = %request_id, product_id = %product.id, error = %e,
                        "collection association failed, listing kept");
                }

                deliver(
                    &self.registry,
                    self.sink.as_ref(),
                    &request_id,
                    &OutboundReply::text(format!(
                        "Your Artist Trading Card is now available: {}",
                        product.url
                    )),
                )
                .await;
                info!(request_id = %request_id, product_id = %product.id, "product published");
                Ok(())
            }
            Err(e) => {
                deliver(
                    &self.registry,
                    self.sink.as_ref(),
                    &request_id,
                    &OutboundReply::text(messages::PRODUCT_FAILED),
                )
                .await;
                Err(e)
            }
        };

        // Final stage: the reply context is dead either way.
        self.registry.remove(&request_id).await;
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dreamsmith_core::types::{ProductDraft, ReplyTarget, RequestId, UserId};
    use dreamsmith_test_utils::{MockCatalog, MockSink};

    fn fixture() -> (
        ProductCreationHandler,
        Arc<MockCatalog>,
        Arc<MockSink>,
        Arc<PendingRegistry>,
    ) {
        let catalog = Arc::new(MockCatalog::new());
        let sink = Arc::new(MockSink::new());
        let registry = Arc::new(PendingRegistry::new());
        let handler = ProductCreationHandler::new(
            Arc::clone(&catalog) as Arc<dyn ProductCatalog>,
            Arc::clone(&sink) as Arc<dyn DeliverySink>,
            Arc::clone(&registry),
        );
        (handler, catalog, sink, registry)
    }

    async fn registered_item(registry: &PendingRegistry) -> ProductRequest {
        let request_id = RequestId::new();
        registry
            .register(request_id.clone(), ReplyTarget::direct(UserId(3)), None)
            .await;
        ProductRequest {
            request_id,
            draft: ProductDraft {
                title: "A Quiet Fox Artist Trading Card (ATC) by ada".into(),
                description: "desc".into(),
                image_url: "https://cdn.example/atc-1.jpg".into(),
                vendor: "ada".into(),
                price: "6.99".into(),
                tags: vec!["Artist-ada".into()],
            },
            username: "ada".to_string(),
        }
    }

    #[tokio::test]
    async fn publishes_associates_and_delivers_url() {
        let (handler, catalog, sink, registry) = fixture();
        let item = registered_item(&registry).await;
        let request_id = item.request_id.clone();

        handler.handle(item).await.unwrap();

        let created = catalog.created().await;
        assert_eq!(created.len(), 1);
        assert_eq!(created[0].vendor, "ada");

        let associations = catalog.associations().await;
        assert_eq!(associations.len(), 1);
        assert_eq!(associations[0].1, "ada Collection");

        let directs = sink.directs().await;
        assert_eq!(directs.len(), 1);
        assert!(
            directs[0]
                .1
                .content
                .as_deref()
                .unwrap()
                .contains("https://shop.example/products/")
        );

        assert!(registry.lookup(&request_id).await.is_none());
    }

    #[tokio::test]
    async fn association_failure_keeps_the_listing() {
        let (handler, catalog, sink, registry) = fixture();
        catalog.fail_association();
        let item = registered_item(&registry).await;

        handler.handle(item).await.unwrap();

        assert_eq!(catalog.created().await.len(), 1);
        // Listing URL still delivered despite the association failure.
        assert_eq!(sink.directs().await.len(), 1);
    }

    #[tokio::test]
    async fn creation_failure_tells_the_user_and_retires_entry() {
        let (handler, catalog, sink, registry) = fixture();
        catalog.fail_creation();
        let item = registered_item(&registry).await;
        let request_id = item.request_id.clone();

        let result = handler.handle(item).await;
        assert!(result.is_err());

        let directs = sink.directs().await;
        assert_eq!(directs.len(), 1);
        assert_eq!(directs[0].1.content.as_deref(), Some(messages::PRODUCT_FAILED));

        // Registry entry is removed even on failure.
        assert!(registry.lookup(&request_id).await.is_none());
    }
}
