// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Image generation pipeline stage.
//!
//! Consumes [`GenerationRequest`] items: generates the image (bounded
//! retries with backoff), downloads and re-uploads it to public object
//! storage, delivers it to the user, then chains a [`ProductRequest`] onto
//! the product creation queue. A failed item is dropped after the user is
//! told; the already-spent credit is not refunded.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use dreamsmith_core::error::DreamsmithError;
use dreamsmith_core::traits::{DeliverySink, ImageGenerator, ObjectStore};
use dreamsmith_core::types::{ImageReference, ImageSize, OutboundReply, ProductDraft};
use dreamsmith_queue::{BoundedQueue, PendingRegistry, WorkHandler};
use tracing::{info, warn};

use crate::delivery::deliver;
use crate::item::{GenerationRequest, ProductRequest};
use crate::messages;

/// Base delay for the generation retry backoff.
const RETRY_BASE: Duration = Duration::from_millis(500);

const PORTRAIT_KEYWORDS: &[&str] = &[
    "portrait", "person", "people", "face", "vertical", "standing", "tall", "headshot",
    "individual", "solo", "figure", "upright", "profile", "selfie", "emotional", "expressive",
    "bust",
];

const LANDSCAPE_KEYWORDS: &[&str] = &[
    "landscape", "scenery", "horizon", "wide", "horizontal", "panorama", "nature", "vista",
    "view", "outdoor", "expansive", "broad", "spacious", "background", "skyline", "mountains",
    "forest", "seascape", "sunset", "sunrise", "cityscape", "architecture", "aerial", "vast",
    "countryside", "river", "beach", "desert", "meadow", "garden", "valley", "waterfall",
    "hill", "lake", "field", "sea", "ocean", "wilderness", "plain", "plateau", "canyon",
    "cliff",
];

/// Choose an aspect preset from keywords in the prompt.
///
/// Scores portrait versus landscape keyword hits; ties (including no hits)
/// default to landscape.
pub fn infer_image_size(prompt: &str) -> ImageSize {
    let words: Vec<String> = prompt
        .to_lowercase()
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect();

    let portrait_score = words
        .iter()
        .filter(|w| PORTRAIT_KEYWORDS.contains(&w.as_str()))
        .count();
    let landscape_score = words
        .iter()
        .filter(|w| LANDSCAPE_KEYWORDS.contains(&w.as_str()))
        .count();

    if portrait_score > landscape_score {
        ImageSize::Portrait169
    } else {
        ImageSize::Landscape169
    }
}

/// Build a human-readable product title from the prompt and creator name.
///
/// Uses the first eight prompt words, title-cased.
pub fn product_title(prompt: &str, username: &str) -> String {
    let words: Vec<&str> = prompt.split_whitespace().take(8).collect();
    let lead: Vec<String> = words
        .iter()
        .map(|w| {
            let mut chars = w.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => String::new(),
            }
        })
        .collect();
    format!("{} Artist Trading Card (ATC) by {username}", lead.join(" "))
}

/// Stock listing description for Artist Trading Cards.
pub fn product_description() -> String {
    "Artist Trading Card (ATC) - 2.5 x 3.5 inches\n\n\
     Discover the charm and creativity of artist trading cards, each meticulously \
     crafted to a precise 2.5 x 3.5 inches. Perfect for art enthusiasts, collectors, \
     and creators alike, these miniature canvases offer endless possibilities for \
     artistic expression.\n\n\
     Celebrate the art of small-scale creativity with these artist trading cards, where \
     every inch is an opportunity for a masterpiece."
        .to_string()
}

/// Handler for the image generation queue.
pub struct GenerationHandler {
    generator: Arc<dyn ImageGenerator>,
    store: Arc<dyn ObjectStore>,
    sink: Arc<dyn DeliverySink>,
    registry: Arc<PendingRegistry>,
    product_queue: Arc<BoundedQueue<ProductRequest>>,
    price: String,
    max_retries: u32,
}

impl GenerationHandler {
    pub fn new(
        generator: Arc<dyn ImageGenerator>,
        store: Arc<dyn ObjectStore>,
        sink: Arc<dyn DeliverySink>,
        registry: Arc<PendingRegistry>,
        product_queue: Arc<BoundedQueue<ProductRequest>>,
        price: String,
        max_retries: u32,
    ) -> Self {
        Self {
            generator,
            store,
            sink,
            registry,
            product_queue,
            price,
            max_retries,
        }
    }

    /// Generate with bounded retries and exponential backoff on transient
    /// failure.
    async fn generate_with_retry(
        &self,
        prompt: &str,
        size: ImageSize,
    ) -> Result<ImageReference, DreamsmithError> {
        let mut attempt = 0;
        loop {
            match self.generator.generate(prompt, size).await {
                Ok(reference) => return Ok(reference),
                Err(e) => {
                    if attempt >= self.max_retries {
                        return Err(e);
                    }
                    let delay = RETRY_BASE * 2u32.pow(attempt);
                    warn!(error = %e, attempt, delay_ms = delay.as_millis() as u64,
                        "generation attempt failed, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Generate, download, and re-upload one image, returning its public URL.
    async fn generate_and_upload(&self, prompt: &str) -> Result<String, DreamsmithError> {
        let size = infer_image_size(prompt);
        let reference = self.generate_with_retry(prompt, size).await?;
        let bytes = self.generator.download(&reference).await?;
        let name = format!("atc-{}.jpg", uuid::Uuid::new_v4());
        let url = self.store.upload(&name, bytes).await?;
        info!(object = %name, url = %url, "image uploaded");
        Ok(url)
    }
}

#[async_trait]
impl WorkHandler<GenerationRequest> for GenerationHandler {
    async fn handle(&self, item: GenerationRequest) -> Result<(), DreamsmithError> {
        let GenerationRequest {
            request_id,
            prompt,
            username,
        } = item;

        let image_url = match self.generate_and_upload(&prompt).await {
            Ok(url) => url,
            Err(e) => {
                deliver(
                    &self.registry,
                    self.sink.as_ref(),
                    &request_id,
                    &OutboundReply::text(messages::GENERATION_FAILED),
                )
                .await;
                return Err(e);
            }
        };

        // Show the user their image before the product exists.
        deliver(
            &self.registry,
            self.sink.as_ref(),
            &request_id,
            &OutboundReply::image(&image_url, format!("\u{201c}{prompt}\u{201d}")),
        )
        .await;

        let draft = ProductDraft {
            title: product_title(&prompt, &username),
            description: product_description(),
            image_url,
            vendor: username.clone(),
            price: self.price.clone(),
            tags: vec![format!("Artist-{username}")],
        };

        let chained = ProductRequest {
            request_id: request_id.clone(),
            draft,
            username,
        };
        if self.product_queue.enqueue(chained).await.is_err() {
            deliver(
                &self.registry,
                self.sink.as_ref(),
                &request_id,
                &OutboundReply::text(messages::TOO_BUSY),
            )
            .await;
            return Err(DreamsmithError::Handler(format!(
                "product queue full, listing dropped for request {request_id}"
            )));
        }

        info!(request_id = %request_id, "image delivered and product creation enqueued");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dreamsmith_core::types::{ReplyTarget, RequestId, UserId};
    use dreamsmith_test_utils::{MockImageGenerator, MockObjectStore, MockSink};

    #[test]
    fn portrait_keywords_win() {
        assert_eq!(
            infer_image_size("a solemn portrait of a standing figure"),
            ImageSize::Portrait169
        );
    }

    #[test]
    fn landscape_keywords_win() {
        assert_eq!(
            infer_image_size("wide mountain vista at sunset"),
            ImageSize::Landscape169
        );
    }

    #[test]
    fn tie_defaults_to_landscape() {
        assert_eq!(infer_image_size("a red bicycle"), ImageSize::Landscape169);
        assert_eq!(
            infer_image_size("portrait of a wide landscape face horizon"),
            ImageSize::Landscape169
        );
    }

    #[test]
    fn title_uses_first_eight_words_title_cased() {
        let title = product_title("a quiet fox sleeping under an old oak tree", "ada");
        assert_eq!(
            title,
            "A Quiet Fox Sleeping Under An Old Oak Artist Trading Card (ATC) by ada"
        );

        let short = product_title("tiny robot", "ada");
        assert_eq!(short, "Tiny Robot Artist Trading Card (ATC) by ada");
    }

    fn handler_fixture(
        max_retries: u32,
    ) -> (
        GenerationHandler,
        Arc<MockImageGenerator>,
        Arc<MockObjectStore>,
        Arc<MockSink>,
        Arc<PendingRegistry>,
        Arc<BoundedQueue<ProductRequest>>,
    ) {
        let generator = Arc::new(MockImageGenerator::new());
        let store = Arc::new(MockObjectStore::new());
        let sink = Arc::new(MockSink::new());
        let registry = Arc::new(PendingRegistry::new());
        let product_queue = Arc::new(BoundedQueue::new("product", 10));

        let handler = GenerationHandler::new(
            Arc::clone(&generator) as Arc<dyn ImageGenerator>,
            Arc::clone(&store) as Arc<dyn ObjectStore>,
            Arc::clone(&sink) as Arc<dyn DeliverySink>,
            Arc::clone(&registry),
            Arc::clone(&product_queue),
            "6.99".to_string(),
            max_retries,
        );
        (handler, generator, store, sink, registry, product_queue)
    }

    async fn registered_request(
        registry: &PendingRegistry,
        prompt: &str,
    ) -> GenerationRequest {
        let request_id = RequestId::new();
        registry
            .register(
                request_id.clone(),
                ReplyTarget::direct(UserId(1)),
                Some(prompt.to_string()),
            )
            .await;
        GenerationRequest {
            request_id,
            prompt: prompt.to_string(),
            username: "ada".to_string(),
        }
    }

    #[tokio::test]
    async fn happy_path_delivers_image_and_chains_product() {
        let (handler, _generator, store, sink, registry, product_queue) = handler_fixture(0);
        let item = registered_request(&registry, "a quiet fox").await;
        let request_id = item.request_id.clone();

        handler.handle(item).await.unwrap();

        // Image uploaded under a unique atc- name.
        let uploads = store.uploads().await;
        assert_eq!(uploads.len(), 1);
        assert!(uploads[0].0.starts_with("atc-"));

        // Image delivered to the user.
        let directs = sink.directs().await;
        assert_eq!(directs.len(), 1);
        assert!(directs[0].1.image_url.is_some());

        // Product creation chained with the same request id.
        let chained = product_queue.dequeue().await.unwrap();
        assert_eq!(chained.request_id, request_id);
        assert_eq!(chained.draft.vendor, "ada");
        assert_eq!(chained.draft.price, "6.99");
        assert_eq!(chained.draft.tags, vec!["Artist-ada".to_string()]);

        // The registry entry survives for the product stage.
        assert!(registry.lookup(&request_id).await.is_some());
    }

    #[tokio::test(start_paused = true)]
    async fn transient_generation_failure_is_retried() {
        let (handler, generator, _store, sink, registry, product_queue) = handler_fixture(2);
        generator.push_failure("rate limited").await;
        let item = registered_request(&registry, "a quiet fox").await;

        handler.handle(item).await.unwrap();

        assert_eq!(generator.calls().await.len(), 2, "one retry after the failure");
        assert_eq!(sink.directs().await.len(), 1);
        assert_eq!(product_queue.len().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn exhausted_retries_tell_the_user_and_fail() {
        let (handler, generator, store, sink, _registry, product_queue) = handler_fixture(1);
        generator.push_failure("down").await;
        generator.push_failure("still down").await;
        let item = registered_request(&handler.registry, "a quiet fox").await;

        let result = handler.handle(item).await;
        assert!(result.is_err());

        assert!(store.uploads().await.is_empty());
        assert!(product_queue.is_empty().await);
        let directs = sink.directs().await;
        assert_eq!(directs.len(), 1);
        assert_eq!(
            directs[0].1.content.as_deref(),
            Some(messages::GENERATION_FAILED)
        );
    }

    #[tokio::test]
    async fn full_product_queue_reports_busy() {
        let (handler, _generator, _store, sink, registry, product_queue) = handler_fixture(0);
        // Saturate the product queue.
        for _ in 0..10 {
            product_queue
                .enqueue(ProductRequest {
                    request_id: RequestId::new(),
                    draft: ProductDraft {
                        title: "x".into(),
                        description: "x".into(),
                        image_url: "x".into(),
                        vendor: "x".into(),
                        price: "6.99".into(),
                        tags: vec![],
                    },
                    username: "x".into(),
                })
                .await
                .unwrap();
        }

        let item = registered_request(&registry, "a quiet fox").await;
        let result = handler.handle(item).await;
        assert!(result.is_err());

        // The user got the image first, then the busy notice.
        let directs = sink.directs().await;
        assert_eq!(directs.len(), 2);
        assert_eq!(directs[1].1.content.as_deref(), Some(messages::TOO_BUSY));
    }
}
