// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock external collaborators for deterministic testing.
//!
//! Each mock captures the calls made against it for assertion, succeeds by
//! default, and exposes failure switches for exercising error paths.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use dreamsmith_core::error::DreamsmithError;
use dreamsmith_core::traits::{ImageGenerator, ObjectStore, ProductCatalog};
use dreamsmith_core::types::{CreatedProduct, ImageReference, ImageSize, ProductDraft};

/// A scripted image generation client.
///
/// By default every `generate` call succeeds with a unique URL and every
/// `download` returns the configured bytes. `push_failure` injects one
/// transient failure per call, consumed FIFO, for retry-path tests.
pub struct MockImageGenerator {
    calls: Mutex<Vec<(String, ImageSize)>>,
    scripted_failures: Mutex<VecDeque<String>>,
    fail_download: AtomicBool,
    image_bytes: Vec<u8>,
}

impl MockImageGenerator {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            scripted_failures: Mutex::new(VecDeque::new()),
            fail_download: AtomicBool::new(false),
            image_bytes: b"fake-jpeg-bytes".to_vec(),
        }
    }

    /// The next `generate` call fails once with this message.
    pub async fn push_failure(&self, message: impl Into<String>) {
        self.scripted_failures.lock().await.push_back(message.into());
    }

    /// Make all `download` calls fail.
    pub fn fail_downloads(&self) {
        self.fail_download.store(true, Ordering::SeqCst);
    }

    /// Prompts and sizes passed to `generate`, in call order.
    pub async fn calls(&self) -> Vec<(String, ImageSize)> {
        self.calls.lock().await.clone()
    }
}

impl Default for MockImageGenerator {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageGenerator for MockImageGenerator {
    async fn generate(
        &self,
        prompt: &str,
        size: ImageSize,
    ) -> Result<ImageReference, DreamsmithError> {
        self.calls.lock().await.push((prompt.to_string(), size));

        if let Some(message) = self.scripted_failures.lock().await.pop_front() {
            return Err(DreamsmithError::Generation {
                message,
                source: None,
            });
        }

        Ok(ImageReference {
            url: format!("https://gen.example/{}.jpg", uuid::Uuid::new_v4()),
        })
    }

    async fn download(&self, _reference: &ImageReference) -> Result<Vec<u8>, DreamsmithError> {
        if self.fail_download.load(Ordering::SeqCst) {
            return Err(DreamsmithError::Generation {
                message: "download failed".to_string(),
                source: None,
            });
        }
        Ok(self.image_bytes.clone())
    }
}

/// An in-memory object store that records uploads.
pub struct MockObjectStore {
    uploads: Mutex<Vec<(String, usize)>>,
    fail: AtomicBool,
}

impl MockObjectStore {
    pub fn new() -> Self {
        Self {
            uploads: Mutex::new(Vec::new()),
            fail: AtomicBool::new(false),
        }
    }

    pub fn fail_uploads(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    /// Uploaded object names with their byte lengths, in call order.
    pub async fn uploads(&self) -> Vec<(String, usize)> {
        self.uploads.lock().await.clone()
    }
}

impl Default for MockObjectStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ObjectStore for MockObjectStore {
    async fn upload(&self, name: &str, bytes: Vec<u8>) -> Result<String, DreamsmithError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DreamsmithError::ObjectStorage {
                message: "upload rejected".to_string(),
                source: None,
            });
        }
        self.uploads.lock().await.push((name.to_string(), bytes.len()));
        Ok(format!("https://cdn.example/{name}"))
    }
}

/// An in-memory product catalog that records created products and
/// collection associations.
pub struct MockCatalog {
    created: Mutex<Vec<ProductDraft>>,
    associations: Mutex<Vec<(String, String)>>,
    next_id: AtomicU64,
    fail: AtomicBool,
    fail_association: AtomicBool,
}

impl MockCatalog {
    pub fn new() -> Self {
        Self {
            created: Mutex::new(Vec::new()),
            associations: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
            fail: AtomicBool::new(false),
            fail_association: AtomicBool::new(false),
        }
    }

    pub fn fail_creation(&self) {
        self.fail.store(true, Ordering::SeqCst);
    }

    pub fn fail_association(&self) {
        self.fail_association.store(true, Ordering::SeqCst);
    }

    pub async fn created(&self) -> Vec<ProductDraft> {
        self.created.lock().await.clone()
    }

    /// `(product_id, collection)` pairs, in call order.
    pub async fn associations(&self) -> Vec<(String, String)> {
        self.associations.lock().await.clone()
    }
}

impl Default for MockCatalog {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ProductCatalog for MockCatalog {
    async fn create_product(
        &self,
        draft: &ProductDraft,
    ) -> Result<CreatedProduct, DreamsmithError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(DreamsmithError::Catalog {
                message: "product creation rejected".to_string(),
                source: None,
            });
        }
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        self.created.lock().await.push(draft.clone());
        Ok(CreatedProduct {
            id: format!("prod-{id}"),
            url: format!("https://shop.example/products/prod-{id}"),
        })
    }

    async fn associate_with_collection(
        &self,
        product_id: &str,
        collection: &str,
    ) -> Result<(), DreamsmithError> {
        if self.fail_association.load(Ordering::SeqCst) {
            return Err(DreamsmithError::Catalog {
                message: "collection association rejected".to_string(),
                source: None,
            });
        }
        self.associations
            .lock()
            .await
            .push((product_id.to_string(), collection.to_string()));
        Ok(())
    }
}

/// Convenience trio of Arc-wrapped mocks for pipeline tests.
pub fn mock_collaborators() -> (
    Arc<MockImageGenerator>,
    Arc<MockObjectStore>,
    Arc<MockCatalog>,
) {
    (
        Arc::new(MockImageGenerator::new()),
        Arc::new(MockObjectStore::new()),
        Arc::new(MockCatalog::new()),
    )
}
