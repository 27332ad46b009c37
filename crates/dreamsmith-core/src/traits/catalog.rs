// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Product catalog (e-commerce) client trait.

use async_trait::async_trait;

use crate::error::DreamsmithError;
use crate::types::{CreatedProduct, ProductDraft};

/// Client for the e-commerce product API.
#[async_trait]
pub trait ProductCatalog: Send + Sync {
    /// Create a product from the draft and return its id and public URL.
    async fn create_product(&self, draft: &ProductDraft)
    -> Result<CreatedProduct, DreamsmithError>;

    /// Associate an existing product with a named collection, creating the
    /// collection if needed.
    async fn associate_with_collection(
        &self,
        product_id: &str,
        collection: &str,
    ) -> Result<(), DreamsmithError>;
}
