// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core error types, identifiers, and collaborator traits for the
//! Dreamsmith image-to-product bot.

pub mod error;
pub mod traits;
pub mod types;

pub use error::{DeliveryError, DreamsmithError};
pub use traits::{DeliverySink, ImageGenerator, ObjectStore, ProductCatalog};
pub use types::{
    ChannelId, CreatedProduct, ImageReference, ImageSize, InteractionHandle, OutboundReply,
    ProductDraft, ReplyTarget, RequestId, UserId,
};
