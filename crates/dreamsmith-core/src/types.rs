// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared across the Dreamsmith crates.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// Stable, opaque identifier for a chat-platform user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserId(pub u64);

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier for a chat channel or room.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChannelId(pub u64);

impl std::fmt::Display for ChannelId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque identifier tying a work item to its pending-request registry entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestId(pub String);

impl RequestId {
    /// Generate a fresh random request id.
    pub fn new() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }
}

impl Default for RequestId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RequestId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Opaque handle to a deferred chat interaction, usable for follow-up replies
/// until the platform expires it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionHandle(pub String);

impl std::fmt::Display for InteractionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The set of fallback destinations for delivering an eventual result.
///
/// Delivery is attempted in order: the original interaction handle, then the
/// channel the request occurred in, then a direct message to the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReplyTarget {
    /// The original deferred interaction, if still held.
    pub interaction: Option<InteractionHandle>,
    /// The channel the request occurred in.
    pub channel: Option<ChannelId>,
    /// The requesting user, always present.
    pub user: UserId,
}

impl ReplyTarget {
    /// A reply target with only the user tier (direct message fallback).
    pub fn direct(user: UserId) -> Self {
        Self {
            interaction: None,
            channel: None,
            user,
        }
    }
}

/// Content of a reply delivered back to a user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OutboundReply {
    /// Plain text content.
    pub content: Option<String>,
    /// URL of an attached image, rendered by the platform.
    pub image_url: Option<String>,
}

impl OutboundReply {
    /// A plain-text reply.
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            image_url: None,
        }
    }

    /// A reply carrying an image with a caption.
    pub fn image(url: impl Into<String>, caption: impl Into<String>) -> Self {
        Self {
            content: Some(caption.into()),
            image_url: Some(url.into()),
        }
    }
}

/// Aspect preset passed to the image generation API.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize, Default,
)]
pub enum ImageSize {
    #[strum(serialize = "square_hd")]
    #[serde(rename = "square_hd")]
    SquareHd,
    #[strum(serialize = "square")]
    #[serde(rename = "square")]
    Square,
    #[strum(serialize = "portrait_4_3")]
    #[serde(rename = "portrait_4_3")]
    Portrait43,
    #[strum(serialize = "portrait_16_9")]
    #[serde(rename = "portrait_16_9")]
    Portrait169,
    #[strum(serialize = "landscape_4_3")]
    #[serde(rename = "landscape_4_3")]
    Landscape43,
    #[default]
    #[strum(serialize = "landscape_16_9")]
    #[serde(rename = "landscape_16_9")]
    Landscape169,
}

/// A generated image, resolvable to downloadable bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageReference {
    /// URL from which the image bytes can be fetched.
    pub url: String,
}

/// Everything needed to create one product in the catalog.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductDraft {
    pub title: String,
    pub description: String,
    pub image_url: String,
    pub vendor: String,
    /// Decimal price as a string, as the catalog API expects it.
    pub price: String,
    pub tags: Vec<String>,
}

/// A product created in the catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedProduct {
    pub id: String,
    pub url: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn request_id_is_unique() {
        let a = RequestId::new();
        let b = RequestId::new();
        assert_ne!(a, b);
    }

    #[test]
    fn image_size_round_trips_through_strings() {
        assert_eq!(ImageSize::Landscape169.to_string(), "landscape_16_9");
        let parsed = ImageSize::from_str("portrait_4_3").unwrap();
        assert_eq!(parsed, ImageSize::Portrait43);
    }

    #[test]
    fn direct_reply_target_has_only_user_tier() {
        let target = ReplyTarget::direct(UserId(42));
        assert!(target.interaction.is_none());
        assert!(target.channel.is_none());
        assert_eq!(target.user, UserId(42));
    }

    #[test]
    fn outbound_reply_constructors() {
        let text = OutboundReply::text("hello");
        assert_eq!(text.content.as_deref(), Some("hello"));
        assert!(text.image_url.is_none());

        let image = OutboundReply::image("https://img.example/x.jpg", "caption");
        assert_eq!(image.image_url.as_deref(), Some("https://img.example/x.jpg"));
    }
}
