// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Result delivery sink trait.

use async_trait::async_trait;

use crate::error::DeliveryError;
use crate::types::{ChannelId, InteractionHandle, OutboundReply, UserId};

/// Sink for delivering an eventual result back to the user who triggered a
/// work item. One method per delivery tier; the tiered fallback order is
/// the caller's concern.
#[async_trait]
pub trait DeliverySink: Send + Sync {
    /// Tier 1: follow up on the original deferred interaction.
    async fn send_followup(
        &self,
        handle: &InteractionHandle,
        reply: &OutboundReply,
    ) -> Result<(), DeliveryError>;

    /// Tier 2: post to the channel the request occurred in.
    async fn send_to_channel(
        &self,
        channel: ChannelId,
        reply: &OutboundReply,
    ) -> Result<(), DeliveryError>;

    /// Tier 3: direct message to the requesting user.
    async fn send_direct(&self, user: UserId, reply: &OutboundReply)
    -> Result<(), DeliveryError>;
}
