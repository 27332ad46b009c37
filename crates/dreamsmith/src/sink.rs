// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delivery sink that writes outbound replies to the log.
//!
//! Stands in for a chat-platform adapter; anything implementing
//! [`DeliverySink`] can replace it at wiring time.

use async_trait::async_trait;
use tracing::info;

use dreamsmith_core::error::DeliveryError;
use dreamsmith_core::traits::DeliverySink;
use dreamsmith_core::types::{ChannelId, InteractionHandle, OutboundReply, UserId};

/// Logs every reply instead of sending it anywhere.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

fn render(reply: &OutboundReply) -> String {
    match (&reply.content, &reply.image_url) {
        (Some(text), Some(url)) => format!("{text} [{url}]"),
        (Some(text), None) => text.clone(),
        (None, Some(url)) => format!("[{url}]"),
        (None, None) => String::new(),
    }
}

#[async_trait]
impl DeliverySink for LogSink {
    async fn send_followup(
        &self,
        handle: &InteractionHandle,
        reply: &OutboundReply,
    ) -> Result<(), DeliveryError> {
        info!(interaction = %handle, reply = %render(reply), "outbound follow-up");
        Ok(())
    }

    async fn send_to_channel(
        &self,
        channel: ChannelId,
        reply: &OutboundReply,
    ) -> Result<(), DeliveryError> {
        info!(channel = %channel, reply = %render(reply), "outbound channel message");
        Ok(())
    }

    async fn send_direct(
        &self,
        user: UserId,
        reply: &OutboundReply,
    ) -> Result<(), DeliveryError> {
        info!(user = %user, reply = %render(reply), "outbound direct message");
        Ok(())
    }
}
