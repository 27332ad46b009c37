// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tiered delivery of a result to the user who triggered a work item.
//!
//! Tiers are tried in order: the original interaction handle, then the
//! channel the request occurred in, then a direct message to the user.
//! Each tier failure falls through to the next; exhausting all tiers is
//! logged as undeliverable and surfaced nowhere else — there is no one
//! left to propagate to.

use dreamsmith_core::traits::DeliverySink;
use dreamsmith_core::types::{OutboundReply, RequestId};
use dreamsmith_queue::PendingRegistry;
use tracing::{error, info, warn};

/// Deliver `reply` to whoever triggered `request_id`.
///
/// A missing registry entry (already swept, or never registered) fails
/// loudly in the log; the user simply does not receive a result.
pub async fn deliver(
    registry: &PendingRegistry,
    sink: &dyn DeliverySink,
    request_id: &RequestId,
    reply: &OutboundReply,
) {
    let Some(entry) = registry.lookup(request_id).await else {
        error!(request_id = %request_id, "no pending entry for delivery, result dropped");
        return;
    };

    // Tier 1: the original interaction handle, if still held.
    if let Some(handle) = &entry.reply.interaction {
        match sink.send_followup(handle, reply).await {
            Ok(()) => {
                info!(request_id = %request_id, "delivered via original interaction");
                return;
            }
            Err(e) => {
                warn!(request_id = %request_id, error = %e,
                    "interaction follow-up failed, trying channel");
            }
        }
    }

    // Tier 2: the channel the request occurred in.
    if let Some(channel) = entry.reply.channel {
        match sink.send_to_channel(channel, reply).await {
            Ok(()) => {
                info!(request_id = %request_id, channel = %channel, "delivered via channel");
                return;
            }
            Err(e) => {
                warn!(request_id = %request_id, channel = %channel, error = %e,
                    "channel delivery failed, trying direct message");
            }
        }
    }

    // Tier 3: direct message to the requesting user.
    match sink.send_direct(entry.reply.user, reply).await {
        Ok(()) => {
            info!(request_id = %request_id, user = %entry.reply.user, "delivered via direct message");
        }
        Err(e) => {
            error!(request_id = %request_id, user = %entry.reply.user, error = %e,
                "all delivery tiers exhausted, result undeliverable");
        }
    }
}
