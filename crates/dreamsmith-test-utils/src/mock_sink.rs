// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Capturing delivery sink with per-tier failure switches.

use async_trait::async_trait;
use tokio::sync::Mutex;

use dreamsmith_core::error::DeliveryError;
use dreamsmith_core::traits::DeliverySink;
use dreamsmith_core::types::{ChannelId, InteractionHandle, OutboundReply, UserId};

/// Which failure a mocked tier reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierFailure {
    HandleExpired,
    PermissionDenied,
    TargetNotFound,
}

impl TierFailure {
    fn to_error(self) -> DeliveryError {
        match self {
            TierFailure::HandleExpired => DeliveryError::HandleExpired,
            TierFailure::PermissionDenied => DeliveryError::PermissionDenied,
            TierFailure::TargetNotFound => DeliveryError::TargetNotFound,
        }
    }
}

/// A delivery sink that captures every attempted delivery per tier.
///
/// All tiers succeed unless a failure is armed via the `fail_*` setters.
#[derive(Default)]
pub struct MockSink {
    followups: Mutex<Vec<(InteractionHandle, OutboundReply)>>,
    channel_posts: Mutex<Vec<(ChannelId, OutboundReply)>>,
    directs: Mutex<Vec<(UserId, OutboundReply)>>,
    followup_failure: Mutex<Option<TierFailure>>,
    channel_failure: Mutex<Option<TierFailure>>,
    direct_failure: Mutex<Option<TierFailure>>,
}

impl MockSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn fail_followups(&self, failure: TierFailure) {
        *self.followup_failure.lock().await = Some(failure);
    }

    pub async fn fail_channel_posts(&self, failure: TierFailure) {
        *self.channel_failure.lock().await = Some(failure);
    }

    pub async fn fail_directs(&self, failure: TierFailure) {
        *self.direct_failure.lock().await = Some(failure);
    }

    pub async fn followups(&self) -> Vec<(InteractionHandle, OutboundReply)> {
        self.followups.lock().await.clone()
    }

    pub async fn channel_posts(&self) -> Vec<(ChannelId, OutboundReply)> {
        self.channel_posts.lock().await.clone()
    }

    pub async fn directs(&self) -> Vec<(UserId, OutboundReply)> {
        self.directs.lock().await.clone()
    }

    /// Total deliveries that succeeded across all tiers.
    pub async fn delivered_count(&self) -> usize {
        self.followups.lock().await.len()
            + self.channel_posts.lock().await.len()
            + self.directs.lock().await.len()
    }
}

#[async_trait]
impl DeliverySink for MockSink {
    async fn send_followup(
        &self,
        handle: &InteractionHandle,
        reply: &OutboundReply,
    ) -> Result<(), DeliveryError> {
        if let Some(failure) = *self.followup_failure.lock().await {
            return Err(failure.to_error());
        }
        self.followups
            .lock()
            .await
            .push((handle.clone(), reply.clone()));
        Ok(())
    }

    async fn send_to_channel(
        &self,
        channel: ChannelId,
        reply: &OutboundReply,
    ) -> Result<(), DeliveryError> {
        if let Some(failure) = *self.channel_failure.lock().await {
            return Err(failure.to_error());
        }
        self.channel_posts.lock().await.push((channel, reply.clone()));
        Ok(())
    }

    async fn send_direct(
        &self,
        user: UserId,
        reply: &OutboundReply,
    ) -> Result<(), DeliveryError> {
        if let Some(failure) = *self.direct_failure.lock().await {
            return Err(failure.to_error());
        }
        self.directs.lock().await.push((user, reply.clone()));
        Ok(())
    }
}
