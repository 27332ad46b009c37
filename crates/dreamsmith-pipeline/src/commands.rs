// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The synchronous command layer in front of the pipeline.
//!
//! All credit accounting happens here, before anything is queued; the
//! pipeline stages never touch the ledger. Ordering on the happy path is
//! deduct, register, enqueue — if the enqueue is rejected by backpressure
//! the registration is rolled back and the credit refunded, so a rejected
//! command has no net effect.

use std::sync::Arc;

use dreamsmith_core::error::DreamsmithError;
use dreamsmith_core::types::{ReplyTarget, RequestId, UserId};
use dreamsmith_credits::CreditLedger;
use dreamsmith_queue::{BoundedQueue, PendingRegistry};
use tracing::{info, warn};

use crate::item::GenerationRequest;
use crate::messages;

/// Result of a `/dream` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DreamOutcome {
    /// Request accepted; credit spent, work item queued.
    Queued { remaining: i64 },
    /// Balance cannot cover the generation cost. Nothing was changed.
    InsufficientCredits { balance: i64 },
    /// The generation queue is at capacity. Nothing was changed.
    Busy,
}

impl DreamOutcome {
    /// The reply a chat adapter shows for this outcome.
    pub fn user_message(&self) -> String {
        match self {
            DreamOutcome::Queued { remaining } => messages::queued(*remaining),
            DreamOutcome::InsufficientCredits { .. } => {
                messages::INSUFFICIENT_CREDITS.to_string()
            }
            DreamOutcome::Busy => messages::TOO_BUSY.to_string(),
        }
    }
}

/// Result of a `/claim` command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimOutcome {
    Granted { amount: i64, balance: i64 },
    OnCooldown { remaining_secs: u64 },
}

impl ClaimOutcome {
    /// The reply a chat adapter shows for this outcome.
    pub fn user_message(&self) -> String {
        match self {
            ClaimOutcome::Granted { amount, balance } => {
                messages::claim_granted(*amount, *balance)
            }
            ClaimOutcome::OnCooldown { remaining_secs } => {
                messages::claim_on_cooldown(*remaining_secs)
            }
        }
    }
}

/// Result of an admin command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AdminOutcome {
    /// The caller is not the configured administrator.
    NotAuthorized,
    /// The adjustment was applied; the target's resulting balance.
    Applied { balance: i64 },
}

impl AdminOutcome {
    /// The reply a chat adapter shows for this outcome.
    pub fn user_message(&self) -> String {
        match self {
            AdminOutcome::NotAuthorized => messages::NOT_AUTHORIZED.to_string(),
            AdminOutcome::Applied { balance } => messages::admin_applied(*balance),
        }
    }
}

/// Entry point for all user and admin commands.
pub struct CommandService {
    ledger: Arc<CreditLedger>,
    registry: Arc<PendingRegistry>,
    generation_queue: Arc<BoundedQueue<GenerationRequest>>,
    generation_cost: i64,
    claim_amount: i64,
    admin_user: Option<UserId>,
}

impl CommandService {
    pub fn new(
        ledger: Arc<CreditLedger>,
        registry: Arc<PendingRegistry>,
        generation_queue: Arc<BoundedQueue<GenerationRequest>>,
        generation_cost: i64,
        claim_amount: i64,
        admin_user: Option<UserId>,
    ) -> Self {
        Self {
            ledger,
            registry,
            generation_queue,
            generation_cost,
            claim_amount,
            admin_user,
        }
    }

    /// Accept an image generation request.
    ///
    /// Returns the outcome for user messaging; a ledger failure propagates
    /// as `Err` and should be reported as a temporary service problem.
    pub async fn dream(
        &self,
        user: UserId,
        username: &str,
        prompt: &str,
        reply: ReplyTarget,
    ) -> Result<DreamOutcome, DreamsmithError> {
        let balance = self.ledger.get_balance(user).await?;
        if balance < self.generation_cost {
            return Ok(DreamOutcome::InsufficientCredits { balance });
        }

        // The conditional deduct can still lose to a concurrent spend.
        if !self.ledger.deduct(user, self.generation_cost).await? {
            let balance = self.ledger.get_balance(user).await?;
            return Ok(DreamOutcome::InsufficientCredits { balance });
        }

        let request_id = RequestId::new();
        self.registry
            .register(request_id.clone(), reply, Some(prompt.to_string()))
            .await;

        let item = GenerationRequest {
            request_id: request_id.clone(),
            prompt: prompt.to_string(),
            username: username.to_string(),
        };
        if self.generation_queue.enqueue(item).await.is_err() {
            // Roll back so a rejected request costs nothing.
            self.registry.remove(&request_id).await;
            self.ledger.add(user, self.generation_cost).await?;
            warn!(user = %user, "generation queue full, request rejected and credit refunded");
            return Ok(DreamOutcome::Busy);
        }

        let remaining = self.ledger.get_balance(user).await?;
        info!(user = %user, request_id = %request_id, remaining, "generation request queued");
        Ok(DreamOutcome::Queued { remaining })
    }

    /// Claim the daily credit grant, subject to the cooldown.
    pub async fn claim(&self, user: UserId) -> Result<ClaimOutcome, DreamsmithError> {
        let (allowed, remaining_secs) = self.ledger.can_claim(user).await?;
        if !allowed {
            return Ok(ClaimOutcome::OnCooldown { remaining_secs });
        }

        self.ledger.add(user, self.claim_amount).await?;
        self.ledger.record_claim(user).await?;
        let balance = self.ledger.get_balance(user).await?;
        info!(user = %user, amount = self.claim_amount, balance, "daily credits claimed");
        Ok(ClaimOutcome::Granted {
            amount: self.claim_amount,
            balance,
        })
    }

    /// Current balance for the user.
    pub async fn balance(&self, user: UserId) -> Result<i64, DreamsmithError> {
        self.ledger.get_balance(user).await
    }

    /// Move credits from the caller to another user.
    ///
    /// Returns `Ok(false)` when the caller cannot cover the amount.
    pub async fn transfer(
        &self,
        from: UserId,
        to: UserId,
        amount: i64,
    ) -> Result<bool, DreamsmithError> {
        self.ledger.transfer(from, to, amount).await
    }

    /// Top balances, largest first.
    pub async fn leaderboard(
        &self,
        top_n: usize,
    ) -> Result<Vec<(UserId, i64)>, DreamsmithError> {
        self.ledger.leaderboard(top_n).await
    }

    fn is_admin(&self, caller: UserId) -> bool {
        self.admin_user == Some(caller)
    }

    /// Admin: grant credits to a user.
    pub async fn admin_grant(
        &self,
        caller: UserId,
        target: UserId,
        amount: i64,
    ) -> Result<AdminOutcome, DreamsmithError> {
        if !self.is_admin(caller) {
            return Ok(AdminOutcome::NotAuthorized);
        }
        self.ledger.add(target, amount).await?;
        let balance = self.ledger.get_balance(target).await?;
        info!(caller = %caller, target = %target, amount, balance, "admin credit grant");
        Ok(AdminOutcome::Applied { balance })
    }

    /// Admin: remove credits from a user, clamping at zero.
    pub async fn admin_revoke(
        &self,
        caller: UserId,
        target: UserId,
        amount: i64,
    ) -> Result<AdminOutcome, DreamsmithError> {
        if !self.is_admin(caller) {
            return Ok(AdminOutcome::NotAuthorized);
        }
        self.ledger.batch_update(vec![(target, -amount)]).await?;
        let balance = self.ledger.get_balance(target).await?;
        info!(caller = %caller, target = %target, amount, balance, "admin credit revoke");
        Ok(AdminOutcome::Applied { balance })
    }

    /// Admin: set a user's balance outright.
    pub async fn admin_set_balance(
        &self,
        caller: UserId,
        target: UserId,
        amount: i64,
    ) -> Result<AdminOutcome, DreamsmithError> {
        if !self.is_admin(caller) {
            return Ok(AdminOutcome::NotAuthorized);
        }
        self.ledger.set_balance(target, amount).await?;
        Ok(AdminOutcome::Applied { balance: amount })
    }

    /// Admin: zero out a user's balance.
    pub async fn admin_reset(
        &self,
        caller: UserId,
        target: UserId,
    ) -> Result<AdminOutcome, DreamsmithError> {
        if !self.is_admin(caller) {
            return Ok(AdminOutcome::NotAuthorized);
        }
        self.ledger.reset(target).await?;
        Ok(AdminOutcome::Applied { balance: 0 })
    }
}
