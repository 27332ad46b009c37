// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed credit ledger.
//!
//! All operations go through a single tokio-rusqlite background thread.
//! Deduction uses optimistic concurrency control: read the balance, check
//! the precondition, then write conditionally on the value being unchanged
//! since the read. On conflict the whole read-check-write is retried with a
//! short randomized delay, a bounded number of times. Write conflicts are
//! the one expected error condition here and are retried silently.
//!
//! Busy- and locked-class backend failures are retried with exponential
//! backoff before surfacing [`DreamsmithError::LedgerUnavailable`]. Callers
//! must treat that as "try again later", never as a zero balance.
//! Deterministic failures (bad SQL, constraint violations, missing schema)
//! are not retried and surface immediately.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use dreamsmith_core::error::DreamsmithError;
use dreamsmith_core::types::UserId;
use rand::Rng;
use rusqlite::OptionalExtension;
use tracing::{debug, info, warn};

/// Bounded attempt count for the optimistic read-check-write loop.
const OCC_MAX_ATTEMPTS: u32 = 10;

/// Convert a tokio-rusqlite error into `DreamsmithError::LedgerUnavailable`.
fn map_tr_err(e: tokio_rusqlite::Error<rusqlite::Error>) -> DreamsmithError {
    DreamsmithError::LedgerUnavailable {
        source: Box::new(e),
    }
}

/// Whether a statement failure is worth retrying. Only busy/locked-class
/// contention clears up on its own; everything else is deterministic.
fn sqlite_error_is_retryable(e: &rusqlite::Error) -> bool {
    matches!(
        e.sqlite_error_code(),
        Some(rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked)
    )
}

/// Durable per-user credit ledger with a claim cooldown.
///
/// Absent users read as balance 0; rows are created implicitly on first
/// write and never deleted, only reset to 0.
pub struct CreditLedger {
    conn: tokio_rusqlite::Connection,
    max_retries: u32,
    retry_base: Duration,
    cooldown: Duration,
}

impl CreditLedger {
    /// Open a ledger at the given database path, creating the schema if needed.
    pub async fn open(
        path: &str,
        max_retries: u32,
        retry_base: Duration,
        cooldown: Duration,
    ) -> Result<Self, DreamsmithError> {
        let conn = tokio_rusqlite::Connection::open(path)
            .await
            .map_err(|e| map_tr_err(e.into()))?;
        Self::with_connection(conn, max_retries, retry_base, cooldown).await
    }

    /// Open an in-memory ledger. Used by tests and local development.
    pub async fn open_in_memory(cooldown: Duration) -> Result<Self, DreamsmithError> {
        let conn = tokio_rusqlite::Connection::open_in_memory()
            .await
            .map_err(|e| map_tr_err(e.into()))?;
        Self::with_connection(conn, 3, Duration::from_millis(10), cooldown).await
    }

    /// Build a ledger from an existing connection, creating the schema if needed.
    pub async fn with_connection(
        conn: tokio_rusqlite::Connection,
        max_retries: u32,
        retry_base: Duration,
        cooldown: Duration,
    ) -> Result<Self, DreamsmithError> {
        conn.call(|conn| -> Result<(), rusqlite::Error> {
            conn.execute_batch(
                "CREATE TABLE IF NOT EXISTS credits (
                    user_id INTEGER PRIMARY KEY NOT NULL,
                    balance INTEGER NOT NULL DEFAULT 0 CHECK (balance >= 0)
                );
                CREATE TABLE IF NOT EXISTS claims (
                    user_id INTEGER PRIMARY KEY NOT NULL,
                    expires_at INTEGER NOT NULL
                );",
            )?;
            Ok(())
        })
        .await
        .map_err(map_tr_err)?;

        Ok(Self {
            conn,
            max_retries,
            retry_base,
            cooldown,
        })
    }

    /// Run one backing-store call, retrying busy/locked failures with
    /// exponential backoff before surfacing `LedgerUnavailable`.
    ///
    /// Deterministic statement failures skip the backoff schedule and
    /// surface immediately as `Internal`.
    async fn call_with_retry<T, F>(&self, f: F) -> Result<T, DreamsmithError>
    where
        T: Send + 'static,
        F: Fn(&mut rusqlite::Connection) -> Result<T, rusqlite::Error>
            + Clone
            + Send
            + Sync
            + 'static,
    {
        let mut attempt = 0;
        loop {
            let op = f.clone();
            // Classification has to happen inside the closure, before the
            // error is wrapped by the connection layer.
            let fatal = Arc::new(AtomicBool::new(false));
            let fatal_flag = Arc::clone(&fatal);
            let result = self
                .conn
                .call(move |conn| {
                    op(conn).inspect_err(|e| {
                        if !sqlite_error_is_retryable(e) {
                            fatal_flag.store(true, Ordering::SeqCst);
                        }
                    })
                })
                .await;

            match result {
                Ok(value) => return Ok(value),
                Err(e) if fatal.load(Ordering::SeqCst) => {
                    warn!(error = %e, "ledger operation failed");
                    return Err(DreamsmithError::Internal(format!(
                        "ledger operation failed: {e}"
                    )));
                }
                Err(e) => {
                    if attempt >= self.max_retries {
                        warn!(error = %e, attempts = attempt + 1, "ledger unavailable");
                        return Err(map_tr_err(e));
                    }
                    let delay = self.retry_base * 2u32.pow(attempt);
                    debug!(error = %e, attempt, delay_ms = delay.as_millis() as u64,
                        "transient ledger failure, retrying");
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
            }
        }
    }

    /// Current balance for a user. Absent users read as 0.
    pub async fn get_balance(&self, user: UserId) -> Result<i64, DreamsmithError> {
        let uid = user.0 as i64;
        self.call_with_retry(move |conn| {
            let balance: Option<i64> = conn
                .query_row(
                    "SELECT balance FROM credits WHERE user_id = ?1",
                    [uid],
                    |row| row.get(0),
                )
                .optional()?;
            Ok(balance.unwrap_or(0))
        })
        .await
    }

    /// Atomically add `amount` (> 0) credits to a user's balance.
    pub async fn add(&self, user: UserId, amount: i64) -> Result<(), DreamsmithError> {
        check_positive(amount)?;
        let uid = user.0 as i64;
        self.call_with_retry(move |conn| {
            conn.execute(
                "INSERT INTO credits (user_id, balance) VALUES (?1, ?2)
                 ON CONFLICT(user_id) DO UPDATE SET balance = balance + ?2",
                rusqlite::params![uid, amount],
            )?;
            Ok(())
        })
        .await?;
        debug!(user = %user, amount, "credits added");
        Ok(())
    }

    /// Atomically deduct `amount` (> 0) credits if the balance covers it.
    ///
    /// Returns `Ok(true)` if the deduction happened, `Ok(false)` if the
    /// balance was insufficient. Never drives a balance below zero, even
    /// under concurrent deductions against the same user: the write is
    /// conditional on the balance being unchanged since the read, and a
    /// lost race retries the whole read-check-write.
    pub async fn deduct(&self, user: UserId, amount: i64) -> Result<bool, DreamsmithError> {
        check_positive(amount)?;
        let uid = user.0 as i64;

        for _ in 0..OCC_MAX_ATTEMPTS {
            let current = self.get_balance(user).await?;
            if current < amount {
                debug!(user = %user, balance = current, amount, "insufficient credits");
                return Ok(false);
            }

            let changed = self
                .call_with_retry(move |conn| {
                    conn.execute(
                        "UPDATE credits SET balance = balance - ?2
                         WHERE user_id = ?1 AND balance = ?3",
                        rusqlite::params![uid, amount, current],
                    )
                })
                .await?;

            if changed == 1 {
                debug!(user = %user, amount, "credits deducted");
                return Ok(true);
            }

            // Conflicting concurrent writer; retry after a short jittered delay.
            let jitter_ms = rand::thread_rng().gen_range(5..50);
            tokio::time::sleep(Duration::from_millis(jitter_ms)).await;
        }

        Err(DreamsmithError::Internal(format!(
            "deduct for user {user} conflicted {OCC_MAX_ATTEMPTS} times"
        )))
    }

    /// Transfer `amount` (> 0) credits between users as one atomic unit.
    ///
    /// Returns `Ok(false)` without mutating either side if `from` cannot
    /// cover the amount.
    pub async fn transfer(
        &self,
        from: UserId,
        to: UserId,
        amount: i64,
    ) -> Result<bool, DreamsmithError> {
        check_positive(amount)?;
        let from_id = from.0 as i64;
        let to_id = to.0 as i64;

        let moved = self
            .call_with_retry(move |conn| {
                let tx = conn.transaction()?;
                let current: i64 = tx
                    .query_row(
                        "SELECT balance FROM credits WHERE user_id = ?1",
                        [from_id],
                        |row| row.get(0),
                    )
                    .optional()?
                    .unwrap_or(0);
                if current < amount {
                    return Ok(false);
                }
                tx.execute(
                    "UPDATE credits SET balance = balance - ?2 WHERE user_id = ?1",
                    rusqlite::params![from_id, amount],
                )?;
                tx.execute(
                    "INSERT INTO credits (user_id, balance) VALUES (?1, ?2)
                     ON CONFLICT(user_id) DO UPDATE SET balance = balance + ?2",
                    rusqlite::params![to_id, amount],
                )?;
                tx.commit()?;
                Ok(true)
            })
            .await?;

        if moved {
            info!(from = %from, to = %to, amount, "credits transferred");
        }
        Ok(moved)
    }

    /// Whether the user may claim the daily grant, and seconds remaining if not.
    pub async fn can_claim(&self, user: UserId) -> Result<(bool, u64), DreamsmithError> {
        let uid = user.0 as i64;
        let now = chrono::Utc::now().timestamp();
        let expires: Option<i64> = self
            .call_with_retry(move |conn| {
                conn.query_row(
                    "SELECT expires_at FROM claims WHERE user_id = ?1",
                    [uid],
                    |row| row.get(0),
                )
                .optional()
            })
            .await?;

        match expires {
            Some(at) if at > now => Ok((false, (at - now) as u64)),
            _ => Ok((true, 0)),
        }
    }

    /// Record a claim, resetting the cooldown to a fresh full window.
    ///
    /// Always overwrites the previous marker; cooldowns do not stack.
    pub async fn record_claim(&self, user: UserId) -> Result<(), DreamsmithError> {
        let uid = user.0 as i64;
        let expires_at = chrono::Utc::now().timestamp() + self.cooldown.as_secs() as i64;
        self.call_with_retry(move |conn| {
            conn.execute(
                "INSERT INTO claims (user_id, expires_at) VALUES (?1, ?2)
                 ON CONFLICT(user_id) DO UPDATE SET expires_at = ?2",
                rusqlite::params![uid, expires_at],
            )?;
            Ok(())
        })
        .await?;
        debug!(user = %user, expires_at, "claim recorded");
        Ok(())
    }

    /// Set a user's balance to an exact non-negative amount.
    pub async fn set_balance(&self, user: UserId, amount: i64) -> Result<(), DreamsmithError> {
        if amount < 0 {
            return Err(DreamsmithError::Internal(format!(
                "balance must be non-negative: {amount}"
            )));
        }
        let uid = user.0 as i64;
        self.call_with_retry(move |conn| {
            conn.execute(
                "INSERT INTO credits (user_id, balance) VALUES (?1, ?2)
                 ON CONFLICT(user_id) DO UPDATE SET balance = ?2",
                rusqlite::params![uid, amount],
            )?;
            Ok(())
        })
        .await?;
        info!(user = %user, amount, "balance set");
        Ok(())
    }

    /// Reset a user's balance to zero.
    pub async fn reset(&self, user: UserId) -> Result<(), DreamsmithError> {
        self.set_balance(user, 0).await
    }

    /// Apply a batch of balance deltas inside one transaction.
    ///
    /// Best-effort convenience: negative deltas clamp at zero rather than
    /// rejecting, unlike [`deduct`](Self::deduct).
    pub async fn batch_update(&self, updates: Vec<(UserId, i64)>) -> Result<(), DreamsmithError> {
        let rows: Vec<(i64, i64)> = updates.iter().map(|(u, d)| (u.0 as i64, *d)).collect();
        self.call_with_retry(move |conn| {
            let tx = conn.transaction()?;
            for (uid, delta) in &rows {
                tx.execute(
                    "INSERT INTO credits (user_id, balance) VALUES (?1, MAX(?2, 0))
                     ON CONFLICT(user_id) DO UPDATE SET balance = MAX(balance + ?2, 0)",
                    rusqlite::params![uid, delta],
                )?;
            }
            tx.commit()?;
            Ok(())
        })
        .await?;
        debug!(count = updates.len(), "batch balance update applied");
        Ok(())
    }

    /// All users with a nonzero balance.
    pub async fn users_with_balance(&self) -> Result<Vec<UserId>, DreamsmithError> {
        self.call_with_retry(|conn| {
            let mut stmt =
                conn.prepare("SELECT user_id FROM credits WHERE balance > 0 ORDER BY user_id")?;
            let ids = stmt
                .query_map([], |row| row.get::<_, i64>(0))?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(ids.into_iter().map(|id| UserId(id as u64)).collect())
        })
        .await
    }

    /// The `top_n` users with the highest balances, descending.
    pub async fn leaderboard(&self, top_n: usize) -> Result<Vec<(UserId, i64)>, DreamsmithError> {
        let limit = top_n as i64;
        self.call_with_retry(move |conn| {
            let mut stmt = conn.prepare(
                "SELECT user_id, balance FROM credits
                 WHERE balance > 0 ORDER BY balance DESC, user_id ASC LIMIT ?1",
            )?;
            let rows = stmt
                .query_map([limit], |row| {
                    Ok((row.get::<_, i64>(0)?, row.get::<_, i64>(1)?))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            Ok(rows
                .into_iter()
                .map(|(uid, balance)| (UserId(uid as u64), balance))
                .collect())
        })
        .await
    }

    /// Force a user's claim marker to an absolute expiry timestamp.
    ///
    /// Test hook for exercising cooldown expiry without waiting.
    #[doc(hidden)]
    pub async fn set_claim_expiry(
        &self,
        user: UserId,
        expires_at: i64,
    ) -> Result<(), DreamsmithError> {
        let uid = user.0 as i64;
        self.call_with_retry(move |conn| {
            conn.execute(
                "INSERT INTO claims (user_id, expires_at) VALUES (?1, ?2)
                 ON CONFLICT(user_id) DO UPDATE SET expires_at = ?2",
                rusqlite::params![uid, expires_at],
            )?;
            Ok(())
        })
        .await
    }
}

fn check_positive(amount: i64) -> Result<(), DreamsmithError> {
    if amount <= 0 {
        return Err(DreamsmithError::Internal(format!(
            "amount must be positive: {amount}"
        )));
    }
    Ok(())
}
