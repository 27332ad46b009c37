// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Dreamsmith bot.

use thiserror::Error;

/// The primary error type used across Dreamsmith crates.
#[derive(Debug, Error)]
pub enum DreamsmithError {
    /// Configuration errors (invalid TOML, missing required fields, type mismatches).
    #[error("configuration error: {0}")]
    Config(String),

    /// The credit ledger's backing store is unreachable after bounded retries.
    ///
    /// Callers must treat this as "try again later", never as a zero balance.
    #[error("credit ledger unavailable: {source}")]
    LedgerUnavailable {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Business-rule rejection: the user cannot afford the operation.
    ///
    /// Surfaced to the user, not logged as an error.
    #[error("insufficient credits: have {available}, need {required}")]
    InsufficientCredits { available: i64, required: i64 },

    /// Image generation API errors (submission failure, empty result, download failure).
    #[error("image generation error: {message}")]
    Generation {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Object storage errors (upload failure, authorization failure).
    #[error("object storage error: {message}")]
    ObjectStorage {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Product catalog API errors (creation failure, collection association failure).
    #[error("product catalog error: {message}")]
    Catalog {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// A work item's handler failed; the item is dropped after logging.
    #[error("handler failure: {0}")]
    Handler(String),

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

/// Failure modes of one reply-delivery tier.
///
/// Each tier failure falls through to the next tier; exhausting all tiers
/// is logged as a delivery failure and surfaced nowhere else.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The original interaction handle is no longer valid.
    #[error("interaction handle expired")]
    HandleExpired,

    /// The bot lacks permission to post to the target.
    #[error("permission denied")]
    PermissionDenied,

    /// The target channel or user no longer exists or is unreachable.
    #[error("target not found")]
    TargetNotFound,

    /// Transport-level failure talking to the chat platform.
    #[error("transport error: {source}")]
    Transport {
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}
