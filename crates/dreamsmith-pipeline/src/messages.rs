// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! User-visible message copy for command outcomes and pipeline results.
//!
//! Errors crossing into the command layer become a plain "try again later"
//! message here; internal detail never reaches the user.

use dreamsmith_core::error::DreamsmithError;

/// Rejection shown when the balance cannot cover a generation.
pub const INSUFFICIENT_CREDITS: &str = "You do not have enough credits to generate an image. \
     Please claim your daily credits using /claim.";

/// Backpressure rejection when the generation queue is at capacity.
pub const TOO_BUSY: &str =
    "We're currently processing too many requests. Please try again later.";

/// Generic degraded-service message for ledger or other backend failures.
pub const TRY_AGAIN_LATER: &str = "An error occurred. Please try again later.";

/// Shown when the pipeline could not produce an image for a queued request.
pub const GENERATION_FAILED: &str =
    "Failed to generate or upload the image. Please try again.";

/// Shown when the listing could not be created for a generated image.
pub const PRODUCT_FAILED: &str =
    "Your image was generated, but creating the product listing failed.";

/// Rejection for admin commands issued by anyone but the configured admin.
pub const NOT_AUTHORIZED: &str = "You are not authorized to manage credits.";

/// Confirmation after an admin balance mutation.
pub fn admin_applied(balance: i64) -> String {
    format!("Done. The balance is now {balance} credits.")
}

/// Map an internal failure to the user-facing degraded-service message.
///
/// Every error renders the same way; ledger unavailability in particular
/// must read as "try again later", never as a zero balance.
pub fn failure_message(error: &DreamsmithError) -> &'static str {
    match error {
        DreamsmithError::LedgerUnavailable { .. } => TRY_AGAIN_LATER,
        _ => TRY_AGAIN_LATER,
    }
}

/// Acknowledgement after a request is queued.
pub fn queued(remaining: i64) -> String {
    format!(
        "Your image generation request has been queued. We'll notify you once it's ready. \
         You have {remaining} credits remaining."
    )
}

/// Successful claim message.
pub fn claim_granted(amount: i64, balance: i64) -> String {
    format!(
        "You've successfully claimed {amount} credits! You now have {balance}. \
         You can claim again in 24 hours."
    )
}

/// Cooldown rejection with remaining time.
pub fn claim_on_cooldown(remaining_secs: u64) -> String {
    format!(
        "You've already claimed your daily credits. Please try again in {}.",
        format_remaining(remaining_secs)
    )
}

/// Format a second count as `XhYmZs`, omitting zero hour/minute components.
pub fn format_remaining(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let seconds = secs % 60;

    let mut out = String::new();
    if hours > 0 {
        out.push_str(&format!("{hours}h "));
    }
    if minutes > 0 {
        out.push_str(&format!("{minutes}m "));
    }
    out.push_str(&format!("{seconds}s"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn remaining_time_formatting() {
        assert_eq!(format_remaining(0), "0s");
        assert_eq!(format_remaining(59), "59s");
        assert_eq!(format_remaining(61), "1m 1s");
        assert_eq!(format_remaining(3600), "1h 0s");
        assert_eq!(format_remaining(3_725), "1h 2m 5s");
        assert_eq!(format_remaining(86_399), "23h 59m 59s");
    }

    #[test]
    fn queued_mentions_remaining_credits() {
        assert!(queued(4).contains("4 credits remaining"));
    }

    #[test]
    fn any_internal_failure_renders_as_try_again_later() {
        let unavailable = DreamsmithError::LedgerUnavailable {
            source: "connection reset".into(),
        };
        assert_eq!(failure_message(&unavailable), TRY_AGAIN_LATER);

        let internal = DreamsmithError::Internal("bug".to_string());
        assert_eq!(failure_message(&internal), TRY_AGAIN_LATER);
    }
}
