// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Credit ledger for Dreamsmith: per-user integer balances with atomic
//! mutation, a daily-claim cooldown, and bulk reporting conveniences.
//!
//! Balances live in SQLite and are mutated through single conditional
//! statements, so the `balance >= 0` invariant holds even when independent
//! process instances share the database file.

pub mod ledger;

pub use ledger::CreditLedger;
