// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring for the Dreamsmith service: ledger, queues, registry, consumer
//! loops, sweeper, and the command service the chat adapter talks to.

pub mod serve;
pub mod shutdown;
pub mod sink;
