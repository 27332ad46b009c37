// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! The Dreamsmith pipeline: command layer, the two chained pipeline stages
//! (image generation, product creation), and tiered result delivery.
//!
//! Control flow: a user command deducts credits, registers the reply
//! context, and enqueues a generation work item. The generation consumer
//! produces and uploads the image, delivers it, and chains a product
//! creation item onto the second queue. The product consumer publishes the
//! product, delivers the listing URL, and retires the reply context. The
//! credit ledger is only ever consulted synchronously in the command
//! layer, never inside a consumer.

pub mod commands;
pub mod delivery;
pub mod generation;
pub mod item;
pub mod messages;
pub mod product;

pub use commands::{AdminOutcome, ClaimOutcome, CommandService, DreamOutcome};
pub use delivery::deliver;
pub use generation::GenerationHandler;
pub use item::{GenerationRequest, ProductRequest};
pub use product::ProductCreationHandler;
