// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Narrow async traits for the external collaborators the pipeline calls
//! out to. Implementations are thin request/response wrappers around
//! third-party HTTP APIs and carry no independent design.

pub mod catalog;
pub mod delivery;
pub mod generate;
pub mod store;

pub use catalog::ProductCatalog;
pub use delivery::DeliverySink;
pub use generate::ImageGenerator;
pub use store::ObjectStore;
