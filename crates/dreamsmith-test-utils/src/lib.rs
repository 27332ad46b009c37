// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Deterministic mock implementations of the Dreamsmith collaborator traits
//! for unit and end-to-end tests: a scripted image generator, in-memory
//! object store and product catalog, and a capturing delivery sink with
//! per-tier failure switches.

pub mod mock_clients;
pub mod mock_sink;

pub use mock_clients::{MockCatalog, MockImageGenerator, MockObjectStore, mock_collaborators};
pub use mock_sink::{MockSink, TierFailure};
