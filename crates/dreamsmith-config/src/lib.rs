// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration system for the Dreamsmith bot: layered TOML + environment
//! loading via Figment, with strict unknown-key rejection.

pub mod loader;
pub mod model;

pub use loader::{load_config, load_config_from_path, load_config_from_str};
pub use model::DreamsmithConfig;
