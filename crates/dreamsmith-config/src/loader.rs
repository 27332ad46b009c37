// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Supports XDG hierarchy: `./dreamsmith.toml` > `~/.config/dreamsmith/dreamsmith.toml`
//! > `/etc/dreamsmith/dreamsmith.toml` with environment variable overrides
//! via the `DREAMSMITH_` prefix.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::DreamsmithConfig;

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/dreamsmith/dreamsmith.toml` (system-wide)
/// 3. `~/.config/dreamsmith/dreamsmith.toml` (user XDG config)
/// 4. `./dreamsmith.toml` (local directory)
/// 5. `DREAMSMITH_*` environment variables
pub fn load_config() -> Result<DreamsmithConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DreamsmithConfig::default()))
        .merge(Toml::file("/etc/dreamsmith/dreamsmith.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("dreamsmith/dreamsmith.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("dreamsmith.toml"))
        .merge(env_provider())
        .extract()
}

/// Load configuration from an inline TOML string only (no XDG lookup).
///
/// Used for testing and explicit config specification.
pub fn load_config_from_str(toml_content: &str) -> Result<DreamsmithConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DreamsmithConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<DreamsmithConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(DreamsmithConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Create the environment variable provider using explicit `map()` for
/// section-to-dot mapping.
///
/// Uses `Env::map()` NOT `Env::split("_")` to avoid ambiguity with
/// underscore-containing key names: `DREAMSMITH_CREDITS_CLAIM_AMOUNT` must
/// map to `credits.claim_amount`, not `credits.claim.amount`.
fn env_provider() -> Env {
    Env::prefixed("DREAMSMITH_").map(|key| {
        // `key` is the lowercased env var name with prefix stripped.
        let key_str = key.as_str();
        let mapped = key_str
            .replacen("agent_", "agent.", 1)
            .replacen("ledger_", "ledger.", 1)
            .replacen("credits_", "credits.", 1)
            .replacen("queues_", "queues.", 1)
            .replacen("registry_", "registry.", 1)
            .replacen("product_", "product.", 1)
            .replacen("generation_", "generation.", 1)
            .replacen("storage_api_", "storage_api.", 1)
            .replacen("catalog_", "catalog.", 1);
        mapped.into()
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn inline_toml_overrides_defaults() {
        let config = load_config_from_str(
            r#"
            [credits]
            claim_amount = 10
            generation_cost = 2

            [queues]
            generation_capacity = 5
            "#,
        )
        .unwrap();

        assert_eq!(config.credits.claim_amount, 10);
        assert_eq!(config.credits.generation_cost, 2);
        assert_eq!(config.queues.generation_capacity, 5);
        // Untouched sections keep their defaults.
        assert_eq!(config.queues.product_capacity, 100);
        assert_eq!(config.registry.staleness_secs, 900);
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let result = load_config_from_str(
            r#"
            [credits]
            claim_amonut = 10
            "#,
        );
        assert!(result.is_err(), "typo'd key should be rejected");
    }

    #[test]
    fn empty_config_yields_defaults() {
        let config = load_config_from_str("").unwrap();
        assert_eq!(config.agent.name, "dreamsmith");
        assert_eq!(config.credits.claim_amount, 5);
    }
}
