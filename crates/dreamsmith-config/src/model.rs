// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Dreamsmith bot.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup.

use serde::{Deserialize, Serialize};

/// Top-level Dreamsmith configuration.
///
/// Loaded from TOML files following XDG hierarchy, with environment variable
/// overrides. All sections are optional and default to sensible values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DreamsmithConfig {
    /// Bot identity and logging settings.
    #[serde(default)]
    pub agent: AgentConfig,

    /// Credit ledger backing-store settings.
    #[serde(default)]
    pub ledger: LedgerConfig,

    /// Credit economics: claim grant, cooldown, per-generation cost.
    #[serde(default)]
    pub credits: CreditsConfig,

    /// Work queue capacities and consumer loop cadence.
    #[serde(default)]
    pub queues: QueuesConfig,

    /// Pending-request registry staleness and sweep cadence.
    #[serde(default)]
    pub registry: RegistryConfig,

    /// Product creation defaults.
    #[serde(default)]
    pub product: ProductConfig,

    /// Image generation API settings.
    #[serde(default)]
    pub generation: GenerationConfig,

    /// Object storage API settings.
    #[serde(default)]
    pub storage_api: StorageApiConfig,

    /// Product catalog API settings.
    #[serde(default)]
    pub catalog: CatalogConfig,
}

/// Bot identity and logging configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct AgentConfig {
    /// Display name of the bot.
    #[serde(default = "default_agent_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: default_agent_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_agent_name() -> String {
    "dreamsmith".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Credit ledger backing-store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct LedgerConfig {
    /// Path to the SQLite database file.
    #[serde(default = "default_db_path")]
    pub db_path: String,

    /// Bounded retry count for transient backing-store failures.
    #[serde(default = "default_ledger_retries")]
    pub max_retries: u32,

    /// Base delay for exponential backoff between retries, in milliseconds.
    #[serde(default = "default_retry_base_ms")]
    pub retry_base_ms: u64,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            db_path: default_db_path(),
            max_retries: default_ledger_retries(),
            retry_base_ms: default_retry_base_ms(),
        }
    }
}

fn default_db_path() -> String {
    "dreamsmith.db".to_string()
}

fn default_ledger_retries() -> u32 {
    3
}

fn default_retry_base_ms() -> u64 {
    100
}

/// Credit economics configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CreditsConfig {
    /// Credits granted by a successful daily claim.
    #[serde(default = "default_claim_amount")]
    pub claim_amount: i64,

    /// Cooldown between claims, in seconds.
    #[serde(default = "default_claim_cooldown_secs")]
    pub claim_cooldown_secs: u64,

    /// Credits deducted per image generation request.
    #[serde(default = "default_generation_cost")]
    pub generation_cost: i64,

    /// User id permitted to run admin credit mutations. `None` disables them.
    #[serde(default)]
    pub admin_user: Option<u64>,
}

impl Default for CreditsConfig {
    fn default() -> Self {
        Self {
            claim_amount: default_claim_amount(),
            claim_cooldown_secs: default_claim_cooldown_secs(),
            generation_cost: default_generation_cost(),
            admin_user: None,
        }
    }
}

fn default_claim_amount() -> i64 {
    5
}

fn default_claim_cooldown_secs() -> u64 {
    86_400
}

fn default_generation_cost() -> i64 {
    1
}

/// Work queue and consumer loop configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct QueuesConfig {
    /// Capacity of the image generation queue.
    #[serde(default = "default_generation_capacity")]
    pub generation_capacity: usize,

    /// Capacity of the product creation queue.
    #[serde(default = "default_product_capacity")]
    pub product_capacity: usize,

    /// Consumer sleep when its queue is empty, in milliseconds.
    #[serde(default = "default_idle_delay_ms")]
    pub idle_delay_ms: u64,

    /// Consumer backoff after a failed handler invocation, in milliseconds.
    #[serde(default = "default_error_delay_ms")]
    pub error_delay_ms: u64,

    /// Optional per-item handler timeout, in seconds. `None` leaves handler
    /// execution unbounded, matching the historical behavior.
    #[serde(default)]
    pub handler_timeout_secs: Option<u64>,
}

impl Default for QueuesConfig {
    fn default() -> Self {
        Self {
            generation_capacity: default_generation_capacity(),
            product_capacity: default_product_capacity(),
            idle_delay_ms: default_idle_delay_ms(),
            error_delay_ms: default_error_delay_ms(),
            handler_timeout_secs: None,
        }
    }
}

fn default_generation_capacity() -> usize {
    50
}

fn default_product_capacity() -> usize {
    100
}

fn default_idle_delay_ms() -> u64 {
    100
}

fn default_error_delay_ms() -> u64 {
    1_000
}

/// Pending-request registry configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct RegistryConfig {
    /// Entries older than this are evicted by the sweep, in seconds.
    #[serde(default = "default_staleness_secs")]
    pub staleness_secs: u64,

    /// Interval between sweeps, in seconds.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            staleness_secs: default_staleness_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_staleness_secs() -> u64 {
    900
}

fn default_sweep_interval_secs() -> u64 {
    900
}

/// Product creation defaults.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ProductConfig {
    /// Listing price for created products, as a decimal string.
    #[serde(default = "default_price")]
    pub price: String,
}

impl Default for ProductConfig {
    fn default() -> Self {
        Self {
            price: default_price(),
        }
    }
}

fn default_price() -> String {
    "6.99".to_string()
}

/// Image generation API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GenerationConfig {
    /// API key. `None` requires an environment variable override.
    #[serde(default)]
    pub api_key: Option<String>,

    /// Base endpoint URL of the generation API.
    #[serde(default = "default_generation_endpoint")]
    pub endpoint: String,

    /// Bounded retry count for transient generation failures.
    #[serde(default = "default_generation_retries")]
    pub max_retries: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            endpoint: default_generation_endpoint(),
            max_retries: default_generation_retries(),
        }
    }
}

fn default_generation_endpoint() -> String {
    "https://fal.run/fal-ai/flux-pro".to_string()
}

fn default_generation_retries() -> u32 {
    3
}

/// Object storage API configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageApiConfig {
    /// Base endpoint URL of the storage API.
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Bucket name for uploads.
    #[serde(default)]
    pub bucket: Option<String>,

    /// API key. `None` requires an environment variable override.
    #[serde(default)]
    pub api_key: Option<String>,
}

/// Product catalog API configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CatalogConfig {
    /// Base endpoint URL of the catalog API (shop admin API root).
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Access token. `None` requires an environment variable override.
    #[serde(default)]
    pub token: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_documented_values() {
        let config = DreamsmithConfig::default();
        assert_eq!(config.agent.name, "dreamsmith");
        assert_eq!(config.credits.claim_amount, 5);
        assert_eq!(config.credits.claim_cooldown_secs, 86_400);
        assert_eq!(config.credits.generation_cost, 1);
        assert_eq!(config.queues.generation_capacity, 50);
        assert_eq!(config.queues.product_capacity, 100);
        assert!(config.queues.handler_timeout_secs.is_none());
        assert_eq!(config.registry.staleness_secs, 900);
        assert_eq!(config.product.price, "6.99");
    }
}
