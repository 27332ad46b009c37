// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Dreamsmith - a chat bot that turns prompts into images and product
//! listings, metered by a per-user credit ledger.
//!
//! This is the binary entry point.

#[cfg(not(target_env = "msvc"))]
use tikv_jemallocator::Jemalloc;

#[cfg(not(target_env = "msvc"))]
#[global_allocator]
static GLOBAL: Jemalloc = Jemalloc;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use dreamsmith::serve;

/// Dreamsmith - prompt-to-product chat bot service.
#[derive(Parser, Debug)]
#[command(name = "dreamsmith", version, about, long_about = None)]
struct Cli {
    /// Path to a config file, overriding the default lookup hierarchy.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Dreamsmith service.
    Serve,
    /// Print the resolved configuration.
    Config,
}

fn load_config(path: Option<&PathBuf>) -> dreamsmith_config::model::DreamsmithConfig {
    let result = match path {
        Some(path) => dreamsmith_config::load_config_from_path(path),
        None => dreamsmith_config::load_config(),
    };
    match result {
        Ok(config) => config,
        Err(e) => {
            eprintln!("dreamsmith: configuration error: {e}");
            std::process::exit(1);
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let config = load_config(cli.config.as_ref());

    match cli.command {
        Some(Commands::Serve) | None => {
            if let Err(e) = serve::run_serve(config).await {
                eprintln!("dreamsmith: {e}");
                std::process::exit(1);
            }
        }
        Some(Commands::Config) => match toml::to_string_pretty(&config) {
            Ok(rendered) => print!("{rendered}"),
            Err(e) => {
                eprintln!("dreamsmith: failed to render config: {e}");
                std::process::exit(1);
            }
        },
    }
}

#[cfg(test)]
mod tests {
    #[test]
    #[cfg(not(target_env = "msvc"))]
    fn jemalloc_is_active() {
        // Verify jemalloc is the global allocator by advancing the epoch.
        // Only jemalloc supports this -- the system allocator would fail.
        use tikv_jemalloc_ctl::{epoch, stats};
        epoch::advance().unwrap();
        let allocated = stats::allocated::read().unwrap();
        assert!(allocated > 0, "jemalloc should report non-zero allocation");
    }

    #[test]
    fn default_config_renders_as_toml() {
        let config = dreamsmith_config::model::DreamsmithConfig::default();
        let rendered = toml::to_string_pretty(&config).unwrap();
        assert!(rendered.contains("[queues]"));
    }
}
