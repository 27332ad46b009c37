// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `dreamsmith serve` command implementation.
//!
//! Opens the credit ledger, builds the two bounded queues and the pending
//! registry, spawns a consumer loop per queue plus the registry sweeper,
//! and waits for a shutdown signal. The [`CommandService`] handed back by
//! [`Service::start`] is the surface a chat adapter calls into.

use std::sync::Arc;
use std::time::Duration;

use dreamsmith_clients::{FluxClient, ShopCatalogClient, StorageApiClient};
use dreamsmith_config::model::DreamsmithConfig;
use dreamsmith_core::error::DreamsmithError;
use dreamsmith_core::traits::{DeliverySink, ImageGenerator, ObjectStore, ProductCatalog};
use dreamsmith_core::types::UserId;
use dreamsmith_credits::CreditLedger;
use dreamsmith_pipeline::{
    CommandService, GenerationHandler, GenerationRequest, ProductCreationHandler, ProductRequest,
};
use dreamsmith_queue::{
    BoundedQueue, ConsumerLoop, ConsumerOptions, PendingRegistry, run_sweeper,
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use crate::shutdown;
use crate::sink::LogSink;

/// The external collaborators behind the pipeline traits.
///
/// Production wiring uses the HTTP clients; tests substitute mocks.
pub struct Collaborators {
    pub generator: Arc<dyn ImageGenerator>,
    pub store: Arc<dyn ObjectStore>,
    pub catalog: Arc<dyn ProductCatalog>,
    pub sink: Arc<dyn DeliverySink>,
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}

/// A running Dreamsmith service: command surface plus background tasks.
pub struct Service {
    /// Entry point for user and admin commands.
    pub commands: Arc<CommandService>,
    /// Reply-context registry shared with the pipeline.
    pub registry: Arc<PendingRegistry>,
    tasks: Vec<JoinHandle<()>>,
}

impl Service {
    /// Build the full pipeline and spawn its background tasks.
    pub async fn start(
        config: &DreamsmithConfig,
        ledger: Arc<CreditLedger>,
        collaborators: Collaborators,
        cancel: CancellationToken,
    ) -> Self {
        let registry = Arc::new(PendingRegistry::new());
        let generation_queue: Arc<BoundedQueue<GenerationRequest>> = Arc::new(BoundedQueue::new(
            "generation",
            config.queues.generation_capacity,
        ));
        let product_queue: Arc<BoundedQueue<ProductRequest>> =
            Arc::new(BoundedQueue::new("product", config.queues.product_capacity));

        let options = ConsumerOptions {
            idle_delay: Duration::from_millis(config.queues.idle_delay_ms),
            error_delay: Duration::from_millis(config.queues.error_delay_ms),
            handler_timeout: config.queues.handler_timeout_secs.map(Duration::from_secs),
        };

        let generation_handler = Arc::new(GenerationHandler::new(
            collaborators.generator,
            collaborators.store,
            Arc::clone(&collaborators.sink),
            Arc::clone(&registry),
            Arc::clone(&product_queue),
            config.product.price.clone(),
            config.generation.max_retries,
        ));
        let product_handler = Arc::new(ProductCreationHandler::new(
            collaborators.catalog,
            Arc::clone(&collaborators.sink),
            Arc::clone(&registry),
        ));

        let mut tasks = Vec::new();

        let gen_loop = ConsumerLoop::new(Arc::clone(&generation_queue), options.clone());
        let gen_cancel = cancel.clone();
        tasks.push(tokio::spawn(async move {
            gen_loop.run(generation_handler, gen_cancel).await;
        }));

        let product_loop = ConsumerLoop::new(Arc::clone(&product_queue), options);
        let product_cancel = cancel.clone();
        tasks.push(tokio::spawn(async move {
            product_loop.run(product_handler, product_cancel).await;
        }));

        tasks.push(tokio::spawn(run_sweeper(
            Arc::clone(&registry),
            Duration::from_secs(config.registry.sweep_interval_secs),
            Duration::from_secs(config.registry.staleness_secs),
            cancel.clone(),
        )));

        let commands = Arc::new(CommandService::new(
            ledger,
            Arc::clone(&registry),
            generation_queue,
            config.credits.generation_cost,
            config.credits.claim_amount,
            config.credits.admin_user.map(UserId),
        ));

        Self {
            commands,
            registry,
            tasks,
        }
    }

    /// Wait for all background tasks to finish. Call after cancellation.
    pub async fn join(self) {
        for task in self.tasks {
            let _ = task.await;
        }
    }
}

/// Build the HTTP clients from config. Fails fast on missing credentials.
fn build_collaborators(config: &DreamsmithConfig) -> Result<Collaborators, DreamsmithError> {
    let generation_key = config
        .generation
        .api_key
        .as_deref()
        .ok_or_else(|| DreamsmithError::Config("generation.api_key is required".to_string()))?;
    let generator = FluxClient::new(generation_key, config.generation.endpoint.clone())?;

    let storage_endpoint = config
        .storage_api
        .endpoint
        .clone()
        .ok_or_else(|| DreamsmithError::Config("storage_api.endpoint is required".to_string()))?;
    let storage_bucket = config
        .storage_api
        .bucket
        .clone()
        .ok_or_else(|| DreamsmithError::Config("storage_api.bucket is required".to_string()))?;
    let storage_key = config
        .storage_api
        .api_key
        .as_deref()
        .ok_or_else(|| DreamsmithError::Config("storage_api.api_key is required".to_string()))?;
    let store = StorageApiClient::new(storage_key, storage_endpoint, storage_bucket)?;

    let catalog_endpoint = config
        .catalog
        .endpoint
        .clone()
        .ok_or_else(|| DreamsmithError::Config("catalog.endpoint is required".to_string()))?;
    let catalog_token = config
        .catalog
        .token
        .as_deref()
        .ok_or_else(|| DreamsmithError::Config("catalog.token is required".to_string()))?;
    let catalog = ShopCatalogClient::new(catalog_token, catalog_endpoint)?;

    Ok(Collaborators {
        generator: Arc::new(generator),
        store: Arc::new(store),
        catalog: Arc::new(catalog),
        sink: Arc::new(LogSink),
    })
}

/// Runs the `dreamsmith serve` command until a shutdown signal arrives.
pub async fn run_serve(config: DreamsmithConfig) -> Result<(), DreamsmithError> {
    init_tracing(&config.agent.log_level);
    info!(name = %config.agent.name, "starting dreamsmith");

    let ledger = Arc::new(
        CreditLedger::open(
            &config.ledger.db_path,
            config.ledger.max_retries,
            Duration::from_millis(config.ledger.retry_base_ms),
            Duration::from_secs(config.credits.claim_cooldown_secs),
        )
        .await?,
    );

    let collaborators = build_collaborators(&config)?;
    let cancel = shutdown::install_signal_handler();
    let service = Service::start(&config, ledger, collaborators, cancel.clone()).await;

    info!(
        generation_capacity = config.queues.generation_capacity,
        product_capacity = config.queues.product_capacity,
        "dreamsmith ready"
    );

    cancel.cancelled().await;
    info!("shutting down, draining background tasks");
    service.join().await;
    info!("dreamsmith stopped");
    Ok(())
}

/// Initializes the tracing subscriber with the given log level.
fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("dreamsmith={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
