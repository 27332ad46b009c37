// SPDX-FileCopyrightText: 2026 Dreamsmith Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! End-to-end tests driving the wired service through the command surface
//! with mocked external collaborators.

use std::sync::Arc;
use std::time::Duration;

use dreamsmith::serve::{Collaborators, Service};
use dreamsmith_config::model::DreamsmithConfig;
use dreamsmith_core::types::{ReplyTarget, UserId};
use dreamsmith_credits::CreditLedger;
use dreamsmith_pipeline::{ClaimOutcome, DreamOutcome};
use dreamsmith_test_utils::{MockCatalog, MockImageGenerator, MockObjectStore, MockSink};
use tokio_util::sync::CancellationToken;

const DAY: Duration = Duration::from_secs(86_400);

struct Harness {
    service: Service,
    generator: Arc<MockImageGenerator>,
    store: Arc<MockObjectStore>,
    catalog: Arc<MockCatalog>,
    sink: Arc<MockSink>,
    cancel: CancellationToken,
}

async fn start(config: DreamsmithConfig) -> Harness {
    let ledger = Arc::new(CreditLedger::open_in_memory(DAY).await.unwrap());
    let generator = Arc::new(MockImageGenerator::new());
    let store = Arc::new(MockObjectStore::new());
    let catalog = Arc::new(MockCatalog::new());
    let sink = Arc::new(MockSink::new());

    let collaborators = Collaborators {
        generator: Arc::clone(&generator) as Arc<dyn dreamsmith_core::traits::ImageGenerator>,
        store: Arc::clone(&store) as Arc<dyn dreamsmith_core::traits::ObjectStore>,
        catalog: Arc::clone(&catalog) as Arc<dyn dreamsmith_core::traits::ProductCatalog>,
        sink: Arc::clone(&sink) as Arc<dyn dreamsmith_core::traits::DeliverySink>,
    };

    let cancel = CancellationToken::new();
    let service = Service::start(&config, ledger, collaborators, cancel.clone()).await;
    Harness {
        service,
        generator,
        store,
        catalog,
        sink,
        cancel,
    }
}

async fn wait_for_deliveries(sink: &MockSink, count: usize) {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while sink.delivered_count().await < count {
        assert!(
            tokio::time::Instant::now() < deadline,
            "pipeline did not produce {count} deliveries in time"
        );
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
}

#[tokio::test]
async fn claim_dream_and_receive_image_and_listing() {
    let mut config = DreamsmithConfig::default();
    config.queues.idle_delay_ms = 5;
    let harness = start(config).await;
    let commands = Arc::clone(&harness.service.commands);
    let user = UserId(101);

    // Broke users are turned away before anything is queued.
    let broke = commands
        .dream(user, "ada", "wide mountain vista", ReplyTarget::direct(user))
        .await
        .unwrap();
    assert_eq!(broke, DreamOutcome::InsufficientCredits { balance: 0 });
    assert_eq!(
        broke.user_message(),
        dreamsmith_pipeline::messages::INSUFFICIENT_CREDITS
    );

    let claimed = commands.claim(user).await.unwrap();
    assert_eq!(
        claimed,
        ClaimOutcome::Granted {
            amount: 5,
            balance: 5
        }
    );

    let queued = commands
        .dream(user, "ada", "wide mountain vista", ReplyTarget::direct(user))
        .await
        .unwrap();
    assert_eq!(queued, DreamOutcome::Queued { remaining: 4 });
    assert!(queued.user_message().contains("4 credits remaining"));

    // Image delivery, then the listing URL.
    wait_for_deliveries(&harness.sink, 2).await;

    let calls = harness.generator.calls().await;
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].0, "wide mountain vista");

    let uploads = harness.store.uploads().await;
    assert_eq!(uploads.len(), 1);
    assert!(uploads[0].0.starts_with("atc-"));

    let created = harness.catalog.created().await;
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].vendor, "ada");
    assert_eq!(harness.catalog.associations().await.len(), 1);

    let directs = harness.sink.directs().await;
    assert!(directs[0].1.image_url.is_some(), "first delivery carries the image");
    assert!(
        directs[1]
            .1
            .content
            .as_deref()
            .unwrap()
            .contains("https://shop.example/products/"),
        "second delivery carries the listing URL"
    );

    // The reply context is retired once the listing is delivered.
    assert!(harness.service.registry.is_empty().await);
    assert_eq!(commands.balance(user).await.unwrap(), 4);

    harness.cancel.cancel();
    harness.service.join().await;
}

#[tokio::test]
async fn backpressure_rejection_has_no_net_debit() {
    let mut config = DreamsmithConfig::default();
    config.queues.generation_capacity = 2;
    let harness = start(config).await;
    let commands = Arc::clone(&harness.service.commands);
    let registry = Arc::clone(&harness.service.registry);
    let user = UserId(202);

    // Stop the consumers first so the queue can actually fill.
    harness.cancel.cancel();
    harness.service.join().await;

    commands.claim(user).await.unwrap();

    for prompt in ["first", "second"] {
        let outcome = commands
            .dream(user, "ada", prompt, ReplyTarget::direct(user))
            .await
            .unwrap();
        assert!(matches!(outcome, DreamOutcome::Queued { .. }));
    }

    let rejected = commands
        .dream(user, "ada", "third", ReplyTarget::direct(user))
        .await
        .unwrap();
    assert_eq!(rejected, DreamOutcome::Busy);
    assert_eq!(
        rejected.user_message(),
        dreamsmith_pipeline::messages::TOO_BUSY
    );

    // Two credits spent on the accepted requests, none on the rejection.
    assert_eq!(commands.balance(user).await.unwrap(), 3);
    assert_eq!(registry.len().await, 2);
    assert_eq!(harness.sink.delivered_count().await, 0);
}
