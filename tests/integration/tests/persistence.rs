//! Integration test: engine state survives a store round-trip.
//!
//! Drives real sales through the engine, persists to RocksDB, reopens the
//! store, and checks the rebuilt engine picks up exactly where it left off.

use std::path::PathBuf;

use chrono::{Duration, Utc};
use rifa_core::{Amount, EngineConfig, PaymentMethod, PaymentStatus};
use rifa_engine::{Engine, ParticipantDraft, RaffleDefinition, TicketSelection};
use rifa_store::RaffleStore;

fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("rifa-test-{}", uuid::Uuid::now_v7()));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn populated_engine(config: &EngineConfig) -> (Engine, rifa_core::RaffleId, rifa_core::PaymentId) {
    let engine = Engine::new(config);
    let raffle = engine
        .catalog
        .create(RaffleDefinition {
            title: "Persisted Raffle".into(),
            slug: Some("persisted".into()),
            ticket_price: Amount::from_centavos(2500),
            total_tickets: 20,
            sale_starts_at: Utc::now() - Duration::hours(1),
            sale_ends_at: Utc::now() + Duration::days(30),
            payout_key: "pix:organizer".into(),
        })
        .unwrap();
    engine
        .inventory
        .initialize(raffle.id, 20, Amount::from_centavos(2500))
        .unwrap();

    // One settled sale and one still-pending purchase.
    let settled = engine
        .orchestrator
        .start_purchase(
            raffle.id,
            ParticipantDraft {
                name: "Maria Silva".into(),
                contact: "maria@example.com".into(),
                document: Some("123.456.789-00".into()),
            },
            &TicketSelection::Numbers(vec![5, 6, 7]),
            PaymentMethod::Pix,
        )
        .unwrap();
    engine
        .ledger
        .approve(settled.payment.id, Some("gw-1".into()), Some("proof-1".into()))
        .unwrap();
    engine
        .orchestrator
        .on_payment_approved(settled.payment.id)
        .unwrap();

    let pending = engine
        .orchestrator
        .start_purchase(
            raffle.id,
            ParticipantDraft {
                name: "João Souza".into(),
                contact: "joao@example.com".into(),
                document: None,
            },
            &TicketSelection::Quantity(2),
            PaymentMethod::Card,
        )
        .unwrap();

    (engine, raffle.id, pending.payment.id)
}

#[test]
fn test_engine_state_survives_store_reopen() {
    let dir = temp_dir();
    let config = EngineConfig::default();
    let (engine, raffle_id, pending_payment) = populated_engine(&config);

    {
        let store = RaffleStore::open(&dir).unwrap();
        store.save_snapshot(&engine.snapshot()).unwrap();
    }

    // Reopen the database from disk, as a new CLI invocation would.
    let store = RaffleStore::open(&dir).unwrap();
    let restored = Engine::from_snapshot(&config, store.load_snapshot().unwrap());

    assert_eq!(restored.inventory.sold_count(raffle_id), 3);
    assert_eq!(restored.inventory.available_count(raffle_id), 15);
    assert_eq!(restored.catalog.get(raffle_id).unwrap().tickets_sold, 3);
    assert_eq!(restored.orchestrator.open_purchase_count(), 1);
    assert!(restored.catalog.get_by_slug("persisted").is_some());
    restored.orchestrator.verify_integrity(raffle_id).unwrap();

    // The pending purchase is still live and can settle after the reload.
    let payment = restored.ledger.get(pending_payment).unwrap();
    assert_eq!(payment.status, PaymentStatus::Pending);
    restored
        .ledger
        .approve(pending_payment, Some("gw-2".into()), None)
        .unwrap();
    let confirmed = restored
        .orchestrator
        .on_payment_approved(pending_payment)
        .unwrap();
    assert_eq!(confirmed.status, PaymentStatus::Confirmed);
    assert_eq!(restored.inventory.sold_count(raffle_id), 5);

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_audit_history_survives_reopen() {
    let dir = temp_dir();
    let config = EngineConfig::default();
    let (engine, raffle_id, _) = populated_engine(&config);

    let confirmed_id = engine
        .ledger
        .payments_for_raffle(raffle_id)
        .into_iter()
        .find(|p| p.status == PaymentStatus::Confirmed)
        .map(|p| p.id)
        .unwrap();

    {
        let store = RaffleStore::open(&dir).unwrap();
        store.save_snapshot(&engine.snapshot()).unwrap();
    }

    let store = RaffleStore::open(&dir).unwrap();
    let restored = Engine::from_snapshot(&config, store.load_snapshot().unwrap());

    let history = restored.ledger.history(confirmed_id).unwrap();
    let states: Vec<PaymentStatus> = history.iter().map(|t| t.to).collect();
    assert_eq!(
        states,
        vec![
            PaymentStatus::Pending,
            PaymentStatus::Approved,
            PaymentStatus::Confirmed
        ]
    );

    std::fs::remove_dir_all(&dir).ok();
}

#[test]
fn test_expired_purchase_swept_after_reload() {
    let dir = temp_dir();
    let mut config = EngineConfig::default();
    config.reservation_ttl_secs = 0;
    let (engine, raffle_id, pending_payment) = populated_engine(&config);

    {
        let store = RaffleStore::open(&dir).unwrap();
        store.save_snapshot(&engine.snapshot()).unwrap();
    }

    // The startup sweep a fresh process runs catches the stale reservation.
    let store = RaffleStore::open(&dir).unwrap();
    let restored = Engine::from_snapshot(&config, store.load_snapshot().unwrap());
    assert_eq!(restored.orchestrator.sweep_expired(Utc::now()), 1);

    let payment = restored.ledger.get(pending_payment).unwrap();
    assert_eq!(payment.status, PaymentStatus::Rejected);
    assert_eq!(restored.inventory.available_count(raffle_id), 17);
    restored.orchestrator.verify_integrity(raffle_id).unwrap();

    std::fs::remove_dir_all(&dir).ok();
}
