//! Integration test: concurrent purchases never double-book a ticket.
//!
//! Hammers a small ticket pool from many threads through the orchestrator
//! and checks the inventory invariants afterwards.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::{Duration, Utc};
use rifa_core::{Amount, EngineConfig, PaymentMethod};
use rifa_engine::{Engine, EngineError, ParticipantDraft, RaffleDefinition, TicketSelection};

fn engine_with_raffle(total: u32) -> (Arc<Engine>, rifa_core::RaffleId) {
    let config = EngineConfig::default();
    let engine = Engine::new(&config);
    let raffle = engine
        .catalog
        .create(RaffleDefinition {
            title: "Contended Raffle".into(),
            slug: None,
            ticket_price: Amount::from_centavos(500),
            total_tickets: total,
            sale_starts_at: Utc::now() - Duration::hours(1),
            sale_ends_at: Utc::now() + Duration::days(1),
            payout_key: "pix:test".into(),
        })
        .unwrap();
    engine
        .inventory
        .initialize(raffle.id, total, Amount::from_centavos(500))
        .unwrap();
    (Arc::new(engine), raffle.id)
}

fn racer(i: usize) -> ParticipantDraft {
    ParticipantDraft {
        name: format!("Racer {i}"),
        contact: format!("racer{i}@example.com"),
        document: None,
    }
}

#[test]
fn test_quantity_purchases_never_exceed_pool() {
    let (engine, raffle_id) = engine_with_raffle(40);

    // 8 threads each try to buy 10 tickets; at most 4 can win.
    let mut handles = Vec::new();
    for i in 0..8 {
        let engine = Arc::clone(&engine);
        handles.push(std::thread::spawn(move || {
            engine.orchestrator.start_purchase(
                raffle_id,
                racer(i),
                &TicketSelection::Quantity(10),
                PaymentMethod::Pix,
            )
        }));
    }

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let receipts: Vec<_> = results.into_iter().filter_map(|r| r.ok()).collect();
    assert_eq!(receipts.len(), 4);
    assert_eq!(engine.inventory.available_count(raffle_id), 0);

    // No ticket number appears in two receipts.
    let mut seen = HashSet::new();
    for receipt in &receipts {
        for number in &receipt.ticket_numbers {
            assert!(seen.insert(*number), "number {number} booked twice");
        }
    }
    assert_eq!(seen.len(), 40);
}

#[test]
fn test_same_number_has_a_single_winner() {
    let (engine, raffle_id) = engine_with_raffle(10);

    let mut handles = Vec::new();
    for i in 0..6 {
        let engine = Arc::clone(&engine);
        handles.push(std::thread::spawn(move || {
            engine.orchestrator.start_purchase(
                raffle_id,
                racer(i),
                &TicketSelection::Numbers(vec![7]),
                PaymentMethod::Pix,
            )
        }));
    }

    let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
    let wins = results.iter().filter(|r| r.is_ok()).count();
    let losses = results
        .iter()
        .filter(|r| matches!(r, Err(EngineError::TicketUnavailable { number: 7 })))
        .count();
    assert_eq!(wins, 1);
    assert_eq!(losses, 5);
}

#[test]
fn test_settlement_races_sweep_exactly_one_wins() {
    // With a zero TTL the sweeper is always eligible to claim the purchase;
    // whichever side claims first owns the outcome and the engine stays
    // consistent either way.
    let mut config = EngineConfig::default();
    config.reservation_ttl_secs = 0;
    let engine = Engine::new(&config);
    let raffle = engine
        .catalog
        .create(RaffleDefinition {
            title: "Race Raffle".into(),
            slug: None,
            ticket_price: Amount::from_centavos(500),
            total_tickets: 25,
            sale_starts_at: Utc::now() - Duration::hours(1),
            sale_ends_at: Utc::now() + Duration::days(1),
            payout_key: "pix:test".into(),
        })
        .unwrap();
    engine
        .inventory
        .initialize(raffle.id, 25, Amount::from_centavos(500))
        .unwrap();
    let engine = Arc::new(engine);

    for round in 0..20 {
        let receipt = engine
            .orchestrator
            .start_purchase(
                raffle.id,
                racer(round),
                &TicketSelection::Quantity(1),
                PaymentMethod::Pix,
            )
            .unwrap();
        engine.ledger.approve(receipt.payment.id, None, None).unwrap();

        let settler = {
            let engine = Arc::clone(&engine);
            let payment_id = receipt.payment.id;
            std::thread::spawn(move || engine.orchestrator.on_payment_approved(payment_id))
        };
        let sweeper = {
            let engine = Arc::clone(&engine);
            std::thread::spawn(move || engine.orchestrator.sweep_expired(Utc::now()))
        };
        let settled = settler.join().unwrap();
        sweeper.join().unwrap();

        let payment = engine.ledger.get(receipt.payment.id).unwrap();
        match settled {
            Ok(_) => assert_eq!(payment.status, rifa_core::PaymentStatus::Confirmed),
            Err(_) => assert_eq!(payment.status, rifa_core::PaymentStatus::Rejected),
        }
        engine.orchestrator.verify_integrity(raffle.id).unwrap();
    }
}
