//! Integration test: Full raffle lifecycle across crates.
//!
//! Exercises the catalog → inventory → ledger → orchestrator → draw flow
//! through the wired-up engine, the way the CLI drives it.

use chrono::{Duration, Utc};
use rand::rngs::StdRng;
use rand::SeedableRng;
use rifa_core::{Amount, EngineConfig, PaymentMethod, PaymentStatus, RaffleStatus, TicketStatus};
use rifa_engine::{Engine, EngineError, ParticipantDraft, RaffleDefinition, TicketSelection};

/// Helper: a fresh engine with one open raffle of `total` tickets at 10.00.
fn engine_with_raffle(total: u32) -> (Engine, rifa_core::RaffleId) {
    let config = EngineConfig::default();
    let engine = Engine::new(&config);
    let raffle = engine
        .catalog
        .create(RaffleDefinition {
            title: "Rifa do Churrasco".into(),
            slug: Some("churrasco".into()),
            ticket_price: Amount::from_centavos(1000),
            total_tickets: total,
            sale_starts_at: Utc::now() - Duration::hours(1),
            sale_ends_at: Utc::now() + Duration::days(30),
            payout_key: "pix:organizer@example.com".into(),
        })
        .expect("raffle creation should succeed");
    engine
        .inventory
        .initialize(raffle.id, total, Amount::from_centavos(1000))
        .expect("pool initialization should succeed");
    (engine, raffle.id)
}

fn buyer(name: &str) -> ParticipantDraft {
    ParticipantDraft {
        name: name.to_string(),
        contact: format!("{}@example.com", name.to_lowercase()),
        document: None,
    }
}

// =========================================================================
// Happy path: sell out, settle, close, draw
// =========================================================================

#[test]
fn test_sell_settle_close_and_draw() {
    let (engine, raffle_id) = engine_with_raffle(10);

    // Three buyers take specific numbers, by quantity, and the remainder.
    let selections = [
        TicketSelection::Numbers(vec![7, 4]),
        TicketSelection::Quantity(3),
        TicketSelection::Quantity(5),
    ];
    let mut payment_ids = Vec::new();
    for (i, selection) in selections.iter().enumerate() {
        let receipt = engine
            .orchestrator
            .start_purchase(
                raffle_id,
                buyer(&format!("Buyer{i}")),
                selection,
                PaymentMethod::Pix,
            )
            .expect("purchase should start");
        payment_ids.push(receipt.payment.id);
    }
    assert_eq!(engine.inventory.available_count(raffle_id), 0);
    assert_eq!(engine.inventory.sold_count(raffle_id), 0);

    // Gateway approves every payment; each one settles into a sale.
    for payment_id in &payment_ids {
        engine
            .ledger
            .approve(*payment_id, Some("gw-txn".into()), None)
            .unwrap();
        let settled = engine.orchestrator.on_payment_approved(*payment_id).unwrap();
        assert_eq!(settled.status, PaymentStatus::Confirmed);
    }
    assert_eq!(engine.inventory.sold_count(raffle_id), 10);
    assert_eq!(engine.catalog.get(raffle_id).unwrap().tickets_sold, 10);
    engine.orchestrator.verify_integrity(raffle_id).unwrap();

    // Close and draw with a fixed seed.
    let closed = engine.catalog.close(raffle_id).unwrap();
    assert_eq!(closed.status, RaffleStatus::Closed);

    let draw = engine.draws.schedule(raffle_id, Utc::now()).unwrap();
    let mut rng = StdRng::seed_from_u64(2024);
    let realized = engine.draws.execute(draw.id, &mut rng).unwrap();

    let winning_ticket = engine
        .inventory
        .ticket(raffle_id, realized.winning_ticket.unwrap())
        .unwrap();
    assert_eq!(winning_ticket.status, TicketStatus::Sold);
    assert!(winning_ticket.participant_id.is_some());
    assert_eq!(Some(winning_ticket.number), realized.winning_number);
}

#[test]
fn test_payment_history_records_every_transition() {
    let (engine, raffle_id) = engine_with_raffle(5);
    let receipt = engine
        .orchestrator
        .start_purchase(
            raffle_id,
            buyer("Maria"),
            &TicketSelection::Quantity(2),
            PaymentMethod::Card,
        )
        .unwrap();

    engine.ledger.approve(receipt.payment.id, None, None).unwrap();
    engine.orchestrator.on_payment_approved(receipt.payment.id).unwrap();

    let history = engine.ledger.history(receipt.payment.id).unwrap();
    let states: Vec<PaymentStatus> = history.iter().map(|t| t.to).collect();
    assert_eq!(
        states,
        vec![
            PaymentStatus::Pending,
            PaymentStatus::Approved,
            PaymentStatus::Confirmed
        ]
    );
}

// =========================================================================
// Unhappy paths: rejection, expiry, oversell
// =========================================================================

#[test]
fn test_rejected_payment_returns_tickets() {
    let (engine, raffle_id) = engine_with_raffle(5);
    let receipt = engine
        .orchestrator
        .start_purchase(
            raffle_id,
            buyer("Carlos"),
            &TicketSelection::Numbers(vec![2, 4]),
            PaymentMethod::Card,
        )
        .unwrap();

    engine
        .ledger
        .reject(receipt.payment.id, "card declined")
        .unwrap();
    engine
        .orchestrator
        .on_payment_rejected_or_expired(receipt.payment.id)
        .unwrap();

    // The same numbers are immediately sellable again.
    assert_eq!(engine.inventory.available_count(raffle_id), 5);
    let receipt2 = engine
        .orchestrator
        .start_purchase(
            raffle_id,
            buyer("Ana"),
            &TicketSelection::Numbers(vec![2, 4]),
            PaymentMethod::Pix,
        )
        .unwrap();
    assert_eq!(receipt2.ticket_numbers, vec![2, 4]);
}

#[test]
fn test_expired_reservation_cannot_settle() {
    let mut config = EngineConfig::default();
    config.reservation_ttl_secs = 0;
    let engine = Engine::new(&config);
    let raffle = engine
        .catalog
        .create(RaffleDefinition {
            title: "Short TTL".into(),
            slug: None,
            ticket_price: Amount::from_centavos(1000),
            total_tickets: 5,
            sale_starts_at: Utc::now() - Duration::hours(1),
            sale_ends_at: Utc::now() + Duration::days(1),
            payout_key: "pix:test".into(),
        })
        .unwrap();
    engine
        .inventory
        .initialize(raffle.id, 5, Amount::from_centavos(1000))
        .unwrap();

    let receipt = engine
        .orchestrator
        .start_purchase(
            raffle.id,
            buyer("Lagger"),
            &TicketSelection::Quantity(2),
            PaymentMethod::Pix,
        )
        .unwrap();

    // The sweep claims the purchase before the approval lands.
    assert_eq!(engine.orchestrator.sweep_expired(Utc::now()), 1);
    engine.ledger.approve(receipt.payment.id, None, None).unwrap_err();

    let payment = engine.ledger.get(receipt.payment.id).unwrap();
    assert_eq!(payment.status, PaymentStatus::Rejected);
    assert_eq!(engine.inventory.available_count(raffle.id), 5);
    engine.orchestrator.verify_integrity(raffle.id).unwrap();
}

#[test]
fn test_oversell_is_rejected_whole() {
    let (engine, raffle_id) = engine_with_raffle(3);
    engine
        .orchestrator
        .start_purchase(
            raffle_id,
            buyer("First"),
            &TicketSelection::Quantity(2),
            PaymentMethod::Pix,
        )
        .unwrap();

    // Asking for more than remains fails without taking the remainder.
    let result = engine.orchestrator.start_purchase(
        raffle_id,
        buyer("Greedy"),
        &TicketSelection::Quantity(2),
        PaymentMethod::Pix,
    );
    assert!(matches!(
        result,
        Err(EngineError::InsufficientInventory {
            available: 1,
            requested: 2
        })
    ));
    assert_eq!(engine.inventory.available_count(raffle_id), 1);
}

#[test]
fn test_draw_on_open_raffle_is_refused() {
    let (engine, raffle_id) = engine_with_raffle(5);
    let receipt = engine
        .orchestrator
        .start_purchase(
            raffle_id,
            buyer("Maria"),
            &TicketSelection::Quantity(1),
            PaymentMethod::Pix,
        )
        .unwrap();
    engine.ledger.approve(receipt.payment.id, None, None).unwrap();
    engine.orchestrator.on_payment_approved(receipt.payment.id).unwrap();

    let draw = engine.draws.schedule(raffle_id, Utc::now()).unwrap();
    let mut rng = StdRng::seed_from_u64(5);
    assert!(matches!(
        engine.draws.execute(draw.id, &mut rng),
        Err(EngineError::NoEligibleTickets(_))
    ));
}
