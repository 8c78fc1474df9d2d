use std::sync::Arc;

use rifa_core::{Draw, EngineConfig, Participant, Payment, Raffle, Ticket};
use serde::{Deserialize, Serialize};

use crate::catalog::RaffleCatalog;
use crate::draw::DrawSelector;
use crate::inventory::TicketInventory;
use crate::ledger::{PaymentLedger, PaymentTransition};
use crate::orchestrator::{Purchase, SettlementOrchestrator};
use crate::registry::ParticipantRegistry;

/// A payment together with its audit trail, as persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub payment: Payment,
    pub history: Vec<PaymentTransition>,
}

/// Full serializable state of the engine, mirroring the five entity tables
/// plus the open purchase records.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EngineSnapshot {
    pub raffles: Vec<Raffle>,
    pub tickets: Vec<Ticket>,
    pub participants: Vec<Participant>,
    pub payments: Vec<PaymentRecord>,
    pub draws: Vec<Draw>,
    pub purchases: Vec<Purchase>,
}

/// The wired-up settlement engine: one handle per component, sharing the
/// same catalog/inventory/ledger underneath.
pub struct Engine {
    pub catalog: Arc<RaffleCatalog>,
    pub inventory: Arc<TicketInventory>,
    pub ledger: Arc<PaymentLedger>,
    pub registry: Arc<ParticipantRegistry>,
    pub orchestrator: Arc<SettlementOrchestrator>,
    pub draws: Arc<DrawSelector>,
}

impl Engine {
    /// Build an empty engine from configuration.
    pub fn new(config: &EngineConfig) -> Self {
        let catalog = Arc::new(RaffleCatalog::new());
        let inventory = Arc::new(TicketInventory::new(Arc::clone(&catalog)));
        let ledger = Arc::new(PaymentLedger::new());
        let registry = Arc::new(ParticipantRegistry::new());
        let orchestrator = Arc::new(SettlementOrchestrator::new(
            Arc::clone(&catalog),
            Arc::clone(&inventory),
            Arc::clone(&ledger),
            Arc::clone(&registry),
            config,
        ));
        let draws = Arc::new(DrawSelector::new(
            Arc::clone(&catalog),
            Arc::clone(&inventory),
        ));
        Self {
            catalog,
            inventory,
            ledger,
            registry,
            orchestrator,
            draws,
        }
    }

    /// Export the full engine state.
    pub fn snapshot(&self) -> EngineSnapshot {
        let raffles = self.catalog.list();
        let mut tickets = Vec::new();
        let mut participants = Vec::new();
        let mut payments = Vec::new();
        let mut draws = Vec::new();
        for raffle in &raffles {
            tickets.extend(self.inventory.tickets(raffle.id));
            participants.extend(self.registry.participants_for_raffle(raffle.id));
            for payment in self.ledger.payments_for_raffle(raffle.id) {
                let history = self.ledger.history(payment.id).unwrap_or_default();
                payments.push(PaymentRecord { payment, history });
            }
            draws.extend(self.draws.draws_for_raffle(raffle.id));
        }
        EngineSnapshot {
            raffles,
            tickets,
            participants,
            payments,
            draws,
            purchases: self.orchestrator.open_purchases(),
        }
    }

    /// Rebuild an engine from a snapshot.
    pub fn from_snapshot(config: &EngineConfig, snapshot: EngineSnapshot) -> Self {
        let engine = Self::new(config);
        for raffle in snapshot.raffles {
            let raffle_id = raffle.id;
            engine.catalog.hydrate(raffle);
            let pool: Vec<Ticket> = snapshot
                .tickets
                .iter()
                .filter(|t| t.raffle_id == raffle_id)
                .cloned()
                .collect();
            engine.inventory.hydrate(raffle_id, pool);
        }
        for participant in snapshot.participants {
            engine.registry.hydrate(participant);
        }
        for record in snapshot.payments {
            engine.ledger.hydrate(record.payment, record.history);
        }
        for draw in snapshot.draws {
            engine.draws.hydrate(draw);
        }
        for purchase in snapshot.purchases {
            engine.orchestrator.hydrate(purchase);
        }
        engine
    }
}
