use std::collections::HashSet;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use rifa_core::{
    Amount, EngineConfig, Participant, ParticipantId, Payment, PaymentId, PaymentMethod,
    PaymentStatus, RaffleId, TicketId, TicketStatus,
};
use serde::{Deserialize, Serialize};

use crate::catalog::RaffleCatalog;
use crate::error::EngineError;
use crate::inventory::{TicketInventory, TicketSelection};
use crate::ledger::PaymentLedger;
use crate::registry::{ParticipantDraft, ParticipantRegistry};

/// The record tying one payment to the tickets it settles.
///
/// This is the one-payment-many-tickets association: the ledger never needs
/// to know about tickets beyond their prices, and the inventory never needs
/// to know about payments.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Purchase {
    /// The payment settling this purchase.
    pub payment_id: PaymentId,
    /// The raffle the tickets belong to.
    pub raffle_id: RaffleId,
    /// The participant candidate holding the reservation.
    pub participant_id: ParticipantId,
    /// Reserved tickets.
    pub ticket_ids: Vec<TicketId>,
    /// When the reservation lapses.
    pub reserved_until: DateTime<Utc>,
}

/// What the outer layer gets back from a successful purchase start.
#[derive(Debug, Clone)]
pub struct PurchaseReceipt {
    /// The pending payment.
    pub payment: Payment,
    /// The registered participant candidate.
    pub participant: Participant,
    /// The reserved ticket numbers.
    pub ticket_numbers: Vec<u32>,
    /// When the reservation lapses without approval.
    pub reserved_until: DateTime<Utc>,
}

/// Coordinates the ticket inventory and the payment ledger so they never
/// diverge.
///
/// This is the only component that mutates both sides. Each open purchase is
/// tracked in `purchases`; settlement and expiry both *claim* a purchase by
/// removing it from the map before touching either side, so exactly one of
/// them wins for any given payment.
pub struct SettlementOrchestrator {
    catalog: Arc<RaffleCatalog>,
    inventory: Arc<TicketInventory>,
    ledger: Arc<PaymentLedger>,
    registry: Arc<ParticipantRegistry>,
    purchases: DashMap<PaymentId, Purchase>,
    reservation_ttl: Duration,
}

impl SettlementOrchestrator {
    /// Wire up the orchestrator over shared component handles.
    pub fn new(
        catalog: Arc<RaffleCatalog>,
        inventory: Arc<TicketInventory>,
        ledger: Arc<PaymentLedger>,
        registry: Arc<ParticipantRegistry>,
        config: &EngineConfig,
    ) -> Self {
        Self {
            catalog,
            inventory,
            ledger,
            registry,
            purchases: DashMap::new(),
            reservation_ttl: config.reservation_ttl(),
        }
    }

    /// Start a purchase: register the candidate, reserve tickets, and create
    /// a pending payment — all or nothing.
    ///
    /// If payment creation fails after the reservation succeeded, the
    /// reservation is rolled back before the error is returned, and any
    /// failure after registration removes the participant record again. No
    /// dangling reservation without a payment record, and vice versa.
    pub fn start_purchase(
        &self,
        raffle_id: RaffleId,
        candidate: ParticipantDraft,
        selection: &TicketSelection,
        method: PaymentMethod,
    ) -> Result<PurchaseReceipt, EngineError> {
        let now = Utc::now();
        if !self.catalog.is_sale_open(raffle_id, now)? {
            return Err(EngineError::SaleClosed(raffle_id));
        }

        let participant = self.registry.register(raffle_id, candidate)?;
        let reserved_until = now + self.reservation_ttl;
        let tickets = match self
            .inventory
            .reserve(raffle_id, selection, participant.id, reserved_until)
        {
            Ok(tickets) => tickets,
            Err(err) => {
                self.unregister(participant.id);
                return Err(err);
            }
        };

        let mut amount = Amount::zero();
        for ticket in &tickets {
            amount = match amount.checked_add(ticket.price) {
                Ok(total) => total,
                Err(err) => {
                    self.rollback_reservation(raffle_id, &tickets);
                    self.unregister(participant.id);
                    return Err(err.into());
                }
            };
        }

        let payment = match self.ledger.create_pending(
            raffle_id,
            participant.id,
            &tickets,
            amount,
            method,
        ) {
            Ok(payment) => payment,
            Err(err) => {
                self.rollback_reservation(raffle_id, &tickets);
                self.unregister(participant.id);
                return Err(err);
            }
        };

        self.purchases.insert(
            payment.id,
            Purchase {
                payment_id: payment.id,
                raffle_id,
                participant_id: participant.id,
                ticket_ids: tickets.iter().map(|t| t.id).collect(),
                reserved_until,
            },
        );

        tracing::info!(
            payment_id = %payment.id,
            raffle_id = %raffle_id,
            participant_id = %participant.id,
            amount = %amount,
            "purchase started"
        );
        Ok(PurchaseReceipt {
            payment,
            participant,
            ticket_numbers: tickets.iter().map(|t| t.number).collect(),
            reserved_until,
        })
    }

    fn rollback_reservation(&self, raffle_id: RaffleId, tickets: &[rifa_core::Ticket]) {
        let ids: Vec<TicketId> = tickets.iter().map(|t| t.id).collect();
        if let Err(err) = self.inventory.release(raffle_id, &ids) {
            tracing::error!(raffle_id = %raffle_id, %err, "reservation rollback failed");
        }
    }

    fn unregister(&self, participant_id: ParticipantId) {
        if let Err(err) = self.registry.remove(participant_id) {
            tracing::warn!(participant_id = %participant_id, %err, "participant rollback failed");
        }
    }

    /// Settle an approved payment: commit the ticket sale, then confirm.
    ///
    /// If the commit fails (e.g. the reservation already expired), the
    /// payment is forced to rejected with a system-generated reason instead
    /// of being left confirmed with no sale. The resulting guarantee: a
    /// payment is confirmed if and only if its tickets are sold.
    pub fn on_payment_approved(&self, payment_id: PaymentId) -> Result<Payment, EngineError> {
        let payment = self.ledger.get(payment_id)?;
        if payment.status != PaymentStatus::Approved {
            return Err(EngineError::InvalidTransition(format!(
                "payment {} is {}, expected Approved",
                payment_id, payment.status
            )));
        }

        // Claim the purchase — whoever removes it owns the settlement.
        let (_, purchase) = self
            .purchases
            .remove(&payment_id)
            .ok_or(EngineError::PurchaseNotFound(payment_id))?;

        let price = self.catalog.get(purchase.raffle_id)?.ticket_price;
        match self.inventory.commit_sale(
            purchase.raffle_id,
            &purchase.ticket_ids,
            purchase.participant_id,
            price,
            Utc::now(),
        ) {
            Ok(_) => {
                // The payment was verified Approved and the purchase claim is
                // exclusive, so confirmation cannot legitimately fail here.
                let confirmed = self.ledger.confirm(payment_id).map_err(|err| {
                    EngineError::IntegrityViolation(format!(
                        "payment {} could not be confirmed after its tickets were sold: {}",
                        payment_id, err
                    ))
                })?;
                tracing::info!(payment_id = %payment_id, "purchase settled");
                Ok(confirmed)
            }
            Err(commit_err) => {
                let reason = format!("settlement failed: {}", commit_err);
                if let Err(err) = self.ledger.reject(payment_id, &reason) {
                    tracing::warn!(payment_id = %payment_id, %err, "could not reject payment");
                }
                if let Err(err) = self
                    .inventory
                    .release(purchase.raffle_id, &purchase.ticket_ids)
                {
                    tracing::error!(payment_id = %payment_id, %err, "release after failed commit");
                }
                tracing::warn!(payment_id = %payment_id, %commit_err, "settlement rejected");
                Err(commit_err)
            }
        }
    }

    /// Unwind a purchase whose payment was rejected by the gateway or whose
    /// reservation expired: release the tickets and settle the payment into a
    /// terminal state if it is not there already.
    pub fn on_payment_rejected_or_expired(
        &self,
        payment_id: PaymentId,
    ) -> Result<Payment, EngineError> {
        let (_, purchase) = self
            .purchases
            .remove(&payment_id)
            .ok_or(EngineError::PurchaseNotFound(payment_id))?;

        self.inventory
            .release(purchase.raffle_id, &purchase.ticket_ids)?;

        let payment = self.ledger.get(payment_id)?;
        let payment = if payment.status.is_final() {
            payment
        } else {
            self.ledger.cancel(payment_id)?
        };

        tracing::info!(payment_id = %payment_id, status = %payment.status, "purchase unwound");
        Ok(payment)
    }

    /// User- or operator-initiated cancellation of an open purchase.
    pub fn cancel_purchase(&self, payment_id: PaymentId) -> Result<Payment, EngineError> {
        let (_, purchase) = self
            .purchases
            .remove(&payment_id)
            .ok_or(EngineError::PurchaseNotFound(payment_id))?;

        self.inventory
            .release(purchase.raffle_id, &purchase.ticket_ids)?;
        let payment = self.ledger.cancel(payment_id)?;

        tracing::info!(payment_id = %payment_id, "purchase cancelled");
        Ok(payment)
    }

    /// Sweep expired purchases: reject their payments and return their
    /// tickets to the pool. Safe to run concurrently with settlement — a
    /// purchase already claimed by `on_payment_approved` is skipped.
    ///
    /// Returns the number of purchases swept.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> usize {
        let expired: Vec<PaymentId> = self
            .purchases
            .iter()
            .filter(|purchase| purchase.reserved_until <= now)
            .map(|purchase| purchase.payment_id)
            .collect();

        let mut swept = 0;
        for payment_id in expired {
            // Claim or skip — settlement may have won the race.
            let Some((_, purchase)) = self.purchases.remove(&payment_id) else {
                continue;
            };

            if let Err(err) = self
                .inventory
                .release(purchase.raffle_id, &purchase.ticket_ids)
            {
                tracing::error!(payment_id = %payment_id, %err, "release during sweep");
            }
            match self.ledger.reject(payment_id, "reservation expired") {
                Ok(_) => swept += 1,
                Err(err) => {
                    tracing::warn!(payment_id = %payment_id, %err, "payment already settled");
                }
            }
        }

        // Catch reserved tickets with no live purchase record.
        let orphaned = self.inventory.expire_reservations(now);
        if !orphaned.is_empty() {
            tracing::warn!(count = orphaned.len(), "orphaned reservations expired");
        }

        if swept > 0 {
            tracing::info!(swept, "expired purchases swept");
        }
        swept
    }

    /// Delete a participant, clearing the weak references tickets hold to it.
    /// Tickets themselves are never deleted.
    pub fn remove_participant(
        &self,
        participant_id: ParticipantId,
    ) -> Result<Participant, EngineError> {
        let participant = self.registry.remove(participant_id)?;
        self.inventory.clear_participant(participant_id);
        Ok(participant)
    }

    /// The purchase record for an open (unsettled) payment, if any.
    pub fn open_purchase(&self, payment_id: PaymentId) -> Option<Purchase> {
        self.purchases.get(&payment_id).map(|entry| entry.clone())
    }

    /// Number of open purchases.
    pub fn open_purchase_count(&self) -> usize {
        self.purchases.len()
    }

    /// Load an open purchase wholesale (snapshot hydration).
    pub fn hydrate(&self, purchase: Purchase) {
        self.purchases.insert(purchase.payment_id, purchase);
    }

    /// All open purchases (snapshot export).
    pub fn open_purchases(&self) -> Vec<Purchase> {
        self.purchases.iter().map(|entry| entry.clone()).collect()
    }

    /// Cross-check the invariants that must never break.
    ///
    /// A failure here is not a user error — it means the engine's contracts
    /// were violated and an operator must intervene. Nothing is repaired.
    pub fn verify_integrity(&self, raffle_id: RaffleId) -> Result<(), EngineError> {
        let raffle = self.catalog.get(raffle_id)?;
        let sold = self.inventory.sold_tickets(raffle_id);

        if raffle.tickets_sold as usize != sold.len() {
            return Err(EngineError::IntegrityViolation(format!(
                "raffle {}: sold counter is {} but {} tickets are sold",
                raffle_id,
                raffle.tickets_sold,
                sold.len()
            )));
        }
        if sold.len() > raffle.total_tickets as usize {
            return Err(EngineError::IntegrityViolation(format!(
                "raffle {}: {} sold tickets exceed pool size {}",
                raffle_id,
                sold.len(),
                raffle.total_tickets
            )));
        }

        let mut numbers = HashSet::new();
        for ticket in &sold {
            if !numbers.insert(ticket.number) {
                return Err(EngineError::IntegrityViolation(format!(
                    "raffle {}: duplicate sold ticket number {}",
                    raffle_id, ticket.number
                )));
            }
        }

        let mut confirmed_total = Amount::zero();
        for payment in self.ledger.payments_for_raffle(raffle_id) {
            if payment.status != PaymentStatus::Confirmed {
                continue;
            }
            confirmed_total = confirmed_total.checked_add(payment.amount)?;
            for ticket_id in &payment.ticket_ids {
                let ticket = self
                    .inventory
                    .ticket(raffle_id, *ticket_id)
                    .ok_or(EngineError::TicketNotFound(*ticket_id))?;
                if ticket.status != TicketStatus::Sold {
                    return Err(EngineError::IntegrityViolation(format!(
                        "payment {} is confirmed but ticket {} is {}",
                        payment.id, ticket.number, ticket.status
                    )));
                }
            }
        }

        let mut sold_total = Amount::zero();
        for ticket in &sold {
            sold_total = sold_total.checked_add(ticket.price)?;
        }
        if confirmed_total != sold_total {
            return Err(EngineError::IntegrityViolation(format!(
                "raffle {}: confirmed payments total {} but sold tickets total {}",
                raffle_id, confirmed_total, sold_total
            )));
        }

        Ok(())
    }
}
