use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rifa_core::{
    Amount, ParticipantId, Payment, PaymentEvent, PaymentId, PaymentMethod, PaymentStateMachine,
    PaymentStatus, RaffleId, Ticket,
};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// One recorded state change of a payment.
///
/// Transitions are append-only; the full history of a payment is always
/// retrievable for audit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PaymentTransition {
    /// State before the transition; `None` for the creation record.
    pub from: Option<PaymentStatus>,
    /// State after the transition.
    pub to: PaymentStatus,
    /// When the transition happened.
    pub at: DateTime<Utc>,
    /// Free-form context (rejection reason, external txn id, ...).
    pub note: Option<String>,
}

struct LedgerEntry {
    payment: Payment,
    history: Vec<PaymentTransition>,
}

/// Tracks the payment lifecycle, independent of which tickets a payment
/// settles.
///
/// State transitions go through [`PaymentStateMachine`], so an invalid move
/// (e.g. confirming a pending payment) is rejected before anything mutates.
pub struct PaymentLedger {
    payments: DashMap<PaymentId, LedgerEntry>,
}

impl PaymentLedger {
    /// Create a new, empty ledger.
    pub fn new() -> Self {
        Self {
            payments: DashMap::new(),
        }
    }

    /// Record a new pending payment for a set of tickets.
    ///
    /// Fails with `AmountMismatch` if `amount` does not equal the sum of the
    /// ticket prices.
    pub fn create_pending(
        &self,
        raffle_id: RaffleId,
        participant_id: ParticipantId,
        tickets: &[Ticket],
        amount: Amount,
        method: PaymentMethod,
    ) -> Result<Payment, EngineError> {
        let mut expected = Amount::zero();
        for ticket in tickets {
            expected = expected.checked_add(ticket.price)?;
        }
        if amount != expected {
            return Err(EngineError::AmountMismatch {
                expected,
                actual: amount,
            });
        }

        let now = Utc::now();
        let payment = Payment {
            id: PaymentId::new(),
            raffle_id,
            participant_id,
            ticket_ids: tickets.iter().map(|t| t.id).collect(),
            amount,
            method,
            status: PaymentStatus::Pending,
            external_txn_id: None,
            proof_ref: None,
            approved_at: None,
            rejection_reason: None,
            created_at: now,
        };
        self.payments.insert(
            payment.id,
            LedgerEntry {
                payment: payment.clone(),
                history: vec![PaymentTransition {
                    from: None,
                    to: PaymentStatus::Pending,
                    at: now,
                    note: None,
                }],
            },
        );

        tracing::info!(
            payment_id = %payment.id,
            raffle_id = %raffle_id,
            amount = %amount,
            method = %method,
            "payment created"
        );
        Ok(payment)
    }

    /// Approve a pending payment with the gateway's references.
    pub fn approve(
        &self,
        payment_id: PaymentId,
        external_txn_id: Option<String>,
        proof_ref: Option<String>,
    ) -> Result<Payment, EngineError> {
        let mut entry = self
            .payments
            .get_mut(&payment_id)
            .ok_or(EngineError::PaymentNotFound(payment_id))?;
        let entry = entry.value_mut();

        let from = entry.payment.status;
        let to = PaymentStateMachine::transition(from, PaymentEvent::Approved)?;

        let now = Utc::now();
        entry.payment.status = to;
        entry.payment.external_txn_id = external_txn_id.clone();
        entry.payment.proof_ref = proof_ref;
        entry.payment.approved_at = Some(now);
        entry.history.push(PaymentTransition {
            from: Some(from),
            to,
            at: now,
            note: external_txn_id,
        });

        tracing::info!(payment_id = %payment_id, "payment approved");
        Ok(entry.payment.clone())
    }

    /// Reject a pending or approved payment, recording the reason.
    pub fn reject(&self, payment_id: PaymentId, reason: &str) -> Result<Payment, EngineError> {
        let mut entry = self
            .payments
            .get_mut(&payment_id)
            .ok_or(EngineError::PaymentNotFound(payment_id))?;
        let entry = entry.value_mut();

        let from = entry.payment.status;
        let to = PaymentStateMachine::transition(from, PaymentEvent::Rejected)?;

        let now = Utc::now();
        entry.payment.status = to;
        entry.payment.rejection_reason = Some(reason.to_string());
        entry.history.push(PaymentTransition {
            from: Some(from),
            to,
            at: now,
            note: Some(reason.to_string()),
        });

        tracing::info!(payment_id = %payment_id, reason, "payment rejected");
        Ok(entry.payment.clone())
    }

    /// Confirm an approved payment.
    ///
    /// This is the point at which the orchestrator is authorized to treat the
    /// associated ticket sale as final.
    pub fn confirm(&self, payment_id: PaymentId) -> Result<Payment, EngineError> {
        let mut entry = self
            .payments
            .get_mut(&payment_id)
            .ok_or(EngineError::PaymentNotFound(payment_id))?;
        let entry = entry.value_mut();

        let from = entry.payment.status;
        let to = PaymentStateMachine::transition(from, PaymentEvent::Confirmed)?;

        entry.payment.status = to;
        entry.history.push(PaymentTransition {
            from: Some(from),
            to,
            at: Utc::now(),
            note: None,
        });

        tracing::info!(payment_id = %payment_id, "payment confirmed");
        Ok(entry.payment.clone())
    }

    /// Cancel a payment in any non-terminal state.
    pub fn cancel(&self, payment_id: PaymentId) -> Result<Payment, EngineError> {
        let mut entry = self
            .payments
            .get_mut(&payment_id)
            .ok_or(EngineError::PaymentNotFound(payment_id))?;
        let entry = entry.value_mut();

        let from = entry.payment.status;
        let to = PaymentStateMachine::transition(from, PaymentEvent::Cancelled)?;

        entry.payment.status = to;
        entry.history.push(PaymentTransition {
            from: Some(from),
            to,
            at: Utc::now(),
            note: None,
        });

        tracing::info!(payment_id = %payment_id, "payment cancelled");
        Ok(entry.payment.clone())
    }

    /// Get a payment by its ID.
    pub fn get(&self, payment_id: PaymentId) -> Result<Payment, EngineError> {
        self.payments
            .get(&payment_id)
            .map(|entry| entry.payment.clone())
            .ok_or(EngineError::PaymentNotFound(payment_id))
    }

    /// Full transition history of a payment, oldest first.
    pub fn history(&self, payment_id: PaymentId) -> Result<Vec<PaymentTransition>, EngineError> {
        self.payments
            .get(&payment_id)
            .map(|entry| entry.history.clone())
            .ok_or(EngineError::PaymentNotFound(payment_id))
    }

    /// All payments recorded against a raffle.
    pub fn payments_for_raffle(&self, raffle_id: RaffleId) -> Vec<Payment> {
        self.payments
            .iter()
            .filter(|entry| entry.payment.raffle_id == raffle_id)
            .map(|entry| entry.payment.clone())
            .collect()
    }

    /// Load a payment and its audit trail wholesale (snapshot hydration).
    ///
    /// An empty history gets a single synthetic record carrying the current
    /// state, so `history` never returns nothing for a known payment.
    pub fn hydrate(&self, payment: Payment, history: Vec<PaymentTransition>) {
        let history = if history.is_empty() {
            vec![PaymentTransition {
                from: None,
                to: payment.status,
                at: payment.created_at,
                note: Some("hydrated from snapshot".into()),
            }]
        } else {
            history
        };
        self.payments.insert(payment.id, LedgerEntry { payment, history });
    }

    /// Number of payments in the ledger.
    pub fn len(&self) -> usize {
        self.payments.len()
    }

    /// Check if the ledger is empty.
    pub fn is_empty(&self) -> bool {
        self.payments.is_empty()
    }
}

impl Default for PaymentLedger {
    fn default() -> Self {
        Self::new()
    }
}
