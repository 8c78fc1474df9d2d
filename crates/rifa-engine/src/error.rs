use rifa_core::{
    Amount, CoreError, DrawId, ParticipantId, PaymentId, RaffleId, TicketId,
};

/// Settlement-engine errors.
///
/// Everything here is a recoverable condition reported back to the caller,
/// except `IntegrityViolation`, which signals a broken invariant that must
/// not be silently repaired.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("raffle not found: {0}")]
    RaffleNotFound(RaffleId),

    #[error("ticket pool already initialized for raffle {0}")]
    DuplicateRaffle(RaffleId),

    #[error("raffle slug already in use: {0}")]
    DuplicateSlug(String),

    #[error("insufficient inventory: {available} available, {requested} requested")]
    InsufficientInventory { available: usize, requested: usize },

    #[error("ticket number {number} is not available")]
    TicketUnavailable { number: u32 },

    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    #[error("amount mismatch: expected {expected}, got {actual}")]
    AmountMismatch { expected: Amount, actual: Amount },

    #[error("no eligible tickets for a draw in raffle {0}")]
    NoEligibleTickets(RaffleId),

    #[error("sales are closed for raffle {0}")]
    SaleClosed(RaffleId),

    #[error("ticket not found: {0}")]
    TicketNotFound(TicketId),

    #[error("participant not found: {0}")]
    ParticipantNotFound(ParticipantId),

    #[error("payment not found: {0}")]
    PaymentNotFound(PaymentId),

    #[error("no purchase recorded for payment {0}")]
    PurchaseNotFound(PaymentId),

    #[error("draw not found: {0}")]
    DrawNotFound(DrawId),

    #[error("integrity violation: {0}")]
    IntegrityViolation(String),

    #[error(transparent)]
    Core(#[from] CoreError),
}
