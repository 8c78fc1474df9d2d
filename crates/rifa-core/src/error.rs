use crate::state_machine::PaymentStatus;

/// Core errors.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("invalid payment transition from {from} to {to}")]
    InvalidStateTransition {
        from: PaymentStatus,
        to: PaymentStatus,
    },

    #[error("validation failed: {0}")]
    ValidationError(String),

    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    #[error("missing required field: {0}")]
    MissingField(String),
}
