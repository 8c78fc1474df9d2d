use std::fmt;

use crate::error::CoreError;

/// The 5 states of a payment lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub enum PaymentStatus {
    /// Payment recorded, awaiting gateway outcome.
    Pending,
    /// Gateway reported success; sale not yet committed.
    Approved,
    /// Settlement complete — the associated tickets are sold. Final state.
    Confirmed,
    /// Payment refused or invalidated. Final state.
    Rejected,
    /// Purchase abandoned or withdrawn. Final state.
    Cancelled,
}

impl PaymentStatus {
    /// Whether this is a final (terminal) state.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Confirmed | Self::Rejected | Self::Cancelled)
    }
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "Pending"),
            Self::Approved => write!(f, "Approved"),
            Self::Confirmed => write!(f, "Confirmed"),
            Self::Rejected => write!(f, "Rejected"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// Events that trigger payment state transitions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PaymentEvent {
    /// The external gateway confirmed the charge.
    Approved,
    /// Settlement committed the ticket sale.
    Confirmed,
    /// The gateway refused the charge, or settlement invalidated it.
    Rejected,
    /// The purchase was abandoned or withdrawn.
    Cancelled,
}

/// Manages payment state transitions.
///
/// Valid transitions:
/// - Pending → Approved (Approved)
/// - Pending → Rejected (Rejected)
/// - Pending → Cancelled (Cancelled)
/// - Approved → Confirmed (Confirmed)
/// - Approved → Rejected (Rejected)
/// - Approved → Cancelled (Cancelled)
pub struct PaymentStateMachine;

impl PaymentStateMachine {
    /// Attempt a state transition based on an event.
    /// Returns the new state on success, or an error for invalid transitions.
    pub fn transition(
        current: PaymentStatus,
        event: PaymentEvent,
    ) -> Result<PaymentStatus, CoreError> {
        let new_state = match (current, event) {
            // From Pending
            (PaymentStatus::Pending, PaymentEvent::Approved) => PaymentStatus::Approved,
            (PaymentStatus::Pending, PaymentEvent::Rejected) => PaymentStatus::Rejected,
            (PaymentStatus::Pending, PaymentEvent::Cancelled) => PaymentStatus::Cancelled,

            // From Approved
            (PaymentStatus::Approved, PaymentEvent::Confirmed) => PaymentStatus::Confirmed,
            (PaymentStatus::Approved, PaymentEvent::Rejected) => PaymentStatus::Rejected,
            (PaymentStatus::Approved, PaymentEvent::Cancelled) => PaymentStatus::Cancelled,

            // All other transitions are invalid
            _ => {
                let target = match event {
                    PaymentEvent::Approved => PaymentStatus::Approved,
                    PaymentEvent::Confirmed => PaymentStatus::Confirmed,
                    PaymentEvent::Rejected => PaymentStatus::Rejected,
                    PaymentEvent::Cancelled => PaymentStatus::Cancelled,
                };
                return Err(CoreError::InvalidStateTransition {
                    from: current,
                    to: target,
                });
            }
        };

        tracing::debug!(
            from = %current,
            to = %new_state,
            event = ?event,
            "payment state transition"
        );

        Ok(new_state)
    }

    /// Check if a transition is valid without performing it.
    pub fn can_transition(current: PaymentStatus, event: PaymentEvent) -> bool {
        Self::transition(current, event).is_ok()
    }
}
