//! Rifa Core
//!
//! Shared vocabulary for the raffle platform: entity types, identifiers,
//! monetary amounts, the canonical payment state machine, and engine
//! configuration. Everything here is persistence- and transport-agnostic.

pub mod config;
pub mod error;
pub mod state_machine;
pub mod types;

pub use config::EngineConfig;
pub use error::CoreError;
pub use state_machine::{PaymentEvent, PaymentStateMachine, PaymentStatus};
pub use types::{
    AgentId, Amount, Draw, DrawId, DrawStatus, Participant, ParticipantId, Payment, PaymentId,
    PaymentMethod, Raffle, RaffleId, RaffleStatus, Ticket, TicketId, TicketStatus,
};
