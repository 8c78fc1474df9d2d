//! Rifa Settlement Engine
//!
//! The transactional core of the raffle platform: the raffle catalog, the
//! ticket inventory (the single source of truth for availability), the
//! payment ledger, the settlement orchestrator that keeps the two in
//! lockstep, and the draw selector. All components are thread-safe and
//! per-raffle operations are linearizable.

pub mod catalog;
pub mod draw;
pub mod engine;
pub mod error;
pub mod inventory;
pub mod ledger;
pub mod orchestrator;
pub mod registry;
pub mod sweeper;

pub use catalog::{RaffleCatalog, RaffleDefinition};
pub use draw::DrawSelector;
pub use engine::{Engine, EngineSnapshot, PaymentRecord};
pub use error::EngineError;
pub use inventory::{TicketInventory, TicketSelection};
pub use ledger::{PaymentLedger, PaymentTransition};
pub use orchestrator::{Purchase, PurchaseReceipt, SettlementOrchestrator};
pub use registry::{ParticipantDraft, ParticipantRegistry};
pub use sweeper::spawn_sweeper;
