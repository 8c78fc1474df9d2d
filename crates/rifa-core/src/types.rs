use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::error::CoreError;
use crate::state_machine::PaymentStatus;

/// Unique identifier for a raffle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RaffleId(pub Uuid);

impl RaffleId {
    /// Create a new random raffle ID (UUID v7 — time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for RaffleId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for RaffleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TicketId(pub Uuid);

impl TicketId {
    /// Create a new random ticket ID (UUID v7 — time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for TicketId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TicketId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a participant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ParticipantId(pub Uuid);

impl ParticipantId {
    /// Create a new random participant ID (UUID v7 — time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for ParticipantId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for ParticipantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a selling agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AgentId(pub Uuid);

impl AgentId {
    /// Create a new random agent ID (UUID v7 — time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for AgentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for AgentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentId(pub Uuid);

impl PaymentId {
    /// Create a new random payment ID (UUID v7 — time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for PaymentId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PaymentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier for a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DrawId(pub Uuid);

impl DrawId {
    /// Create a new random draw ID (UUID v7 — time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Create from an existing UUID.
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// Get the inner UUID.
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for DrawId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for DrawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Monetary amount in centavos (the smallest currency unit).
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
pub struct Amount {
    /// Value in centavos.
    pub centavos: u64,
}

impl Amount {
    /// Create an amount from a centavo value.
    pub fn from_centavos(centavos: u64) -> Self {
        Self { centavos }
    }

    /// The zero amount.
    pub fn zero() -> Self {
        Self { centavos: 0 }
    }

    /// Check if the amount is zero.
    pub fn is_zero(&self) -> bool {
        self.centavos == 0
    }

    /// Checked addition; fails on overflow.
    pub fn checked_add(&self, other: Amount) -> Result<Amount, CoreError> {
        self.centavos
            .checked_add(other.centavos)
            .map(Amount::from_centavos)
            .ok_or_else(|| CoreError::InvalidAmount("amount overflow".into()))
    }

    /// Checked multiplication by a count; fails on overflow.
    pub fn checked_mul(&self, count: u64) -> Result<Amount, CoreError> {
        self.centavos
            .checked_mul(count)
            .map(Amount::from_centavos)
            .ok_or_else(|| CoreError::InvalidAmount("amount overflow".into()))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:02}", self.centavos / 100, self.centavos % 100)
    }
}

/// Lifecycle status of a raffle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RaffleStatus {
    /// Tickets can be sold.
    Active,
    /// Sales closed — eligible for a draw. Final.
    Closed,
    /// Raffle called off. Final.
    Cancelled,
}

impl RaffleStatus {
    /// Whether this is a final (terminal) status.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Closed | Self::Cancelled)
    }
}

impl fmt::Display for RaffleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "Active"),
            Self::Closed => write!(f, "Closed"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// A raffle campaign with a fixed ticket pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Raffle {
    /// Unique identifier.
    pub id: RaffleId,
    /// Display title.
    pub title: String,
    /// Optional unique URL slug.
    pub slug: Option<String>,
    /// Price of a single ticket.
    pub ticket_price: Amount,
    /// Fixed number of tickets in the pool.
    pub total_tickets: u32,
    /// Derived counter, kept in lockstep with ticket status changes.
    /// Invariant: `tickets_sold <= total_tickets`.
    pub tickets_sold: u32,
    /// Start of the sale window.
    pub sale_starts_at: DateTime<Utc>,
    /// End of the sale window.
    pub sale_ends_at: DateTime<Utc>,
    /// Current status.
    pub status: RaffleStatus,
    /// Payment destination identifier (e.g. a PIX key).
    pub payout_key: String,
    /// When the raffle was created.
    pub created_at: DateTime<Utc>,
}

/// Lifecycle status of a ticket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TicketStatus {
    /// Not held by anyone; can be reserved.
    Available,
    /// Held by a participant candidate pending payment.
    Reserved,
    /// Sold and owned. Final (administrative correction aside).
    Sold,
}

impl fmt::Display for TicketStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Available => write!(f, "Available"),
            Self::Reserved => write!(f, "Reserved"),
            Self::Sold => write!(f, "Sold"),
        }
    }
}

/// One numbered unit of a raffle.
///
/// Exactly one ticket exists per (raffle, number); numbers run from 1 to the
/// raffle's `total_tickets`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ticket {
    /// Unique identifier.
    pub id: TicketId,
    /// The raffle this ticket belongs to.
    pub raffle_id: RaffleId,
    /// Number within the raffle, in `[1, total_tickets]`.
    pub number: u32,
    /// Current status.
    pub status: TicketStatus,
    /// Holder while reserved; owner once sold. Weak reference — cleared if
    /// the participant is deleted.
    pub participant_id: Option<ParticipantId>,
    /// Selling agent, if the sale went through one. Weak reference.
    pub seller_id: Option<AgentId>,
    /// Price charged for this ticket.
    pub price: Amount,
    /// Reservation deadline while the ticket is reserved.
    pub reserved_until: Option<DateTime<Utc>>,
    /// When the ticket was sold.
    pub sold_at: Option<DateTime<Utc>>,
}

/// A raffle participant.
///
/// Scoped to a single raffle; contact fields carry no uniqueness constraint,
/// so duplicates across purchases are tolerated.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Participant {
    /// Unique identifier.
    pub id: ParticipantId,
    /// The raffle this participant record belongs to.
    pub raffle_id: RaffleId,
    /// Full name.
    pub name: String,
    /// Contact info (phone or e-mail).
    pub contact: String,
    /// Optional identity document.
    pub document: Option<String>,
    /// When the participant was registered.
    pub created_at: DateTime<Utc>,
}

/// Supported payment methods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaymentMethod {
    Cash,
    Card,
    Pix,
    Transfer,
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cash => write!(f, "Cash"),
            Self::Card => write!(f, "Card"),
            Self::Pix => write!(f, "Pix"),
            Self::Transfer => write!(f, "Transfer"),
        }
    }
}

/// A payment settling one or more tickets of a single raffle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Payment {
    /// Unique identifier.
    pub id: PaymentId,
    /// The raffle whose tickets this payment settles.
    pub raffle_id: RaffleId,
    /// Paying participant. Weak reference.
    pub participant_id: ParticipantId,
    /// Tickets covered by this payment (one payment, many tickets).
    pub ticket_ids: Vec<TicketId>,
    /// Total amount; must equal the sum of the ticket prices.
    pub amount: Amount,
    /// How the participant paid.
    pub method: PaymentMethod,
    /// Current status.
    pub status: PaymentStatus,
    /// Transaction reference from the external gateway.
    pub external_txn_id: Option<String>,
    /// Proof-of-payment reference (e.g. an uploaded receipt).
    pub proof_ref: Option<String>,
    /// When the payment was approved.
    pub approved_at: Option<DateTime<Utc>>,
    /// Why the payment was rejected, if it was.
    pub rejection_reason: Option<String>,
    /// When the payment was created.
    pub created_at: DateTime<Utc>,
}

/// Lifecycle status of a draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DrawStatus {
    /// Planned but not yet run.
    Scheduled,
    /// Run — a winner was selected. Final.
    Realized,
    /// Called off. Final.
    Cancelled,
}

impl DrawStatus {
    /// Whether this is a final (terminal) status.
    pub fn is_final(&self) -> bool {
        matches!(self, Self::Realized | Self::Cancelled)
    }
}

impl fmt::Display for DrawStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Scheduled => write!(f, "Scheduled"),
            Self::Realized => write!(f, "Realized"),
            Self::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// The event selecting one sold ticket of a raffle as the winner.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Draw {
    /// Unique identifier.
    pub id: DrawId,
    /// The raffle being drawn.
    pub raffle_id: RaffleId,
    /// When the draw is scheduled to happen.
    pub scheduled_for: DateTime<Utc>,
    /// Winning ticket, set when the draw is realized. Weak reference.
    pub winning_ticket: Option<TicketId>,
    /// Winning number, set when the draw is realized.
    pub winning_number: Option<u32>,
    /// Current status.
    pub status: DrawStatus,
    /// Operator notes (e.g. a cancellation reason).
    pub notes: Option<String>,
    /// When the draw record was created.
    pub created_at: DateTime<Utc>,
    /// When the draw was realized.
    pub realized_at: Option<DateTime<Utc>>,
}
