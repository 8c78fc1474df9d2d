use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rifa_core::{Amount, ParticipantId, RaffleId, Ticket, TicketId, TicketStatus};

use crate::catalog::RaffleCatalog;
use crate::error::EngineError;

/// How the caller wants tickets picked.
#[derive(Debug, Clone)]
pub enum TicketSelection {
    /// Any N available tickets; the allocator picks lowest numbers first.
    Quantity(usize),
    /// These exact ticket numbers.
    Numbers(Vec<u32>),
}

/// The fixed pool of tickets for one raffle, keyed by ticket number.
///
/// The `BTreeMap` keeps numbers ordered, which makes quantity-based
/// allocation deterministic (lowest available first) under a fixed snapshot.
struct TicketPool {
    by_number: BTreeMap<u32, Ticket>,
    number_of: HashMap<TicketId, u32>,
}

impl TicketPool {
    fn ticket_mut(&mut self, ticket_id: TicketId) -> Result<&mut Ticket, EngineError> {
        let number = *self
            .number_of
            .get(&ticket_id)
            .ok_or(EngineError::TicketNotFound(ticket_id))?;
        // The index and the map are updated together; a dangling index entry
        // would be an integrity bug.
        self.by_number
            .get_mut(&number)
            .ok_or(EngineError::TicketNotFound(ticket_id))
    }
}

/// Owner of every ticket pool — the single source of truth for
/// "is this ticket available".
///
/// Thread-safe: pools live in a `DashMap` keyed by raffle, and every mutation
/// of a pool happens through `get_mut`, whose guard holds the shard write
/// lock. Mutations of one raffle's pool are therefore linearizable: two
/// concurrent reservations can never both take the same number.
pub struct TicketInventory {
    pools: DashMap<RaffleId, TicketPool>,
    catalog: Arc<RaffleCatalog>,
}

impl TicketInventory {
    /// Create an inventory backed by the given catalog.
    ///
    /// The catalog reference is used to keep the per-raffle sold counter in
    /// lockstep with ticket commits.
    pub fn new(catalog: Arc<RaffleCatalog>) -> Self {
        Self {
            pools: DashMap::new(),
            catalog,
        }
    }

    /// Create `count` tickets numbered `1..=count`, all available.
    ///
    /// Fails with `DuplicateRaffle` if the pool already exists.
    pub fn initialize(
        &self,
        raffle_id: RaffleId,
        count: u32,
        price: Amount,
    ) -> Result<usize, EngineError> {
        match self.pools.entry(raffle_id) {
            Entry::Occupied(_) => Err(EngineError::DuplicateRaffle(raffle_id)),
            Entry::Vacant(vacant) => {
                let mut by_number = BTreeMap::new();
                let mut number_of = HashMap::new();
                for number in 1..=count {
                    let ticket = Ticket {
                        id: TicketId::new(),
                        raffle_id,
                        number,
                        status: TicketStatus::Available,
                        participant_id: None,
                        seller_id: None,
                        price,
                        reserved_until: None,
                        sold_at: None,
                    };
                    number_of.insert(ticket.id, number);
                    by_number.insert(number, ticket);
                }
                vacant.insert(TicketPool {
                    by_number,
                    number_of,
                });
                tracing::info!(raffle_id = %raffle_id, count, "ticket pool initialized");
                Ok(count as usize)
            }
        }
    }

    /// Atomically reserve tickets for a holder.
    ///
    /// For `Quantity(n)`, the n lowest available numbers are taken; fails
    /// with `InsufficientInventory` if fewer than n are available. For
    /// `Numbers`, every requested number must be available; fails with
    /// `TicketUnavailable` on the first conflict. Either way, nothing is
    /// reserved unless everything can be.
    pub fn reserve(
        &self,
        raffle_id: RaffleId,
        selection: &TicketSelection,
        holder: ParticipantId,
        expires_at: DateTime<Utc>,
    ) -> Result<Vec<Ticket>, EngineError> {
        let mut pool = self
            .pools
            .get_mut(&raffle_id)
            .ok_or(EngineError::RaffleNotFound(raffle_id))?;

        let numbers: Vec<u32> = match selection {
            TicketSelection::Quantity(quantity) => {
                let available: Vec<u32> = pool
                    .by_number
                    .values()
                    .filter(|t| t.status == TicketStatus::Available)
                    .map(|t| t.number)
                    .take(*quantity)
                    .collect();
                if available.len() < *quantity {
                    let total_available = pool
                        .by_number
                        .values()
                        .filter(|t| t.status == TicketStatus::Available)
                        .count();
                    return Err(EngineError::InsufficientInventory {
                        available: total_available,
                        requested: *quantity,
                    });
                }
                available
            }
            TicketSelection::Numbers(numbers) => {
                // A repeated number would pass the availability check twice
                // and hand out the same ticket twice.
                let mut seen = HashSet::with_capacity(numbers.len());
                for number in numbers {
                    if !seen.insert(*number) {
                        return Err(EngineError::TicketUnavailable { number: *number });
                    }
                    match pool.by_number.get(number) {
                        Some(t) if t.status == TicketStatus::Available => {}
                        _ => return Err(EngineError::TicketUnavailable { number: *number }),
                    }
                }
                numbers.clone()
            }
        };

        // All checks passed while holding the pool lock — flip them.
        let mut reserved = Vec::with_capacity(numbers.len());
        for number in numbers {
            if let Some(ticket) = pool.by_number.get_mut(&number) {
                ticket.status = TicketStatus::Reserved;
                ticket.participant_id = Some(holder);
                ticket.reserved_until = Some(expires_at);
                reserved.push(ticket.clone());
            }
        }

        tracing::info!(
            raffle_id = %raffle_id,
            holder = %holder,
            count = reserved.len(),
            "tickets reserved"
        );
        Ok(reserved)
    }

    /// Release reserved tickets back to available.
    ///
    /// Idempotent: tickets that are already available are left untouched, and
    /// sold tickets are never clawed back. Returns how many tickets actually
    /// changed state.
    pub fn release(
        &self,
        raffle_id: RaffleId,
        ticket_ids: &[TicketId],
    ) -> Result<usize, EngineError> {
        let mut pool = self
            .pools
            .get_mut(&raffle_id)
            .ok_or(EngineError::RaffleNotFound(raffle_id))?;

        // Validate every id before touching any ticket, so a bad id cannot
        // leave a half-released batch behind.
        for ticket_id in ticket_ids {
            if !pool.number_of.contains_key(ticket_id) {
                return Err(EngineError::TicketNotFound(*ticket_id));
            }
        }

        let mut released = 0;
        for ticket_id in ticket_ids {
            let ticket = pool.ticket_mut(*ticket_id)?;
            if ticket.status == TicketStatus::Reserved {
                ticket.status = TicketStatus::Available;
                ticket.participant_id = None;
                ticket.reserved_until = None;
                released += 1;
            }
        }

        if released > 0 {
            tracing::info!(raffle_id = %raffle_id, released, "tickets released");
        }
        Ok(released)
    }

    /// Commit a sale: reserved → sold, under the expected holder.
    ///
    /// Fails with `InvalidTransition` if any ticket is not currently reserved
    /// by `participant_id`; in that case nothing is committed. On success the
    /// raffle's sold counter is advanced in the same logical transaction.
    pub fn commit_sale(
        &self,
        raffle_id: RaffleId,
        ticket_ids: &[TicketId],
        participant_id: ParticipantId,
        price: Amount,
        at: DateTime<Utc>,
    ) -> Result<Vec<Ticket>, EngineError> {
        let mut pool = self
            .pools
            .get_mut(&raffle_id)
            .ok_or(EngineError::RaffleNotFound(raffle_id))?;

        // Validate every ticket before mutating any.
        for ticket_id in ticket_ids {
            let number = *pool
                .number_of
                .get(ticket_id)
                .ok_or(EngineError::TicketNotFound(*ticket_id))?;
            let ticket = pool
                .by_number
                .get(&number)
                .ok_or(EngineError::TicketNotFound(*ticket_id))?;
            if ticket.status != TicketStatus::Reserved {
                return Err(EngineError::InvalidTransition(format!(
                    "ticket {} is {}, expected Reserved",
                    ticket.number, ticket.status
                )));
            }
            if ticket.participant_id != Some(participant_id) {
                return Err(EngineError::InvalidTransition(format!(
                    "ticket {} is reserved by another holder",
                    ticket.number
                )));
            }
        }

        let mut sold = Vec::with_capacity(ticket_ids.len());
        for ticket_id in ticket_ids {
            let ticket = pool.ticket_mut(*ticket_id)?;
            ticket.status = TicketStatus::Sold;
            ticket.participant_id = Some(participant_id);
            ticket.price = price;
            ticket.reserved_until = None;
            ticket.sold_at = Some(at);
            sold.push(ticket.clone());
        }

        // Advance the derived counter while still holding the pool lock, so
        // no observer can see sold tickets without the counter following.
        self.catalog.record_sold(raffle_id, sold.len() as u32)?;

        tracing::info!(
            raffle_id = %raffle_id,
            participant_id = %participant_id,
            count = sold.len(),
            "sale committed"
        );
        Ok(sold)
    }

    /// Release every reserved ticket whose expiry has passed.
    ///
    /// The check is conditional — still reserved AND still expired — while
    /// holding the pool lock, so a sale committed just before the sweep is
    /// never clobbered. Returns the tickets that were released.
    pub fn expire_reservations(&self, now: DateTime<Utc>) -> Vec<Ticket> {
        let mut expired = Vec::new();

        for mut pool in self.pools.iter_mut() {
            for ticket in pool.by_number.values_mut() {
                let past_due = matches!(ticket.reserved_until, Some(until) if until <= now);
                if ticket.status == TicketStatus::Reserved && past_due {
                    ticket.status = TicketStatus::Available;
                    ticket.participant_id = None;
                    ticket.reserved_until = None;
                    expired.push(ticket.clone());
                    tracing::debug!(
                        raffle_id = %ticket.raffle_id,
                        number = ticket.number,
                        "reservation expired"
                    );
                }
            }
        }

        expired
    }

    /// Clear weak references to a deleted participant.
    ///
    /// Sold tickets keep their status but lose the owner reference (SET NULL
    /// semantics); reservations held by the participant are released, since
    /// they can no longer be committed. Tickets are never deleted.
    pub fn clear_participant(&self, participant_id: ParticipantId) -> usize {
        let mut cleared = 0;

        for mut pool in self.pools.iter_mut() {
            for ticket in pool.by_number.values_mut() {
                if ticket.participant_id != Some(participant_id) {
                    continue;
                }
                ticket.participant_id = None;
                if ticket.status == TicketStatus::Reserved {
                    ticket.status = TicketStatus::Available;
                    ticket.reserved_until = None;
                }
                cleared += 1;
            }
        }

        if cleared > 0 {
            tracing::info!(participant_id = %participant_id, cleared, "participant references cleared");
        }
        cleared
    }

    /// Get a ticket by raffle and number.
    pub fn ticket_by_number(&self, raffle_id: RaffleId, number: u32) -> Option<Ticket> {
        self.pools
            .get(&raffle_id)?
            .by_number
            .get(&number)
            .cloned()
    }

    /// Get a ticket by its ID.
    pub fn ticket(&self, raffle_id: RaffleId, ticket_id: TicketId) -> Option<Ticket> {
        let pool = self.pools.get(&raffle_id)?;
        let number = pool.number_of.get(&ticket_id)?;
        pool.by_number.get(number).cloned()
    }

    /// All tickets of a raffle, ordered by number.
    pub fn tickets(&self, raffle_id: RaffleId) -> Vec<Ticket> {
        self.pools
            .get(&raffle_id)
            .map(|pool| pool.by_number.values().cloned().collect())
            .unwrap_or_default()
    }

    /// Sold tickets of a raffle, ordered by number.
    pub fn sold_tickets(&self, raffle_id: RaffleId) -> Vec<Ticket> {
        self.pools
            .get(&raffle_id)
            .map(|pool| {
                pool.by_number
                    .values()
                    .filter(|t| t.status == TicketStatus::Sold)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default()
    }

    /// How many tickets of a raffle are currently available.
    pub fn available_count(&self, raffle_id: RaffleId) -> usize {
        self.count_with_status(raffle_id, TicketStatus::Available)
    }

    /// How many tickets of a raffle are sold.
    pub fn sold_count(&self, raffle_id: RaffleId) -> usize {
        self.count_with_status(raffle_id, TicketStatus::Sold)
    }

    fn count_with_status(&self, raffle_id: RaffleId, status: TicketStatus) -> usize {
        self.pools
            .get(&raffle_id)
            .map(|pool| {
                pool.by_number
                    .values()
                    .filter(|t| t.status == status)
                    .count()
            })
            .unwrap_or(0)
    }

    /// Load a pool wholesale (snapshot hydration).
    pub fn hydrate(&self, raffle_id: RaffleId, tickets: Vec<Ticket>) {
        let mut by_number = BTreeMap::new();
        let mut number_of = HashMap::new();
        for ticket in tickets {
            number_of.insert(ticket.id, ticket.number);
            by_number.insert(ticket.number, ticket);
        }
        self.pools.insert(
            raffle_id,
            TicketPool {
                by_number,
                number_of,
            },
        );
    }

    /// Whether a pool exists for this raffle.
    pub fn contains(&self, raffle_id: RaffleId) -> bool {
        self.pools.contains_key(&raffle_id)
    }
}
