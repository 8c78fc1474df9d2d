use chrono::{DateTime, Utc};
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use rifa_core::{Amount, CoreError, Raffle, RaffleId, RaffleStatus};

use crate::error::EngineError;

/// Everything needed to create a raffle.
#[derive(Debug, Clone)]
pub struct RaffleDefinition {
    /// Display title.
    pub title: String,
    /// Optional unique URL slug.
    pub slug: Option<String>,
    /// Price of a single ticket.
    pub ticket_price: Amount,
    /// Fixed number of tickets in the pool.
    pub total_tickets: u32,
    /// Start of the sale window.
    pub sale_starts_at: DateTime<Utc>,
    /// End of the sale window.
    pub sale_ends_at: DateTime<Utc>,
    /// Payment destination identifier.
    pub payout_key: String,
}

/// Registry of raffle definitions.
///
/// Thread-safe: uses `DashMap` for concurrent access. The sold counter on a
/// raffle is only ever advanced through [`RaffleCatalog::record_sold`], which
/// the inventory calls in lockstep with ticket status changes.
pub struct RaffleCatalog {
    raffles: DashMap<RaffleId, Raffle>,
    slugs: DashMap<String, RaffleId>,
}

impl RaffleCatalog {
    /// Create a new, empty catalog.
    pub fn new() -> Self {
        Self {
            raffles: DashMap::new(),
            slugs: DashMap::new(),
        }
    }

    /// Create a raffle from a definition.
    ///
    /// Fails if the slug is already taken or the definition is malformed.
    pub fn create(&self, definition: RaffleDefinition) -> Result<Raffle, EngineError> {
        if definition.title.trim().is_empty() {
            return Err(CoreError::ValidationError("raffle title is empty".into()).into());
        }
        if definition.total_tickets == 0 {
            return Err(
                CoreError::ValidationError("raffle must have at least one ticket".into()).into(),
            );
        }
        if definition.ticket_price.is_zero() {
            return Err(CoreError::InvalidAmount("ticket price must be non-zero".into()).into());
        }
        if definition.sale_ends_at <= definition.sale_starts_at {
            return Err(
                CoreError::ValidationError("sale window ends before it starts".into()).into(),
            );
        }

        let id = RaffleId::new();

        // Claim the slug atomically before publishing the raffle.
        if let Some(slug) = &definition.slug {
            match self.slugs.entry(slug.clone()) {
                Entry::Occupied(_) => return Err(EngineError::DuplicateSlug(slug.clone())),
                Entry::Vacant(vacant) => {
                    vacant.insert(id);
                }
            }
        }

        let raffle = Raffle {
            id,
            title: definition.title,
            slug: definition.slug,
            ticket_price: definition.ticket_price,
            total_tickets: definition.total_tickets,
            tickets_sold: 0,
            sale_starts_at: definition.sale_starts_at,
            sale_ends_at: definition.sale_ends_at,
            status: RaffleStatus::Active,
            payout_key: definition.payout_key,
            created_at: Utc::now(),
        };
        self.raffles.insert(id, raffle.clone());
        tracing::info!(raffle_id = %id, title = %raffle.title, "raffle created");
        Ok(raffle)
    }

    /// Get a raffle by its ID.
    pub fn get(&self, raffle_id: RaffleId) -> Result<Raffle, EngineError> {
        self.raffles
            .get(&raffle_id)
            .map(|entry| entry.clone())
            .ok_or(EngineError::RaffleNotFound(raffle_id))
    }

    /// Look up a raffle by its slug.
    pub fn get_by_slug(&self, slug: &str) -> Option<Raffle> {
        let id = *self.slugs.get(slug)?;
        self.raffles.get(&id).map(|entry| entry.clone())
    }

    /// Close an active raffle. Terminal — a closed raffle never reopens.
    pub fn close(&self, raffle_id: RaffleId) -> Result<Raffle, EngineError> {
        self.finish(raffle_id, RaffleStatus::Closed)
    }

    /// Cancel an active raffle. Terminal.
    pub fn cancel(&self, raffle_id: RaffleId) -> Result<Raffle, EngineError> {
        self.finish(raffle_id, RaffleStatus::Cancelled)
    }

    fn finish(&self, raffle_id: RaffleId, target: RaffleStatus) -> Result<Raffle, EngineError> {
        let mut entry = self
            .raffles
            .get_mut(&raffle_id)
            .ok_or(EngineError::RaffleNotFound(raffle_id))?;
        let raffle = entry.value_mut();

        if raffle.status != RaffleStatus::Active {
            return Err(EngineError::InvalidTransition(format!(
                "cannot move raffle from {} to {}",
                raffle.status, target
            )));
        }

        raffle.status = target;
        tracing::info!(raffle_id = %raffle_id, status = %target, "raffle finished");
        Ok(raffle.clone())
    }

    /// Whether tickets can currently be sold for this raffle.
    pub fn is_sale_open(&self, raffle_id: RaffleId, now: DateTime<Utc>) -> Result<bool, EngineError> {
        let raffle = self.get(raffle_id)?;
        Ok(raffle.status == RaffleStatus::Active
            && now >= raffle.sale_starts_at
            && now < raffle.sale_ends_at)
    }

    /// Advance the sold counter after tickets were committed.
    ///
    /// Called by the inventory in the same logical transaction as the ticket
    /// status change. Fails with an integrity error if the counter would
    /// exceed the pool size.
    pub(crate) fn record_sold(&self, raffle_id: RaffleId, count: u32) -> Result<(), EngineError> {
        let mut entry = self
            .raffles
            .get_mut(&raffle_id)
            .ok_or(EngineError::RaffleNotFound(raffle_id))?;
        let raffle = entry.value_mut();

        let new_sold = raffle.tickets_sold.saturating_add(count);
        if new_sold > raffle.total_tickets {
            return Err(EngineError::IntegrityViolation(format!(
                "raffle {}: sold counter {} would exceed pool size {}",
                raffle_id, new_sold, raffle.total_tickets
            )));
        }
        raffle.tickets_sold = new_sold;
        Ok(())
    }

    /// Replace a raffle record wholesale (snapshot hydration).
    pub fn hydrate(&self, raffle: Raffle) {
        if let Some(slug) = &raffle.slug {
            self.slugs.insert(slug.clone(), raffle.id);
        }
        self.raffles.insert(raffle.id, raffle);
    }

    /// All raffles, in no particular order.
    pub fn list(&self) -> Vec<Raffle> {
        self.raffles.iter().map(|entry| entry.clone()).collect()
    }

    /// Number of raffles in the catalog.
    pub fn len(&self) -> usize {
        self.raffles.len()
    }

    /// Check if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.raffles.is_empty()
    }
}

impl Default for RaffleCatalog {
    fn default() -> Self {
        Self::new()
    }
}
