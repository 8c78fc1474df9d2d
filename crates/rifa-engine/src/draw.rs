use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use rand::Rng;
use rifa_core::{Draw, DrawId, DrawStatus, RaffleId, RaffleStatus};

use crate::catalog::RaffleCatalog;
use crate::error::EngineError;
use crate::inventory::TicketInventory;

/// Picks a winner once a raffle is closed.
///
/// The random source is injected per execution, so tests can seed it and the
/// production caller can bring OS entropy.
pub struct DrawSelector {
    draws: DashMap<DrawId, Draw>,
    catalog: Arc<RaffleCatalog>,
    inventory: Arc<TicketInventory>,
}

impl DrawSelector {
    /// Create a selector over the given catalog and inventory.
    pub fn new(catalog: Arc<RaffleCatalog>, inventory: Arc<TicketInventory>) -> Self {
        Self {
            draws: DashMap::new(),
            catalog,
            inventory,
        }
    }

    /// Schedule a draw for a raffle.
    pub fn schedule(
        &self,
        raffle_id: RaffleId,
        scheduled_for: DateTime<Utc>,
    ) -> Result<Draw, EngineError> {
        // The raffle must exist; it may still be selling at scheduling time.
        self.catalog.get(raffle_id)?;

        let draw = Draw {
            id: DrawId::new(),
            raffle_id,
            scheduled_for,
            winning_ticket: None,
            winning_number: None,
            status: DrawStatus::Scheduled,
            notes: None,
            created_at: Utc::now(),
            realized_at: None,
        };
        self.draws.insert(draw.id, draw.clone());
        tracing::info!(draw_id = %draw.id, raffle_id = %raffle_id, "draw scheduled");
        Ok(draw)
    }

    /// Execute a scheduled draw, picking uniformly among sold tickets.
    ///
    /// The raffle must be closed and have at least one sold ticket, otherwise
    /// `NoEligibleTickets`. Re-executing an already-realized draw fails with
    /// `InvalidTransition` rather than re-drawing.
    pub fn execute<R: Rng>(&self, draw_id: DrawId, rng: &mut R) -> Result<Draw, EngineError> {
        let mut entry = self
            .draws
            .get_mut(&draw_id)
            .ok_or(EngineError::DrawNotFound(draw_id))?;
        let draw = entry.value_mut();

        if draw.status != DrawStatus::Scheduled {
            return Err(EngineError::InvalidTransition(format!(
                "cannot execute draw in status {}",
                draw.status
            )));
        }

        let raffle = self.catalog.get(draw.raffle_id)?;
        if raffle.status != RaffleStatus::Closed {
            return Err(EngineError::NoEligibleTickets(draw.raffle_id));
        }
        let sold = self.inventory.sold_tickets(draw.raffle_id);
        if sold.is_empty() {
            return Err(EngineError::NoEligibleTickets(draw.raffle_id));
        }

        let winner = &sold[rng.gen_range(0..sold.len())];
        draw.winning_ticket = Some(winner.id);
        draw.winning_number = Some(winner.number);
        draw.status = DrawStatus::Realized;
        draw.realized_at = Some(Utc::now());

        tracing::info!(
            draw_id = %draw_id,
            raffle_id = %draw.raffle_id,
            winning_number = winner.number,
            "draw realized"
        );
        Ok(draw.clone())
    }

    /// Cancel a scheduled draw, recording the reason in the notes.
    pub fn cancel(&self, draw_id: DrawId, reason: &str) -> Result<Draw, EngineError> {
        let mut entry = self
            .draws
            .get_mut(&draw_id)
            .ok_or(EngineError::DrawNotFound(draw_id))?;
        let draw = entry.value_mut();

        if draw.status != DrawStatus::Scheduled {
            return Err(EngineError::InvalidTransition(format!(
                "cannot cancel draw in status {}",
                draw.status
            )));
        }

        draw.status = DrawStatus::Cancelled;
        draw.notes = Some(reason.to_string());
        tracing::info!(draw_id = %draw_id, reason, "draw cancelled");
        Ok(draw.clone())
    }

    /// Get a draw by its ID.
    pub fn get(&self, draw_id: DrawId) -> Result<Draw, EngineError> {
        self.draws
            .get(&draw_id)
            .map(|entry| entry.clone())
            .ok_or(EngineError::DrawNotFound(draw_id))
    }

    /// All draws of a raffle.
    pub fn draws_for_raffle(&self, raffle_id: RaffleId) -> Vec<Draw> {
        self.draws
            .iter()
            .filter(|entry| entry.raffle_id == raffle_id)
            .map(|entry| entry.clone())
            .collect()
    }

    /// Load a draw wholesale (snapshot hydration).
    pub fn hydrate(&self, draw: Draw) {
        self.draws.insert(draw.id, draw);
    }

    /// Number of tracked draws.
    pub fn len(&self) -> usize {
        self.draws.len()
    }

    /// Check if the selector has no draws.
    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }
}
