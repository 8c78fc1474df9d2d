use chrono::Utc;
use dashmap::DashMap;
use rifa_core::{CoreError, Participant, ParticipantId, RaffleId};

use crate::error::EngineError;

/// Participant details as submitted by the outer layer.
#[derive(Debug, Clone)]
pub struct ParticipantDraft {
    /// Full name.
    pub name: String,
    /// Contact info (phone or e-mail).
    pub contact: String,
    /// Optional identity document.
    pub document: Option<String>,
}

/// Registry of participants, scoped per raffle.
///
/// Contact fields carry no uniqueness constraint — the same person buying
/// twice simply gets two records.
pub struct ParticipantRegistry {
    participants: DashMap<ParticipantId, Participant>,
}

impl ParticipantRegistry {
    /// Create a new, empty registry.
    pub fn new() -> Self {
        Self {
            participants: DashMap::new(),
        }
    }

    /// Register a participant for a raffle.
    pub fn register(
        &self,
        raffle_id: RaffleId,
        draft: ParticipantDraft,
    ) -> Result<Participant, EngineError> {
        if draft.name.trim().is_empty() {
            return Err(CoreError::ValidationError("participant name is empty".into()).into());
        }
        if draft.contact.trim().is_empty() {
            return Err(CoreError::ValidationError("participant contact is empty".into()).into());
        }

        let participant = Participant {
            id: ParticipantId::new(),
            raffle_id,
            name: draft.name,
            contact: draft.contact,
            document: draft.document,
            created_at: Utc::now(),
        };
        self.participants.insert(participant.id, participant.clone());
        tracing::info!(
            participant_id = %participant.id,
            raffle_id = %raffle_id,
            "participant registered"
        );
        Ok(participant)
    }

    /// Get a participant by ID.
    pub fn get(&self, participant_id: ParticipantId) -> Result<Participant, EngineError> {
        self.participants
            .get(&participant_id)
            .map(|entry| entry.clone())
            .ok_or(EngineError::ParticipantNotFound(participant_id))
    }

    /// Remove a participant record.
    ///
    /// Only removes the record itself; clearing the weak references held by
    /// tickets is the orchestrator's job.
    pub fn remove(&self, participant_id: ParticipantId) -> Result<Participant, EngineError> {
        self.participants
            .remove(&participant_id)
            .map(|(_, participant)| participant)
            .ok_or(EngineError::ParticipantNotFound(participant_id))
    }

    /// All participants of a raffle.
    pub fn participants_for_raffle(&self, raffle_id: RaffleId) -> Vec<Participant> {
        self.participants
            .iter()
            .filter(|entry| entry.raffle_id == raffle_id)
            .map(|entry| entry.clone())
            .collect()
    }

    /// Load a participant wholesale (snapshot hydration).
    pub fn hydrate(&self, participant: Participant) {
        self.participants.insert(participant.id, participant);
    }

    /// Number of registered participants.
    pub fn len(&self) -> usize {
        self.participants.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }
}

impl Default for ParticipantRegistry {
    fn default() -> Self {
        Self::new()
    }
}
