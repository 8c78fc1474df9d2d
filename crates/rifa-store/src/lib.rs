//! RocksDB persistence for the Rifa settlement engine.
//!
//! One column family per entity table, mirroring the engine's data model:
//! raffles, tickets, participants, payments (with audit history), draws, and
//! open purchase records. Records are JSON-encoded and keyed by their UUID.

use std::path::Path;

use rifa_core::{Draw, Participant, Raffle, Ticket};
use rifa_engine::{EngineSnapshot, PaymentRecord, Purchase};
use rocksdb::{ColumnFamilyDescriptor, IteratorMode, Options, DB};
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Column family names for the entity tables.
const CF_RAFFLES: &str = "raffles";
const CF_TICKETS: &str = "tickets";
const CF_PARTICIPANTS: &str = "participants";
const CF_PAYMENTS: &str = "payments";
const CF_DRAWS: &str = "draws";
const CF_PURCHASES: &str = "purchases";

const ALL_CFS: [&str; 6] = [
    CF_RAFFLES,
    CF_TICKETS,
    CF_PARTICIPANTS,
    CF_PAYMENTS,
    CF_DRAWS,
    CF_PURCHASES,
];

/// Storage-layer errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("column family '{0}' not found")]
    ColumnFamilyNotFound(String),

    #[error("database error: {0}")]
    Database(#[from] rocksdb::Error),

    #[error("encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// RocksDB-backed store for engine state.
pub struct RaffleStore {
    db: DB,
}

impl RaffleStore {
    /// Open or create the database at the given path with all column
    /// families.
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        std::fs::create_dir_all(path)?;

        let mut opts = Options::default();
        opts.create_if_missing(true);
        opts.create_missing_column_families(true);

        let cf_descriptors: Vec<ColumnFamilyDescriptor> = ALL_CFS
            .iter()
            .map(|name| ColumnFamilyDescriptor::new(*name, Options::default()))
            .collect();

        let db = DB::open_cf_descriptors(&opts, path, cf_descriptors)?;
        Ok(Self { db })
    }

    fn put<T: Serialize>(&self, cf_name: &str, key: &str, value: &T) -> Result<(), StoreError> {
        let cf = self
            .db
            .cf_handle(cf_name)
            .ok_or_else(|| StoreError::ColumnFamilyNotFound(cf_name.to_string()))?;
        let encoded = serde_json::to_vec(value)?;
        self.db.put_cf(&cf, key.as_bytes(), encoded)?;
        Ok(())
    }

    fn get<T: DeserializeOwned>(&self, cf_name: &str, key: &str) -> Result<Option<T>, StoreError> {
        let cf = self
            .db
            .cf_handle(cf_name)
            .ok_or_else(|| StoreError::ColumnFamilyNotFound(cf_name.to_string()))?;
        match self.db.get_cf(&cf, key.as_bytes())? {
            Some(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            None => Ok(None),
        }
    }

    fn list<T: DeserializeOwned>(&self, cf_name: &str) -> Result<Vec<T>, StoreError> {
        let cf = self
            .db
            .cf_handle(cf_name)
            .ok_or_else(|| StoreError::ColumnFamilyNotFound(cf_name.to_string()))?;
        let mut records = Vec::new();
        for item in self.db.iterator_cf(&cf, IteratorMode::Start) {
            let (_, value) = item?;
            records.push(serde_json::from_slice(&value)?);
        }
        Ok(records)
    }

    fn clear(&self, cf_name: &str) -> Result<(), StoreError> {
        let cf = self
            .db
            .cf_handle(cf_name)
            .ok_or_else(|| StoreError::ColumnFamilyNotFound(cf_name.to_string()))?;
        let keys: Vec<Box<[u8]>> = self
            .db
            .iterator_cf(&cf, IteratorMode::Start)
            .map(|item| item.map(|(key, _)| key))
            .collect::<Result<_, _>>()?;
        for key in keys {
            self.db.delete_cf(&cf, key)?;
        }
        Ok(())
    }

    /// Store a raffle record.
    pub fn put_raffle(&self, raffle: &Raffle) -> Result<(), StoreError> {
        self.put(CF_RAFFLES, &raffle.id.to_string(), raffle)
    }

    /// Get a raffle record by ID.
    pub fn get_raffle(&self, id: &str) -> Result<Option<Raffle>, StoreError> {
        self.get(CF_RAFFLES, id)
    }

    /// Store a ticket record.
    pub fn put_ticket(&self, ticket: &Ticket) -> Result<(), StoreError> {
        self.put(CF_TICKETS, &ticket.id.to_string(), ticket)
    }

    /// Store a participant record.
    pub fn put_participant(&self, participant: &Participant) -> Result<(), StoreError> {
        self.put(CF_PARTICIPANTS, &participant.id.to_string(), participant)
    }

    /// Store a payment record with its audit history.
    pub fn put_payment(&self, record: &PaymentRecord) -> Result<(), StoreError> {
        self.put(CF_PAYMENTS, &record.payment.id.to_string(), record)
    }

    /// Get a payment record by ID.
    pub fn get_payment(&self, id: &str) -> Result<Option<PaymentRecord>, StoreError> {
        self.get(CF_PAYMENTS, id)
    }

    /// Store a draw record.
    pub fn put_draw(&self, draw: &Draw) -> Result<(), StoreError> {
        self.put(CF_DRAWS, &draw.id.to_string(), draw)
    }

    /// Store an open purchase record.
    pub fn put_purchase(&self, purchase: &Purchase) -> Result<(), StoreError> {
        self.put(CF_PURCHASES, &purchase.payment_id.to_string(), purchase)
    }

    /// Persist a full engine snapshot, replacing whatever was stored.
    pub fn save_snapshot(&self, snapshot: &EngineSnapshot) -> Result<(), StoreError> {
        for cf_name in ALL_CFS {
            self.clear(cf_name)?;
        }
        for raffle in &snapshot.raffles {
            self.put_raffle(raffle)?;
        }
        for ticket in &snapshot.tickets {
            self.put_ticket(ticket)?;
        }
        for participant in &snapshot.participants {
            self.put_participant(participant)?;
        }
        for record in &snapshot.payments {
            self.put_payment(record)?;
        }
        for draw in &snapshot.draws {
            self.put_draw(draw)?;
        }
        for purchase in &snapshot.purchases {
            self.put_purchase(purchase)?;
        }
        tracing::debug!(
            raffles = snapshot.raffles.len(),
            tickets = snapshot.tickets.len(),
            payments = snapshot.payments.len(),
            "snapshot saved"
        );
        Ok(())
    }

    /// Load the stored engine snapshot. Empty tables yield an empty
    /// snapshot, not an error.
    pub fn load_snapshot(&self) -> Result<EngineSnapshot, StoreError> {
        Ok(EngineSnapshot {
            raffles: self.list(CF_RAFFLES)?,
            tickets: self.list(CF_TICKETS)?,
            participants: self.list(CF_PARTICIPANTS)?,
            payments: self.list(CF_PAYMENTS)?,
            draws: self.list(CF_DRAWS)?,
            purchases: self.list(CF_PURCHASES)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use rifa_core::{Amount, RaffleId, RaffleStatus, TicketId, TicketStatus};
    use std::path::PathBuf;

    fn temp_dir() -> PathBuf {
        let dir = std::env::temp_dir().join(format!("rifa-test-{}", uuid::Uuid::now_v7()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn sample_raffle() -> Raffle {
        Raffle {
            id: RaffleId::new(),
            title: "Stored Raffle".into(),
            slug: Some("stored".into()),
            ticket_price: Amount::from_centavos(1000),
            total_tickets: 10,
            tickets_sold: 0,
            sale_starts_at: Utc::now(),
            sale_ends_at: Utc::now() + chrono::Duration::days(7),
            status: RaffleStatus::Active,
            payout_key: "pix:test".into(),
            created_at: Utc::now(),
        }
    }

    fn sample_ticket(raffle_id: RaffleId, number: u32) -> Ticket {
        Ticket {
            id: TicketId::new(),
            raffle_id,
            number,
            status: TicketStatus::Available,
            participant_id: None,
            seller_id: None,
            price: Amount::from_centavos(1000),
            reserved_until: None,
            sold_at: None,
        }
    }

    #[test]
    fn test_open_store() {
        let dir = temp_dir();
        assert!(RaffleStore::open(&dir).is_ok());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_put_get_raffle() {
        let dir = temp_dir();
        let store = RaffleStore::open(&dir).unwrap();

        let raffle = sample_raffle();
        store.put_raffle(&raffle).unwrap();
        let found = store.get_raffle(&raffle.id.to_string()).unwrap().unwrap();
        assert_eq!(found.id, raffle.id);
        assert_eq!(found.title, "Stored Raffle");

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_get_nonexistent() {
        let dir = temp_dir();
        let store = RaffleStore::open(&dir).unwrap();
        assert!(store
            .get_raffle(&RaffleId::new().to_string())
            .unwrap()
            .is_none());
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_snapshot_roundtrip() {
        let dir = temp_dir();
        let store = RaffleStore::open(&dir).unwrap();

        let raffle = sample_raffle();
        let snapshot = EngineSnapshot {
            raffles: vec![raffle.clone()],
            tickets: (1..=10).map(|n| sample_ticket(raffle.id, n)).collect(),
            participants: Vec::new(),
            payments: Vec::new(),
            draws: Vec::new(),
            purchases: Vec::new(),
        };
        store.save_snapshot(&snapshot).unwrap();

        let loaded = store.load_snapshot().unwrap();
        assert_eq!(loaded.raffles.len(), 1);
        assert_eq!(loaded.tickets.len(), 10);
        assert_eq!(loaded.raffles[0].id, raffle.id);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_save_snapshot_replaces_previous() {
        let dir = temp_dir();
        let store = RaffleStore::open(&dir).unwrap();

        let first = sample_raffle();
        store
            .save_snapshot(&EngineSnapshot {
                raffles: vec![first.clone()],
                ..Default::default()
            })
            .unwrap();

        let second = sample_raffle();
        store
            .save_snapshot(&EngineSnapshot {
                raffles: vec![second.clone()],
                ..Default::default()
            })
            .unwrap();

        let loaded = store.load_snapshot().unwrap();
        assert_eq!(loaded.raffles.len(), 1);
        assert_eq!(loaded.raffles[0].id, second.id);

        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn test_empty_store_loads_empty_snapshot() {
        let dir = temp_dir();
        let store = RaffleStore::open(&dir).unwrap();
        let loaded = store.load_snapshot().unwrap();
        assert!(loaded.raffles.is_empty());
        assert!(loaded.tickets.is_empty());
        std::fs::remove_dir_all(&dir).ok();
    }
}
