//! Event persistence.
//!
//! A conference event is a named occurrence users hold tickets for.
//! Records follow the same layout as users: 8-byte big-endian identity
//! keys, bincode-encoded values, identities assigned by the store.

use redb::{ReadableTable, ReadableTableMetadata};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::codec;
use crate::db::{self, EVENTS, Store};
use crate::error::{StoreError, StoreResult};

/// A specific conference event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// Unique identifier, assigned by the store on create.
    pub id: u64,
    /// Human-readable event name.
    pub name: String,
}

/// Create and read operations on event records.
#[derive(Clone)]
pub struct EventStore {
    store: Store,
}

impl EventStore {
    /// Create a new event store backed by `store`.
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Create an event and return its newly assigned identity.
    #[instrument(skip(self))]
    pub async fn create(&self, name: &str) -> StoreResult<u64> {
        let name = name.to_string();

        let id = self
            .store
            .write(move |txn| {
                let id = db::next_id(txn, "events")?;
                let event = Event { id, name };
                let buf = codec::encode("event", &event)?;

                let mut table = txn.open_table(EVENTS)?;
                table.insert(codec::id_key(id).as_slice(), buf.as_slice())?;
                Ok(id)
            })
            .await?;

        debug!(event_id = id, "event created");
        Ok(id)
    }

    /// Fetch a single event by identity.
    #[instrument(skip(self))]
    pub async fn get(&self, id: u64) -> StoreResult<Event> {
        self.store
            .read(move |txn| {
                let table = txn.open_table(EVENTS)?;
                match table.get(codec::id_key(id).as_slice())? {
                    Some(value) => codec::decode("event", id, value.value()),
                    None => Err(StoreError::NotFound {
                        entity: "event",
                        id: id.to_string(),
                    }),
                }
            })
            .await
    }

    /// List all events in ascending identity order.
    #[instrument(skip(self))]
    pub async fn list(&self) -> StoreResult<Vec<Event>> {
        self.store
            .read(|txn| {
                let table = txn.open_table(EVENTS)?;
                let mut events = Vec::new();
                for entry in table.iter()? {
                    let (key, value) = entry?;
                    let id = codec::id_from_key("event", key.value())?;
                    events.push(codec::decode("event", id, value.value())?);
                }
                Ok(events)
            })
            .await
    }

    /// Return the total number of events.
    #[instrument(skip(self))]
    pub async fn count(&self) -> StoreResult<u64> {
        self.store
            .read(|txn| Ok(txn.open_table(EVENTS)?.len()?))
            .await
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn setup() -> (tempfile::TempDir, EventStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        (dir, EventStore::new(store))
    }

    #[tokio::test]
    async fn create_get_round_trip() {
        let (_dir, events) = setup();

        let id = events.create("GopherCon").await.unwrap();
        assert_eq!(id, 1);

        let event = events.get(id).await.unwrap();
        assert_eq!(
            event,
            Event {
                id: 1,
                name: "GopherCon".into(),
            }
        );
    }

    #[tokio::test]
    async fn get_missing_returns_not_found() {
        let (_dir, events) = setup();

        let err = events.get(7).await.unwrap_err();
        assert!(
            matches!(err, StoreError::NotFound { entity: "event", .. }),
            "got: {err}"
        );
    }

    #[tokio::test]
    async fn list_orders_by_identity() {
        let (_dir, events) = setup();

        events.create("RustConf").await.unwrap();
        events.create("GopherCon").await.unwrap();
        events.create("StrangeLoop").await.unwrap();

        let all = events.list().await.unwrap();
        let ids: Vec<u64> = all.iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(all[1].name, "GopherCon");
    }

    #[tokio::test]
    async fn count_tracks_creates() {
        let (_dir, events) = setup();

        assert_eq!(events.count().await.unwrap(), 0);
        events.create("RustConf").await.unwrap();
        events.create("GopherCon").await.unwrap();
        assert_eq!(events.count().await.unwrap(), 2);
    }
}
