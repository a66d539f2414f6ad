//! Ticket persistence.
//!
//! A ticket grants one user entry to one event. Tickets carry no payload
//! of their own, so the record is its key: 16 bytes holding the user
//! identity followed by the event identity, both big-endian. Uniqueness
//! of that key is what makes a ticket unique, and the user-first layout
//! keeps one user's tickets contiguous for range scans.
//!
//! Creation verifies that both referents exist inside the same write
//! transaction that inserts the ticket. A failed check rolls the whole
//! transaction back, so no partial ticket is ever visible.

use redb::{ReadableTable, ReadableTableMetadata};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::codec;
use crate::db::{EVENTS, Store, TICKETS, USERS};
use crate::error::{StoreError, StoreResult};

/// A ticket held by one user for one event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ticket {
    /// The holding user's identity.
    pub user_id: u64,
    /// The attended event's identity.
    pub event_id: u64,
}

/// Create and read operations on ticket records.
#[derive(Clone)]
pub struct TicketStore {
    store: Store,
}

impl TicketStore {
    /// Create a new ticket store backed by `store`.
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Issue a ticket for `user_id` to attend `event_id`.
    ///
    /// Both the user and the event must already exist, and the pair must
    /// not already hold a ticket. All three checks happen in the write
    /// transaction that records the ticket.
    #[instrument(skip(self))]
    pub async fn create(&self, user_id: u64, event_id: u64) -> StoreResult<Ticket> {
        let ticket = self
            .store
            .write(move |txn| {
                let users = txn.open_table(USERS)?;
                if users.get(codec::id_key(user_id).as_slice())?.is_none() {
                    return Err(StoreError::MissingReference {
                        entity: "user",
                        id: user_id,
                    });
                }

                let events = txn.open_table(EVENTS)?;
                if events.get(codec::id_key(event_id).as_slice())?.is_none() {
                    return Err(StoreError::MissingReference {
                        entity: "event",
                        id: event_id,
                    });
                }

                let mut tickets = txn.open_table(TICKETS)?;
                let key = codec::ticket_key(user_id, event_id);
                if tickets.insert(key.as_slice(), b"".as_slice())?.is_some() {
                    return Err(StoreError::DuplicateTicket { user_id, event_id });
                }

                Ok(Ticket { user_id, event_id })
            })
            .await?;

        debug!(user_id, event_id, "ticket created");
        Ok(ticket)
    }

    /// Fetch the ticket held by `user_id` for `event_id`, if any.
    #[instrument(skip(self))]
    pub async fn get(&self, user_id: u64, event_id: u64) -> StoreResult<Ticket> {
        self.store
            .read(move |txn| {
                let table = txn.open_table(TICKETS)?;
                match table.get(codec::ticket_key(user_id, event_id).as_slice())? {
                    Some(_) => Ok(Ticket { user_id, event_id }),
                    None => Err(StoreError::NotFound {
                        entity: "ticket",
                        id: format!("{user_id}/{event_id}"),
                    }),
                }
            })
            .await
    }

    /// List every ticket, ordered by user identity and then event identity.
    #[instrument(skip(self))]
    pub async fn list(&self) -> StoreResult<Vec<Ticket>> {
        self.store
            .read(|txn| {
                let table = txn.open_table(TICKETS)?;
                let mut tickets = Vec::new();
                for entry in table.iter()? {
                    let (key, _value) = entry?;
                    let (user_id, event_id) = codec::ticket_from_key(key.value())?;
                    tickets.push(Ticket { user_id, event_id });
                }
                Ok(tickets)
            })
            .await
    }

    /// List the tickets held by a single user, ordered by event identity.
    ///
    /// Runs a bounded range scan over the user's key prefix rather than
    /// filtering the full table.
    #[instrument(skip(self))]
    pub async fn list_for_user(&self, user_id: u64) -> StoreResult<Vec<Ticket>> {
        self.store
            .read(move |txn| {
                let table = txn.open_table(TICKETS)?;
                let lo = codec::ticket_key(user_id, 0);
                let hi = codec::ticket_key(user_id, u64::MAX);
                let mut tickets = Vec::new();
                for entry in table.range(lo.as_slice()..=hi.as_slice())? {
                    let (key, _value) = entry?;
                    let (user_id, event_id) = codec::ticket_from_key(key.value())?;
                    tickets.push(Ticket { user_id, event_id });
                }
                Ok(tickets)
            })
            .await
    }

    /// Return the total number of tickets.
    #[instrument(skip(self))]
    pub async fn count(&self) -> StoreResult<u64> {
        self.store
            .read(|txn| Ok(txn.open_table(TICKETS)?.len()?))
            .await
    }
}

// ── tests ────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event_store::EventStore;
    use crate::user_store::UserStore;

    fn setup() -> (tempfile::TempDir, UserStore, EventStore, TicketStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = Store::open(dir.path()).unwrap();
        (
            dir,
            UserStore::new(store.clone()),
            EventStore::new(store.clone()),
            TicketStore::new(store),
        )
    }

    #[tokio::test]
    async fn create_get_round_trip() {
        let (_dir, users, events, tickets) = setup();

        let user_id = users.create("bob", "smith", "bob@smith.com").await.unwrap();
        let event_id = events.create("GopherCon").await.unwrap();

        let ticket = tickets.create(user_id, event_id).await.unwrap();
        assert_eq!(ticket, Ticket { user_id, event_id });

        let fetched = tickets.get(user_id, event_id).await.unwrap();
        assert_eq!(fetched, ticket);
    }

    #[tokio::test]
    async fn create_requires_existing_user() {
        let (_dir, _users, events, tickets) = setup();

        let event_id = events.create("GopherCon").await.unwrap();

        let err = tickets.create(9, event_id).await.unwrap_err();
        assert!(
            matches!(err, StoreError::MissingReference { entity: "user", id: 9 }),
            "got: {err}"
        );
    }

    #[tokio::test]
    async fn create_requires_existing_event() {
        let (_dir, users, _events, tickets) = setup();

        let user_id = users.create("bob", "smith", "bob@smith.com").await.unwrap();

        let err = tickets.create(user_id, 9).await.unwrap_err();
        assert!(
            matches!(err, StoreError::MissingReference { entity: "event", id: 9 }),
            "got: {err}"
        );
    }

    #[tokio::test]
    async fn failed_create_writes_nothing() {
        let (_dir, users, _events, tickets) = setup();

        let user_id = users.create("bob", "smith", "bob@smith.com").await.unwrap();
        tickets.create(user_id, 9).await.unwrap_err();

        assert_eq!(tickets.count().await.unwrap(), 0);
        assert!(tickets.list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn duplicate_ticket_rejected() {
        let (_dir, users, events, tickets) = setup();

        let user_id = users.create("bob", "smith", "bob@smith.com").await.unwrap();
        let event_id = events.create("GopherCon").await.unwrap();
        tickets.create(user_id, event_id).await.unwrap();

        let err = tickets.create(user_id, event_id).await.unwrap_err();
        assert!(
            matches!(err, StoreError::DuplicateTicket { user_id: 1, event_id: 1 }),
            "got: {err}"
        );
        assert_eq!(tickets.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn get_missing_returns_not_found() {
        let (_dir, _users, _events, tickets) = setup();

        match tickets.get(1, 2).await.unwrap_err() {
            StoreError::NotFound { entity, id } => {
                assert_eq!(entity, "ticket");
                assert_eq!(id, "1/2");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn list_orders_by_user_then_event() {
        let (_dir, users, events, tickets) = setup();

        for name in ["bob", "alice"] {
            users
                .create(name, "smith", &format!("{name}@smith.com"))
                .await
                .unwrap();
        }
        events.create("GopherCon").await.unwrap();
        events.create("RustConf").await.unwrap();

        // Insert in scrambled order; the listing must come back sorted.
        tickets.create(2, 1).await.unwrap();
        tickets.create(1, 2).await.unwrap();
        tickets.create(2, 2).await.unwrap();
        tickets.create(1, 1).await.unwrap();

        let pairs: Vec<(u64, u64)> = tickets
            .list()
            .await
            .unwrap()
            .iter()
            .map(|t| (t.user_id, t.event_id))
            .collect();
        assert_eq!(pairs, vec![(1, 1), (1, 2), (2, 1), (2, 2)]);
    }

    #[tokio::test]
    async fn list_for_user_scans_only_that_user() {
        let (_dir, users, events, tickets) = setup();

        for name in ["bob", "alice"] {
            users
                .create(name, "smith", &format!("{name}@smith.com"))
                .await
                .unwrap();
        }
        events.create("GopherCon").await.unwrap();
        events.create("RustConf").await.unwrap();

        tickets.create(1, 1).await.unwrap();
        tickets.create(1, 2).await.unwrap();
        tickets.create(2, 1).await.unwrap();

        let bobs: Vec<u64> = tickets
            .list_for_user(1)
            .await
            .unwrap()
            .iter()
            .map(|t| t.event_id)
            .collect();
        assert_eq!(bobs, vec![1, 2]);

        let alices = tickets.list_for_user(2).await.unwrap();
        assert_eq!(alices, vec![Ticket { user_id: 2, event_id: 1 }]);

        assert!(tickets.list_for_user(3).await.unwrap().is_empty());
    }
}
