//! # confero-store
//!
//! Storage engine for Confero.
//!
//! Provides embedded single-file persistence for conference users,
//! events, and tickets on top of `redb`, with serialized writers,
//! snapshot-isolated readers, and store-assigned monotonic identities
//! that survive restarts and are never reissued.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────┐
//! │  UserStore    EventStore    TicketStore  │
//! ├──────────────────────────────────────────┤
//! │  Store (serialized writes, MVCC reads)   │
//! │  identity sequences, bincode codec       │
//! ├──────────────────────────────────────────┤
//! │  redb (single-file B-tree, ACID)         │
//! └──────────────────────────────────────────┘
//! ```
//!
//! ## Quick start
//!
//! ```ignore
//! use confero_store::{EventStore, Store, TicketStore, UserStore};
//!
//! let store = Store::open("data/confero")?;
//! let users = UserStore::new(store.clone());
//! let events = EventStore::new(store.clone());
//! let tickets = TicketStore::new(store.clone());
//!
//! let user_id = users.create("bob", "smith", "bob@smith.com").await?;
//! let event_id = events.create("GopherCon").await?;
//! tickets.create(user_id, event_id).await?;
//! ```

mod codec;

pub mod db;
pub mod error;
pub mod event_store;
pub mod ticket_store;
pub mod user_store;

// ── re-exports ───────────────────────────────────────────────────────

pub use db::{DEFAULT_LOCK_TIMEOUT, Store};
pub use error::{StoreError, StoreResult};
pub use event_store::{Event, EventStore};
pub use ticket_store::{Ticket, TicketStore};
pub use user_store::{User, UserStore};
