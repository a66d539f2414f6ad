//! User persistence.
//!
//! Users are attendees, speakers, or sponsor contacts. Records are stored
//! under their 8-byte big-endian identity key, so enumeration order is
//! identity order. The store assigns identities; callers never supply
//! them. Email format validation belongs to the service layer, not here.

use redb::{ReadableTable, ReadableTableMetadata};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::codec;
use crate::db::{self, Store, USERS};
use crate::error::{StoreError, StoreResult};

// ═══════════════════════════════════════════════════════════════════════
//  Types
// ═══════════════════════════════════════════════════════════════════════

/// A person in the system: attendee, speaker, sponsor contact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Unique identifier, assigned by the store on create.
    pub id: u64,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub last_name: String,
    /// Contact email. Stored verbatim; not validated here.
    pub email: String,
}

// ═══════════════════════════════════════════════════════════════════════
//  UserStore
// ═══════════════════════════════════════════════════════════════════════

/// Create and read operations on user records.
#[derive(Clone)]
pub struct UserStore {
    store: Store,
}

impl UserStore {
    /// Create a new user store backed by `store`.
    pub fn new(store: Store) -> Self {
        Self { store }
    }

    /// Create a user and return its newly assigned identity.
    ///
    /// The identity allocation and the record insert commit in one
    /// transaction: either both become visible or neither does.
    #[instrument(skip(self))]
    pub async fn create(
        &self,
        first_name: &str,
        last_name: &str,
        email: &str,
    ) -> StoreResult<u64> {
        let first_name = first_name.to_string();
        let last_name = last_name.to_string();
        let email = email.to_string();

        let id = self
            .store
            .write(move |txn| {
                let id = db::next_id(txn, "users")?;
                let user = User {
                    id,
                    first_name,
                    last_name,
                    email,
                };
                let buf = codec::encode("user", &user)?;

                let mut table = txn.open_table(USERS)?;
                table.insert(codec::id_key(id).as_slice(), buf.as_slice())?;
                Ok(id)
            })
            .await?;

        debug!(user_id = id, "user created");
        Ok(id)
    }

    /// Fetch a single user by identity.
    #[instrument(skip(self))]
    pub async fn get(&self, id: u64) -> StoreResult<User> {
        self.store
            .read(move |txn| {
                let table = txn.open_table(USERS)?;
                match table.get(codec::id_key(id).as_slice())? {
                    Some(value) => codec::decode("user", id, value.value()),
                    None => Err(StoreError::NotFound {
                        entity: "user",
                        id: id.to_string(),
                    }),
                }
            })
            .await
    }

    /// List all users in ascending identity order.
    ///
    /// Each call scans a fresh consistent snapshot. A record that fails to
    /// decode aborts the whole call with [`StoreError::CorruptRecord`]
    /// rather than silently dropping data.
    #[instrument(skip(self))]
    pub async fn list(&self) -> StoreResult<Vec<User>> {
        self.store
            .read(|txn| {
                let table = txn.open_table(USERS)?;
                let mut users = Vec::new();
                for entry in table.iter()? {
                    let (key, value) = entry?;
                    let id = codec::id_from_key("user", key.value())?;
                    users.push(codec::decode("user", id, value.value())?);
                }
                Ok(users)
            })
            .await
    }

    /// Return the total number of users.
    #[instrument(skip(self))]
    pub async fn count(&self) -> StoreResult<u64> {
        self.store
            .read(|txn| Ok(txn.open_table(USERS)?.len()?))
            .await
    }
}

// ── tests ────────────────────────────────────────────────────────────
