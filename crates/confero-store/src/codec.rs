//! Entity and key codecs.
//!
//! Values are encoded with `bincode`: a compact, deterministic binary
//! encoding that round-trips every field exactly and encodes the same
//! entity identically across process restarts. Keys are fixed-width
//! big-endian integers so that lexicographic order inside the engine
//! equals numeric identity order, which is what makes ordered `list`
//! scans and composite-key ranges work.
//!
//! Tickets carry no value payload at all: their 16-byte composite key is
//! the entire encoding, so the key helpers here double as the ticket
//! codec.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::{StoreError, StoreResult};

/// Byte width of a user or event identity key.
pub(crate) const ID_KEY_LEN: usize = 8;

/// Byte width of a composite (user, event) ticket key.
pub(crate) const TICKET_KEY_LEN: usize = 16;

/// Serialize an entity to its stored byte representation.
pub(crate) fn encode<T: Serialize>(entity: &'static str, value: &T) -> StoreResult<Vec<u8>> {
    bincode::serialize(value).map_err(|source| StoreError::Encode { entity, source })
}

/// Deserialize an entity from its stored byte representation.
///
/// `key` is carried into the error for context; decoding never panics,
/// malformed bytes always surface as [`StoreError::CorruptRecord`].
pub(crate) fn decode<T: DeserializeOwned>(
    entity: &'static str,
    key: u64,
    bytes: &[u8],
) -> StoreResult<T> {
    bincode::deserialize(bytes).map_err(|err| StoreError::CorruptRecord {
        entity,
        key: key.to_string(),
        reason: err.to_string(),
    })
}

/// Encode an identity as its 8-byte big-endian storage key.
pub(crate) fn id_key(id: u64) -> [u8; ID_KEY_LEN] {
    id.to_be_bytes()
}

/// Decode an 8-byte big-endian storage key back into an identity.
pub(crate) fn id_from_key(entity: &'static str, key: &[u8]) -> StoreResult<u64> {
    if key.len() != ID_KEY_LEN {
        return Err(StoreError::CorruptRecord {
            entity,
            key: format!("{key:02x?}"),
            reason: format!("expected {ID_KEY_LEN}-byte identity key, got {}", key.len()),
        });
    }
    let mut buf = [0u8; ID_KEY_LEN];
    buf.copy_from_slice(key);
    Ok(u64::from_be_bytes(buf))
}

/// Encode a (user, event) pair as its 16-byte composite storage key.
///
/// The user identity comes first, so all of a user's tickets are adjacent
/// in key order and reachable with a single range scan.
pub(crate) fn ticket_key(user_id: u64, event_id: u64) -> [u8; TICKET_KEY_LEN] {
    let mut key = [0u8; TICKET_KEY_LEN];
    key[..ID_KEY_LEN].copy_from_slice(&user_id.to_be_bytes());
    key[ID_KEY_LEN..].copy_from_slice(&event_id.to_be_bytes());
    key
}

/// Decode a 16-byte composite ticket key back into its (user, event) pair.
pub(crate) fn ticket_from_key(key: &[u8]) -> StoreResult<(u64, u64)> {
    if key.len() != TICKET_KEY_LEN {
        return Err(StoreError::CorruptRecord {
            entity: "ticket",
            key: format!("{key:02x?}"),
            reason: format!("expected {TICKET_KEY_LEN}-byte composite key, got {}", key.len()),
        });
    }
    let mut user = [0u8; ID_KEY_LEN];
    let mut event = [0u8; ID_KEY_LEN];
    user.copy_from_slice(&key[..ID_KEY_LEN]);
    event.copy_from_slice(&key[ID_KEY_LEN..]);
    Ok((u64::from_be_bytes(user), u64::from_be_bytes(event)))
}

// ── tests ────────────────────────────────────────────────────────────
