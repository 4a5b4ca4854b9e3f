//! Persistence gateway boundary and the blob format for both collections.
//!
//! The gateway is an injected key/value capability. Each collection is
//! stored under its own key as a JSON array in registry / append order.

use crate::ledger::AttendanceRecord;
use crate::registry::KnownIdentity;
use std::collections::HashMap;
use std::sync::Mutex;
use thiserror::Error;

/// Key holding the registry blob.
pub const KNOWN_FACES_KEY: &str = "known_faces";
/// Key holding the ledger blob.
pub const ATTENDANCE_RECORDS_KEY: &str = "attendance_records";

#[derive(Error, Debug)]
pub enum PersistenceError {
    #[error("failed to load {key}: {reason}")]
    LoadFailed { key: String, reason: String },
    #[error("failed to save {key}: {reason}")]
    WriteFailed { key: String, reason: String },
    #[error("corrupt {key} blob: {source}")]
    Decode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("failed to encode {key}: {source}")]
    Encode {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

/// Durable key/value storage for serialized collections.
pub trait PersistenceGateway: Send {
    /// Return the blob stored under `key`, or `None` if nothing was saved yet.
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError>;

    /// Replace the blob stored under `key`.
    fn save(&self, key: &str, blob: &[u8]) -> Result<(), PersistenceError>;
}

impl<G: PersistenceGateway + Sync + ?Sized> PersistenceGateway for std::sync::Arc<G> {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        (**self).load(key)
    }

    fn save(&self, key: &str, blob: &[u8]) -> Result<(), PersistenceError> {
        (**self).save(key, blob)
    }
}

pub fn encode_identities(identities: &[KnownIdentity]) -> Result<Vec<u8>, PersistenceError> {
    serde_json::to_vec(identities).map_err(|source| PersistenceError::Encode {
        key: KNOWN_FACES_KEY.into(),
        source,
    })
}

pub fn decode_identities(blob: &[u8]) -> Result<Vec<KnownIdentity>, PersistenceError> {
    serde_json::from_slice(blob).map_err(|source| PersistenceError::Decode {
        key: KNOWN_FACES_KEY.into(),
        source,
    })
}

pub fn encode_records(records: &[AttendanceRecord]) -> Result<Vec<u8>, PersistenceError> {
    serde_json::to_vec(records).map_err(|source| PersistenceError::Encode {
        key: ATTENDANCE_RECORDS_KEY.into(),
        source,
    })
}

pub fn decode_records(blob: &[u8]) -> Result<Vec<AttendanceRecord>, PersistenceError> {
    serde_json::from_slice(blob).map_err(|source| PersistenceError::Decode {
        key: ATTENDANCE_RECORDS_KEY.into(),
        source,
    })
}

/// Load the registry blob; absent data means an empty registry.
pub fn load_identities(
    gateway: &dyn PersistenceGateway,
) -> Result<Vec<KnownIdentity>, PersistenceError> {
    match gateway.load(KNOWN_FACES_KEY)? {
        Some(blob) => decode_identities(&blob),
        None => Ok(Vec::new()),
    }
}

/// Load the ledger blob (append order); absent data means an empty ledger.
pub fn load_records(
    gateway: &dyn PersistenceGateway,
) -> Result<Vec<AttendanceRecord>, PersistenceError> {
    match gateway.load(ATTENDANCE_RECORDS_KEY)? {
        Some(blob) => decode_records(&blob),
        None => Ok(Vec::new()),
    }
}

/// Process-local gateway. Nothing survives a restart; used for tests and
/// throwaway sessions.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    blobs: Mutex<HashMap<String, Vec<u8>>>,
    fail_writes: Mutex<bool>,
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make subsequent `save` calls fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        if let Ok(mut flag) = self.fail_writes.lock() {
            *flag = fail;
        }
    }

    /// Raw blob currently stored under `key`.
    pub fn blob(&self, key: &str) -> Option<Vec<u8>> {
        self.blobs.lock().ok()?.get(key).cloned()
    }
}

impl PersistenceGateway for MemoryGateway {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, PersistenceError> {
        let blobs = self.blobs.lock().map_err(|e| PersistenceError::LoadFailed {
            key: key.into(),
            reason: e.to_string(),
        })?;
        Ok(blobs.get(key).cloned())
    }

    fn save(&self, key: &str, blob: &[u8]) -> Result<(), PersistenceError> {
        let failing = self.fail_writes.lock().map(|flag| *flag).unwrap_or(false);
        if failing {
            return Err(PersistenceError::WriteFailed {
                key: key.into(),
                reason: "writes disabled".into(),
            });
        }
        let mut blobs = self.blobs.lock().map_err(|e| PersistenceError::WriteFailed {
            key: key.into(),
            reason: e.to_string(),
        })?;
        blobs.insert(key.to_string(), blob.to_vec());
        Ok(())
    }
}
