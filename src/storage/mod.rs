//! # Snapshot Storage
//!
//! LifeVerse persists a single user's entire game state as one JSON blob under
//! a namespaced key ([`SNAPSHOT_KEY`]). This module provides the backends that
//! hold that blob and the envelope format wrapped around it.
//!
//! ## Backends
//!
//! - [`SledBackend`] - on-disk store in a dedicated sled tree
//! - [`MemoryBackend`] - process-local map, useful for demos and tests
//!
//! Any type implementing [`SnapshotBackend`] can be handed to
//! [`GameStoreBuilder::with_backend`](crate::game::store::GameStoreBuilder::with_backend).
//!
//! ## Envelope
//!
//! ```json
//! { "schema_version": 1, "saved_at": "2026-10-14T09:00:00Z", "state": { ... } }
//! ```
//!
//! Decoding is strict. The store, not this module, decides what to do with a
//! blob that fails to decode (it falls back to the seed state).

use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::game::errors::LifeVerseError;
use crate::game::types::{GameState, SNAPSHOT_SCHEMA_VERSION};

/// Key the full snapshot is stored under.
pub const SNAPSHOT_KEY: &str = "lifeverse-storage";

const TREE_SNAPSHOTS: &str = "lifeverse_snapshots";

/// Key-value persistence for snapshot blobs.
pub trait SnapshotBackend: Send {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, LifeVerseError>;
    fn save(&self, key: &str, bytes: &[u8]) -> Result<(), LifeVerseError>;
    fn remove(&self, key: &str) -> Result<(), LifeVerseError>;
}

#[derive(Debug, Serialize, Deserialize)]
pub struct SnapshotEnvelope {
    pub schema_version: u8,
    pub saved_at: DateTime<Utc>,
    pub state: GameState,
}

pub fn encode_snapshot(state: &GameState) -> Result<Vec<u8>, LifeVerseError> {
    #[derive(Serialize)]
    struct Borrowed<'a> {
        schema_version: u8,
        saved_at: DateTime<Utc>,
        state: &'a GameState,
    }
    Ok(serde_json::to_vec(&Borrowed {
        schema_version: SNAPSHOT_SCHEMA_VERSION,
        saved_at: Utc::now(),
        state,
    })?)
}

pub fn decode_snapshot(bytes: &[u8]) -> Result<GameState, LifeVerseError> {
    let envelope: SnapshotEnvelope = serde_json::from_slice(bytes)?;
    if envelope.schema_version != SNAPSHOT_SCHEMA_VERSION {
        return Err(LifeVerseError::InvalidState(format!(
            "snapshot schema mismatch: expected {}, got {}",
            SNAPSHOT_SCHEMA_VERSION, envelope.schema_version
        )));
    }
    Ok(envelope.state)
}

/// Sled-backed snapshot storage.
pub struct SledBackend {
    _db: sled::Db,
    snapshots: sled::Tree,
}

impl SledBackend {
    /// Open (or create) the database rooted at `path`.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, LifeVerseError> {
        let path_ref = path.as_ref();
        std::fs::create_dir_all(path_ref)?;
        let db = sled::open(path_ref)?;
        Self::from_db(db)
    }

    /// Share an already opened database (the record service lives in the same one).
    pub fn from_db(db: sled::Db) -> Result<Self, LifeVerseError> {
        let snapshots = db.open_tree(TREE_SNAPSHOTS)?;
        Ok(Self { _db: db, snapshots })
    }
}

impl SnapshotBackend for SledBackend {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, LifeVerseError> {
        Ok(self.snapshots.get(key.as_bytes())?.map(|v| v.to_vec()))
    }

    fn save(&self, key: &str, bytes: &[u8]) -> Result<(), LifeVerseError> {
        self.snapshots.insert(key.as_bytes(), bytes)?;
        self.snapshots.flush()?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), LifeVerseError> {
        self.snapshots.remove(key.as_bytes())?;
        self.snapshots.flush()?;
        Ok(())
    }
}

/// In-process snapshot storage. Contents vanish with the process.
#[derive(Default)]
pub struct MemoryBackend {
    entries: Mutex<HashMap<String, Vec<u8>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-load a raw blob, e.g. to simulate a corrupted save.
    pub fn with_entry(self, key: &str, bytes: Vec<u8>) -> Self {
        if let Ok(mut entries) = self.entries.lock() {
            entries.insert(key.to_string(), bytes);
        }
        self
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, Vec<u8>>>, LifeVerseError> {
        self.entries
            .lock()
            .map_err(|_| LifeVerseError::Internal("memory backend lock poisoned".to_string()))
    }
}

impl SnapshotBackend for MemoryBackend {
    fn load(&self, key: &str) -> Result<Option<Vec<u8>>, LifeVerseError> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn save(&self, key: &str, bytes: &[u8]) -> Result<(), LifeVerseError> {
        self.entries()?.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), LifeVerseError> {
        self.entries()?.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::state::initial_state;
    use tempfile::TempDir;

    #[test]
    fn snapshot_round_trips() {
        let mut state = initial_state("u1", "Ada");
        state.user.xp = 42;
        state.creatures[2].happiness = 77;

        let bytes = encode_snapshot(&state).unwrap();
        assert_eq!(decode_snapshot(&bytes).unwrap(), state);
    }

    #[test]
    fn wrong_schema_is_rejected() {
        let state = initial_state("u1", "Ada");
        let mut value: serde_json::Value = serde_json::from_slice(&encode_snapshot(&state).unwrap()).unwrap();
        value["schema_version"] = serde_json::json!(99);
        let bytes = serde_json::to_vec(&value).unwrap();
        assert!(decode_snapshot(&bytes).is_err());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(decode_snapshot(b"{not json").is_err());
    }

    #[test]
    fn sled_backend_persists_across_reopen() {
        let dir = TempDir::new().expect("tempdir");
        {
            let backend = SledBackend::open(dir.path()).unwrap();
            backend.save(SNAPSHOT_KEY, b"hello").unwrap();
        }
        let backend = SledBackend::open(dir.path()).unwrap();
        assert_eq!(backend.load(SNAPSHOT_KEY).unwrap(), Some(b"hello".to_vec()));
        backend.remove(SNAPSHOT_KEY).unwrap();
        assert_eq!(backend.load(SNAPSHOT_KEY).unwrap(), None);
    }

    #[test]
    fn memory_backend_basic_ops() {
        let backend = MemoryBackend::new().with_entry("k", vec![1, 2]);
        assert_eq!(backend.load("k").unwrap(), Some(vec![1, 2]));
        backend.save("k", &[3]).unwrap();
        assert_eq!(backend.load("k").unwrap(), Some(vec![3]));
        backend.remove("k").unwrap();
        assert!(backend.load("k").unwrap().is_none());
    }
}
