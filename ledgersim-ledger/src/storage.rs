//! storage.rs
//!
//! Snapshot persistence for the registry. Every mutation rewrites the full
//! snapshot; there is no incremental log.

use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use ledgersim_common::{Peer, Result};

/// Where the registry snapshot lives.
pub trait SnapshotPersistence: Send + Sync {
    /// `Ok(None)` when nothing was persisted yet.
    fn load(&self) -> Result<Option<Vec<Peer>>>;

    fn save(&self, peers: &[Peer]) -> Result<()>;
}

/// JSON snapshot on the local filesystem.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    path: PathBuf,
}

impl SnapshotStore {
    pub fn new<P: AsRef<Path>>(data_dir: P, file_name: &str) -> Result<Self> {
        fs::create_dir_all(&data_dir)?;
        Ok(Self {
            path: data_dir.as_ref().join(file_name),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SnapshotPersistence for SnapshotStore {
    fn load(&self) -> Result<Option<Vec<Peer>>> {
        if !self.path.exists() {
            return Ok(None);
        }
        let data = fs::read(&self.path)?;
        let peers = serde_json::from_slice::<Vec<Peer>>(&data)?;
        debug!("📂 Snapshot carregado de {:?} ({} peers)", self.path, peers.len());
        Ok(Some(peers))
    }

    fn save(&self, peers: &[Peer]) -> Result<()> {
        let data = serde_json::to_vec_pretty(peers)?;
        // atomic replace: tmp file, then rename
        let tmp_path = self.path.with_extension("json.tmp");
        fs::write(&tmp_path, data)?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

/// Keeps the last snapshot in memory. Used when no data directory is wanted.
#[derive(Debug, Default)]
pub struct MemoryStore {
    snapshot: std::sync::Mutex<Option<Vec<Peer>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl SnapshotPersistence for MemoryStore {
    fn load(&self) -> Result<Option<Vec<Peer>>> {
        let guard = self
            .snapshot
            .lock()
            .map_err(|e| ledgersim_common::LedgerError::Persistence(e.to_string()))?;
        Ok(guard.clone())
    }

    fn save(&self, peers: &[Peer]) -> Result<()> {
        let mut guard = self
            .snapshot
            .lock()
            .map_err(|e| ledgersim_common::LedgerError::Persistence(e.to_string()))?;
        *guard = Some(peers.to_vec());
        Ok(())
    }
}
