use std::path::Path;

use anyhow::{Result, anyhow};
use tracing::{debug, warn};

use crate::{DirStore, MemoryStore, SqliteStore, Store};

/// Ranked list of backends tried in priority order.
///
/// Writes land in the first available backend that accepts them; copies in
/// every other backend are then dropped so a later read cannot return a
/// stale fallback entry. Reads return the first hit.
pub struct StoreChain {
    stores: Vec<Box<dyn Store>>,
}

impl StoreChain {
    pub fn new(stores: Vec<Box<dyn Store>>) -> Self {
        Self { stores }
    }

    /// SQLite file -> directory -> memory. A backend that fails to open is
    /// left out rather than failing the whole chain.
    pub fn standard(db_path: &Path, dir: &Path) -> Self {
        let mut stores: Vec<Box<dyn Store>> = Vec::with_capacity(3);

        match SqliteStore::open(db_path) {
            Ok(store) => stores.push(Box::new(store)),
            Err(e) => warn!("SQLite store unavailable at {}: {}", db_path.display(), e),
        }

        match DirStore::new(dir.to_path_buf()) {
            Ok(store) => stores.push(Box::new(store)),
            Err(e) => warn!("Directory store unavailable at {}: {}", dir.display(), e),
        }

        stores.push(Box::new(MemoryStore::new()));
        Self { stores }
    }

    /// Memory only.
    pub fn in_memory() -> Self {
        Self::new(vec![Box::new(MemoryStore::new())])
    }

    /// Names of the backends currently reporting available, in order.
    pub fn available(&self) -> Vec<&'static str> {
        self.stores
            .iter()
            .filter(|s| s.is_available())
            .map(|s| s.name())
            .collect()
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        for store in self.stores.iter().filter(|s| s.is_available()) {
            match store.get(key) {
                Ok(Some(value)) => return Ok(Some(value)),
                Ok(None) => {}
                Err(e) => warn!("{} store read failed for {}: {}", store.name(), key, e),
            }
        }
        Ok(None)
    }

    /// Returns the name of the backend that took the write.
    pub fn set(&self, key: &str, value: &str) -> Result<&'static str> {
        let mut written = None;
        for (idx, store) in self.stores.iter().enumerate() {
            if !store.is_available() {
                debug!("{} store unavailable, skipping", store.name());
                continue;
            }
            match store.set(key, value) {
                Ok(()) => {
                    written = Some(idx);
                    break;
                }
                Err(e) => {
                    warn!("{} store write failed for {}, trying next: {}", store.name(), key, e)
                }
            }
        }

        let idx = written.ok_or_else(|| anyhow!("No store accepted the write for {}", key))?;
        for (other, store) in self.stores.iter().enumerate() {
            if other != idx && store.is_available() {
                if let Err(e) = store.delete(key) {
                    warn!("{} store kept a stale copy of {}: {}", store.name(), key, e);
                }
            }
        }

        let name = self.stores[idx].name();
        debug!("Saved {} to {} store", key, name);
        Ok(name)
    }

    pub fn delete(&self, key: &str) -> Result<()> {
        for store in self.stores.iter().filter(|s| s.is_available()) {
            if let Err(e) = store.delete(key) {
                warn!("{} store delete failed for {}: {}", store.name(), key, e);
            }
        }
        Ok(())
    }

    pub fn keys(&self, prefix: &str) -> Result<Vec<String>> {
        let mut keys = Vec::new();
        for store in self.stores.iter().filter(|s| s.is_available()) {
            match store.keys(prefix) {
                Ok(found) => keys.extend(found),
                Err(e) => warn!("{} store key listing failed: {}", store.name(), e),
            }
        }
        keys.sort();
        keys.dedup();
        Ok(keys)
    }
}
