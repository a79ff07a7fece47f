pub mod disk;
pub mod memory;

use crate::core::store::{KeyValueCollection, Store};
use anyhow::{Context, Result};
use disk::DiskCollection;
use fjall::{Keyspace, PartitionCreateOptions};
use memory::MemoryCollection;
use std::{
    collections::HashMap,
    path::Path,
    sync::{Arc, PoisonError, RwLock},
};
use tracing::debug;

/// A thread-safe key-value store that can hold multiple collections.
pub struct KeyValueStore {
    collections: RwLock<HashMap<String, Arc<dyn KeyValueCollection>>>,
    keyspace: Option<Arc<Keyspace>>,
}

impl KeyValueStore {
    /// Opens a store whose persistent collections live under `data_path`.
    pub fn open(data_path: &Path) -> Result<Self> {
        let store_dir = data_path.join("store");
        let keyspace = fjall::Config::new(&store_dir)
            .open()
            .with_context(|| format!("Failed to open data store at {}", store_dir.display()))?;
        debug!("Opened data store at {}", store_dir.display());

        Ok(Self {
            collections: RwLock::new(HashMap::new()),
            keyspace: Some(Arc::new(keyspace)),
        })
    }

    /// A store without disk backing; persistent collections are unavailable.
    pub fn in_memory() -> Self {
        Self {
            collections: RwLock::new(HashMap::new()),
            keyspace: None,
        }
    }

    fn create_collection(&self, name: &str, persist: bool) -> Option<Arc<dyn KeyValueCollection>> {
        if !persist {
            return Some(Arc::new(MemoryCollection::new()));
        }
        let keyspace = self.keyspace.as_ref()?;
        match keyspace.open_partition(name, PartitionCreateOptions::default()) {
            Ok(partition) => Some(Arc::new(DiskCollection::new(
                Arc::clone(keyspace),
                partition,
            ))),
            Err(e) => {
                debug!("Failed to open partition {}: {}", name, e);
                None
            }
        }
    }
}

impl Default for KeyValueStore {
    fn default() -> Self {
        Self::in_memory()
    }
}

impl Store for KeyValueStore {
    fn get_collection(
        &self,
        name: &str,
        persist: bool,
        create_if_missing: bool,
    ) -> Option<Arc<dyn KeyValueCollection>> {
        if create_if_missing {
            let mut collections = self
                .collections
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            if !collections.contains_key(name) {
                let collection = self.create_collection(name, persist)?;
                collections.insert(name.to_string(), collection);
            }
        }

        let collections = self
            .collections
            .read()
            .unwrap_or_else(PoisonError::into_inner);
        collections.get(name).cloned()
    }

    fn remove_collection(&self, name: &str) -> bool {
        let mut collections = self
            .collections
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        collections.remove(name).is_some()
    }
}
