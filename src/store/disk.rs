use crate::core::store::KeyValueCollection;
use anyhow::Result;
use async_trait::async_trait;
use fjall::{Keyspace, PartitionHandle, PersistMode};
use std::sync::Arc;
use tracing::debug;

/// Collection stored in a fjall partition. Writes are synced before returning.
pub struct DiskCollection {
    keyspace: Arc<Keyspace>,
    partition: PartitionHandle,
}

impl DiskCollection {
    pub fn new(keyspace: Arc<Keyspace>, partition: PartitionHandle) -> Self {
        Self {
            keyspace,
            partition,
        }
    }
}

#[async_trait]
impl KeyValueCollection for DiskCollection {
    async fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.partition.get(key) {
            Ok(Some(value)) => {
                debug!("Store HIT for key: {}", String::from_utf8_lossy(key));
                Some(value.to_vec())
            }
            Ok(None) => {
                debug!("Store MISS for key: {}", String::from_utf8_lossy(key));
                None
            }
            Err(e) => {
                debug!("DiskCollection get error: {}", e);
                None
            }
        }
    }

    async fn put(&self, key: &[u8], value: Vec<u8>) -> Result<()> {
        self.partition.insert(key, value)?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!("Store PUT for key: {}", String::from_utf8_lossy(key));
        Ok(())
    }

    async fn remove(&self, key: &[u8]) -> Result<()> {
        self.partition.remove(key)?;
        self.keyspace.persist(PersistMode::SyncAll)?;
        debug!("Store REMOVE for key: {}", String::from_utf8_lossy(key));
        Ok(())
    }

    async fn values(&self) -> Result<Vec<Vec<u8>>> {
        self.partition
            .iter()
            .map(|entry| Ok(entry?.1.to_vec()))
            .collect()
    }
}
