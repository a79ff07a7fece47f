//! Key-value persistence abstractions

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::sync::Arc;

/// A named collection of byte values keyed by byte strings.
#[async_trait]
pub trait KeyValueCollection: Send + Sync {
    async fn get(&self, key: &[u8]) -> Option<Vec<u8>>;
    async fn put(&self, key: &[u8], value: Vec<u8>) -> Result<()>;
    async fn remove(&self, key: &[u8]) -> Result<()>;
    async fn values(&self) -> Result<Vec<Vec<u8>>>;
}

pub trait Store: Send + Sync {
    fn get_collection(
        &self,
        name: &str,
        persist: bool,
        create_if_missing: bool,
    ) -> Option<Arc<dyn KeyValueCollection>>;

    fn remove_collection(&self, name: &str) -> bool;
}

pub async fn get_json<T: DeserializeOwned>(
    collection: &dyn KeyValueCollection,
    key: &str,
) -> Result<Option<T>> {
    match collection.get(key.as_bytes()).await {
        Some(bytes) => {
            let value = serde_json::from_slice(&bytes)
                .with_context(|| format!("Failed to decode stored value for key: {key}"))?;
            Ok(Some(value))
        }
        None => Ok(None),
    }
}

pub async fn put_json<T: Serialize + Sync>(
    collection: &dyn KeyValueCollection,
    key: &str,
    value: &T,
) -> Result<()> {
    let bytes = serde_json::to_vec(value)
        .with_context(|| format!("Failed to encode value for key: {key}"))?;
    collection
        .put(key.as_bytes(), bytes)
        .await
        .with_context(|| format!("Failed to store value for key: {key}"))
}

/// Decodes every value in the collection. A record that fails to decode is an error.
pub async fn all_json<T: DeserializeOwned>(collection: &dyn KeyValueCollection) -> Result<Vec<T>> {
    collection
        .values()
        .await?
        .iter()
        .map(|bytes| serde_json::from_slice(bytes).context("Failed to decode stored value"))
        .collect()
}
