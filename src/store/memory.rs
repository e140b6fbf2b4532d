//! In-memory `KeyValueStore` backend.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::traits::KeyValueStore;
use crate::error::StoreError;

type Entries = HashMap<(String, String), String>;

/// Process-local store. Data does not survive `teardown()`.
#[derive(Default)]
pub struct MemoryStore {
    entries: RwLock<Option<Entries>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KeyValueStore for MemoryStore {
    async fn init(&self) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        if entries.is_none() {
            *entries = Some(HashMap::new());
        }
        Ok(())
    }

    async fn get(&self, scope: &str, key: &str) -> Result<Option<String>, StoreError> {
        let entries = self.entries.read().await;
        let entries = entries.as_ref().ok_or(StoreError::NotInitialized)?;
        Ok(entries.get(&(scope.to_string(), key.to_string())).cloned())
    }

    async fn set(&self, scope: &str, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.write().await;
        let entries = entries.as_mut().ok_or(StoreError::NotInitialized)?;
        entries.insert((scope.to_string(), key.to_string()), value.to_string());
        Ok(())
    }

    async fn remove(&self, scope: &str, key: &str) -> Result<bool, StoreError> {
        let mut entries = self.entries.write().await;
        let entries = entries.as_mut().ok_or(StoreError::NotInitialized)?;
        Ok(entries.remove(&(scope.to_string(), key.to_string())).is_some())
    }

    async fn teardown(&self) -> Result<(), StoreError> {
        *self.entries.write().await = None;
        Ok(())
    }
}
