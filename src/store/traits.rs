//! `KeyValueStore` trait: scoped string key/value persistence.
//!
//! Every entry lives under a scope (one per browser client) and a key.
//! Backends must be `init()`-ed before use and may be `teardown()`-ed at
//! shutdown; any access outside that window fails with
//! `StoreError::NotInitialized`.

use async_trait::async_trait;

use crate::error::StoreError;

#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Open connections / create schema. Safe to call more than once.
    async fn init(&self) -> Result<(), StoreError>;

    async fn get(&self, scope: &str, key: &str) -> Result<Option<String>, StoreError>;

    /// Insert or overwrite a value.
    async fn set(&self, scope: &str, key: &str, value: &str) -> Result<(), StoreError>;

    /// Remove a value. Returns whether anything was removed.
    async fn remove(&self, scope: &str, key: &str) -> Result<bool, StoreError>;

    /// Release resources. Later calls fail until `init()` runs again.
    async fn teardown(&self) -> Result<(), StoreError>;
}
