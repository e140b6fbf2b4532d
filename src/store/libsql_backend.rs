//! libSQL backend: durable `KeyValueStore` implementation.
//!
//! Supports local file and in-memory databases. The connection is opened by
//! `init()` and dropped by `teardown()`.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use chrono::Utc;
use libsql::{Connection, Database, params};
use tokio::sync::RwLock;
use tracing::info;

use super::migrations;
use super::traits::KeyValueStore;
use crate::error::StoreError;

/// libSQL-backed preference store.
pub struct LibSqlStore {
    db: Database,
    location: String,
    conn: RwLock<Option<Connection>>,
}

impl LibSqlStore {
    /// Open (or create) a local database file. Call `init()` before use.
    pub async fn new_local(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                StoreError::Open(format!("Failed to create database directory: {e}"))
            })?;
        }

        let db = libsql::Builder::new_local(path)
            .build()
            .await
            .map_err(|e| StoreError::Open(format!("Failed to open libSQL database: {e}")))?;

        Ok(Self {
            db,
            location: path.display().to_string(),
            conn: RwLock::new(None),
        })
    }

    /// Create an in-memory database (for tests and the default dev setup).
    pub async fn new_memory() -> Result<Self, StoreError> {
        let db = libsql::Builder::new_local(":memory:")
            .build()
            .await
            .map_err(|e| StoreError::Open(format!("Failed to create in-memory database: {e}")))?;

        Ok(Self {
            db,
            location: ":memory:".to_string(),
            conn: RwLock::new(None),
        })
    }

    pub fn location(&self) -> PathBuf {
        PathBuf::from(&self.location)
    }

    async fn conn(&self) -> Result<Connection, StoreError> {
        self.conn
            .read()
            .await
            .as_ref()
            .cloned()
            .ok_or(StoreError::NotInitialized)
    }
}

#[async_trait]
impl KeyValueStore for LibSqlStore {
    async fn init(&self) -> Result<(), StoreError> {
        let mut slot = self.conn.write().await;
        if slot.is_some() {
            return Ok(());
        }
        let conn = self
            .db
            .connect()
            .map_err(|e| StoreError::Open(format!("Failed to create connection: {e}")))?;
        migrations::run_migrations(&conn).await?;
        *slot = Some(conn);
        info!(location = %self.location, "Preference store opened");
        Ok(())
    }

    async fn get(&self, scope: &str, key: &str) -> Result<Option<String>, StoreError> {
        let conn = self.conn().await?;
        let mut rows = conn
            .query(
                "SELECT value FROM preferences WHERE scope = ?1 AND key = ?2",
                params![scope, key],
            )
            .await
            .map_err(|e| StoreError::Query(format!("get: {e}")))?;

        match rows.next().await {
            Ok(Some(row)) => row
                .get::<String>(0)
                .map(Some)
                .map_err(|e| StoreError::Query(format!("get: {e}"))),
            Ok(None) => Ok(None),
            Err(e) => Err(StoreError::Query(format!("get: {e}"))),
        }
    }

    async fn set(&self, scope: &str, key: &str, value: &str) -> Result<(), StoreError> {
        let conn = self.conn().await?;
        let now = Utc::now().to_rfc3339();
        conn.execute(
            "INSERT INTO preferences (scope, key, value, updated_at) VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT (scope, key) DO UPDATE SET value = ?3, updated_at = ?4",
            params![scope, key, value, now],
        )
        .await
        .map_err(|e| StoreError::Query(format!("set: {e}")))?;
        Ok(())
    }

    async fn remove(&self, scope: &str, key: &str) -> Result<bool, StoreError> {
        let conn = self.conn().await?;
        let count = conn
            .execute(
                "DELETE FROM preferences WHERE scope = ?1 AND key = ?2",
                params![scope, key],
            )
            .await
            .map_err(|e| StoreError::Query(format!("remove: {e}")))?;
        Ok(count > 0)
    }

    async fn teardown(&self) -> Result<(), StoreError> {
        if self.conn.write().await.take().is_some() {
            info!(location = %self.location, "Preference store closed");
        }
        Ok(())
    }
}
