//! Per-client preferences: display language and the admin session flag.

use std::sync::Arc;

use serde::Serialize;

use super::traits::KeyValueStore;
use crate::error::StoreError;
use crate::i18n::Language;
use crate::registration::validation::is_valid_email;

/// Stored keys, named as the site's browser storage names them.
pub mod keys {
    pub const ADMIN_AUTH: &str = "adminAuth";
    pub const ADMIN_EMAIL: &str = "adminEmail";
    pub const LANGUAGE: &str = "language";
}

/// Admin session state for one client.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AdminSession {
    pub authenticated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

/// Typed access to the preference keys of a [`KeyValueStore`].
#[derive(Clone)]
pub struct Preferences {
    store: Arc<dyn KeyValueStore>,
}

impl Preferences {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn KeyValueStore> {
        &self.store
    }

    /// Stored language, or Kannada when absent or unrecognised.
    pub async fn language(&self, client: &str) -> Result<Language, StoreError> {
        let stored = self.store.get(client, keys::LANGUAGE).await?;
        Ok(stored.as_deref().and_then(Language::parse).unwrap_or_default())
    }

    pub async fn set_language(&self, client: &str, language: Language) -> Result<(), StoreError> {
        self.store.set(client, keys::LANGUAGE, language.as_str()).await
    }

    pub async fn admin_session(&self, client: &str) -> Result<AdminSession, StoreError> {
        let authenticated = self.store.get(client, keys::ADMIN_AUTH).await?.as_deref() == Some("true");
        let email = if authenticated {
            self.store.get(client, keys::ADMIN_EMAIL).await?
        } else {
            None
        };
        Ok(AdminSession {
            authenticated,
            email,
        })
    }

    /// Mark the client as signed in. Returns `false` without storing anything
    /// if `email` is not a valid address.
    pub async fn admin_sign_in(&self, client: &str, email: &str) -> Result<bool, StoreError> {
        let email = email.trim();
        if !is_valid_email(email) {
            return Ok(false);
        }
        self.store.set(client, keys::ADMIN_AUTH, "true").await?;
        self.store.set(client, keys::ADMIN_EMAIL, email).await?;
        tracing::info!(client = %client, "Admin signed in");
        Ok(true)
    }

    /// Clear both admin keys.
    pub async fn admin_sign_out(&self, client: &str) -> Result<(), StoreError> {
        self.store.remove(client, keys::ADMIN_AUTH).await?;
        self.store.remove(client, keys::ADMIN_EMAIL).await?;
        tracing::info!(client = %client, "Admin signed out");
        Ok(())
    }
}
