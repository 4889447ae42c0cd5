//! Viewer session: bearer token and user profile.
//!
//! Both live in [`Storage`] under fixed keys so they survive restarts. The
//! token is kept as a [`SecretString`] in memory and never appears in `Debug`
//! output.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use vitrine_core::{BusinessId, Storage, StorageError, UserId, keys};

/// The signed-in user, as stored by a login flow.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: UserId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(alias = "business_id", default, skip_serializing_if = "Option::is_none")]
    pub business_id: Option<BusinessId>,
}

/// Token and profile, written through to storage.
pub struct Session<S> {
    storage: S,
    token: Option<SecretString>,
    profile: Option<UserProfile>,
}

impl<S> std::fmt::Debug for Session<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("profile", &self.profile)
            .finish_non_exhaustive()
    }
}

impl<S: Storage> Session<S> {
    /// Load the session persisted in `storage`.
    ///
    /// Unreadable or corrupt entries are logged and treated as absent.
    pub fn load(storage: S) -> Self {
        let token = match storage.load(keys::TOKEN) {
            Ok(token) => token
                .map(|t| t.trim().to_string())
                .filter(|t| !t.is_empty())
                .map(SecretString::from),
            Err(e) => {
                warn!(error = %e, "Failed to read stored token, continuing without one");
                None
            }
        };

        let profile = match storage.load(keys::USER) {
            Ok(Some(raw)) => serde_json::from_str(&raw)
                .inspect_err(|e| warn!(error = %e, "Ignoring corrupt stored profile"))
                .ok(),
            Ok(None) => None,
            Err(e) => {
                warn!(error = %e, "Failed to read stored profile, continuing without one");
                None
            }
        };

        Self {
            storage,
            token,
            profile,
        }
    }

    #[must_use]
    pub const fn token(&self) -> Option<&SecretString> {
        self.token.as_ref()
    }

    #[must_use]
    pub const fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    /// Business the viewer acts for, used to recognise catalogue owners.
    #[must_use]
    pub fn viewer_business_id(&self) -> Option<&BusinessId> {
        self.profile.as_ref().and_then(|p| p.business_id.as_ref())
    }

    /// Persist a new bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error if storage cannot be written. The in-memory token is
    /// replaced either way.
    pub fn store_token(&mut self, token: SecretString) -> Result<(), StorageError> {
        let result = self.storage.save(keys::TOKEN, token.expose_secret());
        self.token = Some(token);
        result
    }

    /// Persist the user profile.
    ///
    /// # Errors
    ///
    /// Returns an error if the profile cannot be encoded or written.
    pub fn store_profile(&mut self, profile: UserProfile) -> Result<(), StorageError> {
        let raw = serde_json::to_string(&profile).map_err(|source| StorageError::Encode {
            key: keys::USER.to_string(),
            source,
        })?;
        let result = self.storage.save(keys::USER, &raw);
        self.profile = Some(profile);
        result
    }

    /// Forget the token and profile.
    ///
    /// # Errors
    ///
    /// Returns the first storage error encountered.
    pub fn clear(&mut self) -> Result<(), StorageError> {
        self.token = None;
        self.profile = None;
        let token = self.storage.remove(keys::TOKEN);
        let profile = self.storage.remove(keys::USER);
        info!("Session cleared");
        token.and(profile)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use vitrine_core::MemoryStorage;

    fn profile() -> UserProfile {
        UserProfile {
            id: UserId::new("u1"),
            name: Some("Awa".to_string()),
            email: None,
            business_id: Some(BusinessId::new("b1")),
        }
    }

    #[test]
    fn test_empty_session() {
        let session = Session::load(MemoryStorage::new());
        assert!(session.token().is_none());
        assert!(session.profile().is_none());
        assert!(session.viewer_business_id().is_none());
    }

    #[test]
    fn test_persist_and_reload() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = Session::load(Arc::clone(&storage));
        session.store_token(SecretString::from("tok-1".to_string())).unwrap();
        session.store_profile(profile()).unwrap();

        let reloaded = Session::load(storage);
        assert_eq!(reloaded.token().unwrap().expose_secret(), "tok-1");
        assert_eq!(reloaded.viewer_business_id(), Some(&BusinessId::new("b1")));
    }

    #[test]
    fn test_corrupt_profile_ignored() {
        let storage = MemoryStorage::new();
        storage.save(keys::USER, "{not json").unwrap();
        storage.save(keys::TOKEN, "  ").unwrap();

        let session = Session::load(storage);
        assert!(session.profile().is_none());
        assert!(session.token().is_none());
    }

    #[test]
    fn test_clear() {
        let storage = Arc::new(MemoryStorage::new());
        let mut session = Session::load(Arc::clone(&storage));
        session.store_token(SecretString::from("tok".to_string())).unwrap();
        session.store_profile(profile()).unwrap();

        session.clear().unwrap();
        assert!(session.token().is_none());
        assert_eq!(storage.load(keys::TOKEN).unwrap(), None);
        assert_eq!(storage.load(keys::USER).unwrap(), None);
    }

    #[test]
    fn test_debug_redacts_token() {
        let mut session = Session::load(MemoryStorage::new());
        session.store_token(SecretString::from("very-secret".to_string())).unwrap();
        assert!(!format!("{session:?}").contains("very-secret"));
    }
}
