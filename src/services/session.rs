// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Per-user session state: identity plus the cached profile document.

use crate::db::ProfileStore;
use crate::error::AppError;
use crate::models::{Identity, UserProfile};

/// Session for one authenticated identity.
///
/// Passed explicitly to the flows that need it; the profile is only as
/// fresh as the last [`Session::refresh`].
#[derive(Debug, Clone)]
pub struct Session {
    identity: Identity,
    profile: Option<UserProfile>,
}

impl Session {
    pub fn new(identity: Identity) -> Self {
        Self {
            identity,
            profile: None,
        }
    }

    pub fn identity(&self) -> &Identity {
        &self.identity
    }

    pub fn profile(&self) -> Option<&UserProfile> {
        self.profile.as_ref()
    }

    pub fn into_parts(self) -> (Identity, Option<UserProfile>) {
        (self.identity, self.profile)
    }

    /// True until the cached profile carries a role.
    pub fn onboarding_required(&self) -> bool {
        self.profile.as_ref().and_then(UserProfile::role).is_none()
    }

    /// Reload the profile from the store and cache it.
    ///
    /// On error the previously cached profile is kept.
    pub async fn refresh(
        &mut self,
        store: &dyn ProfileStore,
    ) -> Result<Option<&UserProfile>, AppError> {
        let profile = store.get_profile(&self.identity.uid).await?;
        tracing::debug!(
            uid = %self.identity.uid,
            found = profile.is_some(),
            "Session profile refreshed"
        );
        self.profile = profile;
        Ok(self.profile.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{FirestoreDb, MemoryProfileStore};

    fn identity() -> Identity {
        Identity {
            uid: "google:42".to_string(),
            email: Some("s@example.edu".to_string()),
            display_name: None,
            photo_url: None,
            provider_data: vec![],
        }
    }

    #[tokio::test]
    async fn test_refresh_loads_profile() {
        let store = MemoryProfileStore::new();
        store
            .put_raw("google:42", serde_json::json!({ "uid": "google:42", "role": "teacher" }))
            .unwrap();

        let mut session = Session::new(identity());
        assert!(session.onboarding_required());

        let profile = session.refresh(&store).await.unwrap();
        assert!(profile.is_some());
        assert!(!session.onboarding_required());
    }

    #[tokio::test]
    async fn test_failed_refresh_keeps_cached_profile() {
        let store = MemoryProfileStore::new();
        store
            .put_raw("google:42", serde_json::json!({ "role": "student" }))
            .unwrap();

        let mut session = Session::new(identity());
        session.refresh(&store).await.unwrap();

        let offline = FirestoreDb::new_mock();
        assert!(session.refresh(&offline).await.is_err());
        assert!(session.profile().is_some());
    }
}
