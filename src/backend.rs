// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Backend client initialization.
//!
//! Builds the one shared handle to the profile store and the identity
//! providers. The offline cache is best effort: if it cannot be enabled the
//! service keeps running against the store alone.

use crate::config::Config;
use crate::db::{CachedProfileStore, FirestoreDb, OfflineCache, ProfileStore};
use crate::error::AppError;
use crate::services::identity::{IdentityProvider, OAuthIdentityClient, OAuthProvider};
use std::sync::Arc;

/// Shared connection handle, cloned into request handlers via `AppState`.
#[derive(Clone)]
pub struct Backend {
    pub profiles: Arc<dyn ProfileStore>,
    pub identity: Arc<dyn IdentityProvider>,
}

impl Backend {
    /// Connect to Firestore and set up the OAuth client.
    pub async fn connect(config: &Config) -> Result<Self, AppError> {
        let project_id = config.backend.project_id.as_deref().unwrap_or_default();
        let db = FirestoreDb::new(project_id).await?;
        let identity = OAuthIdentityClient::new(config)?;

        tracing::info!(
            providers = ?identity.enabled_providers(),
            "Identity providers configured"
        );

        Ok(Self {
            profiles: with_offline_cache(db, config),
            identity: Arc::new(identity),
        })
    }

    /// Assemble a backend from existing parts (tests, local runs).
    pub fn from_parts(
        profiles: Arc<dyn ProfileStore>,
        identity: Arc<dyn IdentityProvider>,
    ) -> Self {
        Self { profiles, identity }
    }

    pub fn provider_descriptor(
        &self,
        provider: OAuthProvider,
    ) -> &'static crate::services::ProviderDescriptor {
        provider.descriptor()
    }
}

/// Wrap `store` in the offline cache when one is configured and available.
pub fn with_offline_cache<S>(store: S, config: &Config) -> Arc<dyn ProfileStore>
where
    S: ProfileStore + 'static,
{
    let Some(dir) = &config.offline_cache_dir else {
        return Arc::new(store);
    };

    match OfflineCache::enable(dir) {
        Ok(cache) => Arc::new(CachedProfileStore::new(store, cache)),
        Err(e) => {
            tracing::warn!(
                error = %e,
                dir = %dir.display(),
                "Could not enable offline profile cache, continuing without it"
            );
            Arc::new(store)
        }
    }
}
