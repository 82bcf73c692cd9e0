// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Sign-in orchestration: OAuth exchange, profile reload, routing.

use crate::db::ProfileStore;
use crate::error::AppError;
use crate::services::identity::{IdentityProvider, OAuthProvider};
use crate::services::routing::{resolve_post_auth_destination, Destination};
use crate::services::session::Session;

/// Successful sign-in: the new session and where to send the user.
#[derive(Debug)]
pub struct SignInOutcome {
    pub session: Session,
    pub destination: Destination,
}

/// A failed sign-in attempt. Every variant is reported back to the user.
#[derive(Debug, thiserror::Error)]
pub enum SignInError {
    #[error("sign-in with {provider} failed: {source}")]
    Provider {
        provider: OAuthProvider,
        #[source]
        source: AppError,
    },

    #[error("profile could not be loaded after {provider} sign-in: {source}")]
    ProfileReload {
        provider: OAuthProvider,
        #[source]
        source: AppError,
    },
}

impl SignInError {
    /// Stable code passed to the frontend in the `error` query parameter.
    pub fn code(&self) -> &'static str {
        match self {
            SignInError::Provider { .. } => "sign_in_failed",
            SignInError::ProfileReload { .. } => "profile_unavailable",
        }
    }

    pub fn provider(&self) -> OAuthProvider {
        match self {
            SignInError::Provider { provider, .. } | SignInError::ProfileReload { provider, .. } => {
                *provider
            }
        }
    }
}

/// Finish a sign-in after the provider redirected back with `code`.
///
/// The steps run strictly in order; the profile reload only starts once
/// the identity is known, and routing only happens after the reload.
pub async fn complete_sign_in(
    identity_provider: &dyn IdentityProvider,
    store: &dyn ProfileStore,
    provider: OAuthProvider,
    code: &str,
    redirect_uri: &str,
) -> Result<SignInOutcome, SignInError> {
    let identity = identity_provider
        .sign_in(provider, code, redirect_uri)
        .await
        .map_err(|source| {
            tracing::warn!(provider = %provider, error = %source, "OAuth sign-in failed");
            SignInError::Provider { provider, source }
        })?;

    let uid = identity.uid.clone();
    let mut session = Session::new(identity);

    let destination = match session.refresh(store).await {
        Ok(profile) => resolve_post_auth_destination(profile),
        Err(source) => {
            tracing::warn!(uid = %uid, error = %source, "Profile reload after sign-in failed");
            return Err(SignInError::ProfileReload { provider, source });
        }
    };

    tracing::info!(uid = %uid, destination = ?destination, "Sign-in complete");

    Ok(SignInOutcome {
        session,
        destination,
    })
}
