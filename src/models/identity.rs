// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Authenticated identity as returned by an OAuth provider.

use serde::{Deserialize, Serialize};

/// One provider linked to an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderInfo {
    /// Provider id, e.g. `google.com`
    pub provider_id: String,
    /// Subject at that provider
    pub uid: String,
}

/// The signed-in user, independent of any stored profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
    pub photo_url: Option<String>,
    pub provider_data: Vec<ProviderInfo>,
}

impl Identity {
    /// Provider ids with a trailing `.com` removed, first occurrence wins.
    pub fn auth_providers(&self) -> Vec<String> {
        let mut providers: Vec<String> = Vec::with_capacity(self.provider_data.len());
        for info in &self.provider_data {
            let id = info
                .provider_id
                .strip_suffix(".com")
                .unwrap_or(&info.provider_id);
            if !providers.iter().any(|p| p == id) {
                providers.push(id.to_string());
            }
        }
        providers
    }
}
