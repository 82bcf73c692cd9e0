// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Application configuration loaded from environment variables.
//!
//! The six public backend values are read as-is and never validated here;
//! a missing project id shows up later as a Firestore connection error.

use std::env;
use std::path::PathBuf;

/// Public backend settings shared with the browser frontend.
#[derive(Debug, Clone, Default)]
pub struct BackendConfig {
    pub api_key: Option<String>,
    pub auth_domain: Option<String>,
    pub project_id: Option<String>,
    pub storage_bucket: Option<String>,
    pub messaging_sender_id: Option<String>,
    pub app_id: Option<String>,
}

impl BackendConfig {
    fn from_env() -> Self {
        Self {
            api_key: optional("FIREBASE_API_KEY"),
            auth_domain: optional("FIREBASE_AUTH_DOMAIN"),
            project_id: optional("FIREBASE_PROJECT_ID"),
            storage_bucket: optional("FIREBASE_STORAGE_BUCKET"),
            messaging_sender_id: optional("FIREBASE_MESSAGING_SENDER_ID"),
            app_id: optional("FIREBASE_APP_ID"),
        }
    }
}

/// OAuth client credentials for one identity provider.
#[derive(Debug, Clone)]
pub struct OAuthClientConfig {
    pub client_id: String,
    pub client_secret: String,
}

impl OAuthClientConfig {
    /// Both halves must be present, otherwise the provider stays disabled.
    fn from_env(id_var: &str, secret_var: &str) -> Option<Self> {
        Some(Self {
            client_id: optional(id_var)?,
            client_secret: optional(secret_var)?,
        })
    }
}

/// Application configuration, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    // --- Environment Variables (non-sensitive) ---
    /// Frontend URL that OAuth callbacks redirect back to
    pub frontend_url: String,
    /// Public base URL of this API (used for OAuth callback URLs)
    pub api_url: String,
    /// Server port
    pub port: u16,
    /// Public backend values
    pub backend: BackendConfig,
    /// Directory for the offline profile cache, if enabled
    pub offline_cache_dir: Option<PathBuf>,

    // --- Secrets ---
    pub google: Option<OAuthClientConfig>,
    pub github: Option<OAuthClientConfig>,
    /// JWT signing key for session tokens (raw bytes)
    pub jwt_signing_key: Vec<u8>,
    /// HMAC key for the OAuth `state` parameter
    pub oauth_state_key: Vec<u8>,
}

impl Config {
    /// Config for tests: both providers enabled with dummy credentials.
    pub fn test_default() -> Self {
        Self {
            frontend_url: "http://localhost:5173".to_string(),
            api_url: "http://localhost:8080".to_string(),
            port: 8080,
            backend: BackendConfig {
                project_id: Some("test-project".to_string()),
                ..BackendConfig::default()
            },
            offline_cache_dir: None,
            google: Some(OAuthClientConfig {
                client_id: "google_client_id".to_string(),
                client_secret: "google_secret".to_string(),
            }),
            github: Some(OAuthClientConfig {
                client_id: "github_client_id".to_string(),
                client_secret: "github_secret".to_string(),
            }),
            jwt_signing_key: b"test_jwt_key_32_bytes_minimum!!".to_vec(),
            oauth_state_key: b"test_state_key_32_bytes_minimum!".to_vec(),
        }
    }

    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok(); // Load .env file if present

        Ok(Self {
            frontend_url: env::var("FRONTEND_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            api_url: env::var("API_URL")
                .map(|v| v.trim_end_matches('/').to_string())
                .unwrap_or_else(|_| "http://localhost:8080".to_string()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".to_string())
                .parse()
                .unwrap_or(8080),
            backend: BackendConfig::from_env(),
            offline_cache_dir: optional("OFFLINE_CACHE_DIR").map(PathBuf::from),

            google: OAuthClientConfig::from_env("GOOGLE_CLIENT_ID", "GOOGLE_CLIENT_SECRET"),
            github: OAuthClientConfig::from_env("GITHUB_CLIENT_ID", "GITHUB_CLIENT_SECRET"),
            jwt_signing_key: env::var("JWT_SIGNING_KEY")
                .map_err(|_| ConfigError::Missing("JWT_SIGNING_KEY"))?
                .into_bytes(),
            oauth_state_key: env::var("OAUTH_STATE_KEY")
                .map_err(|_| ConfigError::Missing("OAUTH_STATE_KEY"))?
                .into_bytes(),
        })
    }

    /// Whether cookies should carry the `Secure` attribute.
    pub fn secure_cookies(&self) -> bool {
        self.frontend_url.starts_with("https://")
    }
}

/// Read a trimmed, non-empty environment variable.
fn optional(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    Missing(&'static str),
}
