// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

use async_trait::async_trait;
use axum::body::Body;
use axum::response::Response;
use campus_auth::backend::Backend;
use campus_auth::config::Config;
use campus_auth::db::{FirestoreDb, MemoryProfileStore, ProfileStore};
use campus_auth::error::AppError;
use campus_auth::middleware::auth::create_jwt;
use campus_auth::models::{Identity, ProviderInfo};
use campus_auth::routes::create_router;
use campus_auth::services::{IdentityProvider, OAuthProvider};
use campus_auth::AppState;
use std::sync::Arc;

/// Authorization code the fake provider accepts.
#[allow(dead_code)]
pub const GOOD_CODE: &str = "good-code";

/// Check if emulator is available via environment variable.
#[allow(dead_code)]
pub fn emulator_available() -> bool {
    std::env::var("FIRESTORE_EMULATOR_HOST").is_ok()
}

/// Skip test with message if emulator not available.
#[macro_export]
macro_rules! require_emulator {
    () => {
        if !crate::common::emulator_available() {
            eprintln!("⚠️  Skipping: FIRESTORE_EMULATOR_HOST not set");
            return;
        }
    };
}

/// Create a test database connection.
#[allow(dead_code)]
pub async fn test_db() -> FirestoreDb {
    FirestoreDb::new("test-project")
        .await
        .expect("Failed to connect to Firestore emulator")
}

/// Identity provider that signs in anyone presenting [`GOOD_CODE`].
pub struct FakeIdentityProvider;

#[async_trait]
impl IdentityProvider for FakeIdentityProvider {
    fn enabled_providers(&self) -> Vec<OAuthProvider> {
        OAuthProvider::ALL.to_vec()
    }

    fn authorization_url(
        &self,
        provider: OAuthProvider,
        redirect_uri: &str,
        state: &str,
    ) -> Result<String, AppError> {
        Ok(format!(
            "{}?redirect_uri={}&state={}",
            provider.descriptor().authorize_url,
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state)
        ))
    }

    async fn sign_in(
        &self,
        provider: OAuthProvider,
        code: &str,
        _redirect_uri: &str,
    ) -> Result<Identity, AppError> {
        if code != GOOD_CODE {
            return Err(AppError::IdentityProvider("invalid_grant".to_string()));
        }
        Ok(test_identity(&format!("{}:42", provider.slug()), provider))
    }
}

/// Identity as the fake provider would return it.
#[allow(dead_code)]
pub fn test_identity(uid: &str, provider: OAuthProvider) -> Identity {
    Identity {
        uid: uid.to_string(),
        email: Some("ada@example.edu".to_string()),
        display_name: Some("Ada Lovelace".to_string()),
        photo_url: None,
        provider_data: vec![ProviderInfo {
            provider_id: provider.descriptor().provider_id.to_string(),
            uid: "42".to_string(),
        }],
    }
}

fn build_app(config: Config, profiles: Arc<dyn ProfileStore>) -> (axum::Router, Arc<AppState>) {
    let backend = Backend::from_parts(profiles, Arc::new(FakeIdentityProvider));
    let state = Arc::new(AppState { config, backend });
    (create_router(state.clone()), state)
}

/// Create a test app backed by an in-memory profile store.
/// Returns the router and the store so tests can seed documents.
#[allow(dead_code)]
pub fn create_test_app() -> (axum::Router, Arc<MemoryProfileStore>) {
    create_test_app_with_frontend_url("http://localhost:5173")
}

#[allow(dead_code)]
pub fn create_test_app_with_frontend_url(
    frontend_url: &str,
) -> (axum::Router, Arc<MemoryProfileStore>) {
    let mut config = Config::test_default();
    config.frontend_url = frontend_url.to_string();

    let store = Arc::new(MemoryProfileStore::new());
    let (app, _) = build_app(config, store.clone());
    (app, store)
}

/// Create a test app whose profile store fails every call.
#[allow(dead_code)]
pub fn create_offline_test_app() -> (axum::Router, Arc<AppState>) {
    build_app(Config::test_default(), Arc::new(FirestoreDb::new_mock()))
}

/// Session JWT for `uid`, signed with the test key.
#[allow(dead_code)]
pub fn create_test_jwt(uid: &str) -> String {
    let config = Config::test_default();
    create_jwt(
        &test_identity(uid, OAuthProvider::Google),
        &config.jwt_signing_key,
    )
    .expect("Failed to create JWT")
}

/// Read a response body as JSON.
#[allow(dead_code)]
pub async fn body_json(response: Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Authenticated request with an optional JSON body.
#[allow(dead_code)]
pub fn authed_request(
    method: &str,
    uri: &str,
    uid: &str,
    body: Option<serde_json::Value>,
) -> axum::http::Request<Body> {
    let builder = axum::http::Request::builder()
        .method(method)
        .uri(uri)
        .header(
            axum::http::header::AUTHORIZATION,
            format!("Bearer {}", create_test_jwt(uid)),
        );

    match body {
        Some(json) => builder
            .header(axum::http::header::CONTENT_TYPE, "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}
