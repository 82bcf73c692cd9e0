// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth sign-in routes (Google, GitHub).

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Redirect,
    routing::{get, post},
    Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::Deserialize;
use std::sync::Arc;

use crate::config::Config;
use crate::error::Result;
use crate::middleware::auth::{
    create_jwt, LOGGED_IN_COOKIE, OAUTH_NONCE_COOKIE, SESSION_COOKIE, SESSION_TTL_SECS,
};
use crate::services::oauth_state::{new_nonce, sign_state, verify_state, STATE_MAX_AGE_MS};
use crate::services::{complete_sign_in, OAuthProvider, Route};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/logout", post(logout))
        .route("/auth/{provider}", get(auth_start))
        .route("/auth/{provider}/callback", get(auth_callback))
}

/// Callback URL registered with the provider.
pub fn callback_url(config: &Config, provider: OAuthProvider) -> String {
    format!("{}/auth/{}/callback", config.api_url, provider.slug())
}

/// Start OAuth flow - redirect to the provider's consent page.
async fn auth_start(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    jar: CookieJar,
) -> Result<(CookieJar, Redirect)> {
    let provider: OAuthProvider = provider.parse()?;
    let nonce = new_nonce();
    let oauth_state = sign_state(provider.slug(), &nonce, &state.config.oauth_state_key)?;

    let auth_url = state.backend.identity.authorization_url(
        provider,
        &callback_url(&state.config, provider),
        &oauth_state,
    )?;

    tracing::info!(provider = %provider, "Starting OAuth flow");

    let jar = jar.add(nonce_cookie(&state.config, nonce));
    Ok((jar, Redirect::temporary(&auth_url)))
}

#[derive(Deserialize)]
pub struct CallbackParams {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    state: Option<String>,
    #[serde(default)]
    error: Option<String>,
}

/// Send the user back to the sign-in page with a retryable error.
fn login_redirect(config: &Config, provider: OAuthProvider, error: &str) -> Redirect {
    Redirect::temporary(&format!(
        "{}{}?error={}&provider={}",
        config.frontend_url,
        Route::Login.path(),
        urlencoding::encode(error),
        provider.slug()
    ))
}

/// OAuth callback - exchange code, load profile, start a session, route.
async fn auth_callback(
    State(state): State<Arc<AppState>>,
    Path(provider): Path<String>,
    jar: CookieJar,
    Query(params): Query<CallbackParams>,
) -> Result<(CookieJar, Redirect)> {
    let provider: OAuthProvider = provider.parse()?;
    let config = &state.config;

    // The nonce is single use: clear it whatever the outcome.
    let nonce = jar.get(OAUTH_NONCE_COOKIE).map(|c| c.value().to_string());
    let jar = jar.remove(nonce_cookie(config, String::new()));

    if let Some(error) = params.error {
        tracing::warn!(provider = %provider, error = %error, "OAuth error from provider");
        let code = if error == "access_denied" {
            "sign_in_cancelled"
        } else {
            "sign_in_failed"
        };
        return Ok((jar, login_redirect(config, provider, code)));
    }

    let (Some(code), Some(oauth_state)) = (params.code, params.state) else {
        tracing::warn!(provider = %provider, "OAuth callback without code or state");
        return Ok((jar, login_redirect(config, provider, "invalid_request")));
    };

    let Some(nonce) = nonce else {
        tracing::warn!(provider = %provider, "OAuth callback without nonce cookie");
        return Ok((jar, login_redirect(config, provider, "invalid_state")));
    };

    if let Err(e) = verify_state(&oauth_state, provider.slug(), &nonce, &config.oauth_state_key) {
        tracing::warn!(provider = %provider, error = %e, "Rejected OAuth state");
        return Ok((jar, login_redirect(config, provider, "invalid_state")));
    }

    let outcome = match complete_sign_in(
        state.backend.identity.as_ref(),
        state.backend.profiles.as_ref(),
        provider,
        &code,
        &callback_url(config, provider),
    )
    .await
    {
        Ok(outcome) => outcome,
        Err(e) => return Ok((jar, login_redirect(config, provider, e.code()))),
    };

    let jwt = create_jwt(outcome.session.identity(), &config.jwt_signing_key)?;

    // A profile without a role leaves the user on the sign-in page.
    let route = outcome.destination.route().unwrap_or(Route::Login);
    let redirect_url = format!("{}{}", config.frontend_url, route.path());

    let jar = jar
        .add(session_cookie(config, jwt))
        .add(logged_in_cookie(config, "1"));

    Ok((jar, Redirect::temporary(&redirect_url)))
}

fn session_cookie(config: &Config, value: String) -> Cookie<'static> {
    Cookie::build((SESSION_COOKIE, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies())
        .max_age(time::Duration::seconds(SESSION_TTL_SECS as i64))
        .build()
}

fn logged_in_cookie(config: &Config, value: &'static str) -> Cookie<'static> {
    Cookie::build((LOGGED_IN_COOKIE, value))
        .path("/")
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies())
        .max_age(time::Duration::seconds(SESSION_TTL_SECS as i64))
        .build()
}

fn nonce_cookie(config: &Config, value: String) -> Cookie<'static> {
    Cookie::build((OAUTH_NONCE_COOKIE, value))
        .path("/auth")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(config.secure_cookies())
        .max_age(time::Duration::milliseconds(STATE_MAX_AGE_MS as i64))
        .build()
}

/// Logout - clear the session cookies.
async fn logout(State(state): State<Arc<AppState>>, jar: CookieJar) -> (CookieJar, StatusCode) {
    let jar = jar
        .remove(session_cookie(&state.config, String::new()))
        .remove(logged_in_cookie(&state.config, ""));
    (jar, StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_callback_url() {
        let config = Config::test_default();
        assert_eq!(
            callback_url(&config, OAuthProvider::GitHub),
            "http://localhost:8080/auth/github/callback"
        );
    }

    #[test]
    fn test_session_cookie_attributes() {
        let mut config = Config::test_default();
        let cookie = session_cookie(&config, "jwt".to_string());
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.secure(), Some(false));
        assert_eq!(cookie.path(), Some("/"));

        config.frontend_url = "https://campus.example.edu".to_string();
        assert_eq!(session_cookie(&config, "jwt".to_string()).secure(), Some(true));
        assert_eq!(logged_in_cookie(&config, "1").http_only(), None);
    }

    #[test]
    fn test_nonce_cookie_attributes() {
        let cookie = nonce_cookie(&Config::test_default(), "n".to_string());
        assert_eq!(cookie.http_only(), Some(true));
        assert_eq!(cookie.path(), Some("/auth"));
        assert_eq!(cookie.max_age(), Some(time::Duration::minutes(10)));
    }
}
