// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! OAuth identity providers (Google, GitHub).
//!
//! Handles:
//! - Authorization URL construction
//! - Authorization code exchange
//! - Userinfo lookup and mapping to an [`Identity`]

use crate::config::{Config, OAuthClientConfig};
use crate::error::AppError;
use crate::models::{Identity, ProviderInfo};
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

const HTTP_TIMEOUT: Duration = Duration::from_secs(10);
const USER_AGENT: &str = concat!("campus-auth/", env!("CARGO_PKG_VERSION"));

/// Supported identity providers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OAuthProvider {
    Google,
    GitHub,
}

/// Static endpoints and defaults of a provider.
#[derive(Debug, Clone, Copy)]
pub struct ProviderDescriptor {
    /// Provider id as recorded on identities (`google.com`)
    pub provider_id: &'static str,
    pub authorize_url: &'static str,
    pub token_url: &'static str,
    pub userinfo_url: &'static str,
    /// Scopes requested; empty means provider defaults
    pub scopes: &'static [&'static str],
}

const GOOGLE: ProviderDescriptor = ProviderDescriptor {
    provider_id: "google.com",
    authorize_url: "https://accounts.google.com/o/oauth2/v2/auth",
    token_url: "https://oauth2.googleapis.com/token",
    userinfo_url: "https://openidconnect.googleapis.com/v1/userinfo",
    scopes: &["openid", "email", "profile"],
};

const GITHUB: ProviderDescriptor = ProviderDescriptor {
    provider_id: "github.com",
    authorize_url: "https://github.com/login/oauth/authorize",
    token_url: "https://github.com/login/oauth/access_token",
    userinfo_url: "https://api.github.com/user",
    scopes: &[],
};

impl OAuthProvider {
    pub const ALL: [OAuthProvider; 2] = [OAuthProvider::Google, OAuthProvider::GitHub];

    /// Short name used in URLs and uids.
    pub fn slug(&self) -> &'static str {
        match self {
            OAuthProvider::Google => "google",
            OAuthProvider::GitHub => "github",
        }
    }

    pub fn descriptor(&self) -> &'static ProviderDescriptor {
        match self {
            OAuthProvider::Google => &GOOGLE,
            OAuthProvider::GitHub => &GITHUB,
        }
    }
}

impl fmt::Display for OAuthProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for OAuthProvider {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OAuthProvider::ALL
            .into_iter()
            .find(|p| p.slug() == s)
            .ok_or_else(|| AppError::NotFound(format!("Unknown identity provider: {}", s)))
    }
}

/// Seam between the sign-in flow and the OAuth handshake.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Providers with credentials configured.
    fn enabled_providers(&self) -> Vec<OAuthProvider>;

    /// URL to send the browser to for consent.
    fn authorization_url(
        &self,
        provider: OAuthProvider,
        redirect_uri: &str,
        state: &str,
    ) -> Result<String, AppError>;

    /// Exchange an authorization code and load the user's identity.
    async fn sign_in(
        &self,
        provider: OAuthProvider,
        code: &str,
        redirect_uri: &str,
    ) -> Result<Identity, AppError>;
}

/// reqwest-backed client for the real providers.
#[derive(Clone)]
pub struct OAuthIdentityClient {
    http: reqwest::Client,
    google: Option<OAuthClientConfig>,
    github: Option<OAuthClientConfig>,
}

impl OAuthIdentityClient {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let http = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| AppError::Internal(anyhow::anyhow!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            google: config.google.clone(),
            github: config.github.clone(),
        })
    }

    fn credentials(&self, provider: OAuthProvider) -> Result<&OAuthClientConfig, AppError> {
        let creds = match provider {
            OAuthProvider::Google => self.google.as_ref(),
            OAuthProvider::GitHub => self.github.as_ref(),
        };
        creds.ok_or_else(|| {
            AppError::BadRequest(format!("Sign-in with {} is not configured", provider))
        })
    }

    async fn exchange_code(
        &self,
        provider: OAuthProvider,
        code: &str,
        redirect_uri: &str,
    ) -> Result<String, AppError> {
        let creds = self.credentials(provider)?;
        let response = self
            .http
            .post(provider.descriptor().token_url)
            .header(reqwest::header::ACCEPT, "application/json")
            .form(&[
                ("client_id", creds.client_id.as_str()),
                ("client_secret", creds.client_secret.as_str()),
                ("code", code),
                ("redirect_uri", redirect_uri),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await
            .map_err(|e| AppError::IdentityProvider(format!("Token exchange failed: {}", e)))?;

        let token: TokenResponse = check_response_json(response).await?;

        // GitHub reports bad codes with a 200 and an `error` field.
        match (token.access_token, token.error) {
            (Some(access_token), _) => Ok(access_token),
            (None, Some(error)) => Err(AppError::IdentityProvider(format!(
                "{} rejected code: {}",
                provider, error
            ))),
            (None, None) => Err(AppError::IdentityProvider(format!(
                "{} returned no access token",
                provider
            ))),
        }
    }

    async fn fetch_identity(
        &self,
        provider: OAuthProvider,
        access_token: &str,
    ) -> Result<Identity, AppError> {
        let response = self
            .http
            .get(provider.descriptor().userinfo_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AppError::IdentityProvider(format!("Userinfo request failed: {}", e)))?;

        let identity = match provider {
            OAuthProvider::Google => {
                let info: GoogleUserInfo = check_response_json(response).await?;
                info.into_identity()
            }
            OAuthProvider::GitHub => {
                let info: GitHubUser = check_response_json(response).await?;
                info.into_identity()
            }
        };
        Ok(identity)
    }
}

#[async_trait]
impl IdentityProvider for OAuthIdentityClient {
    fn enabled_providers(&self) -> Vec<OAuthProvider> {
        OAuthProvider::ALL
            .into_iter()
            .filter(|p| self.credentials(*p).is_ok())
            .collect()
    }

    fn authorization_url(
        &self,
        provider: OAuthProvider,
        redirect_uri: &str,
        state: &str,
    ) -> Result<String, AppError> {
        let creds = self.credentials(provider)?;
        let descriptor = provider.descriptor();

        let mut url = format!(
            "{}?client_id={}&redirect_uri={}&response_type=code&state={}",
            descriptor.authorize_url,
            urlencoding::encode(&creds.client_id),
            urlencoding::encode(redirect_uri),
            urlencoding::encode(state),
        );
        if !descriptor.scopes.is_empty() {
            url.push_str("&scope=");
            url.push_str(&urlencoding::encode(&descriptor.scopes.join(" ")));
        }
        Ok(url)
    }

    async fn sign_in(
        &self,
        provider: OAuthProvider,
        code: &str,
        redirect_uri: &str,
    ) -> Result<Identity, AppError> {
        let access_token = self.exchange_code(provider, code, redirect_uri).await?;
        let identity = self.fetch_identity(provider, &access_token).await?;

        tracing::info!(
            provider = %provider,
            uid = %identity.uid,
            "Identity provider sign-in succeeded"
        );
        Ok(identity)
    }
}

/// Check response status and parse the JSON body.
async fn check_response_json<T: for<'de> Deserialize<'de>>(
    response: reqwest::Response,
) -> Result<T, AppError> {
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(AppError::IdentityProvider(format!(
            "HTTP {}: {}",
            status, body
        )));
    }

    response
        .json()
        .await
        .map_err(|e| AppError::IdentityProvider(format!("JSON parse error: {}", e)))
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
    error: Option<String>,
}

/// OpenID Connect userinfo response.
#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    sub: String,
    email: Option<String>,
    name: Option<String>,
    picture: Option<String>,
}

impl GoogleUserInfo {
    fn into_identity(self) -> Identity {
        identity_for(
            OAuthProvider::Google,
            self.sub,
            self.email,
            self.name,
            self.picture,
        )
    }
}

#[derive(Debug, Deserialize)]
struct GitHubUser {
    id: u64,
    login: String,
    name: Option<String>,
    email: Option<String>,
    avatar_url: Option<String>,
}

impl GitHubUser {
    fn into_identity(self) -> Identity {
        // Fall back to the login when no display name is set.
        let display_name = self.name.filter(|n| !n.is_empty()).or(Some(self.login));
        identity_for(
            OAuthProvider::GitHub,
            self.id.to_string(),
            self.email,
            display_name,
            self.avatar_url,
        )
    }
}

fn identity_for(
    provider: OAuthProvider,
    subject: String,
    email: Option<String>,
    display_name: Option<String>,
    photo_url: Option<String>,
) -> Identity {
    Identity {
        uid: format!("{}:{}", provider.slug(), subject),
        email,
        display_name,
        photo_url,
        provider_data: vec![ProviderInfo {
            provider_id: provider.descriptor().provider_id.to_string(),
            uid: subject,
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_parse() {
        assert_eq!("google".parse::<OAuthProvider>().unwrap(), OAuthProvider::Google);
        assert_eq!("github".parse::<OAuthProvider>().unwrap(), OAuthProvider::GitHub);
        assert!(matches!(
            "myspace".parse::<OAuthProvider>(),
            Err(AppError::NotFound(_))
        ));
    }

    #[test]
    fn test_authorization_url_google_has_scopes() {
        let client = OAuthIdentityClient::new(&Config::test_default()).unwrap();
        let url = client
            .authorization_url(
                OAuthProvider::Google,
                "http://localhost:8080/auth/google/callback",
                "abc",
            )
            .unwrap();

        assert!(url.starts_with("https://accounts.google.com/o/oauth2/v2/auth?"));
        assert!(url.contains("client_id=google_client_id"));
        assert!(url.contains("redirect_uri=http%3A%2F%2Flocalhost%3A8080%2Fauth%2Fgoogle%2Fcallback"));
        assert!(url.contains("state=abc"));
        assert!(url.contains("scope=openid%20email%20profile"));
    }

    #[test]
    fn test_authorization_url_github_uses_default_scopes() {
        let client = OAuthIdentityClient::new(&Config::test_default()).unwrap();
        let url = client
            .authorization_url(OAuthProvider::GitHub, "http://cb", "xyz")
            .unwrap();

        assert!(url.starts_with("https://github.com/login/oauth/authorize?"));
        assert!(!url.contains("scope="));
    }

    #[test]
    fn test_unconfigured_provider_is_disabled() {
        let mut config = Config::test_default();
        config.github = None;
        let client = OAuthIdentityClient::new(&config).unwrap();

        assert_eq!(client.enabled_providers(), vec![OAuthProvider::Google]);
        assert!(matches!(
            client.authorization_url(OAuthProvider::GitHub, "http://cb", "s"),
            Err(AppError::BadRequest(_))
        ));
    }

    #[test]
    fn test_github_user_mapping() {
        let user: GitHubUser = serde_json::from_value(serde_json::json!({
            "id": 583231,
            "login": "octocat",
            "name": null,
            "email": null,
            "avatar_url": "https://avatars.githubusercontent.com/u/583231",
        }))
        .unwrap();

        let identity = user.into_identity();
        assert_eq!(identity.uid, "github:583231");
        assert_eq!(identity.display_name.as_deref(), Some("octocat"));
        assert_eq!(identity.auth_providers(), vec!["github"]);
    }

    #[test]
    fn test_google_userinfo_mapping() {
        let info: GoogleUserInfo = serde_json::from_value(serde_json::json!({
            "sub": "1099",
            "email": "ada@example.edu",
            "name": "Ada Lovelace",
            "picture": "https://lh3.googleusercontent.com/a/pic",
        }))
        .unwrap();

        let identity = info.into_identity();
        assert_eq!(identity.uid, "google:1099");
        assert_eq!(identity.email.as_deref(), Some("ada@example.edu"));
        assert_eq!(identity.provider_data[0].provider_id, "google.com");
    }
}
