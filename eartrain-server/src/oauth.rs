//! Google OAuth2 sign-in
//!
//! Only the authorization-code flow needed to identify a Google user: build
//! the consent URL, exchange the returned code for an access token, then read
//! the user's profile from the userinfo endpoint.

use async_trait::async_trait;
use eartrain_common::config::GoogleConfig;
use reqwest::Url;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

const AUTHORIZE_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
const TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
const USERINFO_URL: &str = "https://openidconnect.googleapis.com/v1/userinfo";
const SCOPES: &str = "openid email profile";

/// OAuth failures talking to the identity provider
#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("invalid provider URL: {0}")]
    InvalidUrl(String),

    #[error("provider rejected the request: {0}")]
    Rejected(String),

    #[error("provider did not return a verified email address")]
    MissingEmail,
}

/// Identity returned by an external sign-in provider
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExternalIdentity {
    /// Provider's stable subject id
    pub subject: String,
    pub email: String,
    pub name: Option<String>,
    pub avatar: Option<String>,
}

/// An OAuth identity provider
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// URL to send the browser to, carrying the anti-forgery `state`
    fn authorize_url(&self, state: &str) -> Result<String, OAuthError>;

    /// Exchange an authorization code for the signed-in user's identity
    async fn exchange_code(&self, code: &str) -> Result<ExternalIdentity, OAuthError>;
}

/// Google implementation of [`IdentityProvider`]
pub struct GoogleOAuthClient {
    http: reqwest::Client,
    config: GoogleConfig,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Debug, Deserialize)]
struct UserInfo {
    sub: String,
    email: Option<String>,
    email_verified: Option<bool>,
    name: Option<String>,
    picture: Option<String>,
}

impl GoogleOAuthClient {
    pub fn new(config: GoogleConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    async fn fetch_access_token(&self, code: &str) -> Result<String, OAuthError> {
        let response = self
            .http
            .post(TOKEN_URL)
            .form(&[
                ("code", code),
                ("client_id", self.config.client_id.as_str()),
                ("client_secret", self.config.client_secret.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("grant_type", "authorization_code"),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(OAuthError::Rejected(format!(
                "token exchange returned {}: {}",
                status, body
            )));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.access_token)
    }
}

#[async_trait]
impl IdentityProvider for GoogleOAuthClient {
    fn authorize_url(&self, state: &str) -> Result<String, OAuthError> {
        let url = Url::parse_with_params(
            AUTHORIZE_URL,
            &[
                ("client_id", self.config.client_id.as_str()),
                ("redirect_uri", self.config.redirect_uri.as_str()),
                ("response_type", "code"),
                ("scope", SCOPES),
                ("state", state),
                ("prompt", "select_account"),
            ],
        )
        .map_err(|e| OAuthError::InvalidUrl(e.to_string()))?;
        Ok(url.into())
    }

    async fn exchange_code(&self, code: &str) -> Result<ExternalIdentity, OAuthError> {
        let access_token = self.fetch_access_token(code).await?;

        let response = self
            .http
            .get(USERINFO_URL)
            .bearer_auth(&access_token)
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(OAuthError::Rejected(format!(
                "userinfo returned {}",
                response.status()
            )));
        }

        let info: UserInfo = response.json().await?;
        debug!("Google userinfo received for subject {}", info.sub);

        let email = match (info.email, info.email_verified) {
            (Some(email), Some(true) | None) if !email.trim().is_empty() => email,
            _ => return Err(OAuthError::MissingEmail),
        };

        Ok(ExternalIdentity {
            subject: info.sub,
            email,
            name: info.name.filter(|n| !n.trim().is_empty()),
            avatar: info.picture,
        })
    }
}
