//! Cloud backend authentication
//!
//! Password-grant sign-in, sign-out, and token refresh against the hosted
//! backend's auth endpoint. The current session is published through a
//! watch channel; the store adapter and the mode manager both hold
//! receivers and pick up identity changes reactively.

use crate::config::REMOTE_REQUEST_TIMEOUT_SECS;
use crate::database::models::RemoteCredentials;
use crate::error::{AppError, Result};
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::watch;

/// An authenticated session with the cloud backend
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: Option<DateTime<Utc>>,
    pub user_id: String,
}

impl Session {
    pub fn is_expired(&self) -> bool {
        self.expires_at.is_some_and(|at| at <= Utc::now())
    }
}

/// Successful token-endpoint response
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: Option<i64>,
    user: TokenUser,
}

#[derive(Debug, Deserialize)]
struct TokenUser {
    id: String,
}

impl TokenResponse {
    fn into_session(self) -> Session {
        Session {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: self.expires_in.map(|secs| Utc::now() + Duration::seconds(secs)),
            user_id: self.user.id,
        }
    }
}

/// Pull the most descriptive message out of an auth error body.
///
/// The endpoint answers with different shapes depending on the failure
/// (`error_description`, `msg`, `message`, `error`), sometimes several at
/// once, so this reads them in order of usefulness.
fn auth_error_message(body: &serde_json::Value) -> Option<String> {
    ["error_description", "msg", "message", "error"]
        .iter()
        .find_map(|key| body.get(key).and_then(|v| v.as_str()))
        .map(|s| s.to_string())
}

/// Client for the backend's auth endpoints
pub struct AuthClient {
    http: reqwest::Client,
    base_url: String,
    anon_key: String,
    session_tx: watch::Sender<Option<Session>>,
}

impl AuthClient {
    pub fn new(credentials: &RemoteCredentials) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(REMOTE_REQUEST_TIMEOUT_SECS))
            .build()?;

        let (session_tx, _) = watch::channel(None);

        Ok(Self {
            http,
            base_url: credentials.url.clone(),
            anon_key: credentials.anon_key.clone(),
            session_tx,
        })
    }

    /// Current session, if signed in
    pub fn session(&self) -> Option<Session> {
        self.session_tx.borrow().clone()
    }

    /// Subscribe to session changes (sign-in, sign-out, refresh)
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.session_tx.subscribe()
    }

    /// Sign in with email and password
    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Session> {
        tracing::info!("Signing in to cloud backend");

        let response = self
            .http
            .post(format!("{}/auth/v1/token", self.base_url))
            .query(&[("grant_type", "password")])
            .header("apikey", self.anon_key.as_str())
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let session = Self::session_from_response(response).await?;
        self.session_tx.send_replace(Some(session.clone()));

        tracing::info!("Signed in as user: {}", session.user_id);
        Ok(session)
    }

    /// Exchange the refresh token for a new session
    pub async fn refresh(&self) -> Result<Session> {
        let refresh_token = self
            .session()
            .map(|s| s.refresh_token)
            .ok_or_else(|| AppError::Auth("no session to refresh".to_string()))?;

        let response = self
            .http
            .post(format!("{}/auth/v1/token", self.base_url))
            .query(&[("grant_type", "refresh_token")])
            .header("apikey", self.anon_key.as_str())
            .json(&serde_json::json!({ "refresh_token": refresh_token }))
            .send()
            .await?;

        let session = Self::session_from_response(response).await?;
        self.session_tx.send_replace(Some(session.clone()));

        tracing::debug!("Session refreshed for user: {}", session.user_id);
        Ok(session)
    }

    /// Sign out and drop the session.
    ///
    /// The local session is cleared even if the revocation request fails;
    /// the token will simply age out server-side.
    pub async fn sign_out(&self) -> Result<()> {
        let session = self.session_tx.send_replace(None);

        if let Some(session) = session {
            let result = self
                .http
                .post(format!("{}/auth/v1/logout", self.base_url))
                .header("apikey", self.anon_key.as_str())
                .bearer_auth(&session.access_token)
                .send()
                .await;

            if let Err(e) = result {
                tracing::warn!("Sign-out revocation request failed: {}", e);
            }
        }

        tracing::info!("Signed out");
        Ok(())
    }

    async fn session_from_response(response: reqwest::Response) -> Result<Session> {
        let status = response.status();

        if !status.is_success() {
            let message = response
                .json::<serde_json::Value>()
                .await
                .ok()
                .as_ref()
                .and_then(auth_error_message)
                .unwrap_or_else(|| format!("auth request failed with status {}", status));
            return Err(AppError::Auth(message));
        }

        let token: TokenResponse = response.json().await?;
        Ok(token.into_session())
    }
}
