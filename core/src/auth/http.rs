//! Networked provider for a GoTrue-compatible identity endpoint.
//!
//! Endpoints used:
//!   POST {base}/auth/v1/token?grant_type=password   sign in
//!   POST {base}/auth/v1/logout                      sign out
//!
//! Every request carries the project's `apikey` header and is bounded by
//! the configured timeout. A timeout surfaces as `GateError::Timeout`.

use super::{AuthProvider, Identity, Listeners, Session, SessionEvent, SessionListener, SubscriptionId};
use crate::{
    config::AuthEndpointConfig,
    error::{GateError, GateResult},
};
use chrono::{Duration as ChronoDuration, Utc};
use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;

#[derive(Debug, Serialize)]
struct PasswordGrant<'a> {
    email:    &'a str,
    password: &'a str,
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in:   Option<i64>,
    user:         UserPayload,
}

#[derive(Debug, Deserialize)]
struct UserPayload {
    id:    String,
    #[serde(default)]
    email: Option<String>,
}

pub struct HttpAuthProvider {
    client:    Client,
    base_url:  String,
    api_key:   String,
    session:   Option<Session>,
    listeners: Listeners,
}

impl HttpAuthProvider {
    pub fn new(config: &AuthEndpointConfig) -> GateResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .connect_timeout(Duration::from_millis(config.timeout_ms))
            .build()?;

        Ok(Self {
            client,
            base_url:  config.base_url.trim_end_matches('/').to_string(),
            api_key:   config.api_key.clone(),
            session:   None,
            listeners: Listeners::default(),
        })
    }

    pub fn token_url(&self) -> String {
        format!("{}/auth/v1/token?grant_type=password", self.base_url)
    }

    pub fn logout_url(&self) -> String {
        format!("{}/auth/v1/logout", self.base_url)
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }

    /// Only the provider-verified address is trusted; a response without one
    /// is not a session.
    fn session_from(token: TokenResponse) -> GateResult<Session> {
        let email = token
            .user
            .email
            .filter(|e| !e.is_empty())
            .ok_or_else(|| GateError::MalformedResponse("token response has no user email".into()))?;
        let expires_at = token
            .expires_in
            .map(|secs| Utc::now() + ChronoDuration::seconds(secs));
        Ok(Session {
            identity: Identity {
                user_id: token.user.id,
                email,
            },
            access_token: Some(token.access_token),
            expires_at,
        })
    }
}

impl AuthProvider for HttpAuthProvider {
    fn name(&self) -> &'static str {
        "http"
    }

    fn is_remote(&self) -> bool {
        true
    }

    fn sign_in(&mut self, email: &str, password: &str) -> GateResult<Session> {
        log::debug!("auth.http: password grant for {email}");
        let response = self
            .client
            .post(self.token_url())
            .header("apikey", &self.api_key)
            .json(&PasswordGrant { email, password })
            .send()?;

        let status = response.status();
        if matches!(
            status,
            StatusCode::BAD_REQUEST | StatusCode::UNAUTHORIZED | StatusCode::UNPROCESSABLE_ENTITY
        ) {
            log::info!("auth.http: credentials rejected for {email} (status {status})");
            return Err(GateError::InvalidCredentials);
        }
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(GateError::Provider { status: status.as_u16(), body });
        }

        let token: TokenResponse = response.json()?;
        let session = Self::session_from(token).map_err(|e| {
            log::warn!("auth.http: rejecting sign-in for {email}: {e}");
            e
        })?;
        self.session = Some(session.clone());
        self.listeners.notify(&SessionEvent::SignedIn(session.clone()));
        Ok(session)
    }

    fn current_session(&self) -> GateResult<Option<Session>> {
        let now = Utc::now();
        Ok(self.session.clone().filter(|s| !s.is_expired(now)))
    }

    fn subscribe(&mut self, listener: SessionListener) -> SubscriptionId {
        self.listeners.add(listener)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.listeners.remove(id);
    }

    fn sign_out(&mut self) -> GateResult<()> {
        let Some(session) = self.session.take() else {
            return Ok(());
        };
        self.listeners.notify(&SessionEvent::SignedOut);

        let Some(token) = session.access_token else {
            return Ok(());
        };
        let response = self
            .client
            .post(self.logout_url())
            .header("apikey", &self.api_key)
            .bearer_auth(token)
            .send()?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("auth.http: remote logout returned {status}; local session already cleared");
            let body = response.text().unwrap_or_default();
            return Err(GateError::Provider { status: status.as_u16(), body });
        }
        Ok(())
    }
}
