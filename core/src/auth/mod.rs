//! Authentication capability: the black box behind the access gate.
//!
//! RULE: The gate never talks to an identity service directly.
//! It holds a `Box<dyn AuthProvider>` chosen at startup:
//!   - `LocalAuthProvider`  no external service, any credential passes
//!   - `HttpAuthProvider`   GoTrue-compatible password grant over HTTPS
//!
//! Providers announce session changes to subscribers. A subscriber must
//! release its subscription when it is torn down.

pub mod http;
pub mod local;

pub use http::HttpAuthProvider;
pub use local::LocalAuthProvider;

use crate::error::GateResult;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A verified user as reported by the provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub user_id: String,
    pub email:   String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub identity:     Identity,
    pub access_token: Option<String>,
    pub expires_at:   Option<DateTime<Utc>>,
}

impl Session {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at.map(|t| t <= now).unwrap_or(false)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    SignedIn(Session),
    TokenRefreshed(Session),
    SignedOut,
}

pub type SubscriptionId = u64;

pub type SessionListener = Box<dyn Fn(&SessionEvent) + Send + Sync>;

/// The contract every authentication provider must fulfill.
pub trait AuthProvider: Send {
    /// Stable name for logs.
    fn name(&self) -> &'static str;

    /// True when credentials are checked by an external service.
    fn is_remote(&self) -> bool;

    /// Verify credentials. Blocks until the provider answers or times out.
    fn sign_in(&mut self, email: &str, password: &str) -> GateResult<Session>;

    /// The session the provider currently holds, if any and unexpired.
    fn current_session(&self) -> GateResult<Option<Session>>;

    fn subscribe(&mut self, listener: SessionListener) -> SubscriptionId;

    fn unsubscribe(&mut self, id: SubscriptionId);

    /// Invalidate the current session. Always clears it locally, even if
    /// the remote call fails.
    fn sign_out(&mut self) -> GateResult<()>;
}

/// Subscriber registry shared by provider implementations.
#[derive(Default)]
pub struct Listeners {
    next_id: SubscriptionId,
    entries: Vec<(SubscriptionId, SessionListener)>,
}

impl Listeners {
    pub fn add(&mut self, listener: SessionListener) -> SubscriptionId {
        self.next_id += 1;
        self.entries.push((self.next_id, listener));
        self.next_id
    }

    pub fn remove(&mut self, id: SubscriptionId) {
        self.entries.retain(|(entry_id, _)| *entry_id != id);
    }

    pub fn notify(&self, event: &SessionEvent) {
        for (_, listener) in &self.entries {
            listener(event);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
