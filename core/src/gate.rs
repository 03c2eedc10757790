//! Access gate: decides whether the caller may see dashboard content.
//!
//! Two checks, both required:
//!   1. the provider verifies the credentials (authentication)
//!   2. the verified email is on the allowlist (authorization)
//!
//! A session that passes (1) but fails (2) is signed out immediately.
//! Both failures show the same message.
//!
//! The gate subscribes to provider session events on construction and
//! unsubscribes in Drop.

use crate::{
    auth::{AuthProvider, Identity, SessionEvent, SubscriptionId},
    error::{DashResult, GateError, GateResult},
};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::{Arc, Mutex, MutexGuard};

const ALLOWLIST_JSON: &str = include_str!("../data/access/allowlist.json");

// ── Allowlist ──────────────────────────────────────────────────────

/// Authorized addresses. Matching is exact but case-insensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allowlist {
    emails: BTreeSet<String>,
}

#[derive(Debug, Deserialize)]
struct AllowlistFile {
    emails: Vec<String>,
}

impl Allowlist {
    pub fn new<I, S>(emails: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            emails: emails.into_iter().map(|e| normalize(e.as_ref())).collect(),
        }
    }

    pub fn builtin() -> DashResult<Self> {
        let file: AllowlistFile = serde_json::from_str(ALLOWLIST_JSON)?;
        Ok(Self::new(file.emails))
    }

    pub fn contains(&self, email: &str) -> bool {
        self.emails.contains(&normalize(email))
    }

    pub fn len(&self) -> usize {
        self.emails.len()
    }

    pub fn is_empty(&self) -> bool {
        self.emails.is_empty()
    }
}

fn normalize(email: &str) -> String {
    email.to_lowercase()
}

// ── Gate state ─────────────────────────────────────────────────────

#[derive(Debug, Default)]
struct GateState {
    authenticated:     bool,
    identity:          Option<Identity>,
    last_error:        Option<String>,
    /// Set by the session listener when a non-allowlisted session shows
    /// up. The provider cannot be called from inside its own callback,
    /// so the sign-out happens on the next `sync()`.
    pending_sign_out:  bool,
}

impl GateState {
    fn admit(&mut self, identity: Identity) {
        self.authenticated = true;
        self.identity = Some(identity);
        self.last_error = None;
        self.pending_sign_out = false;
    }

    fn clear(&mut self) {
        self.authenticated = false;
        self.identity = None;
    }
}

fn lock(state: &Mutex<GateState>) -> MutexGuard<'_, GateState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

// ── Gate ───────────────────────────────────────────────────────────

pub struct AccessGate {
    allowlist:    Arc<Allowlist>,
    provider:     Box<dyn AuthProvider>,
    state:        Arc<Mutex<GateState>>,
    subscription: Option<SubscriptionId>,
}

impl AccessGate {
    /// Wire the gate to a provider, subscribe to its session events and
    /// re-evaluate any session the provider already holds.
    pub fn new(allowlist: Allowlist, provider: Box<dyn AuthProvider>) -> Self {
        let mut gate = Self {
            allowlist: Arc::new(allowlist),
            provider,
            state: Arc::new(Mutex::new(GateState::default())),
            subscription: None,
        };

        let state = Arc::clone(&gate.state);
        let allowlist = Arc::clone(&gate.allowlist);
        let id = gate.provider.subscribe(Box::new(move |event| {
            on_session_event(&state, &allowlist, event);
        }));
        gate.subscription = Some(id);

        gate.restore_session();
        gate
    }

    fn restore_session(&mut self) {
        match self.provider.current_session() {
            Ok(Some(session)) => {
                if self.allowlist.contains(&session.identity.email) {
                    log::info!(
                        "gate: restored session for {} via {}",
                        session.identity.email,
                        self.provider.name()
                    );
                    lock(&self.state).admit(session.identity);
                } else {
                    log::warn!(
                        "gate: existing session for {} is not allowlisted; signing out",
                        session.identity.email
                    );
                    self.force_sign_out();
                }
            }
            Ok(None) => log::debug!("gate: no existing session"),
            Err(e) => log::warn!("gate: could not read existing session: {e}"),
        }
    }

    /// Verify credentials, then require allowlist membership.
    pub fn login(&mut self, email: &str, password: &str) -> GateResult<Identity> {
        self.sync();

        // Local mode verifies nothing, so the allowlist is the only check and
        // an unlisted address never gets a session.
        if !self.provider.is_remote() && !self.allowlist.contains(email) {
            log::warn!("gate: {email} is not allowlisted; local sign-in refused");
            let err = GateError::Unauthorized { email: email.to_string() };
            let mut state = lock(&self.state);
            state.clear();
            state.last_error = Some(err.user_message().to_string());
            return Err(err);
        }

        let session = match self.provider.sign_in(email, password) {
            Ok(session) => session,
            Err(e) => {
                log::warn!("gate: sign-in via {} failed for {email}: {e}", self.provider.name());
                let mut state = lock(&self.state);
                state.clear();
                state.last_error = Some(e.user_message().to_string());
                return Err(e);
            }
        };

        let verified = session.identity.email.clone();
        if !self.allowlist.contains(&verified) {
            log::warn!("gate: {verified} authenticated but not allowlisted; signing out");
            self.force_sign_out();
            let err = GateError::Unauthorized { email: verified };
            lock(&self.state).last_error = Some(err.user_message().to_string());
            return Err(err);
        }

        log::info!("gate: {verified} admitted via {}", self.provider.name());
        lock(&self.state).admit(session.identity.clone());
        Ok(session.identity)
    }

    /// Clear local state and invalidate the provider's session.
    pub fn logout(&mut self) -> GateResult<()> {
        lock(&self.state).clear();
        let result = self.provider.sign_out();
        if let Err(e) = &result {
            log::warn!("gate: provider sign-out failed: {e}");
        } else {
            log::info!("gate: logged out");
        }
        result
    }

    /// Apply any sign-out requested by the session listener.
    pub fn sync(&mut self) {
        let pending = std::mem::take(&mut lock(&self.state).pending_sign_out);
        if pending {
            self.force_sign_out();
        }
    }

    fn force_sign_out(&mut self) {
        {
            let mut state = lock(&self.state);
            state.clear();
            state.pending_sign_out = false;
        }
        if let Err(e) = self.provider.sign_out() {
            log::warn!("gate: forced sign-out failed: {e}");
        }
    }

    pub fn is_authenticated(&self) -> bool {
        lock(&self.state).authenticated
    }

    pub fn identity(&self) -> Option<Identity> {
        lock(&self.state).identity.clone()
    }

    /// The message to show for the most recent failed login, if any.
    pub fn last_error(&self) -> Option<String> {
        lock(&self.state).last_error.clone()
    }

    pub fn allowlist(&self) -> &Allowlist {
        &self.allowlist
    }

    pub fn provider_name(&self) -> &'static str {
        self.provider.name()
    }

    pub fn is_remote(&self) -> bool {
        self.provider.is_remote()
    }
}

impl Drop for AccessGate {
    fn drop(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.provider.unsubscribe(id);
            log::debug!("gate: released subscription {id}");
        }
    }
}

fn on_session_event(state: &Mutex<GateState>, allowlist: &Allowlist, event: &SessionEvent) {
    let mut state = lock(state);
    match event {
        SessionEvent::SignedIn(session) | SessionEvent::TokenRefreshed(session) => {
            if allowlist.contains(&session.identity.email) {
                state.admit(session.identity.clone());
            } else {
                state.clear();
                state.pending_sign_out = true;
            }
        }
        SessionEvent::SignedOut => state.clear(),
    }
}
