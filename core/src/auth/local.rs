//! Local development provider. No external service is configured, so
//! every credential is accepted; the gate's allowlist is the only check.

use super::{AuthProvider, Identity, Listeners, Session, SessionEvent, SessionListener, SubscriptionId};
use crate::error::GateResult;
use uuid::Uuid;

#[derive(Default)]
pub struct LocalAuthProvider {
    session:   Option<Session>,
    listeners: Listeners,
}

impl LocalAuthProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners.len()
    }
}

impl AuthProvider for LocalAuthProvider {
    fn name(&self) -> &'static str {
        "local"
    }

    fn is_remote(&self) -> bool {
        false
    }

    fn sign_in(&mut self, email: &str, _password: &str) -> GateResult<Session> {
        let session = Session {
            identity: Identity {
                user_id: Uuid::new_v4().to_string(),
                email:   email.to_string(),
            },
            access_token: None,
            expires_at:   None,
        };
        log::debug!("auth.local: session issued for {email}");
        self.session = Some(session.clone());
        self.listeners.notify(&SessionEvent::SignedIn(session.clone()));
        Ok(session)
    }

    fn current_session(&self) -> GateResult<Option<Session>> {
        Ok(self.session.clone())
    }

    fn subscribe(&mut self, listener: SessionListener) -> SubscriptionId {
        self.listeners.add(listener)
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.listeners.remove(id);
    }

    fn sign_out(&mut self) -> GateResult<()> {
        if self.session.take().is_some() {
            self.listeners.notify(&SessionEvent::SignedOut);
        }
        Ok(())
    }
}
