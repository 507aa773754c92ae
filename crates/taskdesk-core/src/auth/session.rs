use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::credentials::CredentialStore;
use crate::models::Profile;

#[derive(Debug, Clone, PartialEq, Default)]
pub enum SessionState {
    #[default]
    Anonymous,
    /// Signing in, or restoring a persisted session and loading the profile
    Loading,
    /// Signed in. The profile is absent when it could not be fetched.
    Authenticated(Option<Profile>),
}

impl SessionState {
    pub fn is_authenticated(&self) -> bool {
        matches!(self, SessionState::Authenticated(_))
    }

    pub fn profile(&self) -> Option<&Profile> {
        match self {
            SessionState::Authenticated(profile) => profile.as_ref(),
            _ => None,
        }
    }
}

/// Process-wide view of the session that front ends observe.
pub struct SessionProjection {
    tx: watch::Sender<SessionState>,
}

impl Default for SessionProjection {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionProjection {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(SessionState::Anonymous);
        Self { tx }
    }

    pub fn current(&self) -> SessionState {
        self.tx.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<SessionState> {
        self.tx.subscribe()
    }

    pub fn begin_loading(&self) {
        self.transition(SessionState::Loading);
    }

    /// Enter `Authenticated`. Ignored when the session was terminated while
    /// the caller was still loading, so a late profile fetch is a no-op.
    pub fn authenticate(&self, profile: Option<Profile>) -> bool {
        let applied = self.tx.send_if_modified(|state| {
            if matches!(state, SessionState::Anonymous) {
                return false;
            }
            *state = SessionState::Authenticated(profile);
            true
        });
        if !applied {
            debug!("Session already ended, ignoring authentication");
        }
        applied
    }

    /// Put back a state captured earlier, e.g. after a rejected sign-in.
    pub fn restore(&self, state: SessionState) {
        self.transition(state);
    }

    pub fn reset(&self) {
        self.transition(SessionState::Anonymous);
    }

    fn transition(&self, next: SessionState) {
        self.tx.send_if_modified(|state| {
            if *state == next {
                return false;
            }
            debug!(from = ?state, to = ?next, "Session transition");
            *state = next;
            true
        });
    }
}

/// Clear stored credentials and return the projection to `Anonymous`.
pub fn terminate(store: &CredentialStore, projection: &SessionProjection) {
    info!("Terminating session");
    if let Err(e) = store.clear() {
        warn!(error = %e, "Failed to clear persisted credentials");
    }
    projection.reset();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::storage::MemoryStorage;
    use crate::auth::CredentialPair;
    use std::sync::Arc;

    fn profile() -> Profile {
        serde_json::from_str(r#"{"username": "ada", "email": "ada@example.com"}"#).unwrap()
    }

    #[test]
    fn test_initial_state_is_anonymous() {
        let projection = SessionProjection::new();
        assert_eq!(projection.current(), SessionState::Anonymous);
    }

    #[test]
    fn test_loading_then_authenticated() {
        let projection = SessionProjection::new();
        projection.begin_loading();
        assert_eq!(projection.current(), SessionState::Loading);

        assert!(projection.authenticate(Some(profile())));
        assert_eq!(projection.current().profile().map(|p| p.username.as_str()), Some("ada"));
    }

    #[test]
    fn test_authenticate_after_termination_is_ignored() {
        let projection = SessionProjection::new();
        projection.begin_loading();
        projection.reset();

        assert!(!projection.authenticate(Some(profile())));
        assert_eq!(projection.current(), SessionState::Anonymous);
    }

    #[tokio::test]
    async fn test_subscribers_observe_termination() {
        let projection = SessionProjection::new();
        projection.begin_loading();
        projection.authenticate(None);

        let mut rx = projection.subscribe();
        let store = CredentialStore::new(Arc::new(MemoryStorage::new()));
        store.set(CredentialPair::new("a1", "r1").unwrap()).unwrap();

        terminate(&store, &projection);

        rx.changed().await.unwrap();
        assert_eq!(*rx.borrow(), SessionState::Anonymous);
        assert!(store.get().is_none());
    }
}
