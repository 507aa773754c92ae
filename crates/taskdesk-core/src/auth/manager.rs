use std::sync::Arc;

use tracing::{info, warn};

use super::credentials::{CredentialPair, CredentialStore};
use super::session::{self, SessionProjection, SessionState};
use super::storage::StorageError;
use crate::api::{ApiClient, ApiError};
use crate::models::Registration;

/// Drives sign-in, sign-out and startup restoration through the projection.
pub struct SessionManager {
    api: ApiClient,
    store: Arc<CredentialStore>,
    projection: Arc<SessionProjection>,
}

impl SessionManager {
    pub fn new(api: ApiClient, store: Arc<CredentialStore>, projection: Arc<SessionProjection>) -> Self {
        Self {
            api,
            store,
            projection,
        }
    }

    pub fn state(&self) -> SessionState {
        self.projection.current()
    }

    /// Rebuild the session from persisted credentials. Called once at startup.
    pub async fn restore(&self) -> Result<SessionState, StorageError> {
        if self.store.hydrate()?.is_none() {
            self.projection.reset();
            return Ok(SessionState::Anonymous);
        }

        info!("Restoring persisted session");
        self.projection.begin_loading();
        Ok(self.load_profile().await)
    }

    /// Sign in and load the profile.
    ///
    /// A rejected sign-in returns `InvalidCredentials` and leaves both the
    /// stored credentials and the projection as they were.
    pub async fn sign_in(&self, login: &str, password: &str) -> Result<SessionState, ApiError> {
        let previous = self.projection.current();
        self.projection.begin_loading();

        let tokens = match self.api.sign_in(login, password).await {
            Ok(tokens) => tokens,
            Err(e) => {
                warn!(login = login, error = %e, "Sign-in failed");
                self.projection.restore(previous);
                return Err(e);
            }
        };

        let pair = tokens
            .refresh_token
            .and_then(|refresh| CredentialPair::new(tokens.access_token, refresh));
        let Some(pair) = pair else {
            self.projection.restore(previous);
            return Err(ApiError::InvalidResponse("Sign-in response is missing a credential".into()));
        };

        if let Err(e) = self.store.set(pair) {
            warn!(error = %e, "Failed to persist credentials; session will not survive restart");
        }
        info!(login = login, "Signed in");
        Ok(self.load_profile().await)
    }

    /// Register a new account. The user signs in separately afterwards.
    pub async fn sign_up(&self, registration: &Registration) -> Result<(), ApiError> {
        self.api.sign_up(registration).await?;
        info!(login = %registration.login, "Account registered");
        Ok(())
    }

    /// Tell the server, then end the session locally whatever it answered.
    pub async fn sign_out(&self) {
        if self.store.is_active() {
            if let Err(e) = self.api.logout().await {
                warn!(error = %e, "Logout request failed, clearing session anyway");
            }
        }
        session::terminate(&self.store, &self.projection);
    }

    /// Fetch the profile and settle the projection.
    ///
    /// An unauthorized response has already ended the session by the time it
    /// reaches here. Any other failure leaves the session authenticated
    /// without a profile.
    pub async fn load_profile(&self) -> SessionState {
        match self.api.profile().await {
            Ok(profile) => {
                self.projection.authenticate(Some(profile));
            }
            Err(ApiError::Unauthorized) => {
                warn!("Profile fetch unauthorized");
                if self.store.is_active() {
                    session::terminate(&self.store, &self.projection);
                } else {
                    self.projection.reset();
                }
            }
            Err(e) => {
                warn!(error = %e, "Failed to load profile, continuing without it");
                if self.store.is_active() {
                    self.projection.authenticate(None);
                } else {
                    self.projection.reset();
                }
            }
        }
        self.projection.current()
    }
}
