//! Request and response interceptors for the protected pipeline.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::StatusCode;
use tracing::{debug, warn};

use super::request::endpoints;
use super::{ApiError, ApiRequest, ApiResponse};
use crate::auth::{session, CredentialStore, RefreshCoordinator, SessionProjection};

/// Runs before a request is sent; may rewrite it or fail it.
#[async_trait]
pub trait RequestInterceptor: Send + Sync {
    async fn on_request(&self, request: ApiRequest) -> Result<ApiRequest, ApiError>;
}

/// Runs after a response arrives; may pass it on or turn it into an error.
pub trait ResponseInterceptor: Send + Sync {
    fn on_response(&self, request: &ApiRequest, response: ApiResponse) -> Result<ApiResponse, ApiError>;
}

/// Attaches a bearer credential to every non-public request.
///
/// The access credential's expiry isn't known locally, so every
/// authenticated request asks the coordinator for a fresh one; concurrent
/// requests share a single refresh. When the refresh fails the request goes
/// out with whatever access credential is stored at that point, or fails with
/// [`ApiError::RefreshFailed`] if the session ended in the meantime.
pub struct BearerAuth {
    store: Arc<CredentialStore>,
    coordinator: Arc<RefreshCoordinator>,
}

impl BearerAuth {
    pub fn new(store: Arc<CredentialStore>, coordinator: Arc<RefreshCoordinator>) -> Self {
        Self { store, coordinator }
    }
}

#[async_trait]
impl RequestInterceptor for BearerAuth {
    async fn on_request(&self, mut request: ApiRequest) -> Result<ApiRequest, ApiError> {
        if request.is_public() {
            return Ok(request);
        }

        if !self.store.is_active() {
            debug!(path = %request.path, "No credentials held, sending without authorization");
            return Ok(request);
        }

        let token = match self.coordinator.refresh().await {
            Ok(token) => token,
            Err(e) => {
                // The store may have changed while the refresh ran; only the
                // credentials held now belong to the current session.
                let Some(current) = self.store.get() else {
                    debug!(path = %request.path, error = %e, "Session ended during refresh");
                    return Err(ApiError::RefreshFailed(e));
                };
                // Let the server reject the stale credential; the response
                // side decides whether the session is over.
                warn!(path = %request.path, error = %e, "Refresh failed, using stored access token");
                current.access_token().to_string()
            }
        };

        request.set_bearer(&token)?;
        Ok(request)
    }
}

/// Ends the session when a protected call comes back unauthorized.
pub struct SessionGuard {
    store: Arc<CredentialStore>,
    projection: Arc<SessionProjection>,
}

impl SessionGuard {
    pub fn new(store: Arc<CredentialStore>, projection: Arc<SessionProjection>) -> Self {
        Self { store, projection }
    }
}

impl ResponseInterceptor for SessionGuard {
    fn on_response(&self, request: &ApiRequest, response: ApiResponse) -> Result<ApiResponse, ApiError> {
        if response.status != StatusCode::UNAUTHORIZED {
            return Ok(response);
        }
        // Logout handles its own teardown; public calls never carried the session
        if request.path == endpoints::LOGOUT || request.is_public() {
            return Ok(response);
        }
        if !self.store.is_active() {
            return Ok(response);
        }

        warn!(path = %request.path, "Request unauthorized, ending session");
        session::terminate(&self.store, &self.projection);
        Err(ApiError::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::storage::MemoryStorage;
    use crate::api::RefreshError;
    use crate::auth::{CredentialPair, RefreshExchange, SessionState};
    use crate::models::TokenResponse;

    struct FixedExchange(Option<&'static str>);

    #[async_trait]
    impl RefreshExchange for FixedExchange {
        async fn exchange(&self, _refresh_token: &str) -> Result<TokenResponse, ApiError> {
            match self.0 {
                Some(token) => Ok(TokenResponse {
                    access_token: token.to_string(),
                    refresh_token: None,
                }),
                None => Err(ApiError::Network("connection refused".into())),
            }
        }
    }

    fn bearer(exchange: FixedExchange, signed_in: bool) -> (Arc<CredentialStore>, BearerAuth) {
        let store = Arc::new(CredentialStore::new(Arc::new(MemoryStorage::new())));
        if signed_in {
            store.set(CredentialPair::new("stored", "r1").unwrap()).unwrap();
        }
        let coordinator = Arc::new(RefreshCoordinator::new(store.clone(), Arc::new(exchange)));
        (store.clone(), BearerAuth::new(store, coordinator))
    }

    fn guard(signed_in: bool) -> (Arc<CredentialStore>, Arc<SessionProjection>, SessionGuard) {
        let store = Arc::new(CredentialStore::new(Arc::new(MemoryStorage::new())));
        let projection = Arc::new(SessionProjection::new());
        if signed_in {
            store.set(CredentialPair::new("a1", "r1").unwrap()).unwrap();
            projection.begin_loading();
            projection.authenticate(None);
        }
        let guard = SessionGuard::new(store.clone(), projection.clone());
        (store, projection, guard)
    }

    #[tokio::test]
    async fn test_sign_in_never_carries_authorization() {
        let (_store, auth) = bearer(FixedExchange(Some("fresh")), true);

        let request = auth.on_request(ApiRequest::post(endpoints::SIGN_IN)).await.unwrap();
        assert!(request.bearer().is_none());
    }

    #[tokio::test]
    async fn test_protected_request_gets_refreshed_token() {
        let (_store, auth) = bearer(FixedExchange(Some("fresh")), true);

        let request = auth.on_request(ApiRequest::get(endpoints::TODOS)).await.unwrap();
        assert_eq!(request.bearer(), Some("fresh"));
    }

    #[tokio::test]
    async fn test_anonymous_request_sent_without_header() {
        let (_store, auth) = bearer(FixedExchange(Some("fresh")), false);

        let request = auth.on_request(ApiRequest::get(endpoints::TODOS)).await.unwrap();
        assert!(request.bearer().is_none());
    }

    #[tokio::test]
    async fn test_refresh_failure_falls_back_to_stored_token() {
        let (store, auth) = bearer(FixedExchange(None), true);

        let request = auth.on_request(ApiRequest::get(endpoints::PROFILE)).await.unwrap();
        assert_eq!(request.bearer(), Some("stored"));
        assert!(store.is_active());
    }

    /// Replaces or clears the stored pair, then fails the exchange.
    struct ReplacingExchange {
        store: Arc<CredentialStore>,
        replacement: Option<CredentialPair>,
    }

    #[async_trait]
    impl RefreshExchange for ReplacingExchange {
        async fn exchange(&self, _refresh_token: &str) -> Result<TokenResponse, ApiError> {
            match &self.replacement {
                Some(pair) => self.store.set(pair.clone()).unwrap(),
                None => self.store.clear().unwrap(),
            }
            Err(ApiError::Unauthorized)
        }
    }

    fn replacing(replacement: Option<CredentialPair>) -> (Arc<CredentialStore>, BearerAuth) {
        let store = Arc::new(CredentialStore::new(Arc::new(MemoryStorage::new())));
        store.set(CredentialPair::new("old", "r-old").unwrap()).unwrap();
        let exchange = ReplacingExchange {
            store: store.clone(),
            replacement,
        };
        let coordinator = Arc::new(RefreshCoordinator::new(store.clone(), Arc::new(exchange)));
        (store.clone(), BearerAuth::new(store, coordinator))
    }

    #[tokio::test]
    async fn test_refresh_failure_uses_credentials_replaced_meanwhile() {
        let (_store, auth) = replacing(CredentialPair::new("new", "r-new"));

        let request = auth.on_request(ApiRequest::get(endpoints::TODOS)).await.unwrap();
        assert_eq!(request.bearer(), Some("new"));
    }

    #[tokio::test]
    async fn test_session_ended_during_refresh_fails_request() {
        let (store, auth) = replacing(None);

        let result = auth.on_request(ApiRequest::get(endpoints::TODOS)).await;
        assert!(matches!(result, Err(ApiError::RefreshFailed(RefreshError::Rejected(_)))));
        assert!(!store.is_active());
    }

    #[test]
    fn test_unauthorized_terminates_session() {
        let (store, projection, guard) = guard(true);

        let result = guard.on_response(
            &ApiRequest::get(endpoints::TODOS),
            ApiResponse::new(StatusCode::UNAUTHORIZED, ""),
        );

        assert!(matches!(result, Err(ApiError::Unauthorized)));
        assert!(store.get().is_none());
        assert_eq!(projection.current(), SessionState::Anonymous);
    }

    #[test]
    fn test_logout_unauthorized_is_exempt() {
        let (store, projection, guard) = guard(true);

        let response = guard
            .on_response(
                &ApiRequest::post(endpoints::LOGOUT),
                ApiResponse::new(StatusCode::UNAUTHORIZED, ""),
            )
            .unwrap();

        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
        assert!(store.is_active());
        assert!(projection.current().is_authenticated());
    }

    #[test]
    fn test_unauthorized_without_session_passes_through() {
        let (_store, _projection, guard) = guard(false);

        let response = guard
            .on_response(
                &ApiRequest::get(endpoints::TODOS),
                ApiResponse::new(StatusCode::UNAUTHORIZED, ""),
            )
            .unwrap();
        assert_eq!(response.status, StatusCode::UNAUTHORIZED);
    }

    #[test]
    fn test_other_failures_pass_through() {
        let (store, _projection, guard) = guard(true);

        let response = guard
            .on_response(
                &ApiRequest::get(endpoints::TODOS),
                ApiResponse::new(StatusCode::FORBIDDEN, "admins only"),
            )
            .unwrap();
        assert_eq!(response.status, StatusCode::FORBIDDEN);
        assert!(store.is_active());
    }
}
