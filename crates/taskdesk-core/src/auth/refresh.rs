//! Single-flight refresh of the access credential.
//!
//! Any number of callers may ask for a fresh access credential at the same
//! time; only one exchange call is ever in flight. Callers that arrive while
//! it runs await the same shared handle and receive the same result.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use futures::future::{BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::credentials::{CredentialPair, CredentialStore};
use crate::api::{ApiError, RefreshError};
use crate::models::TokenResponse;

/// Exchanges a refresh credential for a new credential pair.
#[async_trait]
pub trait RefreshExchange: Send + Sync {
    async fn exchange(&self, refresh_token: &str) -> Result<TokenResponse, ApiError>;
}

type RefreshFuture = Shared<BoxFuture<'static, Result<String, RefreshError>>>;

struct InFlight {
    generation: u64,
    // Refresh credential the exchange was started with
    refresh_token: String,
    handle: RefreshFuture,
}

/// Collapses concurrent refresh requests into one exchange.
///
/// The slot holds a handle exactly while an exchange is in flight. The
/// handle clears the slot itself before yielding its result, so a caller
/// arriving after settlement always starts a new exchange. Callers only join
/// a handle started from the refresh credential currently stored; a new
/// sign-in while an exchange runs gets an exchange of its own.
pub struct RefreshCoordinator {
    store: Arc<CredentialStore>,
    exchange: Arc<dyn RefreshExchange>,
    slot: Arc<Mutex<Option<InFlight>>>,
    generation: AtomicU64,
}

impl RefreshCoordinator {
    pub fn new(store: Arc<CredentialStore>, exchange: Arc<dyn RefreshExchange>) -> Self {
        Self {
            store,
            exchange,
            slot: Arc::new(Mutex::new(None)),
            generation: AtomicU64::new(0),
        }
    }

    /// Get a fresh access credential, joining an in-flight refresh if any.
    pub async fn refresh(&self) -> Result<String, RefreshError> {
        let handle = {
            let mut slot = self.slot.lock();
            let current = self.store.get().ok_or(RefreshError::MissingCredential)?;

            let joinable = match slot.as_ref() {
                Some(inflight) if inflight.refresh_token == current.refresh_token() => {
                    debug!(generation = inflight.generation, "Joining in-flight refresh");
                    Some(inflight.handle.clone())
                }
                Some(inflight) => {
                    debug!(
                        generation = inflight.generation,
                        "Credentials replaced since in-flight refresh started"
                    );
                    None
                }
                None => None,
            };

            match joinable {
                Some(handle) => handle,
                None => {
                    let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
                    debug!(generation, "Starting refresh");
                    let refresh_token = current.refresh_token().to_string();
                    let handle = self.start(generation, refresh_token.clone()).shared();
                    *slot = Some(InFlight {
                        generation,
                        refresh_token,
                        handle: handle.clone(),
                    });
                    handle
                }
            }
        };

        handle.await
    }

    fn start(&self, generation: u64, refresh_token: String) -> BoxFuture<'static, Result<String, RefreshError>> {
        let store = Arc::clone(&self.store);
        let exchange = Arc::clone(&self.exchange);
        let slot = Arc::clone(&self.slot);

        async move {
            let result = exchange_and_store(&store, exchange.as_ref(), refresh_token).await;

            {
                let mut slot = slot.lock();
                if slot.as_ref().is_some_and(|f| f.generation == generation) {
                    *slot = None;
                }
            }

            match &result {
                Ok(_) => info!(generation, "Access token refreshed"),
                Err(e) => warn!(generation, error = %e, "Access token refresh failed"),
            }
            result
        }
        .boxed()
    }
}

async fn exchange_and_store(
    store: &CredentialStore,
    exchange: &dyn RefreshExchange,
    expected_refresh: String,
) -> Result<String, RefreshError> {
    let issued = exchange.exchange(&expected_refresh).await?;

    // Authorities that don't rotate refresh credentials omit the field
    let refresh_token = issued
        .refresh_token
        .filter(|t| !t.is_empty())
        .unwrap_or_else(|| expected_refresh.clone());
    let refreshed = CredentialPair::new(issued.access_token, refresh_token)
        .ok_or_else(|| RefreshError::Rejected("authority returned an empty access token".into()))?;
    let access_token = refreshed.access_token().to_string();

    // Compare-and-swap: a sign-out or new sign-in during the exchange wins
    match store.replace_if(&expected_refresh, refreshed) {
        Ok(true) => Ok(access_token),
        Ok(false) => {
            debug!("Credentials changed during refresh, discarding result");
            Err(RefreshError::Superseded)
        }
        Err(e) => {
            warn!(error = %e, "Failed to persist refreshed credentials");
            Ok(access_token)
        }
    }
}
