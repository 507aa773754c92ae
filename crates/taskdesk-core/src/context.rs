//! Startup wiring: storage, transport, pipelines and session components.

use std::sync::Arc;

use thiserror::Error;
use tracing::debug;

use crate::api::{ApiClient, ApiError, BearerAuth, HttpTransport, Pipeline, RefreshEndpoint, SessionGuard, Transport};
use crate::auth::{
    CredentialStore, FileStorage, KeyringStorage, RefreshCoordinator, SessionManager,
    SessionProjection, TokenStorage,
};
use crate::config::{Config, ConfigError, StorageBackend};

#[derive(Error, Debug)]
pub enum ContextError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to create HTTP client: {0}")]
    Http(#[from] ApiError),
}

/// Everything a front end needs, composed once at startup.
pub struct AppContext {
    pub config: Config,
    pub api: ApiClient,
    pub session: SessionManager,
    pub store: Arc<CredentialStore>,
    pub projection: Arc<SessionProjection>,
}

impl AppContext {
    /// Build a context talking HTTP to the configured API.
    pub fn from_config(config: Config) -> Result<Self, ContextError> {
        let storage: Arc<dyn TokenStorage> = match config.storage {
            StorageBackend::File => Arc::new(FileStorage::new(config.data_dir()?)),
            StorageBackend::Keyring => Arc::new(KeyringStorage),
        };
        let transport = Arc::new(HttpTransport::new(
            config.api_base_url.clone(),
            config.request_timeout(),
        )?);
        Ok(Self::with_parts(config, transport, storage))
    }

    /// Build a context over an arbitrary transport and storage backend.
    pub fn with_parts(config: Config, transport: Arc<dyn Transport>, storage: Arc<dyn TokenStorage>) -> Self {
        let store = Arc::new(CredentialStore::new(storage));
        let projection = Arc::new(SessionProjection::new());

        let public = Arc::new(Pipeline::bare(transport.clone()));
        let coordinator = Arc::new(RefreshCoordinator::new(
            store.clone(),
            Arc::new(RefreshEndpoint::new(public.clone())),
        ));

        let protected = Arc::new(
            Pipeline::builder(transport)
                .on_request(Arc::new(BearerAuth::new(store.clone(), coordinator)))
                .on_response(Arc::new(SessionGuard::new(store.clone(), projection.clone())))
                .build(),
        );
        debug!(base_url = %config.api_base_url, "Pipelines composed");

        let api = ApiClient::new(protected, public);
        let session = SessionManager::new(api.clone(), store.clone(), projection.clone());

        Self {
            config,
            api,
            session,
            store,
            projection,
        }
    }
}
