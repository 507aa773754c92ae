//! Core library for taskdesk.
//!
//! Provides the API client for the task list and account administration
//! service, together with the session lifecycle it depends on: persisted
//! credentials, single-flight token refresh, and forced sign-out when the
//! server stops accepting the session.

pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod models;

pub use api::{ApiClient, ApiError, RefreshError};
pub use auth::{CredentialPair, CredentialStore, SessionManager, SessionProjection, SessionState};
pub use config::Config;
pub use context::{AppContext, ContextError};
