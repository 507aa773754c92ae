//! Authentication module for managing sessions and credentials.
//!
//! This module provides:
//! - `CredentialStore`: the current credential pair, mirrored to durable storage
//! - `RefreshCoordinator`: single-flight access token refresh
//! - `SessionProjection`: observable Anonymous / Loading / Authenticated state
//! - `SessionManager`: sign-in, sign-out and startup restoration
//!
//! Storage backends live in [`storage`]; nothing outside the credential
//! store touches them.

pub mod credentials;
pub mod manager;
pub mod refresh;
pub mod session;
pub mod storage;

pub use credentials::{CredentialPair, CredentialStore, TOKEN_KEY};
pub use manager::SessionManager;
pub use refresh::{RefreshCoordinator, RefreshExchange};
pub use session::{SessionProjection, SessionState};
pub use storage::{FileStorage, KeyringStorage, MemoryStorage, StorageError, TokenStorage};
