//! Data models for taskdesk entities.
//!
//! This module contains the wire types exchanged with the remote API:
//!
//! - `SignInRequest`, `Registration`, `TokenResponse`: authentication payloads
//! - `Profile`, `Role`: the signed-in user's identity
//! - `Todo`, `TodoInfo`, `TodoFilter`: the personal task list
//! - `User`, `UserFilters`: admin account management

pub mod auth;
pub mod todo;
pub mod user;

pub use auth::{Profile, Registration, Role, SignInRequest, TokenResponse};
pub use todo::{Todo, TodoFilter, TodoInfo, TodoList, TodoRequest};
pub use user::{SortOrder, User, UserFilters, UserPage, UserRequest, UserRolesRequest};
