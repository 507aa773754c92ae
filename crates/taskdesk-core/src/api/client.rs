//! Typed wrappers for the taskdesk REST API.
//!
//! Calls go through one of two pipelines: the protected one, which carries
//! the bearer and session interceptors, and a bare public one for sign-up
//! and token refresh.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::debug;

use super::pipeline::Pipeline;
use super::request::endpoints;
use super::{ApiError, ApiRequest};
use crate::auth::RefreshExchange;
use crate::models::{
    Profile, Registration, Role, SignInRequest, Todo, TodoFilter, TodoList, TodoRequest,
    TokenResponse, User, UserFilters, UserPage, UserRequest, UserRolesRequest,
};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshRequest<'a> {
    refresh_token: &'a str,
}

/// Token refresh over the public pipeline.
pub struct RefreshEndpoint {
    public: Arc<Pipeline>,
}

impl RefreshEndpoint {
    pub fn new(public: Arc<Pipeline>) -> Self {
        Self { public }
    }
}

#[async_trait]
impl RefreshExchange for RefreshEndpoint {
    async fn exchange(&self, refresh_token: &str) -> Result<TokenResponse, ApiError> {
        let request = ApiRequest::post(endpoints::REFRESH).json(&RefreshRequest { refresh_token })?;
        self.public.fetch(request).await
    }
}

/// Clone is cheap - both pipelines are shared.
#[derive(Clone)]
pub struct ApiClient {
    protected: Arc<Pipeline>,
    public: Arc<Pipeline>,
}

impl ApiClient {
    pub fn new(protected: Arc<Pipeline>, public: Arc<Pipeline>) -> Self {
        Self { protected, public }
    }

    // ===== Authentication =====

    /// Exchange login and password for a credential pair.
    pub async fn sign_in(&self, login: &str, password: &str) -> Result<TokenResponse, ApiError> {
        let request = ApiRequest::post(endpoints::SIGN_IN).json(&SignInRequest {
            login: login.to_string(),
            password: password.to_string(),
        })?;

        match self.protected.fetch(request).await {
            Ok(tokens) => Ok(tokens),
            Err(ApiError::Unauthorized | ApiError::BadRequest(_) | ApiError::NotFound(_)) => {
                Err(ApiError::InvalidCredentials)
            }
            Err(e) => Err(e),
        }
    }

    pub async fn sign_up(&self, registration: &Registration) -> Result<(), ApiError> {
        let request = ApiRequest::post(endpoints::SIGN_UP).json(registration)?;
        self.public.send(request).await
    }

    pub async fn logout(&self) -> Result<(), ApiError> {
        self.protected.send(ApiRequest::post(endpoints::LOGOUT)).await
    }

    pub async fn profile(&self) -> Result<Profile, ApiError> {
        self.protected.fetch(ApiRequest::get(endpoints::PROFILE)).await
    }

    // ===== Tasks =====

    pub async fn list_todos(&self, filter: TodoFilter) -> Result<TodoList, ApiError> {
        let request = ApiRequest::get(endpoints::TODOS)
            .query(vec![("filter".to_string(), filter.as_query().to_string())]);
        let list: TodoList = self.protected.fetch(request).await?;
        debug!(count = list.data.len(), filter = filter.as_query(), "Fetched todos");
        Ok(list)
    }

    pub async fn create_todo(&self, title: &str) -> Result<Todo, ApiError> {
        let body = TodoRequest {
            title: Some(title.to_string()),
            is_done: Some(false),
        };
        self.protected
            .fetch(ApiRequest::post(endpoints::TODOS).json(&body)?)
            .await
    }

    pub async fn update_todo(&self, id: i64, update: &TodoRequest) -> Result<Todo, ApiError> {
        let path = format!("{}/{}", endpoints::TODOS, id);
        self.protected.fetch(ApiRequest::put(path).json(update)?).await
    }

    pub async fn delete_todo(&self, id: i64) -> Result<(), ApiError> {
        let path = format!("{}/{}", endpoints::TODOS, id);
        self.protected.send(ApiRequest::delete(path)).await
    }

    // ===== Admin =====

    pub async fn list_users(&self, filters: &UserFilters) -> Result<UserPage, ApiError> {
        let request = ApiRequest::get(endpoints::ADMIN_USERS).query(filters.to_query());
        self.protected.fetch(request).await
    }

    pub async fn get_user(&self, id: i64) -> Result<User, ApiError> {
        self.protected.fetch(ApiRequest::get(Self::user_path(id))).await
    }

    pub async fn update_user(&self, id: i64, update: &UserRequest) -> Result<User, ApiError> {
        self.protected
            .fetch(ApiRequest::put(Self::user_path(id)).json(update)?)
            .await
    }

    pub async fn update_user_roles(&self, id: i64, roles: Vec<Role>) -> Result<User, ApiError> {
        let path = format!("{}/rights", Self::user_path(id));
        self.protected
            .fetch(ApiRequest::put(path).json(&UserRolesRequest { roles })?)
            .await
    }

    pub async fn block_user(&self, id: i64) -> Result<User, ApiError> {
        let path = format!("{}/block", Self::user_path(id));
        self.protected.fetch(ApiRequest::post(path)).await
    }

    pub async fn unblock_user(&self, id: i64) -> Result<User, ApiError> {
        let path = format!("{}/unblock", Self::user_path(id));
        self.protected.fetch(ApiRequest::post(path)).await
    }

    pub async fn delete_user(&self, id: i64) -> Result<(), ApiError> {
        self.protected.send(ApiRequest::delete(Self::user_path(id))).await
    }

    fn user_path(id: i64) -> String {
        format!("{}/{}", endpoints::ADMIN_USERS, id)
    }
}
