//! Request and response values that flow through the interceptor pipeline.

use reqwest::{header, Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};

use super::ApiError;

/// Endpoint paths the session core needs to recognise.
pub mod endpoints {
    pub const SIGN_IN: &str = "/auth/signin";
    pub const SIGN_UP: &str = "/auth/signup";
    pub const REFRESH: &str = "/auth/refresh";
    pub const LOGOUT: &str = "/user/logout";
    pub const PROFILE: &str = "/user/profile";
    pub const TODOS: &str = "/todos";
    pub const ADMIN_USERS: &str = "/admin/users";

    /// Endpoints that are called without a bearer credential.
    pub fn is_public(path: &str) -> bool {
        matches!(path, SIGN_IN | SIGN_UP | REFRESH)
    }
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: Method,
    /// Path relative to the API base URL, always starting with `/`.
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: header::HeaderMap,
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: header::HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn json<B: Serialize>(mut self, body: &B) -> Result<Self, ApiError> {
        let value = serde_json::to_value(body)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to encode request body: {}", e)))?;
        self.body = Some(value);
        Ok(self)
    }

    pub fn query(mut self, query: Vec<(String, String)>) -> Self {
        self.query.extend(query);
        self
    }

    pub fn set_bearer(&mut self, token: &str) -> Result<(), ApiError> {
        let value = header::HeaderValue::from_str(&format!("Bearer {}", token))
            .map_err(|_| ApiError::InvalidResponse("Access token is not a valid header value".into()))?;
        self.headers.insert(header::AUTHORIZATION, value);
        Ok(())
    }

    /// The bearer credential attached to this request, if any.
    pub fn bearer(&self) -> Option<&str> {
        self.headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
    }

    pub fn is_public(&self) -> bool {
        endpoints::is_public(&self.path)
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: String,
}

impl ApiResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    /// Check if response is successful, returning an error with body if not.
    pub fn error_for_status(self) -> Result<Self, ApiError> {
        if self.status.is_success() {
            Ok(self)
        } else {
            Err(ApiError::from_status(self.status, &self.body))
        }
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body)
            .map_err(|e| ApiError::InvalidResponse(format!("Failed to parse JSON response: {}", e)))
    }
}
