//! REST API client module for the taskdesk service.
//!
//! Requests flow through an explicit [`Pipeline`]: request interceptors in
//! order, the [`Transport`], then response interceptors in order. The
//! protected pipeline carries [`BearerAuth`] and [`SessionGuard`]; the public
//! one is bare.

pub mod client;
pub mod error;
pub mod interceptors;
pub mod pipeline;
pub mod request;
pub mod transport;

pub use client::{ApiClient, RefreshEndpoint};
pub use error::{ApiError, RefreshError};
pub use interceptors::{BearerAuth, RequestInterceptor, ResponseInterceptor, SessionGuard};
pub use pipeline::{Pipeline, PipelineBuilder};
pub use request::{endpoints, ApiRequest, ApiResponse};
pub use transport::{HttpTransport, Transport};
