//! Ordered interceptor chains composed around a transport.

use std::sync::Arc;

use serde::de::DeserializeOwned;

use super::interceptors::{RequestInterceptor, ResponseInterceptor};
use super::transport::Transport;
use super::{ApiError, ApiRequest, ApiResponse};

pub struct Pipeline {
    transport: Arc<dyn Transport>,
    request_chain: Vec<Arc<dyn RequestInterceptor>>,
    response_chain: Vec<Arc<dyn ResponseInterceptor>>,
}

pub struct PipelineBuilder {
    transport: Arc<dyn Transport>,
    request_chain: Vec<Arc<dyn RequestInterceptor>>,
    response_chain: Vec<Arc<dyn ResponseInterceptor>>,
}

impl PipelineBuilder {
    pub fn on_request(mut self, interceptor: Arc<dyn RequestInterceptor>) -> Self {
        self.request_chain.push(interceptor);
        self
    }

    pub fn on_response(mut self, interceptor: Arc<dyn ResponseInterceptor>) -> Self {
        self.response_chain.push(interceptor);
        self
    }

    pub fn build(self) -> Pipeline {
        Pipeline {
            transport: self.transport,
            request_chain: self.request_chain,
            response_chain: self.response_chain,
        }
    }
}

impl Pipeline {
    pub fn builder(transport: Arc<dyn Transport>) -> PipelineBuilder {
        PipelineBuilder {
            transport,
            request_chain: Vec::new(),
            response_chain: Vec::new(),
        }
    }

    /// A pipeline with no interceptors.
    pub fn bare(transport: Arc<dyn Transport>) -> Self {
        Self::builder(transport).build()
    }

    /// Run the request chain, send, then run the response chain in order.
    pub async fn execute(&self, mut request: ApiRequest) -> Result<ApiResponse, ApiError> {
        for interceptor in &self.request_chain {
            request = interceptor.on_request(request).await?;
        }

        let mut response = self.transport.send(&request).await?;

        for interceptor in &self.response_chain {
            response = interceptor.on_response(&request, response)?;
        }
        Ok(response)
    }

    pub async fn fetch<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ApiError> {
        self.execute(request).await?.error_for_status()?.json()
    }

    /// Send a request whose response body is ignored.
    pub async fn send(&self, request: ApiRequest) -> Result<(), ApiError> {
        self.execute(request).await?.error_for_status()?;
        Ok(())
    }
}
