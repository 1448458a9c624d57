//! The fetch collaborator.
//!
//! The poll loop only needs a status, headers and a body back for a URL, so
//! the transport is an injectable trait. [`ReqwestTransport`] is the default;
//! tests plug in scripted transports.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use super::interceptor::{HttpInterceptor, RequestContext};
use crate::config::DeliveryConfig;
use crate::error::DeliveryError;

/// One GET of a delivery URL.
#[derive(Debug, Clone)]
pub struct FetchRequest {
    pub url: String,
    /// 1-based poll attempt.
    pub attempt: u32,
}

#[derive(Debug, Clone)]
pub struct FetchResponse {
    pub status: u16,
    pub headers: HeaderMap,
    pub body: Bytes,
}

impl FetchResponse {
    pub fn new(status: u16) -> Self {
        Self {
            status,
            headers: HeaderMap::new(),
            body: Bytes::new(),
        }
    }

    /// Builder helper; invalid names or values are ignored.
    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        if let (Ok(name), Ok(value)) = (
            HeaderName::from_bytes(name.as_bytes()),
            HeaderValue::from_str(value),
        ) {
            self.headers.insert(name, value);
        }
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name).and_then(|v| v.to_str().ok())
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, DeliveryError>;
}

/// `reqwest`-backed transport with interceptor hooks.
#[derive(Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
    interceptors: Vec<Arc<dyn HttpInterceptor>>,
}

impl ReqwestTransport {
    pub fn new(client: reqwest::Client) -> Self {
        Self {
            client,
            interceptors: Vec::new(),
        }
    }

    /// Build a client with the configured per-request timeout.
    pub fn from_config(config: &DeliveryConfig) -> Result<Self, DeliveryError> {
        Self::with_timeout(config.request_timeout)
    }

    pub fn with_timeout(timeout: Duration) -> Result<Self, DeliveryError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DeliveryError::Configuration(format!("failed to build HTTP client: {e}")))?;
        Ok(Self::new(client))
    }

    pub fn with_interceptor(mut self, interceptor: Arc<dyn HttpInterceptor>) -> Self {
        self.interceptors.push(interceptor);
        self
    }

    pub fn with_interceptors(mut self, interceptors: Vec<Arc<dyn HttpInterceptor>>) -> Self {
        self.interceptors.extend(interceptors);
        self
    }

    fn fail(&self, ctx: &RequestContext, error: DeliveryError) -> DeliveryError {
        for interceptor in &self.interceptors {
            interceptor.on_error(ctx, &error);
        }
        error
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn fetch(&self, request: FetchRequest) -> Result<FetchResponse, DeliveryError> {
        let ctx = RequestContext {
            url: request.url,
            attempt: request.attempt,
        };

        let mut builder = self.client.get(&ctx.url);
        for interceptor in &self.interceptors {
            builder = interceptor
                .on_before_send(&ctx, builder)
                .map_err(|e| self.fail(&ctx, e))?;
        }

        let response = builder
            .send()
            .await
            .map_err(|e| self.fail(&ctx, DeliveryError::Transport(e.to_string())))?;
        for interceptor in &self.interceptors {
            interceptor
                .on_response(&ctx, &response)
                .map_err(|e| self.fail(&ctx, e))?;
        }

        let status = response.status().as_u16();
        let headers = response.headers().clone();
        let body = response
            .bytes()
            .await
            .map_err(|e| self.fail(&ctx, DeliveryError::Transport(e.to_string())))?;

        Ok(FetchResponse {
            status,
            headers,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn response_helpers() {
        let response = FetchResponse::new(200)
            .with_header("Is-Intermediate-Response", "true")
            .with_body(&b"png"[..]);
        assert!(response.is_success());
        assert_eq!(response.header("is-intermediate-response"), Some("true"));
        assert_eq!(response.body.as_ref(), b"png");
        assert!(!FetchResponse::new(404).is_success());
    }
}
