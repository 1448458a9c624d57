//! HTTP interceptor hooks for [`ReqwestTransport`](super::ReqwestTransport).
//!
//! Interceptors can add headers before a request goes out, observe responses
//! and be told about errors. Hooks run on every poll attempt and should stay
//! cheap. They must not touch the URL: every attempt of one fetch has to hit
//! the same cache key.

use reqwest::header::{HeaderMap, HeaderName, HeaderValue};

use crate::error::DeliveryError;

/// What interceptors get to see about the request.
#[derive(Clone, Debug)]
pub struct RequestContext {
    pub url: String,
    /// 1-based poll attempt.
    pub attempt: u32,
}

pub trait HttpInterceptor: Send + Sync {
    /// Called before sending. Return the (possibly modified) builder or an
    /// error to short-circuit the request.
    fn on_before_send(
        &self,
        _ctx: &RequestContext,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, DeliveryError> {
        Ok(builder)
    }

    /// Called once response headers have arrived, whatever the status.
    fn on_response(
        &self,
        _ctx: &RequestContext,
        _response: &reqwest::Response,
    ) -> Result<(), DeliveryError> {
        Ok(())
    }

    fn on_error(&self, _ctx: &RequestContext, _error: &DeliveryError) {}
}

/// Logs requests and responses through `tracing`. Bodies are never logged.
#[derive(Clone, Default)]
pub struct LoggingInterceptor;

impl HttpInterceptor for LoggingInterceptor {
    fn on_before_send(
        &self,
        ctx: &RequestContext,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, DeliveryError> {
        tracing::debug!(target: "imagekit_transform::http", url=%ctx.url, attempt=ctx.attempt, "sending request");
        Ok(builder)
    }

    fn on_response(
        &self,
        ctx: &RequestContext,
        response: &reqwest::Response,
    ) -> Result<(), DeliveryError> {
        tracing::debug!(target: "imagekit_transform::http", url=%ctx.url, attempt=ctx.attempt, status=%response.status().as_u16(), "response received");
        Ok(())
    }

    fn on_error(&self, ctx: &RequestContext, error: &DeliveryError) {
        tracing::debug!(target: "imagekit_transform::http", url=%ctx.url, attempt=ctx.attempt, err=%error, "request error");
    }
}

/// Adds a fixed set of headers to every request.
#[derive(Clone, Debug, Default)]
pub struct HeaderInterceptor {
    headers: HeaderMap,
}

impl HeaderInterceptor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Result<Self, DeliveryError> {
        let name = HeaderName::from_bytes(name.as_bytes())
            .map_err(|e| DeliveryError::Configuration(format!("invalid header name `{name}`: {e}")))?;
        let value = HeaderValue::from_str(value)
            .map_err(|e| DeliveryError::Configuration(format!("invalid value for `{name}`: {e}")))?;
        self.headers.insert(name, value);
        Ok(self)
    }
}

impl HttpInterceptor for HeaderInterceptor {
    fn on_before_send(
        &self,
        _ctx: &RequestContext,
        builder: reqwest::RequestBuilder,
    ) -> Result<reqwest::RequestBuilder, DeliveryError> {
        Ok(builder.headers(self.headers.clone()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_interceptor_rejects_bad_names() {
        assert!(HeaderInterceptor::new().with_header("x-trace", "abc").is_ok());
        assert!(matches!(
            HeaderInterceptor::new().with_header("bad header", "abc"),
            Err(DeliveryError::Configuration(_))
        ));
    }
}
