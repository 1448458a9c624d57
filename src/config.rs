//! Delivery configuration.

use std::time::Duration;

use crate::error::DeliveryError;

pub const URL_ENDPOINT_ENV: &str = "IMAGEKIT_URL_ENDPOINT";
pub const INTERMEDIATE_HEADER_ENV: &str = "IMAGEKIT_INTERMEDIATE_HEADER";

pub const DEFAULT_INTERMEDIATE_HEADER: &str = "is-intermediate-response";
pub const DEFAULT_INTERMEDIATE_VALUE: &str = "true";
pub const DEFAULT_CACHE_BUST_PARAM: &str = "ik-fresh";
pub const DEFAULT_NEGATIVE_CACHE_TTL: Duration = Duration::from_secs(60);
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Where the wire string goes in the delivery URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Placement {
    /// `<endpoint>/<path>?tr=<wire>`
    #[default]
    Query,
    /// `<endpoint>/tr:<wire>/<path>`
    Path,
}

impl std::str::FromStr for Placement {
    type Err = DeliveryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "query" => Ok(Self::Query),
            "path" => Ok(Self::Path),
            _ => Err(DeliveryError::Configuration(format!(
                "invalid placement `{s}` (expected query or path)"
            ))),
        }
    }
}

/// Settings shared by every fetch a [`DeliveryClient`](crate::delivery::DeliveryClient) makes.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveryConfig {
    /// Base URL assets are served from, e.g. `https://ik.imagekit.io/demo`.
    pub url_endpoint: String,
    pub placement: Placement,
    /// Response header marking a still-processing placeholder.
    pub intermediate_header: String,
    pub intermediate_value: String,
    /// Cooldown reported for failures without `Retry-After`.
    pub negative_cache_ttl: Duration,
    /// Query key carrying force-refresh tokens.
    pub cache_bust_param: String,
    /// Per round trip, applied by the reqwest transport.
    pub request_timeout: Duration,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            url_endpoint: String::new(),
            placement: Placement::Query,
            intermediate_header: DEFAULT_INTERMEDIATE_HEADER.to_string(),
            intermediate_value: DEFAULT_INTERMEDIATE_VALUE.to_string(),
            negative_cache_ttl: DEFAULT_NEGATIVE_CACHE_TTL,
            cache_bust_param: DEFAULT_CACHE_BUST_PARAM.to_string(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

impl DeliveryConfig {
    pub fn new(url_endpoint: impl Into<String>) -> Self {
        Self {
            url_endpoint: url_endpoint.into(),
            ..Self::default()
        }
    }

    /// Read `IMAGEKIT_URL_ENDPOINT` and `IMAGEKIT_INTERMEDIATE_HEADER`.
    pub fn from_env() -> Result<Self, DeliveryError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, DeliveryError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url_endpoint = lookup(URL_ENDPOINT_ENV).ok_or_else(|| {
            DeliveryError::Configuration(format!("{URL_ENDPOINT_ENV} is not set"))
        })?;
        let mut config = Self::new(url_endpoint);
        if let Some(header) = lookup(INTERMEDIATE_HEADER_ENV) {
            config.intermediate_header = header;
        }
        config.validate()?;
        Ok(config)
    }

    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = placement;
        self
    }

    pub fn with_intermediate_marker(
        mut self,
        header: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        self.intermediate_header = header.into();
        self.intermediate_value = value.into();
        self
    }

    pub fn with_negative_cache_ttl(mut self, ttl: Duration) -> Self {
        self.negative_cache_ttl = ttl;
        self
    }

    pub fn with_cache_bust_param(mut self, param: impl Into<String>) -> Self {
        self.cache_bust_param = param.into();
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn validate(&self) -> Result<(), DeliveryError> {
        let endpoint = reqwest::Url::parse(&self.url_endpoint).map_err(|e| {
            DeliveryError::Configuration(format!("invalid url_endpoint `{}`: {e}", self.url_endpoint))
        })?;
        if !matches!(endpoint.scheme(), "http" | "https") {
            return Err(DeliveryError::Configuration(format!(
                "url_endpoint must be http(s), got `{}`",
                endpoint.scheme()
            )));
        }
        if endpoint.query().is_some() {
            return Err(DeliveryError::Configuration(
                "url_endpoint must not carry a query string".into(),
            ));
        }
        if self.intermediate_header.trim().is_empty() {
            return Err(DeliveryError::Configuration(
                "intermediate_header must not be empty".into(),
            ));
        }
        if self.cache_bust_param.trim().is_empty() || self.cache_bust_param == "tr" {
            return Err(DeliveryError::Configuration(format!(
                "cache_bust_param `{}` is not usable",
                self.cache_bust_param
            )));
        }
        if self.request_timeout.is_zero() {
            return Err(DeliveryError::Configuration(
                "request_timeout must be positive".into(),
            ));
        }
        Ok(())
    }
}
