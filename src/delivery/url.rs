//! Delivery URL construction.

use crate::config::{DeliveryConfig, Placement};
use crate::error::{DeliveryError, TransformError};
use crate::params::PromptEncoder;

/// Code of the path-only image generation operation.
pub const GENERATE_IMAGE_CODE: &str = "ik-genimg";

/// Places compiled wire strings into delivery URLs.
#[derive(Debug, Clone, PartialEq)]
pub struct UrlBuilder {
    endpoint: String,
    placement: Placement,
}

impl UrlBuilder {
    pub fn new(endpoint: impl Into<String>, placement: Placement) -> Self {
        Self {
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
            placement,
        }
    }

    pub fn from_config(config: &DeliveryConfig) -> Self {
        Self::new(config.url_endpoint.as_str(), config.placement)
    }

    /// URL of `asset_path` with `wire` applied. An empty wire string yields
    /// the untransformed asset URL.
    pub fn build(&self, asset_path: &str, wire: &str) -> Result<String, DeliveryError> {
        let path = clean_path(asset_path)?;
        if wire.is_empty() {
            return Ok(format!("{}/{}", self.endpoint, path));
        }
        check_wire(wire)?;
        Ok(match self.placement {
            Placement::Query => {
                let sep = if path.contains('?') { '&' } else { '?' };
                format!("{}/{}{}tr={}", self.endpoint, path, sep, wire)
            }
            Placement::Path => format!("{}/tr:{}/{}", self.endpoint, wire, path),
        })
    }

    /// URL that generates an image from `prompt` and serves it as `file_name`,
    /// optionally transformed by `wire`.
    pub fn generation_url(
        &self,
        prompt: &str,
        file_name: &str,
        wire: Option<&str>,
    ) -> Result<String, DeliveryError> {
        let prompt = PromptEncoder::new()
            .encode(prompt)
            .map_err(|e: TransformError| DeliveryError::InvalidRequest(e.to_string()))?;
        let file_name = clean_path(file_name)?;
        let path = format!("{GENERATE_IMAGE_CODE}-{}/{file_name}", prompt.fragment());
        self.build(&path, wire.unwrap_or_default())
    }
}

/// Append `key=value` to `url`'s query string.
pub fn append_query_param(url: &str, key: &str, value: &str) -> String {
    let sep = if url.contains('?') { '&' } else { '?' };
    format!(
        "{url}{sep}{}={}",
        urlencoding::encode(key),
        urlencoding::encode(value)
    )
}

fn clean_path(path: &str) -> Result<&str, DeliveryError> {
    let path = path.trim().trim_start_matches('/');
    if path.is_empty() {
        return Err(DeliveryError::InvalidRequest("asset path must not be empty".into()));
    }
    Ok(path)
}

fn check_wire(wire: &str) -> Result<(), DeliveryError> {
    if wire.contains(['/', '?', '&', '#', ' ']) {
        return Err(DeliveryError::InvalidRequest(format!(
            "`{wire}` is not a compiled transformation string"
        )));
    }
    Ok(())
}
