//! Terminal results of one logical fetch.

use bytes::Bytes;

use crate::error::DeliveryError;

/// A final (non-intermediate) asset.
#[derive(Debug, Clone, PartialEq)]
pub struct DeliveredAsset {
    /// URL that produced the asset. Identical for every attempt of the fetch.
    pub url: String,
    pub status: u16,
    /// From the response, or sniffed from the body when missing.
    pub content_type: Option<String>,
    pub body: Bytes,
    /// Requests issued, the successful one included.
    pub attempts: u32,
}

impl DeliveredAsset {
    pub fn len(&self) -> usize {
        self.body.len()
    }

    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }
}

/// Typed outcome of [`DeliveryClient::deliver`](super::DeliveryClient::deliver).
///
/// Failures are values, not panics, so callers can tell "try again later"
/// ([`DeliveryError::is_retryable`]) from "the request is wrong".
#[derive(Debug, Clone, PartialEq)]
pub enum DeliveryOutcome {
    Succeeded(DeliveredAsset),
    Failed(DeliveryError),
}

impl DeliveryOutcome {
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Succeeded(_))
    }

    pub fn asset(&self) -> Option<&DeliveredAsset> {
        match self {
            Self::Succeeded(asset) => Some(asset),
            Self::Failed(_) => None,
        }
    }

    pub fn error(&self) -> Option<&DeliveryError> {
        match self {
            Self::Succeeded(_) => None,
            Self::Failed(err) => Some(err),
        }
    }

    pub fn into_result(self) -> Result<DeliveredAsset, DeliveryError> {
        self.into()
    }
}

impl From<Result<DeliveredAsset, DeliveryError>> for DeliveryOutcome {
    fn from(result: Result<DeliveredAsset, DeliveryError>) -> Self {
        match result {
            Ok(asset) => Self::Succeeded(asset),
            Err(err) => Self::Failed(err),
        }
    }
}

impl From<DeliveryOutcome> for Result<DeliveredAsset, DeliveryError> {
    fn from(outcome: DeliveryOutcome) -> Self {
        match outcome {
            DeliveryOutcome::Succeeded(asset) => Ok(asset),
            DeliveryOutcome::Failed(err) => Err(err),
        }
    }
}
