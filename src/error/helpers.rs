//! Coarse error classification for callers that only need to branch on
//! "fix the request", "wait and try again" or "give up".

use super::types::{DeliveryError, TransformError};

/// Error category for presentation and retry decisions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// The request itself is malformed; resending it cannot help.
    Validation,
    /// The remote side is busy or negatively caching; retry later.
    Retryable,
    /// Network-level failure from the transport.
    Network,
    /// The caller aborted the operation.
    Cancelled,
    /// Local misconfiguration.
    Configuration,
}

impl TransformError {
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::Validation
    }
}

impl DeliveryError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::StillProcessingTimeout { .. } | Self::UpstreamFailure { .. } => {
                ErrorCategory::Retryable
            }
            Self::Transport(_) => ErrorCategory::Network,
            Self::Cancelled => ErrorCategory::Cancelled,
            Self::InvalidRequest(_) => ErrorCategory::Validation,
            Self::Configuration(_) => ErrorCategory::Configuration,
        }
    }
}

/// One-line, user-facing hint for an error.
pub fn suggest_fix(err: &DeliveryError) -> Option<&'static str> {
    match err {
        DeliveryError::StillProcessingTimeout { .. } => {
            Some("The AI operation is still running; poll again later with the same URL")
        }
        DeliveryError::UpstreamFailure { .. } => Some(
            "The CDN negatively caches this URL; wait for the cooldown or change the transformation",
        ),
        DeliveryError::Configuration(_) => Some("Check IMAGEKIT_URL_ENDPOINT"),
        _ => None,
    }
}
