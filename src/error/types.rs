use std::time::Duration;

use thiserror::Error;

/// Errors raised while compiling a transformation chain.
///
/// All of them are deterministic: compiling the same input again yields the
/// same error, so none of them is ever worth retrying.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformError {
    #[error("unknown transformation parameter `{0}`")]
    UnknownParameter(String),

    #[error("value `{value}` for `{parameter}` is out of range (expected {expected})")]
    OutOfRange {
        parameter: String,
        value: String,
        expected: String,
    },

    #[error("`{parameter}` requires `{companion}` in the same step")]
    MissingRequiredCompanion {
        parameter: String,
        companion: String,
    },

    #[error("`{parameter}` cannot be combined with `{other}`")]
    ConflictingParameters { parameter: String, other: String },

    #[error("invalid value for `{parameter}`: {reason}")]
    InvalidValueSyntax { parameter: String, reason: String },

    #[error("transformation chain is empty")]
    EmptyChain,

    #[error("step {step} has no parameters")]
    EmptyStep { step: usize },

    #[error(
        "step {step} combines AI operations {}; chain them as separate steps",
        operations.join(", ")
    )]
    MultipleAIOperationsInStep {
        step: usize,
        operations: Vec<String>,
    },

    #[error("`{parameter}` (step {step}) is not allowed inside an overlay layer")]
    DisallowedInLayer { parameter: String, step: usize },

    #[error("`{parameter}` is a path parameter and cannot appear in a transformation chain")]
    PathOnlyParameter { parameter: String },
}

impl TransformError {
    pub(crate) fn invalid(parameter: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValueSyntax {
            parameter: parameter.into(),
            reason: reason.into(),
        }
    }

    pub(crate) fn out_of_range(
        parameter: impl Into<String>,
        value: impl Into<String>,
        expected: impl Into<String>,
    ) -> Self {
        Self::OutOfRange {
            parameter: parameter.into(),
            value: value.into(),
            expected: expected.into(),
        }
    }

    /// Name of the parameter the error is about, when there is one.
    pub fn parameter(&self) -> Option<&str> {
        match self {
            Self::UnknownParameter(name) => Some(name),
            Self::OutOfRange { parameter, .. }
            | Self::MissingRequiredCompanion { parameter, .. }
            | Self::ConflictingParameters { parameter, .. }
            | Self::InvalidValueSyntax { parameter, .. }
            | Self::DisallowedInLayer { parameter, .. }
            | Self::PathOnlyParameter { parameter } => Some(parameter),
            Self::EmptyChain | Self::EmptyStep { .. } | Self::MultipleAIOperationsInStep { .. } => {
                None
            }
        }
    }
}

/// Failures of one logical fetch.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DeliveryError {
    /// The asset was still being computed when the attempt or time budget ran out.
    #[error("asset still processing after {attempts} attempt(s) in {elapsed:?}")]
    StillProcessingTimeout { attempts: u32, elapsed: Duration },

    /// The CDN answered with a failure and negatively caches this exact URL.
    /// The identical request must not be reissued before `retry_after` elapses.
    #[error("upstream failure (status {status}), retry after {retry_after:?}: {message}")]
    UpstreamFailure {
        status: u16,
        retry_after: Duration,
        message: String,
    },

    /// Opaque failure reported by the fetch collaborator.
    #[error("transport error: {0}")]
    Transport(String),

    #[error("fetch cancelled")]
    Cancelled,

    #[error("invalid delivery request: {0}")]
    InvalidRequest(String),

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl DeliveryError {
    /// Minimum wait before the identical request may be reissued.
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::UpstreamFailure { retry_after, .. } => Some(*retry_after),
            _ => None,
        }
    }

    /// Whether issuing the same request later can reasonably succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::StillProcessingTimeout { .. } | Self::UpstreamFailure { .. } | Self::Transport(_)
        )
    }

    pub fn status_code(&self) -> Option<u16> {
        match self {
            Self::UpstreamFailure { status, .. } => Some(*status),
            _ => None,
        }
    }
}

/// Errors raised while installing the tracing subscriber.
#[derive(Debug, Error)]
pub enum TelemetryError {
    #[error("telemetry initialization error: {0}")]
    Init(String),
}
