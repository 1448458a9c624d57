//! Error Handling Module
//!
//! Two error families live here:
//! - `TransformError`: compilation failures, detected before any network call
//! - `DeliveryError`: failures of a logical fetch, returned inside `DeliveryOutcome`
//!
//! # Example
//!
//! ```rust,ignore
//! use imagekit_transform::error::{ErrorCategory, TransformError};
//!
//! let error = TransformError::UnknownParameter("wdith".into());
//! assert_eq!(error.category(), ErrorCategory::Validation);
//! ```

pub mod helpers;
pub mod types;

pub use helpers::*;
pub use types::*;
