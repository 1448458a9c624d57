//! # imagekit-transform
//!
//! A typed compiler for ImageKit URL transformation chains, plus an async
//! delivery client that polls AI operations until their result is ready.
//!
//! ## Overview
//!
//! - **Registry**: a flat, read-only table describing every parameter (wire code,
//!   value type, companions, conflicts, AI flags).
//! - **Compiler**: turns a [`TransformationChain`] into a wire string such as
//!   `w-1000,h-960,cm-pad_resize:e-bgremove`, rejecting invalid input before any
//!   network call.
//! - **Delivery**: issues the compiled URL and re-issues the identical request
//!   while the CDN reports the result as still processing.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use imagekit_transform::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let chain = TransformationChain::new()
//!         .then(TransformationStep::new().with("remove_background", true))
//!         .then(TransformationStep::new().with("drop_shadow", true).with("azimuth", 45));
//!
//!     let client = DeliveryClient::new(DeliveryConfig::new("https://ik.imagekit.io/demo"))?;
//!     let request = DeliveryRequest::compile("products/shoe.jpg", &chain, CompileOptions::default())?;
//!
//!     match client.deliver(request).await {
//!         DeliveryOutcome::Succeeded(asset) => println!("{} bytes", asset.len()),
//!         DeliveryOutcome::Failed(err) => eprintln!("{err}"),
//!     }
//!     Ok(())
//! }
//! ```

#![deny(unsafe_code)]

pub mod compiler;
pub mod config;
pub mod delivery;
pub mod error;
pub mod params;
pub mod registry;
pub mod telemetry;
pub mod utils;

pub use compiler::{CompileOptions, SourceDimensions, encode};
pub use config::{DeliveryConfig, Placement};
pub use delivery::{DeliveredAsset, DeliveryClient, DeliveryOutcome, DeliveryRequest, PollPolicy};
pub use error::{DeliveryError, ErrorCategory, TransformError};
pub use params::{Layer, LayerSource, ParamValue, TransformationChain, TransformationStep};
pub use registry::{ParameterRegistry, ParameterSpec, global_registry};

pub mod prelude {
    pub use crate::compiler::{ChainCompiler, CompileOptions, SourceDimensions, encode};
    pub use crate::config::{DeliveryConfig, Placement};
    pub use crate::delivery::{
        Backoff, DeliveredAsset, DeliveryClient, DeliveryOutcome, DeliveryRequest, HttpTransport,
        PollPolicy,
    };
    pub use crate::error::{DeliveryError, ErrorCategory, TransformError};
    pub use crate::params::{
        Layer, LayerSource, ParamValue, PromptEncoder, TransformationChain, TransformationStep,
    };
    pub use crate::registry::{ParameterRegistry, global_registry};
    pub use crate::utils::cancel::{CancelHandle, new_cancel_handle};
}

static_assertions::assert_impl_all!(registry::ParameterRegistry: Send, Sync);
static_assertions::assert_impl_all!(delivery::DeliveryClient: Send, Sync, Clone);
static_assertions::assert_impl_all!(params::TransformationChain: Send, Sync);
static_assertions::assert_impl_all!(error::TransformError: std::error::Error, Send, Sync);
static_assertions::assert_impl_all!(error::DeliveryError: std::error::Error, Send, Sync);
