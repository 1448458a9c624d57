//! Transformation compiler.
//!
//! Compilation is pure and synchronous: the only shared state is the
//! read-only [`ParameterRegistry`](crate::registry::ParameterRegistry), so a
//! chain can be compiled from any number of threads at once.
//!
//! ```rust,ignore
//! use imagekit_transform::prelude::*;
//!
//! let chain = TransformationChain::new()
//!     .then(TransformationStep::new().with("w", 1000).with("h", 960).with("cm", "pad_resize"))
//!     .then(TransformationStep::new().with("remove_background", true));
//! assert_eq!(encode(&chain, CompileOptions::default())?, "w-1000,h-960,cm-pad_resize:e-bgremove");
//! ```

pub mod chain;
pub mod layer;
pub mod step;

pub use chain::{ChainCompiler, enforce_layer_policy, enforce_single_ai_operation};
pub use step::{CompiledStep, StepCompiler, StepContext};

use crate::error::TransformError;
use crate::params::TransformationChain;
use crate::registry::global_registry;

/// Separator between steps.
pub const CHAIN_SEP: char = ':';
/// Separator between parameters of one step.
pub const STEP_SEP: char = ',';

/// Pixel size of the source asset, when the caller knows it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceDimensions {
    pub width: u32,
    pub height: u32,
}

impl SourceDimensions {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn megapixels(&self) -> f64 {
        f64::from(self.width) * f64::from(self.height) / 1_000_000.0
    }
}

/// Options for [`encode`] and [`ChainCompiler::compile`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CompileOptions {
    /// The chain is an overlay sub-expression; only layer-allowed AI operations pass.
    pub for_layer_context: bool,
    /// Put a background removal in front of a drop shadow that lacks one.
    pub ensure_transparent_background: bool,
    /// Enables input-size checks for operations with a megapixel limit.
    pub source_dimensions: Option<SourceDimensions>,
}

impl CompileOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Options for an overlay sub-expression.
    pub fn for_layer() -> Self {
        Self {
            for_layer_context: true,
            ..Self::default()
        }
    }

    pub fn with_layer_context(mut self, for_layer_context: bool) -> Self {
        self.for_layer_context = for_layer_context;
        self
    }

    pub fn with_transparent_background(mut self, enabled: bool) -> Self {
        self.ensure_transparent_background = enabled;
        self
    }

    pub fn with_source_dimensions(mut self, width: u32, height: u32) -> Self {
        self.source_dimensions = Some(SourceDimensions::new(width, height));
        self
    }
}

/// Compile `chain` against the built-in registry.
pub fn encode(chain: &TransformationChain, options: CompileOptions) -> Result<String, TransformError> {
    ChainCompiler::new(global_registry()).compile(chain, &options)
}
