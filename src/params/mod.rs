//! Parameter values, steps, chains and the value-level encoders
//! (arithmetic expressions and prompts).

pub mod expression;
pub mod prompt;
pub mod step;
pub mod value;

pub use expression::{DimensionVar, Expression, Operand, Operator};
pub use prompt::{EncodedPrompt, PromptEncoder, PromptEncoding, PromptVariant};
pub use step::{Layer, LayerSource, TransformationChain, TransformationStep};
pub use value::ParamValue;
