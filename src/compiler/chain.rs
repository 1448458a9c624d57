//! Chain compiler.
//!
//! The cross-step rules (one AI operation per step, layer policy, path-only
//! parameters) are separate pure checks so they can be exercised on their own.

use std::borrow::Cow;

use tracing::{debug, trace};

use super::step::{CompiledStep, StepCompiler, StepContext};
use super::{CHAIN_SEP, CompileOptions};
use crate::error::TransformError;
use crate::params::{TransformationChain, TransformationStep};
use crate::registry::ParameterRegistry;

const TARGET: &str = "imagekit_transform::compiler";

const BACKGROUND_REMOVAL: [&str; 2] = ["remove_background", "remove_background_external"];

pub struct ChainCompiler<'r> {
    registry: &'r ParameterRegistry,
}

impl<'r> ChainCompiler<'r> {
    pub fn new(registry: &'r ParameterRegistry) -> Self {
        Self { registry }
    }

    /// Compile `chain` into its wire string.
    pub fn compile(
        &self,
        chain: &TransformationChain,
        options: &CompileOptions,
    ) -> Result<String, TransformError> {
        let wire = self
            .compile_steps(chain, options)?
            .iter()
            .map(CompiledStep::wire)
            .collect::<Vec<_>>()
            .join(&CHAIN_SEP.to_string());
        debug!(target: TARGET, layer = options.for_layer_context, %wire, "compiled chain");
        Ok(wire)
    }

    /// Compile every step, keeping the per-step token lists.
    pub fn compile_steps(
        &self,
        chain: &TransformationChain,
        options: &CompileOptions,
    ) -> Result<Vec<CompiledStep>, TransformError> {
        let chain = if options.ensure_transparent_background {
            self.with_transparent_background(chain)
        } else {
            Cow::Borrowed(chain)
        };

        if chain.is_empty() {
            return Err(TransformError::EmptyChain);
        }
        if let Some(step) = chain.steps().iter().position(TransformationStep::is_empty) {
            return Err(TransformError::EmptyStep { step });
        }
        reject_path_only(self.registry, &chain)?;
        enforce_single_ai_operation(self.registry, &chain)?;
        if options.for_layer_context {
            enforce_layer_policy(self.registry, &chain)?;
        }

        let compiler = StepCompiler::new(self.registry);
        chain
            .steps()
            .iter()
            .enumerate()
            .map(|(index, step)| {
                let ctx = StepContext {
                    index,
                    for_layer: options.for_layer_context,
                    source: options.source_dimensions,
                };
                compiler.compile(step, &ctx)
            })
            .collect()
    }

    /// Insert a background-removal step ahead of any drop shadow that is not
    /// already preceded by one.
    fn with_transparent_background<'c>(
        &self,
        chain: &'c TransformationChain,
    ) -> Cow<'c, TransformationChain> {
        let mut prepared: Option<TransformationChain> = None;
        let mut transparent = false;
        let mut offset = 0;
        for (idx, step) in chain.steps().iter().enumerate() {
            let ops = step.ai_operations(self.registry);
            if ops.iter().any(|op| BACKGROUND_REMOVAL.contains(op)) {
                transparent = true;
            } else if ops.contains(&"drop_shadow") && !transparent {
                trace!(target: TARGET, step = idx, "inserting background removal before drop shadow");
                prepared
                    .get_or_insert_with(|| chain.clone())
                    .insert(idx + offset, TransformationStep::new().with("remove_background", true));
                offset += 1;
                transparent = true;
            }
        }
        match prepared {
            Some(chain) => Cow::Owned(chain),
            None => Cow::Borrowed(chain),
        }
    }
}

/// Every step may carry at most one AI operation.
pub fn enforce_single_ai_operation(
    registry: &ParameterRegistry,
    chain: &TransformationChain,
) -> Result<(), TransformError> {
    for (step, params) in chain.steps().iter().enumerate() {
        let ops = params.ai_operations(registry);
        if ops.len() > 1 {
            return Err(TransformError::MultipleAIOperationsInStep {
                step,
                operations: ops.iter().map(|s| s.to_string()).collect(),
            });
        }
    }
    Ok(())
}

/// Inside an overlay only layer-allowed AI operations may appear.
pub fn enforce_layer_policy(
    registry: &ParameterRegistry,
    chain: &TransformationChain,
) -> Result<(), TransformError> {
    for (step, params) in chain.steps().iter().enumerate() {
        for op in params.ai_operations(registry) {
            let allowed = registry.get(op).is_some_and(|spec| spec.layer_allowed);
            if !allowed {
                return Err(TransformError::DisallowedInLayer {
                    parameter: op.to_string(),
                    step,
                });
            }
        }
    }
    Ok(())
}

fn reject_path_only(
    registry: &ParameterRegistry,
    chain: &TransformationChain,
) -> Result<(), TransformError> {
    let path_only = chain
        .steps()
        .iter()
        .flat_map(|step| step.params())
        .filter_map(|(name, _)| registry.get(name))
        .find(|spec| spec.path_only);
    match path_only {
        Some(spec) => Err(TransformError::PathOnlyParameter {
            parameter: spec.name.to_string(),
        }),
        None => Ok(()),
    }
}
