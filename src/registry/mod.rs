//! Parameter registry.
//!
//! A flat mapping from parameter name (or alias) to an immutable
//! [`ParameterSpec`]. The process-wide instance is built once from the
//! built-in catalog and is only ever read afterwards, so it can be shared
//! across threads without synchronisation.

use std::collections::HashMap;
use std::sync::OnceLock;

use crate::error::TransformError;

pub mod catalog;
pub mod entry;

pub use entry::{
    Companion, Conflict, Element, NumberRange, ParameterSpec, PromptRequirement, Requirement,
    Resolution, Tuple, ValueType,
};

/// Name/alias index over a set of parameter specs.
#[derive(Debug, Clone, Default)]
pub struct ParameterRegistry {
    specs: Vec<ParameterSpec>,
    by_name: HashMap<&'static str, usize>,
    layer_specs: Vec<ParameterSpec>,
    layer_by_name: HashMap<&'static str, usize>,
    text_specs: Vec<ParameterSpec>,
    text_by_name: HashMap<&'static str, usize>,
}

impl ParameterRegistry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the built-in catalog.
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        for spec in catalog::CATALOG {
            registry.register(*spec);
        }
        for spec in catalog::LAYER_CATALOG {
            registry.register_layer_param(*spec);
        }
        for spec in catalog::TEXT_LAYER_CATALOG {
            registry.register_text_param(*spec);
        }
        registry
    }

    /// Register a spec under its name and aliases. A later registration
    /// replaces an earlier one for any name it shares.
    pub fn register(&mut self, spec: ParameterSpec) {
        let idx = self.specs.len();
        self.by_name.insert(spec.name, idx);
        for &alias in spec.aliases {
            self.by_name.insert(alias, idx);
        }
        self.specs.push(spec);
    }

    /// Register an overlay positioning parameter (`lx`, `ly`, `lfo`).
    pub fn register_layer_param(&mut self, spec: ParameterSpec) {
        let idx = self.layer_specs.len();
        self.layer_by_name.insert(spec.code, idx);
        self.layer_by_name.insert(spec.name, idx);
        self.layer_specs.push(spec);
    }

    /// Register a text-layer styling parameter (`fs`, `co`, `tg`, ...).
    pub fn register_text_param(&mut self, spec: ParameterSpec) {
        let idx = self.text_specs.len();
        self.text_by_name.insert(spec.code, idx);
        self.text_by_name.insert(spec.name, idx);
        self.text_specs.push(spec);
    }

    /// Resolve a name or alias.
    pub fn lookup(&self, name: &str) -> Result<&ParameterSpec, TransformError> {
        self.get(name)
            .ok_or_else(|| TransformError::UnknownParameter(name.to_string()))
    }

    pub fn get(&self, name: &str) -> Option<&ParameterSpec> {
        self.by_name.get(name).map(|&idx| &self.specs[idx])
    }

    /// Resolve an overlay positioning parameter by name or code.
    pub fn layer_param(&self, name: &str) -> Result<&ParameterSpec, TransformError> {
        self.layer_by_name
            .get(name)
            .map(|&idx| &self.layer_specs[idx])
            .ok_or_else(|| TransformError::UnknownParameter(name.to_string()))
    }

    /// Resolve a text-layer styling parameter by name or code.
    pub fn text_param(&self, name: &str) -> Result<&ParameterSpec, TransformError> {
        self.text_by_name
            .get(name)
            .map(|&idx| &self.text_specs[idx])
            .ok_or_else(|| TransformError::UnknownParameter(name.to_string()))
    }

    /// Registered entries in registration order, skipping shadowed ones.
    pub fn iter(&self) -> impl Iterator<Item = &ParameterSpec> {
        self.specs
            .iter()
            .enumerate()
            .filter(|(idx, spec)| self.by_name.get(spec.name) == Some(idx))
            .map(|(_, spec)| spec)
    }

    pub fn ai_operations(&self) -> impl Iterator<Item = &ParameterSpec> {
        self.iter().filter(|spec| spec.is_ai_operation)
    }

    /// Every spec that folds into `parent`.
    pub fn modifiers_of<'a>(&'a self, parent: &'a str) -> impl Iterator<Item = &'a ParameterSpec> {
        self.iter().filter(move |spec| spec.modifier_of == Some(parent))
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

static GLOBAL: OnceLock<ParameterRegistry> = OnceLock::new();

/// The process-wide built-in registry.
pub fn global_registry() -> &'static ParameterRegistry {
    GLOBAL.get_or_init(ParameterRegistry::with_builtins)
}
