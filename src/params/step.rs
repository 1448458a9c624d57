//! Transformation steps and chains.
//!
//! Both are plain ordered value collections. A step keeps its parameters in
//! insertion order because that order is the wire order.

use std::fmt;

use serde::de::{self, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::value::ParamValue;
use crate::registry::ParameterRegistry;

/// JSON key holding overlay layers inside a serialized step.
pub const LAYERS_KEY: &str = "layers";

/// A bag of parameters applied together (joined with `,` on the wire).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TransformationStep {
    params: Vec<(String, ParamValue)>,
    layers: Vec<Layer>,
}

impl TransformationStep {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`set`](Self::set).
    pub fn with(mut self, name: impl Into<String>, value: impl Into<ParamValue>) -> Self {
        self.set(name, value);
        self
    }

    /// Set a parameter. Re-setting an existing name keeps its original position.
    pub fn set(&mut self, name: impl Into<String>, value: impl Into<ParamValue>) {
        let name = name.into();
        let value = value.into();
        match self.params.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.params.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&ParamValue> {
        self.params.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn remove(&mut self, name: &str) -> Option<ParamValue> {
        let idx = self.params.iter().position(|(n, _)| n == name)?;
        Some(self.params.remove(idx).1)
    }

    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn params(&self) -> impl Iterator<Item = (&str, &ParamValue)> {
        self.params.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn len(&self) -> usize {
        self.params.len()
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty() && self.layers.is_empty()
    }

    /// Fold another step into this one; later values win for repeated names.
    pub fn merge(mut self, other: TransformationStep) -> Self {
        for (name, value) in other.params {
            self.set(name, value);
        }
        self.layers.extend(other.layers);
        self
    }

    /// Distinct AI operations this step triggers, in first-use order. A
    /// modifier counts as its parent, so `{azimuth: 45}` alone triggers
    /// `drop_shadow`. Disabled flags and unknown names are ignored here; the
    /// compiler reports unknown names.
    pub fn ai_operations(&self, registry: &ParameterRegistry) -> Vec<&'static str> {
        let mut ops: Vec<&'static str> = Vec::new();
        for (name, value) in self.params() {
            if value.is_disabled() {
                continue;
            }
            let Some(spec) = registry.get(name) else { continue };
            let owner = match spec.modifier_of {
                Some(parent) => match registry.get(parent) {
                    Some(parent) => parent,
                    None => continue,
                },
                None => spec,
            };
            if owner.is_ai_operation && !ops.contains(&owner.name) {
                ops.push(owner.name);
            }
        }
        ops
    }

    /// Number of AI operations this step triggers. More than one is rejected
    /// by the compiler.
    pub fn ai_parameter_count(&self, registry: &ParameterRegistry) -> usize {
        self.ai_operations(registry).len()
    }
}

impl<K, V> FromIterator<(K, V)> for TransformationStep
where
    K: Into<String>,
    V: Into<ParamValue>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut step = Self::new();
        for (k, v) in iter {
            step.set(k, v);
        }
        step
    }
}

impl Serialize for TransformationStep {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let extra = usize::from(!self.layers.is_empty());
        let mut map = serializer.serialize_map(Some(self.params.len() + extra))?;
        for (name, value) in &self.params {
            map.serialize_entry(name, value)?;
        }
        if !self.layers.is_empty() {
            map.serialize_entry(LAYERS_KEY, &self.layers)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for TransformationStep {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct StepVisitor;

        impl<'de> Visitor<'de> for StepVisitor {
            type Value = TransformationStep;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of transformation parameters")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
                let mut step = TransformationStep::new();
                while let Some(key) = access.next_key::<String>()? {
                    if key == LAYERS_KEY {
                        if !step.layers.is_empty() {
                            return Err(de::Error::duplicate_field(LAYERS_KEY));
                        }
                        step.layers = access.next_value()?;
                    } else {
                        let value: ParamValue = access.next_value()?;
                        step.set(key, value);
                    }
                }
                Ok(step)
            }
        }

        deserializer.deserialize_map(StepVisitor)
    }
}

/// An ordered sequence of steps (joined with `:` on the wire).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TransformationChain {
    steps: Vec<TransformationStep>,
}

impl TransformationChain {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_steps(steps: Vec<TransformationStep>) -> Self {
        Self { steps }
    }

    /// Append a step.
    pub fn then(mut self, step: TransformationStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn push(&mut self, step: TransformationStep) {
        self.steps.push(step);
    }

    /// Merge parameters into the last step instead of starting a new one.
    pub fn merge_into_last(mut self, step: TransformationStep) -> Self {
        match self.steps.pop() {
            Some(last) => self.steps.push(last.merge(step)),
            None => self.steps.push(step),
        }
        self
    }

    pub fn steps(&self) -> &[TransformationStep] {
        &self.steps
    }

    pub(crate) fn insert(&mut self, index: usize, step: TransformationStep) {
        self.steps.insert(index, step);
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl From<TransformationStep> for TransformationChain {
    fn from(step: TransformationStep) -> Self {
        Self { steps: vec![step] }
    }
}

impl FromIterator<TransformationStep> for TransformationChain {
    fn from_iter<I: IntoIterator<Item = TransformationStep>>(iter: I) -> Self {
        Self {
            steps: iter.into_iter().collect(),
        }
    }
}

/// What an overlay layer draws.
///
/// Serialized externally tagged, so a layer reads `{"input": "logo.png", ..}`
/// or `{"text": "Sale", ..}` in JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum LayerSource {
    /// Path of the overlay image, relative to the URL endpoint.
    #[serde(rename = "input")]
    Image(String),
    /// Text rendered by the CDN.
    #[serde(rename = "text")]
    Text(String),
}

/// An overlay placed on top of the asset being transformed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Layer {
    #[serde(flatten)]
    pub source: LayerSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<ParamValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<ParamValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub focus: Option<String>,
    /// Text styling keyed by text-layer parameter names (`font_size`, `color`, ..).
    /// Only valid on text layers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub style: Option<TransformationStep>,
    /// Transformations applied to the overlay image itself.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transformation: Option<TransformationChain>,
}

impl Layer {
    pub fn image(input: impl Into<String>) -> Self {
        Self::from_source(LayerSource::Image(input.into()))
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self::from_source(LayerSource::Text(text.into()))
    }

    fn from_source(source: LayerSource) -> Self {
        Self {
            source,
            x: None,
            y: None,
            focus: None,
            style: None,
            transformation: None,
        }
    }

    pub fn is_text(&self) -> bool {
        matches!(self.source, LayerSource::Text(_))
    }

    pub fn with_position(mut self, x: impl Into<ParamValue>, y: impl Into<ParamValue>) -> Self {
        self.x = Some(x.into());
        self.y = Some(y.into());
        self
    }

    pub fn with_focus(mut self, focus: impl Into<String>) -> Self {
        self.focus = Some(focus.into());
        self
    }

    pub fn with_style(mut self, style: TransformationStep) -> Self {
        self.style = Some(style);
        self
    }

    pub fn with_transformation(mut self, chain: impl Into<TransformationChain>) -> Self {
        self.transformation = Some(chain.into());
        self
    }
}
