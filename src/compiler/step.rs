//! Step compiler: one [`TransformationStep`] to an ordered token list.

use regex::Regex;
use tracing::debug;

use super::{SourceDimensions, STEP_SEP, layer};
use crate::error::TransformError;
use crate::params::expression::{self, looks_like_expression};
use crate::params::value::{format_number, format_signed_number};
use crate::params::{ParamValue, PromptEncoder, TransformationStep};
use crate::registry::{
    Companion, Element, NumberRange, ParameterRegistry, ParameterSpec, PromptRequirement,
    Resolution, Tuple, ValueType,
};

const TARGET: &str = "imagekit_transform::compiler";

lazy_static::lazy_static! {
    static ref HEX_COLOR: Regex = Regex::new(r"^(?:[0-9A-Fa-f]{6}|[0-9A-Fa-f]{8})$").expect("valid regex");
    static ref RATIO: Regex = Regex::new(r"^[0-9]+(?:\.[0-9]+)?-[0-9]+(?:\.[0-9]+)?$").expect("valid regex");
    static ref PADDING: Regex = Regex::new(r"^[1-9][0-9]*(?:_[1-9][0-9]*){0,3}$").expect("valid regex");
    static ref FONT_FILE: Regex =
        Regex::new(r"^(?:[A-Za-z0-9._-]+/)*[A-Za-z0-9._-]+\.(?i:ttf|otf|woff2?)$").expect("valid regex");
}

/// Folder separator the CDN expects inside nested asset paths.
pub(crate) const NESTED_PATH_SEP: &str = "@@";

/// Where the step sits and what is known about the source asset.
#[derive(Debug, Clone, Copy, Default)]
pub struct StepContext {
    /// Position of the step in its chain.
    pub index: usize,
    /// Compiling for an overlay sub-expression.
    pub for_layer: bool,
    pub source: Option<SourceDimensions>,
}

/// Output of [`StepCompiler::compile`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledStep {
    pub tokens: Vec<String>,
    /// Canonical names of the AI operations the step carries (layers excluded).
    pub ai_operations: Vec<&'static str>,
}

impl CompiledStep {
    /// Tokens joined with the step separator.
    pub fn wire(&self) -> String {
        self.tokens.join(&STEP_SEP.to_string())
    }
}

/// A resolved parameter awaiting emission.
#[derive(Debug)]
struct Entry<'r> {
    spec: &'r ParameterSpec,
    /// Text after `<code>-`; `None` for a bare code.
    wire_value: Option<String>,
}

impl Entry<'_> {
    fn token(&self) -> String {
        match &self.wire_value {
            Some(v) => format!("{}-{}", self.spec.code, v),
            None => self.spec.code.to_string(),
        }
    }

    /// Companions name top-level parameters; modifiers reuse short codes
    /// (`x`, `st`) that mean something else at step level.
    fn matches(&self, companion: &Companion) -> bool {
        self.spec.modifier_of.is_none()
            && self.spec.code == companion.code
            && (companion.values.is_empty()
                || self
                    .wire_value
                    .as_deref()
                    .is_some_and(|v| companion.values.contains(&v)))
    }
}

pub struct StepCompiler<'r> {
    registry: &'r ParameterRegistry,
    prompts: PromptEncoder,
}

impl<'r> StepCompiler<'r> {
    pub fn new(registry: &'r ParameterRegistry) -> Self {
        Self {
            registry,
            prompts: PromptEncoder::new(),
        }
    }

    pub fn compile(
        &self,
        step: &TransformationStep,
        ctx: &StepContext,
    ) -> Result<CompiledStep, TransformError> {
        let mut entries = self.resolve(step)?;
        self.insert_implicit_parents(&mut entries)?;
        reject_duplicate_codes(&entries)?;
        resolve_conflicts(&mut entries)?;
        check_requirements(&entries)?;

        let ai_operations: Vec<&'static str> = entries
            .iter()
            .filter(|e| e.spec.is_ai_operation)
            .map(|e| e.spec.name)
            .collect();
        if ai_operations.len() > 1 {
            return Err(TransformError::MultipleAIOperationsInStep {
                step: ctx.index,
                operations: ai_operations.iter().map(|s| s.to_string()).collect(),
            });
        }
        check_input_size(&entries, ctx.source)?;

        let mut tokens = emit(&entries);
        for layer in step.layers() {
            tokens.push(layer::encode_layer(self.registry, layer)?);
        }
        tracing::trace!(target: TARGET, step = ctx.index, ?tokens, "compiled step");

        Ok(CompiledStep {
            tokens,
            ai_operations,
        })
    }

    fn resolve(&self, step: &TransformationStep) -> Result<Vec<Entry<'r>>, TransformError> {
        let mut entries = Vec::with_capacity(step.len());
        for (name, value) in step.params() {
            let spec = self.registry.lookup(name)?;
            if value.is_disabled() {
                debug!(target: TARGET, parameter = spec.name, "parameter switched off");
                continue;
            }
            let wire_value = self.encode_value(spec, value)?;
            entries.push(Entry { spec, wire_value });
        }
        Ok(entries)
    }

    /// A modifier without its parent gets the parent inserted in front of it.
    fn insert_implicit_parents(&self, entries: &mut Vec<Entry<'r>>) -> Result<(), TransformError> {
        let mut idx = 0;
        while idx < entries.len() {
            if let Some(parent) = entries[idx].spec.modifier_of {
                if !entries.iter().any(|e| e.spec.name == parent) {
                    let spec = self.registry.lookup(parent)?;
                    debug!(
                        target: TARGET,
                        parent = spec.name,
                        modifier = entries[idx].spec.name,
                        "inserting implicit parent for modifier"
                    );
                    entries.insert(
                        idx,
                        Entry {
                            spec,
                            wire_value: None,
                        },
                    );
                    idx += 1;
                }
            }
            idx += 1;
        }
        Ok(())
    }

    /// Validate `value` against `spec` and render the text after `<code>-`.
    pub(crate) fn encode_value(
        &self,
        spec: &ParameterSpec,
        value: &ParamValue,
    ) -> Result<Option<String>, TransformError> {
        encode_value(&self.prompts, spec, value)
    }
}

pub(crate) fn encode_value(
    prompts: &PromptEncoder,
    spec: &ParameterSpec,
    value: &ParamValue,
) -> Result<Option<String>, TransformError> {
    let name = spec.name;
    match spec.value_type {
        ValueType::Flag => match value {
            ParamValue::Flag(true) => Ok(None),
            other => Err(TransformError::invalid(
                name,
                format!("flag takes no value, got `{other}`"),
            )),
        },
        ValueType::Number(range) => match value {
            ParamValue::Text(s) if range.is_keyword(s) => Ok(Some(s.clone())),
            other => {
                let n = other.as_number().ok_or_else(|| {
                    TransformError::invalid(name, format!("expected a number, got `{other}`"))
                })?;
                Ok(Some(checked_number(name, n, &range)?))
            }
        },
        ValueType::Percentage => {
            let n = value.as_number().ok_or_else(|| {
                TransformError::invalid(name, format!("expected a fraction, got `{value}`"))
            })?;
            if !(n > 0.0 && n <= 1.0) {
                return Err(TransformError::invalid(
                    name,
                    format!("percentage must satisfy 0 < v <= 1, got {n}"),
                ));
            }
            Ok(Some(format_number(n)))
        }
        ValueType::Enum(allowed) => match value {
            ParamValue::Text(s) if allowed.contains(&s.as_str()) => Ok(Some(s.clone())),
            ParamValue::Text(s) => Err(TransformError::out_of_range(
                name,
                s.as_str(),
                format!("one of {}", allowed.join(", ")),
            )),
            other => Err(TransformError::invalid(
                name,
                format!("expected one of {}, got `{other}`", allowed.join(", ")),
            )),
        },
        ValueType::ArithmeticExpression(range) => match value {
            ParamValue::Flag(_) => Err(TransformError::invalid(
                name,
                "expected a number or an expression",
            )),
            ParamValue::Text(s) if range.is_keyword(s) => Ok(Some(s.clone())),
            ParamValue::Text(s) if value.as_number().is_none() => {
                expression::validate(name, s).map(|expr| Some(expr.to_string()))
            }
            other => {
                let n = other.as_number().ok_or_else(|| {
                    TransformError::invalid(name, format!("expected a number, got `{other}`"))
                })?;
                Ok(Some(checked_number(name, n, &range)?))
            }
        },
        ValueType::Prompt(requirement) => match value {
            ParamValue::Flag(true) if requirement == PromptRequirement::Optional => Ok(None),
            ParamValue::Text(text) => {
                let encoded = prompts.encode(text).map_err(|e| match e {
                    TransformError::InvalidValueSyntax { reason, .. } => {
                        TransformError::invalid(name, reason)
                    }
                    other => other,
                })?;
                Ok(Some(encoded.fragment()))
            }
            _ => Err(TransformError::invalid(name, "a prompt text is required")),
        },
        ValueType::Color(keywords) => match value {
            ParamValue::Text(s) if keywords.contains(&s.as_str()) => Ok(Some(s.clone())),
            ParamValue::Text(s) => hex_color(s).map(Some).ok_or_else(|| {
                let expected = if keywords.is_empty() {
                    "RRGGBB or RRGGBBAA".to_string()
                } else {
                    format!("RRGGBB, RRGGBBAA or one of {}", keywords.join(", "))
                };
                TransformError::invalid(name, format!("expected {expected}, got `{s}`"))
            }),
            other => Err(TransformError::invalid(
                name,
                format!("expected a colour, got `{other}`"),
            )),
        },
        ValueType::AspectRatio => match value {
            ParamValue::Text(s) if RATIO.is_match(s) => Ok(Some(s.clone())),
            ParamValue::Text(s) if looks_like_expression(s) => {
                expression::validate(name, s).map(|expr| Some(expr.to_string()))
            }
            other => Err(TransformError::invalid(
                name,
                format!("expected `<w>-<h>` or an expression, got `{other}`"),
            )),
        },
        ValueType::FlagOrNumber { range, flag_value } => match value {
            ParamValue::Flag(true) => Ok(flag_value.map(str::to_string)),
            ParamValue::Flag(false) => Err(TransformError::invalid(name, "`false` has no wire form")),
            other => {
                let n = other.as_number().ok_or_else(|| {
                    TransformError::invalid(name, format!("expected `true` or a number, got `{other}`"))
                })?;
                // zero means the default strength, same as the bare flag
                if n == 0.0 && range.contains(0.0) {
                    Ok(flag_value.map(str::to_string))
                } else {
                    Ok(Some(checked_number(name, n, &range)?))
                }
            }
        },
        ValueType::Tuple(tuple) => encode_tuple(name, &tuple, value).map(Some),
        ValueType::Font(builtin) => match value {
            ParamValue::Text(s) if builtin.contains(&s.as_str()) => {
                Ok(Some(urlencoding::encode(s).into_owned()))
            }
            ParamValue::Text(s) => {
                let path = s.trim().trim_start_matches('/').replace(NESTED_PATH_SEP, "/");
                if FONT_FILE.is_match(&path) {
                    Ok(Some(path.replace('/', NESTED_PATH_SEP)))
                } else {
                    Err(TransformError::invalid(
                        name,
                        format!("`{s}` is neither a built-in font nor a .ttf/.otf/.woff/.woff2 path"),
                    ))
                }
            }
            other => Err(TransformError::invalid(
                name,
                format!("expected a font name or path, got `{other}`"),
            )),
        },
        ValueType::Padding => match value {
            ParamValue::Flag(_) => Err(TransformError::invalid(name, "expected a padding value")),
            ParamValue::Text(s) if looks_like_expression(s) => {
                expression::validate(name, s).map(|expr| Some(expr.to_string()))
            }
            other => {
                let text = other.to_string();
                if PADDING.is_match(text.trim()) {
                    Ok(Some(text.trim().to_string()))
                } else {
                    Err(TransformError::invalid(
                        name,
                        format!("expected 1 to 4 positive whole numbers joined by `_`, got `{other}`"),
                    ))
                }
            }
        },
    }
}

/// Uppercased `RRGGBB`/`RRGGBBAA`, leading `#` allowed.
fn hex_color(value: &str) -> Option<String> {
    let value = value.trim().trim_start_matches('#');
    HEX_COLOR.is_match(value).then(|| value.to_ascii_uppercase())
}

fn encode_tuple(name: &str, tuple: &Tuple, value: &ParamValue) -> Result<String, TransformError> {
    let sep = tuple.separator;
    let arity = if tuple.required == tuple.elements.len() {
        tuple.required.to_string()
    } else {
        format!("{} to {}", tuple.required, tuple.elements.len())
    };
    let text = match value {
        ParamValue::Flag(_) => {
            return Err(TransformError::invalid(
                name,
                format!("expected {arity} values joined by `{sep}`"),
            ));
        }
        other => other.to_string(),
    };
    let parts: Vec<&str> = text.split(sep).map(str::trim).collect();
    if parts.len() < tuple.required || parts.len() > tuple.elements.len() {
        return Err(TransformError::invalid(
            name,
            format!("expected {arity} values joined by `{sep}`, got `{text}`"),
        ));
    }

    let mut encoded = Vec::with_capacity(parts.len());
    for (part, element) in parts.iter().zip(tuple.elements) {
        encoded.push(match element {
            Element::Number(range) => {
                let n = part.parse::<f64>().ok().filter(|n| n.is_finite()).ok_or_else(|| {
                    TransformError::invalid(name, format!("`{part}` is not a number"))
                })?;
                checked_number(name, n, range)?
            }
            Element::Color => hex_color(part).ok_or_else(|| {
                TransformError::invalid(name, format!("`{part}` is not an RRGGBB or RRGGBBAA colour"))
            })?,
        });
    }
    Ok(format!("{}{}", tuple.prefix, encoded.join(&sep.to_string())))
}

fn checked_number(name: &str, n: f64, range: &NumberRange) -> Result<String, TransformError> {
    if !range.contains(n) {
        return Err(TransformError::out_of_range(
            name,
            format_number(n),
            range.to_string(),
        ));
    }
    Ok(format_signed_number(n))
}

/// Two top-level parameters, or two modifiers of one parent, may not share a code.
fn reject_duplicate_codes(entries: &[Entry<'_>]) -> Result<(), TransformError> {
    for (i, later) in entries.iter().enumerate() {
        let clash = entries[..i].iter().find(|e| {
            e.spec.code == later.spec.code && e.spec.modifier_of == later.spec.modifier_of
        });
        if let Some(earlier) = clash {
            return Err(TransformError::ConflictingParameters {
                parameter: later.spec.name.to_string(),
                other: earlier.spec.name.to_string(),
            });
        }
    }
    Ok(())
}

fn resolve_conflicts(entries: &mut Vec<Entry<'_>>) -> Result<(), TransformError> {
    let mut idx = 0;
    while idx < entries.len() {
        let spec = entries[idx].spec;
        let mut dropped = false;
        for conflict in spec.conflicts_with {
            let triggered = conflict.with_all.iter().all(|companion| {
                entries
                    .iter()
                    .enumerate()
                    .any(|(j, e)| j != idx && e.matches(companion))
            });
            if !triggered {
                continue;
            }
            let other = conflict
                .with_all
                .iter()
                .map(|c| c.to_string())
                .collect::<Vec<_>>()
                .join(" + ");
            match conflict.resolution {
                Resolution::DropThis => {
                    debug!(
                        target: TARGET,
                        parameter = spec.name,
                        conflicts_with = %other,
                        "dropping conflicting parameter"
                    );
                    dropped = true;
                    break;
                }
                Resolution::Reject => {
                    return Err(TransformError::ConflictingParameters {
                        parameter: spec.name.to_string(),
                        other,
                    });
                }
            }
        }
        if dropped {
            entries.remove(idx);
        } else {
            idx += 1;
        }
    }
    Ok(())
}

fn check_requirements(entries: &[Entry<'_>]) -> Result<(), TransformError> {
    for entry in entries {
        for requirement in entry.spec.required_with {
            let triggered = requirement.when.is_empty()
                || entry
                    .wire_value
                    .as_deref()
                    .is_some_and(|v| requirement.when.contains(&v));
            if !triggered {
                continue;
            }
            if let Some(missing) = requirement
                .companions
                .iter()
                .find(|c| !entries.iter().any(|e| e.matches(c)))
            {
                return Err(TransformError::MissingRequiredCompanion {
                    parameter: entry.spec.name.to_string(),
                    companion: missing.to_string(),
                });
            }
        }
    }
    Ok(())
}

fn check_input_size(
    entries: &[Entry<'_>],
    source: Option<SourceDimensions>,
) -> Result<(), TransformError> {
    let Some(source) = source else {
        return Ok(());
    };
    for entry in entries {
        if let Some(limit) = entry.spec.max_input_megapixels {
            let megapixels = source.megapixels();
            if megapixels > limit {
                return Err(TransformError::out_of_range(
                    entry.spec.name,
                    format!("{}x{} ({megapixels:.1} MP)", source.width, source.height),
                    format!("an input of at most {} MP", format_number(limit)),
                ));
            }
        }
    }
    Ok(())
}

/// Render tokens in order, folding modifiers into their parent.
fn emit(entries: &[Entry<'_>]) -> Vec<String> {
    let mut tokens = Vec::with_capacity(entries.len());
    for entry in entries.iter().filter(|e| e.spec.modifier_of.is_none()) {
        let modifiers: Vec<String> = entries
            .iter()
            .filter(|m| m.spec.modifier_of == Some(entry.spec.name))
            .map(Entry::token)
            .collect();
        let mut token = entry.token();
        if !modifiers.is_empty() {
            token.push(if entry.wire_value.is_none() { '-' } else { '_' });
            token.push_str(&modifiers.join("_"));
        }
        tokens.push(token);
    }
    tokens
}

#[cfg(test)]
mod tests {
    use tracing_test::traced_test;

    use super::*;
    use crate::registry::global_registry;

    fn compile(step: TransformationStep) -> Result<Vec<String>, TransformError> {
        StepCompiler::new(global_registry())
            .compile(&step, &StepContext::default())
            .map(|c| c.tokens)
    }

    #[test]
    fn pad_resize_needs_width_and_height() {
        let err = compile(TransformationStep::new().with("crop_mode", "pad_resize")).unwrap_err();
        assert!(matches!(err, TransformError::MissingRequiredCompanion { .. }));

        let tokens = compile(
            TransformationStep::new()
                .with("w", 1000)
                .with("h", 960)
                .with("crop_mode", "pad_resize"),
        )
        .unwrap();
        assert_eq!(tokens.join(","), "w-1000,h-960,cm-pad_resize");
    }

    #[test]
    #[traced_test]
    fn aspect_ratio_dropped_when_both_dimensions_set() {
        let step = TransformationStep::new()
            .with("aspect_ratio", "4-3")
            .with("width", 400)
            .with("height", 300);
        assert_eq!(compile(step.clone()).unwrap(), vec!["w-400", "h-300"]);
        assert_eq!(compile(step).unwrap(), vec!["w-400", "h-300"]);
        assert!(logs_contain("dropping conflicting parameter"));

        let kept = compile(TransformationStep::new().with("ar", "4-3").with("w", 400)).unwrap();
        assert_eq!(kept, vec!["ar-4-3", "w-400"]);
    }

    #[test]
    fn lone_shadow_modifier_folds_into_implicit_parent() {
        let tokens = compile(TransformationStep::new().with("azimuth", 45)).unwrap();
        assert_eq!(tokens, vec!["e-dropshadow-az-45"]);

        let tokens = compile(
            TransformationStep::new()
                .with("drop_shadow", true)
                .with("az", 45)
                .with("el", 30),
        )
        .unwrap();
        assert_eq!(tokens, vec!["e-dropshadow-az-45_el-30"]);

        let tokens = compile(TransformationStep::new().with("drop_shadow", true)).unwrap();
        assert_eq!(tokens, vec!["e-dropshadow"]);
    }

    #[test]
    fn two_ai_operations_in_one_step_fail() {
        let err = compile(
            TransformationStep::new()
                .with("remove_background", true)
                .with("drop_shadow", true),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            TransformError::MultipleAIOperationsInStep { ref operations, .. } if operations.len() == 2
        ));
    }

    #[test]
    fn disabled_flags_are_omitted() {
        let tokens = compile(
            TransformationStep::new()
                .with("remove_background", false)
                .with("drop_shadow", true),
        )
        .unwrap();
        assert_eq!(tokens, vec!["e-dropshadow"]);
    }

    #[test]
    fn value_types_encode() {
        let tokens = compile(
            TransformationStep::new()
                .with("width", "iw_div_2")
                .with("dpr", "auto")
                .with("rotate", -90)
                .with("background", "#ff0000")
                .with("quality", "80")
                .with("format", "webp"),
        )
        .unwrap();
        assert_eq!(
            tokens,
            vec!["w-iw_div_2", "dpr-auto", "rt-N90", "bg-FF0000", "q-80", "f-webp"]
        );
    }

    #[test]
    fn out_of_range_and_syntax_errors() {
        assert!(matches!(
            compile(TransformationStep::new().with("quality", 0)).unwrap_err(),
            TransformError::OutOfRange { .. }
        ));
        assert!(matches!(
            compile(TransformationStep::new().with("width_ratio", 1.5)).unwrap_err(),
            TransformError::InvalidValueSyntax { .. }
        ));
        assert!(matches!(
            compile(TransformationStep::new().with("width", "iw_pow_2")).unwrap_err(),
            TransformError::InvalidValueSyntax { .. }
        ));
        assert!(matches!(
            compile(TransformationStep::new().with("focus", "moon")).unwrap_err(),
            TransformError::OutOfRange { .. }
        ));
        assert!(matches!(
            compile(TransformationStep::new().with("nope", 1)).unwrap_err(),
            TransformError::UnknownParameter(_)
        ));
    }

    #[test]
    fn prompt_variants_pick_the_parameter_code() {
        let tokens = compile(TransformationStep::new().with("change_background", "snow")).unwrap();
        assert_eq!(tokens, vec!["e-changebg-prompt-snow"]);

        let tokens =
            compile(TransformationStep::new().with("edit", "add a hat, red")).unwrap();
        assert!(tokens[0].starts_with("e-edit-prompte-"));
    }

    #[test]
    fn generative_fill_rules() {
        let base = TransformationStep::new()
            .with("w", 1000)
            .with("h", 1000)
            .with("cm", "pad_resize");
        let tokens = compile(base.clone().with("generative_fill", true)).unwrap();
        assert_eq!(tokens.last().unwrap(), "bg-genfill");

        let err = compile(
            TransformationStep::new()
                .with("w", 1000)
                .with("generative_fill", "sky"),
        )
        .unwrap_err();
        assert!(matches!(err, TransformError::MissingRequiredCompanion { .. }));

        let err = compile(base.with("bg", "FFFFFF").with("generative_fill", true)).unwrap_err();
        assert!(matches!(err, TransformError::ConflictingParameters { .. }));
    }

    #[test]
    fn percentages_reject_nan_and_infinity() {
        for bad in [f64::NAN, f64::INFINITY, 0.0, -0.5] {
            assert!(matches!(
                compile(TransformationStep::new().with("width_ratio", bad)).unwrap_err(),
                TransformError::InvalidValueSyntax { .. }
            ));
        }
        assert_eq!(
            compile(TransformationStep::new().with("width_ratio", 0.5)).unwrap(),
            vec!["w-0.5"]
        );
    }

    #[test]
    fn non_finite_numbers_are_rejected_everywhere() {
        for name in ["quality", "width", "rotate", "sharpen"] {
            assert!(
                compile(TransformationStep::new().with(name, f64::NAN)).is_err(),
                "{name}"
            );
        }
    }

    #[test]
    fn sharpen_and_trim_take_a_flag_or_a_number() {
        assert_eq!(compile(TransformationStep::new().with("sharpen", true)).unwrap(), vec!["e-sharpen"]);
        assert_eq!(compile(TransformationStep::new().with("sharpen", 0)).unwrap(), vec!["e-sharpen"]);
        assert_eq!(compile(TransformationStep::new().with("sharpen", 8)).unwrap(), vec!["e-sharpen-8"]);
        assert_eq!(compile(TransformationStep::new().with("trim", true)).unwrap(), vec!["t-true"]);
        assert_eq!(compile(TransformationStep::new().with("t", 20)).unwrap(), vec!["t-20"]);
        assert!(matches!(
            compile(TransformationStep::new().with("trim", 100)).unwrap_err(),
            TransformError::OutOfRange { .. }
        ));
        assert!(matches!(
            compile(TransformationStep::new().with("trim", 0)).unwrap_err(),
            TransformError::OutOfRange { .. }
        ));
    }

    #[test]
    fn shadow_and_gradient_fold_their_modifiers() {
        assert_eq!(compile(TransformationStep::new().with("shadow", true)).unwrap(), vec!["e-shadow"]);
        let tokens = compile(
            TransformationStep::new()
                .with("shadow_blur", 5)
                .with("shadow_offset_x", -4)
                .with("shadow_offset_y", 3),
        )
        .unwrap();
        assert_eq!(tokens, vec!["e-shadow-bl-5_x-N4_y-3"]);

        let tokens = compile(
            TransformationStep::new()
                .with("gradient", true)
                .with("gradient_direction", "top_left")
                .with("gradient_to", "#00000080"),
        )
        .unwrap();
        assert_eq!(tokens, vec!["e-gradient-ld-top_left_to-00000080"]);

        assert!(compile(TransformationStep::new().with("shadow_blur", 20)).is_err());
    }

    #[test]
    fn modifier_codes_do_not_clash_with_step_parameters() {
        let tokens = compile(
            TransformationStep::new()
                .with("cm", "extract")
                .with("x", 10)
                .with("shadow_offset_x", 2),
        )
        .unwrap();
        assert_eq!(tokens, vec!["cm-extract", "x-10", "e-shadow-x-2"]);

        // drop shadow and plain shadow both have an `st` modifier
        let tokens = compile(
            TransformationStep::new()
                .with("saturation", 50)
                .with("shadow_saturation", 20),
        )
        .unwrap();
        assert_eq!(tokens, vec!["e-dropshadow-st-50", "e-shadow-st-20"]);

        let tokens = compile(
            TransformationStep::new()
                .with("cm", "extract")
                .with("xc", 5)
                .with("shadow_offset_x", 2),
        )
        .unwrap();
        assert_eq!(tokens, vec!["cm-extract", "xc-5", "e-shadow-x-2"]);
    }

    #[test]
    fn tuple_effects() {
        assert_eq!(
            compile(TransformationStep::new().with("unsharp_mask", "2-2-0.8-0.024")).unwrap(),
            vec!["e-usm-2-2-0.8-0.024"]
        );
        assert_eq!(
            compile(TransformationStep::new().with("perspective_distort", "0_0_400_-50_400_350_0_400"))
                .unwrap(),
            vec!["e-distort-p-0_0_400_N50_400_350_0_400"]
        );
        assert_eq!(
            compile(TransformationStep::new().with("arc_distort", -90)).unwrap(),
            vec!["e-distort-a-N90"]
        );
        assert_eq!(
            compile(TransformationStep::new().with("border", "5_#ff0000")).unwrap(),
            vec!["b-5_FF0000"]
        );
        assert_eq!(
            compile(TransformationStep::new().with("color_replace", "00FF00_35")).unwrap(),
            vec!["cr-00FF00_35"]
        );
        assert_eq!(
            compile(TransformationStep::new().with("cr", "FF0000_20_0000FF")).unwrap(),
            vec!["cr-FF0000_20_0000FF"]
        );

        for (name, bad) in [
            ("unsharp_mask", "2-2-0.8"),
            ("border", "5"),
            ("border", "5_red"),
            ("color_replace", "00FF00_35.5"),
            ("perspective_distort", "0_0_1_1_2_2_3_x"),
        ] {
            assert!(matches!(
                compile(TransformationStep::new().with(name, bad)).unwrap_err(),
                TransformError::InvalidValueSyntax { .. } | TransformError::OutOfRange { .. }
            ), "{name}={bad}");
        }
        assert!(matches!(
            compile(TransformationStep::new().with("border", true)).unwrap_err(),
            TransformError::InvalidValueSyntax { .. }
        ));
    }

    #[test]
    fn both_distortions_share_one_slot() {
        let err = compile(
            TransformationStep::new()
                .with("arc_distort", 30)
                .with("perspective_distort", "0_0_1_0_1_1_0_1"),
        )
        .unwrap_err();
        assert!(matches!(err, TransformError::ConflictingParameters { .. }));
    }

    #[test]
    fn width_and_width_ratio_share_a_code() {
        let err = compile(
            TransformationStep::new()
                .with("width", 100)
                .with("width_ratio", 0.5),
        )
        .unwrap_err();
        assert!(matches!(err, TransformError::ConflictingParameters { .. }));
    }

    #[test]
    fn extract_coordinates_need_an_extract_mode() {
        let err = compile(TransformationStep::new().with("x", 10)).unwrap_err();
        assert!(matches!(err, TransformError::MissingRequiredCompanion { .. }));

        let tokens = compile(
            TransformationStep::new()
                .with("cm", "extract")
                .with("x", 10)
                .with("y", "ih_div_4"),
        )
        .unwrap();
        assert_eq!(tokens, vec!["cm-extract", "x-10", "y-ih_div_4"]);

        let err = compile(
            TransformationStep::new()
                .with("cm", "extract")
                .with("x", 10)
                .with("xc", 20),
        )
        .unwrap_err();
        assert!(matches!(err, TransformError::ConflictingParameters { .. }));
    }

    #[test]
    fn focus_rejected_with_forced_crop() {
        let err = compile(TransformationStep::new().with("c", "force").with("fo", "face")).unwrap_err();
        assert!(matches!(err, TransformError::ConflictingParameters { .. }));
    }

    #[test]
    fn input_size_limit_applies_when_dimensions_known() {
        let compiler = StepCompiler::new(global_registry());
        let step = TransformationStep::new().with("upscale", true);
        let ctx = StepContext {
            source: Some(SourceDimensions::new(5000, 4000)),
            ..StepContext::default()
        };
        assert!(matches!(
            compiler.compile(&step, &ctx).unwrap_err(),
            TransformError::OutOfRange { .. }
        ));

        let ctx = StepContext {
            source: Some(SourceDimensions::new(2000, 2000)),
            ..StepContext::default()
        };
        assert_eq!(compiler.compile(&step, &ctx).unwrap().tokens, vec!["e-upscale"]);
    }
}
