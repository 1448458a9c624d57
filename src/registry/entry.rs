//! Registry entry types.
//!
//! Every descriptor is `'static` and const-constructible so the whole catalog
//! is a plain table compiled into the binary.

use std::fmt;

/// Numeric bounds plus accepted keywords (`auto`, `max`, ...).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NumberRange {
    pub min: Option<f64>,
    pub max: Option<f64>,
    /// When set, `min` itself is not allowed.
    pub min_exclusive: bool,
    /// Only whole numbers.
    pub integer: bool,
    pub keywords: &'static [&'static str],
}

impl NumberRange {
    pub const ANY: Self = Self {
        min: None,
        max: None,
        min_exclusive: false,
        integer: false,
        keywords: &[],
    };

    /// Strictly greater than zero.
    pub const fn positive() -> Self {
        Self {
            min: Some(0.0),
            max: None,
            min_exclusive: true,
            integer: false,
            keywords: &[],
        }
    }

    pub const fn at_least(min: f64) -> Self {
        Self {
            min: Some(min),
            max: None,
            min_exclusive: false,
            integer: false,
            keywords: &[],
        }
    }

    pub const fn between(min: f64, max: f64) -> Self {
        Self {
            min: Some(min),
            max: Some(max),
            min_exclusive: false,
            integer: false,
            keywords: &[],
        }
    }

    pub const fn exclusive_min(mut self) -> Self {
        self.min_exclusive = true;
        self
    }

    pub const fn whole(mut self) -> Self {
        self.integer = true;
        self
    }

    pub const fn with_keywords(mut self, keywords: &'static [&'static str]) -> Self {
        self.keywords = keywords;
        self
    }

    pub fn contains(&self, value: f64) -> bool {
        let above = match self.min {
            Some(min) if self.min_exclusive => value > min,
            Some(min) => value >= min,
            None => true,
        };
        let below = self.max.is_none_or(|max| value <= max);
        value.is_finite() && above && below && (!self.integer || value.fract() == 0.0)
    }

    pub fn is_keyword(&self, value: &str) -> bool {
        self.keywords.contains(&value)
    }

    pub fn allows_negative(&self) -> bool {
        self.min.is_none_or(|min| min < 0.0)
    }
}

impl fmt::Display for NumberRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.min, self.max) {
            (Some(min), Some(max)) => write!(f, "{min} to {max}")?,
            (Some(min), None) if self.min_exclusive => write!(f, "> {min}")?,
            (Some(min), None) => write!(f, ">= {min}")?,
            (None, Some(max)) => write!(f, "<= {max}")?,
            (None, None) => f.write_str("any number")?,
        }
        if self.integer {
            f.write_str(" (whole)")?;
        }
        if !self.keywords.is_empty() {
            write!(f, " or {}", self.keywords.join("/"))?;
        }
        Ok(())
    }
}

/// Whether an AI prompt parameter may appear without prompt text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptRequirement {
    Required,
    /// `true` emits the bare operation code.
    Optional,
}

/// How a parameter's value is validated and encoded.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ValueType {
    /// Literal decimal within range.
    Number(NumberRange),
    /// Fraction with `0 < v <= 1`.
    Percentage,
    /// `code-<value>` where value is one of the set.
    Enum(&'static [&'static str]),
    /// A number within range, a keyword, or an expression passed through verbatim.
    ArithmeticExpression(NumberRange),
    /// Free text routed through the prompt encoder.
    Prompt(PromptRequirement),
    /// Bare code, no value.
    Flag,
    /// Hex `RRGGBB` / `RRGGBBAA` or one of the keywords.
    Color(&'static [&'static str]),
    /// `<w>-<h>` or an expression.
    AspectRatio,
    /// `true` emits the bare code (or `code-<flag_value>`); a number emits `code-<n>`.
    /// Zero counts as `true` when the range admits it.
    FlagOrNumber {
        range: NumberRange,
        flag_value: Option<&'static str>,
    },
    /// Positional values joined by a separator, e.g. `b-5_FF0000`.
    Tuple(Tuple),
    /// A built-in font name or a custom font file path.
    Font(&'static [&'static str]),
    /// One to four positive sides (`10`, `10_20_30_40`) or an expression.
    Padding,
}

/// One position of a [`Tuple`] value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Element {
    Number(NumberRange),
    /// Hex colour, same rules as [`ValueType::Color`] without keywords.
    Color,
}

/// Positional compound value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tuple {
    /// Emitted in front of the joined elements (`p-` for perspective distortion).
    pub prefix: &'static str,
    pub separator: char,
    pub elements: &'static [Element],
    /// Leading elements that must be present; the rest may be omitted.
    pub required: usize,
}

impl Tuple {
    pub const fn new(separator: char, elements: &'static [Element]) -> Self {
        Self {
            prefix: "",
            separator,
            elements,
            required: elements.len(),
        }
    }

    pub const fn prefixed(mut self, prefix: &'static str) -> Self {
        self.prefix = prefix;
        self
    }

    pub const fn min_required(mut self, required: usize) -> Self {
        self.required = required;
        self
    }
}

/// A parameter that must (or must not) be present, matched by wire code.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Companion {
    pub code: &'static str,
    /// Accepted companion values; empty means any value.
    pub values: &'static [&'static str],
}

impl Companion {
    pub const fn code(code: &'static str) -> Self {
        Self { code, values: &[] }
    }

    pub const fn one_of(code: &'static str, values: &'static [&'static str]) -> Self {
        Self { code, values }
    }
}

impl fmt::Display for Companion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.values {
            [] => f.write_str(self.code),
            [one] => write!(f, "{}-{}", self.code, one),
            many => write!(f, "{}-{{{}}}", self.code, many.join("|")),
        }
    }
}

/// "When this parameter's value is one of `when`, all `companions` must be present."
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Requirement {
    /// Values of the owning parameter that trigger the rule; empty means always.
    pub when: &'static [&'static str],
    pub companions: &'static [Companion],
}

impl Requirement {
    pub const fn always(companions: &'static [Companion]) -> Self {
        Self {
            when: &[],
            companions,
        }
    }

    pub const fn when(when: &'static [&'static str], companions: &'static [Companion]) -> Self {
        Self { when, companions }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    /// Silently drop the owning parameter.
    DropThis,
    /// Fail with `ConflictingParameters`.
    Reject,
}

/// Triggered when every companion in `with_all` is present.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Conflict {
    pub with_all: &'static [Companion],
    pub resolution: Resolution,
}

impl Conflict {
    pub const fn reject(with_all: &'static [Companion]) -> Self {
        Self {
            with_all,
            resolution: Resolution::Reject,
        }
    }

    pub const fn drop_this(with_all: &'static [Companion]) -> Self {
        Self {
            with_all,
            resolution: Resolution::DropThis,
        }
    }
}

/// Immutable description of one transformation parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParameterSpec {
    /// Canonical long name (`width`).
    pub name: &'static str,
    /// Wire token (`w`, `e-bgremove`).
    pub code: &'static str,
    /// Extra lookup names, usually the wire code.
    pub aliases: &'static [&'static str],
    pub value_type: ValueType,
    pub required_with: &'static [Requirement],
    pub conflicts_with: &'static [Conflict],
    /// Consumes extension units; at most one per step.
    pub is_ai_operation: bool,
    /// AI operation usable inside an overlay layer.
    pub layer_allowed: bool,
    /// Parent parameter this one folds into (`az` into `e-dropshadow`).
    pub modifier_of: Option<&'static str>,
    /// Server-side default, recorded for callers; never emitted implicitly.
    pub default_value: Option<f64>,
    /// Upper bound on source resolution for this operation.
    pub max_input_megapixels: Option<f64>,
    /// Belongs in the URL path, never in a `tr` chain.
    pub path_only: bool,
    pub description: &'static str,
}

impl ParameterSpec {
    pub const fn new(name: &'static str, code: &'static str, value_type: ValueType) -> Self {
        Self {
            name,
            code,
            aliases: &[],
            value_type,
            required_with: &[],
            conflicts_with: &[],
            is_ai_operation: false,
            layer_allowed: false,
            modifier_of: None,
            default_value: None,
            max_input_megapixels: None,
            path_only: false,
            description: "",
        }
    }

    pub const fn aliases(mut self, aliases: &'static [&'static str]) -> Self {
        self.aliases = aliases;
        self
    }

    pub const fn requires(mut self, required_with: &'static [Requirement]) -> Self {
        self.required_with = required_with;
        self
    }

    pub const fn conflicts(mut self, conflicts_with: &'static [Conflict]) -> Self {
        self.conflicts_with = conflicts_with;
        self
    }

    /// Mark as an AI operation.
    pub const fn ai(mut self) -> Self {
        self.is_ai_operation = true;
        self
    }

    pub const fn in_layers(mut self) -> Self {
        self.layer_allowed = true;
        self
    }

    pub const fn modifies(mut self, parent: &'static str) -> Self {
        self.modifier_of = Some(parent);
        self
    }

    pub const fn default_value(mut self, value: f64) -> Self {
        self.default_value = Some(value);
        self
    }

    pub const fn max_megapixels(mut self, limit: f64) -> Self {
        self.max_input_megapixels = Some(limit);
        self
    }

    pub const fn path_only(mut self) -> Self {
        self.path_only = true;
        self
    }

    pub const fn describe(mut self, description: &'static str) -> Self {
        self.description = description;
        self
    }

    /// Enumerated values, when the parameter is an enum.
    pub fn allowed_values(&self) -> Option<&'static [&'static str]> {
        match self.value_type {
            ValueType::Enum(values) | ValueType::Font(values) => Some(values),
            _ => None,
        }
    }
}
