//! Arithmetic dimension expressions (`iw_div_2`, `ih_mul_0.5_sub_10`).
//!
//! Only the syntax is checked. Expressions are never evaluated locally; the
//! CDN evaluates them against the real asset, so `iw_div_0` is accepted here.

use std::fmt;

use regex::Regex;

use crate::error::TransformError;

lazy_static::lazy_static! {
    static ref OPERAND_NUMBER: Regex = Regex::new(r"^[0-9]+(?:\.[0-9]+)?$").expect("valid regex");
}

/// Dimension variables the CDN resolves at request time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DimensionVar {
    InputWidth,
    InputHeight,
    InputAspectRatio,
    InputDuration,
    CurrentWidth,
    CurrentHeight,
    CurrentAspectRatio,
    BaseWidth,
    BaseHeight,
    BaseAspectRatio,
    BaseDuration,
}

impl DimensionVar {
    pub const ALL: [DimensionVar; 11] = [
        Self::InputWidth,
        Self::InputHeight,
        Self::InputAspectRatio,
        Self::InputDuration,
        Self::CurrentWidth,
        Self::CurrentHeight,
        Self::CurrentAspectRatio,
        Self::BaseWidth,
        Self::BaseHeight,
        Self::BaseAspectRatio,
        Self::BaseDuration,
    ];

    pub const fn code(self) -> &'static str {
        match self {
            Self::InputWidth => "iw",
            Self::InputHeight => "ih",
            Self::InputAspectRatio => "iar",
            Self::InputDuration => "idu",
            Self::CurrentWidth => "cw",
            Self::CurrentHeight => "ch",
            Self::CurrentAspectRatio => "car",
            Self::BaseWidth => "bw",
            Self::BaseHeight => "bh",
            Self::BaseAspectRatio => "bar",
            Self::BaseDuration => "bdu",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.code() == code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Add,
    Sub,
    Mul,
    Div,
}

impl Operator {
    pub const fn code(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Sub => "sub",
            Self::Mul => "mul",
            Self::Div => "div",
        }
    }

    fn from_code(code: &str) -> Option<Self> {
        match code {
            "add" => Some(Self::Add),
            "sub" => Some(Self::Sub),
            "mul" => Some(Self::Mul),
            "div" => Some(Self::Div),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    Var(DimensionVar),
    /// Literal kept verbatim so the wire text matches the input.
    Number(String),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Var(v) => f.write_str(v.code()),
            Self::Number(n) => f.write_str(n),
        }
    }
}

/// A syntactically valid expression: a variable followed by `_op_operand` segments.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub head: DimensionVar,
    pub segments: Vec<(Operator, Operand)>,
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.head.code())?;
        for (op, operand) in &self.segments {
            write!(f, "_{}_{}", op.code(), operand)?;
        }
        Ok(())
    }
}

impl Expression {
    /// Parse `input`, describing the first malformed token on failure.
    pub fn parse(input: &str) -> Result<Self, String> {
        let mut tokens = input.split('_');
        let head = tokens.next().unwrap_or_default();
        let head = DimensionVar::from_code(head)
            .ok_or_else(|| format!("expression must start with a dimension variable, got `{head}`"))?;

        let mut segments = Vec::new();
        while let Some(op) = tokens.next() {
            let op = Operator::from_code(op)
                .ok_or_else(|| format!("unknown operator `{op}` (expected add, sub, mul or div)"))?;
            let operand = tokens
                .next()
                .ok_or_else(|| format!("operator `{}` has no operand", op.code()))?;
            let operand = match DimensionVar::from_code(operand) {
                Some(var) => Operand::Var(var),
                None if OPERAND_NUMBER.is_match(operand) => Operand::Number(operand.to_string()),
                None => return Err(format!("invalid operand `{operand}`")),
            };
            segments.push((op, operand));
        }

        Ok(Self { head, segments })
    }
}

/// Validate `value` as an expression for `parameter`.
pub fn validate(parameter: &str, value: &str) -> Result<Expression, TransformError> {
    Expression::parse(value).map_err(|reason| TransformError::invalid(parameter, reason))
}

/// Cheap check used to route text values: does this look like an attempt at
/// an expression rather than a keyword?
pub fn looks_like_expression(value: &str) -> bool {
    let head = value.split('_').next().unwrap_or_default();
    DimensionVar::from_code(head).is_some()
}
