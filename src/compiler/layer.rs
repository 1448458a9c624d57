//! Overlay layers.
//!
//! A layer is emitted as a single step token:
//! `l-image,i-<path>[,lx-..][,ly-..][,lfo-..][,<inner chain>],l-end` for images and
//! `l-text,i-<text>|ie-<base64>[,lx-..][,ly-..][,lfo-..][,<styling>],l-end` for text.

use std::collections::HashMap;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;

use super::{CompileOptions, chain::ChainCompiler, step};
use crate::error::TransformError;
use crate::params::{Layer, LayerSource, ParamValue, PromptEncoder};
use crate::registry::ParameterRegistry;

pub const LAYER_START: &str = "l-image";
pub const TEXT_LAYER_START: &str = "l-text";
pub const LAYER_END: &str = "l-end";

/// Longest text the CDN renders from `i-`.
pub const MAX_PLAIN_TEXT_LEN: usize = 2000;
/// Longest base64 payload the CDN renders from `ie-`.
pub const MAX_ENCODED_TEXT_LEN: usize = 2500;

pub(crate) fn encode_layer(
    registry: &ParameterRegistry,
    layer: &Layer,
) -> Result<String, TransformError> {
    let mut tokens = match &layer.source {
        LayerSource::Image(input) => {
            if layer.style.is_some() {
                return Err(TransformError::invalid(
                    "layer_style",
                    "text styling only applies to text layers",
                ));
            }
            vec![LAYER_START.to_string(), format!("i-{}", input_path(input)?)]
        }
        LayerSource::Text(text) => {
            if layer.transformation.is_some() {
                return Err(TransformError::invalid(
                    "layer_transformation",
                    "text layers take styling, not a transformation chain",
                ));
            }
            vec![TEXT_LAYER_START.to_string(), text_input(text)?]
        }
    };

    let position = [
        ("layer_x", layer.x.clone()),
        ("layer_y", layer.y.clone()),
        ("layer_focus", layer.focus.clone().map(ParamValue::Text)),
    ];
    let prompts = PromptEncoder::new();
    for (name, value) in position {
        let Some(value) = value else { continue };
        let spec = registry.layer_param(name)?;
        tokens.push(token(spec.code, step::encode_value(&prompts, spec, &value)?));
    }

    if let Some(style) = &layer.style {
        let mut seen = HashMap::new();
        for (name, value) in style.params() {
            let spec = registry.text_param(name)?;
            if value.is_disabled() {
                continue;
            }
            if let Some(earlier) = seen.insert(spec.code, name) {
                return Err(TransformError::ConflictingParameters {
                    parameter: name.to_string(),
                    other: earlier.to_string(),
                });
            }
            tokens.push(token(spec.code, step::encode_value(&prompts, spec, value)?));
        }
    }

    if let Some(chain) = &layer.transformation {
        let inner = ChainCompiler::new(registry).compile(chain, &CompileOptions::for_layer())?;
        tokens.push(inner);
    }

    tokens.push(LAYER_END.to_string());
    Ok(tokens.join(","))
}

fn token(code: &str, value: Option<String>) -> String {
    match value {
        Some(v) => format!("{code}-{v}"),
        None => code.to_string(),
    }
}

/// `i-<text>` when the text is plain enough for the path, `ie-<base64>` otherwise.
fn text_input(text: &str) -> Result<String, TransformError> {
    if text.trim().is_empty() {
        return Err(TransformError::invalid("layer_text", "overlay text must not be empty"));
    }
    let plain = text
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || matches!(c, '@' | '-' | '_'));
    if plain {
        if text.len() > MAX_PLAIN_TEXT_LEN {
            return Err(too_long(text.len(), MAX_PLAIN_TEXT_LEN));
        }
        return Ok(format!("i-{text}"));
    }
    let encoded = STANDARD.encode(text.as_bytes());
    if encoded.len() > MAX_ENCODED_TEXT_LEN {
        return Err(too_long(encoded.len(), MAX_ENCODED_TEXT_LEN));
    }
    Ok(format!("ie-{}", urlencoding::encode(&encoded)))
}

fn too_long(len: usize, max: usize) -> TransformError {
    TransformError::out_of_range("layer_text", len.to_string(), format!("at most {max} characters"))
}

/// Overlay paths end up in the URL path unescaped, so only a conservative
/// character set is accepted.
fn input_path(input: &str) -> Result<String, TransformError> {
    let trimmed = input.trim().trim_start_matches('/');
    if trimmed.is_empty() {
        return Err(TransformError::invalid("layer_input", "overlay path must not be empty"));
    }
    if let Some(bad) = trimmed
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '/' | '.' | '-' | '_' | '@')))
    {
        return Err(TransformError::invalid(
            "layer_input",
            format!("overlay path `{trimmed}` contains reserved character `{bad}`"),
        ));
    }
    Ok(trimmed.replace('/', step::NESTED_PATH_SEP))
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::{TransformationChain, TransformationStep};
    use crate::registry::global_registry;

    #[test]
    fn plain_layer() {
        let layer = Layer::image("/logos/brand/logo.png").with_position(10, -20);
        assert_eq!(
            encode_layer(global_registry(), &layer).unwrap(),
            "l-image,i-logos@@brand@@logo.png,lx-10,ly-N20,l-end"
        );
    }

    #[test]
    fn layer_with_focus_and_transformation() {
        let layer = Layer::image("badge.png")
            .with_focus("top_right")
            .with_transformation(
                TransformationChain::new()
                    .then(TransformationStep::new().with("width", 100))
                    .then(TransformationStep::new().with("remove_background", true)),
            );
        assert_eq!(
            encode_layer(global_registry(), &layer).unwrap(),
            "l-image,i-badge.png,lfo-top_right,w-100:e-bgremove,l-end"
        );
    }

    #[test]
    fn layer_rejects_disallowed_ai() {
        let layer = Layer::image("a.png")
            .with_transformation(TransformationStep::new().with("change_background", "beach"));
        assert!(matches!(
            encode_layer(global_registry(), &layer).unwrap_err(),
            TransformError::DisallowedInLayer { .. }
        ));
    }

    #[test]
    fn layer_rejects_bad_focus_and_path() {
        let layer = Layer::image("a.png").with_focus("face");
        assert!(matches!(
            encode_layer(global_registry(), &layer).unwrap_err(),
            TransformError::OutOfRange { .. }
        ));
        assert!(encode_layer(global_registry(), &Layer::image(" ")).is_err());
    }

    #[test]
    fn overlay_paths_reject_url_syntax() {
        for path in ["my logo.png", "a.png?v=2", "a&b.png", "a,b.png", "a:b.png", "a#b.png", "50%.png"] {
            let err = encode_layer(global_registry(), &Layer::image(path)).unwrap_err();
            assert!(
                matches!(&err, TransformError::InvalidValueSyntax { parameter, .. } if parameter == "layer_input"),
                "{path}: {err:?}"
            );
        }
        assert_eq!(
            encode_layer(global_registry(), &Layer::image("brand/logo-v2_final.png")).unwrap(),
            "l-image,i-brand@@logo-v2_final.png,l-end"
        );
    }

    #[test]
    fn plain_text_layer_with_styling() {
        let layer = Layer::text("Sale")
            .with_position(20, "bh_sub_80")
            .with_style(
                TransformationStep::new()
                    .with("font_size", 48)
                    .with("font_family", "Roboto")
                    .with("color", "FFFFFF")
                    .with("padding", "10_20")
                    .with("typography", "b")
                    .with("background", "00000080"),
            );
        assert_eq!(
            encode_layer(global_registry(), &layer).unwrap(),
            "l-text,i-Sale,lx-20,ly-bh_sub_80,fs-48,ff-Roboto,co-FFFFFF,pa-10_20,tg-b,bg-00000080,l-end"
        );
    }

    #[test]
    fn text_with_spaces_is_base64_encoded() {
        let layer = Layer::text("Hi there!");
        // base64("Hi there!") = "SGkgdGhlcmUh"
        assert_eq!(
            encode_layer(global_registry(), &layer).unwrap(),
            "l-text,ie-SGkgdGhlcmUh,l-end"
        );
        // padding and `+`/`/` are percent-encoded
        let layer = Layer::text("a b");
        assert_eq!(
            encode_layer(global_registry(), &layer).unwrap(),
            "l-text,ie-YSBi,l-end"
        );
        let layer = Layer::text("ab?");
        assert_eq!(
            encode_layer(global_registry(), &layer).unwrap(),
            "l-text,ie-YWI%2F,l-end"
        );
    }

    #[test]
    fn text_styling_accepts_codes_and_custom_fonts() {
        let layer = Layer::text("Hello").with_style(
            TransformationStep::new()
                .with("fs", "bh_div_10")
                .with("ff", "/fonts/brand/Inter-Bold.ttf")
                .with("al", 5)
                .with("rt", -15)
                .with("lm", "multiply"),
        );
        assert_eq!(
            encode_layer(global_registry(), &layer).unwrap(),
            "l-text,i-Hello,fs-bh_div_10,ff-fonts@@brand@@Inter-Bold.ttf,al-5,rt-N15,lm-multiply,l-end"
        );
    }

    #[test]
    fn text_styling_is_validated() {
        let cases = [
            TransformationStep::new().with("alpha", 12),
            TransformationStep::new().with("alpha", 2.5),
            TransformationStep::new().with("font_family", "Comic Sans"),
            TransformationStep::new().with("typography", "bold"),
            TransformationStep::new().with("padding", "10_0"),
            TransformationStep::new().with("layer_mode", "screen"),
        ];
        for style in cases {
            let layer = Layer::text("x").with_style(style.clone());
            assert!(encode_layer(global_registry(), &layer).is_err(), "{style:?}");
        }

        let unknown = Layer::text("x").with_style(TransformationStep::new().with("width_px", 4));
        assert_eq!(
            encode_layer(global_registry(), &unknown).unwrap_err(),
            TransformError::UnknownParameter("width_px".into())
        );

        let twice = Layer::text("x")
            .with_style(TransformationStep::new().with("font_size", 10).with("fs", 12));
        assert_eq!(
            encode_layer(global_registry(), &twice).unwrap_err(),
            TransformError::ConflictingParameters {
                parameter: "fs".into(),
                other: "font_size".into(),
            }
        );
    }

    #[test]
    fn text_layer_kind_mismatches_are_rejected() {
        let styled_image =
            Layer::image("a.png").with_style(TransformationStep::new().with("font_size", 10));
        assert!(encode_layer(global_registry(), &styled_image).is_err());

        let transformed_text =
            Layer::text("a").with_transformation(TransformationStep::new().with("width", 10));
        assert!(encode_layer(global_registry(), &transformed_text).is_err());

        assert!(encode_layer(global_registry(), &Layer::text("  ")).is_err());
    }

    #[test]
    fn oversized_text_is_rejected() {
        let plain = "a".repeat(MAX_PLAIN_TEXT_LEN + 1);
        assert!(matches!(
            encode_layer(global_registry(), &Layer::text(plain)).unwrap_err(),
            TransformError::OutOfRange { .. }
        ));
        assert!(encode_layer(global_registry(), &Layer::text("a".repeat(MAX_PLAIN_TEXT_LEN))).is_ok());

        // 1900 bytes of spaced text become 2536 base64 characters
        let spaced = "a ".repeat(950);
        assert!(matches!(
            encode_layer(global_registry(), &Layer::text(spaced)).unwrap_err(),
            TransformError::OutOfRange { .. }
        ));
    }
}
