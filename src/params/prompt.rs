//! Prompt encoding for AI operations.
//!
//! A prompt becomes either `prompt-<literal>` or `prompte-<base64>`. Text that
//! contains a character the wire grammar reserves (`,` `:` `/` `%`) is always
//! Base64-encoded; everything else is emitted literally with percent-escaping.
//! The choice depends only on the text, so it is reproducible.

use base64::Engine as _;
use base64::engine::general_purpose::URL_SAFE;

use crate::error::TransformError;

/// Characters that would break the chain/step/path grammar if left literal.
pub const RESERVED_CHARS: [char; 4] = [',', ':', '/', '%'];

/// How a prompt ended up on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PromptVariant {
    /// `prompt-<percent-escaped text>`
    Literal,
    /// `prompte-<url-safe base64>`
    Base64,
}

impl PromptVariant {
    /// Parameter suffix that tags the variant on the wire.
    pub const fn suffix(self) -> &'static str {
        match self {
            Self::Literal => "prompt",
            Self::Base64 => "prompte",
        }
    }
}

/// Caller preference for [`PromptEncoder::encode_with`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PromptEncoding {
    /// Literal unless the text contains a reserved character.
    #[default]
    Auto,
    /// Always Base64.
    Base64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedPrompt {
    pub variant: PromptVariant,
    pub token: String,
}

impl EncodedPrompt {
    /// `prompt-...` / `prompte-...` fragment appended to an operation code.
    pub fn fragment(&self) -> String {
        format!("{}-{}", self.variant.suffix(), self.token)
    }
}

/// Stateless prompt encoder.
#[derive(Debug, Clone, Copy, Default)]
pub struct PromptEncoder;

impl PromptEncoder {
    pub fn new() -> Self {
        Self
    }

    /// Encode `text` picking the variant automatically.
    pub fn encode(&self, text: &str) -> Result<EncodedPrompt, TransformError> {
        self.encode_with(text, PromptEncoding::Auto)
    }

    /// Encode `text` as given. Surrounding whitespace is kept, so decoding
    /// returns the exact input; whitespace-only prompts are rejected.
    pub fn encode_with(
        &self,
        text: &str,
        encoding: PromptEncoding,
    ) -> Result<EncodedPrompt, TransformError> {
        if text.trim().is_empty() {
            return Err(TransformError::invalid("prompt", "prompt must not be empty"));
        }

        let variant = match encoding {
            PromptEncoding::Base64 => PromptVariant::Base64,
            PromptEncoding::Auto if text.contains(RESERVED_CHARS) => PromptVariant::Base64,
            PromptEncoding::Auto => PromptVariant::Literal,
        };

        let token = match variant {
            PromptVariant::Literal => urlencoding::encode(text).into_owned(),
            PromptVariant::Base64 => URL_SAFE.encode(text.as_bytes()),
        };

        Ok(EncodedPrompt { variant, token })
    }

    /// Invert [`encode`](Self::encode).
    pub fn decode(&self, variant: PromptVariant, token: &str) -> Result<String, TransformError> {
        match variant {
            PromptVariant::Literal => urlencoding::decode(token)
                .map(|s| s.into_owned())
                .map_err(|e| TransformError::invalid("prompt", e.to_string())),
            PromptVariant::Base64 => {
                let bytes = URL_SAFE
                    .decode(token)
                    .map_err(|e| TransformError::invalid("prompt", e.to_string()))?;
                String::from_utf8(bytes).map_err(|e| TransformError::invalid("prompt", e.to_string()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_stays_literal() {
        let encoded = PromptEncoder::new().encode("racing track").unwrap();
        assert_eq!(encoded.variant, PromptVariant::Literal);
        assert_eq!(encoded.token, "racing%20track");
        assert_eq!(encoded.fragment(), "prompt-racing%20track");
    }

    #[test]
    fn reserved_characters_force_base64() {
        let encoder = PromptEncoder::new();
        for text in ["snow, mountains", "time: noon", "a/b", "100% cotton"] {
            let encoded = encoder.encode(text).unwrap();
            assert_eq!(encoded.variant, PromptVariant::Base64, "{text}");
            assert_eq!(encoder.decode(encoded.variant, &encoded.token).unwrap(), text);
        }
    }

    #[test]
    fn non_ascii_is_percent_escaped() {
        let encoded = PromptEncoder::new().encode("café au lait").unwrap();
        assert_eq!(encoded.variant, PromptVariant::Literal);
        assert!(encoded.token.is_ascii());
        assert_eq!(
            PromptEncoder::new().decode(PromptVariant::Literal, &encoded.token).unwrap(),
            "café au lait"
        );
    }

    #[test]
    fn forced_base64_round_trips() {
        let encoder = PromptEncoder::new();
        let encoded = encoder.encode_with("racing track", PromptEncoding::Base64).unwrap();
        assert_eq!(encoded.variant, PromptVariant::Base64);
        assert_eq!(encoded.token, "cmFjaW5nIHRyYWNr");
        assert_eq!(encoder.decode(encoded.variant, &encoded.token).unwrap(), "racing track");
    }

    #[test]
    fn empty_prompt_is_rejected() {
        assert!(PromptEncoder::new().encode("   ").is_err());
    }

    #[test]
    fn surrounding_whitespace_survives_the_round_trip() {
        let encoder = PromptEncoder::new();
        let encoded = encoder.encode(" snow, hills ").unwrap();
        assert_eq!(encoded.variant, PromptVariant::Base64);
        assert_eq!(encoder.decode(encoded.variant, &encoded.token).unwrap(), " snow, hills ");

        let literal = encoder.encode(" snow ").unwrap();
        assert_eq!(literal.token, "%20snow%20");
        assert_eq!(encoder.decode(literal.variant, &literal.token).unwrap(), " snow ");
    }

    #[test]
    fn encoding_is_deterministic() {
        let encoder = PromptEncoder::new();
        assert_eq!(encoder.encode("a, b").unwrap(), encoder.encode("a, b").unwrap());
    }
}
