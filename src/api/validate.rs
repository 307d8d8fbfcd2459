use serde_json::Value;

use super::{SynthesisRequest, SUPPORTED_FORMAT};
use crate::config::Config;
use crate::error::ValidationError;

/// Turn a parsed JSON body into a [`SynthesisRequest`].
///
/// Checks run in a fixed order (body, text, length, voice, format) and the
/// first failure is returned.
pub fn validate(body: &Value, config: &Config) -> Result<SynthesisRequest, ValidationError> {
    let fields = match body {
        Value::Object(fields) if !fields.is_empty() => fields,
        _ => return Err(ValidationError::MissingBody),
    };

    let text = match fields.get("text") {
        Some(Value::String(text)) => text.trim(),
        _ => return Err(ValidationError::MissingText),
    };
    if text.is_empty() {
        return Err(ValidationError::MissingText);
    }
    if text.chars().count() > config.max_text_length {
        return Err(ValidationError::TextTooLong {
            max: config.max_text_length,
        });
    }

    let voice = match fields.get("voice") {
        None | Some(Value::Null) => config.default_voice.as_str(),
        Some(Value::String(voice)) if config.is_allowed_voice(voice) => voice.as_str(),
        Some(_) => {
            return Err(ValidationError::InvalidVoice {
                allowed: config.allowed_voices.join(", "),
            })
        }
    };

    match fields.get("format") {
        None | Some(Value::Null) => {}
        Some(Value::String(format))
            if format.is_empty() || format.eq_ignore_ascii_case(SUPPORTED_FORMAT) => {}
        Some(_) => return Err(ValidationError::UnsupportedFormat),
    }

    Ok(SynthesisRequest {
        text: text.to_string(),
        voice: voice.to_string(),
    })
}
