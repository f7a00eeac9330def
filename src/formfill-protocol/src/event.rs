//! Decoded event model.

use serde_json::{Map, Value};

/// One decoded event from the event source.
///
/// Events are immutable once decoded and consumed exactly once by the router.
/// `Fill` keeps the raw field id: validating it against [`crate::FieldId`] is
/// the router's job, so that an unknown id can be reported with its name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Free-text progress message, shown verbatim.
    Log { message: String },
    /// Instruction to type `value` into `field`.
    Fill { field: String, value: String },
    /// Well-formed record with a discriminant this client does not handle.
    Unknown { kind: String },
}

impl Event {
    /// Short name of the event kind, as found in the `type` key.
    pub fn kind(&self) -> &str {
        match self {
            Self::Log { .. } => "log",
            Self::Fill { .. } => "fill",
            Self::Unknown { kind } => kind,
        }
    }

    /// Decode one JSON payload (without the record prefix).
    pub fn from_json(payload: &str) -> Result<Self, DecodeError> {
        let value: Value = serde_json::from_str(payload)?;
        let Value::Object(object) = value else {
            return Err(DecodeError::NotAnObject);
        };

        let kind = required_str(&object, "type")?;
        match kind {
            "log" => Ok(Self::Log {
                message: required_str(&object, "message")?.to_string(),
            }),
            "fill" => {
                let field = required_str(&object, "field")?.to_string();
                let value = object
                    .get("value")
                    .ok_or(DecodeError::MissingKey("value"))?;
                Ok(Self::Fill {
                    field,
                    value: scalar_to_string(value)?,
                })
            }
            other => Ok(Self::Unknown {
                kind: other.to_string(),
            }),
        }
    }
}

fn required_str<'a>(
    object: &'a Map<String, Value>,
    key: &'static str,
) -> Result<&'a str, DecodeError> {
    match object.get(key) {
        None => Err(DecodeError::MissingKey(key)),
        Some(Value::String(s)) => Ok(s.as_str()),
        Some(_) => Err(DecodeError::InvalidType {
            key,
            expected: "string",
        }),
    }
}

/// Coerce a scalar JSON value to the text that gets typed into the form.
fn scalar_to_string(value: &Value) -> Result<String, DecodeError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null | Value::Array(_) | Value::Object(_) => Err(DecodeError::InvalidType {
            key: "value",
            expected: "string, number or boolean",
        }),
    }
}

/// Structural decoding failure for a single record.
///
/// Always local to the record: the stream keeps going.
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("payload is not valid JSON: {0}")]
    Malformed(#[from] serde_json::Error),

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("missing required key `{0}`")]
    MissingKey(&'static str),

    #[error("key `{key}` must be a {expected}")]
    InvalidType {
        key: &'static str,
        expected: &'static str,
    },
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_decode_log() {
        let event = Event::from_json(r#"{"type":"log","message":"OCR開始"}"#).unwrap();
        assert_eq!(
            event,
            Event::Log {
                message: "OCR開始".to_string()
            }
        );
    }

    #[test]
    fn test_decode_fill_coerces_numbers() {
        let event = Event::from_json(r#"{"type":"fill","field":"total","value":132000}"#).unwrap();
        assert_eq!(
            event,
            Event::Fill {
                field: "total".to_string(),
                value: "132000".to_string()
            }
        );

        let event = Event::from_json(r#"{"type":"fill","field":"tax","value":9.5}"#).unwrap();
        assert_eq!(event.kind(), "fill");
        assert!(matches!(event, Event::Fill { value, .. } if value == "9.5"));
    }

    #[test]
    fn test_decode_fill_coerces_booleans() {
        let event = Event::from_json(r#"{"type":"fill","field":"tax","value":false}"#).unwrap();
        assert!(matches!(event, Event::Fill { value, .. } if value == "false"));
    }

    #[test]
    fn test_decode_keeps_unknown_field_ids() {
        let event = Event::from_json(r#"{"type":"fill","field":"bogus","value":"x"}"#).unwrap();
        assert!(matches!(event, Event::Fill { field, .. } if field == "bogus"));
    }

    #[test]
    fn test_decode_unknown_kind() {
        let event = Event::from_json(r#"{"type":"progress","pct":40}"#).unwrap();
        assert_eq!(
            event,
            Event::Unknown {
                kind: "progress".to_string()
            }
        );
    }

    #[test]
    fn test_decode_failures() {
        assert!(matches!(
            Event::from_json("{not json"),
            Err(DecodeError::Malformed(_))
        ));
        assert!(matches!(
            Event::from_json("[1, 2]"),
            Err(DecodeError::NotAnObject)
        ));
        assert!(matches!(
            Event::from_json(r#"{"message":"hi"}"#),
            Err(DecodeError::MissingKey("type"))
        ));
        assert!(matches!(
            Event::from_json(r#"{"type":"log"}"#),
            Err(DecodeError::MissingKey("message"))
        ));
        assert!(matches!(
            Event::from_json(r#"{"type":"fill","field":"tax"}"#),
            Err(DecodeError::MissingKey("value"))
        ));
        assert!(matches!(
            Event::from_json(r#"{"type":3}"#),
            Err(DecodeError::InvalidType { key: "type", .. })
        ));
        assert!(matches!(
            Event::from_json(r#"{"type":"fill","field":"tax","value":null}"#),
            Err(DecodeError::InvalidType { key: "value", .. })
        ));
        assert!(matches!(
            Event::from_json(r#"{"type":"fill","field":"tax","value":[1]}"#),
            Err(DecodeError::InvalidType { key: "value", .. })
        ));
    }
}
