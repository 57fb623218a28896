use authbook_shared::validation::{FieldErrors, REQUIRED};
use axum::Json;
use axum::extract::rejection::JsonRejection;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::response::ServerError;

pub const NON_FIELD_ERRORS: &str = "non_field_errors";
pub const NOT_A_STRING: &str = "Not a valid string.";
pub const NOT_NULL: &str = "This field may not be null.";

/// JSON shape accepted for one body field.
#[derive(Debug, Clone, Copy)]
pub enum FieldKind {
    /// A string or `null`.
    Text,
    /// A required string out of a fixed set.
    Choice(&'static [&'static str]),
}

/// Request bodies that list their fields, so a value of the wrong JSON type
/// is reported under the field's own name instead of failing the whole body.
pub trait BodyFields: DeserializeOwned {
    const FIELDS: &'static [(&'static str, FieldKind)];
}

/// Unwraps a JSON body extraction. Syntax and content-type failures become a
/// 400 with the extractor's message.
pub fn extract_json<T>(result: Result<Json<T>, JsonRejection>) -> Result<T, ServerError> {
    result.map(|Json(v)| v).map_err(|rejection| {
        debug!("JSON body rejected: {}", rejection.body_text());
        ServerError::from(rejection)
    })
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

fn check_field(errors: &mut FieldErrors, field: &str, kind: FieldKind, value: Option<&Value>) {
    match (kind, value) {
        (FieldKind::Text, None | Some(Value::Null | Value::String(_))) => {}
        (FieldKind::Text, Some(_)) => errors.add(field, NOT_A_STRING),
        (FieldKind::Choice(_), None) => errors.add(field, REQUIRED),
        (FieldKind::Choice(_), Some(Value::Null)) => errors.add(field, NOT_NULL),
        (FieldKind::Choice(choices), Some(Value::String(s))) if choices.contains(&s.as_str()) => {}
        (FieldKind::Choice(_), Some(Value::String(s))) => {
            errors.add(field, format!("\"{}\" is not a valid choice.", s))
        }
        (FieldKind::Choice(_), Some(other)) => {
            errors.add(field, format!("\"{}\" is not a valid choice.", other))
        }
    }
}

/// Decodes one JSON object into `T`, collecting type errors per field.
pub fn decode_object<T: BodyFields>(value: Value) -> Result<T, FieldErrors> {
    let map = match value {
        Value::Object(map) => map,
        other => {
            return Err(FieldErrors::single(
                NON_FIELD_ERRORS,
                format!(
                    "Invalid data. Expected a dictionary, but got {}.",
                    type_name(&other)
                ),
            ));
        }
    };

    let mut errors = FieldErrors::new();
    for (field, kind) in T::FIELDS {
        check_field(&mut errors, field, *kind, map.get(*field));
    }
    if !errors.is_empty() {
        return Err(errors);
    }

    serde_json::from_value(Value::Object(map))
        .map_err(|err| FieldErrors::single(NON_FIELD_ERRORS, err.to_string()))
}

/// Decodes a JSON body into `T`, reporting malformed fields as a 400 with
/// the usual field-error payload.
pub fn decode_body<T: BodyFields>(
    result: Result<Json<Value>, JsonRejection>,
) -> Result<T, ServerError> {
    let value = extract_json(result)?;
    decode_object(value).map_err(ServerError::Validation)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Deserialize)]
    struct Paint {
        #[serde(default)]
        name: Option<String>,
        color: String,
    }

    impl BodyFields for Paint {
        const FIELDS: &'static [(&'static str, FieldKind)] = &[
            ("name", FieldKind::Text),
            ("color", FieldKind::Choice(&["red", "blue"])),
        ];
    }

    #[test]
    fn test_decode_object() {
        let body: Paint = decode_object(json!({"name": "a", "color": "red"})).unwrap();
        assert_eq!(body.name.as_deref(), Some("a"));
        assert_eq!(body.color, "red");

        let body: Paint = decode_object(json!({"name": null, "color": "blue"})).unwrap();
        assert!(body.name.is_none());
    }

    #[test]
    fn test_wrong_types_are_field_errors() {
        let errors = decode_object::<Paint>(json!({"name": 5, "color": "green"})).unwrap_err();
        assert_eq!(errors.get("name").unwrap(), [NOT_A_STRING]);
        assert_eq!(
            errors.get("color").unwrap(),
            ["\"green\" is not a valid choice.".to_string()]
        );

        let errors = decode_object::<Paint>(json!({"name": "a"})).unwrap_err();
        assert_eq!(errors.get("color").unwrap(), [REQUIRED]);
    }

    #[test]
    fn test_non_object_body() {
        let errors = decode_object::<Paint>(json!("text")).unwrap_err();
        assert_eq!(
            errors.get(NON_FIELD_ERRORS).unwrap(),
            ["Invalid data. Expected a dictionary, but got str.".to_string()]
        );
    }
}
