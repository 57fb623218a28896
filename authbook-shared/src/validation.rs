use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const REQUIRED: &str = "This field is required.";
pub const BLANK: &str = "This field may not be blank.";

pub fn max_length_message(max: usize) -> String {
    format!("Ensure this field has no more than {} characters.", max)
}

/// Validation failures keyed by field name, serialized as
/// `{"field": ["message", ...]}`.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: impl Into<String>) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(|m| m.as_slice())
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(|k| k.as_str())
    }

    /// `Ok(value)` when nothing was recorded, otherwise the collected errors.
    pub fn into_result<T>(self, value: T) -> Result<T, FieldErrors> {
        if self.is_empty() { Ok(value) } else { Err(self) }
    }
}

impl std::fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self
            .0
            .iter()
            .map(|(field, messages)| format!("{}: {}", field, messages.join(" ")))
            .collect();
        write!(f, "{}", parts.join("; "))
    }
}

/// Checks a required string field. Returns the trimmed value when it is
/// present and not blank, recording the failure otherwise.
pub fn require_str<'a>(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&'a str>,
    max_length: usize,
) -> Option<&'a str> {
    match value.map(str::trim) {
        None => {
            errors.add(field, REQUIRED);
            None
        }
        Some("") => {
            errors.add(field, BLANK);
            None
        }
        Some(v) if v.chars().count() > max_length => {
            errors.add(field, max_length_message(max_length));
            None
        }
        Some(v) => Some(v),
    }
}

/// Checks an optional string field that accepts null and blank. Blank and
/// whitespace-only values normalize to `None`; anything else is kept verbatim.
pub fn optional_str(
    errors: &mut FieldErrors,
    field: &str,
    value: Option<&str>,
    max_length: usize,
) -> Option<String> {
    let value = value.filter(|v| !v.trim().is_empty())?;
    if value.chars().count() > max_length {
        errors.add(field, max_length_message(max_length));
        return None;
    }
    Some(value.to_string())
}
