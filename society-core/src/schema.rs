//! Payload parsing and validation.
//!
//! Shape errors (serde) and rule errors (`validator`) both come out as
//! `422 Unprocessable` with an `errors` object keyed by field path:
//! `{"flatDetails.floorIndex": ["is out of range"], "_schema": [...]}`.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use validator::{Validate, ValidationErrors, ValidationErrorsKind};

use crate::errors::SocietyError;

#[derive(Debug, Default)]
pub struct SchemaErrors {
    map: Map<String, Value>,
}

impl SchemaErrors {
    pub fn push_schema(&mut self, msg: impl Into<String>) {
        self.push_field("_schema", msg);
    }

    pub fn push_field(&mut self, field: &str, msg: impl Into<String>) {
        let msg = Value::String(msg.into());
        match self.map.get_mut(field) {
            Some(Value::Array(arr)) => arr.push(msg),
            _ => {
                self.map.insert(field.to_string(), Value::Array(vec![msg]));
            }
        }
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn into_unprocessable(self, message: &str) -> anyhow::Error {
        SocietyError::unprocessable(message)
            .with_errors(Value::Object(self.map))
            .into_anyhow()
    }
}

fn friendly_message(code: &str) -> Option<&'static str> {
    match code {
        "required" => Some("is required"),
        "email" => Some("must be a valid email"),
        "length" => Some("has invalid length"),
        "range" => Some("is out of range"),
        "url" => Some("must be a valid URL"),
        "blank" => Some("must not be blank"),
        _ => None,
    }
}

fn join_path(prefix: &str, field: &str) -> String {
    if prefix.is_empty() {
        field.to_string()
    } else {
        format!("{prefix}.{field}")
    }
}

fn push_validation_errors(out: &mut SchemaErrors, prefix: &str, errs: &ValidationErrors) {
    for (field, kind) in errs.errors() {
        let path = join_path(prefix, field);
        match kind {
            ValidationErrorsKind::Field(field_errors) => {
                for e in field_errors {
                    let msg = e
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .or_else(|| friendly_message(&e.code).map(str::to_string))
                        .unwrap_or_else(|| e.code.to_string());
                    out.push_field(&path, msg);
                }
            }
            ValidationErrorsKind::Struct(nested) => push_validation_errors(out, &path, nested),
            ValidationErrorsKind::List(items) => {
                for (idx, nested) in items {
                    push_validation_errors(out, &format!("{path}[{idx}]"), nested);
                }
            }
        }
    }
}

/// Run `validator` rules on an already-parsed payload.
pub fn validate<T: Validate>(data: &T, error_message: &str) -> anyhow::Result<()> {
    data.validate().map_err(|e| {
        let mut out = SchemaErrors::default();
        push_validation_errors(&mut out, "", &e);
        out.into_unprocessable(error_message)
    })
}

/// Deserialize a JSON payload, reporting shape errors as `422`.
pub fn parse<T: DeserializeOwned>(data: Value, error_message: &str) -> anyhow::Result<T> {
    serde_json::from_value(data).map_err(|e| {
        let mut out = SchemaErrors::default();
        out.push_schema(e.to_string());
        out.into_unprocessable(error_message)
    })
}
