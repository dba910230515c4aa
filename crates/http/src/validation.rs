//! Request payload validation.
//!
//! Payloads are checked in two passes. The first walks the raw JSON object
//! against a fixed field table and reports every missing or mistyped field.
//! The second runs the payload type's [`Validate`] rules once it has been
//! deserialized.

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use validator::{Validate, ValidationErrors};

use crate::error::AppError;

/// JSON type a field must carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    String,
    /// Whole number that fits in an `i32`
    Int32,
}

impl FieldKind {
    fn matches(self, value: &Value) -> bool {
        match self {
            FieldKind::String => value.is_string(),
            FieldKind::Int32 => value
                .as_i64()
                .is_some_and(|number| i32::try_from(number).is_ok()),
        }
    }

    fn expected(self) -> &'static str {
        match self {
            FieldKind::String => "expected string",
            FieldKind::Int32 => "expected integer",
        }
    }
}

/// One entry of a payload schema.
#[derive(Debug, Clone, Copy)]
pub struct FieldSpec {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
}

impl FieldSpec {
    pub const fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
        }
    }

    pub const fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
        }
    }
}

/// Fixed field table a request payload is checked against before deserialization.
pub trait PayloadSchema {
    const FIELDS: &'static [FieldSpec];
}

/// Check presence and JSON type of every declared field.
///
/// Returns one `{field, error}` detail per violation; an empty vector means the
/// payload has the right shape. `null` counts as absent. Undeclared fields are
/// ignored.
pub fn check_fields(payload: &Value, fields: &[FieldSpec]) -> Vec<Value> {
    let Some(object) = payload.as_object() else {
        return vec![json!({ "field": "$", "error": "expected object" })];
    };

    let mut details = Vec::new();
    for field in fields {
        match object.get(field.name) {
            None | Some(Value::Null) => {
                if field.required {
                    details.push(json!({ "field": field.name, "error": "required" }));
                }
            }
            Some(value) if !field.kind.matches(value) => {
                details.push(json!({ "field": field.name, "error": field.kind.expected() }));
            }
            Some(_) => {}
        }
    }
    details
}

/// Flatten [`ValidationErrors`] into `{field, error}` details, sorted by field.
pub fn validation_details(errors: &ValidationErrors) -> Vec<Value> {
    let mut details: Vec<(String, String)> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errors)| {
            let field = field.to_string();
            errors.iter().map(move |error| {
                let message = error
                    .message
                    .as_ref()
                    .map(|message| message.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                (field.clone(), message)
            })
        })
        .collect();
    details.sort();

    details
        .into_iter()
        .map(|(field, error)| json!({ "field": field, "error": error }))
        .collect()
}

/// JSON body extractor that rejects with [`AppError`] unless the payload passes
/// both the schema check and the type's [`Validate`] rules.
pub struct ValidJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: DeserializeOwned + Validate + PayloadSchema + Send,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<Value>::from_request(req, state)
            .await
            .map_err(|rejection| {
                tracing::warn!(rejection = ?rejection, "Rejection");
                AppError::bad_request(rejection.body_text())
            })?;

        let details = check_fields(&payload, T::FIELDS);
        if !details.is_empty() {
            tracing::warn!(?details, "Schema violations");
            return Err(AppError::validation(
                details,
                "request body does not match schema",
            ));
        }

        let value: T = serde_json::from_value(payload).map_err(|err| {
            tracing::warn!(error = %err, "Deserialization failed");
            AppError::validation(
                vec![json!({ "field": "$", "error": err.to_string() })],
                "request body does not match schema",
            )
        })?;

        if let Err(errors) = value.validate() {
            tracing::warn!(?errors, "Validation errors");
            return Err(AppError::validation(
                validation_details(&errors),
                "request body failed validation",
            ));
        }

        Ok(ValidJson(value))
    }
}
