//! HTTP error responses.
//!
//! Bodies always carry a `detail` key: a string for 4xx/5xx failures and a
//! list of field errors for 422 validation failures.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use validator::{ValidationErrors, ValidationErrorsKind};

/// One field-level problem in a request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldError {
    pub loc: Vec<String>,
    pub msg: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("request validation failed")]
    Validation(Vec<FieldError>),

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// A body that is not valid JSON or does not match the expected shape.
    pub fn malformed_body(kind: &str, msg: impl Into<String>) -> Self {
        ApiError::Validation(vec![FieldError {
            loc: vec!["body".to_string()],
            msg: msg.into(),
            kind: kind.to_string(),
        }])
    }
}

impl From<ValidationErrors> for ApiError {
    fn from(errors: ValidationErrors) -> Self {
        let mut fields = Vec::new();
        flatten(&errors, &mut vec!["body".to_string()], &mut fields);
        ApiError::Validation(fields)
    }
}

fn camel_case(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut upper = false;
    for c in field.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}

fn flatten(errors: &ValidationErrors, path: &mut Vec<String>, out: &mut Vec<FieldError>) {
    let mut entries: Vec<_> = errors.errors().iter().collect();
    entries.sort_by_key(|(field, _)| **field);

    for (field, kind) in entries {
        // Struct-level checks are reported against the enclosing object.
        let pushed = *field != "__all__";
        if pushed {
            path.push(camel_case(field));
        }

        match kind {
            ValidationErrorsKind::Field(list) => {
                for e in list {
                    out.push(FieldError {
                        loc: path.clone(),
                        msg: e
                            .message
                            .as_ref()
                            .map(|m| m.to_string())
                            .unwrap_or_else(|| format!("failed '{}' check", e.code)),
                        kind: format!("value_error.{}", e.code),
                    });
                }
            }
            ValidationErrorsKind::Struct(inner) => flatten(inner, path, out),
            ValidationErrorsKind::List(items) => {
                for (index, inner) in items {
                    path.push(index.to_string());
                    flatten(inner, path, out);
                    path.pop();
                }
            }
        }

        if pushed {
            path.pop();
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = match self {
            ApiError::Validation(fields) => json!({ "detail": fields }),
            ApiError::BadRequest(detail) | ApiError::Internal(detail) => json!({ "detail": detail }),
        };
        (status, Json(body)).into_response()
    }
}
