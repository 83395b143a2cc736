//! JSON body extractor that validates before the handler runs.

use axum::{
    async_trait,
    body::Bytes,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::ApiError;

/// Like `axum::Json`, but rejections are 422 bodies in the service's error
/// shape and the value has passed its `validator` constraints.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<S, T> FromRequest<S> for ValidatedJson<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Validate,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::malformed_body("value_error.body", e.body_text()))?;

        let value: T = serde_json::from_slice(&bytes).map_err(|e| {
            if e.is_syntax() || e.is_eof() {
                ApiError::malformed_body("value_error.jsondecode", e.to_string())
            } else {
                ApiError::malformed_body("value_error", e.to_string())
            }
        })?;

        value.validate()?;
        Ok(ValidatedJson(value))
    }
}
