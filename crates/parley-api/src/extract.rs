//! Request body extractor shared by the POST handlers.
//!
//! Accepts a JSON or form-encoded body. A missing or blank body yields the
//! payload's default so handlers report the missing field themselves, and
//! every rejection uses the JSON error envelope.

use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::header;
use axum::{Form, Json};
use serde::de::DeserializeOwned;

use crate::error::ApiError;

/// Deserialized request body.
pub struct Payload<T>(pub T);

impl<S, T> FromRequest<S> for Payload<T>
where
    S: Send + Sync,
    T: DeserializeOwned + Default + Send,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let is_form = req
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|ct| ct.starts_with("application/x-www-form-urlencoded"));

        if is_form {
            return Form::<T>::from_request(req, state)
                .await
                .map(|Form(value)| Payload(value))
                .map_err(|e| ApiError::BadRequest(e.body_text()));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| ApiError::BadRequest(e.body_text()))?;

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Payload(T::default()));
        }

        Json::<T>::from_bytes(&bytes)
            .map(|Json(value)| Payload(value))
            .map_err(|e| ApiError::BadRequest(e.body_text()))
    }
}
