//! Request handlers.

pub mod access_token;
pub mod auth;
pub mod discord;
pub mod session;

use axum::extract::Query;
use axum::http::{StatusCode, Uri, header};
use axum::response::{IntoResponse, Response};
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::{AppError, AppResult};

/// `302 Found` to `location`.
pub(crate) fn found(location: String) -> Response {
    (StatusCode::FOUND, [(header::LOCATION, location)]).into_response()
}

/// Parameters from a JSON body, else from the query string.
///
/// A malformed body is retried as query parameters before failing with 400.
pub(crate) fn request_params<T: DeserializeOwned>(uri: &Uri, body: &[u8]) -> AppResult<T> {
    let from_query = || Query::<T>::try_from_uri(uri).map(|Query(params)| params);

    if body.iter().all(u8::is_ascii_whitespace) {
        return from_query().map_err(|e| AppError::Validation(e.body_text()));
    }

    match serde_json::from_slice::<T>(body) {
        Ok(params) => Ok(params),
        Err(json_err) => {
            if uri.query().is_some_and(|q| !q.is_empty())
                && let Ok(params) = from_query()
            {
                debug!(error = %json_err, "malformed JSON body, using query parameters");
                return Ok(params);
            }
            Err(AppError::Validation(format!("Malformed request body: {json_err}")))
        }
    }
}
