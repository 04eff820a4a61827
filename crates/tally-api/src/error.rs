//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use serde_json::json;
use tally_core::Error;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  #[error("bad request: {0}")]
  BadRequest(String),

  #[error(transparent)]
  Domain(#[from] Error),

  /// A voice command failed; rendered with a plain-language message.
  #[error("voice command failed: {0}")]
  Voice(#[source] Error),
}

impl ApiError {
  pub fn store<E>(e: E) -> Self
  where
    E: std::error::Error + Send + Sync + 'static,
  {
    Self::Domain(Error::store(e))
  }
}

/// HTTP status for a domain error.
pub fn status_for(error: &Error) -> StatusCode {
  match error {
    Error::EmptyInput
    | Error::EmptyAudio
    | Error::InvalidArguments(_)
    | Error::InvalidAmount(_)
    | Error::UnknownOperation(_) => StatusCode::BAD_REQUEST,
    Error::NotFound(_) => StatusCode::NOT_FOUND,
    Error::NoSelection { .. } => StatusCode::UNPROCESSABLE_ENTITY,
    Error::RemoteUnavailable(_)
    | Error::MalformedResponse(_)
    | Error::MissingConfiguration(_)
    | Error::TranscriptionFailed(_)
    | Error::Store(_)
    | Error::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
  }
}

/// What to tell someone who just spoke a command.
fn plain_message(error: &Error) -> &'static str {
  match error {
    Error::EmptyInput => "I didn't hear anything. Please try again.",
    Error::EmptyAudio => "The recording was empty. Please try again.",
    Error::TranscriptionFailed(_) => "I couldn't understand the recording.",
    Error::RemoteUnavailable(_) | Error::MalformedResponse(_) => {
      "The assistant is unavailable right now. Please try again later."
    }
    Error::MissingConfiguration(_) => "Voice commands are not configured on this server.",
    Error::InvalidArguments(_) | Error::UnknownOperation(_) | Error::NoSelection { .. } => {
      "I couldn't turn that into a command. Try rephrasing it."
    }
    Error::InvalidAmount(_) => "That amount doesn't look right.",
    Error::NotFound(_) => "I couldn't find that record.",
    Error::Store(_) | Error::Serialization(_) => "Something went wrong saving your data.",
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    match self {
      ApiError::BadRequest(m) => {
        (StatusCode::BAD_REQUEST, Json(json!({ "error": m }))).into_response()
      }
      ApiError::Domain(e) => {
        let status = status_for(&e);
        if status.is_server_error() {
          tracing::error!(error = %e, "request failed");
        }
        (status, Json(json!({ "error": e.to_string() }))).into_response()
      }
      ApiError::Voice(e) => {
        let body = json!({
          "error": plain_message(&e),
          "code": e.code(),
          "detail": e.to_string(),
        });
        (status_for(&e), Json(body)).into_response()
      }
    }
  }
}
