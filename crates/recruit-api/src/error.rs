//! API error type and [`axum::response::IntoResponse`] implementation.

use axum::{
  Json,
  http::StatusCode,
  response::{IntoResponse, Response},
};
use recruit_core::{ErrorKind, store::StoreError};
use serde_json::json;
use thiserror::Error;

/// An error returned by an API handler.
#[derive(Debug, Error)]
pub enum ApiError {
  /// No `x-user-id` header, or it names nobody.
  #[error("missing or unknown acting identity")]
  Unauthenticated,

  #[error("{0}")]
  Forbidden(String),

  #[error("not found: {0}")]
  NotFound(String),

  #[error("bad request: {0}")]
  BadRequest(String),

  #[error("{source}")]
  Store {
    kind:   ErrorKind,
    /// The request or HR status that blocked the action, when there is one.
    status: Option<String>,
    #[source]
    source: Box<dyn std::error::Error + Send + Sync>,
  },
}

impl ApiError {
  pub fn store<E: StoreError>(e: E) -> Self {
    Self::Store {
      kind:   e.kind(),
      status: e.as_core().and_then(|c| c.conflicting_status()),
      source: Box::new(e),
    }
  }

  fn status_code(&self) -> StatusCode {
    match self {
      Self::Unauthenticated => StatusCode::UNAUTHORIZED,
      Self::Forbidden(_) => StatusCode::FORBIDDEN,
      Self::NotFound(_) => StatusCode::NOT_FOUND,
      Self::BadRequest(_) => StatusCode::BAD_REQUEST,
      Self::Store { kind, .. } => match kind {
        ErrorKind::PreconditionFailed => StatusCode::PRECONDITION_FAILED,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Conflict => StatusCode::CONFLICT,
        ErrorKind::Unauthorized => StatusCode::FORBIDDEN,
        ErrorKind::Invalid => StatusCode::BAD_REQUEST,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
      },
    }
  }

  fn kind(&self) -> &'static str {
    match self {
      Self::Unauthenticated => "unauthenticated",
      Self::Forbidden(_) => ErrorKind::Unauthorized.as_str(),
      Self::NotFound(_) => ErrorKind::NotFound.as_str(),
      Self::BadRequest(_) => ErrorKind::Invalid.as_str(),
      Self::Store { kind, .. } => kind.as_str(),
    }
  }
}

impl IntoResponse for ApiError {
  fn into_response(self) -> Response {
    let code = self.status_code();
    if code.is_server_error() {
      tracing::error!(error = %self, "request failed");
    }

    let mut body = json!({ "error": self.to_string(), "kind": self.kind() });
    if let Self::Store { status: Some(status), .. } = &self {
      body["status"] = json!(status);
    }
    (code, Json(body)).into_response()
  }
}
