// Holler — HTTP wire types
//
// Payload structs for the broker API plus the error type the handlers
// return. Required fields are `Option`s so a missing field produces a 400
// naming the field instead of an opaque deserialization error.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use crate::store::{RequestType, StoreError};

/// Body of `POST /api/ask`. Also what the caller CLI serializes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AskPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub agent: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub task: Option<String>,
    #[serde(default)]
    pub request_type: RequestType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub command: Option<String>,
}

/// Body of `POST /api/answer`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AnswerPayload {
    pub id: Option<String>,
    pub answer: Option<String>,
}

/// Errors a handler can return, mapped onto the response taxonomy:
/// validation problems are 400, lookup misses 404, admission refusals 429.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(&'static str),

    #[error("too many pending requests")]
    Backpressure,
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Backpressure => StatusCode::TOO_MANY_REQUESTS,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::MissingCommand => Self::Validation(err.to_string()),
            StoreError::PendingCapacity => Self::Backpressure,
        }
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
