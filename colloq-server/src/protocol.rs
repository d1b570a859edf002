//! Wire types for the colloq HTTP surface.
//!
//! Mirrors the web client's payload shapes: camelCase fields, RFC 3339
//! timestamps, and the `{message}` / `{error}` error-body split described on
//! [`ErrorBody`].

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use colloq_core::model::Question;

/// Body for `POST /rooms`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateRoomRequest {
    pub name: String,
}

/// Reply for `POST /rooms`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateRoomResponse {
    pub room_id: Uuid,
}

/// Body for `POST /rooms/{roomId}/questions`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateQuestionRequest {
    pub question: String,
}

/// Reply for `POST /rooms/{roomId}/questions`: the persisted question plus
/// the answer surfaced at the top level (the web client reads both).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateQuestionResponse {
    pub question: Question,
    pub answer: Option<String>,
}

/// Reply for `POST /rooms/{roomId}/audio`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadAudioResponse {
    pub chunk_id: Uuid,
}

/// Error payload. Most routes reply `{"message": ...}`; a missing file on
/// the audio upload route replies `{"error": ...}`, the shape the web client
/// expects there.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ErrorBody {
    /// Build a `{"message": ...}` body.
    pub fn message(text: impl Into<String>) -> Self {
        Self { message: Some(text.into()), error: None }
    }

    /// Build an `{"error": ...}` body (the upload route's missing-file reply).
    pub fn upload_error(text: impl Into<String>) -> Self {
        Self { message: None, error: Some(text.into()) }
    }
}
