//! HTTP client for the colloq server.
//!
//! One thin `reqwest` wrapper per route. A 404 on a room-scoped route maps to
//! [`ColloqError::RoomNotFound`]; every other failure surfaces as
//! [`ColloqError::ExternalService`] with the server's error detail when the
//! body carries one.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};
use uuid::Uuid;

use colloq_core::error::{ColloqError, Result};
use colloq_core::model::{AudioSegment, Question, Room};

use crate::capture::UploadSink;
use crate::optimistic::AnswerBackend;

/// Provider name carried in error values for server failures.
const PROVIDER: &str = "colloq-server";

/// HTTP client for the colloq server.
///
/// Implements [`UploadSink`] for the capture loop and [`AnswerBackend`] for
/// the optimistic question cache, so one `Arc<ColloqApi>` wires up the whole
/// client side.
///
/// # Example
///
/// ```rust,ignore
/// use colloq_client::ColloqApi;
///
/// let api = ColloqApi::new("http://127.0.0.1:3333");
/// let room_id = api.create_room("weekly standup").await?;
/// let question = api.create_question(room_id, "What was decided?").await?;
/// ```
pub struct ColloqApi {
    client: reqwest::Client,
    base_url: String,
}

impl ColloqApi {
    /// Create a client for the server at `base_url` (no trailing slash
    /// needed).
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into();
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    /// `POST /rooms`: create a room, returning its identifier.
    pub async fn create_room(&self, name: &str) -> Result<Uuid> {
        let response = self
            .client
            .post(format!("{}/rooms", self.base_url))
            .json(&CreateRoomBody { name })
            .send()
            .await
            .map_err(transport_error)?;

        let created: CreatedRoom = decode(response, None).await?;
        Ok(created.room_id)
    }

    /// `GET /rooms`: list rooms, newest first.
    pub async fn list_rooms(&self) -> Result<Vec<Room>> {
        let response = self
            .client
            .get(format!("{}/rooms", self.base_url))
            .send()
            .await
            .map_err(transport_error)?;

        decode(response, None).await
    }

    /// `POST /rooms/{roomId}/questions`: submit a question and return the
    /// persisted result, answer included.
    pub async fn create_question(&self, room_id: Uuid, question: &str) -> Result<Question> {
        let response = self
            .client
            .post(format!("{}/rooms/{room_id}/questions", self.base_url))
            .json(&CreateQuestionBody { question })
            .send()
            .await
            .map_err(transport_error)?;

        let reply: QuestionReply = decode(response, Some(room_id)).await?;
        Ok(reply.question)
    }

    /// `GET /rooms/{roomId}/questions`: list a room's questions, newest
    /// first.
    pub async fn list_questions(&self, room_id: Uuid) -> Result<Vec<Question>> {
        let response = self
            .client
            .get(format!("{}/rooms/{room_id}/questions", self.base_url))
            .send()
            .await
            .map_err(transport_error)?;

        decode(response, Some(room_id)).await
    }

    /// `POST /rooms/{roomId}/audio`: upload one finalized segment as a
    /// multipart file field, returning the created chunk identifier.
    pub async fn upload_segment(&self, room_id: Uuid, segment: &AudioSegment) -> Result<Uuid> {
        let part = reqwest::multipart::Part::bytes(segment.data.clone())
            .file_name("segment.webm")
            .mime_str(&segment.mime_type)
            .map_err(|e| ColloqError::ExternalService {
                provider: PROVIDER.into(),
                message: format!("invalid segment MIME type: {e}"),
            })?;
        let form = reqwest::multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(format!("{}/rooms/{room_id}/audio", self.base_url))
            .multipart(form)
            .send()
            .await
            .map_err(transport_error)?;

        let uploaded: UploadedChunk = decode(response, Some(room_id)).await?;
        debug!(
            room_id = %room_id,
            chunk_id = %uploaded.chunk_id,
            bytes = segment.data.len(),
            "segment uploaded"
        );
        Ok(uploaded.chunk_id)
    }
}

#[async_trait]
impl UploadSink for ColloqApi {
    async fn upload(&self, room_id: Uuid, segment: AudioSegment) -> Result<Uuid> {
        self.upload_segment(room_id, &segment).await
    }
}

#[async_trait]
impl AnswerBackend for ColloqApi {
    async fn ask(&self, room_id: Uuid, question: &str) -> Result<Question> {
        self.create_question(room_id, question).await
    }
}

fn transport_error(e: reqwest::Error) -> ColloqError {
    error!(provider = PROVIDER, error = %e, "request failed");
    ColloqError::ExternalService { provider: PROVIDER.into(), message: format!("request failed: {e}") }
}

/// Check the status and decode the success body. `room_id` is the room a
/// 404 refers to on room-scoped routes.
async fn decode<T>(response: reqwest::Response, room_id: Option<Uuid>) -> Result<T>
where
    T: DeserializeOwned,
{
    let status = response.status();
    if status == StatusCode::NOT_FOUND {
        if let Some(room_id) = room_id {
            return Err(ColloqError::RoomNotFound { room_id });
        }
    }
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let detail = serde_json::from_str::<ErrorReply>(&body)
            .ok()
            .and_then(|e| e.message.or(e.error))
            .unwrap_or(body);

        error!(provider = PROVIDER, %status, "server error");
        return Err(ColloqError::ExternalService {
            provider: PROVIDER.into(),
            message: format!("server returned {status}: {detail}"),
        });
    }

    response.json().await.map_err(|e| {
        error!(provider = PROVIDER, error = %e, "failed to parse response");
        ColloqError::ExternalService {
            provider: PROVIDER.into(),
            message: format!("failed to parse response: {e}"),
        }
    })
}

// ── Server wire types ──────────────────────────────────────────────

#[derive(Serialize)]
struct CreateRoomBody<'a> {
    name: &'a str,
}

#[derive(Serialize)]
struct CreateQuestionBody<'a> {
    question: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreatedRoom {
    room_id: Uuid,
}

#[derive(Deserialize)]
struct QuestionReply {
    question: Question,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadedChunk {
    chunk_id: Uuid,
}

#[derive(Deserialize)]
struct ErrorReply {
    message: Option<String>,
    error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn trailing_slash_is_trimmed_from_base_url() {
        let api = ColloqApi::new("http://127.0.0.1:3333/");
        assert_eq!(api.base_url, "http://127.0.0.1:3333");
    }

    #[test]
    fn question_reply_parses_nested_question() {
        let body = json!({
            "question": {
                "id": "b9481bf0-4d4f-4d46-9a40-8ffd4e4f0b63",
                "roomId": "0e03c4e5-7a9a-47a3-8bd1-3a1b43f0f3fb",
                "question": "When does the meeting start?",
                "answer": "At 3pm.",
                "createdAt": "2026-08-23T12:00:00Z"
            },
            "answer": "At 3pm."
        });

        let reply: QuestionReply = serde_json::from_value(body).unwrap();
        assert_eq!(reply.question.answer.as_deref(), Some("At 3pm."));
    }

    #[test]
    fn error_reply_reads_either_key() {
        let message: ErrorReply = serde_json::from_str(r#"{"message":"Room does not exist"}"#).unwrap();
        assert_eq!(message.message.as_deref(), Some("Room does not exist"));
        assert!(message.error.is_none());

        let error: ErrorReply = serde_json::from_str(r#"{"error":"Missing audio file"}"#).unwrap();
        assert_eq!(error.error.as_deref(), Some("Missing audio file"));
    }

    #[test]
    fn created_room_parses_camel_case_id() {
        let created: CreatedRoom =
            serde_json::from_str(r#"{"roomId":"0e03c4e5-7a9a-47a3-8bd1-3a1b43f0f3fb"}"#).unwrap();
        assert_eq!(created.room_id.to_string(), "0e03c4e5-7a9a-47a3-8bd1-3a1b43f0f3fb");
    }
}
