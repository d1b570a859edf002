//! Data types for rooms, transcript chunks, questions, and similarity matches.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A recorded conversation that chunks and questions attach to.
///
/// Created on a room-creation request and never mutated afterwards except for
/// the denormalized [`total_questions`](Room::total_questions) counter, which
/// the question store increments on every persisted question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Room {
    /// Unique identifier for the room.
    pub id: Uuid,
    /// Display name shown in room listings.
    pub name: String,
    /// Denormalized count of questions asked in this room.
    pub total_questions: i64,
    /// Creation timestamp (UTC).
    pub created_at: DateTime<Utc>,
}

/// One finalized, transcribed, embedded audio segment.
///
/// Immutable once created; exactly one chunk exists per finalized recording
/// segment. Chunks are never replayed in order; they are only ranked by
/// similarity to a query vector.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AudioChunk {
    /// Unique identifier for the chunk.
    pub id: Uuid,
    /// The room this chunk was recorded in.
    pub room_id: Uuid,
    /// Transcription text produced by the transcription capability.
    pub transcription: String,
    /// Embedding vector for the transcription, with the dimensionality
    /// reported by the embedding capability.
    pub embedding: Vec<f32>,
    /// Creation timestamp (UTC).
    pub created_at: DateTime<Utc>,
}

/// A question asked in a room, with its generated answer once available.
///
/// Created with `answer = None`; the answer transitions at most once from
/// `None` to a generated string and is never reset.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    /// Unique identifier for the question.
    pub id: Uuid,
    /// The room this question was asked in.
    pub room_id: Uuid,
    /// The question text as submitted.
    pub question: String,
    /// The generated answer, or `None` when no relevant context was found.
    pub answer: Option<String>,
    /// Creation timestamp (UTC).
    pub created_at: DateTime<Utc>,
}

/// A retrieved [`AudioChunk`] paired with its similarity score.
///
/// Transient: produced by the similarity query, consumed by answer
/// generation, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimilarityMatch {
    /// The retrieved chunk.
    pub chunk: AudioChunk,
    /// Cosine similarity to the query vector, in [-1, 1].
    pub score: f32,
}

/// One finalized recording segment on its way to upload.
///
/// The payload is an opaque encoded blob; the only metadata the pipeline
/// needs is the MIME type the recorder produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AudioSegment {
    /// Encoded audio bytes.
    pub data: Vec<u8>,
    /// MIME type of the encoded payload (e.g. `audio/webm`).
    pub mime_type: String,
}

impl AudioSegment {
    /// Create a new audio segment.
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self { data, mime_type: mime_type.into() }
    }
}
