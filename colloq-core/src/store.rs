//! Store traits consumed by the answering pipeline.
//!
//! The persistent engine itself is an external collaborator; the pipeline
//! only needs the narrow capabilities below. `colloq-rag` ships two backends
//! implementing all three traits: an in-memory store and a pgvector-backed
//! PostgreSQL store.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::model::{AudioChunk, Question, Room, SimilarityMatch};

/// Room creation, existence checks, and listing.
#[async_trait]
pub trait RoomStore: Send + Sync {
    /// Create a room with the given display name.
    async fn create_room(&self, name: &str) -> Result<Room>;

    /// Report whether a room exists.
    async fn room_exists(&self, room_id: Uuid) -> Result<bool>;

    /// List all rooms, newest first.
    async fn list_rooms(&self) -> Result<Vec<Room>>;
}

/// Append-only storage of transcribed, embedded audio segments keyed by room.
#[async_trait]
pub trait ChunkStore: Send + Sync {
    /// Insert one transcribed, embedded segment. Chunks are immutable once
    /// created; room existence is assumed valid by the upload caller.
    async fn insert_chunk(
        &self,
        room_id: Uuid,
        transcription: &str,
        embedding: Vec<f32>,
    ) -> Result<AudioChunk>;

    /// Return the chunks most similar to `query`, ordered by descending
    /// similarity, limited to `limit` entries, excluding any match with
    /// similarity ≤ `threshold`.
    ///
    /// The query is atomic and read-consistent at call time; callers need no
    /// transactional isolation across calls.
    async fn query_by_similarity(
        &self,
        room_id: Uuid,
        query: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<SimilarityMatch>>;
}

/// Persistence of question/answer pairs.
#[async_trait]
pub trait QuestionStore: Send + Sync {
    /// Persist a question with its already-generated answer (or `None`),
    /// returning the created row. Increments the owning room's denormalized
    /// question count.
    ///
    /// Fails with `Persistence` if the write does not return a created row.
    async fn insert_question(
        &self,
        room_id: Uuid,
        question: &str,
        answer: Option<String>,
    ) -> Result<Question>;

    /// List a room's questions, newest first.
    async fn list_questions(&self, room_id: Uuid) -> Result<Vec<Question>>;
}
