//! In-memory store backend using cosine similarity.
//!
//! This module provides [`MemoryStore`], a zero-dependency backend for all
//! three store traits, backed by `HashMap`s protected by a single
//! `tokio::sync::RwLock`. It is suitable for development, testing, and
//! small-scale use cases.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use colloq_core::error::{ColloqError, Result};
use colloq_core::model::{AudioChunk, Question, Room, SimilarityMatch};
use colloq_core::store::{ChunkStore, QuestionStore, RoomStore};

#[derive(Debug, Default)]
struct Inner {
    rooms: HashMap<Uuid, Room>,
    chunks: HashMap<Uuid, Vec<AudioChunk>>,
    questions: HashMap<Uuid, Vec<Question>>,
}

/// An in-memory backend for rooms, audio chunks, and questions.
///
/// Chunks and questions are keyed by room ID. Inserting a chunk or question
/// for a room that does not exist fails with a store error, mirroring the
/// foreign-key behavior of the Postgres backend. All operations are
/// async-safe via `tokio::sync::RwLock`.
///
/// # Example
///
/// ```rust,ignore
/// use colloq_rag::MemoryStore;
/// use colloq_core::store::RoomStore;
///
/// let store = MemoryStore::new();
/// let room = store.create_room("standup").await?;
/// ```
#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: RwLock<Inner>,
}

impl MemoryStore {
    /// Create a new empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }
}

fn missing_room(room_id: Uuid) -> ColloqError {
    ColloqError::Store {
        backend: "memory".to_string(),
        message: format!("room '{room_id}' does not exist"),
    }
}

/// Compute cosine similarity between two vectors.
///
/// Returns 0.0 if either vector has zero magnitude.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[async_trait]
impl RoomStore for MemoryStore {
    async fn create_room(&self, name: &str) -> Result<Room> {
        let mut inner = self.inner.write().await;
        let room = Room {
            id: Uuid::new_v4(),
            name: name.to_string(),
            total_questions: 0,
            created_at: Utc::now(),
        };
        inner.rooms.insert(room.id, room.clone());
        Ok(room)
    }

    async fn room_exists(&self, room_id: Uuid) -> Result<bool> {
        let inner = self.inner.read().await;
        Ok(inner.rooms.contains_key(&room_id))
    }

    async fn list_rooms(&self) -> Result<Vec<Room>> {
        let inner = self.inner.read().await;
        let mut rooms: Vec<Room> = inner.rooms.values().cloned().collect();
        rooms.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rooms)
    }
}

#[async_trait]
impl ChunkStore for MemoryStore {
    async fn insert_chunk(
        &self,
        room_id: Uuid,
        transcription: &str,
        embedding: Vec<f32>,
    ) -> Result<AudioChunk> {
        let mut inner = self.inner.write().await;
        if !inner.rooms.contains_key(&room_id) {
            return Err(missing_room(room_id));
        }
        let chunk = AudioChunk {
            id: Uuid::new_v4(),
            room_id,
            transcription: transcription.to_string(),
            embedding,
            created_at: Utc::now(),
        };
        inner.chunks.entry(room_id).or_default().push(chunk.clone());
        Ok(chunk)
    }

    async fn query_by_similarity(
        &self,
        room_id: Uuid,
        query: &[f32],
        threshold: f32,
        limit: usize,
    ) -> Result<Vec<SimilarityMatch>> {
        let inner = self.inner.read().await;
        // A room with no uploads has no entry; treat both as "no context",
        // matching what a filtered SELECT returns on the Postgres backend.
        let Some(chunks) = inner.chunks.get(&room_id) else {
            return Ok(Vec::new());
        };

        let mut scored: Vec<SimilarityMatch> = chunks
            .iter()
            .map(|chunk| {
                let score = cosine_similarity(&chunk.embedding, query);
                SimilarityMatch { chunk: chunk.clone(), score }
            })
            .filter(|m| m.score > threshold)
            .collect();

        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored)
    }
}

#[async_trait]
impl QuestionStore for MemoryStore {
    async fn insert_question(
        &self,
        room_id: Uuid,
        question: &str,
        answer: Option<String>,
    ) -> Result<Question> {
        let mut inner = self.inner.write().await;
        let Some(room) = inner.rooms.get_mut(&room_id) else {
            return Err(missing_room(room_id));
        };
        room.total_questions += 1;
        let question = Question {
            id: Uuid::new_v4(),
            room_id,
            question: question.to_string(),
            answer,
            created_at: Utc::now(),
        };
        inner.questions.entry(room_id).or_default().push(question.clone());
        Ok(question)
    }

    async fn list_questions(&self, room_id: Uuid) -> Result<Vec<Question>> {
        let inner = self.inner.read().await;
        let mut questions = inner.questions.get(&room_id).cloned().unwrap_or_default();
        questions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(questions)
    }
}
