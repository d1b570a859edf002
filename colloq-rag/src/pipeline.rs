//! Answering pipeline orchestrator.
//!
//! The [`AnsweringPipeline`] coordinates the two colloq workflows by composing
//! the store traits with a [`Transcriber`], an [`EmbeddingProvider`], and an
//! [`AnswerGenerator`]:
//!
//! - ingest: transcribe an audio segment, embed the transcription, store the
//!   chunk
//! - answer: embed a question, retrieve relevant transcriptions, generate an
//!   answer when context exists, persist the result
//!
//! # Example
//!
//! ```rust,ignore
//! use colloq_rag::{AnsweringPipeline, MemoryStore};
//!
//! let store = Arc::new(MemoryStore::new());
//! let pipeline = AnsweringPipeline::builder()
//!     .room_store(store.clone())
//!     .chunk_store(store.clone())
//!     .question_store(store)
//!     .transcriber(gemini.clone())
//!     .embedding_provider(gemini.clone())
//!     .answer_generator(gemini)
//!     .build()?;
//!
//! pipeline.ingest_segment(room_id, &audio, "audio/webm").await?;
//! let question = pipeline.answer_question(room_id, "What was decided?").await?;
//! ```

use std::sync::Arc;

use tracing::{error, info};
use uuid::Uuid;

use colloq_core::capability::{AnswerGenerator, EmbeddingProvider, Transcriber};
use colloq_core::config::RetrievalConfig;
use colloq_core::error::{ColloqError, Result};
use colloq_core::model::{AudioChunk, Question};
use colloq_core::store::{ChunkStore, QuestionStore, RoomStore};

use crate::retriever::SimilarityRetriever;

/// The answering pipeline orchestrator.
///
/// Coordinates audio ingestion (transcribe → embed → store) and question
/// answering (verify room → embed → retrieve → generate → persist).
/// Construct one via [`AnsweringPipeline::builder()`].
pub struct AnsweringPipeline {
    rooms: Arc<dyn RoomStore>,
    chunks: Arc<dyn ChunkStore>,
    questions: Arc<dyn QuestionStore>,
    retriever: SimilarityRetriever,
    transcriber: Arc<dyn Transcriber>,
    embedder: Arc<dyn EmbeddingProvider>,
    generator: Arc<dyn AnswerGenerator>,
}

impl std::fmt::Debug for AnsweringPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnsweringPipeline").finish_non_exhaustive()
    }
}

impl AnsweringPipeline {
    /// Create a new [`AnsweringPipelineBuilder`].
    pub fn builder() -> AnsweringPipelineBuilder {
        AnsweringPipelineBuilder::default()
    }

    /// Return a reference to the retrieval configuration.
    pub fn config(&self) -> &RetrievalConfig {
        self.retriever.config()
    }

    /// Ingest one audio segment: transcribe → embed → store.
    ///
    /// Returns the stored chunk. Any step failing aborts the ingest; nothing
    /// is persisted for a segment that could not be transcribed or embedded.
    ///
    /// # Errors
    ///
    /// Returns [`ColloqError::ExternalService`] if transcription or embedding
    /// fails, or a store error if the chunk insert fails (including inserts
    /// for rooms that do not exist).
    pub async fn ingest_segment(
        &self,
        room_id: Uuid,
        audio: &[u8],
        mime_type: &str,
    ) -> Result<AudioChunk> {
        // 1. Transcribe the audio
        let transcription = self.transcriber.transcribe(audio, mime_type).await.map_err(|e| {
            error!(room_id = %room_id, error = %e, "transcription failed during ingest");
            e
        })?;

        // 2. Embed the transcription
        let embedding = self.embedder.embed(&transcription).await.map_err(|e| {
            error!(room_id = %room_id, error = %e, "embedding failed during ingest");
            e
        })?;

        // 3. Store the chunk
        let chunk = self.chunks.insert_chunk(room_id, &transcription, embedding).await?;

        info!(
            room_id = %room_id,
            chunk_id = %chunk.id,
            transcription_len = chunk.transcription.len(),
            "ingested audio segment"
        );
        Ok(chunk)
    }

    /// Answer a question against a room's accumulated transcriptions.
    ///
    /// Workflow: verify the room exists, embed the question, retrieve
    /// similar transcriptions, generate an answer only when at least one
    /// transcription qualifies, then persist the question with its answer
    /// (or `None`). The persisted question is returned.
    ///
    /// # Errors
    ///
    /// - [`ColloqError::RoomNotFound`] if the room does not exist
    /// - [`ColloqError::ExternalService`] if embedding or generation fails
    /// - [`ColloqError::Store`] / [`ColloqError::Persistence`] if the
    ///   question cannot be persisted
    pub async fn answer_question(&self, room_id: Uuid, question: &str) -> Result<Question> {
        // 1. Verify the room exists
        if !self.rooms.room_exists(room_id).await? {
            return Err(ColloqError::RoomNotFound { room_id });
        }

        // 2. Embed the question
        let query = self.embedder.embed(question).await.map_err(|e| {
            error!(room_id = %room_id, error = %e, "question embedding failed");
            e
        })?;

        // 3. Retrieve transcriptions above the similarity threshold
        let matches = self.retriever.retrieve(room_id, &query).await?;

        // 4. Generate an answer only when relevant context exists
        let answer = if matches.is_empty() {
            None
        } else {
            let context: Vec<String> =
                matches.iter().map(|m| m.chunk.transcription.clone()).collect();
            let text = self.generator.generate_answer(question, &context).await.map_err(|e| {
                error!(room_id = %room_id, error = %e, "answer generation failed");
                e
            })?;
            Some(text)
        };

        // 5. Persist the question and answer
        let stored = self.questions.insert_question(room_id, question, answer).await?;

        info!(
            room_id = %room_id,
            question_id = %stored.id,
            matches = matches.len(),
            answered = stored.answer.is_some(),
            "answered question"
        );
        Ok(stored)
    }
}

/// Builder for constructing an [`AnsweringPipeline`].
///
/// All components except `config` are required. Call
/// [`build()`](AnsweringPipelineBuilder::build) to validate and produce the
/// pipeline.
#[derive(Default)]
pub struct AnsweringPipelineBuilder {
    config: Option<RetrievalConfig>,
    rooms: Option<Arc<dyn RoomStore>>,
    chunks: Option<Arc<dyn ChunkStore>>,
    questions: Option<Arc<dyn QuestionStore>>,
    transcriber: Option<Arc<dyn Transcriber>>,
    embedder: Option<Arc<dyn EmbeddingProvider>>,
    generator: Option<Arc<dyn AnswerGenerator>>,
}

impl AnsweringPipelineBuilder {
    /// Set the retrieval configuration. Defaults to
    /// [`RetrievalConfig::default()`] when not set.
    pub fn config(mut self, config: RetrievalConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Set the room store.
    pub fn room_store(mut self, rooms: Arc<dyn RoomStore>) -> Self {
        self.rooms = Some(rooms);
        self
    }

    /// Set the chunk store.
    pub fn chunk_store(mut self, chunks: Arc<dyn ChunkStore>) -> Self {
        self.chunks = Some(chunks);
        self
    }

    /// Set the question store.
    pub fn question_store(mut self, questions: Arc<dyn QuestionStore>) -> Self {
        self.questions = Some(questions);
        self
    }

    /// Set the transcriber.
    pub fn transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    /// Set the embedding provider.
    pub fn embedding_provider(mut self, embedder: Arc<dyn EmbeddingProvider>) -> Self {
        self.embedder = Some(embedder);
        self
    }

    /// Set the answer generator.
    pub fn answer_generator(mut self, generator: Arc<dyn AnswerGenerator>) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Build the [`AnsweringPipeline`], validating that all required
    /// components are set.
    ///
    /// # Errors
    ///
    /// Returns [`ColloqError::Config`] if any required component is missing.
    pub fn build(self) -> Result<AnsweringPipeline> {
        let config = self.config.unwrap_or_default();
        let rooms = self
            .rooms
            .ok_or_else(|| ColloqError::Config("room_store is required".to_string()))?;
        let chunks = self
            .chunks
            .ok_or_else(|| ColloqError::Config("chunk_store is required".to_string()))?;
        let questions = self
            .questions
            .ok_or_else(|| ColloqError::Config("question_store is required".to_string()))?;
        let transcriber = self
            .transcriber
            .ok_or_else(|| ColloqError::Config("transcriber is required".to_string()))?;
        let embedder = self
            .embedder
            .ok_or_else(|| ColloqError::Config("embedding_provider is required".to_string()))?;
        let generator = self
            .generator
            .ok_or_else(|| ColloqError::Config("answer_generator is required".to_string()))?;

        let retriever = SimilarityRetriever::with_config(chunks.clone(), config);
        Ok(AnsweringPipeline {
            rooms,
            chunks,
            questions,
            retriever,
            transcriber,
            embedder,
            generator,
        })
    }
}
