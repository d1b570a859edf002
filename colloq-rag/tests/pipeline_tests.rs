//! Scenario tests for the answering pipeline using fake capabilities.

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use colloq_core::capability::{AnswerGenerator, EmbeddingProvider, Transcriber};
use colloq_core::error::{ColloqError, Result};
use colloq_core::model::Question;
use colloq_core::store::{ChunkStore, QuestionStore, RoomStore};
use colloq_rag::{AnsweringPipeline, MemoryStore};
use uuid::Uuid;

/// Embedder returning one fixed vector for every input, counting calls.
struct FixedEmbedder {
    vector: Vec<f32>,
    calls: AtomicUsize,
}

impl FixedEmbedder {
    fn new(vector: Vec<f32>) -> Self {
        Self { vector, calls: AtomicUsize::new(0) }
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl EmbeddingProvider for FixedEmbedder {
    async fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.vector.clone())
    }

    fn dimensions(&self) -> usize {
        self.vector.len()
    }
}

/// Generator recording the context it was handed, returning a fixed reply.
struct RecordingGenerator {
    reply: String,
    calls: Mutex<Vec<Vec<String>>>,
}

impl RecordingGenerator {
    fn new(reply: &str) -> Self {
        Self { reply: reply.to_string(), calls: Mutex::new(Vec::new()) }
    }

    fn contexts(&self) -> Vec<Vec<String>> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl AnswerGenerator for RecordingGenerator {
    async fn generate_answer(&self, _question: &str, context: &[String]) -> Result<String> {
        self.calls.lock().unwrap().push(context.to_vec());
        Ok(self.reply.clone())
    }
}

/// Generator failing every call with an external service error.
struct FailingGenerator;

#[async_trait]
impl AnswerGenerator for FailingGenerator {
    async fn generate_answer(&self, _question: &str, _context: &[String]) -> Result<String> {
        Err(ColloqError::ExternalService {
            provider: "fake".to_string(),
            message: "generation unavailable".to_string(),
        })
    }
}

/// Transcriber returning one fixed transcription for every segment.
struct FixedTranscriber(String);

#[async_trait]
impl Transcriber for FixedTranscriber {
    async fn transcribe(&self, _audio: &[u8], _mime_type: &str) -> Result<String> {
        Ok(self.0.clone())
    }
}

/// Question store whose inserts always fail.
struct FailingQuestions;

#[async_trait]
impl QuestionStore for FailingQuestions {
    async fn insert_question(
        &self,
        _room_id: Uuid,
        _question: &str,
        _answer: Option<String>,
    ) -> Result<Question> {
        Err(ColloqError::Persistence("Could not create question".to_string()))
    }

    async fn list_questions(&self, _room_id: Uuid) -> Result<Vec<Question>> {
        Ok(Vec::new())
    }
}

struct Fixture {
    store: Arc<MemoryStore>,
    embedder: Arc<FixedEmbedder>,
    generator: Arc<RecordingGenerator>,
    pipeline: AnsweringPipeline,
}

/// Build a pipeline over a fresh memory store with recording fakes.
/// The embedder maps every text to `query_vector`.
fn fixture(query_vector: Vec<f32>, reply: &str) -> Fixture {
    let store = Arc::new(MemoryStore::new());
    let embedder = Arc::new(FixedEmbedder::new(query_vector));
    let generator = Arc::new(RecordingGenerator::new(reply));
    let pipeline = AnsweringPipeline::builder()
        .room_store(store.clone())
        .chunk_store(store.clone())
        .question_store(store.clone())
        .transcriber(Arc::new(FixedTranscriber("unused".to_string())))
        .embedding_provider(embedder.clone())
        .answer_generator(generator.clone())
        .build()
        .unwrap();
    Fixture { store, embedder, generator, pipeline }
}

#[tokio::test]
async fn answer_uses_only_context_above_threshold() {
    let f = fixture(vec![1.0, 0.0], "The meeting starts at 3pm.");
    let room = f.store.create_room("standup").await.unwrap();

    // Scores against the [1, 0] query: 0.82 and 0.40
    f.store
        .insert_chunk(room.id, "The meeting starts at 3pm", vec![0.82, 0.5724])
        .await
        .unwrap();
    f.store
        .insert_chunk(room.id, "Unrelated hallway chatter", vec![0.40, 0.9165])
        .await
        .unwrap();

    let question = f.pipeline.answer_question(room.id, "When does the meeting start?").await.unwrap();

    assert_eq!(question.answer.as_deref(), Some("The meeting starts at 3pm."));
    let contexts = f.generator.contexts();
    assert_eq!(contexts.len(), 1);
    assert_eq!(contexts[0], vec!["The meeting starts at 3pm".to_string()]);
}

#[tokio::test]
async fn question_without_context_is_persisted_unanswered() {
    let f = fixture(vec![1.0, 0.0], "never used");
    let room = f.store.create_room("empty").await.unwrap();

    let question = f.pipeline.answer_question(room.id, "Anything?").await.unwrap();

    assert!(question.answer.is_none());
    assert!(f.generator.contexts().is_empty(), "generator must not run without context");

    let listed = f.store.list_questions(room.id).await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].id, question.id);
    assert!(listed[0].answer.is_none());
}

#[tokio::test]
async fn below_threshold_context_is_treated_as_absent() {
    let f = fixture(vec![1.0, 0.0], "never used");
    let room = f.store.create_room("faint").await.unwrap();
    f.store.insert_chunk(room.id, "faint echo", vec![0.40, 0.9165]).await.unwrap();

    let question = f.pipeline.answer_question(room.id, "Anything?").await.unwrap();

    assert!(question.answer.is_none());
    assert!(f.generator.contexts().is_empty());
}

#[tokio::test]
async fn missing_room_is_rejected_before_any_work() {
    let f = fixture(vec![1.0, 0.0], "never used");

    let err = f.pipeline.answer_question(Uuid::new_v4(), "Hello?").await.unwrap_err();

    assert!(matches!(err, ColloqError::RoomNotFound { .. }), "unexpected error: {err}");
    assert_eq!(f.embedder.calls(), 0, "embedding must not run for a missing room");
    assert!(f.generator.contexts().is_empty());
}

#[tokio::test]
async fn generation_failure_leaves_nothing_persisted() {
    let store = Arc::new(MemoryStore::new());
    let pipeline = AnsweringPipeline::builder()
        .room_store(store.clone())
        .chunk_store(store.clone())
        .question_store(store.clone())
        .transcriber(Arc::new(FixedTranscriber("unused".to_string())))
        .embedding_provider(Arc::new(FixedEmbedder::new(vec![1.0, 0.0])))
        .answer_generator(Arc::new(FailingGenerator))
        .build()
        .unwrap();

    let room = store.create_room("flaky").await.unwrap();
    store.insert_chunk(room.id, "relevant context", vec![1.0, 0.0]).await.unwrap();

    let err = pipeline.answer_question(room.id, "Anything?").await.unwrap_err();
    assert!(matches!(err, ColloqError::ExternalService { .. }), "unexpected error: {err}");

    let listed = store.list_questions(room.id).await.unwrap();
    assert!(listed.is_empty(), "failed questions must not be persisted");
}

#[tokio::test]
async fn persistence_failure_surfaces_after_generation() {
    let store = Arc::new(MemoryStore::new());
    let generator = Arc::new(RecordingGenerator::new("an answer"));
    let pipeline = AnsweringPipeline::builder()
        .room_store(store.clone())
        .chunk_store(store.clone())
        .question_store(Arc::new(FailingQuestions))
        .transcriber(Arc::new(FixedTranscriber("unused".to_string())))
        .embedding_provider(Arc::new(FixedEmbedder::new(vec![1.0, 0.0])))
        .answer_generator(generator.clone())
        .build()
        .unwrap();

    let room = store.create_room("doomed").await.unwrap();
    store.insert_chunk(room.id, "relevant context", vec![1.0, 0.0]).await.unwrap();

    let err = pipeline.answer_question(room.id, "Anything?").await.unwrap_err();

    assert!(matches!(err, ColloqError::Persistence(_)), "unexpected error: {err}");
    assert_eq!(generator.contexts().len(), 1, "generation ran before the failed persist");
}

#[tokio::test]
async fn ingest_then_answer_round_trip() {
    let store = Arc::new(MemoryStore::new());
    let generator = Arc::new(RecordingGenerator::new("The beta shipped on Tuesday."));
    let pipeline = AnsweringPipeline::builder()
        .room_store(store.clone())
        .chunk_store(store.clone())
        .question_store(store.clone())
        .transcriber(Arc::new(FixedTranscriber("We shipped the beta on Tuesday".to_string())))
        .embedding_provider(Arc::new(FixedEmbedder::new(vec![1.0, 0.0])))
        .answer_generator(generator.clone())
        .build()
        .unwrap();

    let room = store.create_room("retro").await.unwrap();
    let chunk = pipeline.ingest_segment(room.id, b"webm bytes", "audio/webm").await.unwrap();
    assert_eq!(chunk.transcription, "We shipped the beta on Tuesday");

    let question = pipeline.answer_question(room.id, "When did the beta ship?").await.unwrap();
    assert_eq!(question.answer.as_deref(), Some("The beta shipped on Tuesday."));
    assert_eq!(
        generator.contexts(),
        vec![vec!["We shipped the beta on Tuesday".to_string()]],
    );
}

#[tokio::test]
async fn builder_rejects_missing_components() {
    let store = Arc::new(MemoryStore::new());
    let err = AnsweringPipeline::builder()
        .room_store(store.clone())
        .chunk_store(store.clone())
        .question_store(store)
        .build()
        .unwrap_err();
    assert!(matches!(err, ColloqError::Config(_)), "unexpected error: {err}");
}
