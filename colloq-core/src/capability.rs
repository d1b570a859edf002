//! Capability traits for the three external AI operations.
//!
//! Implementations wrap a concrete provider (Gemini in `colloq-gemini`)
//! behind unified async interfaces. Adapters map failures to
//! [`ColloqError::ExternalService`](crate::error::ColloqError::ExternalService)
//! and never retry internally; retry policy belongs to the caller.
//!
//! Construct one client at process start and pass it explicitly
//! (`Arc<dyn ...>`) to the pipeline rather than through a global, so tests can
//! substitute fakes.

use async_trait::async_trait;

use crate::error::Result;

/// Converts an encoded audio payload into transcription text.
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Transcribe an opaque encoded audio payload.
    ///
    /// Fails with `ExternalService` if the provider returns no text.
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<String>;
}

/// A provider that generates vector embeddings from text input.
///
/// # Example
///
/// ```rust,ignore
/// use colloq_core::EmbeddingProvider;
///
/// let embedding = provider.embed("When does the meeting start?").await?;
/// assert_eq!(embedding.len(), provider.dimensions());
/// ```
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Generate an embedding vector for a single text input.
    ///
    /// Fails with `ExternalService` if no embedding is returned. The vector
    /// has the fixed dimensionality reported by
    /// [`dimensions`](EmbeddingProvider::dimensions); callers may assume
    /// silent dimensional consistency from the provider.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Return the dimensionality of embeddings produced by this provider.
    fn dimensions(&self) -> usize;
}

/// Synthesizes an answer to a question grounded in retrieved context.
#[async_trait]
pub trait AnswerGenerator: Send + Sync {
    /// Generate an answer from the question and its retrieved context.
    ///
    /// `context` is consumed in retrieval order; implementations concatenate
    /// the entries separated by a blank line inside a fixed instruction
    /// template that directs the model to answer "I don't know" when the
    /// context is insufficient. Fails with `ExternalService` if no text is
    /// returned.
    async fn generate_answer(&self, question: &str, context: &[String]) -> Result<String>;
}
