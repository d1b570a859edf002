//! # colloq-rag
//!
//! Store backends, similarity retrieval, and the answering pipeline for colloq.
//!
//! ## Overview
//!
//! This crate implements the persistence and retrieval half of colloq:
//!
//! - [`MemoryStore`] - In-memory backend implementing all three store traits
//! - `PgStore` - Postgres + pgvector backend (behind the `pgvector` feature)
//! - [`SimilarityRetriever`] - Threshold + top-k retrieval over a chunk store
//! - [`AnsweringPipeline`] - The transcribe/embed/retrieve/generate orchestrator
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
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
//! let question = pipeline.answer_question(room_id, "What was decided?").await?;
//! ```
//!
//! ## Features
//!
//! - `pgvector` - Enables `PgStore`, a Postgres backend using the pgvector
//!   extension for cosine similarity search

pub mod memory;
#[cfg(feature = "pgvector")]
pub mod postgres;
pub mod pipeline;
pub mod retriever;

pub use memory::MemoryStore;
#[cfg(feature = "pgvector")]
pub use postgres::PgStore;
pub use pipeline::{AnsweringPipeline, AnsweringPipelineBuilder};
pub use retriever::SimilarityRetriever;
