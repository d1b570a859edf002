//! Core contracts for colloq: record a live conversation in periodic audio
//! segments, transcribe and embed each segment, and answer questions about the
//! conversation by retrieving the most similar transcript chunks and grounding
//! a generation step on them.
//!
//! This crate defines the shared vocabulary of the workspace:
//!
//! - the data model ([`Room`], [`AudioChunk`], [`Question`],
//!   [`SimilarityMatch`], [`AudioSegment`])
//! - the error taxonomy ([`ColloqError`])
//! - the capability seams ([`Transcriber`], [`EmbeddingProvider`],
//!   [`AnswerGenerator`])
//! - the store seams ([`RoomStore`], [`ChunkStore`], [`QuestionStore`])
//! - retrieval tuning ([`RetrievalConfig`])
//!
//! Backends implementing these traits live in `colloq-rag` (stores) and
//! `colloq-gemini` (capabilities).

pub mod capability;
pub mod config;
pub mod error;
pub mod model;
pub mod store;

pub use capability::{AnswerGenerator, EmbeddingProvider, Transcriber};
pub use config::{RetrievalConfig, RetrievalConfigBuilder};
pub use error::{ColloqError, Result};
pub use model::{AudioChunk, AudioSegment, Question, Room, SimilarityMatch};
pub use store::{ChunkStore, QuestionStore, RoomStore};
