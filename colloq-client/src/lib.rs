//! # colloq-client
//!
//! Client-side composition for colloq: the chunked audio capture loop, the
//! optimistic question cache, and an HTTP client for the colloq server.
//!
//! ## Overview
//!
//! - [`ColloqApi`] - HTTP client for every server route, including multipart
//!   segment upload
//! - [`AudioCapture`] - Periodic segment capture over an injected
//!   [`CaptureSource`], with detached best-effort uploads
//! - [`OptimisticQuestions`] - Per-room question lists that show a submitted
//!   question immediately and reconcile (or roll back) once the server
//!   answers
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use colloq_client::{AudioCapture, ColloqApi, OptimisticQuestions};
//!
//! let api = Arc::new(ColloqApi::new("http://127.0.0.1:3333"));
//! let room_id = api.create_room("weekly standup").await?;
//!
//! let mut capture = AudioCapture::new(microphone, api.clone());
//! capture.start(room_id).await?;
//!
//! let questions = OptimisticQuestions::new(api.clone());
//! let handle = questions.submit(room_id, "What was decided?");
//! let outcome = handle.outcome.await?;
//!
//! capture.stop().await;
//! ```

pub mod api;
pub mod capture;
pub mod optimistic;

pub use api::ColloqApi;
pub use capture::{
    AudioCapture, AudioStream, CaptureConfig, CaptureSource, SegmentRecorder, UploadSink,
};
pub use optimistic::{
    AnswerBackend, EntryState, OptimisticQuestions, QuestionEntry, SubmitHandle, SubmitOutcome,
};
