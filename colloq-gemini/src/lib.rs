//! # colloq-gemini
//!
//! Gemini-backed capability adapter for colloq.
//!
//! ## Overview
//!
//! [`GeminiClient`] implements the three colloq capability traits with plain
//! `reqwest` calls against the Generative Language REST API:
//!
//! - `Transcriber` - `gemini-2.5-flash` `generateContent` with the audio
//!   segment attached as inline base64 data
//! - `EmbeddingProvider` - `text-embedding-004` `embedContent`
//!   (768 dimensions)
//! - `AnswerGenerator` - `generateContent` with a context-grounded prompt
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use colloq_gemini::GeminiClient;
//!
//! let gemini = GeminiClient::from_env()?; // reads GEMINI_API_KEY
//! let transcription = gemini.transcribe(&audio, "audio/webm").await?;
//! ```

pub mod client;

pub use client::GeminiClient;
