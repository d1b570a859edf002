//! # colloq-server
//!
//! HTTP surface for colloq: room creation and listing, question answering,
//! and audio segment upload, served by axum.
//!
//! ## Overview
//!
//! - [`server`] - `AppState`, the router, and the serve loop
//! - [`protocol`] - wire types shared with the web client
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use colloq_server::server::{AppState, ServerConfig, run_server};
//!
//! let state = AppState { pipeline, rooms, questions };
//! run_server(ServerConfig::default(), state).await?;
//! ```

pub mod protocol;
pub mod server;

pub use server::{AppState, ServerConfig, app_router, run_server};
