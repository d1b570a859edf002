//! Error types for the colloq workspace.

use thiserror::Error;
use uuid::Uuid;

/// Errors that can occur across the recording and answering pipeline.
#[derive(Debug, Error)]
pub enum ColloqError {
    /// The caller referenced a room that does not exist.
    ///
    /// Surfaced to users as "not found"; never retried.
    #[error("Room not found: {room_id}")]
    RoomNotFound {
        /// The room identifier that failed the existence check.
        room_id: Uuid,
    },

    /// An external capability (transcription, embedding, generation, or the
    /// HTTP surface in front of them) returned no usable payload.
    ///
    /// Adapters surface this immediately with no internal retry; retry policy
    /// belongs to the caller.
    #[error("External service error ({provider}): {message}")]
    ExternalService {
        /// The capability provider that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// A store write did not return the expected created row.
    ///
    /// Fatal to the current request; there is no partial commit.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// A store read or connection failed.
    #[error("Store error ({backend}): {message}")]
    Store {
        /// The store backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// An upload request carried no audio file.
    #[error("Upload request carried no audio file")]
    MissingUploadPayload,

    /// The audio capture capability is unavailable on this device.
    ///
    /// Terminal for the recording session; the capture loop never starts.
    #[error("Audio capture unavailable: {0}")]
    CaptureUnsupported(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    Config(String),
}

/// A convenience result type for colloq operations.
pub type Result<T> = std::result::Result<T, ColloqError>;
