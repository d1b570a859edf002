//! axum router, handlers, and the serve loop.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info, warn};
use uuid::Uuid;

use colloq_core::error::ColloqError;
use colloq_core::model::{Question, Room};
use colloq_core::store::{QuestionStore, RoomStore};
use colloq_rag::AnsweringPipeline;

use crate::protocol::{
    CreateQuestionRequest, CreateQuestionResponse, CreateRoomRequest, CreateRoomResponse,
    ErrorBody, UploadAudioResponse,
};

/// Uploaded segments are a few hundred KB of compressed audio; leave ample
/// headroom.
const MAX_UPLOAD_BYTES: usize = 25 * 1024 * 1024;

/// Shared handler state: the answering pipeline plus direct store access for
/// the listing routes.
#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<AnsweringPipeline>,
    pub rooms: Arc<dyn RoomStore>,
    pub questions: Arc<dyn QuestionStore>,
}

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "127.0.0.1".to_string(), port: 3333 }
    }
}

pub fn app_router(state: AppState) -> Router {
    let cors = CorsLayer::new().allow_origin(Any).allow_methods(Any).allow_headers(Any);

    Router::new()
        .route("/health", get(health))
        .route("/rooms", get(list_rooms).post(create_room))
        .route("/rooms/{room_id}/questions", get(list_questions).post(create_question))
        .route("/rooms/{room_id}/audio", post(upload_audio))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
        .layer(cors)
}

pub async fn run_server(config: ServerConfig, state: AppState) -> anyhow::Result<()> {
    let app = app_router(state);
    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .with_context(|| "invalid host/port for colloq server")?;

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("colloq listening on http://{}", addr);
    axum::serve(listener, app).await?;
    Ok(())
}

/// Map a pipeline/store failure to its HTTP reply.
fn error_reply(err: ColloqError) -> (StatusCode, Json<ErrorBody>) {
    match &err {
        ColloqError::RoomNotFound { .. } => {
            warn!(error = %err, "request referenced a missing room");
            (StatusCode::NOT_FOUND, Json(ErrorBody::message("Room does not exist")))
        }
        ColloqError::MissingUploadPayload => {
            warn!("audio upload without a file field");
            (StatusCode::BAD_REQUEST, Json(ErrorBody::upload_error("Missing audio file")))
        }
        ColloqError::Persistence(message) => {
            error!(error = %err, "store write failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody::message(message.clone())))
        }
        _ => {
            error!(error = %err, "request failed");
            (StatusCode::INTERNAL_SERVER_ERROR, Json(ErrorBody::message(err.to_string())))
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(json!({"status": "ok", "service": "colloq"}))
}

async fn create_room(
    State(state): State<AppState>,
    Json(request): Json<CreateRoomRequest>,
) -> Result<(StatusCode, Json<CreateRoomResponse>), (StatusCode, Json<ErrorBody>)> {
    if request.name.is_empty() {
        return Err((StatusCode::BAD_REQUEST, Json(ErrorBody::message("name must not be empty"))));
    }

    let room = state.rooms.create_room(&request.name).await.map_err(error_reply)?;
    info!(room_id = %room.id, "created room");
    Ok((StatusCode::CREATED, Json(CreateRoomResponse { room_id: room.id })))
}

async fn list_rooms(
    State(state): State<AppState>,
) -> Result<Json<Vec<Room>>, (StatusCode, Json<ErrorBody>)> {
    let rooms = state.rooms.list_rooms().await.map_err(error_reply)?;
    Ok(Json(rooms))
}

async fn create_question(
    Path(room_id): Path<Uuid>,
    State(state): State<AppState>,
    Json(request): Json<CreateQuestionRequest>,
) -> Result<(StatusCode, Json<CreateQuestionResponse>), (StatusCode, Json<ErrorBody>)> {
    if request.question.is_empty() {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorBody::message("question must not be empty")),
        ));
    }

    let question =
        state.pipeline.answer_question(room_id, &request.question).await.map_err(error_reply)?;
    let answer = question.answer.clone();
    Ok((StatusCode::CREATED, Json(CreateQuestionResponse { question, answer })))
}

async fn list_questions(
    Path(room_id): Path<Uuid>,
    State(state): State<AppState>,
) -> Result<Json<Vec<Question>>, (StatusCode, Json<ErrorBody>)> {
    if !state.rooms.room_exists(room_id).await.map_err(error_reply)? {
        return Err(error_reply(ColloqError::RoomNotFound { room_id }));
    }

    let questions = state.questions.list_questions(room_id).await.map_err(error_reply)?;
    Ok(Json(questions))
}

async fn upload_audio(
    Path(room_id): Path<Uuid>,
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<UploadAudioResponse>), (StatusCode, Json<ErrorBody>)> {
    let mut audio: Option<(Vec<u8>, String)> = None;
    // First file-bearing field wins; bare text fields are skipped.
    while let Some(field) = multipart.next_field().await.map_err(|e| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorBody::message(format!("invalid multipart payload: {e}"))),
        )
    })? {
        if field.file_name().is_none() {
            continue;
        }
        let mime_type = field.content_type().unwrap_or("audio/webm").to_string();
        let data = field.bytes().await.map_err(|e| {
            (
                StatusCode::BAD_REQUEST,
                Json(ErrorBody::message(format!("invalid multipart payload: {e}"))),
            )
        })?;
        audio = Some((data.to_vec(), mime_type));
        break;
    }

    let Some((data, mime_type)) = audio else {
        return Err(error_reply(ColloqError::MissingUploadPayload));
    };

    let chunk =
        state.pipeline.ingest_segment(room_id, &data, &mime_type).await.map_err(error_reply)?;
    Ok((StatusCode::CREATED, Json(UploadAudioResponse { chunk_id: chunk.id })))
}
