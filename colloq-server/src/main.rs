use std::sync::Arc;

#[cfg(feature = "pgvector")]
use colloq_core::capability::EmbeddingProvider;
use colloq_core::store::{ChunkStore, QuestionStore, RoomStore};
use colloq_gemini::GeminiClient;
use colloq_rag::{AnsweringPipeline, MemoryStore};
use colloq_server::server::{AppState, ServerConfig, run_server};
use tracing_subscriber::prelude::*;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let host = std::env::var("COLLOQ_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());
    let port = std::env::var("COLLOQ_PORT")
        .ok()
        .and_then(|value| value.parse::<u16>().ok())
        .unwrap_or(3333);

    let gemini = Arc::new(GeminiClient::from_env()?);
    let state = build_state(gemini).await?;

    run_server(ServerConfig { host, port }, state).await
}

async fn build_state(gemini: Arc<GeminiClient>) -> anyhow::Result<AppState> {
    #[cfg(feature = "pgvector")]
    if let Ok(database_url) = std::env::var("DATABASE_URL") {
        let store = Arc::new(colloq_rag::PgStore::new(&database_url).await?);
        store.ensure_schema(gemini.dimensions()).await?;
        tracing::info!("using the postgres store");
        return state_with_store(store, gemini);
    }

    tracing::info!("using the in-memory store");
    state_with_store(Arc::new(MemoryStore::new()), gemini)
}

fn state_with_store<S>(store: Arc<S>, gemini: Arc<GeminiClient>) -> anyhow::Result<AppState>
where
    S: RoomStore + ChunkStore + QuestionStore + 'static,
{
    let pipeline = AnsweringPipeline::builder()
        .room_store(store.clone())
        .chunk_store(store.clone())
        .question_store(store.clone())
        .transcriber(gemini.clone())
        .embedding_provider(gemini.clone())
        .answer_generator(gemini)
        .build()?;

    Ok(AppState { pipeline: Arc::new(pipeline), rooms: store.clone(), questions: store })
}
