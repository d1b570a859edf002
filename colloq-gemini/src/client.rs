//! Gemini client implementing the colloq capability traits.
//!
//! Uses `reqwest` to call `generateContent` and `embedContent` directly,
//! with the API key sent in the `x-goog-api-key` header.

use async_trait::async_trait;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use colloq_core::capability::{AnswerGenerator, EmbeddingProvider, Transcriber};
use colloq_core::error::{ColloqError, Result};

/// The default Generative Language API endpoint.
const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// The model used for transcription and answer generation.
const GENERATION_MODEL: &str = "gemini-2.5-flash";

/// The embedding model.
const EMBEDDING_MODEL: &str = "text-embedding-004";

/// Dimensionality of `text-embedding-004` vectors.
const EMBEDDING_DIMENSIONS: usize = 768;

/// Instruction part sent ahead of the inline audio data.
const TRANSCRIBE_INSTRUCTION: &str = "Transcribe the audio exactly as spoken. Be precise and \
     natural, keep proper punctuation, and break the transcription into paragraphs where \
     appropriate.";

/// A Gemini-backed implementation of [`Transcriber`], [`EmbeddingProvider`],
/// and [`AnswerGenerator`].
///
/// # Configuration
///
/// - `api_key` - from the constructor or the `GEMINI_API_KEY` environment
///   variable
/// - `base_url` - defaults to the public Generative Language endpoint;
///   override with [`GeminiClient::with_base_url`] for proxies or tests
///
/// # Example
///
/// ```rust,ignore
/// use colloq_gemini::GeminiClient;
///
/// let gemini = GeminiClient::new("AIza...")?;
/// let embedding = gemini.embed("hello world").await?;
/// ```
pub struct GeminiClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
}

// Manual impl so the api_key is never printed.
impl std::fmt::Debug for GeminiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiClient {
    /// Create a new client with the given API key.
    ///
    /// # Errors
    ///
    /// Returns [`ColloqError::ExternalService`] if the key is empty.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(ColloqError::ExternalService {
                provider: "Gemini".into(),
                message: "API key must not be empty".into(),
            });
        }

        Ok(Self {
            client: reqwest::Client::new(),
            api_key,
            base_url: DEFAULT_BASE_URL.into(),
        })
    }

    /// Create a new client using the `GEMINI_API_KEY` environment variable.
    ///
    /// # Errors
    ///
    /// Returns [`ColloqError::ExternalService`] if the variable is not set.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").map_err(|_| ColloqError::ExternalService {
            provider: "Gemini".into(),
            message: "GEMINI_API_KEY environment variable not set".into(),
        })?;
        Self::new(api_key)
    }

    /// Override the API base URL (no trailing slash).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self, model: &str, method: &str) -> String {
        format!("{}/models/{model}:{method}", self.base_url)
    }

    async fn post_json<Req, Resp>(&self, url: &str, body: &Req) -> Result<Resp>
    where
        Req: Serialize + Sync,
        Resp: DeserializeOwned,
    {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| {
                error!(provider = "Gemini", error = %e, "request failed");
                ColloqError::ExternalService {
                    provider: "Gemini".into(),
                    message: format!("request failed: {e}"),
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);

            error!(provider = "Gemini", %status, "API error");
            return Err(ColloqError::ExternalService {
                provider: "Gemini".into(),
                message: format!("API returned {status}: {detail}"),
            });
        }

        response.json().await.map_err(|e| {
            error!(provider = "Gemini", error = %e, "failed to parse response");
            ColloqError::ExternalService {
                provider: "Gemini".into(),
                message: format!("failed to parse response: {e}"),
            }
        })
    }
}

/// Build the grounded answer prompt: transcriptions joined by blank lines,
/// with instructions to answer only from that context.
fn answer_prompt(question: &str, context: &[String]) -> String {
    let context = context.join("\n\n");
    format!(
        "Using the text below as context, answer the question clearly and precisely.\n\
         \n\
         CONTEXT:\n\
         {context}\n\
         \n\
         QUESTION:\n\
         {question}\n\
         \n\
         INSTRUCTIONS:\n\
         - Use only information contained in the context above;\n\
         - If the answer is not found in the context, reply that there is not enough \
         information to answer;\n\
         - Be objective;\n\
         - Keep an educational, professional tone;\n\
         - Quote relevant excerpts from the context when appropriate;\n\
         - When quoting the context, refer to it as \"recorded content\";"
    )
}

// ── Generative Language API request/response types ─────────────────

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct EmbedContentRequest<'a> {
    content: Content<'a>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Serialize)]
enum Part<'a> {
    #[serde(rename = "text")]
    Text(&'a str),
    #[serde(rename = "inlineData")]
    InlineData(InlineData<'a>),
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

#[derive(Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

impl GenerateContentResponse {
    /// Concatenated text parts of the first candidate, or `None` when the
    /// response carried no text at all.
    fn text(&self) -> Option<String> {
        let parts = &self.candidates.first()?.content.as_ref()?.parts;
        let text: String =
            parts.iter().filter_map(|p| p.text.as_deref()).collect::<Vec<_>>().join("");
        if text.is_empty() { None } else { Some(text) }
    }
}

#[derive(Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct EmbedContentResponse {
    embedding: ContentEmbedding,
}

#[derive(Deserialize)]
struct ContentEmbedding {
    values: Vec<f32>,
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

// ── Capability implementations ─────────────────────────────────────

#[async_trait]
impl Transcriber for GeminiClient {
    async fn transcribe(&self, audio: &[u8], mime_type: &str) -> Result<String> {
        debug!(
            provider = "Gemini",
            audio_len = audio.len(),
            mime_type,
            "transcribing audio segment"
        );

        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text(TRANSCRIBE_INSTRUCTION),
                    Part::InlineData(InlineData { mime_type, data: BASE64.encode(audio) }),
                ],
            }],
        };

        let url = self.endpoint(GENERATION_MODEL, "generateContent");
        let response: GenerateContentResponse = self.post_json(&url, &request).await?;
        response.text().ok_or_else(|| ColloqError::ExternalService {
            provider: "Gemini".into(),
            message: "transcription returned no text".into(),
        })
    }
}

#[async_trait]
impl EmbeddingProvider for GeminiClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        debug!(provider = "Gemini", text_len = text.len(), "embedding text");

        let request = EmbedContentRequest { content: Content { parts: vec![Part::Text(text)] } };
        let url = self.endpoint(EMBEDDING_MODEL, "embedContent");
        let response: EmbedContentResponse = self.post_json(&url, &request).await?;

        if response.embedding.values.is_empty() {
            return Err(ColloqError::ExternalService {
                provider: "Gemini".into(),
                message: "embedding returned no values".into(),
            });
        }
        Ok(response.embedding.values)
    }

    fn dimensions(&self) -> usize {
        EMBEDDING_DIMENSIONS
    }
}

#[async_trait]
impl AnswerGenerator for GeminiClient {
    async fn generate_answer(&self, question: &str, context: &[String]) -> Result<String> {
        debug!(provider = "Gemini", context_chunks = context.len(), "generating answer");

        let prompt = answer_prompt(question, context);
        let request = GenerateContentRequest {
            contents: vec![Content { parts: vec![Part::Text(&prompt)] }],
        };

        let url = self.endpoint(GENERATION_MODEL, "generateContent");
        let response: GenerateContentResponse = self.post_json(&url, &request).await?;
        response.text().ok_or_else(|| ColloqError::ExternalService {
            provider: "Gemini".into(),
            message: "answer generation returned no text".into(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    // ── Response parsing ───────────────────────────────────────────

    #[test]
    fn parse_generate_content_text() {
        let json = json!({
            "candidates": [{
                "content": {
                    "parts": [{"text": "Hello, "}, {"text": "world!"}],
                    "role": "model"
                },
                "finishReason": "STOP"
            }]
        });

        let resp: GenerateContentResponse = serde_json::from_value(json).unwrap();
        assert_eq!(resp.text().as_deref(), Some("Hello, world!"));
    }

    #[test]
    fn parse_generate_content_without_candidates() {
        let resp: GenerateContentResponse = serde_json::from_value(json!({})).unwrap();
        assert_eq!(resp.text(), None);
    }

    #[test]
    fn parse_generate_content_with_empty_parts() {
        let json = json!({
            "candidates": [{
                "content": {"parts": [], "role": "model"},
                "finishReason": "STOP"
            }]
        });

        let resp: GenerateContentResponse = serde_json::from_value(json).unwrap();
        assert_eq!(resp.text(), None);
    }

    #[test]
    fn parse_embed_content_values() {
        let json = json!({"embedding": {"values": [0.25, -0.5, 0.75]}});

        let resp: EmbedContentResponse = serde_json::from_value(json).unwrap();
        assert_eq!(resp.embedding.values, vec![0.25, -0.5, 0.75]);
    }

    #[test]
    fn parse_error_detail() {
        let json = json!({
            "error": {"code": 400, "message": "API key not valid", "status": "INVALID_ARGUMENT"}
        });

        let resp: ErrorResponse = serde_json::from_value(json).unwrap();
        assert_eq!(resp.error.message, "API key not valid");
    }

    // ── Request serialization ──────────────────────────────────────

    #[test]
    fn inline_data_part_serializes_camel_case() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![
                    Part::Text("transcribe this"),
                    Part::InlineData(InlineData {
                        mime_type: "audio/webm",
                        data: "aGVsbG8=".to_string(),
                    }),
                ],
            }],
        };

        let value = serde_json::to_value(&request).unwrap();
        let parts = &value["contents"][0]["parts"];
        assert_eq!(parts[0]["text"], "transcribe this");
        assert_eq!(parts[1]["inlineData"]["mimeType"], "audio/webm");
        assert_eq!(parts[1]["inlineData"]["data"], "aGVsbG8=");
    }

    // ── Prompt construction ────────────────────────────────────────

    #[test]
    fn answer_prompt_joins_context_with_blank_lines() {
        let context =
            vec!["The beta shipped on Tuesday".to_string(), "QA signed off".to_string()];
        let prompt = answer_prompt("When did the beta ship?", &context);

        assert!(prompt.contains("CONTEXT:\nThe beta shipped on Tuesday\n\nQA signed off\n"));
        assert!(prompt.contains("QUESTION:\nWhen did the beta ship?"));
        assert!(prompt.contains("Use only information contained in the context"));
    }

    // ── Client construction ────────────────────────────────────────

    #[test]
    fn rejects_empty_api_key() {
        let err = GeminiClient::new("").unwrap_err();
        assert!(matches!(err, ColloqError::ExternalService { .. }), "unexpected error: {err}");
    }

    #[test]
    fn reports_embedding_dimensions() {
        let client = GeminiClient::new("test-key").unwrap();
        assert_eq!(client.dimensions(), EMBEDDING_DIMENSIONS);
    }

    #[test]
    fn endpoint_joins_base_model_and_method() {
        let client = GeminiClient::new("test-key").unwrap().with_base_url("http://localhost:9");
        assert_eq!(
            client.endpoint(GENERATION_MODEL, "generateContent"),
            "http://localhost:9/models/gemini-2.5-flash:generateContent"
        );
    }
}
