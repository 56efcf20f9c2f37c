//! Shopping assistant backed by a hosted text generation model.

use std::{future::Future, time::Duration};

use async_trait::async_trait;
use reqwest::Client;
use sea_orm::{EntityTrait, QueryOrder};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    config::AppConfig,
    db,
    dto::chat::{ChatRequest, ChatResponse},
    entity::products::{Column as ProdCol, Entity as Products},
    error::{AppError, AppResult},
    models::Product,
    response::ApiResponse,
    state::AppState,
};

pub const FALLBACK_REPLY: &str = "Sorry, I can't provide an answer right now.";

const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
const API_KEY_HEADER: &str = "x-goog-api-key";

#[derive(Debug, Error)]
pub enum GeneratorError {
    #[error("request to text generator failed: {0}")]
    Request(reqwest::Error),

    #[error("text generator answered with status {status}: {body}")]
    Status { status: u16, body: String },
}

// The URL is dropped so request details never carry credentials into logs.
impl From<reqwest::Error> for GeneratorError {
    fn from(err: reqwest::Error) -> Self {
        GeneratorError::Request(err.without_url())
    }
}

impl From<GeneratorError> for AppError {
    fn from(err: GeneratorError) -> Self {
        AppError::Upstream(err.to_string())
    }
}

/// A text generation backend. Returns the concatenated text of the first candidate, which is
/// empty when the model produced no text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError>;
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Part {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    text: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<Content>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

/// Client for the Gemini `generateContent` REST endpoint.
pub struct GeminiClient {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Result<Self, GeneratorError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            client,
            api_key,
            model,
            base_url: GEMINI_BASE_URL.to_string(),
        })
    }

    /// `Ok(None)` when no API key is configured.
    pub fn from_config(config: &AppConfig) -> Result<Option<Self>, GeneratorError> {
        config
            .gemini_api_key
            .clone()
            .map(|key| Self::new(key, config.gemini_model.clone()))
            .transpose()
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some(prompt.to_string()),
                }],
            }],
        };

        let response = self
            .client
            .post(self.endpoint())
            .header(API_KEY_HEADER, &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GeneratorError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = response.json().await?;
        Ok(extract_text(&parsed))
    }
}

fn extract_text(response: &GenerateContentResponse) -> String {
    response
        .candidates
        .first()
        .and_then(|candidate| candidate.content.as_ref())
        .map(|content| {
            content
                .parts
                .iter()
                .filter_map(|part| part.text.as_deref())
                .collect::<String>()
        })
        .unwrap_or_default()
}

pub fn build_prompt(catalog_json: &str, question: &str) -> String {
    format!(
        r#"You are the AI assistant of an online shop called 'Toko Biru'.
Answer customer questions in a friendly, helpful and informative way, based on the product data available.
Always answer in Bahasa Indonesia.

Here is our product data in JSON format:
{catalog_json}

Based on the data above, answer the following customer question: "{question}""#
    )
}

/// Serializes the catalog for the prompt. A failed or overdue read is logged and yields an
/// empty product list.
async fn catalog_context<F>(limit: Duration, read: F) -> String
where
    F: Future<Output = AppResult<Vec<Product>>>,
{
    match db::bounded(limit, read).await {
        Ok(products) => serde_json::to_string(&products).unwrap_or_else(|_| "[]".to_string()),
        Err(err) => {
            tracing::warn!(error = %err, "failed to load products for assistant context");
            "[]".to_string()
        }
    }
}

pub async fn answer(
    state: &AppState,
    payload: ChatRequest,
) -> AppResult<ApiResponse<ChatResponse>> {
    let question = payload.prompt.trim();
    if question.is_empty() {
        return Err(AppError::BadRequest("prompt must not be empty".into()));
    }

    let generator = state
        .assistant
        .as_ref()
        .ok_or_else(|| AppError::Upstream("assistant is not configured".into()))?;

    let catalog = catalog_context(state.config.query_timeout, async {
        let models = Products::find()
            .order_by_asc(ProdCol::Name)
            .all(state.db())
            .await?;
        Ok::<_, AppError>(models.into_iter().map(Product::from).collect())
    })
    .await;

    let text = generator.generate(&build_prompt(&catalog, question)).await?;
    let reply = if text.is_empty() {
        FALLBACK_REPLY.to_string()
    } else {
        text
    };

    Ok(ApiResponse::success("Reply", ChatResponse { reply }, None))
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use sea_orm::{DatabaseBackend, DbErr, MockDatabase};

    use super::*;

    struct StubGenerator {
        reply: Result<String, u16>,
        seen: Mutex<Option<String>>,
    }

    impl StubGenerator {
        fn new(reply: Result<String, u16>) -> Arc<Self> {
            Arc::new(Self {
                reply,
                seen: Mutex::new(None),
            })
        }
    }

    #[async_trait]
    impl TextGenerator for StubGenerator {
        async fn generate(&self, prompt: &str) -> Result<String, GeneratorError> {
            *self.seen.lock().unwrap() = Some(prompt.to_string());
            match &self.reply {
                Ok(text) => Ok(text.clone()),
                Err(status) => Err(GeneratorError::Status {
                    status: *status,
                    body: "quota exceeded".into(),
                }),
            }
        }
    }

    fn state(db: MockDatabase, generator: Option<Arc<StubGenerator>>) -> AppState {
        let config = AppConfig::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://mock".into()),
            "JWT_SECRET" => Some("secret".into()),
            _ => None,
        })
        .unwrap();
        let assistant = generator.map(|g| g as Arc<dyn TextGenerator>);
        AppState::new(db.into_connection(), config, assistant)
    }

    fn ask(prompt: &str) -> ChatRequest {
        ChatRequest {
            prompt: prompt.into(),
        }
    }

    #[test]
    fn extracts_and_joins_first_candidate_parts() {
        let parsed: GenerateContentResponse = serde_json::from_value(serde_json::json!({
            "candidates": [
                { "content": { "parts": [{ "text": "Halo, " }, { "inlineData": {} }, { "text": "ada kopi." }] } },
                { "content": { "parts": [{ "text": "ignored" }] } }
            ]
        }))
        .unwrap();
        assert_eq!(extract_text(&parsed), "Halo, ada kopi.");

        let empty: GenerateContentResponse =
            serde_json::from_value(serde_json::json!({})).unwrap();
        assert_eq!(extract_text(&empty), "");
    }

    #[test]
    fn prompt_embeds_catalog_and_question() {
        let prompt = build_prompt(r#"[{"name":"Kopi"}]"#, "Ada kopi?");
        assert!(prompt.contains(r#"[{"name":"Kopi"}]"#));
        assert!(prompt.contains("\"Ada kopi?\""));
        assert!(prompt.contains("Toko Biru"));
    }

    #[test]
    fn request_body_matches_generate_content_shape() {
        let request = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![Part {
                    text: Some("hi".into()),
                }],
            }],
        };
        assert_eq!(
            serde_json::to_value(&request).unwrap(),
            serde_json::json!({ "contents": [{ "parts": [{ "text": "hi" }] }] })
        );
    }

    #[tokio::test]
    async fn catalog_failure_falls_back_to_empty_context() {
        let generator = StubGenerator::new(Ok("Tidak ada produk.".into()));
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_errors([DbErr::Custom("connection reset".into())]);
        let state = state(db, Some(generator.clone()));

        let reply = answer(&state, ask("Ada teh?")).await.unwrap().data.unwrap();
        assert_eq!(reply.reply, "Tidak ada produk.");

        let seen = generator.seen.lock().unwrap().clone().unwrap();
        assert!(seen.contains("\n[]\n"));
    }

    #[tokio::test]
    async fn stalled_catalog_read_falls_back_to_empty_context() {
        let context = catalog_context(Duration::from_millis(20), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(Vec::new())
        })
        .await;
        assert_eq!(context, "[]");
    }

    #[tokio::test]
    async fn transport_failure_does_not_expose_api_key() {
        let client = GeminiClient::new("SUPERSECRETKEY".into(), "gemini-1.5-flash".into())
            .unwrap()
            .with_base_url("http://127.0.0.1:1");
        assert!(!client.endpoint().contains("SUPERSECRETKEY"));

        let err = client.generate("Halo").await.unwrap_err();
        assert!(matches!(err, GeneratorError::Request(_)));
        assert!(!err.to_string().contains("SUPERSECRETKEY"));
        assert!(!format!("{err:?}").contains("SUPERSECRETKEY"));

        let app_err = AppError::from(err);
        assert!(!format!("{app_err:?}").contains("SUPERSECRETKEY"));
    }

    #[test]
    fn missing_key_builds_no_client() {
        let config = AppConfig::from_lookup(|key| match key {
            "DATABASE_URL" => Some("postgres://mock".into()),
            "JWT_SECRET" => Some("secret".into()),
            _ => None,
        })
        .unwrap();
        assert!(GeminiClient::from_config(&config).unwrap().is_none());
    }

    #[tokio::test]
    async fn empty_generation_uses_fallback_reply() {
        let generator = StubGenerator::new(Ok(String::new()));
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<crate::entity::products::Model>::new()]);
        let state = state(db, Some(generator));

        let reply = answer(&state, ask("Halo")).await.unwrap().data.unwrap();
        assert_eq!(reply.reply, FALLBACK_REPLY);
    }

    #[tokio::test]
    async fn generator_failure_is_upstream_error() {
        let generator = StubGenerator::new(Err(429));
        let db = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<crate::entity::products::Model>::new()]);
        let state = state(db, Some(generator));

        assert!(matches!(
            answer(&state, ask("Halo")).await,
            Err(AppError::Upstream(_))
        ));
    }

    #[tokio::test]
    async fn blank_prompt_is_rejected() {
        let state = state(MockDatabase::new(DatabaseBackend::Postgres), None);
        assert!(matches!(
            answer(&state, ask("   ")).await,
            Err(AppError::BadRequest(_))
        ));
    }
}
