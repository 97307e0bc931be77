//! OpenAI-compatible chat-completions provider.
//!
//! Posts the instruction and user message to `{base_url}/chat/completions`
//! using [`reqwest`] and returns the first choice's message content.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{GenerationPrompt, ProviderError, TextGenerator};

/// Connection and sampling settings for [`OpenAiGenerator`].
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    /// Base URL without a trailing slash, e.g. `https://api.openai.com/v1`.
    pub base_url: String,
    pub model: String,
    pub temperature: f32,
    /// Upper bound on one HTTP exchange; exceeding it is a network failure.
    pub timeout: Duration,
}

impl OpenAiConfig {
    pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
    pub const DEFAULT_MODEL: &str = "gpt-4o";
    pub const DEFAULT_TEMPERATURE: f32 = 0.7;
    pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

    /// Defaults for everything but the key.
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            base_url: Self::DEFAULT_BASE_URL.to_string(),
            model: Self::DEFAULT_MODEL.to_string(),
            temperature: Self::DEFAULT_TEMPERATURE,
            timeout: Duration::from_secs(Self::DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Chat-completions client implementing [`TextGenerator`].
pub struct OpenAiGenerator {
    client: reqwest::Client,
    config: OpenAiConfig,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
    temperature: f32,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_format: Option<ResponseFormat>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ReplyMessage,
}

#[derive(Debug, Deserialize)]
struct ReplyMessage {
    #[serde(default)]
    content: Option<String>,
}

impl OpenAiGenerator {
    pub fn new(config: OpenAiConfig) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProviderError::Network(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { client, config })
    }

    /// Reuse an existing [`reqwest::Client`] (connection pooling across
    /// providers). The client's own timeout applies.
    pub fn with_client(client: reqwest::Client, config: OpenAiConfig) -> Self {
        Self { client, config }
    }

    fn endpoint(&self) -> String {
        format!("{}/chat/completions", self.config.base_url.trim_end_matches('/'))
    }

    fn request_body<'a>(&'a self, prompt: &'a GenerationPrompt) -> ChatRequest<'a> {
        ChatRequest {
            model: &self.config.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: &prompt.instruction,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user_message,
                },
            ],
            temperature: self.config.temperature,
            response_format: prompt.json_output.then_some(ResponseFormat {
                kind: "json_object",
            }),
        }
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, prompt: &GenerationPrompt) -> Result<String, ProviderError> {
        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.config.api_key)
            .json(&self.request_body(prompt))
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(ProviderError::Service {
                status: Some(status.as_u16()),
                message: body,
            });
        }

        let reply: ChatResponse = response.json().await.map_err(|e| ProviderError::Service {
            status: Some(status.as_u16()),
            message: format!("malformed completion envelope: {e}"),
        })?;

        let choice = reply.choices.into_iter().next().ok_or(ProviderError::Service {
            status: Some(status.as_u16()),
            message: "completion contained no choices".to_string(),
        })?;

        let content = choice.message.content.unwrap_or_default();
        debug!(model = %self.config.model, bytes = content.len(), "completion received");
        Ok(content)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::{Arc, Mutex};

    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};

    use super::*;

    #[derive(Clone)]
    struct Canned {
        status: StatusCode,
        body: Value,
        seen: Arc<Mutex<Vec<(Option<String>, Value)>>>,
    }

    async fn completions(
        State(canned): State<Canned>,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> (StatusCode, Json<Value>) {
        let auth = headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        canned.seen.lock().unwrap().push((auth, body));
        (canned.status, Json(canned.body.clone()))
    }

    /// Serve `body` with `status` on a random local port; returns the base
    /// URL and the log of received requests.
    async fn spawn_server(
        status: StatusCode,
        body: Value,
    ) -> (String, Arc<Mutex<Vec<(Option<String>, Value)>>>) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let app = Router::new()
            .route("/v1/chat/completions", post(completions))
            .with_state(Canned {
                status,
                body,
                seen: seen.clone(),
            });
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        (format!("http://{addr}/v1"), seen)
    }

    fn generator(base_url: &str) -> OpenAiGenerator {
        let mut config = OpenAiConfig::new("sk-test");
        config.base_url = base_url.to_string();
        config.timeout = Duration::from_secs(5);
        OpenAiGenerator::new(config).unwrap()
    }

    fn prompt() -> GenerationPrompt {
        GenerationPrompt {
            instruction: "system rules".to_string(),
            user_message: "skill_name: Rust".to_string(),
            json_output: true,
        }
    }

    #[test]
    fn config_defaults() {
        let config = OpenAiConfig::new("key");
        assert_eq!(config.model, "gpt-4o");
        assert_eq!(config.base_url, "https://api.openai.com/v1");
        assert!((config.temperature - 0.7).abs() < f32::EPSILON);
    }

    #[test]
    fn endpoint_tolerates_trailing_slash() {
        let g = generator("http://localhost:9999/v1/");
        assert_eq!(g.endpoint(), "http://localhost:9999/v1/chat/completions");
    }

    #[tokio::test]
    async fn returns_first_choice_content_and_sends_contract() {
        let body = json!({"choices": [{"message": {"role": "assistant", "content": "{\"weeks\": []}"}}]});
        let (url, seen) = spawn_server(StatusCode::OK, body).await;

        let text = generator(&url).generate(&prompt()).await.unwrap();
        assert_eq!(text, "{\"weeks\": []}");

        let seen = seen.lock().unwrap();
        let (auth, request) = &seen[0];
        assert_eq!(auth.as_deref(), Some("Bearer sk-test"));
        assert_eq!(request["model"], "gpt-4o");
        assert_eq!(request["messages"][0]["role"], "system");
        assert_eq!(request["messages"][0]["content"], "system rules");
        assert_eq!(request["messages"][1]["role"], "user");
        assert_eq!(request["response_format"]["type"], "json_object");
    }

    #[tokio::test]
    async fn omits_response_format_when_not_requested() {
        let body = json!({"choices": [{"message": {"content": "ok"}}]});
        let (url, seen) = spawn_server(StatusCode::OK, body).await;

        let mut p = prompt();
        p.json_output = false;
        generator(&url).generate(&p).await.unwrap();

        let seen = seen.lock().unwrap();
        assert!(seen[0].1.get("response_format").is_none());
    }

    #[tokio::test]
    async fn null_content_becomes_empty_string() {
        let body = json!({"choices": [{"message": {"content": null}}]});
        let (url, _) = spawn_server(StatusCode::OK, body).await;

        let text = generator(&url).generate(&prompt()).await.unwrap();
        assert!(text.is_empty());
    }

    #[tokio::test]
    async fn non_success_status_is_service_error() {
        let body = json!({"error": {"message": "quota exceeded"}});
        let (url, _) = spawn_server(StatusCode::TOO_MANY_REQUESTS, body).await;

        let err = generator(&url).generate(&prompt()).await.unwrap_err();
        match err {
            ProviderError::Service { status, message } => {
                assert_eq!(status, Some(429));
                assert!(message.contains("quota exceeded"), "body should be kept: {message}");
            }
            other => panic!("expected Service, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn empty_choices_is_service_error() {
        let (url, _) = spawn_server(StatusCode::OK, json!({"choices": []})).await;

        let err = generator(&url).generate(&prompt()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Service { .. }), "got {err:?}");
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        // Bind then drop to get a port nothing listens on.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = generator(&format!("http://{addr}/v1"))
            .generate(&prompt())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)), "got {err:?}");
    }
}
