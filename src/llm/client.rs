use reqwest::Client;
use tracing::{debug, warn};

use super::types::{GenerateRequest, GenerateResponse};
use crate::config::ModelConfig;

const SYSTEM_INSTRUCTION: &str = "Never use information from previous conversations.";

#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("model '{0}' is not available. Pull it first with `ollama pull {0}`")]
    ModelNotFound(String),

    #[error("model API error ({code}): {message}")]
    Api { code: u16, message: String },

    #[error("model returned an empty response")]
    EmptyResponse,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
}

/// Prompt-in, text-out language model.
/// Implemented by `OllamaClient` for production; mock implementations used in tests.
pub trait TextModel {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError>;
}

#[derive(Clone)]
pub struct OllamaClient {
    http: Client,
    host: String,
    model: String,
}

impl OllamaClient {
    pub fn new(http: Client, config: &ModelConfig) -> Self {
        Self {
            http,
            host: config.host.clone(),
            model: config.model.clone(),
        }
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    #[cfg(test)]
    pub(crate) fn with_base_url(http: Client, base_url: &str) -> Self {
        Self {
            http,
            host: base_url.to_string(),
            model: "test-model".to_string(),
        }
    }
}

impl TextModel for OllamaClient {
    async fn generate(&self, prompt: &str) -> Result<String, LlmError> {
        let url = format!("{}/api/generate", self.host);
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            system: SYSTEM_INSTRUCTION,
            stream: false,
        };

        let response = self
            .http
            .post(&url)
            .header("User-Agent", crate::USER_AGENT)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<GenerateResponse>(&text)
                .ok()
                .and_then(|body| body.error)
                .unwrap_or_else(|| text.chars().take(200).collect());
            let classified = classify_status(status.as_u16(), message, &self.model);
            warn!(error = %classified, "model API error");
            return Err(classified);
        }

        let body: GenerateResponse = response.json().await?;
        if let Some(message) = body.error {
            warn!(%message, "model API error in 200 response");
            return Err(LlmError::Api {
                code: status.as_u16(),
                message,
            });
        }

        let text = body.response.unwrap_or_default().trim().to_string();
        if text.is_empty() {
            return Err(LlmError::EmptyResponse);
        }
        debug!(model = %self.model, chars = text.len(), "generation complete");
        Ok(text)
    }
}

fn classify_status(code: u16, message: String, model: &str) -> LlmError {
    match code {
        404 => LlmError::ModelNotFound(model.to_string()),
        _ => LlmError::Api { code, message },
    }
}


#[cfg(test)]
mod http_tests {
    use super::*;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn generate_success_returns_trimmed_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(serde_json::json!({
                "model": "test-model",
                "prompt": "hello",
                "stream": false
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "model": "test-model",
                "response": "\n```\nTo test things.\n```\n",
                "done": true
            })))
            .mount(&server)
            .await;

        let client = OllamaClient::with_base_url(Client::new(), &server.uri());
        let text = client.generate("hello").await.unwrap();
        assert_eq!(text, "```\nTo test things.\n```");
    }

    #[tokio::test]
    async fn generate_404_returns_model_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(404).set_body_json(serde_json::json!({
                "error": "model \"test-model\" not found, try pulling it first"
            })))
            .mount(&server)
            .await;

        let client = OllamaClient::with_base_url(Client::new(), &server.uri());
        let result = client.generate("hello").await;
        assert!(matches!(result, Err(LlmError::ModelNotFound(_))));
    }

    #[tokio::test]
    async fn generate_500_with_error_body_classified() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(500).set_body_json(serde_json::json!({
                "error": "llama runner process has terminated"
            })))
            .mount(&server)
            .await;

        let client = OllamaClient::with_base_url(Client::new(), &server.uri());
        match client.generate("hello").await {
            Err(LlmError::Api { code: 500, message }) => {
                assert!(message.contains("llama runner"), "got: {message}");
            }
            other => panic!("expected Api(500), got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn generate_500_with_invalid_body_keeps_snippet() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(500).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = OllamaClient::with_base_url(Client::new(), &server.uri());
        match client.generate("hello").await {
            Err(LlmError::Api { code: 500, message }) => assert_eq!(message, "not json"),
            other => panic!("expected Api(500), got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn generate_blank_response_is_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "response": "   ",
                "done": true
            })))
            .mount(&server)
            .await;

        let client = OllamaClient::with_base_url(Client::new(), &server.uri());
        let result = client.generate("hello").await;
        assert!(matches!(result, Err(LlmError::EmptyResponse)));
    }

    #[tokio::test]
    async fn generate_honours_client_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(serde_json::json!({"response": "late"}))
                    .set_delay(std::time::Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let http = Client::builder()
            .timeout(std::time::Duration::from_millis(200))
            .build()
            .unwrap();
        let client = OllamaClient::with_base_url(http, &server.uri());
        match client.generate("hello").await {
            Err(LlmError::Network(e)) => assert!(e.is_timeout(), "got: {e}"),
            other => panic!("expected timeout, got: {other:?}"),
        }
    }

    #[tokio::test]
    async fn generate_unreachable_host_is_network_error() {
        let client = OllamaClient::with_base_url(Client::new(), "http://127.0.0.1:1");
        let result = client.generate("hello").await;
        assert!(matches!(result, Err(LlmError::Network(_))));
    }
}
