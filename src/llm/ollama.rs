//! Ollama client

use super::LanguageModel;
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;
use url::Url;

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Non-streaming client for `POST /api/generate`
pub struct OllamaClient {
    client: Client,
    endpoint: Url,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: &str, model: &str) -> Result<Self> {
        let endpoint = Url::parse(base_url)?
            .join("/api/generate")
            .map_err(|e| Error::Config(format!("Invalid LLM URL: {}", e)))?;

        Ok(Self {
            client: Client::builder().build()?,
            endpoint,
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl LanguageModel for OllamaClient {
    async fn complete(&self, prompt: &str, timeout: Duration) -> Result<String> {
        debug!(
            "Sending {} byte prompt to {} ({})",
            prompt.len(),
            self.endpoint,
            self.model
        );

        let body = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let map_send_error = |e: reqwest::Error| {
            if e.is_timeout() {
                Error::Timeout(timeout)
            } else {
                Error::Llm(format!("Request to {} failed: {}", self.endpoint, e))
            }
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .timeout(timeout)
            .json(&body)
            .send()
            .await
            .map_err(map_send_error)?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            return Err(Error::Llm(format!("Ollama returned {}: {}", status, detail)));
        }

        let parsed: GenerateResponse = response.json().await.map_err(|e| {
            if e.is_timeout() {
                Error::Timeout(timeout)
            } else {
                Error::Llm(format!("Invalid Ollama response: {}", e))
            }
        })?;

        Ok(parsed.response)
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_complete_returns_response_text() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .and(body_partial_json(json!({"model": "llama3.2", "stream": false})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "model": "llama3.2",
                "response": "Paris.",
                "done": true
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = OllamaClient::new(&server.uri(), "llama3.2").unwrap();
        let answer = client
            .complete("What is the capital of France?", Duration::from_secs(5))
            .await
            .unwrap();
        assert_eq!(answer, "Paris.");
    }

    #[tokio::test]
    async fn test_error_status_is_llm_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(ResponseTemplate::new(404).set_body_string("model not found"))
            .mount(&server)
            .await;

        let client = OllamaClient::new(&server.uri(), "missing").unwrap();
        let err = client.complete("hi", Duration::from_secs(5)).await.unwrap_err();
        match err {
            Error::Llm(message) => assert!(message.contains("model not found")),
            other => panic!("expected llm error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_slow_response_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/generate"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"response": "late"}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let client = OllamaClient::new(&server.uri(), "llama3.2").unwrap();
        let err = client
            .complete("hi", Duration::from_millis(100))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Timeout(_)));
    }
}
