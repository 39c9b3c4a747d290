//! Text generation through a local Ollama server.

use std::time::Duration;

use async_trait::async_trait;
use serde::Deserialize;

use crate::prompts::PromptError;

/// Settings for the prompt-writing model.
#[derive(Debug, Clone)]
pub struct PromptConfig {
    /// Base URL of the Ollama server
    pub base_url: String,

    /// Model name passed to `/api/generate`
    pub model: String,

    /// Request timeout in seconds
    pub timeout_secs: u64,

    /// Sampling temperature for the first attempt
    pub temperature: f64,

    /// Visual style every prompt should follow
    pub style_look: String,

    /// Content every image should avoid
    pub style_avoid: String,
}

impl Default for PromptConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:11434".to_string(),
            model: "llama3".to_string(),
            timeout_secs: 300,
            temperature: 0.2,
            style_look: "clean, warm, modern animal shelter landing, cinematic lighting, ultra detailed"
                .to_string(),
            style_avoid: "text, letters, logos, watermark".to_string(),
        }
    }
}

/// A single non-streaming generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerateRequest {
    /// System instruction
    pub system: String,
    /// User prompt
    pub prompt: String,
    /// Sampling temperature
    pub temperature: f64,
}

/// Something that turns a prompt into free text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Run one generation and return the raw response text.
    async fn generate(&self, request: &GenerateRequest) -> Result<String, PromptError>;
}

/// Response structure from the Ollama generate API.
#[derive(Debug, Deserialize)]
struct OllamaResponse {
    #[serde(default)]
    response: Option<String>,
}

/// Client for Ollama's `/api/generate` endpoint.
pub struct OllamaClient {
    http: reqwest::Client,
    url: String,
    model: String,
}

impl OllamaClient {
    /// Create a client with the configured timeout.
    pub fn new(config: &PromptConfig) -> Result<Self, PromptError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            http,
            url: format!("{}/api/generate", config.base_url.trim_end_matches('/')),
            model: config.model.clone(),
        })
    }

    /// Endpoint URL requests are sent to.
    pub fn url(&self) -> &str {
        &self.url
    }

    fn request_body(&self, request: &GenerateRequest) -> serde_json::Value {
        serde_json::json!({
            "model": self.model,
            "prompt": request.prompt,
            "system": request.system,
            "stream": false,
            "options": { "temperature": request.temperature },
        })
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(&self, request: &GenerateRequest) -> Result<String, PromptError> {
        tracing::debug!(
            "Sending generate request to {} with model '{}' (temperature {})",
            self.url,
            self.model,
            request.temperature
        );

        let response = self
            .http
            .post(&self.url)
            .json(&self.request_body(request))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(PromptError::Status { status, body });
        }

        let data: OllamaResponse = response.json().await?;
        let text = data.response.unwrap_or_default().trim().to_string();

        tracing::debug!("Model answered with {} chars", text.len());

        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_endpoint() {
        let client = OllamaClient::new(&PromptConfig::default()).unwrap();
        assert_eq!(client.url(), "http://127.0.0.1:11434/api/generate");
    }

    #[test]
    fn test_custom_base_url_trailing_slash() {
        let config = PromptConfig {
            base_url: "http://gpu-box:8080/".to_string(),
            ..Default::default()
        };
        let client = OllamaClient::new(&config).unwrap();
        assert_eq!(client.url(), "http://gpu-box:8080/api/generate");
    }

    #[test]
    fn test_request_body_disables_streaming() {
        let client = OllamaClient::new(&PromptConfig::default()).unwrap();
        let body = client.request_body(&GenerateRequest {
            system: "json only".to_string(),
            prompt: "hello".to_string(),
            temperature: 0.0,
        });

        assert_eq!(body["model"], "llama3");
        assert_eq!(body["prompt"], "hello");
        assert_eq!(body["system"], "json only");
        assert_eq!(body["stream"], false);
        assert_eq!(body["options"]["temperature"], 0.0);
    }

    #[test]
    fn test_response_field_is_optional() {
        let data: OllamaResponse = serde_json::from_str(r#"{"model":"llama3","done":true}"#).unwrap();
        assert!(data.response.is_none());
    }

    /// Read one request (headers plus `content-length` body) off the socket.
    async fn read_request(socket: &mut tokio::net::TcpStream) {
        use tokio::io::AsyncReadExt;

        let mut data = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = socket.read(&mut chunk).await.unwrap();
            if n == 0 {
                return;
            }
            data.extend_from_slice(&chunk[..n]);

            let text = String::from_utf8_lossy(&data);
            if let Some(end) = text.find("\r\n\r\n") {
                let length = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if data.len() >= end + 4 + length {
                    return;
                }
            }
        }
    }

    #[tokio::test]
    async fn test_error_status_is_reported_with_body() {
        use tokio::io::AsyncWriteExt;

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let server = tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            read_request(&mut socket).await;
            let body = "model not loaded";
            let reply = format!(
                "HTTP/1.1 500 Internal Server Error\r\ncontent-type: text/plain\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
                body.len(),
                body
            );
            socket.write_all(reply.as_bytes()).await.unwrap();
            socket.shutdown().await.unwrap();
        });

        let config = PromptConfig {
            base_url: format!("http://127.0.0.1:{}", port),
            timeout_secs: 5,
            ..Default::default()
        };
        let client = OllamaClient::new(&config).unwrap();

        let result = client
            .generate(&GenerateRequest {
                system: String::new(),
                prompt: "hi".to_string(),
                temperature: 0.2,
            })
            .await;

        match result {
            Err(PromptError::Status { status, body }) => {
                assert_eq!(status, 500);
                assert_eq!(body, "model not loaded");
            }
            other => panic!("expected status error, got {:?}", other),
        }
        server.await.unwrap();
    }

    #[tokio::test]
    async fn test_unreachable_server_is_http_error() {
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let config = PromptConfig {
            base_url: format!("http://127.0.0.1:{}", port),
            timeout_secs: 5,
            ..Default::default()
        };
        let client = OllamaClient::new(&config).unwrap();

        let result = client
            .generate(&GenerateRequest {
                system: String::new(),
                prompt: "hi".to_string(),
                temperature: 0.2,
            })
            .await;

        assert!(matches!(result, Err(PromptError::Http(_))));
    }
}
