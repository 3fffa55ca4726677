//! HTTP client for an Ollama-style `/api/generate` endpoint.

use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use robocni_core::{ModelQuery, TransportError};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::ndjson::NdjsonDecoder;

/// Default port of the generation service.
pub const DEFAULT_PORT: u16 = 11434;

/// Default model name.
pub const DEFAULT_MODEL: &str = "llama2:13b";

/// Generation service configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OllamaConfig {
    /// Host name or address, optionally with an `http://`/`https://` scheme
    pub host: String,
    pub port: u16,
    pub model: String,
    /// Overall request timeout; `None` waits as long as the model takes
    pub timeout: Option<Duration>,
}

impl OllamaConfig {
    pub fn new(host: &str) -> Self {
        OllamaConfig {
            host: host.trim().trim_end_matches('/').to_string(),
            port: DEFAULT_PORT,
            model: DEFAULT_MODEL.to_string(),
            timeout: None,
        }
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_model(mut self, model: &str) -> Self {
        self.model = model.to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Full URL of the generate endpoint.
    pub fn endpoint(&self) -> String {
        if self.host.starts_with("http://") || self.host.starts_with("https://") {
            format!("{}:{}/api/generate", self.host, self.port)
        } else {
            format!("http://{}:{}/api/generate", self.host, self.port)
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Error body returned with a non-2xx status.
#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// Streaming client for the generation service
pub struct OllamaClient {
    config: OllamaConfig,
    http_client: reqwest::Client,
}

impl OllamaClient {
    pub fn new(config: OllamaConfig) -> Result<Self, TransportError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(concat!("robocni/", env!("CARGO_PKG_VERSION")));
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }
        let http_client = builder
            .build()
            .map_err(|e| TransportError::Unreachable(format!("failed to build HTTP client: {e}")))?;

        Ok(OllamaClient {
            config,
            http_client,
        })
    }

    pub fn config(&self) -> &OllamaConfig {
        &self.config
    }
}

#[async_trait]
impl ModelQuery for OllamaClient {
    async fn query(&self, prompt: &str) -> Result<String, TransportError> {
        let url = self.config.endpoint();
        debug!(url = %url, model = %self.config.model, "Sending generate request");

        let response = self
            .http_client
            .post(&url)
            .json(&GenerateRequest {
                model: &self.config.model,
                prompt,
            })
            .send()
            .await
            .map_err(|e| TransportError::Unreachable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let body = serde_json::from_str::<ErrorBody>(&text)
                .map(|b| b.error)
                .unwrap_or(text);
            return Err(TransportError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let mut stream = response.bytes_stream();
        let mut decoder = NdjsonDecoder::new();
        let mut reply = String::new();
        let mut fragments = 0usize;
        let mut done = false;

        'read: while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| TransportError::Body(e.to_string()))?;
            for fragment in decoder.feed(&chunk)? {
                fragments += 1;
                reply.push_str(&fragment.response);
                if fragment.done {
                    done = true;
                    break 'read;
                }
            }
        }
        if !done {
            if let Some(fragment) = decoder.finish()? {
                fragments += 1;
                reply.push_str(&fragment.response);
            }
        }

        info!(fragments, chars = reply.len(), "Model reply received");
        Ok(reply.trim().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_without_scheme() {
        let config = OllamaConfig::new("10.0.0.5");
        assert_eq!(config.endpoint(), "http://10.0.0.5:11434/api/generate");
        assert_eq!(config.model, "llama2:13b");
    }

    #[test]
    fn test_endpoint_with_scheme_and_port() {
        let config = OllamaConfig::new("https://gpu.lab/").with_port(8443);
        assert_eq!(config.endpoint(), "https://gpu.lab:8443/api/generate");
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(GenerateRequest {
            model: "llama2:13b",
            prompt: "hi",
        })
        .unwrap();
        assert_eq!(body, serde_json::json!({"model": "llama2:13b", "prompt": "hi"}));
    }
}
