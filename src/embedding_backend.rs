//! HTTP client for the remote embedding backend
//!
//! The wire format is fixed at startup from configuration: one request and
//! response shape per provider kind, no per-call response introspection.

use crate::config::EmbeddingConfig;
use crate::error::{Error, Result};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::time::Duration;
use url::Url;

/// Wire formats spoken by supported embedding providers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    /// OpenAI-compatible: POST /embeddings, response `{"data": [{"embedding": [..]}]}`
    OpenAi,
    /// Bare sidecar: POST /embed, response `{"embeddings": [[..]]}`
    Raw,
}

impl FromStr for ProviderKind {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self> {
        match value.to_lowercase().as_str() {
            "openai" | "openai-compatible" => Ok(Self::OpenAi),
            "raw" | "sidecar" => Ok(Self::Raw),
            _ => Err(Error::InvalidConfiguration(format!(
                "Unsupported embedding provider '{}'; use 'openai' or 'raw'",
                value
            ))),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
struct OpenAiEmbedRequest {
    model: String,
    input: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAiEmbedResponse {
    data: Vec<OpenAiEmbeddingData>,
}

#[derive(Debug, Clone, Deserialize)]
struct OpenAiEmbeddingData {
    embedding: Vec<f32>,
}

#[derive(Debug, Clone, Serialize)]
struct RawEmbedRequest {
    model: String,
    inputs: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RawEmbedResponse {
    embeddings: Vec<Vec<f32>>,
}

/// Client for one configured embedding backend
pub struct EmbeddingBackendClient {
    client: Client,
    base_url: Url,
    provider: ProviderKind,
    api_key: Option<String>,
    retries: usize,
}

impl EmbeddingBackendClient {
    pub fn new(config: &EmbeddingConfig) -> Result<Self> {
        let base_url = Url::parse(&config.backend_url)?;
        let provider = config.provider.parse()?;
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            client,
            base_url,
            provider,
            api_key: config.api_key(),
            retries: config.retries,
        })
    }

    fn endpoint(&self, path: &str) -> Result<Url> {
        // Url::join drops the base's trailing path segment for absolute paths
        let mut url = self.base_url.clone();
        {
            let mut segments = url.path_segments_mut().map_err(|_| {
                Error::Config(format!("Embedding backend URL '{}' cannot be a base", self.base_url))
            })?;
            segments.pop_if_empty().push(path);
        }
        Ok(url)
    }

    async fn send_with_retry<T: for<'de> Deserialize<'de>>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<T> {
        let mut last_err: Option<Error> = None;
        for attempt in 0..=self.retries {
            let req = request.try_clone().ok_or_else(|| {
                Error::EmbeddingUnavailable("Failed to clone backend request".to_string())
            })?;
            match req.send().await {
                Ok(response) => match response.error_for_status() {
                    Ok(ok) => {
                        return ok
                            .json::<T>()
                            .await
                            .map_err(|e| Error::EmbeddingUnavailable(e.to_string()));
                    }
                    Err(e) => last_err = Some(Error::EmbeddingUnavailable(e.to_string())),
                },
                Err(e) => last_err = Some(Error::EmbeddingUnavailable(e.to_string())),
            }

            if attempt < self.retries {
                tokio::time::sleep(Duration::from_millis(200 * (attempt + 1) as u64)).await;
            }
        }

        Err(last_err.unwrap_or_else(|| {
            Error::EmbeddingUnavailable("Embedding backend request failed".to_string())
        }))
    }

    /// Embed a batch of texts; output order matches input order
    pub async fn embed_text(&self, model: &str, inputs: Vec<String>) -> Result<Vec<Vec<f32>>> {
        match self.provider {
            ProviderKind::OpenAi => {
                let url = self.endpoint("embeddings")?;
                let request = OpenAiEmbedRequest {
                    model: model.to_string(),
                    input: inputs,
                };
                let mut builder = self.client.post(url).json(&request);
                if let Some(key) = &self.api_key {
                    builder = builder.bearer_auth(key);
                }
                let parsed: OpenAiEmbedResponse = self.send_with_retry(builder).await?;
                Ok(parsed.data.into_iter().map(|d| d.embedding).collect())
            }
            ProviderKind::Raw => {
                let url = self.endpoint("embed")?;
                let request = RawEmbedRequest {
                    model: model.to_string(),
                    inputs,
                };
                let mut builder = self.client.post(url).json(&request);
                if let Some(key) = &self.api_key {
                    builder = builder.bearer_auth(key);
                }
                let parsed: RawEmbedResponse = self.send_with_retry(builder).await?;
                Ok(parsed.embeddings)
            }
        }
    }
}
