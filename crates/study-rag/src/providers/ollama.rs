//! Ollama-based providers for embeddings and generation
//!
//! One `OllamaClient` holds the HTTP pool and retry policy; the embedder and
//! the LLM providers share it through an `Arc`.

use async_trait::async_trait;
use futures::future::try_join_all;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;

use crate::config::{EmbeddingConfig, LlmConfig};
use crate::error::{Error, Result};

use super::embedding::EmbeddingProvider;
use super::llm::{GenerationOptions, LlmProvider};

const PROVIDER: &str = "ollama";

/// Ollama API client with automatic retry
pub struct OllamaClient {
    /// HTTP client
    client: Client,
    base_url: String,
    /// Maximum retries
    max_retries: u32,
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    format: Option<&'a str>,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Vec<f32>,
}

impl OllamaClient {
    /// Create a new Ollama client with retry support
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .pool_max_idle_per_host(5)
            .build()
            .map_err(|e| Error::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_retries: config.max_retries,
        })
    }

    /// Retry a request with exponential backoff.
    ///
    /// Timeouts are returned immediately: the caller's deadline already ran out.
    async fn retry_request<F, Fut, T>(&self, operation: F) -> Result<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = Result<T>>,
    {
        let mut last_error = None;

        for attempt in 0..=self.max_retries {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e @ Error::ProviderTimeout { .. }) => return Err(e),
                Err(e) => {
                    last_error = Some(e);
                    if attempt < self.max_retries {
                        let delay = Duration::from_secs(2u64.pow(attempt));
                        tracing::warn!(
                            "Request failed (attempt {}/{}), retrying in {:?}",
                            attempt + 1,
                            self.max_retries + 1,
                            delay
                        );
                        sleep(delay).await;
                    }
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::llm("Unknown error")))
    }

    /// Check if Ollama is available
    pub async fn health_check(&self) -> Result<bool> {
        let url = format!("{}/api/tags", self.base_url);

        match self.client.get(&url).send().await {
            Ok(response) => Ok(response.status().is_success()),
            Err(_) => Ok(false),
        }
    }

    /// Generate an embedding with retry
    pub async fn embed(&self, model: &str, text: &str) -> Result<Vec<f32>> {
        let url = format!("{}/api/embeddings", self.base_url);

        self.retry_request(|| async {
            let response = self
                .client
                .post(&url)
                .json(&EmbedRequest { model, prompt: text })
                .send()
                .await
                .map_err(|e| transport_error("embed", e))?;

            if !response.status().is_success() {
                return Err(Error::embedding(format!(
                    "Embedding failed: HTTP {}",
                    response.status()
                )));
            }

            let embed_response: EmbedResponse = response.json().await.map_err(|e| {
                Error::embedding(format!("Failed to parse embedding response: {}", e))
            })?;

            Ok(embed_response.embedding)
        })
        .await
    }

    /// Run one non-streaming generation with retry
    pub async fn generate(
        &self,
        model: &str,
        prompt: &str,
        temperature: f32,
        json: bool,
    ) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        tracing::debug!("Generating with model: {} (json={})", model, json);

        self.retry_request(|| async {
            let request = GenerateRequest {
                model,
                prompt,
                stream: false,
                format: json.then_some("json"),
                options: GenerateOptions { temperature },
            };

            let response = self
                .client
                .post(&url)
                .json(&request)
                .send()
                .await
                .map_err(|e| transport_error("generate", e))?;

            if !response.status().is_success() {
                let status = response.status();
                let body = response.text().await.unwrap_or_default();
                return Err(Error::llm(format!(
                    "Generation failed: HTTP {} - {}",
                    status, body
                )));
            }

            let generate_response: GenerateResponse = response.json().await.map_err(|e| {
                Error::llm(format!("Failed to parse generation response: {}", e))
            })?;

            Ok(generate_response.response.trim().to_string())
        })
        .await
    }
}

fn transport_error(operation: &str, err: reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::timeout(PROVIDER, operation)
    } else if err.is_connect() {
        Error::unavailable(PROVIDER, err.to_string())
    } else {
        Error::Http(err)
    }
}

/// Ollama embedding provider using nomic-embed-text or similar models
pub struct OllamaEmbedder {
    client: Arc<OllamaClient>,
    model: String,
    dimensions: usize,
    concurrency: usize,
}

impl OllamaEmbedder {
    /// Create from an existing OllamaClient
    pub fn from_client(client: Arc<OllamaClient>, config: &EmbeddingConfig) -> Self {
        Self {
            client,
            model: config.model.clone(),
            dimensions: config.dimensions,
            concurrency: config.concurrency.max(1),
        }
    }

    /// Embedder for a different model on the same client (used by the re-ranker)
    pub fn with_model(client: Arc<OllamaClient>, model: impl Into<String>, dimensions: usize) -> Self {
        Self {
            client,
            model: model.into(),
            dimensions,
            concurrency: 1,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OllamaEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        let vector = self.client.embed(&self.model, text).await?;
        if self.dimensions != 0 && vector.len() != self.dimensions {
            return Err(Error::embedding(format!(
                "{} returned {} dimensions, expected {}",
                self.model,
                vector.len(),
                self.dimensions
            )));
        }
        Ok(vector)
    }

    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>> {
        // No native batch endpoint; fan out with a bounded number in flight
        let mut vectors = Vec::with_capacity(texts.len());
        for batch in texts.chunks(self.concurrency.max(1)) {
            let mut calls = Vec::with_capacity(batch.len());
            for text in batch {
                calls.push(self.embed(text));
            }
            vectors.extend(try_join_all(calls).await?);
        }
        Ok(vectors)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        PROVIDER
    }
}

/// Ollama LLM provider for answers, summaries, judging and quiz items
pub struct OllamaLlm {
    client: Arc<OllamaClient>,
    model: String,
    temperature: f32,
}

impl OllamaLlm {
    /// Create from an existing OllamaClient
    pub fn from_client(client: Arc<OllamaClient>, model: impl Into<String>, temperature: f32) -> Self {
        Self {
            client,
            model: model.into(),
            temperature,
        }
    }
}

#[async_trait]
impl LlmProvider for OllamaLlm {
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String> {
        let temperature = options.temperature.unwrap_or(self.temperature);
        self.client
            .generate(&self.model, prompt, temperature, options.json)
            .await
    }

    async fn health_check(&self) -> Result<bool> {
        self.client.health_check().await
    }

    fn name(&self) -> &str {
        PROVIDER
    }

    fn model(&self) -> &str {
        &self.model
    }
}
