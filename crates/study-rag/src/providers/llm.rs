//! LLM provider trait for text and structured generation

use async_trait::async_trait;
use serde::de::DeserializeOwned;

use crate::error::{Error, Result};

/// Per-call generation options
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationOptions {
    /// Overrides the provider's configured temperature
    pub temperature: Option<f32>,
    /// Ask the backend to constrain output to JSON
    pub json: bool,
}

impl GenerationOptions {
    pub fn json() -> Self {
        Self {
            temperature: None,
            json: true,
        }
    }
}

/// Trait for prompt-in, text-out generation models
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Send one prompt and return the raw text of the response
    async fn generate(&self, prompt: &str, options: &GenerationOptions) -> Result<String>;

    /// Check if the provider is healthy and available
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}

/// Generate and parse a typed JSON object.
///
/// A response that does not parse into `T` is reported as
/// [`Error::GenerationParse`]; transport failures propagate unchanged.
pub async fn generate_structured<T: DeserializeOwned>(
    llm: &dyn LlmProvider,
    prompt: &str,
    options: &GenerationOptions,
) -> Result<T> {
    let options = GenerationOptions {
        json: true,
        ..options.clone()
    };
    let raw = llm.generate(prompt, &options).await?;
    parse_structured(&raw)
}

/// Parse a model response into `T`, tolerating markdown fences and chatter
/// around a single JSON object.
pub fn parse_structured<T: DeserializeOwned>(raw: &str) -> Result<T> {
    let trimmed = strip_code_fence(raw.trim());

    if let Ok(value) = serde_json::from_str::<T>(trimmed) {
        return Ok(value);
    }

    let candidate = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if end > start => &trimmed[start..=end],
        _ => trimmed,
    };

    serde_json::from_str::<T>(candidate).map_err(|e| {
        let preview: String = raw.chars().take(120).collect();
        Error::parse(format!("{} (response began: {:?})", e, preview))
    })
}

fn strip_code_fence(text: &str) -> &str {
    let Some(rest) = text.strip_prefix("```") else {
        return text;
    };
    // Drop an optional language tag on the opening fence
    let rest = match rest.find('\n') {
        Some(pos) => &rest[pos + 1..],
        None => rest,
    };
    rest.trim_end().strip_suffix("```").unwrap_or(rest).trim()
}
