//! Embedding generation providers.

use crate::error::MemoryError;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::debug;

/// Default request timeout for embedding calls.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// How much of an unexpected response body to echo into errors.
const BODY_PREVIEW: usize = 300;

/// Trait for embedding providers.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Model identifier. Stored on every record as its provider tag.
    fn model(&self) -> &str;

    /// Expected vector length, when the model has a fixed one.
    fn dimension(&self) -> Option<usize>;

    /// Generate the embedding for a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Reject empty, non-finite, or wrongly sized vectors coming back from a provider.
pub fn check_vector(vector: Vec<f32>, expected: Option<usize>) -> Result<Vec<f32>> {
    if vector.is_empty() {
        return Err(MemoryError::provider("provider returned an empty embedding"));
    }
    if let Some(index) = vector.iter().position(|x| !x.is_finite()) {
        return Err(MemoryError::provider(format!(
            "provider returned a non-finite component at index {index}"
        )));
    }
    if let Some(dimension) = expected {
        if vector.len() != dimension {
            return Err(MemoryError::provider(format!(
                "provider returned {} components, expected {dimension}",
                vector.len()
            )));
        }
    }
    Ok(vector)
}

/// The response shapes a Titan-style endpoint may produce.
///
/// Anything that matches neither variant is a hard [`MemoryError::Provider`].
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum EmbeddingResponse {
    /// `{"embedding": [...]}`
    Single { embedding: Vec<f32> },
    /// `{"embeddings": [[...], ...]}`, first entry is used.
    Batch { embeddings: Vec<Vec<f32>> },
}

impl EmbeddingResponse {
    /// Decode a raw response body.
    pub fn from_slice(body: &[u8]) -> Result<Self> {
        serde_json::from_slice(body).map_err(|_| {
            let text = String::from_utf8_lossy(body);
            let preview: String = text.chars().take(BODY_PREVIEW).collect();
            MemoryError::provider(format!("unexpected embedding response format: {preview}"))
        })
    }

    /// Extract the vector.
    pub fn into_vector(self) -> Result<Vec<f32>> {
        match self {
            Self::Single { embedding } => Ok(embedding),
            Self::Batch { embeddings } => embeddings
                .into_iter()
                .next()
                .ok_or_else(|| MemoryError::provider("response contained an empty embeddings list")),
        }
    }
}

/// Titan-compatible embeddings provider.
///
/// POSTs `{"inputText": ...}` to a JSON endpoint (a Bedrock proxy or any
/// service speaking the same schema) and accepts either response shape in
/// [`EmbeddingResponse`].
pub struct TitanEmbeddings {
    client: Client,
    endpoint: String,
    model: String,
    dimension: Option<usize>,
    token: Option<String>,
}

impl TitanEmbeddings {
    /// Create a new provider posting to `endpoint`.
    pub fn new(endpoint: impl Into<String>, model: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MemoryError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            model: model.into(),
            dimension: None,
            token: None,
        })
    }

    /// Require a fixed vector length, also sent to the endpoint.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = Some(dimension);
        self
    }

    /// Authenticate with a bearer token.
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

#[async_trait]
impl EmbeddingProvider for TitanEmbeddings {
    fn model(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        #[derive(Serialize)]
        #[serde(rename_all = "camelCase")]
        struct Request<'a> {
            input_text: &'a str,
            model_id: &'a str,
            #[serde(skip_serializing_if = "Option::is_none")]
            dimensions: Option<usize>,
        }

        let request = Request {
            input_text: text,
            model_id: &self.model,
            dimensions: self.dimension,
        };

        let mut builder = self
            .client
            .post(&self.endpoint)
            .header("Accept", "application/json")
            .json(&request);
        if let Some(token) = &self.token {
            builder = builder.bearer_auth(token);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;

        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            let preview: String = text.chars().take(BODY_PREVIEW).collect();
            return Err(MemoryError::provider(format!(
                "embedding endpoint returned {}: {}",
                status.as_u16(),
                preview
            )));
        }

        let vector = EmbeddingResponse::from_slice(&body)?.into_vector()?;
        debug!(model = %self.model, dims = vector.len(), "received embedding");
        check_vector(vector, self.dimension)
    }
}

/// OpenAI embeddings provider.
pub struct OpenAIEmbeddings {
    client: Client,
    api_key: String,
    model: String,
    base_url: String,
    dimension: Option<usize>,
}

impl OpenAIEmbeddings {
    /// Create a new OpenAI embeddings provider.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(MemoryError::Config("API key is required".to_string()));
        }

        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| MemoryError::Config(format!("Failed to create HTTP client: {}", e)))?;

        let model = "text-embedding-3-small".to_string();
        Ok(Self {
            client,
            api_key,
            dimension: Self::known_dimension(&model),
            model,
            base_url: "https://api.openai.com".to_string(),
        })
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self.dimension = Self::known_dimension(&self.model);
        self
    }

    /// Override the expected vector length.
    pub fn with_dimension(mut self, dimension: usize) -> Self {
        self.dimension = Some(dimension);
        self
    }

    /// Set a custom base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    fn known_dimension(model: &str) -> Option<usize> {
        match model {
            "text-embedding-3-small" | "text-embedding-ada-002" => Some(1536),
            "text-embedding-3-large" => Some(3072),
            _ => None,
        }
    }
}

#[async_trait]
impl EmbeddingProvider for OpenAIEmbeddings {
    fn model(&self) -> &str {
        &self.model
    }

    fn dimension(&self) -> Option<usize> {
        self.dimension
    }

    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        #[derive(Serialize)]
        struct Request<'a> {
            model: &'a str,
            input: [&'a str; 1],
        }

        #[derive(Deserialize)]
        struct Response {
            data: Vec<EmbeddingData>,
        }

        #[derive(Deserialize)]
        struct EmbeddingData {
            embedding: Vec<f32>,
        }

        let request = Request {
            model: &self.model,
            input: [text],
        };

        let response = self
            .client
            .post(format!("{}/v1/embeddings", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let text = response.text().await.unwrap_or_default();
            return Err(MemoryError::provider(format!("API error {}: {}", status, text)));
        }

        let response: Response = response
            .json()
            .await
            .map_err(|e| MemoryError::provider(format!("unexpected embedding response: {e}")))?;
        let vector = response
            .data
            .into_iter()
            .next()
            .map(|d| d.embedding)
            .ok_or_else(|| MemoryError::provider("No embedding returned"))?;

        check_vector(vector, self.dimension)
    }
}
