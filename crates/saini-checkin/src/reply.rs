//! Reply generation.
//!
//! [`ChatReplyGenerator`] talks to an OpenAI-compatible chat completion API.
//! [`FallbackReplies`] produces a fixed line per tier and never fails.
//! [`WithFallback`] wraps a generator so the check-in flow always has a reply.

use crate::error::CheckinError;
use crate::Result;
use async_trait::async_trait;
use reqwest::Client;
use saini_core::{config::ReplyConfig, Tier};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, warn};

/// Default OpenAI API base URL.
const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";

/// Tone attached when a reply does not name one.
pub const DEFAULT_TONE: &str = "gentle";

/// A past exchange offered as context.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ContextTurn {
    pub message: String,
    pub response: Option<String>,
}

/// Input to a reply generator.
#[derive(Debug, Clone, Serialize)]
pub struct ReplyRequest {
    pub owner_id: String,
    pub message: String,
    pub tier: Tier,
    pub context: Vec<ContextTurn>,
}

impl ReplyRequest {
    /// Request a reply to `message`.
    pub fn new(owner_id: impl Into<String>, message: impl Into<String>, tier: Tier) -> Self {
        Self {
            owner_id: owner_id.into(),
            message: message.into(),
            tier,
            context: Vec::new(),
        }
    }

    /// Attach related past exchanges.
    pub fn with_context(mut self, context: Vec<ContextTurn>) -> Self {
        self.context = context;
        self
    }

    /// Whether this asks for an inactivity nudge rather than a reply.
    pub fn is_nudge(&self) -> bool {
        self.tier == Tier::Auto
    }
}

/// A generated reply.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    pub text: String,
    pub tone: String,
    /// Generator that produced the reply.
    #[serde(default)]
    pub source: String,
}

/// Trait for reply generators.
#[async_trait]
pub trait ReplyGenerator: Send + Sync {
    /// Short name used as the reply source.
    fn name(&self) -> &str;

    /// Generate a reply.
    async fn generate(&self, request: &ReplyRequest) -> Result<Reply>;
}

#[async_trait]
impl<T: ReplyGenerator + ?Sized> ReplyGenerator for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn generate(&self, request: &ReplyRequest) -> Result<Reply> {
        (**self).generate(request).await
    }
}

/// Deterministic per-tier replies.
#[derive(Debug, Clone, Copy, Default)]
pub struct FallbackReplies;

impl FallbackReplies {
    /// Fixed text for a tier.
    pub fn text_for(tier: Tier) -> &'static str {
        match tier {
            Tier::Stable => "You're doing steady work. Want to stay in this rhythm or stretch a bit today?",
            Tier::Stirred => "Seems like something's shifting. Want to talk about it or take a breather?",
            Tier::AtRisk => "I noticed some strain. Would it help to look at next steps or just pause?",
            Tier::Critical => "This sounds heavy. I can stay here, or bring in someone you trust.",
            Tier::Auto => "Just checking in gently. How are you feeling today?",
        }
    }

    /// Reply for a tier without going through the trait.
    pub fn reply(tier: Tier) -> Reply {
        Reply {
            text: Self::text_for(tier).to_string(),
            tone: DEFAULT_TONE.to_string(),
            source: "fallback".to_string(),
        }
    }
}

#[async_trait]
impl ReplyGenerator for FallbackReplies {
    fn name(&self) -> &str {
        "fallback"
    }

    async fn generate(&self, request: &ReplyRequest) -> Result<Reply> {
        Ok(Self::reply(request.tier))
    }
}

/// Uses the fallback reply whenever the inner generator fails.
pub struct WithFallback<G> {
    inner: G,
}

impl<G: ReplyGenerator> WithFallback<G> {
    /// Wrap `inner`.
    pub fn new(inner: G) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl<G: ReplyGenerator> ReplyGenerator for WithFallback<G> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn generate(&self, request: &ReplyRequest) -> Result<Reply> {
        match self.inner.generate(request).await {
            Ok(reply) => Ok(reply),
            Err(e) => {
                warn!(
                    generator = self.inner.name(),
                    owner_id = %request.owner_id,
                    error = %e,
                    "Reply generation failed, using fallback"
                );
                Ok(FallbackReplies::reply(request.tier))
            }
        }
    }
}

/// Reply generator backed by an OpenAI-compatible chat completion API.
pub struct ChatReplyGenerator {
    client: Client,
    api_key: String,
    api_base: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl ChatReplyGenerator {
    /// Create a generator with an API key.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(CheckinError::Config("API key is required".into()));
        }

        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| CheckinError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key,
            api_base: DEFAULT_API_BASE.to_string(),
            model: "gpt-4o-mini".to_string(),
            temperature: 0.8,
            max_tokens: 350,
        })
    }

    /// Create a generator from the reply section of the config.
    pub fn from_config(config: &ReplyConfig) -> Result<Self> {
        let api_key = saini_core::Config::require_env(&config.api_key_env)?;
        let mut generator = Self::new(api_key)?
            .with_model(&config.model)
            .with_temperature(config.temperature)
            .with_max_tokens(config.max_tokens);
        if let Some(endpoint) = &config.endpoint {
            generator = generator.with_base_url(endpoint);
        }
        Ok(generator)
    }

    /// Set the API base URL.
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base = url.into().trim_end_matches('/').to_string();
        self
    }

    /// Set the model.
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Set the sampling temperature.
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    /// Set the completion token limit.
    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    fn messages(request: &ReplyRequest) -> Vec<ChatMessage> {
        if request.is_nudge() {
            return vec![ChatMessage::user(format!(
                "Write a short, supportive daily check-in message for user {} who hasn't checked in for a while. Keep it warm, brief, and encouraging.",
                request.owner_id
            ))];
        }

        let mut history = String::new();
        for (i, turn) in request.context.iter().enumerate() {
            history.push_str(&format!("User({i}): {}\n", turn.message));
            if let Some(response) = &turn.response {
                history.push_str(&format!("Saini: {response}\n"));
            }
        }

        vec![
            ChatMessage::system(
                "You are Saini, an emotionally intelligent and trauma-informed companion. \
                 Reply with 2-3 warm, human sentences showing understanding and gentle guidance. \
                 Respond in JSON: {\"response\": \"...\", \"tone\": \"gentle|reflective|reassuring|empowering\"}",
            ),
            ChatMessage::user(format!(
                "User emotional tier: {}\nRelated past check-ins:\n{}\nUser now says: \"{}\"",
                request.tier, history, request.message
            )),
        ]
    }
}

/// Parse a completion into a reply, accepting either the requested JSON
/// object or plain text.
pub fn parse_completion(content: &str) -> Option<(String, String)> {
    #[derive(Deserialize)]
    struct Structured {
        response: String,
        #[serde(default)]
        tone: Option<String>,
    }

    let content = content.trim();
    if content.is_empty() {
        return None;
    }
    match serde_json::from_str::<Structured>(content) {
        Ok(s) if !s.response.trim().is_empty() => Some((
            s.response.trim().to_string(),
            s.tone
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TONE.to_string()),
        )),
        _ => Some((content.to_string(), DEFAULT_TONE.to_string())),
    }
}

#[async_trait]
impl ReplyGenerator for ChatReplyGenerator {
    fn name(&self) -> &str {
        "openai"
    }

    async fn generate(&self, request: &ReplyRequest) -> Result<Reply> {
        let body = ChatRequest {
            model: &self.model,
            messages: Self::messages(request),
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        debug!("Sending reply request: model={}", self.model);

        let response = self
            .client
            .post(format!("{}/chat/completions", self.api_base))
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(CheckinError::ReplyStatus {
                status: status.as_u16(),
                message: text.chars().take(300).collect(),
            });
        }

        let completion: ChatResponse = response.json().await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default();

        let (text, tone) = parse_completion(&content)
            .ok_or_else(|| CheckinError::reply("completion was empty"))?;
        Ok(Reply {
            text,
            tone,
            source: format!("openai:{}", self.model),
        })
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

impl ChatMessage {
    fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system",
            content: content.into(),
        }
    }

    fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user",
            content: content.into(),
        }
    }
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatChoiceMessage,
}

#[derive(Deserialize)]
struct ChatChoiceMessage {
    content: Option<String>,
}
