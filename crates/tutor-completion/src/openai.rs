//! OpenAI chat-completions adapter
//!
//! Sends the fixed tutor persona plus one user message and extracts
//! the first choice's content. Base URL and model are overridable for
//! compatible providers and for tests.

use crate::error::CompletionError;
use crate::gateway::CompletionGateway;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Default provider endpoint
const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default completion model
const DEFAULT_MODEL: &str = "gpt-3.5-turbo";

/// Fixed system instruction establishing the tutor persona
pub const TUTOR_SYSTEM_PROMPT: &str = "\
- You are the world's best tutor
- You are the best at explaining complex concepts in simple terms
- You will be asked questions about a wide range of topics
- Your job is to answer the questions in a way that is easy to understand
- Your answers should be informative, fun, and engaging";

/// Completion gateway backed by the OpenAI chat-completions API
#[derive(Debug, Clone)]
pub struct OpenAiGateway {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    model: String,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    content: Option<String>,
}

impl OpenAiGateway {
    /// Create a gateway against the default provider endpoint
    ///
    /// `OPENAI_API_URL` overrides the endpoint when set.
    #[must_use]
    pub fn new(api_key: String) -> Self {
        let base_url =
            std::env::var("OPENAI_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        Self::with_base_url(api_key, base_url)
    }

    /// Create a gateway against an explicit endpoint
    #[must_use]
    pub fn with_base_url(api_key: String, base_url: String) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key,
            base_url,
            model: DEFAULT_MODEL.to_string(),
        }
    }

    /// Override the completion model
    #[inline]
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    /// Configured model name
    #[inline]
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }
}

#[async_trait]
impl CompletionGateway for OpenAiGateway {
    async fn complete(&self, question: &str) -> Result<String, CompletionError> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: TUTOR_SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: question,
                },
            ],
        };

        tracing::debug!("requesting completion from {} for {:?}", self.model, question);
        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(CompletionError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| CompletionError::MalformedResponse(e.to_string()))?;

        let content = body
            .choices
            .first()
            .and_then(|c| c.message.content.as_deref())
            .ok_or_else(|| {
                CompletionError::MalformedResponse("no choices in response".to_string())
            })?;

        Ok(content.trim().to_string())
    }
}
