//! OpenAI-compatible chat completion refiner.
//!
//! Sends the scraped title and body to a chat completion endpoint and asks
//! for a cleaned, sector-focused rewrite as JSON. Any failure falls back to
//! the unrefined record.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{error, info, instrument, warn};

use super::ContentRefiner;
use crate::config::LlmSettings;
use crate::domain::{ContentRecord, Sector};

/// Environment variable holding the API key
pub const API_KEY_ENV: &str = "OPENAI_API_KEY";

/// Body characters sent to the model at most
const PROMPT_BODY_CHARS: usize = 3000;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

const SYSTEM_PROMPT: &str = "You are an expert content editor specializing in professional business content for LinkedIn. Your task is to clean, refine, and enhance scraped web content while maintaining strict sector relevance.";

/// Structured reply requested from the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Refinement {
    pub cleaned_content: String,
    #[serde(default)]
    pub key_insights: Vec<String>,
    #[serde(default = "default_relevance")]
    pub relevance_score: f64,
}

fn default_relevance() -> f64 {
    0.5
}

impl Refinement {
    /// Parse a model reply; anything that is not the expected JSON is
    /// taken as the cleaned text itself
    pub fn from_reply(reply: &str) -> Self {
        let trimmed = reply.trim();
        serde_json::from_str(trimmed).unwrap_or_else(|_| {
            warn!("Model reply is not JSON, using it as plain text");
            Self {
                cleaned_content: trimmed.to_string(),
                key_insights: Vec::new(),
                relevance_score: default_relevance(),
            }
        })
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Debug, Deserialize)]
struct ChatReply {
    content: Option<String>,
}

/// Topics the model is asked to stay within
fn sector_focus(sector: Option<Sector>) -> &'static str {
    match sector {
        Some(Sector::EMobility) => {
            "electric vehicles, batteries, charging infrastructure, sustainable transportation, autonomous driving"
        }
        Some(Sector::Manufacturing) => {
            "industrial automation, supply chain, robotics, Industry 4.0, production processes"
        }
        Some(Sector::PoliticsGovernance) => {
            "government policy, regulation, legislation, public administration, political processes"
        }
        Some(Sector::AiMl) => {
            "artificial intelligence, machine learning, data science, algorithms, automation"
        }
        Some(Sector::StartupInnovation) => {
            "entrepreneurship, venture capital, business models, innovation, startup ecosystem"
        }
        None => "business, technology, industry trends, professional development",
    }
}

/// Build the user prompt for a record
pub fn build_prompt(record: &ContentRecord) -> String {
    let sector = record
        .sector
        .map(|s| s.display_name())
        .unwrap_or("general business");
    let body: String = record.body.chars().take(PROMPT_BODY_CHARS).collect();

    format!(
        r#"Please clean and refine the following scraped web content for professional LinkedIn posting. Focus on the {sector} sector.

TITLE: {title}
RAW CONTENT:
{body}

SECTOR FOCUS: {focus}

TASKS:
1. Remove all irrelevant content (ads, navigation, contact info, legal text, etc.)
2. Maintain strict relevance to {sector} topics only
3. Fix grammar and improve readability
4. Extract 3-5 key insights or main points
5. Rate relevance to the {sector} sector (0.0 to 1.0)
6. Ensure a professional, coherent narrative

OUTPUT FORMAT (JSON):
{{
    "cleaned_content": "The cleaned and refined content here...",
    "key_insights": ["Insight 1", "Insight 2", "Insight 3"],
    "relevance_score": 0.85
}}
"#,
        sector = sector,
        title = record.title,
        body = body,
        focus = sector_focus(record.sector),
    )
}

/// Refiner backed by a chat completion API
pub struct LlmRefiner {
    api_key: String,
    settings: LlmSettings,
    client: reqwest::Client,
}

impl LlmRefiner {
    /// Create a refiner with an explicit key
    pub fn new(api_key: impl Into<String>, settings: LlmSettings) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            api_key: api_key.into(),
            settings,
            client,
        })
    }

    /// Create a refiner from `OPENAI_API_KEY`
    ///
    /// Returns `None` (with a warning) when the key is not set.
    pub fn from_env(settings: LlmSettings) -> Result<Option<Self>> {
        match std::env::var(API_KEY_ENV) {
            Ok(key) if !key.trim().is_empty() => Ok(Some(Self::new(key, settings)?)),
            _ => {
                warn!("{} not set, model refinement disabled", API_KEY_ENV);
                Ok(None)
            }
        }
    }

    /// Model in use
    pub fn model(&self) -> &str {
        &self.settings.model
    }

    fn completions_url(&self) -> String {
        format!(
            "{}/chat/completions",
            self.settings.api_base.trim_end_matches('/')
        )
    }

    /// Ask the model for a refinement of the record
    pub async fn request(&self, record: &ContentRecord) -> Result<Refinement> {
        let prompt = build_prompt(record);
        let request = ChatRequest {
            model: &self.settings.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        };

        let response = self
            .client
            .post(self.completions_url())
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .context("Failed to call chat completion API")?
            .error_for_status()
            .context("Chat completion API returned an error status")?;

        let parsed: ChatResponse = response
            .json()
            .await
            .context("Failed to parse chat completion response")?;

        let reply = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .context("Chat completion response has no content")?;

        Ok(Refinement::from_reply(&reply))
    }
}

#[async_trait]
impl ContentRefiner for LlmRefiner {
    fn name(&self) -> &str {
        "llm"
    }

    #[instrument(skip(self, record), fields(url = %record.url))]
    async fn refine(&self, record: &ContentRecord) -> ContentRecord {
        if record.body.trim().is_empty() {
            warn!("No content to refine");
            return record.clone();
        }

        match self.request(record).await {
            Ok(refinement) if !refinement.cleaned_content.trim().is_empty() => {
                info!(
                    chars = refinement.cleaned_content.chars().count(),
                    relevance = refinement.relevance_score,
                    insights = refinement.key_insights.len(),
                    "Refined content"
                );
                record.with_body(refinement.cleaned_content)
            }
            Ok(_) => {
                warn!("Model returned empty content, keeping original");
                record.clone()
            }
            Err(e) => {
                error!(error = %e, "Refinement failed, keeping original");
                record.clone()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_settings() -> LlmSettings {
        LlmSettings {
            api_base: "http://127.0.0.1:9/v1".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_reply_json() {
        let reply = r#"{"cleaned_content": "Clean text.", "key_insights": ["One"], "relevance_score": 0.9}"#;
        let refinement = Refinement::from_reply(reply);

        assert_eq!(refinement.cleaned_content, "Clean text.");
        assert_eq!(refinement.key_insights, vec!["One"]);
        assert_eq!(refinement.relevance_score, 0.9);
    }

    #[test]
    fn test_reply_partial_json_uses_defaults() {
        let refinement = Refinement::from_reply(r#"{"cleaned_content": "Only text."}"#);
        assert!(refinement.key_insights.is_empty());
        assert_eq!(refinement.relevance_score, 0.5);
    }

    #[test]
    fn test_reply_plain_text() {
        let refinement = Refinement::from_reply("  Just prose, no JSON.  ");
        assert_eq!(refinement.cleaned_content, "Just prose, no JSON.");
        assert_eq!(refinement.relevance_score, 0.5);
    }

    #[test]
    fn test_prompt_truncates_body() {
        let record = ContentRecord::new(
            "https://example.com",
            "Long read",
            "x".repeat(5000),
            Some(Sector::AiMl),
        );
        let prompt = build_prompt(&record);

        assert!(prompt.contains("TITLE: Long read"));
        assert!(prompt.contains("AI & Machine Learning"));
        assert!(prompt.contains(&"x".repeat(3000)));
        assert!(!prompt.contains(&"x".repeat(3001)));
    }

    #[test]
    fn test_completions_url() {
        let settings = LlmSettings {
            api_base: "https://api.example.com/v1/".to_string(),
            ..Default::default()
        };
        let refiner = LlmRefiner::new("key", settings).unwrap();
        assert_eq!(refiner.completions_url(), "https://api.example.com/v1/chat/completions");
        assert_eq!(refiner.model(), "gpt-3.5-turbo");
    }

    #[tokio::test]
    async fn test_empty_body_returned_unchanged() {
        let refiner = LlmRefiner::new("key", unreachable_settings()).unwrap();
        let record = ContentRecord::new("https://example.com", "Empty", "   ", None);

        assert_eq!(refiner.refine(&record).await, record);
    }

    #[tokio::test]
    async fn test_failure_falls_back_to_original() {
        let refiner = LlmRefiner::new("key", unreachable_settings()).unwrap();
        let record = ContentRecord::new("https://example.com", "Title", "Some body text.", None);

        assert_eq!(refiner.refine(&record).await, record);
    }
}
