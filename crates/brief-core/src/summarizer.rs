use anyhow::{Context, Result};
use futures::stream::{self, StreamExt};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use url::Url;

use crate::config::api_base_url;
use crate::models::{Article, ArticleSummary, Brief, SummaryMode};
use crate::processor::ArticleProcessor;
use crate::prompts;

const BRIEF_MAX_TOKENS: u32 = 2000;
const KEY_POINTS_MAX_TOKENS: u32 = 512;
const TEMPERATURE: f32 = 0.7;
const DEFAULT_MAX_ATTEMPTS: u32 = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Provider {
    #[default]
    Gemini,
    Anthropic,
}

impl Provider {
    pub fn default_model(&self) -> &'static str {
        match self {
            Provider::Gemini => "gemini-2.0-flash-lite",
            Provider::Anthropic => "claude-3-5-haiku-20241022",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Provider::Gemini => "https://generativelanguage.googleapis.com",
            Provider::Anthropic => "https://api.anthropic.com",
        }
    }

    pub fn key_url(&self) -> &'static str {
        match self {
            Provider::Gemini => "https://aistudio.google.com/app/apikey",
            Provider::Anthropic => "https://console.anthropic.com/settings/keys",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Provider::Gemini => f.write_str("gemini"),
            Provider::Anthropic => f.write_str("anthropic"),
        }
    }
}

impl FromStr for Provider {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "gemini" | "google" => Ok(Provider::Gemini),
            "anthropic" | "claude" => Ok(Provider::Anthropic),
            other => anyhow::bail!("Unknown provider: {}. Use 'gemini' or 'anthropic'", other),
        }
    }
}

// Gemini generateContent

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GenerationConfig,
}

#[derive(Serialize, Deserialize)]
struct GeminiContent {
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Serialize, Deserialize)]
struct GeminiPart {
    #[serde(default)]
    text: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    max_output_tokens: u32,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

// Anthropic messages

#[derive(Serialize)]
struct ClaudeRequest {
    model: String,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message>,
}

#[derive(Serialize, Deserialize)]
struct Message {
    role: String,
    content: String,
}

#[derive(Deserialize)]
struct ClaudeResponse {
    content: Vec<Content>,
}

#[derive(Deserialize)]
struct Content {
    #[serde(default)]
    text: String,
}

enum AttemptError {
    /// Network trouble, rate limits and server errors.
    Retryable { error: anyhow::Error, rate_limited: bool },
    Fatal(anyhow::Error),
}

pub struct AiSummarizer {
    client: Client,
    api_key: String,
    provider: Provider,
    model: String,
    base_url: Url,
    processor: ArticleProcessor,
    semaphore: Arc<Semaphore>,
    max_attempts: u32,
    retry_delay: Duration,
    rate_limit_delay: Duration,
}

impl AiSummarizer {
    pub fn new(api_key: String, provider: Provider) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(60))
            .build()
            .context("Failed to create HTTP client")?;

        let base_url =
            api_base_url(provider.default_base_url()).context("Invalid default AI API URL")?;

        // Two requests in flight keeps us under free-tier rate limits
        let semaphore = Arc::new(Semaphore::new(2));

        Ok(Self {
            client,
            api_key,
            provider,
            model: provider.default_model().to_string(),
            base_url,
            processor: ArticleProcessor::new()?,
            semaphore,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
            retry_delay: Duration::from_secs(1),
            rate_limit_delay: Duration::from_secs(15),
        })
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_base_url(mut self, base_url: &str) -> Result<Self> {
        self.base_url = api_base_url(base_url).context("Invalid AI API base URL")?;
        Ok(self)
    }

    pub fn with_max_attempts(mut self, attempts: u32) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Base waits between attempts: `retry` doubles per attempt, `rate_limit`
    /// grows linearly after a 429.
    pub fn with_backoff(mut self, retry: Duration, rate_limit: Duration) -> Self {
        self.retry_delay = retry;
        self.rate_limit_delay = rate_limit;
        self
    }

    pub fn provider(&self) -> Provider {
        self.provider
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Summarize the selected articles into one brief.
    pub async fn summarize(&self, articles: &[Article], mode: SummaryMode) -> Result<Brief> {
        if articles.is_empty() {
            anyhow::bail!("Please select articles to summarize.");
        }

        let cores = self.processor.extract_cores(articles);
        if cores.is_empty() {
            anyhow::bail!("No meaningful content in selected articles.");
        }

        let context = self.processor.prepare_context(&cores);
        let prompt = prompts::brief_prompt(mode, &context);

        let text = self
            .complete(&prompt, BRIEF_MAX_TOKENS)
            .await
            .context("AI summarization failed")?;

        if text.trim().is_empty() {
            anyhow::bail!("AI summarization failed: the model returned no text");
        }

        let used: Vec<Article> = cores.iter().map(|(article, _)| (*article).clone()).collect();
        tracing::info!(
            provider = %self.provider,
            articles = used.len(),
            "generated {} summary",
            mode
        );

        Ok(Brief::new(mode, text, &used))
    }

    pub async fn summarize_article(&self, article: &Article) -> Result<ArticleSummary> {
        let _permit = self.semaphore.acquire().await?;

        let body = self.processor.clean_content(&article.content, &article.source);
        let prompt = prompts::key_points_prompt(&format!("{}\n\n{}", article.title, body));

        let text = match self.complete(&prompt, KEY_POINTS_MAX_TOKENS).await {
            Ok(text) => text,
            Err(e) => {
                tracing::warn!(title = %article.title, "failed to summarize article: {:#}", e);
                return Ok(ArticleSummary::Failed(format!("{:#}", e)));
            }
        };

        if text.contains("Insufficient content for summary") {
            return Ok(ArticleSummary::Insufficient);
        }

        let mut points = parse_bullet_points(&text);
        if points.is_empty() {
            return Ok(ArticleSummary::Failed("Model returned no bullet points".to_string()));
        }
        points.truncate(5);

        Ok(ArticleSummary::Success { points })
    }

    /// Key points for every article, keyed by article id. Order is not preserved.
    pub async fn summarize_each(&self, articles: &[Article]) -> Vec<(String, ArticleSummary)> {
        stream::iter(articles)
            .map(|article| async move {
                let summary = self
                    .summarize_article(article)
                    .await
                    .unwrap_or_else(|e| ArticleSummary::Failed(e.to_string()));
                (article.id.clone(), summary)
            })
            .boxed()
            .buffer_unordered(2)
            .collect()
            .await
    }

    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        for attempt in 0..self.max_attempts {
            match self.try_complete(prompt, max_tokens).await {
                Ok(text) => return Ok(text),
                Err(AttemptError::Fatal(e)) => return Err(e),
                Err(AttemptError::Retryable { error, rate_limited }) => {
                    if attempt + 1 >= self.max_attempts {
                        return Err(error);
                    }

                    let backoff = self.backoff(attempt, rate_limited);
                    tracing::warn!(
                        attempt = attempt + 1,
                        "AI request failed ({:#}), retrying in {:?}",
                        error,
                        backoff
                    );

                    tokio::time::sleep(backoff).await;
                }
            }
        }

        anyhow::bail!("Max retries reached")
    }

    fn backoff(&self, attempt: u32, rate_limited: bool) -> Duration {
        // Longer backoff for rate limits
        if rate_limited {
            self.rate_limit_delay * (attempt + 1)
        } else {
            self.retry_delay * 2_u32.pow(attempt)
        }
    }

    fn endpoint(&self) -> Result<Url> {
        let path = match self.provider {
            Provider::Gemini => format!("v1beta/models/{}:generateContent", self.model),
            Provider::Anthropic => "v1/messages".to_string(),
        };
        self.base_url
            .join(&path)
            .with_context(|| format!("Failed to build {} URL", self.provider))
    }

    async fn try_complete(&self, prompt: &str, max_tokens: u32) -> Result<String, AttemptError> {
        let url = self.endpoint().map_err(AttemptError::Fatal)?;
        let request = match self.provider {
            Provider::Gemini => {
                let body = GeminiRequest {
                    contents: vec![GeminiContent {
                        role: Some("user".to_string()),
                        parts: vec![GeminiPart {
                            text: prompt.to_string(),
                        }],
                    }],
                    generation_config: GenerationConfig {
                        temperature: TEMPERATURE,
                        max_output_tokens: max_tokens,
                    },
                };
                self.client
                    .post(url)
                    .header("x-goog-api-key", &self.api_key)
                    .json(&body)
            }
            Provider::Anthropic => {
                let body = ClaudeRequest {
                    model: self.model.clone(),
                    max_tokens,
                    temperature: TEMPERATURE,
                    messages: vec![Message {
                        role: "user".to_string(),
                        content: prompt.to_string(),
                    }],
                };
                self.client
                    .post(url)
                    .header("x-api-key", &self.api_key)
                    .header("anthropic-version", "2023-06-01")
                    .json(&body)
            }
        };

        let response = request.send().await.map_err(|e| AttemptError::Retryable {
            error: anyhow::Error::new(e).context("Failed to reach the AI API"),
            rate_limited: false,
        })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            return Err(classify_failure(status, &error_text));
        }

        let body = response
            .text()
            .await
            .context("Failed to read AI API response")
            .map_err(AttemptError::Fatal)?;

        let parsed = match self.provider {
            Provider::Gemini => parse_gemini(&body),
            Provider::Anthropic => parse_claude(&body),
        };
        parsed.map_err(AttemptError::Fatal)
    }
}

fn classify_failure(status: StatusCode, body: &str) -> AttemptError {
    let detail = body.trim();
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => AttemptError::Fatal(anyhow::anyhow!(
            "AI API rejected the credentials (check SUMMARIZER_KEY): {}",
            detail
        )),
        StatusCode::TOO_MANY_REQUESTS => AttemptError::Retryable {
            error: anyhow::anyhow!("AI API rate limit reached: {}", detail),
            rate_limited: true,
        },
        s if s.is_server_error() => AttemptError::Retryable {
            error: anyhow::anyhow!("AI API error: {} - {}", s, detail),
            rate_limited: false,
        },
        s => AttemptError::Fatal(anyhow::anyhow!("AI API error: {} - {}", s, detail)),
    }
}

fn parse_gemini(body: &str) -> Result<String> {
    let response: GeminiResponse =
        serde_json::from_str(body).context("Failed to parse Gemini API response")?;

    if response.candidates.is_empty() {
        if let Some(reason) = response.prompt_feedback.and_then(|f| f.block_reason) {
            anyhow::bail!("Gemini blocked the prompt: {}", reason);
        }
        anyhow::bail!("Gemini returned no candidates");
    }

    Ok(response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| c.parts.into_iter().map(|p| p.text).collect::<Vec<_>>().join(""))
        .unwrap_or_default())
}

fn parse_claude(body: &str) -> Result<String> {
    let response: ClaudeResponse =
        serde_json::from_str(body).context("Failed to parse Claude API response")?;

    Ok(response
        .content
        .into_iter()
        .map(|c| c.text)
        .collect::<Vec<_>>()
        .join(""))
}

fn parse_bullet_points(text: &str) -> Vec<String> {
    text.lines()
        .filter_map(|line| {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                return None;
            }
            if let Some(stripped) = trimmed.strip_prefix(|c: char| c.is_numeric()) {
                let stripped = stripped
                    .trim_start_matches(|c: char| c.is_numeric() || c == '.' || c == ')' || c.is_whitespace());
                if !stripped.is_empty() {
                    return Some(stripped.to_string());
                }
            }
            for marker in ['-', '*', '•'] {
                if let Some(stripped) = trimmed.strip_prefix(marker) {
                    let stripped = stripped.trim();
                    if !stripped.is_empty() {
                        return Some(stripped.to_string());
                    }
                }
            }
            None
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== Provider Tests ====================

    #[test]
    fn test_provider_parse_and_defaults() {
        assert_eq!("Claude".parse::<Provider>().unwrap(), Provider::Anthropic);
        assert_eq!("gemini".parse::<Provider>().unwrap(), Provider::Gemini);
        assert!("openai".parse::<Provider>().is_err());
        assert_eq!(Provider::Gemini.default_model(), "gemini-2.0-flash-lite");
    }

    #[test]
    fn test_builder_overrides() {
        let summarizer = AiSummarizer::new("key".to_string(), Provider::Anthropic)
            .unwrap()
            .with_model("claude-sonnet")
            .with_max_attempts(0);
        assert_eq!(summarizer.model(), "claude-sonnet");
        assert_eq!(summarizer.max_attempts, 1);
        assert!(summarizer.with_base_url("::nope").is_err());
    }

    #[test]
    fn test_endpoint_keeps_base_path() {
        let gemini = AiSummarizer::new("key".to_string(), Provider::Gemini)
            .unwrap()
            .with_base_url("https://gateway.local/google")
            .unwrap();
        assert_eq!(
            gemini.endpoint().unwrap().as_str(),
            "https://gateway.local/google/v1beta/models/gemini-2.0-flash-lite:generateContent"
        );

        let claude = AiSummarizer::new("key".to_string(), Provider::Anthropic).unwrap();
        assert_eq!(
            claude.endpoint().unwrap().as_str(),
            "https://api.anthropic.com/v1/messages"
        );
    }

    #[test]
    fn test_backoff_schedule() {
        let summarizer = AiSummarizer::new("key".to_string(), Provider::Gemini).unwrap();
        assert_eq!(summarizer.backoff(0, false), Duration::from_secs(1));
        assert_eq!(summarizer.backoff(2, false), Duration::from_secs(4));
        assert_eq!(summarizer.backoff(0, true), Duration::from_secs(15));
        assert_eq!(summarizer.backoff(1, true), Duration::from_secs(30));
    }

    // ==================== Response Parsing Tests ====================

    #[test]
    fn test_parse_gemini_joins_parts() {
        let body = r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello "},{"text":"world"}]},"finishReason":"STOP"}]}"#;
        assert_eq!(parse_gemini(body).unwrap(), "Hello world");
    }

    #[test]
    fn test_parse_gemini_blocked_prompt() {
        let body = r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#;
        let err = parse_gemini(body).unwrap_err();
        assert!(err.to_string().contains("SAFETY"));
    }

    #[test]
    fn test_parse_claude() {
        let body = r#"{"content":[{"type":"text","text":"Summary text"}]}"#;
        assert_eq!(parse_claude(body).unwrap(), "Summary text");
    }

    #[test]
    fn test_parse_malformed_body() {
        assert!(parse_claude("<html>").is_err());
        assert!(parse_gemini("").is_err());
    }

    // ==================== Failure Classification Tests ====================

    #[test]
    fn test_auth_failures_are_fatal() {
        assert!(matches!(
            classify_failure(StatusCode::UNAUTHORIZED, "bad key"),
            AttemptError::Fatal(_)
        ));
        assert!(matches!(
            classify_failure(StatusCode::BAD_REQUEST, "bad request"),
            AttemptError::Fatal(_)
        ));
    }

    #[test]
    fn test_rate_limits_and_server_errors_retry() {
        assert!(matches!(
            classify_failure(StatusCode::TOO_MANY_REQUESTS, ""),
            AttemptError::Retryable { rate_limited: true, .. }
        ));
        assert!(matches!(
            classify_failure(StatusCode::BAD_GATEWAY, ""),
            AttemptError::Retryable { rate_limited: false, .. }
        ));
    }

    // ==================== Bullet Parsing Tests ====================

    #[test]
    fn test_parse_bullet_points_formats() {
        let text = "Key points:\n- First point\n* Second point\n• Third point\n1. Fourth point\n12) Fifth point\n-\n";
        assert_eq!(
            parse_bullet_points(text),
            vec![
                "First point",
                "Second point",
                "Third point",
                "Fourth point",
                "Fifth point"
            ]
        );
    }

    // ==================== Summarize Guard Tests ====================

    #[tokio::test]
    async fn test_summarize_rejects_articles_without_content() {
        let article = |title: &str, content: &str| Article {
            id: "news_0".to_string(),
            title: title.to_string(),
            source: "Wire".to_string(),
            published_at: chrono::Utc::now(),
            url: "https://example.com".to_string(),
            content: content.to_string(),
            category: None,
        };
        let articles = vec![
            article("Short title", "A body long enough to pass the length check on its own."),
            article("MARKETS CLOSE HIGHER ON FRIDAY", "Stocks rose across the board as investors cheered the data."),
            article("Minister resigns after inquiry", "Too short."),
        ];

        // Base URL points nowhere; the guard fires before any request.
        let summarizer = AiSummarizer::new("key".to_string(), Provider::Gemini)
            .unwrap()
            .with_base_url("http://127.0.0.1:9")
            .unwrap();
        let err = summarizer
            .summarize(&articles, SummaryMode::Focused)
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "No meaningful content in selected articles.");
    }

    #[tokio::test]
    async fn test_summarize_requires_selection() {
        let summarizer = AiSummarizer::new("key".to_string(), Provider::Gemini).unwrap();
        let err = summarizer.summarize(&[], SummaryMode::Focused).await.unwrap_err();
        assert_eq!(err.to_string(), "Please select articles to summarize.");
    }
}
