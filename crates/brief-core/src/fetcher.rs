use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use url::Url;

use crate::config::api_base_url;
use crate::models::Article;
use crate::query::{detect_category, Category, NewsQuery};

const PAGE_SIZE: u32 = 20;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct EverythingResponse {
    status: String,
    #[serde(default)]
    #[allow(dead_code)]
    total_results: usize,
    #[serde(default)]
    articles: Vec<ApiArticle>,
    code: Option<String>,
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApiArticle {
    source: Option<ApiSource>,
    title: Option<String>,
    description: Option<String>,
    content: Option<String>,
    url: Option<String>,
    published_at: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiSource {
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    code: Option<String>,
    message: Option<String>,
}

pub struct NewsApiClient {
    client: Client,
    api_key: String,
    base_url: Url,
    restrict_domains: bool,
}

impl NewsApiClient {
    pub fn new(api_key: String, base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .user_agent("newsbrief/0.1")
            .build()
            .context("Failed to create HTTP client")?;

        let base_url = api_base_url(base_url).context("Invalid news API base URL")?;

        Ok(Self {
            client,
            api_key,
            base_url,
            restrict_domains: false,
        })
    }

    /// Limit results to the location's known outlets.
    pub fn with_domain_restriction(mut self, enabled: bool) -> Self {
        self.restrict_domains = enabled;
        self
    }

    pub fn request_url(&self, query: &NewsQuery, today: chrono::NaiveDate) -> Result<Url> {
        let (from, to) = query.date_range.resolve(today);

        let mut url = self
            .base_url
            .join("v2/everything")
            .context("Failed to build news API URL")?;

        let mut params = format!(
            "q={}&language={}&from={}&to={}&sortBy=relevancy&pageSize={}",
            urlencoding::encode(&query.search_terms()),
            query.location.language(),
            from.format("%Y-%m-%d"),
            to.format("%Y-%m-%d"),
            PAGE_SIZE
        );
        if self.restrict_domains {
            if let Some(domains) = query.location.domains() {
                params.push_str(&format!("&domains={}", urlencoding::encode(domains)));
            }
        }
        url.set_query(Some(&params));

        Ok(url)
    }

    pub async fn fetch_articles(&self, query: &NewsQuery) -> Result<Vec<Article>> {
        let url = self.request_url(query, Utc::now().date_naive())?;
        tracing::debug!(%url, "querying news API");

        let response = self
            .client
            .get(url)
            .header("X-Api-Key", &self.api_key)
            .send()
            .await
            .context("Failed to reach the news API")?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| String::from("unknown error"));
            anyhow::bail!(describe_failure(status, &body));
        }

        let parsed = response
            .json::<EverythingResponse>()
            .await
            .context("Failed to parse news API response")?;

        if parsed.status != "ok" {
            anyhow::bail!(
                "News API returned error: {} - {}",
                parsed.code.as_deref().unwrap_or("unknown"),
                parsed.message.as_deref().unwrap_or("no message")
            );
        }

        let articles = map_articles(parsed.articles, &query.categories);
        tracing::info!(
            location = %query.location,
            count = articles.len(),
            "fetched articles"
        );

        Ok(articles)
    }
}

fn describe_failure(status: StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<ApiError>(body)
        .ok()
        .map(|e| {
            format!(
                "{} - {}",
                e.code.as_deref().unwrap_or("error"),
                e.message.as_deref().unwrap_or("no message")
            )
        })
        .unwrap_or_else(|| body.trim().to_string());

    match status {
        StatusCode::UNAUTHORIZED => format!(
            "News API rejected the credentials (check FETCHER_KEY): {}",
            detail
        ),
        StatusCode::TOO_MANY_REQUESTS => {
            format!("News API rate limit reached, try again later: {}", detail)
        }
        _ => format!("News API returned error: {} - {}", status, detail),
    }
}

fn map_articles(raw: Vec<ApiArticle>, categories: &[Category]) -> Vec<Article> {
    let mut articles = Vec::new();

    for item in raw {
        let title = match item.title.as_deref().map(str::trim) {
            Some(t) if !t.is_empty() && t != "[Removed]" => t.to_string(),
            _ => continue,
        };
        let url = match item.url {
            Some(u) if !u.trim().is_empty() => u,
            _ => {
                tracing::warn!(%title, "dropping article without URL");
                continue;
            }
        };

        let content = item
            .description
            .filter(|d| !d.trim().is_empty())
            .or(item.content)
            .unwrap_or_else(|| "No content".to_string());

        let source = item
            .source
            .and_then(|s| s.name)
            .filter(|s| !s.trim().is_empty())
            .or_else(|| host_of(&url))
            .unwrap_or_else(|| "Unknown".to_string());

        let published_at = item
            .published_at
            .as_deref()
            .and_then(|d| d.parse::<DateTime<Utc>>().ok())
            .unwrap_or_else(Utc::now);

        let category = detect_category(&format!("{} {}", title, content), categories);

        articles.push(Article {
            id: format!("news_{}", articles.len()),
            title,
            source,
            published_at,
            url,
            content,
            category,
        });
    }

    articles
}

fn host_of(url: &str) -> Option<String> {
    Url::parse(url)
        .ok()
        .and_then(|u| u.host_str().map(|h| h.trim_start_matches("www.").to_string()))
}
