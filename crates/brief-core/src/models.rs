use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::query::{Category, DateRange, Location};

/// One article as returned by the news API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Article {
    pub id: String,
    pub title: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub url: String,
    pub content: String,
    pub category: Option<Category>,
}

impl Article {
    pub fn category_name(&self) -> &str {
        self.category.map(|c| c.name()).unwrap_or("General")
    }

    /// First `word_limit` words of the content, with an ellipsis when cut.
    pub fn preview(&self, word_limit: usize) -> String {
        let words: Vec<&str> = self.content.split_whitespace().collect();
        if words.len() > word_limit {
            format!("{}...", words[..word_limit].join(" "))
        } else {
            words.join(" ")
        }
    }
}

/// Lightweight reference kept by a brief so it stays valid on its own.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArticleRef {
    pub id: String,
    pub title: String,
    pub url: String,
    pub source: String,
}

impl From<&Article> for ArticleRef {
    fn from(article: &Article) -> Self {
        Self {
            id: article.id.clone(),
            title: article.title.clone(),
            url: article.url.clone(),
            source: article.source.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SummaryMode {
    /// Journalist-style news brief.
    #[default]
    Focused,
    /// Longer thematic analysis.
    Standard,
}

impl SummaryMode {
    pub fn heading(&self) -> &'static str {
        match self {
            SummaryMode::Focused => "News Brief",
            SummaryMode::Standard => "Comprehensive Analysis",
        }
    }
}

impl fmt::Display for SummaryMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SummaryMode::Focused => f.write_str("focused"),
            SummaryMode::Standard => f.write_str("standard"),
        }
    }
}

impl FromStr for SummaryMode {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> anyhow::Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "focused" | "brief" => Ok(SummaryMode::Focused),
            "standard" | "analysis" => Ok(SummaryMode::Standard),
            other => anyhow::bail!("Unknown summary mode: {}. Use 'focused' or 'standard'", other),
        }
    }
}

/// Summary of a set of selected articles.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Brief {
    pub mode: SummaryMode,
    pub text: String,
    pub articles: Vec<ArticleRef>,
    pub created_at: DateTime<Utc>,
}

impl Brief {
    pub fn new(mode: SummaryMode, text: impl Into<String>, articles: &[Article]) -> Self {
        Self {
            mode,
            text: text.into(),
            articles: articles.iter().map(ArticleRef::from).collect(),
            created_at: Utc::now(),
        }
    }

    /// Up to three distinct sources, in first-seen order.
    pub fn top_sources(&self) -> Vec<&str> {
        let mut sources: Vec<&str> = Vec::new();
        for article in &self.articles {
            if !sources.contains(&article.source.as_str()) {
                sources.push(&article.source);
            }
        }
        sources.truncate(3);
        sources
    }

    pub fn to_markdown(&self) -> String {
        let mut md = String::new();

        md.push_str(&format!("## {}\n\n", self.mode.heading()));
        md.push_str(self.text.trim());
        md.push_str("\n\n");
        md.push_str(&format!("**Sources**: {}\n", self.top_sources().join(", ")));
        md.push_str(&format!("**Articles**: {}\n\n", self.articles.len()));

        md.push_str("### Sources\n");
        for article in self.articles.iter().take(10) {
            md.push_str(&format!(
                "- [{}]({}) ({})\n",
                article.title, article.url, article.source
            ));
        }

        md
    }
}

/// Per-article key points.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ArticleSummary {
    Success { points: Vec<String> },
    Insufficient,
    Failed(String),
}

/// Point-in-time snapshot handed to the exporter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub location: Location,
    pub date_range: DateRange,
    pub categories: Vec<Category>,
    pub brief: Option<Brief>,
    pub entries: Vec<ReportEntry>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportEntry {
    pub article: Article,
    pub summary: Option<ArticleSummary>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn article(id: &str, source: &str) -> Article {
        Article {
            id: id.to_string(),
            title: format!("Title {}", id),
            source: source.to_string(),
            published_at: Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap(),
            url: format!("https://example.com/{}", id),
            content: "one two three four five".to_string(),
            category: None,
        }
    }

    #[test]
    fn test_preview_truncates_with_ellipsis() {
        let a = article("1", "BBC");
        assert_eq!(a.preview(3), "one two three...");
        assert_eq!(a.preview(5), "one two three four five");
    }

    #[test]
    fn test_category_name_defaults_to_general() {
        assert_eq!(article("1", "BBC").category_name(), "General");
    }

    #[test]
    fn test_top_sources_are_distinct_and_capped() {
        let articles = vec![
            article("1", "BBC"),
            article("2", "BBC"),
            article("3", "CNN"),
            article("4", "ANSA"),
            article("5", "Reuters"),
        ];
        let brief = Brief::new(SummaryMode::Focused, "text", &articles);
        assert_eq!(brief.top_sources(), vec!["BBC", "CNN", "ANSA"]);
    }

    #[test]
    fn test_brief_markdown_layout() {
        let articles = vec![article("1", "BBC"), article("2", "CNN")];
        let brief = Brief::new(SummaryMode::Standard, "  Body text\n", &articles);
        let md = brief.to_markdown();

        assert!(md.starts_with("## Comprehensive Analysis\n\nBody text\n\n"));
        assert!(md.contains("**Sources**: BBC, CNN"));
        assert!(md.contains("**Articles**: 2"));
        assert!(md.contains("- [Title 1](https://example.com/1) (BBC)"));
    }

    #[test]
    fn test_summary_mode_parse() {
        assert_eq!("Focused".parse::<SummaryMode>().unwrap(), SummaryMode::Focused);
        assert_eq!("standard".parse::<SummaryMode>().unwrap(), SummaryMode::Standard);
        assert!("long".parse::<SummaryMode>().is_err());
    }
}
