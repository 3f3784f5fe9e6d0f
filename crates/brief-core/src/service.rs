use anyhow::Result;
use std::path::PathBuf;

use crate::config::Config;
use crate::export::{PdfExport, ReportGenerator};
use crate::fetcher::NewsApiClient;
use crate::models::{Article, ArticleSummary, Brief, Report, SummaryMode};
use crate::query::{Category, DateRange, Location, NewsQuery};
use crate::summarizer::AiSummarizer;

/// Fetch, summarize and export behind one handle. A client whose credential
/// is missing is left unbuilt and reports the credential error when used.
pub struct NewsService {
    config: Config,
    fetcher: Option<NewsApiClient>,
    summarizer: Option<AiSummarizer>,
}

impl NewsService {
    pub fn new(config: Config) -> Result<Self> {
        let fetcher = match config.fetcher_key.as_deref() {
            Some(key) => Some(
                NewsApiClient::new(key.to_string(), &config.newsapi_base_url)?
                    .with_domain_restriction(config.restrict_domains),
            ),
            None => None,
        };

        let summarizer = match config.summarizer_key.as_deref() {
            Some(key) => {
                let mut summarizer = AiSummarizer::new(key.to_string(), config.provider)?;
                if let Some(model) = &config.model {
                    summarizer = summarizer.with_model(model.clone());
                }
                if let Some(url) = &config.summarizer_base_url {
                    summarizer = summarizer.with_base_url(url)?;
                }
                Some(summarizer)
            }
            None => None,
        };

        Ok(Self {
            config,
            fetcher,
            summarizer,
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn locations() -> &'static [Location] {
        &Location::ALL
    }

    pub fn date_ranges() -> &'static [DateRange] {
        &DateRange::OFFERED
    }

    pub fn categories() -> &'static [Category] {
        &Category::ALL
    }

    /// Parse category names, rejecting unknown names and an empty choice.
    pub fn validate_categories<S: AsRef<str>>(names: &[S]) -> Result<Vec<Category>> {
        let mut categories = names
            .iter()
            .map(|n| n.as_ref().trim())
            .filter(|n| !n.is_empty())
            .map(str::parse::<Category>)
            .collect::<Result<Vec<_>>>()?;

        if categories.is_empty() {
            anyhow::bail!("Please select at least one category.");
        }
        categories.sort();
        categories.dedup();

        Ok(categories)
    }

    fn fetcher(&self) -> Result<&NewsApiClient> {
        match &self.fetcher {
            Some(fetcher) => Ok(fetcher),
            None => {
                self.config.fetcher_key()?;
                anyhow::bail!("News client is not configured")
            }
        }
    }

    fn summarizer(&self) -> Result<&AiSummarizer> {
        match &self.summarizer {
            Some(summarizer) => Ok(summarizer),
            None => {
                self.config.summarizer_key()?;
                anyhow::bail!("AI client is not configured")
            }
        }
    }

    pub fn summarizer_label(&self) -> Option<String> {
        self.summarizer
            .as_ref()
            .map(|s| format!("{} ({})", s.provider(), s.model()))
    }

    pub async fn fetch(&self, query: &NewsQuery) -> Result<Vec<Article>> {
        self.fetcher()?.fetch_articles(query).await
    }

    pub async fn summarize(&self, articles: &[Article], mode: SummaryMode) -> Result<Brief> {
        self.summarizer()?.summarize(articles, mode).await
    }

    pub async fn key_points(&self, articles: &[Article]) -> Result<Vec<(String, ArticleSummary)>> {
        Ok(self.summarizer()?.summarize_each(articles).await)
    }

    pub fn output_dir(&self) -> Result<PathBuf> {
        ReportGenerator::resolve_output_dir(self.config.output_dir.as_deref())
    }

    pub fn export_markdown(&self, report: &Report) -> Result<PathBuf> {
        let dir = self.output_dir()?;
        ReportGenerator::save_markdown(report, &dir)
    }

    pub fn export_pdf(&self, report: &Report) -> Result<PdfExport> {
        let dir = self.output_dir()?;
        ReportGenerator::save_pdf(report, &dir)
    }
}
