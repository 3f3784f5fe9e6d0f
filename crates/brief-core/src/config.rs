use anyhow::{Context, Result};
use std::env;
use std::path::PathBuf;
use url::Url;

use crate::summarizer::Provider;

pub const DEFAULT_NEWSAPI_BASE_URL: &str = "https://newsapi.org";

const SETUP_HINT: &str = "To fix this, create ~/.config/newsbrief/.env with:\n  \
    FETCHER_KEY=your_newsapi_key\n  \
    SUMMARIZER_KEY=your_ai_key\n\n";

#[derive(Debug, Clone)]
pub struct Config {
    pub fetcher_key: Option<String>,
    pub summarizer_key: Option<String>,
    pub newsapi_base_url: String,
    pub restrict_domains: bool,
    pub provider: Provider,
    pub model: Option<String>,
    pub summarizer_base_url: Option<String>,
    pub output_dir: Option<PathBuf>,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        // Try to load .env from multiple locations
        Self::try_load_dotenv();

        Self::from_vars(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary variable lookup. Missing credentials are
    /// not an error here; they surface when the matching client is used.
    pub fn from_vars<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let provider = match non_empty("SUMMARIZER_PROVIDER") {
            Some(name) => name
                .parse::<Provider>()
                .context("Invalid SUMMARIZER_PROVIDER")?,
            None => Provider::default(),
        };

        let restrict_domains = match non_empty("NEWSAPI_RESTRICT_DOMAINS") {
            Some(flag) => parse_flag(&flag)
                .with_context(|| format!("Invalid NEWSAPI_RESTRICT_DOMAINS value: {}", flag))?,
            None => false,
        };

        Ok(Self {
            fetcher_key: non_empty("FETCHER_KEY"),
            summarizer_key: non_empty("SUMMARIZER_KEY"),
            newsapi_base_url: non_empty("NEWSAPI_BASE_URL")
                .unwrap_or_else(|| DEFAULT_NEWSAPI_BASE_URL.to_string()),
            restrict_domains,
            provider,
            model: non_empty("SUMMARIZER_MODEL"),
            summarizer_base_url: non_empty("SUMMARIZER_BASE_URL"),
            output_dir: non_empty("NEWSBRIEF_OUTPUT_DIR").map(PathBuf::from),
        })
    }

    pub fn fetcher_key(&self) -> Result<&str> {
        self.fetcher_key.as_deref().with_context(|| {
            format!(
                "FETCHER_KEY not found.\n\n{}\
                Get a NewsAPI key from: https://newsapi.org/register",
                SETUP_HINT
            )
        })
    }

    pub fn summarizer_key(&self) -> Result<&str> {
        self.summarizer_key.as_deref().with_context(|| {
            format!(
                "SUMMARIZER_KEY not found.\n\n{}\
                Get an API key for the {} provider from: {}",
                SETUP_HINT,
                self.provider,
                self.provider.key_url()
            )
        })
    }

    fn try_load_dotenv() {
        // 1. Current directory (for development)
        if dotenvy::dotenv().is_ok() {
            return;
        }

        // 2. ~/.config/newsbrief/.env
        if let Some(config_dir) = dirs::config_dir() {
            let config_path = config_dir.join("newsbrief").join(".env");
            if config_path.exists() && dotenvy::from_path(&config_path).is_ok() {
                return;
            }
        }

        // 3. ~/.env
        if let Some(home_dir) = dirs::home_dir() {
            let home_path = home_dir.join(".env");
            if home_path.exists() {
                let _ = dotenvy::from_path(&home_path);
            }
        }
    }
}

/// Parse an API base URL so that relative endpoint paths are joined under
/// it, keeping any path prefix such as `https://proxy.local/newsapi`.
pub(crate) fn api_base_url(raw: &str) -> Result<Url> {
    let mut url = Url::parse(raw.trim()).with_context(|| format!("Invalid API base URL: {}", raw))?;
    if url.cannot_be_a_base() {
        anyhow::bail!("Invalid API base URL: {}", raw);
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn parse_flag(value: &str) -> Result<bool> {
    match value.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => anyhow::bail!("expected true/false, got '{}'", other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_vars(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_without_any_variables() {
        let config = config_from(&[]).unwrap();
        assert!(config.fetcher_key.is_none());
        assert!(config.summarizer_key.is_none());
        assert_eq!(config.newsapi_base_url, DEFAULT_NEWSAPI_BASE_URL);
        assert_eq!(config.provider, Provider::Gemini);
        assert!(!config.restrict_domains);
        assert!(config.output_dir.is_none());
    }

    #[test]
    fn test_missing_fetcher_key_names_the_variable() {
        let config = config_from(&[("SUMMARIZER_KEY", "abc")]).unwrap();
        let err = config.fetcher_key().unwrap_err();
        assert!(format!("{:#}", err).contains("FETCHER_KEY not found"));
        assert_eq!(config.summarizer_key().unwrap(), "abc");
    }

    #[test]
    fn test_blank_key_counts_as_missing() {
        let config = config_from(&[("SUMMARIZER_KEY", "   ")]).unwrap();
        let err = config.summarizer_key().unwrap_err();
        assert!(err.to_string().contains("SUMMARIZER_KEY not found"));
    }

    #[test]
    fn test_provider_and_overrides() {
        let config = config_from(&[
            ("SUMMARIZER_PROVIDER", "Anthropic"),
            ("SUMMARIZER_MODEL", "claude-3-5-haiku-20241022"),
            ("NEWSAPI_BASE_URL", "http://localhost:9000"),
            ("NEWSAPI_RESTRICT_DOMAINS", "yes"),
            ("NEWSBRIEF_OUTPUT_DIR", "/tmp/reports"),
        ])
        .unwrap();
        assert_eq!(config.provider, Provider::Anthropic);
        assert_eq!(config.model.as_deref(), Some("claude-3-5-haiku-20241022"));
        assert_eq!(config.newsapi_base_url, "http://localhost:9000");
        assert!(config.restrict_domains);
        assert_eq!(config.output_dir, Some(PathBuf::from("/tmp/reports")));
    }

    #[test]
    fn test_invalid_provider_is_rejected() {
        assert!(config_from(&[("SUMMARIZER_PROVIDER", "mystery")]).is_err());
    }

    #[test]
    fn test_invalid_flag_is_rejected() {
        assert!(config_from(&[("NEWSAPI_RESTRICT_DOMAINS", "maybe")]).is_err());
    }

    #[test]
    fn test_api_base_url_keeps_path_prefix() {
        let base = api_base_url("https://proxy.local/newsapi").unwrap();
        assert_eq!(
            base.join("v2/everything").unwrap().as_str(),
            "https://proxy.local/newsapi/v2/everything"
        );

        let root = api_base_url("https://newsapi.org").unwrap();
        assert_eq!(root.join("v2/everything").unwrap().as_str(), "https://newsapi.org/v2/everything");

        assert!(api_base_url("not a url").is_err());
        assert!(api_base_url("mailto:someone@example.com").is_err());
    }
}
