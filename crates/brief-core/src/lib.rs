// Public modules
pub mod config;
pub mod export;
pub mod fetcher;
pub mod models;
pub mod pdf;
pub mod processor;
pub mod prompts;
pub mod query;
pub mod service;
pub mod session;
pub mod summarizer;

// Re-export commonly used types
pub use config::Config;
pub use export::{PdfExport, ReportGenerator};
pub use fetcher::NewsApiClient;
pub use models::{Article, ArticleRef, ArticleSummary, Brief, Report, ReportEntry, SummaryMode};
pub use processor::ArticleProcessor;
pub use query::{Category, DateRange, Location, NewsQuery};
pub use service::NewsService;
pub use session::{Activity, Session};
pub use summarizer::{AiSummarizer, Provider};
