mod app;
mod batch;
mod report;
mod theme;
mod tui;
mod ui;

use anyhow::{Context, Result};
use brief_core::{Config, DateRange, Location, NewsService, Provider, Session, SummaryMode};
use clap::{Parser, ValueEnum};
use std::fs::{self, File, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use crate::app::App;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum ExportFormat {
    Markdown,
    Pdf,
    Both,
}

impl ExportFormat {
    pub fn includes_markdown(&self) -> bool {
        matches!(self, ExportFormat::Markdown | ExportFormat::Both)
    }

    pub fn includes_pdf(&self) -> bool {
        matches!(self, ExportFormat::Pdf | ExportFormat::Both)
    }
}

#[derive(Parser)]
#[command(name = "newsbrief")]
#[command(about = "Fetch news by location and topic, summarize it with AI and export Markdown or PDF reports")]
struct Args {
    /// Location to search (Italy, USA, France, Germany, Spain, England, World)
    #[arg(short, long)]
    location: Option<String>,

    /// Date range (today, yesterday, this-week, last-week, this-month, last-month, last-7-days)
    #[arg(short, long)]
    date_range: Option<String>,

    /// Comma-separated categories (Politics, Economy, Technology, Science, Health, Sports)
    #[arg(short, long, value_delimiter = ',')]
    categories: Vec<String>,

    /// Summary style (focused, standard)
    #[arg(short, long, default_value = "focused")]
    mode: String,

    /// Also extract key points for every selected article
    #[arg(long)]
    per_article: bool,

    /// Export format used in batch mode
    #[arg(short, long, value_enum, default_value_t = ExportFormat::Markdown)]
    format: ExportFormat,

    /// Directory for exported reports
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// AI provider (gemini, anthropic)
    #[arg(long)]
    provider: Option<String>,

    /// AI model name
    #[arg(long)]
    model: Option<String>,

    /// Run fetch, summarize and export without opening the interface
    #[arg(short, long)]
    yes: bool,

    /// Show debug logging on stderr
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn apply_overrides(&self, config: &mut Config) -> Result<()> {
        if let Some(dir) = &self.output_dir {
            config.output_dir = Some(dir.clone());
        }
        if let Some(provider) = &self.provider {
            config.provider = provider.parse::<Provider>()?;
        }
        if let Some(model) = &self.model {
            config.model = Some(model.clone());
        }
        Ok(())
    }

    fn initial_session(&self) -> Result<Session> {
        let location = match &self.location {
            Some(name) => name.parse::<Location>()?,
            None => Location::Italy,
        };
        let date_range = match &self.date_range {
            Some(name) => name.parse::<DateRange>()?,
            None => DateRange::Yesterday,
        };

        let mut session = Session::new(location, date_range);
        if !self.categories.is_empty() {
            session.set_categories(NewsService::validate_categories(&self.categories)?);
        }

        Ok(session)
    }

    fn is_batch(&self) -> bool {
        self.yes && self.location.is_some() && self.date_range.is_some() && !self.categories.is_empty()
    }
}

fn log_file() -> Option<File> {
    let dir = dirs::data_local_dir()?.join("newsbrief");
    fs::create_dir_all(&dir).ok()?;
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("newsbrief.log"))
        .ok()
}

/// `interactive` keeps log output off the terminal the interface draws on.
fn init_logging(verbose: bool, interactive: bool) {
    let default_filter = if verbose {
        "newsbrief=debug,brief_core=debug"
    } else {
        "newsbrief=info,brief_core=info"
    };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // Progress goes to stdout, so stderr only carries warnings unless -v
    let stderr_level = if verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::WARN
    };
    let stderr_layer = (!interactive).then(|| {
        fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(false)
            .with_filter(stderr_level)
    });

    let file_layer = log_file().map(|file| {
        fmt::layer()
            .with_ansi(false)
            .with_writer(Mutex::new(file))
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, !args.is_batch());

    let mut config = Config::from_env()?;
    args.apply_overrides(&mut config)?;

    let mode = args.mode.parse::<SummaryMode>()?;
    let session = args.initial_session()?;
    let service = NewsService::new(config).context("Failed to set up API clients")?;

    tracing::info!(batch = args.is_batch(), "newsbrief starting");

    if args.is_batch() {
        return batch::run(&service, session, mode, args.per_article, args.format).await;
    }

    let mut app = App::new(session, mode, args.per_article)
        .with_summarizer_label(service.summarizer_label());
    if args.yes {
        app.note("⚠ --yes needs --location, --date-range and --categories; starting interactive mode.");
    }
    tui::run(service, app).await
}
