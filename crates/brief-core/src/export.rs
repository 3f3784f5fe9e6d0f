use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use std::fs;
use std::path::{Path, PathBuf};

use crate::models::{ArticleSummary, Report};
use crate::pdf;

pub const REPORT_TITLE: &str = "News Summary Report";

/// Result of a PDF export. Rendering problems fall back to Markdown so the
/// user never loses the summary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PdfExport {
    Written(PathBuf),
    MarkdownFallback { path: PathBuf, reason: String },
}

impl PdfExport {
    pub fn path(&self) -> &Path {
        match self {
            PdfExport::Written(path) => path,
            PdfExport::MarkdownFallback { path, .. } => path,
        }
    }
}

pub struct ReportGenerator;

impl ReportGenerator {
    pub fn generate_markdown(report: &Report) -> String {
        let mut md = String::new();

        md.push_str(&format!("# {}\n\n", REPORT_TITLE));
        md.push_str(&format!(
            "**Location**: {} | **Date range**: {} | **Categories**: {}\n",
            report.location,
            report.date_range,
            Self::category_list(report)
        ));
        md.push_str(&format!(
            "**Generated**: {}\n\n",
            report.created_at.format("%Y-%m-%d %H:%M UTC")
        ));

        match &report.brief {
            Some(brief) => {
                md.push_str(&brief.to_markdown());
                md.push('\n');
            }
            None => md.push_str("_No AI summary was generated for this report._\n\n"),
        }

        if report.entries.is_empty() {
            return md;
        }

        md.push_str("## Articles\n\n");
        for (index, entry) in report.entries.iter().enumerate() {
            let article = &entry.article;

            md.push_str(&format!("### {}. {}\n\n", index + 1, article.title.trim()));
            md.push_str(&format!(
                "*{}* | {} | {} | [Read article]({})\n\n",
                article.source,
                article.category_name(),
                article.published_at.format("%Y-%m-%d %H:%M"),
                article.url
            ));

            let content = article.content.trim();
            if !content.is_empty() && content != "No content" {
                md.push_str(&format!("> {}\n\n", content.replace('\n', " ")));
            }

            match &entry.summary {
                Some(ArticleSummary::Success { points }) => {
                    md.push_str("**Key points**\n\n");
                    for point in points {
                        md.push_str(&format!("- {}\n", point));
                    }
                    md.push('\n');
                }
                Some(ArticleSummary::Insufficient) | Some(ArticleSummary::Failed(_)) => {
                    md.push_str("_Summary not available_\n\n");
                }
                None => {}
            }
        }

        md
    }

    fn category_list(report: &Report) -> String {
        let mut names: Vec<&str> = report.categories.iter().map(|c| c.name()).collect();
        names.sort_unstable();
        names.join(", ")
    }

    /// `NewsReport_{location}_{categories}_{timestamp}.{ext}`, reduced to
    /// characters that are safe on every filesystem.
    pub fn filename(report: &Report, ext: &str, now: DateTime<Local>) -> String {
        let mut topics: Vec<&str> = report.categories.iter().map(|c| c.name()).collect();
        topics.sort_unstable();

        let name = format!(
            "NewsReport_{}_{}_{}.{}",
            report.location,
            topics.join("_"),
            now.format("%Y-%m-%d_%H%M"),
            ext
        );

        name.chars()
            .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-'))
            .collect()
    }

    pub fn save_markdown(report: &Report, dir: &Path) -> Result<PathBuf> {
        let filepath = dir.join(Self::filename(report, "md", Local::now()));
        let content = Self::generate_markdown(report);

        fs::write(&filepath, content)
            .with_context(|| format!("Failed to save markdown file: {}", filepath.display()))?;

        tracing::info!(path = %filepath.display(), "saved markdown report");
        Ok(filepath)
    }

    pub fn save_pdf(report: &Report, dir: &Path) -> Result<PdfExport> {
        Self::write_pdf_report(report, dir, Local::now())
    }

    fn write_pdf_report(report: &Report, dir: &Path, now: DateTime<Local>) -> Result<PdfExport> {
        let filepath = dir.join(Self::filename(report, "pdf", now));
        let markdown = Self::generate_markdown(report);
        let footer = format!(
            "Generated on {} by newsbrief",
            now.format("%Y-%m-%d at %H:%M:%S")
        );

        match pdf::write_pdf(&markdown, REPORT_TITLE, &footer, &filepath) {
            Ok(()) => {
                tracing::info!(path = %filepath.display(), "saved PDF report");
                Ok(PdfExport::Written(filepath))
            }
            Err(e) => {
                let reason = format!("{:#}", e);
                tracing::warn!("PDF generation failed, saving markdown instead: {}", reason);

                let _ = fs::remove_file(&filepath);
                let md_path = dir.join(Self::filename(report, "md", now));
                fs::write(&md_path, markdown).with_context(|| {
                    format!("Failed to save markdown file: {}", md_path.display())
                })?;

                Ok(PdfExport::MarkdownFallback {
                    path: md_path,
                    reason,
                })
            }
        }
    }

    /// Configured directory, else `~/Documents/news_reports`, else
    /// `./document_news_report`.
    pub fn resolve_output_dir(configured: Option<&Path>) -> Result<PathBuf> {
        if let Some(dir) = configured {
            fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;
            return Ok(dir.to_path_buf());
        }

        let documents = dirs::document_dir().or_else(|| dirs::home_dir().map(|h| h.join("Documents")));
        if let Some(documents) = documents {
            let preferred = documents.join("news_reports");
            match Self::ensure_writable(&preferred) {
                Ok(()) => return Ok(preferred),
                Err(e) => tracing::warn!(
                    "Could not use {}: {:#}. Falling back to the current directory.",
                    preferred.display(),
                    e
                ),
            }
        }

        let fallback = std::env::current_dir()
            .context("Could not determine current directory")?
            .join("document_news_report");
        fs::create_dir_all(&fallback).context("Failed to create fallback output directory")?;

        Ok(fallback)
    }

    fn ensure_writable(dir: &Path) -> Result<()> {
        fs::create_dir_all(dir).context("Failed to create directory")?;

        let test_file = dir.join(".newsbrief_write_test.tmp");
        fs::write(&test_file, b"test").context("Directory is not writable")?;
        fs::remove_file(&test_file).context("Failed to remove write test file")?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Article, Brief, ReportEntry, SummaryMode};
    use crate::query::{Category, DateRange, Location};
    use chrono::{TimeZone, Utc};

    fn sample_report() -> Report {
        let articles = vec![
            Article {
                id: "news_0".to_string(),
                title: "Central bank holds rates steady".to_string(),
                source: "Il Sole 24 Ore".to_string(),
                published_at: Utc.with_ymd_and_hms(2026, 2, 1, 8, 30, 0).unwrap(),
                url: "https://example.com/rates".to_string(),
                content: "The central bank kept its main rate at 2.5 percent on Thursday.".to_string(),
                category: Some(Category::Economy),
            },
            Article {
                id: "news_1".to_string(),
                title: "Parliament passes budget".to_string(),
                source: "ANSA".to_string(),
                published_at: Utc.with_ymd_and_hms(2026, 2, 1, 9, 0, 0).unwrap(),
                url: "https://example.com/budget".to_string(),
                content: "No content".to_string(),
                category: Some(Category::Politics),
            },
        ];

        let brief = Brief::new(
            SummaryMode::Focused,
            "ROME HOLDS ITS BREATH\nRates and budget dominate the week.",
            &articles,
        );

        Report {
            location: Location::Italy,
            date_range: DateRange::ThisWeek,
            categories: vec![Category::Politics, Category::Economy],
            brief: Some(brief),
            entries: vec![
                ReportEntry {
                    article: articles[0].clone(),
                    summary: Some(ArticleSummary::Success {
                        points: vec!["Rate unchanged at 2.5 percent".to_string()],
                    }),
                },
                ReportEntry {
                    article: articles[1].clone(),
                    summary: Some(ArticleSummary::Failed("timeout".to_string())),
                },
            ],
            created_at: Utc.with_ymd_and_hms(2026, 2, 1, 12, 0, 0).unwrap(),
        }
    }

    // ==================== Markdown Generation Tests ====================

    #[test]
    fn test_generate_markdown_contains_titles_and_summary() {
        let md = ReportGenerator::generate_markdown(&sample_report());

        assert!(md.starts_with("# News Summary Report\n\n"));
        assert!(md.contains("**Location**: Italy | **Date range**: this week | **Categories**: Economy, Politics"));
        assert!(md.contains("**Generated**: 2026-02-01 12:00 UTC"));
        assert!(md.contains("## News Brief"));
        assert!(md.contains("Rates and budget dominate the week."));
        assert!(md.contains("### 1. Central bank holds rates steady"));
        assert!(md.contains("### 2. Parliament passes budget"));
        assert!(md.contains("[Read article](https://example.com/rates)"));
        assert!(md.contains("- Rate unchanged at 2.5 percent"));
        assert!(md.contains("_Summary not available_"));
    }

    #[test]
    fn test_generate_markdown_skips_placeholder_content() {
        let md = ReportGenerator::generate_markdown(&sample_report());
        assert!(md.contains("> The central bank kept its main rate"));
        assert!(!md.contains("> No content"));
    }

    #[test]
    fn test_generate_markdown_without_brief() {
        let mut report = sample_report();
        report.brief = None;
        report.entries.clear();
        let md = ReportGenerator::generate_markdown(&report);

        assert!(md.contains("_No AI summary was generated for this report._"));
        assert!(!md.contains("## Articles"));
    }

    // ==================== Filename Tests ====================

    #[test]
    fn test_filename_is_sanitized_and_sorted() {
        let now = Local.with_ymd_and_hms(2026, 2, 1, 14, 5, 0).unwrap();
        let name = ReportGenerator::filename(&sample_report(), "md", now);
        assert_eq!(name, "NewsReport_Italy_Economy_Politics_2026-02-01_1405.md");
    }

    #[test]
    fn test_filename_drops_unsafe_characters() {
        let mut report = sample_report();
        report.location = Location::Usa;
        report.categories = vec![Category::Health];
        let now = Local.with_ymd_and_hms(2026, 2, 1, 14, 5, 0).unwrap();
        let name = ReportGenerator::filename(&report, "pdf", now);
        assert!(name.chars().all(|c| c.is_ascii_alphanumeric() || "._-".contains(c)));
        assert!(name.starts_with("NewsReport_USA_Health_"));
    }

    // ==================== File Output Tests ====================

    #[test]
    fn test_save_markdown_writes_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = ReportGenerator::save_markdown(&sample_report(), dir.path()).unwrap();

        let written = fs::read_to_string(&path).unwrap();
        assert!(written.contains("Central bank holds rates steady"));
        assert!(written.contains("Parliament passes budget"));
        assert!(written.contains("Rates and budget dominate the week."));
        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("md"));
    }

    #[test]
    fn test_save_pdf_writes_pdf() {
        let dir = tempfile::TempDir::new().unwrap();
        let export = ReportGenerator::save_pdf(&sample_report(), dir.path()).unwrap();

        let path = match export {
            PdfExport::Written(path) => path,
            PdfExport::MarkdownFallback { reason, .. } => panic!("unexpected fallback: {}", reason),
        };
        let bytes = fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn test_save_pdf_falls_back_to_markdown() {
        let dir = tempfile::TempDir::new().unwrap();
        let report = sample_report();
        let now = Local.with_ymd_and_hms(2026, 2, 1, 10, 15, 0).unwrap();

        // A directory where the PDF should go makes the PDF write fail
        let blocked = dir.path().join(ReportGenerator::filename(&report, "pdf", now));
        fs::create_dir(&blocked).unwrap();

        let export = ReportGenerator::write_pdf_report(&report, dir.path(), now).unwrap();
        let (path, reason) = match export {
            PdfExport::MarkdownFallback { path, reason } => (path, reason),
            PdfExport::Written(path) => panic!("expected fallback, got {}", path.display()),
        };

        assert_eq!(path.extension().and_then(|e| e.to_str()), Some("md"));
        assert!(reason.contains("Failed to create PDF file"));
        let saved = fs::read_to_string(&path).unwrap();
        assert!(saved.contains("Central bank holds rates steady"));
        assert!(blocked.is_dir());
    }

    #[test]
    fn test_save_markdown_into_missing_dir_fails() {
        let dir = tempfile::TempDir::new().unwrap();
        let missing = dir.path().join("does").join("not").join("exist");
        assert!(ReportGenerator::save_markdown(&sample_report(), &missing).is_err());
    }

    #[test]
    fn test_resolve_output_dir_creates_configured_dir() {
        let dir = tempfile::TempDir::new().unwrap();
        let target = dir.path().join("reports");
        let resolved = ReportGenerator::resolve_output_dir(Some(&target)).unwrap();
        assert_eq!(resolved, target);
        assert!(target.is_dir());
    }
}
