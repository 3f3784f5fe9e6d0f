use anyhow::Result;
use brief_core::{Activity, ArticleSummary, NewsService, Session, SummaryMode};

use crate::report::write_report;
use crate::ExportFormat;

/// Fetch, keep every article selected, summarize and export without prompting.
pub async fn run(
    service: &NewsService,
    mut session: Session,
    mode: SummaryMode,
    per_article: bool,
    format: ExportFormat,
) -> Result<()> {
    // Step 1: Fetch
    session.begin(Activity::Fetching)?;
    let query = session.query()?;
    println!(
        "📰 Fetching {} news for {} ({})...",
        session.location(),
        query
            .categories
            .iter()
            .map(|c| c.name())
            .collect::<Vec<_>>()
            .join(", "),
        session.date_range()
    );

    let count = session.finish_fetch(service.fetch(&query).await)?;
    if count == 0 {
        println!("No articles found for these filters.");
        return Ok(());
    }
    println!("✓ Found {} articles\n", count);
    for (i, article) in session.articles().iter().enumerate() {
        println!("  {}) {} ({})", i + 1, article.title, article.source);
    }

    // Step 2: Summarize
    session.begin(Activity::Summarizing)?;
    let articles = session.selected_articles();
    match service.summarizer_label() {
        Some(label) => println!("\n🤖 Summarizing {} articles with {}...", articles.len(), label),
        None => println!("\n🤖 Summarizing {} articles...", articles.len()),
    }
    println!("  (This may take a minute...)");

    let brief = session.finish_summarize(service.summarize(&articles, mode).await)?;
    println!("\n{}", brief.to_markdown());

    if per_article {
        println!("🔎 Extracting key points per article...");
        match service.key_points(&articles).await {
            Ok(summaries) => {
                let ok = summaries
                    .iter()
                    .filter(|(_, s)| matches!(s, ArticleSummary::Success { .. }))
                    .count();
                let total = summaries.len();
                session.record_key_points(summaries);
                println!("✓ Key points for {}/{} articles", ok, total);
            }
            Err(e) => println!("⚠ Key points unavailable: {:#}", e),
        }
    }

    // Step 3: Export
    session.begin(Activity::Exporting)?;
    println!("\n📝 Saving report...");
    let report = session.snapshot();
    let lines = session.finish_export(write_report(service, &report, format))?;
    for line in lines {
        println!("{}", line);
    }

    println!("\n✅ Done!");
    Ok(())
}
