use anyhow::Result;
use chrono::Utc;
use std::collections::HashMap;
use std::fmt;

use crate::models::{Article, ArticleSummary, Brief, Report, ReportEntry};
use crate::query::{Category, DateRange, Location, NewsQuery};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Activity {
    #[default]
    Idle,
    Fetching,
    Summarizing,
    Exporting,
}

impl fmt::Display for Activity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Activity::Idle => "idle",
            Activity::Fetching => "fetching news",
            Activity::Summarizing => "summarizing",
            Activity::Exporting => "exporting",
        };
        f.write_str(label)
    }
}

/// State behind the interactive interface: parameters, fetched articles, the
/// selection, the generated brief and whatever call is in flight.
#[derive(Debug, Clone)]
pub struct Session {
    location: Location,
    date_range: DateRange,
    categories: Vec<Category>,
    articles: Vec<Article>,
    selected: Vec<bool>,
    brief: Option<Brief>,
    summaries: HashMap<String, ArticleSummary>,
    activity: Activity,
    status: String,
    last_error: Option<String>,
}

impl Default for Session {
    fn default() -> Self {
        Self::new(Location::Italy, DateRange::Yesterday)
    }
}

impl Session {
    pub fn new(location: Location, date_range: DateRange) -> Self {
        Self {
            location,
            date_range,
            categories: Vec::new(),
            articles: Vec::new(),
            selected: Vec::new(),
            brief: None,
            summaries: HashMap::new(),
            activity: Activity::Idle,
            status: "Ready".to_string(),
            last_error: None,
        }
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn date_range(&self) -> DateRange {
        self.date_range
    }

    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    pub fn articles(&self) -> &[Article] {
        &self.articles
    }

    pub fn brief(&self) -> Option<&Brief> {
        self.brief.as_ref()
    }

    pub fn summary_for(&self, article_id: &str) -> Option<&ArticleSummary> {
        self.summaries.get(article_id)
    }

    pub fn activity(&self) -> Activity {
        self.activity
    }

    pub fn status(&self) -> &str {
        &self.status
    }

    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    // Parameter changes invalidate everything downstream.

    pub fn set_location(&mut self, location: Location) {
        if self.location != location {
            self.location = location;
            self.clear_results();
        }
    }

    pub fn set_date_range(&mut self, date_range: DateRange) {
        if self.date_range != date_range {
            self.date_range = date_range;
            self.clear_results();
        }
    }

    pub fn set_categories(&mut self, mut categories: Vec<Category>) {
        categories.sort();
        categories.dedup();
        if self.categories != categories {
            self.categories = categories;
            self.clear_results();
        }
    }

    pub fn toggle_category(&mut self, category: Category) {
        let mut categories = self.categories.clone();
        match categories.iter().position(|c| *c == category) {
            Some(i) => {
                categories.remove(i);
            }
            None => categories.push(category),
        }
        self.set_categories(categories);
    }

    fn clear_results(&mut self) {
        self.articles.clear();
        self.selected.clear();
        self.brief = None;
        self.summaries.clear();
    }

    pub fn query(&self) -> Result<NewsQuery> {
        if self.categories.is_empty() {
            anyhow::bail!("Please select at least one category.");
        }
        Ok(NewsQuery::new(
            self.location,
            self.date_range,
            self.categories.clone(),
        ))
    }

    // ==================== Availability ====================

    pub fn is_idle(&self) -> bool {
        self.activity == Activity::Idle
    }

    pub fn can_fetch(&self) -> bool {
        self.is_idle() && !self.categories.is_empty()
    }

    pub fn can_summarize(&self) -> bool {
        self.is_idle() && self.selected_count() > 0
    }

    pub fn can_export(&self) -> bool {
        self.is_idle() && self.brief.is_some()
    }

    /// Enter `activity`. Fails while another call is in flight or when the
    /// action's precondition does not hold.
    pub fn begin(&mut self, activity: Activity) -> Result<()> {
        if !self.is_idle() {
            anyhow::bail!("Busy: {} is still in progress.", self.activity);
        }

        match activity {
            Activity::Idle => return Ok(()),
            Activity::Fetching if self.categories.is_empty() => {
                anyhow::bail!("Please select at least one category.")
            }
            Activity::Summarizing if self.selected_count() == 0 => {
                anyhow::bail!("Please select articles to summarize.")
            }
            Activity::Exporting if self.brief.is_none() => {
                anyhow::bail!("Nothing to export yet. Generate a summary first.")
            }
            _ => {}
        }

        self.activity = activity;
        self.last_error = None;
        self.status = match activity {
            Activity::Fetching => "Fetching news...".to_string(),
            Activity::Summarizing => "Generating summary...".to_string(),
            Activity::Exporting => "Exporting...".to_string(),
            Activity::Idle => "Ready".to_string(),
        };

        Ok(())
    }

    fn fail(&mut self, error: anyhow::Error) -> anyhow::Error {
        let message = format!("{:#}", error);
        self.status = format!("Error: {}", message);
        self.last_error = Some(message);
        error
    }

    pub fn finish_fetch(&mut self, result: Result<Vec<Article>>) -> Result<usize> {
        self.activity = Activity::Idle;

        let articles = result.map_err(|e| self.fail(e))?;
        self.status = if articles.is_empty() {
            "No articles found for these filters.".to_string()
        } else {
            format!("Fetched {} articles", articles.len())
        };

        self.brief = None;
        self.summaries.clear();
        self.selected = vec![true; articles.len()];
        self.articles = articles;

        Ok(self.articles.len())
    }

    pub fn finish_summarize(&mut self, result: Result<Brief>) -> Result<&Brief> {
        self.activity = Activity::Idle;

        let brief = result.map_err(|e| self.fail(e))?;
        self.status = format!("Summary generated from {} articles", brief.articles.len());
        self.summaries.clear();

        Ok(self.brief.insert(brief))
    }

    pub fn record_key_points(&mut self, summaries: Vec<(String, ArticleSummary)>) {
        for (id, summary) in summaries {
            if self.articles.iter().any(|a| a.id == id) {
                self.summaries.insert(id, summary);
            }
        }
    }

    pub fn finish_export<T>(&mut self, result: Result<T>) -> Result<T> {
        self.activity = Activity::Idle;

        let value = result.map_err(|e| self.fail(e))?;
        self.status = "Export complete".to_string();

        Ok(value)
    }

    // ==================== Selection ====================

    pub fn is_selected(&self, index: usize) -> bool {
        self.selected.get(index).copied().unwrap_or(false)
    }

    pub fn selected_count(&self) -> usize {
        self.selected.iter().filter(|s| **s).count()
    }

    // A brief only stays valid for the selection it was generated from.
    fn replace_selection(&mut self, selected: Vec<bool>) {
        if selected != self.selected {
            self.selected = selected;
            self.brief = None;
            self.summaries.clear();
        }
    }

    pub fn toggle(&mut self, index: usize) -> Result<()> {
        if index >= self.selected.len() {
            anyhow::bail!(
                "No article number {}. Choose between 1 and {}.",
                index + 1,
                self.selected.len()
            );
        }

        let mut selected = self.selected.clone();
        selected[index] = !selected[index];
        self.replace_selection(selected);
        Ok(())
    }

    /// Replace the selection with exactly `indices` (zero-based).
    pub fn set_selection(&mut self, indices: &[usize]) -> Result<()> {
        if let Some(bad) = indices.iter().find(|i| **i >= self.selected.len()) {
            anyhow::bail!(
                "No article number {}. Choose between 1 and {}.",
                bad + 1,
                self.selected.len()
            );
        }

        let mut selected = vec![false; self.selected.len()];
        for index in indices {
            selected[*index] = true;
        }
        self.replace_selection(selected);
        Ok(())
    }

    pub fn select_all(&mut self) {
        self.replace_selection(vec![true; self.selected.len()]);
    }

    pub fn select_none(&mut self) {
        self.replace_selection(vec![false; self.selected.len()]);
    }

    pub fn selected_articles(&self) -> Vec<Article> {
        self.articles
            .iter()
            .zip(&self.selected)
            .filter(|(_, selected)| **selected)
            .map(|(article, _)| article.clone())
            .collect()
    }

    /// Point-in-time copy of the selected articles, their summaries and the
    /// brief.
    pub fn snapshot(&self) -> Report {
        let entries = self
            .selected_articles()
            .into_iter()
            .map(|article| {
                let summary = self.summaries.get(&article.id).cloned();
                ReportEntry { article, summary }
            })
            .collect();

        Report {
            location: self.location,
            date_range: self.date_range,
            categories: self.categories.clone(),
            brief: self.brief.clone(),
            entries,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SummaryMode;
    use chrono::TimeZone;

    fn article(n: usize) -> Article {
        Article {
            id: format!("news_{}", n),
            title: format!("Headline number {}", n),
            source: "Reuters".to_string(),
            published_at: Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap(),
            url: format!("https://example.com/{}", n),
            content: "Body text".to_string(),
            category: Some(Category::Economy),
        }
    }

    fn fetched_session(count: usize) -> Session {
        let mut session = Session::default();
        session.set_categories(vec![Category::Economy]);
        session.begin(Activity::Fetching).unwrap();
        session
            .finish_fetch(Ok((0..count).map(article).collect()))
            .unwrap();
        session
    }

    // ==================== Availability Tests ====================

    #[test]
    fn test_new_session_has_nothing_enabled() {
        let session = Session::default();
        assert!(!session.can_fetch());
        assert!(!session.can_summarize());
        assert!(!session.can_export());
        assert!(session.query().is_err());
    }

    #[test]
    fn test_fetch_enabled_with_category() {
        let mut session = Session::default();
        session.toggle_category(Category::Sports);
        assert!(session.can_fetch());
        session.toggle_category(Category::Sports);
        assert!(!session.can_fetch());
    }

    #[test]
    fn test_begin_rejects_second_activity() {
        let mut session = Session::default();
        session.set_categories(vec![Category::Health]);
        session.begin(Activity::Fetching).unwrap();

        assert!(!session.can_fetch());
        let err = session.begin(Activity::Fetching).unwrap_err();
        assert!(err.to_string().contains("Busy"));
    }

    #[test]
    fn test_begin_checks_preconditions() {
        let mut session = fetched_session(2);
        session.select_none();
        assert!(session.begin(Activity::Summarizing).is_err());
        assert!(session.begin(Activity::Exporting).is_err());
        assert!(session.is_idle());
    }

    // ==================== Fetch Tests ====================

    #[test]
    fn test_finish_fetch_selects_every_article() {
        let session = fetched_session(3);
        assert_eq!(session.articles().len(), 3);
        assert_eq!(session.selected_count(), 3);
        assert!(session.can_summarize());
        assert_eq!(session.status(), "Fetched 3 articles");
        assert!(session.is_idle());
    }

    #[test]
    fn test_failed_fetch_keeps_previous_articles() {
        let mut session = fetched_session(2);
        session.begin(Activity::Fetching).unwrap();
        let err = session
            .finish_fetch(Err(anyhow::anyhow!("News API returned error: 500")))
            .unwrap_err();

        assert!(err.to_string().contains("500"));
        assert_eq!(session.articles().len(), 2);
        assert!(session.status().starts_with("Error: "));
        assert_eq!(session.last_error(), Some("News API returned error: 500"));
        assert!(session.is_idle());
    }

    #[test]
    fn test_parameter_change_clears_results() {
        let mut session = fetched_session(2);
        session.select_all();
        session.begin(Activity::Summarizing).unwrap();
        let brief = Brief::new(SummaryMode::Focused, "text", &session.selected_articles());
        session.finish_summarize(Ok(brief)).unwrap();
        assert!(session.can_export());

        session.set_location(Location::France);
        assert!(session.articles().is_empty());
        assert!(session.brief().is_none());
        assert!(!session.can_summarize());
        assert!(!session.can_export());
    }

    #[test]
    fn test_same_parameter_keeps_results() {
        let mut session = fetched_session(2);
        session.set_location(Location::Italy);
        session.set_categories(vec![Category::Economy, Category::Economy]);
        assert_eq!(session.articles().len(), 2);
    }

    // ==================== Selection Tests ====================

    #[test]
    fn test_selection_controls_summarize() {
        let mut session = fetched_session(3);
        session.select_none();
        session.toggle(1).unwrap();
        assert!(session.can_summarize());
        assert_eq!(session.selected_articles()[0].id, "news_1");

        session.select_none();
        assert!(!session.can_summarize());
        assert!(session.toggle(7).is_err());
    }

    #[test]
    fn test_set_selection_replaces() {
        let mut session = fetched_session(4);
        session.select_all();
        session.set_selection(&[0, 2]).unwrap();
        let ids: Vec<String> = session.selected_articles().into_iter().map(|a| a.id).collect();
        assert_eq!(ids, vec!["news_0", "news_2"]);
        assert!(session.set_selection(&[4]).is_err());
        assert_eq!(session.selected_count(), 2);
    }

    fn summarized_session(count: usize, selection: &[usize]) -> Session {
        let mut session = fetched_session(count);
        session.set_selection(selection).unwrap();
        session.begin(Activity::Summarizing).unwrap();
        let brief = Brief::new(SummaryMode::Focused, "brief", &session.selected_articles());
        session.finish_summarize(Ok(brief)).unwrap();
        session
    }

    #[test]
    fn test_selection_change_discards_brief() {
        let mut session = summarized_session(3, &[0, 1]);
        assert!(session.can_export());

        session.set_selection(&[2]).unwrap();
        assert!(session.brief().is_none());
        assert!(!session.can_export());
        assert!(session.begin(Activity::Exporting).is_err());
    }

    #[test]
    fn test_clearing_selection_disables_export() {
        let mut session = summarized_session(3, &[0, 1]);
        session.select_none();
        assert!(!session.can_export());
        assert!(!session.can_summarize());

        let mut session = summarized_session(3, &[0]);
        session.toggle(0).unwrap();
        assert!(session.brief().is_none());
    }

    #[test]
    fn test_unchanged_selection_keeps_brief() {
        let mut session = summarized_session(3, &[0, 1]);
        session.set_selection(&[1, 0]).unwrap();
        assert!(session.can_export());

        let mut session = summarized_session(2, &[0, 1]);
        session.select_all();
        assert!(session.can_export());
    }

    #[test]
    fn test_report_matches_summarized_articles() {
        let session = summarized_session(3, &[0, 1]);
        let report = session.snapshot();

        let brief_ids: Vec<&str> = report
            .brief
            .as_ref()
            .unwrap()
            .articles
            .iter()
            .map(|a| a.id.as_str())
            .collect();
        let entry_ids: Vec<&str> = report.entries.iter().map(|e| e.article.id.as_str()).collect();
        assert_eq!(brief_ids, entry_ids);
    }

    // ==================== Summary and Snapshot Tests ====================

    #[test]
    fn test_new_brief_drops_old_key_points() {
        let mut session = summarized_session(2, &[0, 1]);
        session.record_key_points(vec![(
            "news_0".to_string(),
            ArticleSummary::Success {
                points: vec!["Old point".to_string()],
            },
        )]);
        assert!(session.summary_for("news_0").is_some());

        session.begin(Activity::Summarizing).unwrap();
        let brief = Brief::new(SummaryMode::Standard, "again", &session.selected_articles());
        session.finish_summarize(Ok(brief)).unwrap();

        assert!(session.summary_for("news_0").is_none());
        assert!(session.snapshot().entries.iter().all(|e| e.summary.is_none()));
    }

    #[test]
    fn test_failed_summary_keeps_previous_brief() {
        let mut session = fetched_session(2);
        session.select_all();
        session.begin(Activity::Summarizing).unwrap();
        let brief = Brief::new(SummaryMode::Focused, "first", &session.selected_articles());
        session.finish_summarize(Ok(brief)).unwrap();

        session.begin(Activity::Summarizing).unwrap();
        assert!(session
            .finish_summarize(Err(anyhow::anyhow!("AI summarization failed")))
            .is_err());
        assert_eq!(session.brief().map(|b| b.text.as_str()), Some("first"));
    }

    #[test]
    fn test_snapshot_contains_selected_articles_with_summaries() {
        let mut session = fetched_session(3);
        session.set_selection(&[0, 2]).unwrap();
        session.record_key_points(vec![
            (
                "news_0".to_string(),
                ArticleSummary::Success {
                    points: vec!["Point".to_string()],
                },
            ),
            ("unknown".to_string(), ArticleSummary::Insufficient),
        ]);

        let report = session.snapshot();
        assert_eq!(report.location, Location::Italy);
        assert_eq!(report.entries.len(), 2);
        assert!(matches!(report.entries[0].summary, Some(ArticleSummary::Success { .. })));
        assert!(report.entries[1].summary.is_none());
        assert!(session.summary_for("unknown").is_none());
    }
}
