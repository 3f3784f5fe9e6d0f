use anyhow::Result;
use brief_core::{
    Activity, Article, ArticleSummary, Brief, NewsQuery, NewsService, Report, Session, SummaryMode,
};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use std::fmt;

use crate::ExportFormat;

const MAX_MESSAGES: usize = 50;
const SCROLL_STEP: u16 = 5;

/// Panel that receives navigation keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Location,
    DateRange,
    Categories,
    Articles,
    Actions,
}

impl Focus {
    const ORDER: [Focus; 5] = [
        Focus::Location,
        Focus::DateRange,
        Focus::Categories,
        Focus::Articles,
        Focus::Actions,
    ];

    fn step(self, step: isize) -> Focus {
        cycle(&Self::ORDER, self, step)
    }
}

/// Buttons in the action bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Fetch,
    Summarize,
    SaveMarkdown,
    SavePdf,
}

impl Action {
    pub const ALL: [Action; 4] = [
        Action::Fetch,
        Action::Summarize,
        Action::SaveMarkdown,
        Action::SavePdf,
    ];

    pub fn shortcut(&self) -> char {
        match self {
            Action::Fetch => 'f',
            Action::Summarize => 's',
            Action::SaveMarkdown => 'm',
            Action::SavePdf => 'p',
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Action::Fetch => "Fetch news",
            Action::Summarize => "Generate summary",
            Action::SaveMarkdown => "Save Markdown",
            Action::SavePdf => "Save PDF",
        };
        f.write_str(label)
    }
}

/// Work the event loop runs off the interface thread.
#[derive(Debug)]
pub enum Command {
    Fetch(NewsQuery),
    Summarize {
        articles: Vec<Article>,
        mode: SummaryMode,
        per_article: bool,
    },
    Export {
        report: Report,
        format: ExportFormat,
    },
    Quit,
}

/// Result of a finished [`Command`].
#[derive(Debug)]
pub enum Outcome {
    Fetched(Result<Vec<Article>>),
    Summarized {
        brief: Result<Brief>,
        key_points: Option<Result<Vec<(String, ArticleSummary)>>>,
    },
    Exported(Result<Vec<String>>),
}

fn cycle<T: Copy + PartialEq>(items: &[T], current: T, step: isize) -> T {
    let len = items.len() as isize;
    let position = items.iter().position(|item| *item == current).unwrap_or(0) as isize;
    items[(position + step).rem_euclid(len) as usize]
}

pub struct App {
    pub session: Session,
    pub mode: SummaryMode,
    pub per_article: bool,
    pub focus: Focus,
    pub category_cursor: usize,
    pub article_cursor: usize,
    pub action_cursor: usize,
    pub summary_scroll: u16,
    pub summarizer_label: Option<String>,
    messages: Vec<String>,
}

impl App {
    pub fn new(session: Session, mode: SummaryMode, per_article: bool) -> Self {
        Self {
            session,
            mode,
            per_article,
            focus: Focus::Location,
            category_cursor: 0,
            article_cursor: 0,
            action_cursor: 0,
            summary_scroll: 0,
            summarizer_label: None,
            messages: Vec::new(),
        }
    }

    pub fn with_summarizer_label(mut self, label: Option<String>) -> Self {
        self.summarizer_label = label;
        self
    }

    pub fn messages(&self) -> &[String] {
        &self.messages
    }

    pub fn note(&mut self, message: impl Into<String>) {
        let message = message.into();
        if self.messages.last() == Some(&message) {
            return;
        }
        self.messages.push(message);
        if self.messages.len() > MAX_MESSAGES {
            self.messages.remove(0);
        }
    }

    pub fn is_enabled(&self, action: Action) -> bool {
        match action {
            Action::Fetch => self.session.can_fetch(),
            Action::Summarize => self.session.can_summarize(),
            Action::SaveMarkdown | Action::SavePdf => self.session.can_export(),
        }
    }

    // ==================== Keys ====================

    pub fn handle_key(&mut self, key: KeyEvent) -> Option<Command> {
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return match key.code {
                KeyCode::Char('c') => Some(Command::Quit),
                _ => None,
            };
        }

        match key.code {
            KeyCode::Char('q') | KeyCode::Esc => return Some(Command::Quit),
            KeyCode::Tab => self.focus = self.focus.step(1),
            KeyCode::BackTab => self.focus = self.focus.step(-1),
            KeyCode::PageDown => self.summary_scroll = self.summary_scroll.saturating_add(SCROLL_STEP),
            KeyCode::PageUp => self.summary_scroll = self.summary_scroll.saturating_sub(SCROLL_STEP),
            KeyCode::Char('t') => self.toggle_mode(),
            KeyCode::Char('k') => {
                self.per_article = !self.per_article;
                let state = if self.per_article { "on" } else { "off" };
                self.note(format!("Per-article key points: {}", state));
            }
            KeyCode::Char(c) => {
                if let Some(action) = Action::ALL.into_iter().find(|a| a.shortcut() == c) {
                    return self.start(action);
                }
                return self.edit(key.code);
            }
            code => return self.edit(code),
        }

        None
    }

    fn edit(&mut self, code: KeyCode) -> Option<Command> {
        match self.focus {
            Focus::Location => {
                let step = field_step(code)?;
                if self.editable() {
                    let next = cycle(NewsService::locations(), self.session.location(), step);
                    self.session.set_location(next);
                }
            }
            Focus::DateRange => {
                let step = field_step(code)?;
                if self.editable() {
                    let next = cycle(NewsService::date_ranges(), self.session.date_range(), step);
                    self.session.set_date_range(next);
                }
            }
            Focus::Categories => self.edit_categories(code),
            Focus::Articles => self.edit_articles(code),
            Focus::Actions => {
                let len = Action::ALL.len();
                match code {
                    KeyCode::Left => self.action_cursor = (self.action_cursor + len - 1) % len,
                    KeyCode::Right => self.action_cursor = (self.action_cursor + 1) % len,
                    KeyCode::Enter | KeyCode::Char(' ') => {
                        return self.start(Action::ALL[self.action_cursor]);
                    }
                    _ => {}
                }
            }
        }
        None
    }

    fn edit_categories(&mut self, code: KeyCode) {
        let all = NewsService::categories();
        match code {
            KeyCode::Left => self.category_cursor = (self.category_cursor + all.len() - 1) % all.len(),
            KeyCode::Right => self.category_cursor = (self.category_cursor + 1) % all.len(),
            KeyCode::Enter | KeyCode::Char(' ') => {
                if self.editable() {
                    self.session.toggle_category(all[self.category_cursor]);
                }
            }
            _ => {}
        }
    }

    fn edit_articles(&mut self, code: KeyCode) {
        let count = self.session.articles().len();
        if count == 0 {
            return;
        }

        match code {
            KeyCode::Up => self.article_cursor = self.article_cursor.saturating_sub(1),
            KeyCode::Down => self.article_cursor = (self.article_cursor + 1).min(count - 1),
            KeyCode::Home => self.article_cursor = 0,
            KeyCode::End => self.article_cursor = count - 1,
            KeyCode::Enter | KeyCode::Char(' ') => {
                if self.editable() {
                    if let Err(e) = self.session.toggle(self.article_cursor) {
                        self.note(format!("❌ {:#}", e));
                    }
                }
            }
            KeyCode::Char('a') => {
                if self.editable() {
                    self.session.select_all();
                }
            }
            KeyCode::Char('n') => {
                if self.editable() {
                    self.session.select_none();
                }
            }
            _ => {}
        }
    }

    fn editable(&mut self) -> bool {
        if self.session.is_idle() {
            return true;
        }
        let activity = self.session.activity();
        self.note(format!("⚠ Busy: wait until {} finishes.", activity));
        false
    }

    fn toggle_mode(&mut self) {
        self.mode = match self.mode {
            SummaryMode::Focused => SummaryMode::Standard,
            SummaryMode::Standard => SummaryMode::Focused,
        };
        let mode = self.mode;
        self.note(format!("Summary mode: {}", mode));
    }

    // ==================== Actions ====================

    /// Move the session into the action's activity and hand back the work to run.
    pub fn start(&mut self, action: Action) -> Option<Command> {
        let activity = match action {
            Action::Fetch => Activity::Fetching,
            Action::Summarize => Activity::Summarizing,
            Action::SaveMarkdown | Action::SavePdf => Activity::Exporting,
        };

        if let Err(e) = self.session.begin(activity) {
            self.note(format!("⚠ {}: {:#}", action, e));
            return None;
        }

        match action {
            Action::Fetch => match self.session.query() {
                Ok(query) => Some(Command::Fetch(query)),
                Err(e) => {
                    if let Err(e) = self.session.finish_fetch(Err(e)) {
                        self.note(format!("❌ {:#}", e));
                    }
                    None
                }
            },
            Action::Summarize => Some(Command::Summarize {
                articles: self.session.selected_articles(),
                mode: self.mode,
                per_article: self.per_article,
            }),
            Action::SaveMarkdown => Some(Command::Export {
                report: self.session.snapshot(),
                format: ExportFormat::Markdown,
            }),
            Action::SavePdf => Some(Command::Export {
                report: self.session.snapshot(),
                format: ExportFormat::Pdf,
            }),
        }
    }

    pub fn apply(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Fetched(result) => match self.session.finish_fetch(result) {
                Ok(0) => self.note("No articles found for these filters."),
                Ok(count) => {
                    self.article_cursor = 0;
                    self.summary_scroll = 0;
                    self.focus = Focus::Articles;
                    self.note(format!("✓ Found {} articles", count));
                }
                Err(e) => self.note(format!("❌ {:#}", e)),
            },
            Outcome::Summarized { brief, key_points } => {
                let used = match self.session.finish_summarize(brief) {
                    Ok(brief) => brief.articles.len(),
                    Err(e) => return self.note(format!("❌ {:#}", e)),
                };
                self.summary_scroll = 0;
                self.note(format!("✓ Summary generated from {} articles", used));

                match key_points {
                    Some(Ok(summaries)) => {
                        let ok = summaries
                            .iter()
                            .filter(|(_, s)| matches!(s, ArticleSummary::Success { .. }))
                            .count();
                        let total = summaries.len();
                        self.session.record_key_points(summaries);
                        self.note(format!("✓ Key points for {}/{} articles", ok, total));
                    }
                    Some(Err(e)) => self.note(format!("⚠ Key points unavailable: {:#}", e)),
                    None => {}
                }
            }
            Outcome::Exported(result) => match self.session.finish_export(result) {
                Ok(lines) => lines.into_iter().for_each(|line| self.note(line)),
                Err(e) => self.note(format!("❌ {:#}", e)),
            },
        }
    }
}

/// Left/Right (or Space/Enter) step through a choice field.
fn field_step(code: KeyCode) -> Option<isize> {
    match code {
        KeyCode::Left => Some(-1),
        KeyCode::Right | KeyCode::Enter | KeyCode::Char(' ') => Some(1),
        _ => None,
    }
}
