//! Screen layout: parameter form, article checklist, summary pane, action
//! buttons and the message log.

use brief_core::{Article, ArticleSummary, NewsService};
use ratatui::{
    prelude::*,
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph, Wrap},
};

use crate::app::{Action, App, Focus};
use crate::theme;

const HELP: &str = "Tab focus · ←/→ change · ↑/↓ move · Space toggle · a/n all/none · Enter press · \
                    f/s/m/p actions · t mode · k key points · PgUp/PgDn scroll · q quit";

pub fn draw(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Min(8),
            Constraint::Length(3),
            Constraint::Length(6),
            Constraint::Length(1),
        ])
        .split(frame.area());

    render_parameters(frame, chunks[0], app);

    let body = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(chunks[1]);
    render_articles(frame, body[0], app);
    render_summary(frame, body[1], app);

    render_actions(frame, chunks[2], app);
    render_messages(frame, chunks[3], app);

    frame.render_widget(
        Paragraph::new(HELP).style(Style::default().fg(theme::TEXT_MUTED)),
        chunks[4],
    );
}

fn render_parameters(frame: &mut Frame, area: Rect, app: &App) {
    let session = &app.session;
    let label = Style::default().fg(theme::TEXT_SECONDARY);

    let choice = |focus: Focus, value: String| {
        Span::styled(format!("‹ {} ›", value), theme::field(app.focus == focus))
    };

    let mut categories = vec![Span::styled("Categories: ", label)];
    for (i, category) in NewsService::categories().iter().enumerate() {
        let checked = if session.categories().contains(category) { "x" } else { " " };
        let under_cursor = app.focus == Focus::Categories && app.category_cursor == i;
        let style = if under_cursor {
            theme::field(true).add_modifier(Modifier::REVERSED)
        } else {
            theme::field(false)
        };
        categories.push(Span::styled(format!("[{}] {}", checked, category), style));
        categories.push(Span::raw("  "));
    }

    let key_points = if app.per_article { "on" } else { "off" };
    let model = app.summarizer_label.as_deref().unwrap_or("not configured");

    let lines = vec![
        Line::from(vec![
            Span::styled("Location: ", label),
            choice(Focus::Location, session.location().to_string()),
            Span::raw("    "),
            Span::styled("Date range: ", label),
            choice(Focus::DateRange, session.date_range().to_string()),
        ]),
        Line::from(categories),
        Line::from(vec![
            Span::styled("Mode: ", label),
            Span::styled(app.mode.to_string(), theme::field(false)),
            Span::styled("    Key points: ", label),
            Span::styled(key_points, theme::field(false)),
            Span::styled("    Model: ", label),
            Span::styled(model.to_string(), theme::field(false)),
        ]),
    ];

    let focused = matches!(app.focus, Focus::Location | Focus::DateRange | Focus::Categories);
    let block = Block::default()
        .title(" newsbrief ")
        .borders(Borders::ALL)
        .border_style(theme::border(focused));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn summary_note(summary: Option<&ArticleSummary>) -> Option<String> {
    match summary? {
        ArticleSummary::Success { points } => Some(format!("{} key points", points.len())),
        ArticleSummary::Insufficient => Some("insufficient content".to_string()),
        ArticleSummary::Failed(_) => Some("key points failed".to_string()),
    }
}

fn article_item<'a>(article: &'a Article, selected: bool, summary: Option<&ArticleSummary>) -> ListItem<'a> {
    let checkbox = if selected { "[x] " } else { "[ ] " };
    let mut meta = format!(
        "    {} | {} | {}",
        article.source,
        article.category_name(),
        article.published_at.format("%Y-%m-%d %H:%M")
    );
    if let Some(note) = summary_note(summary) {
        meta.push_str(" | ");
        meta.push_str(&note);
    }

    ListItem::new(vec![
        Line::from(vec![
            Span::styled(checkbox, Style::default().fg(theme::ACCENT)),
            Span::styled(article.title.as_str(), Style::default().fg(theme::TEXT_PRIMARY)),
        ]),
        Line::styled(meta, Style::default().fg(theme::TEXT_MUTED)),
    ])
}

fn render_articles(frame: &mut Frame, area: Rect, app: &App) {
    let session = &app.session;
    let focused = app.focus == Focus::Articles;
    let block = Block::default()
        .title(format!(
            " Articles ({}/{} selected) ",
            session.selected_count(),
            session.articles().len()
        ))
        .borders(Borders::ALL)
        .border_style(theme::border(focused));

    if session.articles().is_empty() {
        let hint = Paragraph::new("No articles yet. Choose categories and press f to fetch.")
            .style(Style::default().fg(theme::TEXT_MUTED))
            .wrap(Wrap { trim: true })
            .block(block);
        frame.render_widget(hint, area);
        return;
    }

    let items: Vec<ListItem> = session
        .articles()
        .iter()
        .enumerate()
        .map(|(i, article)| article_item(article, session.is_selected(i), session.summary_for(&article.id)))
        .collect();

    let highlight = if focused {
        Style::default().bg(theme::BG_BUTTON).add_modifier(Modifier::BOLD)
    } else {
        Style::default()
    };
    let list = List::new(items).block(block).highlight_style(highlight);
    let mut state = ListState::default().with_selected(Some(app.article_cursor));
    frame.render_stateful_widget(list, area, &mut state);
}

fn render_summary(frame: &mut Frame, area: Rect, app: &App) {
    let block = Block::default()
        .title(" Summary ")
        .borders(Borders::ALL)
        .border_style(theme::border(false));

    let paragraph = match app.session.brief() {
        Some(brief) => Paragraph::new(brief.to_markdown())
            .style(Style::default().fg(theme::TEXT_PRIMARY))
            .scroll((app.summary_scroll, 0)),
        None => Paragraph::new("No summary yet. Select articles and press s.")
            .style(Style::default().fg(theme::TEXT_MUTED)),
    };
    frame.render_widget(paragraph.wrap(Wrap { trim: false }).block(block), area);
}

fn button_style(enabled: bool, under_cursor: bool) -> Style {
    let style = if enabled {
        Style::default()
            .fg(theme::TEXT_PRIMARY)
            .bg(theme::BG_BUTTON)
            .add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme::TEXT_MUTED)
    };
    if under_cursor {
        style.add_modifier(Modifier::REVERSED)
    } else {
        style
    }
}

fn render_actions(frame: &mut Frame, area: Rect, app: &App) {
    let focused = app.focus == Focus::Actions;
    let mut spans = Vec::new();
    for (i, action) in Action::ALL.iter().enumerate() {
        let style = button_style(app.is_enabled(*action), focused && app.action_cursor == i);
        spans.push(Span::styled(format!(" {} [{}] ", action, action.shortcut()), style));
        spans.push(Span::raw("  "));
    }

    let title = if app.session.is_idle() {
        " Actions ".to_string()
    } else {
        format!(" Actions · {}... ", app.session.activity())
    };
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(theme::border(focused));
    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_messages(frame: &mut Frame, area: Rect, app: &App) {
    let status_style = if app.session.last_error().is_some() {
        Style::default().fg(theme::RED_ERROR)
    } else {
        Style::default().fg(theme::TEXT_PRIMARY)
    };

    let visible = area.height.saturating_sub(3) as usize;
    let messages = app.messages();
    let start = messages.len().saturating_sub(visible);

    let mut lines = vec![Line::styled(app.session.status().to_string(), status_style)];
    lines.extend(
        messages[start..]
            .iter()
            .map(|m| Line::styled(m.as_str(), theme::message(m))),
    );

    let block = Block::default()
        .title(" Status ")
        .borders(Borders::ALL)
        .border_style(theme::border(false));
    frame.render_widget(Paragraph::new(lines).block(block), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use brief_core::{Category, DateRange, Location, Session, SummaryMode};
    use ratatui::{backend::TestBackend, Terminal};

    fn screen_text(app: &App) -> String {
        let mut terminal = Terminal::new(TestBackend::new(140, 30)).unwrap();
        terminal.draw(|frame| draw(frame, app)).unwrap();
        let buffer = terminal.backend().buffer();
        buffer
            .content
            .chunks(buffer.area.width as usize)
            .map(|row| row.iter().map(|cell| cell.symbol()).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }

    // ==================== Render Tests ====================

    #[test]
    fn test_draw_shows_parameters_and_buttons() {
        let mut session = Session::new(Location::France, DateRange::Yesterday);
        session.set_categories(vec![Category::Science]);
        let app = App::new(session, SummaryMode::Focused, false);

        let text = screen_text(&app);
        assert!(text.contains("‹ France ›"));
        assert!(text.contains("[x] Science"));
        assert!(text.contains("[ ] Politics"));
        assert!(text.contains("Fetch news [f]"));
        assert!(text.contains("Save PDF [p]"));
        assert!(text.contains("No articles yet"));
    }

    #[test]
    fn test_disabled_buttons_are_muted() {
        assert_eq!(button_style(false, false).fg, Some(theme::TEXT_MUTED));
        assert_eq!(button_style(true, false).bg, Some(theme::BG_BUTTON));
        assert!(button_style(true, true).add_modifier.contains(Modifier::REVERSED));
    }

    #[test]
    fn test_summary_note_labels() {
        let success = ArticleSummary::Success { points: vec!["a".to_string(), "b".to_string()] };
        assert_eq!(summary_note(Some(&success)).as_deref(), Some("2 key points"));
        assert_eq!(
            summary_note(Some(&ArticleSummary::Insufficient)).as_deref(),
            Some("insufficient content")
        );
        assert_eq!(summary_note(None), None);
    }
}
