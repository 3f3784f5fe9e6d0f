use std::io::{stdout, Stdout};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use brief_core::NewsService;
use crossterm::{
    event::{self, Event, KeyEventKind},
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
    ExecutableCommand,
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc::{self, UnboundedSender};

use crate::app::{App, Command, Outcome};
use crate::report::write_report;
use crate::ui;

type Term = Terminal<CrosstermBackend<Stdout>>;

pub async fn run(service: NewsService, app: App) -> Result<()> {
    enable_raw_mode()?;
    stdout().execute(EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout()))?;

    let result = event_loop(&mut terminal, Arc::new(service), app).await;

    disable_raw_mode()?;
    stdout().execute(LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn event_loop(terminal: &mut Term, service: Arc<NewsService>, mut app: App) -> Result<()> {
    let (tx, mut rx) = mpsc::unbounded_channel::<Outcome>();

    loop {
        while let Ok(outcome) = rx.try_recv() {
            app.apply(outcome);
        }

        terminal.draw(|frame| ui::draw(frame, &app))?;

        // Poll with a short timeout so finished work shows up promptly
        if !event::poll(Duration::from_millis(100))? {
            continue;
        }
        let Event::Key(key) = event::read()? else {
            continue;
        };
        if key.kind != KeyEventKind::Press {
            continue;
        }

        match app.handle_key(key) {
            Some(Command::Quit) => break,
            Some(command) => dispatch(command, service.clone(), tx.clone()),
            None => {}
        }
    }

    tracing::info!("interface closed");
    Ok(())
}

/// Run `command` on the runtime and report its outcome back to the loop.
fn dispatch(command: Command, service: Arc<NewsService>, tx: UnboundedSender<Outcome>) {
    tokio::spawn(async move {
        let outcome = match command {
            Command::Fetch(query) => Outcome::Fetched(service.fetch(&query).await),
            Command::Summarize {
                articles,
                mode,
                per_article,
            } => {
                let brief = service.summarize(&articles, mode).await;
                let key_points = if per_article && brief.is_ok() {
                    Some(service.key_points(&articles).await)
                } else {
                    None
                };
                Outcome::Summarized { brief, key_points }
            }
            Command::Export { report, format } => {
                Outcome::Exported(write_report(&service, &report, format))
            }
            Command::Quit => return,
        };

        if tx.send(outcome).is_err() {
            tracing::debug!("interface closed before the result arrived");
        }
    });
}
