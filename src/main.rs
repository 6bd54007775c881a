use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode},
};
use mailsort::app::{App, AppEvent, Command};
use mailsort::client::{ClassificationClient, ClassifierApi};
use mailsort::config::{API_URL_ENV, Config};
use mailsort::{clipboard, tasks, ui};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use std::io;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::mpsc;

const DEBUG_LOG: &str = "mailsort_debug.log";

struct Args {
    debug: bool,
    api_url: Option<String>,
}

fn parse_args() -> Args {
    let mut args = Args {
        debug: false,
        api_url: None,
    };
    let mut iter = std::env::args().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--debug" => args.debug = true,
            "--api-url" => args.api_url = iter.next(),
            other => {
                if let Some(url) = other.strip_prefix("--api-url=") {
                    args.api_url = Some(url.to_string());
                }
            }
        }
    }
    args
}

/// Logs go to a file; the terminal belongs to the UI.
fn init_logging() -> anyhow::Result<()> {
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(DEBUG_LOG)?;
    tracing_subscriber::fmt()
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .init();
    Ok(())
}

fn run_commands(
    commands: Vec<Command>,
    app: &mut App<'_>,
    api: &Arc<dyn ClassifierApi>,
    tx: &mpsc::Sender<AppEvent>,
) {
    for command in commands {
        match command {
            Command::Copy(text) => {
                let outcome = clipboard::copy_to_clipboard(&mut io::stdout(), &text);
                app.on_copied(&text, outcome);
            }
            other => {
                tracing::debug!(command = ?other, "dispatching");
                tasks::dispatch(api.clone(), other, tx.clone());
            }
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = parse_args();
    if args.debug {
        init_logging()?;
    }

    let mut config = Config::load();
    config.apply_overrides(std::env::var(API_URL_ENV).ok(), args.api_url);
    tracing::info!(base_url = %config.api.base_url, "starting");

    let client = ClassificationClient::new(
        &config.api.base_url,
        Duration::from_secs(config.api.timeout_secs),
    )?;
    let api: Arc<dyn ClassifierApi> = Arc::new(client);

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(
        stdout,
        crossterm::terminal::EnterAlternateScreen,
        crossterm::event::EnableMouseCapture,
        crossterm::event::EnableBracketedPaste
    )?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(config.api.page_size);
    let (tx, mut rx) = mpsc::channel::<AppEvent>(16);

    loop {
        // Apply finished background work
        while let Ok(event) = rx.try_recv() {
            let follow_up = app.handle_event(event);
            run_commands(follow_up, &mut app, &api, &tx);
        }
        app.tick();

        terminal.draw(|f| ui::render(f, &mut app))?;

        if !event::poll(Duration::from_millis(100))? {
            continue;
        }

        let commands = match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => {
                app.handle_key(key, &config.keybindings)
            }
            Event::Paste(text) => {
                app.handle_paste(&text);
                Vec::new()
            }
            _ => Vec::new(),
        };
        run_commands(commands, &mut app, &api, &tx);

        if app.should_quit {
            break;
        }
    }

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        crossterm::terminal::LeaveAlternateScreen,
        crossterm::event::DisableMouseCapture,
        crossterm::event::DisableBracketedPaste
    )?;
    terminal.show_cursor()?;

    Ok(())
}
