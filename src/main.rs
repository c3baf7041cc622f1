//! Main entry point for the gowra-stream terminal client.

use clap::Parser;
use crossterm::{
    event::Event,
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use gowra_stream::config::Config;
use gowra_stream::error::{AppError, Result};
use gowra_stream::player::{next_episode, previous_episode};
use gowra_stream::provider::{AnimeCatalog, JikanClient, MetadataProvider};
use gowra_stream::recommendations::recommend_anime;
use gowra_stream::tui::{self, Action, App, draw, poll_event};
use gowra_stream::types::Anime;
use gowra_stream::window::{EpisodeWindow, WindowEvent};
use log::{debug, info, warn};
use ratatui::prelude::*;
use std::io::{self, stdout};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};

/// Command-line arguments for gowra-stream.
#[derive(Parser, Debug)]
#[command(
    name = "gowra-stream",
    version,
    about = "Browse and watch anime from the terminal",
    long_about = "Search anime through Jikan and page through their episodes in sets of one hundred."
)]
struct Args {
    /// Start with a search for this query
    #[arg(short, long, conflicts_with = "title")]
    search: Option<String>,

    /// Open a title directly by its MyAnimeList id
    #[arg(short, long)]
    title: Option<String>,

    /// Override the Jikan API base URL
    #[arg(long)]
    api_url: Option<String>,

    /// Log verbosity level: 0=error, 1=warn, 2=info, 3=debug, 4=trace
    #[arg(short, long, default_value_t = 1)]
    log: u8,

    /// Write a default config file if none exists, print its path and exit
    #[arg(long)]
    init_config: bool,
}

/// Everything the event loop needs besides the terminal and UI state.
struct Session {
    client: Arc<JikanClient>,
    events_tx: UnboundedSender<WindowEvent>,
    events_rx: UnboundedReceiver<WindowEvent>,
    window: Option<EpisodeWindow>,
}

/// Initialize the terminal for TUI rendering.
fn init_terminal() -> io::Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;
    execute!(stdout(), EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout());
    Terminal::new(backend)
}

/// Restore the terminal to its original state.
fn restore_terminal() -> io::Result<()> {
    disable_raw_mode()?;
    execute!(stdout(), LeaveAlternateScreen)?;
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = match args.log {
        0 => log::LevelFilter::Error,
        1 => log::LevelFilter::Warn,
        2 => log::LevelFilter::Info,
        3 => log::LevelFilter::Debug,
        _ => log::LevelFilter::Trace,
    };

    env_logger::Builder::new()
        .filter_level(log_level)
        .format_timestamp(None)
        .format_target(false)
        .init();

    debug!("Log level set to {:?}", log_level);

    if args.init_config {
        let path = Config::create_default_if_missing()?;
        println!("{}", path.display());
        return Ok(());
    }

    let mut config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config: {}. Using defaults.", e);
        Config::new()
    });

    if let Some(url) = &args.api_url {
        config.jikan_base_url = url.clone();
    }

    if let Some(query) = &args.search {
        if query.trim().is_empty() {
            return Err(AppError::InvalidInput("search query is empty".to_string()));
        }
    }

    info!("Using Jikan API at {}", config.jikan_base_url);

    let client = Arc::new(JikanClient::new(&config)?);
    let (events_tx, events_rx) = mpsc::unbounded_channel();
    let mut session = Session {
        client,
        events_tx,
        events_rx,
        window: None,
    };

    let mut terminal = init_terminal()?;
    let mut app = App::new(config.embed_base_url.clone());

    let result = run_app(&mut terminal, &mut app, &mut session, &args).await;

    if let Some(window) = session.window.take() {
        window.close();
    }

    restore_terminal()?;

    result
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    session: &mut Session,
    args: &Args,
) -> Result<()> {
    if let Some(query) = &args.search {
        app.search_focused = false;
        search(terminal, app, session, query).await?;
    } else if let Some(id) = &args.title {
        app.search_focused = false;
        match session.client.anime_details(id).await {
            Ok(details) => open_title(terminal, app, session, details.anime).await?,
            Err(e) => app.set_error(&e.to_string()),
        }
    } else {
        top(terminal, app, session).await?;
    }

    loop {
        // Window signals from spawned fetches
        while let Ok(event) = session.events_rx.try_recv() {
            app.apply_event(event);
        }

        terminal.draw(|f| draw(f, app))?;

        let Some(Event::Key(key)) = poll_event(Duration::from_millis(100))? else {
            continue;
        };

        let action = app.handle_input(key);
        let window = session.window.clone();

        match action {
            Action::None => {}
            Action::Quit => break,
            Action::Search(query) => {
                leave_title(app, session);
                search(terminal, app, session, &query).await?
            }
            Action::OpenTitle(i) => {
                if let Some(anime) = app.results.get(i).cloned() {
                    open_title(terminal, app, session, anime).await?;
                }
            }
            Action::Back => leave_title(app, session),
            Action::PreviousPage => {
                if let Some(window) = window {
                    window.go_to_previous_page();
                }
            }
            Action::NextPage => {
                if let Some(window) = window {
                    window.go_to_next_page();
                }
            }
            Action::PreviousSet => {
                if let Some(window) = window {
                    tokio::spawn(async move { window.go_to_previous_set().await });
                }
            }
            Action::NextSet => {
                if let Some(window) = window {
                    tokio::spawn(async move { window.go_to_next_set().await });
                }
            }
            Action::LoadMore => {
                if let Some(window) = window {
                    tokio::spawn(async move { window.load_more().await });
                }
            }
            Action::SelectEpisode(number) => {
                if let Some(window) = window {
                    if let Err(e) = window.select_episode(number) {
                        app.set_error(&e.to_string());
                    }
                }
            }
            Action::PreviousEpisode => {
                if let Some(window) = window {
                    step_episode(app, &window, false);
                }
            }
            Action::NextEpisode => {
                if let Some(window) = window {
                    step_episode(app, &window, true);
                }
            }
        }

        if app.should_quit {
            break;
        }
    }

    Ok(())
}

/// Close the open title, if any, and drop signals still queued for it.
fn leave_title(app: &mut App, session: &mut Session) {
    if let Some(window) = session.window.take() {
        window.close();
    }
    while session.events_rx.try_recv().is_ok() {}
    app.close_title();
}

/// Play the episode before or after the current one, if there is one.
fn step_episode(app: &mut App, window: &EpisodeWindow, forward: bool) {
    let state = window.state();
    let current = state.current_episode();
    let target = if forward {
        next_episode(current, state.total_episodes())
    } else {
        previous_episode(current)
    };

    if let Some(number) = target {
        if let Err(e) = window.select_episode(number) {
            app.set_error(&e.to_string());
        }
    }
}

async fn search(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    session: &mut Session,
    query: &str,
) -> Result<()> {
    app.set_loading(&format!("Searching for '{}'...", query));
    terminal.draw(|f| draw(f, app))?;

    match session.client.search_anime(query).await {
        Ok(results) if results.is_empty() => {
            app.set_error("No results found");
            app.screen = tui::Screen::Search;
        }
        Ok(results) => app.set_results(results),
        Err(e) => {
            app.set_error(&e.to_string());
            app.screen = tui::Screen::Search;
        }
    }

    Ok(())
}

async fn top(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    session: &mut Session,
) -> Result<()> {
    app.set_loading("Loading top anime...");
    terminal.draw(|f| draw(f, app))?;

    match session.client.top_anime().await {
        Ok(results) if !results.is_empty() => app.set_results(results),
        Ok(_) => app.screen = tui::Screen::Search,
        Err(e) => {
            warn!("Failed to load top anime: {}", e);
            app.screen = tui::Screen::Search;
        }
    }

    Ok(())
}

async fn open_title(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    session: &mut Session,
    anime: Anime,
) -> Result<()> {
    leave_title(app, session);

    app.set_loading(&format!("Loading episodes for {}...", anime.title));
    terminal.draw(|f| draw(f, app))?;

    let provider: Arc<dyn MetadataProvider> = session.client.clone();
    match EpisodeWindow::open(provider, &anime.id, session.events_tx.clone()).await {
        Ok(window) => {
            app.open_title(anime.clone());
            session.window = Some(window);
        }
        Err(e) => {
            app.close_title();
            app.set_error(&e.to_string());
            return Ok(());
        }
    }

    match session.client.anime_details(&anime.id).await {
        Ok(details) => {
            app.recommendations = recommend_anime(session.client.as_ref(), &details).await;
            debug!(
                "{} recommendations for {}",
                app.recommendations.len(),
                anime.title
            );
        }
        Err(e) => warn!("No recommendations for {}: {}", anime.title, e),
    }

    Ok(())
}
