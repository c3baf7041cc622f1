//! UI rendering functions for the TUI.

use ratatui::{
    Frame,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
};

use super::state::App;
use super::types::Screen;

/// Draw the UI.
pub fn draw(frame: &mut Frame, app: &mut App) {
    let size = frame.area();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(3), // Search bar
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(size);

    draw_header(frame, app, chunks[0]);
    draw_search_bar(frame, app, chunks[1]);

    match app.screen {
        Screen::Loading => draw_loading(frame, app, chunks[2]),
        Screen::Search => draw_search_help(frame, chunks[2]),
        Screen::Results => draw_results(frame, app, chunks[2]),
        Screen::Episodes => draw_episodes(frame, app, chunks[2]),
    }

    draw_footer(frame, app, chunks[3]);

    if let Some(error) = &app.error_message {
        draw_error_popup(frame, error);
    }
}

fn draw_header(frame: &mut Frame, app: &App, area: Rect) {
    let mut spans = vec![Span::styled(
        "gowra-stream",
        Style::default()
            .fg(Color::Red)
            .add_modifier(Modifier::BOLD),
    )];

    if let Some(title) = &app.current_title {
        spans.push(Span::raw("  "));
        spans.push(Span::styled(
            title.title.clone(),
            Style::default().fg(Color::Cyan),
        ));
    }

    if let Some((episode, _)) = &app.now_playing {
        spans.push(Span::styled(
            format!("  [playing ep {episode}]"),
            Style::default().fg(Color::Green),
        ));
    }

    let header = Paragraph::new(Line::from(spans)).block(Block::default().borders(Borders::ALL));
    frame.render_widget(header, area);
}

fn draw_search_bar(frame: &mut Frame, app: &App, area: Rect) {
    let border_style = if app.search_focused {
        Style::default().fg(Color::Cyan)
    } else {
        Style::default().fg(Color::DarkGray)
    };

    let search_text = if app.search_input.is_empty() && !app.search_focused {
        "Press '/' to search anime..."
    } else {
        &app.search_input
    };

    let search = Paragraph::new(search_text)
        .style(if app.search_focused {
            Style::default().fg(Color::White)
        } else {
            Style::default().fg(Color::DarkGray)
        })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Search")
                .border_style(border_style),
        );

    frame.render_widget(search, area);

    if app.search_focused {
        frame.set_cursor_position((area.x + app.search_input.len() as u16 + 1, area.y + 1));
    }
}

fn draw_search_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new("Type an anime title and press Enter\n\nPress Esc to cancel")
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL).title("Welcome"))
        .wrap(Wrap { trim: true });
    frame.render_widget(help, area);
}

fn draw_loading(frame: &mut Frame, app: &App, area: Rect) {
    let loading = Paragraph::new(app.loading_message.as_str())
        .style(Style::default().fg(Color::Yellow))
        .block(Block::default().borders(Borders::ALL).title("Loading"));
    frame.render_widget(loading, area);
}

fn draw_results(frame: &mut Frame, app: &mut App, area: Rect) {
    let items: Vec<ListItem> = app
        .results
        .iter()
        .map(|a| ListItem::new(a.to_display()))
        .collect();

    let list = List::new(items)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!("Results ({})", app.results.len())),
        )
        .highlight_style(
            Style::default()
                .bg(Color::DarkGray)
                .add_modifier(Modifier::BOLD),
        )
        .highlight_symbol("> ");

    frame.render_stateful_widget(list, area, &mut app.results_state);
}

fn draw_episodes(frame: &mut Frame, app: &mut App, area: Rect) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(36)])
        .split(area);

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Set/page summary
            Constraint::Min(0),    // Episode list
            Constraint::Length(3), // Now playing
        ])
        .split(columns[0]);

    let Some(window) = app.window.clone() else {
        draw_loading(frame, app, columns[0]);
        return;
    };

    let (set_start, set_end) = window.set_range();
    let (page_start, page_end) = window.page_range();
    let summary = Paragraph::new(Line::from(vec![
        Span::styled(
            format!("Set {} of {}", window.current_set + 1, window.total_sets),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(format!("  Episodes {set_start}-{set_end}")),
        Span::styled(
            format!("  Page {page_start}-{page_end}"),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled(
            format!("  ({} loaded)", window.loaded_count),
            Style::default().fg(Color::DarkGray),
        ),
    ]))
    .block(Block::default().borders(Borders::ALL).title("Episodes"));
    frame.render_widget(summary, rows[0]);

    if window.visible.is_empty() {
        let hint = if window.is_fetching {
            "Loading episodes..."
        } else if window.has_more_to_fetch {
            "Not loaded yet. Press 'm' to load more episodes"
        } else {
            "No episodes on this page"
        };
        let empty = Paragraph::new(hint)
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL));
        frame.render_widget(empty, rows[1]);
    } else {
        let playing = app.now_playing.as_ref().map(|(n, _)| *n);
        let items: Vec<ListItem> = window
            .visible
            .iter()
            .map(|e| {
                let style = if Some(e.number) == playing {
                    Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                ListItem::new(e.to_display()).style(style)
            })
            .collect();

        let title = if window.is_fetching {
            "Loading more..."
        } else if window.needs_load_more {
            "Press 'm' to load more"
        } else {
            ""
        };

        let list = List::new(items)
            .block(Block::default().borders(Borders::ALL).title(title))
            .highlight_style(
                Style::default()
                    .bg(Color::DarkGray)
                    .add_modifier(Modifier::BOLD),
            )
            .highlight_symbol("> ");
        frame.render_stateful_widget(list, rows[1], &mut app.episode_state);
    }

    let playing_text = match &app.now_playing {
        Some((n, url)) => format!("Episode {n} of {}: {url}", window.total_episodes),
        None => "Select an episode to play".to_string(),
    };
    let playing = Paragraph::new(playing_text)
        .style(Style::default().fg(Color::Green))
        .block(Block::default().borders(Borders::ALL).title("Now playing"));
    frame.render_widget(playing, rows[2]);

    draw_recommendations(frame, app, columns[1]);
}

fn draw_recommendations(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .recommendations
        .iter()
        .map(|r| {
            // Truncate by chars to avoid UTF-8 panics
            let title = &r.anime.anime.title;
            let name = if title.chars().count() > 28 {
                format!("{}...", title.chars().take(25).collect::<String>())
            } else {
                title.clone()
            };
            ListItem::new(format!("{name} [{}]", r.score))
        })
        .collect();

    let list = List::new(items).block(
        Block::default()
            .borders(Borders::ALL)
            .title("More like this")
            .border_style(Style::default().fg(Color::DarkGray)),
    );
    frame.render_widget(list, area);
}

fn draw_footer(frame: &mut Frame, app: &App, area: Rect) {
    let keys = match app.screen {
        Screen::Search => "Enter: search | Esc: cancel | Ctrl+C: quit",
        Screen::Results => "j/k: move | Enter: open | /: search | q: quit",
        Screen::Episodes => {
            "Enter: play | h/l: page | [/]: set | m: load more | p/n: prev/next ep | Esc: back | q: quit"
        }
        Screen::Loading => "Please wait... | q: quit",
    };

    let footer = Paragraph::new(keys)
        .style(Style::default().fg(Color::DarkGray))
        .block(Block::default().borders(Borders::ALL));
    frame.render_widget(footer, area);
}

fn draw_error_popup(frame: &mut Frame, error: &str) {
    let area = centered_rect(60, 20, frame.area());
    frame.render_widget(Clear, area);

    let popup = Paragraph::new(error)
        .style(Style::default().fg(Color::Red))
        .wrap(Wrap { trim: true })
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title("Error (press any key)")
                .border_style(Style::default().fg(Color::Red)),
        );
    frame.render_widget(popup, area);
}

/// Rectangle of `percent_x` by `percent_y` centered in `r`.
fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(vertical[1])[1]
}
