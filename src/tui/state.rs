//! Application state management and input handling.

use crate::player::embed_url;
use crate::recommendations::Recommendation;
use crate::types::Anime;
use crate::window::{WindowEvent, WindowSnapshot};
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use ratatui::widgets::ListState;

use super::types::{Action, Screen};

/// Application state for the TUI.
pub struct App {
    /// Current screen being displayed
    pub screen: Screen,
    /// Whether the app should quit
    pub should_quit: bool,
    /// Current search query being typed
    pub search_input: String,
    /// Whether search bar is focused
    pub search_focused: bool,
    /// Search results
    pub results: Vec<Anime>,
    /// List state for search results
    pub results_state: ListState,
    /// Title whose episodes are being browsed
    pub current_title: Option<Anime>,
    /// Latest episode window snapshot
    pub window: Option<WindowSnapshot>,
    /// Cursor within the visible episodes
    pub episode_state: ListState,
    /// Episode number and embed URL of what is playing
    pub now_playing: Option<(u32, String)>,
    /// Suggestions shown beside the episode list
    pub recommendations: Vec<Recommendation>,
    /// Loading message
    pub loading_message: String,
    /// Error message to display
    pub error_message: Option<String>,
    /// Base URL for embed links
    pub embed_base_url: String,
}

impl App {
    /// Create a new App on the search screen.
    pub fn new(embed_base_url: String) -> Self {
        Self {
            screen: Screen::Search,
            should_quit: false,
            search_input: String::new(),
            search_focused: true,
            results: Vec::new(),
            results_state: ListState::default(),
            current_title: None,
            window: None,
            episode_state: ListState::default(),
            now_playing: None,
            recommendations: Vec::new(),
            loading_message: String::new(),
            error_message: None,
            embed_base_url,
        }
    }

    /// Set the app to loading state with a message.
    pub fn set_loading(&mut self, message: &str) {
        self.screen = Screen::Loading;
        self.loading_message = message.to_string();
    }

    /// Set search results and switch to the results screen.
    pub fn set_results(&mut self, results: Vec<Anime>) {
        self.results = results;
        self.results_state.select(Some(0));
        self.screen = Screen::Results;
    }

    /// Enter the episode screen for `title`.
    pub fn open_title(&mut self, title: Anime) {
        self.current_title = Some(title);
        self.window = None;
        self.now_playing = None;
        self.recommendations.clear();
        self.episode_state.select(Some(0));
        self.screen = Screen::Episodes;
    }

    /// Leave the episode screen.
    pub fn close_title(&mut self) {
        self.current_title = None;
        self.window = None;
        self.now_playing = None;
        self.recommendations.clear();
        self.screen = if self.results.is_empty() {
            Screen::Search
        } else {
            Screen::Results
        };
    }

    /// Set an error message.
    pub fn set_error(&mut self, message: &str) {
        self.error_message = Some(message.to_string());
    }

    /// Clear error message.
    pub fn clear_error(&mut self) {
        self.error_message = None;
    }

    /// Apply a signal from the episode window.
    pub fn apply_event(&mut self, event: WindowEvent) {
        match event {
            WindowEvent::EpisodesUpdated(snapshot) => {
                let len = snapshot.visible.len();
                let selected = self.episode_state.selected().unwrap_or(0);
                self.episode_state
                    .select(if len == 0 { None } else { Some(selected.min(len - 1)) });
                self.window = Some(snapshot);
            }
            WindowEvent::EpisodeSelected(number) => {
                let title = self
                    .current_title
                    .as_ref()
                    .map(|t| t.title.as_str())
                    .unwrap_or_default();
                let url = embed_url(&self.embed_base_url, title, number);
                self.now_playing = Some((number, url));
            }
            WindowEvent::FetchError(message) => {
                self.set_error(&format!("Could not load episodes: {message}"));
            }
        }
    }

    /// Handle keyboard input and return an action.
    pub fn handle_input(&mut self, key: KeyEvent) -> Action {
        // Global quit with Ctrl+C
        if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
            self.should_quit = true;
            return Action::Quit;
        }

        // Any key dismisses the error popup
        if self.error_message.is_some() {
            self.clear_error();
            return Action::None;
        }

        if self.search_focused {
            return self.handle_search_bar_input(key);
        }

        if key.code == KeyCode::Char('/') && self.screen != Screen::Loading {
            self.search_focused = true;
            return Action::None;
        }

        match self.screen {
            Screen::Search => self.handle_quit_only(key),
            Screen::Results => self.handle_results_input(key),
            Screen::Episodes => self.handle_episodes_input(key),
            Screen::Loading => self.handle_quit_only(key),
        }
    }

    fn handle_quit_only(&mut self, key: KeyEvent) -> Action {
        if key.code == KeyCode::Char('q') {
            self.should_quit = true;
            return Action::Quit;
        }
        Action::None
    }

    fn handle_search_bar_input(&mut self, key: KeyEvent) -> Action {
        match key.code {
            KeyCode::Enter => {
                self.search_focused = false;
                if self.search_input.trim().is_empty() {
                    Action::None
                } else {
                    let query = self.search_input.trim().to_string();
                    self.search_input.clear();
                    Action::Search(query)
                }
            }
            KeyCode::Char(c) => {
                self.search_input.push(c);
                Action::None
            }
            KeyCode::Backspace => {
                self.search_input.pop();
                Action::None
            }
            KeyCode::Esc => {
                self.search_input.clear();
                self.search_focused = false;
                Action::None
            }
            _ => Action::None,
        }
    }

    fn handle_results_input(&mut self, key: KeyEvent) -> Action {
        let len = self.results.len();
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                move_cursor(&mut self.results_state, len, -1);
                Action::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                move_cursor(&mut self.results_state, len, 1);
                Action::None
            }
            KeyCode::Enter => match self.results_state.selected() {
                Some(i) if i < len => Action::OpenTitle(i),
                _ => Action::None,
            },
            KeyCode::Char('q') => {
                self.should_quit = true;
                Action::Quit
            }
            _ => Action::None,
        }
    }

    fn handle_episodes_input(&mut self, key: KeyEvent) -> Action {
        let visible = self.window.as_ref().map(|w| w.visible.len()).unwrap_or(0);
        match key.code {
            KeyCode::Up | KeyCode::Char('k') => {
                move_cursor(&mut self.episode_state, visible, -1);
                Action::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                move_cursor(&mut self.episode_state, visible, 1);
                Action::None
            }
            KeyCode::Enter => self
                .selected_episode()
                .map(Action::SelectEpisode)
                .unwrap_or(Action::None),
            KeyCode::Left | KeyCode::Char('h') => Action::PreviousPage,
            KeyCode::Right | KeyCode::Char('l') => Action::NextPage,
            KeyCode::Char('[') => Action::PreviousSet,
            KeyCode::Char(']') => Action::NextSet,
            KeyCode::Char('m') => Action::LoadMore,
            KeyCode::Char('p') => Action::PreviousEpisode,
            KeyCode::Char('n') => Action::NextEpisode,
            KeyCode::Esc | KeyCode::Backspace => Action::Back,
            KeyCode::Char('q') => {
                self.should_quit = true;
                Action::Quit
            }
            _ => Action::None,
        }
    }

    /// Episode number under the cursor.
    pub fn selected_episode(&self) -> Option<u32> {
        let window = self.window.as_ref()?;
        let i = self.episode_state.selected()?;
        window.visible.get(i).map(|e| e.number)
    }
}

/// Move a list cursor by `delta`, wrapping around.
fn move_cursor(state: &mut ListState, len: usize, delta: isize) {
    if len == 0 {
        return;
    }
    let current = state.selected().unwrap_or(0) as isize;
    let next = (current + delta).rem_euclid(len as isize) as usize;
    state.select(Some(next));
}
