//! Episode windowing for long-running titles.
//!
//! Episodes are shown ten at a time (a *page*) inside bands of one hundred
//! (a *set*), while the provider delivers them in its own pages of one
//! hundred. [`WindowState`] holds the arithmetic and is fully synchronous;
//! [`EpisodeWindow`] wraps it with a provider, the single-fetch guard and the
//! signals consumed by the rendering layer.

use crate::error::{ProviderError, WindowError};
use crate::provider::MetadataProvider;
use crate::types::{Episode, EpisodePage};
use log::{debug, info, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::mpsc::UnboundedSender;

/// Episodes per set.
pub const SET_SIZE: u32 = 100;

/// Episodes per page within a set.
pub const PAGE_SIZE: u32 = 10;

/// Total substituted when the provider reports 0 episodes (unknown or still
/// airing). Callers rely on this exact upper bound.
///
/// TODO: replace with an explicit unknown-total state once callers stop
/// depending on the 1500 bound.
pub const SENTINEL_TOTAL_EPISODES: u32 = 1500;

/// Map a provider-reported total to the one the window works with.
pub fn resolve_total(reported: u32) -> u32 {
    if reported == 0 {
        SENTINEL_TOTAL_EPISODES
    } else {
        reported
    }
}

/// Zero-based set containing `episode`.
pub fn set_of(episode: u32) -> u32 {
    episode.saturating_sub(1) / SET_SIZE
}

/// Zero-based page within its set containing `episode`.
pub fn page_of(episode: u32) -> u32 {
    (episode.saturating_sub(1) % SET_SIZE) / PAGE_SIZE
}

/// First episode number of `page` within `set`.
fn first_episode_of(set: u32, page: u32) -> u32 {
    set.saturating_mul(SET_SIZE)
        .saturating_add(page * PAGE_SIZE)
        .saturating_add(1)
}

/// Handed out by [`WindowState::begin_fetch`]; identifies which provider
/// page is in flight and for which session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchTicket {
    /// 1-indexed provider page being requested.
    pub page: u32,
    generation: u64,
}

/// Position and loaded data of one title-viewing session.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowState {
    current_episode: u32,
    current_set: u32,
    current_page: u32,
    total_episodes: u32,
    loaded: Vec<Episode>,
    has_more_to_fetch: bool,
    is_fetching: bool,
    next_provider_page: u32,
    generation: u64,
    closed: bool,
}

impl WindowState {
    /// Fresh state positioned on episode 1 with nothing loaded yet.
    pub fn new(reported_total: u32) -> Self {
        Self {
            current_episode: 1,
            current_set: 0,
            current_page: 0,
            total_episodes: resolve_total(reported_total),
            loaded: Vec::new(),
            has_more_to_fetch: true,
            is_fetching: false,
            next_provider_page: 1,
            generation: 0,
            closed: false,
        }
    }

    /// State seeded from the provider's first page.
    ///
    /// The total is taken from this page only; later pages never adjust it.
    pub fn from_first_page(page: EpisodePage) -> Self {
        let mut state = Self::new(page.total_episodes);
        state.merge(page.episodes);
        state.has_more_to_fetch = page.has_next_page;
        state.next_provider_page = 2;
        state
    }

    pub fn current_episode(&self) -> u32 {
        self.current_episode
    }

    pub fn current_set(&self) -> u32 {
        self.current_set
    }

    pub fn current_page(&self) -> u32 {
        self.current_page
    }

    pub fn total_episodes(&self) -> u32 {
        self.total_episodes
    }

    /// All loaded episodes, sorted by number.
    pub fn loaded_episodes(&self) -> &[Episode] {
        &self.loaded
    }

    pub fn has_more_to_fetch(&self) -> bool {
        self.has_more_to_fetch
    }

    pub fn is_fetching(&self) -> bool {
        self.is_fetching
    }

    /// Next provider page a fetch would request.
    pub fn next_provider_page(&self) -> u32 {
        self.next_provider_page
    }

    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// `ceil(total / SET_SIZE)`.
    pub fn total_sets(&self) -> u32 {
        self.total_episodes.div_ceil(SET_SIZE)
    }

    fn set_current(&mut self, episode: u32) {
        self.current_episode = episode;
        self.current_set = set_of(episode);
        self.current_page = page_of(episode);
    }

    fn loaded_in_set(&self, set: u32) -> u32 {
        self.loaded.iter().filter(|e| set_of(e.number) == set).count() as u32
    }

    /// Insert episodes keeping the list sorted and unique by number.
    /// Already-loaded numbers keep their first version.
    fn merge(&mut self, episodes: Vec<Episode>) {
        for episode in episodes {
            if episode.number == 0 {
                continue;
            }
            if let Err(pos) = self
                .loaded
                .binary_search_by_key(&episode.number, |e| e.number)
            {
                self.loaded.insert(pos, episode);
            }
        }
    }

    /// Move playback to `number`.
    ///
    /// Out-of-range numbers are rejected and leave the state untouched.
    pub fn select_episode(&mut self, number: u32) -> Result<(), WindowError> {
        if number < 1 || number > self.total_episodes {
            return Err(WindowError::EpisodeOutOfRange {
                number,
                total: self.total_episodes,
            });
        }
        self.set_current(number);
        Ok(())
    }

    /// Step back one set. Returns whether the position changed.
    pub fn go_to_previous_set(&mut self) -> bool {
        if self.current_set == 0 {
            return false;
        }
        self.set_current(first_episode_of(self.current_set - 1, 0));
        true
    }

    /// Step forward one set. Returns whether the position changed.
    pub fn go_to_next_set(&mut self) -> bool {
        if self.current_set.saturating_add(1) >= self.total_sets() {
            return false;
        }
        self.set_current(first_episode_of(self.current_set + 1, 0));
        true
    }

    /// Step back one page within the set. Returns whether the position changed.
    pub fn go_to_previous_page(&mut self) -> bool {
        if self.current_page == 0 {
            return false;
        }
        self.set_current(first_episode_of(self.current_set, self.current_page - 1));
        true
    }

    /// Step forward one page within the set.
    ///
    /// The last page is derived from how many episodes of the current set
    /// are loaded, so a partly loaded set can't be paged past its data.
    pub fn go_to_next_page(&mut self) -> bool {
        let loaded = self.loaded_in_set(self.current_set);
        if loaded == 0 {
            return false;
        }
        let max_page = loaded.div_ceil(PAGE_SIZE) - 1;
        if self.current_page >= max_page {
            return false;
        }
        let first = first_episode_of(self.current_set, self.current_page + 1);
        if first > self.total_episodes {
            return false;
        }
        self.set_current(first);
        true
    }

    /// Inclusive episode range of the current page, clipped to the total.
    pub fn visible_range(&self) -> (u32, u32) {
        let start = first_episode_of(self.current_set, self.current_page);
        let end = start.saturating_add(PAGE_SIZE - 1).min(self.total_episodes);
        (start, end)
    }

    /// Loaded episodes whose number falls on the current page.
    pub fn visible_episodes(&self) -> Vec<&Episode> {
        let (start, end) = self.visible_range();
        self.loaded
            .iter()
            .filter(|e| e.number >= start && e.number <= end)
            .collect()
    }

    /// Whether a "load more" affordance applies: the current set is the
    /// highest one with any loaded episode and the provider has more pages.
    pub fn needs_load_more(&self) -> bool {
        if !self.has_more_to_fetch {
            return false;
        }
        match self.loaded.last() {
            Some(last) => self.current_set == set_of(last.number),
            None => self.current_set == 0,
        }
    }

    /// Claim the single fetch slot. `None` when a fetch is already running,
    /// the provider is exhausted, or the session is closed.
    pub fn begin_fetch(&mut self) -> Option<FetchTicket> {
        if self.closed || self.is_fetching || !self.has_more_to_fetch {
            return None;
        }
        self.is_fetching = true;
        Some(FetchTicket {
            page: self.next_provider_page,
            generation: self.generation,
        })
    }

    fn owns(&self, ticket: &FetchTicket) -> bool {
        !self.closed && ticket.generation == self.generation
    }

    /// Apply a fetched page. Returns false, changing nothing, if the ticket
    /// belongs to a closed session.
    pub fn complete_fetch(&mut self, ticket: FetchTicket, page: EpisodePage) -> bool {
        if !self.owns(&ticket) {
            return false;
        }
        self.merge(page.episodes);
        self.has_more_to_fetch = page.has_next_page;
        self.next_provider_page = ticket.page + 1;
        self.is_fetching = false;
        true
    }

    /// Release the fetch slot after a failure. Returns false for stale tickets.
    pub fn abort_fetch(&mut self, ticket: FetchTicket) -> bool {
        if !self.owns(&ticket) {
            return false;
        }
        self.is_fetching = false;
        true
    }

    /// Discard the session; in-flight fetches will be ignored on completion.
    pub fn close(&mut self) {
        self.closed = true;
        self.generation += 1;
        self.is_fetching = false;
    }

    /// Owned copy of everything the rendering layer draws.
    pub fn snapshot(&self) -> WindowSnapshot {
        WindowSnapshot {
            visible: self.visible_episodes().into_iter().cloned().collect(),
            current_episode: self.current_episode,
            current_set: self.current_set,
            current_page: self.current_page,
            total_sets: self.total_sets(),
            total_episodes: self.total_episodes,
            loaded_count: self.loaded.len(),
            has_more_to_fetch: self.has_more_to_fetch,
            is_fetching: self.is_fetching,
            needs_load_more: self.needs_load_more(),
        }
    }
}

/// Render-ready view of a [`WindowState`].
#[derive(Debug, Clone, PartialEq)]
pub struct WindowSnapshot {
    pub visible: Vec<Episode>,
    pub current_episode: u32,
    pub current_set: u32,
    pub current_page: u32,
    pub total_sets: u32,
    pub total_episodes: u32,
    pub loaded_count: usize,
    pub has_more_to_fetch: bool,
    pub is_fetching: bool,
    pub needs_load_more: bool,
}

impl WindowSnapshot {
    /// Inclusive episode range covered by the current set, clipped to the total.
    pub fn set_range(&self) -> (u32, u32) {
        let start = first_episode_of(self.current_set, 0);
        let end = start.saturating_add(SET_SIZE - 1).min(self.total_episodes);
        (start, end)
    }

    /// Inclusive episode range covered by the current page, clipped to the total.
    pub fn page_range(&self) -> (u32, u32) {
        let start = first_episode_of(self.current_set, self.current_page);
        let end = start.saturating_add(PAGE_SIZE - 1).min(self.total_episodes);
        (start, end)
    }
}

/// Signals emitted to the rendering layer.
#[derive(Debug, Clone, PartialEq)]
pub enum WindowEvent {
    /// An episode was chosen for playback.
    EpisodeSelected(u32),
    /// Position or loaded episodes changed.
    EpisodesUpdated(WindowSnapshot),
    /// A provider fetch failed; the window kept its previous state.
    FetchError(String),
}

/// One title-viewing session: a [`WindowState`] bound to its provider.
///
/// Cloning yields another handle to the same session, so a fetch can be
/// spawned while the caller keeps navigating.
#[derive(Clone)]
pub struct EpisodeWindow {
    title_id: Arc<str>,
    provider: Arc<dyn MetadataProvider>,
    state: Arc<Mutex<WindowState>>,
    events: UnboundedSender<WindowEvent>,
}

impl EpisodeWindow {
    /// Open a title: fetch provider page 1 and position on episode 1.
    pub async fn open(
        provider: Arc<dyn MetadataProvider>,
        title_id: &str,
        events: UnboundedSender<WindowEvent>,
    ) -> Result<Self, ProviderError> {
        info!("Opening episode window for {}", title_id);
        let first = provider.fetch_episode_page(title_id, 1).await?;
        let state = WindowState::from_first_page(first);
        let window = Self::with_state(provider, title_id, state, events);
        window.emit_update(&window.lock());
        Ok(window)
    }

    /// Wrap an existing state, e.g. one built with [`WindowState::new`].
    pub fn with_state(
        provider: Arc<dyn MetadataProvider>,
        title_id: &str,
        state: WindowState,
        events: UnboundedSender<WindowEvent>,
    ) -> Self {
        Self {
            title_id: Arc::from(title_id),
            provider,
            state: Arc::new(Mutex::new(state)),
            events,
        }
    }

    pub fn title_id(&self) -> &str {
        &self.title_id
    }

    fn lock(&self) -> MutexGuard<'_, WindowState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Send a signal unless the session has been closed.
    ///
    /// Callers pass the locked state and keep holding the lock, so signals
    /// reach the listener in the order the state changed and none follow
    /// `close`.
    fn emit(&self, state: &WindowState, event: WindowEvent) {
        if state.is_closed() {
            return;
        }
        if self.events.send(event).is_err() {
            debug!("No listener for window events of {}", self.title_id);
        }
    }

    fn emit_update(&self, state: &WindowState) {
        self.emit(state, WindowEvent::EpisodesUpdated(state.snapshot()));
    }

    /// Copy of the current state.
    pub fn state(&self) -> WindowState {
        self.lock().clone()
    }

    pub fn snapshot(&self) -> WindowSnapshot {
        self.lock().snapshot()
    }

    pub fn visible_episodes(&self) -> Vec<Episode> {
        self.lock().visible_episodes().into_iter().cloned().collect()
    }

    pub fn needs_load_more(&self) -> bool {
        self.lock().needs_load_more()
    }

    /// Select an episode for playback; never fetches.
    pub fn select_episode(&self, number: u32) -> Result<(), WindowError> {
        let mut state = self.lock();
        state.select_episode(number)?;
        debug!("Selected episode {} of {}", number, self.title_id);
        self.emit(&state, WindowEvent::EpisodeSelected(number));
        self.emit_update(&state);
        Ok(())
    }

    /// Step back one set; fetches the next provider page if more exist.
    pub async fn go_to_previous_set(&self) {
        self.change_set(WindowState::go_to_previous_set).await;
    }

    /// Step forward one set; fetches the next provider page if more exist.
    pub async fn go_to_next_set(&self) {
        self.change_set(WindowState::go_to_next_set).await;
    }

    async fn change_set(&self, step: fn(&mut WindowState) -> bool) {
        let fetch = {
            let mut state = self.lock();
            if !step(&mut *state) {
                return;
            }
            self.emit_update(&state);
            state.has_more_to_fetch()
        };
        // The provider is paged independently of sets, so this is always
        // "the next provider page", not the page covering the new set.
        if fetch {
            self.load_more().await;
        }
    }

    fn change_page(&self, step: fn(&mut WindowState) -> bool) {
        let mut state = self.lock();
        if step(&mut *state) {
            self.emit_update(&state);
        }
    }

    pub fn go_to_previous_page(&self) {
        self.change_page(WindowState::go_to_previous_page);
    }

    pub fn go_to_next_page(&self) {
        self.change_page(WindowState::go_to_next_page);
    }

    /// Fetch the next provider page.
    ///
    /// Returns immediately when a fetch is already in flight or the provider
    /// has no more pages. Failures are reported as [`WindowEvent::FetchError`]
    /// and never retried.
    pub async fn load_more(&self) {
        let ticket = self.lock().begin_fetch();
        let Some(ticket) = ticket else {
            debug!("load_more skipped for {}", self.title_id);
            return;
        };

        debug!("Loading provider page {} for {}", ticket.page, self.title_id);
        let result = self
            .provider
            .fetch_episode_page(&self.title_id, ticket.page)
            .await;

        match result {
            Ok(page) => {
                let count = page.episodes.len();
                let mut state = self.lock();
                if state.complete_fetch(ticket, page) {
                    debug!(
                        "Loaded {} episodes from page {} for {}",
                        count, ticket.page, self.title_id
                    );
                    self.emit_update(&state);
                } else {
                    debug!("Dropping page {} for closed session {}", ticket.page, self.title_id);
                }
            }
            Err(e) => {
                let mut state = self.lock();
                if state.abort_fetch(ticket) {
                    warn!("Failed to load episodes for {}: {}", self.title_id, e);
                    self.emit(&state, WindowEvent::FetchError(e.to_string()));
                    self.emit_update(&state);
                }
            }
        }
    }

    /// End the session. Results of fetches still in flight are discarded.
    pub fn close(&self) {
        self.lock().close();
        info!("Closed episode window for {}", self.title_id);
    }
}
