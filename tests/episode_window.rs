//! Integration tests for the episode window against an in-memory provider.

use gowra_stream::error::{ProviderError, WindowError};
use gowra_stream::provider::MetadataProvider;
use gowra_stream::types::{Episode, EpisodePage};
use gowra_stream::window::{EpisodeWindow, WindowEvent, WindowSnapshot, WindowState};
use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};
use tokio::sync::Notify;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;

/// Lets a test hold a fetch in flight until it chooses to release it.
#[derive(Default)]
struct Gate {
    started: Notify,
    release: Notify,
}

/// Serves fixed pages, counting every request.
struct FakeProvider {
    pages: Vec<EpisodePage>,
    failing_pages: Vec<u32>,
    gate: Option<Arc<Gate>>,
    calls: AtomicU32,
}

impl FakeProvider {
    fn new(pages: Vec<EpisodePage>) -> Self {
        Self {
            pages,
            failing_pages: Vec::new(),
            gate: None,
            calls: AtomicU32::new(0),
        }
    }

    fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl MetadataProvider for FakeProvider {
    async fn fetch_episode_page(
        &self,
        _title_id: &str,
        page: u32,
    ) -> Result<EpisodePage, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        match &self.gate {
            Some(gate) => {
                gate.started.notify_one();
                gate.release.notified().await;
            }
            None => tokio::task::yield_now().await,
        }

        if self.failing_pages.contains(&page) {
            return Err(ProviderError::Network("connection reset".to_string()));
        }

        self.pages
            .get(page as usize - 1)
            .cloned()
            .ok_or_else(|| ProviderError::NotFound(format!("page {page}")))
    }
}

/// Provider page holding episodes `first..=last`.
fn page(first: u32, last: u32, has_next_page: bool, total_episodes: u32) -> EpisodePage {
    EpisodePage {
        episodes: (first..=last)
            .map(|n| Episode::new(n, format!("Episode {n}")))
            .collect(),
        has_next_page,
        total_episodes,
    }
}

/// Three full provider pages, then the provider reports no more.
fn three_pages_unknown_total() -> Vec<EpisodePage> {
    vec![
        page(1, 100, true, 0),
        page(101, 200, true, 0),
        page(201, 300, false, 0),
    ]
}

fn drain(rx: &mut UnboundedReceiver<WindowEvent>) -> Vec<WindowEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

fn visible_numbers(window: &EpisodeWindow) -> Vec<u32> {
    window.visible_episodes().iter().map(|e| e.number).collect()
}

async fn open(
    provider: &Arc<FakeProvider>,
) -> (EpisodeWindow, UnboundedReceiver<WindowEvent>) {
    let (tx, rx) = mpsc::unbounded_channel();
    let dyn_provider: Arc<dyn MetadataProvider> = provider.clone();
    let window = EpisodeWindow::open(dyn_provider, "21", tx)
        .await
        .expect("open should succeed");
    (window, rx)
}

#[tokio::test]
async fn test_open_with_unknown_total_uses_sentinel() {
    let provider = Arc::new(FakeProvider::new(three_pages_unknown_total()));
    let (window, mut rx) = open(&provider).await;

    let state = window.state();
    assert_eq!(state.total_episodes(), 1500);
    assert_eq!(state.total_sets(), 15);
    assert_eq!(state.current_episode(), 1);
    assert_eq!(provider.calls(), 1);

    match drain(&mut rx).as_slice() {
        [WindowEvent::EpisodesUpdated(snapshot)] => {
            assert_eq!(snapshot.visible.len(), 10);
            assert_eq!(snapshot.total_sets, 15);
        }
        other => panic!("unexpected events: {other:?}"),
    }
}

#[tokio::test]
async fn test_open_reports_provider_failure() {
    let mut fake = FakeProvider::new(three_pages_unknown_total());
    fake.failing_pages = vec![1];
    let provider: Arc<dyn MetadataProvider> = Arc::new(fake);
    let (tx, _rx) = mpsc::unbounded_channel();

    let result = EpisodeWindow::open(provider, "21", tx).await;
    assert!(matches!(result, Err(ProviderError::Network(_))));
}

#[tokio::test]
async fn test_concurrent_load_more_issues_one_request() {
    let provider = Arc::new(FakeProvider::new(three_pages_unknown_total()));
    let (window, _rx) = open(&provider).await;
    assert_eq!(provider.calls(), 1);

    tokio::join!(window.load_more(), window.load_more());

    assert_eq!(provider.calls(), 2);
    let state = window.state();
    assert_eq!(state.loaded_episodes().len(), 200);
    assert_eq!(state.next_provider_page(), 3);
    assert!(!state.is_fetching());
}

#[tokio::test]
async fn test_episode_101_visible_once_set_loaded() {
    let provider = Arc::new(FakeProvider::new(three_pages_unknown_total()));
    let (window, _rx) = open(&provider).await;

    window.select_episode(101).unwrap();
    let state = window.state();
    assert_eq!(state.current_set(), 1);
    assert_eq!(state.current_page(), 0);
    assert!(visible_numbers(&window).is_empty());

    window.load_more().await;
    assert_eq!(visible_numbers(&window), (101..=110).collect::<Vec<_>>());
}

#[tokio::test]
async fn test_exhausted_provider_stops_fetching_despite_sentinel() {
    let provider = Arc::new(FakeProvider::new(three_pages_unknown_total()));
    let (window, _rx) = open(&provider).await;

    // Each set change pulls the next provider page while more exist
    window.go_to_next_set().await;
    window.go_to_next_set().await;
    assert_eq!(provider.calls(), 3);
    assert!(!window.state().has_more_to_fetch());

    window.go_to_next_set().await;
    let state = window.state();
    assert_eq!(state.current_set(), 3);
    assert_eq!(state.current_episode(), 301);
    assert_eq!(state.total_episodes(), 1500);

    window.load_more().await;
    assert_eq!(provider.calls(), 3);
    assert!(!window.needs_load_more());
    assert!(window.visible_episodes().is_empty());
}

#[tokio::test]
async fn test_set_bounds_are_noops() {
    let provider = Arc::new(FakeProvider::new(vec![page(1, 24, false, 24)]));
    let (window, mut rx) = open(&provider).await;
    drain(&mut rx);

    let before = window.state();
    window.go_to_previous_set().await;
    assert_eq!(window.state(), before);
    window.go_to_next_set().await;
    assert_eq!(window.state(), before);

    assert!(drain(&mut rx).is_empty());
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_page_navigation_never_fetches() {
    let provider = Arc::new(FakeProvider::new(three_pages_unknown_total()));
    let (window, _rx) = open(&provider).await;

    for _ in 0..20 {
        window.go_to_next_page();
    }
    assert_eq!(window.state().current_page(), 9);
    assert_eq!(window.state().current_episode(), 91);
    assert_eq!(visible_numbers(&window), (91..=100).collect::<Vec<_>>());

    window.go_to_previous_page();
    assert_eq!(window.state().current_episode(), 81);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_select_episode_signals_playback() {
    let provider = Arc::new(FakeProvider::new(vec![page(1, 12, false, 12)]));
    let (window, mut rx) = open(&provider).await;
    drain(&mut rx);

    window.select_episode(7).unwrap();
    let once = window.state();
    window.select_episode(7).unwrap();
    assert_eq!(window.state(), once);

    let events = drain(&mut rx);
    assert_eq!(events[0], WindowEvent::EpisodeSelected(7));
    assert!(matches!(events[1], WindowEvent::EpisodesUpdated(_)));
    assert_eq!(events.len(), 4);
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_select_episode_out_of_range_is_rejected() {
    let provider = Arc::new(FakeProvider::new(vec![page(1, 12, false, 12)]));
    let (window, mut rx) = open(&provider).await;
    drain(&mut rx);

    let before = window.state();
    assert_eq!(
        window.select_episode(13),
        Err(WindowError::EpisodeOutOfRange {
            number: 13,
            total: 12
        })
    );
    assert_eq!(window.state(), before);
    assert!(drain(&mut rx).is_empty());
}

#[tokio::test]
async fn test_failed_load_more_keeps_state_and_reports() {
    let mut fake = FakeProvider::new(three_pages_unknown_total());
    fake.failing_pages = vec![2];
    let provider = Arc::new(fake);
    let (window, mut rx) = open(&provider).await;
    drain(&mut rx);

    let before = window.state();
    window.load_more().await;

    assert_eq!(window.state(), before);
    assert_eq!(provider.calls(), 2);

    let events = drain(&mut rx);
    assert!(
        events
            .iter()
            .any(|e| matches!(e, WindowEvent::FetchError(msg) if msg.contains("connection reset")))
    );

    // No automatic retry; the next explicit call asks again
    window.load_more().await;
    assert_eq!(provider.calls(), 3);
}

#[tokio::test]
async fn test_closed_window_ignores_late_result() {
    let gate = Arc::new(Gate::default());
    let mut fake = FakeProvider::new(three_pages_unknown_total());
    fake.gate = Some(gate.clone());
    let provider: Arc<FakeProvider> = Arc::new(fake);
    let dyn_provider: Arc<dyn MetadataProvider> = provider.clone();

    let (tx, mut rx) = mpsc::unbounded_channel();
    let state = WindowState::from_first_page(page(1, 100, true, 0));
    let window = EpisodeWindow::with_state(dyn_provider, "21", state, tx);

    let handle = tokio::spawn({
        let window = window.clone();
        async move { window.load_more().await }
    });

    gate.started.notified().await;
    window.close();
    gate.release.notify_one();
    handle.await.unwrap();

    let state = window.state();
    assert!(state.is_closed());
    assert!(!state.is_fetching());
    assert_eq!(state.loaded_episodes().len(), 100);
    assert_eq!(provider.calls(), 1);
    assert!(drain(&mut rx).is_empty());

    // A closed session never fetches again
    window.load_more().await;
    assert_eq!(provider.calls(), 1);
}

#[tokio::test]
async fn test_short_and_sparse_provider_pages() {
    let pages = vec![
        EpisodePage {
            episodes: vec![Episode::new(1, "a"), Episode::new(3, "c"), Episode::new(4, "d")],
            has_next_page: true,
            total_episodes: 30,
        },
        EpisodePage {
            episodes: vec![Episode::new(3, "dup"), Episode::new(12, "l")],
            has_next_page: false,
            total_episodes: 0,
        },
    ];
    let provider = Arc::new(FakeProvider::new(pages));
    let (window, _rx) = open(&provider).await;

    window.load_more().await;
    let state = window.state();
    let numbers: Vec<u32> = state.loaded_episodes().iter().map(|e| e.number).collect();
    assert_eq!(numbers, vec![1, 3, 4, 12]);
    assert_eq!(state.loaded_episodes()[1].title, "c");
    // Later pages never change the total
    assert_eq!(state.total_episodes(), 30);
    assert_eq!(visible_numbers(&window), vec![1, 3, 4]);

    // Four loaded episodes in the set make a single page
    window.go_to_next_page();
    assert_eq!(window.state().current_page(), 0);

    window.select_episode(12).unwrap();
    assert_eq!(visible_numbers(&window), vec![12]);
}

/// Navigation and fetches from several tasks at once, as the binary does.
fn spawn_navigators(window: &EpisodeWindow, tasks: u32, steps: u32) -> Vec<JoinHandle<()>> {
    (0..tasks)
        .map(|i| {
            let window = window.clone();
            tokio::spawn(async move {
                for step in 0..steps {
                    match (i + step) % 4 {
                        0 => window.go_to_next_page(),
                        1 => window.go_to_previous_page(),
                        2 => window.load_more().await,
                        _ => {
                            let _ = window.select_episode(1 + (i * 37 + step * 13) % 300);
                        }
                    }
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect()
}

fn updates(events: Vec<WindowEvent>) -> Vec<WindowSnapshot> {
    events
        .into_iter()
        .filter_map(|e| match e {
            WindowEvent::EpisodesUpdated(snapshot) => Some(snapshot),
            _ => None,
        })
        .collect()
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_updates_arrive_in_state_order() {
    let provider = Arc::new(FakeProvider::new(three_pages_unknown_total()));
    let (window, mut rx) = open(&provider).await;

    for handle in spawn_navigators(&window, 8, 50) {
        handle.await.unwrap();
    }

    let updates = updates(drain(&mut rx));
    // Loaded episodes only grow, so an older snapshot never follows a newer one
    assert!(
        updates
            .windows(2)
            .all(|pair| pair[0].loaded_count <= pair[1].loaded_count)
    );
    assert_eq!(updates.last(), Some(&window.snapshot()));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_no_signals_after_close() {
    let provider = Arc::new(FakeProvider::new(three_pages_unknown_total()));
    let (window, mut rx) = open(&provider).await;

    let handles = spawn_navigators(&window, 4, 200);
    tokio::task::yield_now().await;
    window.close();
    drain(&mut rx);

    for handle in handles {
        handle.await.unwrap();
    }
    assert!(drain(&mut rx).is_empty());
}
