//! Episode windowing and anime catalog access for Gowra Stream.
//!
//! gowra-stream browses anime through the Jikan API and keeps the viewer's
//! place in very long episode lists. Episodes are shown ten per page in sets
//! of one hundred, while the provider is paged independently and fetched on
//! demand.
//!
//! # Features
//!
//! - Episode window with set/page navigation and single-flight fetching
//! - Jikan v4 client for episode pages, details, search and top lists
//! - Genre/year/studio based recommendations
//! - Embed player links
//!
//! # Usage
//!
//! ```bash
//! # Search and browse in the terminal
//! cargo run -- --search "one piece"
//!
//! # Open a title directly by MyAnimeList id
//! cargo run -- --title 21
//! ```

pub mod config;
pub mod error;
pub mod player;
pub mod provider;
pub mod recommendations;
pub mod tui;
pub mod types;
pub mod window;
