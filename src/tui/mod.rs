//! Terminal User Interface for gowra-stream using ratatui.
//!
//! Renders search results and the episode window, and turns key presses
//! into [`Action`]s for the main loop.

mod render;
mod state;
mod types;

pub use render::draw;
pub use state::App;
pub use types::{Action, Screen};

use crossterm::event::{self, Event};
use std::io;
use std::time::Duration;

/// Poll for keyboard events with a timeout.
pub fn poll_event(timeout: Duration) -> io::Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}
