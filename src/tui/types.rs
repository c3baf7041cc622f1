//! TUI type definitions for screens and actions.

/// The current screen/view of the application.
#[derive(Debug, Clone, PartialEq)]
pub enum Screen {
    /// Waiting for a search query
    Search,
    /// Browsing search results
    Results,
    /// Browsing the episode window of one title
    Episodes,
    /// Loading/waiting for API response
    Loading,
}

/// Actions that can be returned from the TUI.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// No action, continue running
    None,
    /// Quit the application
    Quit,
    /// Perform a search with the given query
    Search(String),
    /// Open a search result by index
    OpenTitle(usize),
    /// Leave the current title and return to the results
    Back,
    PreviousSet,
    NextSet,
    PreviousPage,
    NextPage,
    /// Play an episode by number
    SelectEpisode(u32),
    /// Fetch the next provider page
    LoadMore,
    /// Play the episode before the current one
    PreviousEpisode,
    /// Play the episode after the current one
    NextEpisode,
}
