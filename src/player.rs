//! Embed player links and episode stepping.

use regex::Regex;
use std::sync::LazyLock;

static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").unwrap());

/// Slug used by the embed host: whitespace runs become `-`, then lowercase.
///
/// # Examples
///
/// ```
/// use gowra_stream::player::embed_slug;
///
/// assert_eq!(embed_slug("Attack on  Titan"), "attack-on-titan");
/// ```
pub fn embed_slug(title: &str) -> String {
    WHITESPACE.replace_all(title, "-").to_lowercase()
}

/// Embed URL for `episode` of `title` under `base_url`.
///
/// # Examples
///
/// ```
/// use gowra_stream::player::embed_url;
///
/// assert_eq!(
///     embed_url("https://2anime.xyz/embed", "One Piece", 12),
///     "https://2anime.xyz/embed/one-piece-episode-12"
/// );
/// ```
pub fn embed_url(base_url: &str, title: &str, episode: u32) -> String {
    format!(
        "{}/{}-episode-{}",
        base_url.trim_end_matches('/'),
        embed_slug(title),
        episode
    )
}

/// Episode before `current`, if any.
pub fn previous_episode(current: u32) -> Option<u32> {
    (current > 1).then(|| current - 1)
}

/// Episode after `current`, bounded by `total`.
pub fn next_episode(current: u32, total: u32) -> Option<u32> {
    (current < total).then(|| current + 1)
}
