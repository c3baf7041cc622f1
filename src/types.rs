//! Type definitions shared across gowra-stream.
//!
//! Episodes, provider pages and the anime records returned by the catalog.

use serde::{Deserialize, Serialize};

/// A single episode as listed by the metadata provider.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Episode {
    /// Episode number, starting at 1.
    pub number: u32,

    /// Episode title, empty when the provider has none.
    pub title: String,

    /// Air date as reported by the provider.
    pub aired: String,

    /// Runtime as reported by the provider (e.g. "24 min per ep").
    pub duration: String,

    /// Short synopsis, often empty in paged listings.
    pub synopsis: String,
}

impl Episode {
    /// Create an episode with only a number and title.
    pub fn new(number: u32, title: impl Into<String>) -> Self {
        Self {
            number,
            title: title.into(),
            ..Self::default()
        }
    }

    /// Format the episode for display in selection lists.
    ///
    /// # Examples
    ///
    /// ```
    /// use gowra_stream::types::Episode;
    ///
    /// assert_eq!(Episode::new(1, "The Beginning").to_display(), "Ep 1 - The Beginning");
    /// assert_eq!(Episode::new(2, "").to_display(), "Ep 2");
    /// ```
    pub fn to_display(&self) -> String {
        if self.title.is_empty() {
            format!("Ep {}", self.number)
        } else {
            format!("Ep {} - {}", self.number, self.title)
        }
    }
}

/// One page of episodes from the provider's own pagination.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EpisodePage {
    /// Episodes on this page, in provider order.
    pub episodes: Vec<Episode>,

    /// Whether the provider has another page after this one.
    pub has_next_page: bool,

    /// Episode count reported for the title; 0 means unknown.
    pub total_episodes: u32,
}

/// An anime as listed in search and top results.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Anime {
    /// Provider identifier (MyAnimeList id for Jikan).
    pub id: String,

    /// Display title.
    pub title: String,

    /// Reported episode count; 0 when unknown or still airing.
    pub episodes: u32,

    /// Average score.
    pub rating: f32,

    /// Poster image URL.
    pub poster: String,

    pub synopsis: String,

    /// Premiere year, if known.
    pub year: Option<i32>,

    /// Airing status (e.g. "Finished Airing").
    pub status: String,

    pub genres: Vec<String>,

    /// Animation studios, as listed by the provider.
    pub studios: Vec<String>,
}

impl Anime {
    /// Format the anime for display in result lists.
    ///
    /// # Examples
    ///
    /// ```
    /// use gowra_stream::types::Anime;
    ///
    /// let anime = Anime {
    ///     id: "21".to_string(),
    ///     title: "One Piece".to_string(),
    ///     year: Some(1999),
    ///     ..Anime::default()
    /// };
    /// assert_eq!(anime.to_display(), "One Piece (1999, ? eps)");
    /// ```
    pub fn to_display(&self) -> String {
        let year = self
            .year
            .map(|y| y.to_string())
            .unwrap_or_else(|| "?".to_string());
        let eps = if self.episodes == 0 {
            "?".to_string()
        } else {
            self.episodes.to_string()
        };
        format!("{} ({}, {} eps)", self.title, year, eps)
    }
}

/// Full details of an anime, used by the detail view and recommendations.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct AnimeDetails {
    #[serde(flatten)]
    pub anime: Anime,

    /// Trailer URL, if any.
    pub trailer: Option<String>,

    pub duration: String,

    /// Source material (e.g. "Manga").
    pub source: String,
}

impl From<Anime> for AnimeDetails {
    /// Search results carry no trailer, duration or source; those stay empty.
    fn from(anime: Anime) -> Self {
        Self {
            anime,
            ..Self::default()
        }
    }
}
