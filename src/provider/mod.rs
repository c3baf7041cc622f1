//! Metadata provider abstractions.
//!
//! The episode window only needs paged episode listings ([`MetadataProvider`]).
//! The front-end and recommendations additionally browse the catalog through
//! [`AnimeCatalog`]. [`JikanClient`] implements both against the Jikan v4 API.

mod jikan;

pub use jikan::JikanClient;

use crate::error::ProviderError;
use crate::types::{Anime, AnimeDetails, EpisodePage};

/// Number of episodes a provider returns per page.
pub const PROVIDER_PAGE_SIZE: u32 = 100;

/// Source of paged episode listings.
///
/// Pages are 1-indexed and independent of the window's set/page grouping:
/// a provider may return fewer than [`PROVIDER_PAGE_SIZE`] episodes per page,
/// or skip numbers entirely.
#[async_trait::async_trait]
pub trait MetadataProvider: Send + Sync {
    /// Fetch one page of episodes for a title.
    async fn fetch_episode_page(
        &self,
        title_id: &str,
        page: u32,
    ) -> Result<EpisodePage, ProviderError>;
}

/// Catalog lookups used outside the episode window.
#[async_trait::async_trait]
pub trait AnimeCatalog: Send + Sync {
    /// Fetch full details for a single anime.
    async fn anime_details(&self, id: &str) -> Result<AnimeDetails, ProviderError>;

    /// Search anime by free text (titles, genres or studio names).
    async fn search_anime(&self, query: &str) -> Result<Vec<Anime>, ProviderError>;

    /// Currently popular anime.
    async fn top_anime(&self) -> Result<Vec<Anime>, ProviderError>;
}
