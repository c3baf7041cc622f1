//! API client for the Jikan v4 (MyAnimeList) REST service.
//!
//! Provides paged episode listings for the episode window and the catalog
//! lookups (details, search, top) used by the front-end.

use super::{AnimeCatalog, MetadataProvider};
use crate::config::Config;
use crate::error::ProviderError;
use crate::types::{Anime, AnimeDetails, Episode, EpisodePage};
use log::{debug, warn};
use reqwest::StatusCode;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Maximum number of results requested for searches.
const SEARCH_LIMIT: u32 = 20;

// Response envelope shared by every Jikan endpoint
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
    #[serde(default)]
    pagination: Option<Pagination>,
}

#[derive(Debug, Default, Deserialize)]
struct Pagination {
    #[serde(default)]
    has_next_page: bool,
}

#[derive(Debug, Deserialize)]
struct RawEpisode {
    mal_id: i64,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    aired: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawAnime {
    mal_id: i64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    episodes: Option<u32>,
    #[serde(default)]
    score: Option<f32>,
    #[serde(default)]
    images: Option<RawImages>,
    #[serde(default)]
    synopsis: Option<String>,
    #[serde(default)]
    year: Option<i32>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    genres: Vec<RawNamed>,
    #[serde(default)]
    trailer: Option<RawTrailer>,
    #[serde(default)]
    duration: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    studios: Vec<RawNamed>,
}

#[derive(Debug, Default, Deserialize)]
struct RawImages {
    #[serde(default)]
    jpg: Option<RawImage>,
}

#[derive(Debug, Default, Deserialize)]
struct RawImage {
    #[serde(default)]
    large_image_url: Option<String>,
    #[serde(default)]
    image_url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawNamed {
    name: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawTrailer {
    #[serde(default)]
    url: Option<String>,
}

/// Convert a raw episode entry, dropping entries without a usable number.
fn convert_episode(raw: RawEpisode) -> Option<Episode> {
    let number = u32::try_from(raw.mal_id).ok().filter(|n| *n >= 1)?;
    Some(Episode {
        number,
        title: raw.title.unwrap_or_default(),
        aired: raw.aired.unwrap_or_default(),
        duration: String::new(),
        synopsis: String::new(),
    })
}

fn convert_anime(raw: &RawAnime) -> Anime {
    let poster = raw
        .images
        .as_ref()
        .and_then(|i| i.jpg.as_ref())
        .and_then(|jpg| jpg.large_image_url.clone().or_else(|| jpg.image_url.clone()))
        .unwrap_or_default();

    Anime {
        id: raw.mal_id.to_string(),
        title: raw.title.clone(),
        episodes: raw.episodes.unwrap_or(0),
        rating: raw.score.unwrap_or(0.0),
        poster,
        synopsis: raw.synopsis.clone().unwrap_or_default(),
        year: raw.year,
        status: raw.status.clone().unwrap_or_default(),
        genres: raw.genres.iter().map(|g| g.name.clone()).collect(),
        studios: raw.studios.iter().map(|s| s.name.clone()).collect(),
    }
}

fn convert_details(raw: RawAnime) -> AnimeDetails {
    AnimeDetails {
        anime: convert_anime(&raw),
        trailer: raw.trailer.and_then(|t| t.url),
        duration: raw.duration.unwrap_or_default(),
        source: raw.source.unwrap_or_default(),
    }
}

/// HTTP client for Jikan.
#[derive(Debug, Clone)]
pub struct JikanClient {
    client: reqwest::Client,
    base_url: String,
}

impl JikanClient {
    /// Build a client from the user's configuration.
    pub fn new(config: &Config) -> Result<Self, ProviderError> {
        let client = reqwest::Client::builder()
            .user_agent(config.user_agent.as_str())
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url: config.jikan_base_url.trim_end_matches('/').to_string(),
        })
    }

    /// GET `path` relative to the base URL and decode the Jikan envelope.
    async fn get<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
    ) -> Result<Envelope<T>, ProviderError> {
        let url = format!("{}{}", self.base_url, path);
        debug!("GET {} {:?}", url, query);

        let resp = self.client.get(&url).query(query).send().await?;

        match resp.status() {
            s if s.is_success() => {}
            StatusCode::NOT_FOUND => return Err(ProviderError::NotFound(path.to_string())),
            s => {
                warn!("Jikan returned {} for {}", s, path);
                return Err(ProviderError::Status(s.as_u16()));
            }
        }

        let body = resp.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn fetch_raw_anime(&self, id: &str) -> Result<RawAnime, ProviderError> {
        let envelope: Envelope<RawAnime> = self.get(&format!("/anime/{id}"), &[]).await?;
        Ok(envelope.data)
    }
}

#[async_trait::async_trait]
impl MetadataProvider for JikanClient {
    async fn fetch_episode_page(
        &self,
        title_id: &str,
        page: u32,
    ) -> Result<EpisodePage, ProviderError> {
        debug!("Fetching episode page {} for anime {}", page, title_id);

        let path = format!("/anime/{title_id}/episodes");
        let query = [("page", page.to_string())];
        let listing = self.get::<Vec<RawEpisode>>(&path, &query);

        // The episode listing carries no total, so the first page also reads it
        // from the anime record.
        let (envelope, total_episodes) = if page == 1 {
            let (envelope, raw) = tokio::try_join!(listing, self.fetch_raw_anime(title_id))?;
            (envelope, raw.episodes.unwrap_or(0))
        } else {
            (listing.await?, 0)
        };

        let has_next_page = envelope.pagination.unwrap_or_default().has_next_page;
        let episodes: Vec<Episode> = envelope
            .data
            .into_iter()
            .filter_map(convert_episode)
            .collect();

        debug!(
            "Page {} of anime {}: {} episodes, has_next_page={}",
            page,
            title_id,
            episodes.len(),
            has_next_page
        );

        Ok(EpisodePage {
            episodes,
            has_next_page,
            total_episodes,
        })
    }
}

#[async_trait::async_trait]
impl AnimeCatalog for JikanClient {
    async fn anime_details(&self, id: &str) -> Result<AnimeDetails, ProviderError> {
        debug!("Fetching details for anime {}", id);
        Ok(convert_details(self.fetch_raw_anime(id).await?))
    }

    async fn search_anime(&self, query: &str) -> Result<Vec<Anime>, ProviderError> {
        debug!("Searching anime for '{}'", query);
        let envelope: Envelope<Vec<RawAnime>> = self
            .get(
                "/anime",
                &[
                    ("q", query.to_string()),
                    ("limit", SEARCH_LIMIT.to_string()),
                ],
            )
            .await?;

        let results: Vec<Anime> = envelope.data.iter().map(convert_anime).collect();
        debug!("Found {} anime for '{}'", results.len(), query);
        Ok(results)
    }

    async fn top_anime(&self) -> Result<Vec<Anime>, ProviderError> {
        let envelope: Envelope<Vec<RawAnime>> = self.get("/top/anime", &[]).await?;
        Ok(envelope.data.iter().map(convert_anime).collect())
    }
}
