//! "More like this" suggestions for an anime.
//!
//! Candidates come from catalog searches on the source's first studio and
//! first genre, then get ranked by genre overlap, year proximity and a shared
//! studio.

use crate::provider::AnimeCatalog;
use crate::types::{Anime, AnimeDetails};
use log::{debug, warn};
use std::collections::HashSet;

/// Maximum number of recommendations returned.
pub const MAX_RECOMMENDATIONS: usize = 10;

/// A candidate together with its similarity score.
#[derive(Debug, Clone, PartialEq)]
pub struct Recommendation {
    pub anime: AnimeDetails,
    pub score: u32,
}

/// Similarity of `target` to `source`.
///
/// Each shared genre is worth 2. Release years within 2, 5 or 10 years add
/// 3, 2 or 1. Any shared studio adds 3.
pub fn similarity_score(source: &AnimeDetails, target: &AnimeDetails) -> u32 {
    let mut score = 0;

    let shared_genres = source
        .anime
        .genres
        .iter()
        .filter(|g| target.anime.genres.contains(g))
        .count() as u32;
    score += shared_genres * 2;

    if let (Some(a), Some(b)) = (source.anime.year, target.anime.year) {
        score += match (a - b).abs() {
            0..=2 => 3,
            3..=5 => 2,
            6..=10 => 1,
            _ => 0,
        };
    }

    if source
        .anime
        .studios
        .iter()
        .any(|s| target.anime.studios.contains(s)) {
        score += 3;
    }

    score
}

/// Rank candidates against `source`.
///
/// The source itself and repeated ids are dropped (first occurrence wins),
/// ties keep candidate order, and at most [`MAX_RECOMMENDATIONS`] are kept.
pub fn rank_recommendations(
    source: &AnimeDetails,
    candidates: impl IntoIterator<Item = AnimeDetails>,
) -> Vec<Recommendation> {
    let mut seen = HashSet::new();
    let mut ranked: Vec<Recommendation> = candidates
        .into_iter()
        .filter(|c| c.anime.id != source.anime.id && seen.insert(c.anime.id.clone()))
        .map(|anime| Recommendation {
            score: similarity_score(source, &anime),
            anime,
        })
        .collect();

    ranked.sort_by(|a, b| b.score.cmp(&a.score));
    ranked.truncate(MAX_RECOMMENDATIONS);
    ranked
}

async fn search_or_empty(catalog: &dyn AnimeCatalog, query: &str) -> Vec<Anime> {
    match catalog.search_anime(query).await {
        Ok(results) => results,
        Err(e) => {
            warn!("Recommendation search for '{}' failed: {}", query, e);
            Vec::new()
        }
    }
}

/// Gather and rank recommendations for `source` from the catalog.
///
/// A failed search contributes no candidates instead of failing the whole
/// lookup.
pub async fn recommend_anime(
    catalog: &dyn AnimeCatalog,
    source: &AnimeDetails,
) -> Vec<Recommendation> {
    let mut candidates = Vec::new();

    if let Some(studio) = source.anime.studios.first() {
        candidates.extend(search_or_empty(catalog, studio).await);
    }
    if let Some(genre) = source.anime.genres.first() {
        candidates.extend(search_or_empty(catalog, genre).await);
    }

    debug!(
        "Ranking {} candidates for '{}'",
        candidates.len(),
        source.anime.title
    );

    rank_recommendations(source, candidates.into_iter().map(AnimeDetails::from))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(id: &str, genres: &[&str], year: Option<i32>, studios: &[&str]) -> AnimeDetails {
        AnimeDetails {
            anime: Anime {
                id: id.to_string(),
                title: format!("Anime {id}"),
                year,
                genres: genres.iter().map(|g| g.to_string()).collect(),
                studios: studios.iter().map(|s| s.to_string()).collect(),
                ..Anime::default()
            },
            ..AnimeDetails::default()
        }
    }

    #[test]
    fn test_score_genres_year_and_studio() {
        let source = details("1", &["Action", "Drama"], Some(2010), &["Bones"]);
        let target = details("2", &["Action", "Drama", "Comedy"], Some(2011), &["Bones"]);
        assert_eq!(similarity_score(&source, &target), 4 + 3 + 3);
    }

    #[test]
    fn test_score_year_bands() {
        let source = details("1", &[], Some(2000), &[]);
        assert_eq!(similarity_score(&source, &details("a", &[], Some(2002), &[])), 3);
        assert_eq!(similarity_score(&source, &details("b", &[], Some(1995), &[])), 2);
        assert_eq!(similarity_score(&source, &details("c", &[], Some(2010), &[])), 1);
        assert_eq!(similarity_score(&source, &details("d", &[], Some(2011), &[])), 0);
        assert_eq!(similarity_score(&source, &details("e", &[], None, &[])), 0);
    }

    #[test]
    fn test_rank_excludes_source_and_duplicates() {
        let source = details("1", &["Action"], Some(2010), &[]);
        let candidates = vec![
            details("1", &["Action"], Some(2010), &[]),
            details("2", &[], None, &[]),
            details("3", &["Action"], Some(2010), &[]),
            details("2", &["Action"], Some(2010), &[]),
        ];

        let ranked = rank_recommendations(&source, candidates);
        let ids: Vec<&str> = ranked.iter().map(|r| r.anime.anime.id.as_str()).collect();
        assert_eq!(ids, vec!["3", "2"]);
        assert_eq!(ranked[0].score, 5);
        assert_eq!(ranked[1].score, 0);
    }

    #[test]
    fn test_rank_truncates() {
        let source = details("0", &["Action"], None, &[]);
        let candidates = (1..=25).map(|i| details(&i.to_string(), &["Action"], None, &[]));
        assert_eq!(rank_recommendations(&source, candidates).len(), MAX_RECOMMENDATIONS);
    }
}
