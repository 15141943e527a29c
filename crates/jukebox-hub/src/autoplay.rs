//! Autoplay policy: what to enqueue when a community's queue runs dry.
//!
//! One upstream query per exhaustion event (plus a single random fallback for
//! `Similar`); an empty answer means "no candidates" and playback goes quiet.

use std::collections::HashSet;

use jukebox_types::{AutoplayMode, Track};

use crate::catalog::{CatalogClient, RandomFilter};

const SIMILAR_COUNT: usize = 50;

/// Candidate tracks for `mode`, seeded by the track that just finished.
///
/// `seen` holds ids that should not be picked again (recent history and queue).
pub async fn next_candidates(
    catalog: &dyn CatalogClient,
    mode: AutoplayMode,
    last_played: Option<&Track>,
    seen: &HashSet<&str>,
) -> Vec<Track> {
    match mode {
        AutoplayMode::None => Vec::new(),
        AutoplayMode::Random => random_candidate(catalog).await,
        AutoplayMode::Similar => {
            if let Some(seed) = last_played {
                let similar = catalog.similar_tracks(&seed.id, SIMILAR_COUNT).await;
                if let Some(track) = similar.into_iter().find(|t| !seen.contains(t.id.as_str())) {
                    return vec![track];
                }
                tracing::debug!(seed = %seed.id, "no unseen similar tracks; falling back to random");
            }
            random_candidate(catalog).await
        }
    }
}

async fn random_candidate(catalog: &dyn CatalogClient) -> Vec<Track> {
    catalog
        .random_tracks(RandomFilter::single())
        .await
        .into_iter()
        .take(1)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{FakeCatalog, track};

    #[tokio::test]
    async fn none_never_queries() {
        let catalog = FakeCatalog::default();
        let out = next_candidates(&catalog, AutoplayMode::None, Some(&track("a")), &HashSet::new()).await;
        assert!(out.is_empty());
        assert!(catalog.calls().is_empty());
    }

    #[tokio::test]
    async fn random_takes_a_single_track() {
        let catalog = FakeCatalog::default();
        catalog.push_random(vec![track("r1"), track("r2")]);
        let out = next_candidates(&catalog, AutoplayMode::Random, None, &HashSet::new()).await;
        assert_eq!(out, vec![track("r1")]);
    }

    #[tokio::test]
    async fn similar_skips_seen_tracks() {
        let catalog = FakeCatalog::default();
        catalog.set_similar("seed", vec![track("seed"), track("s1"), track("s2")]);
        let seen: HashSet<&str> = ["seed"].into_iter().collect();
        let out = next_candidates(&catalog, AutoplayMode::Similar, Some(&track("seed")), &seen).await;
        assert_eq!(out, vec![track("s1")]);
        assert_eq!(catalog.calls(), vec!["similar:seed".to_string()]);
    }

    #[tokio::test]
    async fn similar_falls_back_to_random_once() {
        let catalog = FakeCatalog::default();
        catalog.push_random(vec![track("r1")]);
        let out = next_candidates(&catalog, AutoplayMode::Similar, Some(&track("seed")), &HashSet::new()).await;
        assert_eq!(out, vec![track("r1")]);
        assert_eq!(catalog.calls(), vec!["similar:seed".to_string(), "random".to_string()]);
    }

    #[tokio::test]
    async fn similar_reports_no_candidates_when_everything_is_empty() {
        let catalog = FakeCatalog::default();
        let out = next_candidates(&catalog, AutoplayMode::Similar, Some(&track("seed")), &HashSet::new()).await;
        assert!(out.is_empty());
        assert_eq!(catalog.calls().len(), 2);
    }
}
