use crate::core::{
    filters::FacetFilter,
    ranking::rank_candidates,
    scoring::combine_scores,
};
use crate::models::{CandidateScore, CandidateSet, FilterParams, Profile, ScoringWeights};
use crate::services::{CandidateStore, SimilarityCandidate, SimilarityScorer, StoreError};
use std::sync::Arc;
use thiserror::Error;

/// Errors surfaced by a recommendation request
#[derive(Debug, Error)]
pub enum RecommendError {
    #[error("Candidate store unavailable: {0}")]
    StoreUnavailable(#[from] StoreError),

    #[error("Invalid weights: alpha={alpha}, beta={beta} (must be finite and non-negative)")]
    InvalidWeights { alpha: f64, beta: f64 },
}

/// Caller-supplied knobs of the default recommendation
#[derive(Debug, Clone, Copy, Default)]
pub struct RankOptions {
    /// Overrides the configured weights when set
    pub weights: Option<ScoringWeights>,
    /// `top_k` forwarded to the similarity service
    pub top_k_api: Option<usize>,
    /// Length limit applied after ranking
    pub final_top_k: Option<usize>,
}

/// Recommendation orchestrator
///
/// # Pipelines
/// - `rank`: load → similarity (best effort) → combine → rank
/// - `rank_filtered`: load → facet filter → tag overlap → rank, never
///   calling the similarity service
#[derive(Clone)]
pub struct Recommender {
    store: Arc<dyn CandidateStore>,
    scorer: Arc<dyn SimilarityScorer>,
    weights: ScoringWeights,
}

impl Recommender {
    pub fn new(
        store: Arc<dyn CandidateStore>,
        scorer: Arc<dyn SimilarityScorer>,
        weights: ScoringWeights,
    ) -> Self {
        Self {
            store,
            scorer,
            weights,
        }
    }

    pub fn weights(&self) -> ScoringWeights {
        self.weights
    }

    /// Default recommendation: tag overlap combined with text similarity.
    ///
    /// Falls back to tag-only ranking when the similarity service is
    /// unavailable. An unknown requester yields an empty list.
    pub async fn rank(
        &self,
        requester_id: i32,
        options: RankOptions,
    ) -> Result<Vec<Profile>, RecommendError> {
        let weights = options.weights.unwrap_or(self.weights);
        if !weights.is_valid() {
            return Err(RecommendError::InvalidWeights {
                alpha: weights.tag_match,
                beta: weights.similarity,
            });
        }

        let mut candidates = self.store.load_all_with_tags().await?;
        let Some(requester) = candidates.get(&requester_id) else {
            tracing::debug!("Requester {} not found, returning no recommendations", requester_id);
            return Ok(Vec::new());
        };
        let requester_tags = requester.tags.clone();

        // The batch includes the requester: the service scores everyone against their text
        let batch: Vec<SimilarityCandidate> = candidates
            .values()
            .map(|record| SimilarityCandidate::from(&record.profile))
            .collect();

        let outcome = self
            .scorer
            .fetch_scores(requester_id, &batch, options.top_k_api)
            .await;

        let scores = combine_scores(
            requester_id,
            &requester_tags,
            &candidates,
            outcome.scores(),
            &weights,
        );
        let ranked = rank_candidates(scores, options.final_top_k);

        tracing::info!(
            "Ranked {} of {} candidates for user {} (similarity: {})",
            ranked.len(),
            candidates.len().saturating_sub(1),
            requester_id,
            if outcome.is_available() { "used" } else { "unavailable" }
        );

        Ok(into_profiles(ranked, &mut candidates))
    }

    /// Filtered recommendation ranked by shared tags only.
    ///
    /// With no parameter supplied at all the filter stage is skipped and
    /// every candidate is ranked.
    pub async fn rank_filtered(
        &self,
        requester_id: i32,
        params: &FilterParams,
    ) -> Result<Vec<Profile>, RecommendError> {
        let mut candidates = self.store.load_all_with_tags().await?;
        let Some(requester) = candidates.get(&requester_id) else {
            tracing::debug!("Requester {} not found, returning no recommendations", requester_id);
            return Ok(Vec::new());
        };
        let requester_tags = requester.tags.clone();

        if params.is_unset() {
            tracing::debug!("No filters supplied for user {}, ranking all candidates", requester_id);
        } else {
            let filter = FacetFilter::from_params(params);
            let index = self
                .store
                .load_facet_index(filter.languages.is_some())
                .await?;
            let before = candidates.len();

            candidates.retain(|id, record| filter.matches(*id, record, &index));

            tracing::debug!(
                "Facet filter kept {} of {} profiles for user {}",
                candidates.len(),
                before,
                requester_id
            );
        }

        let scores = combine_scores(requester_id, &requester_tags, &candidates, None, &self.weights);
        let ranked = rank_candidates(scores, None);

        tracing::info!(
            "Returning {} filtered recommendations for user {}",
            ranked.len(),
            requester_id
        );

        Ok(into_profiles(ranked, &mut candidates))
    }
}

fn into_profiles(ranked: Vec<CandidateScore>, candidates: &mut CandidateSet) -> Vec<Profile> {
    ranked
        .into_iter()
        .filter_map(|score| candidates.remove(&score.profile_id))
        .map(|record| record.profile)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::services::{InMemoryStore, SimilarityOutcome};
    use async_trait::async_trait;
    use std::collections::HashMap;

    struct FixedScorer(SimilarityOutcome);

    #[async_trait]
    impl SimilarityScorer for FixedScorer {
        async fn fetch_scores(
            &self,
            _requester_id: i32,
            _candidates: &[SimilarityCandidate],
            _top_k: Option<usize>,
        ) -> SimilarityOutcome {
            self.0.clone()
        }
    }

    fn create_profile(user_id: i32) -> Profile {
        Profile {
            user_id,
            first_name: format!("User {}", user_id),
            last_name: "Test".to_string(),
            age: Some(30),
            bio: None,
            country: None,
            city: None,
            occupation: None,
            photo: None,
            interests: None,
        }
    }

    async fn create_store() -> Arc<InMemoryStore> {
        let store = Arc::new(InMemoryStore::new());
        for (id, tags) in [(1, vec![1, 2]), (2, vec![1, 2]), (3, vec![])] {
            store.insert_profile(create_profile(id)).await;
            store.link_tags(id, &tags).await;
        }
        store
    }

    fn ids(profiles: &[Profile]) -> Vec<i32> {
        profiles.iter().map(|p| p.user_id).collect()
    }

    #[tokio::test]
    async fn test_scenario_weighted_order() {
        let scorer = FixedScorer(SimilarityOutcome::Scored(HashMap::from([(2, 0.9), (3, 0.95)])));
        let recommender =
            Recommender::new(create_store().await, Arc::new(scorer), ScoringWeights::default());

        let result = recommender.rank(1, RankOptions::default()).await.unwrap();

        assert_eq!(ids(&result), vec![2, 3]);
    }

    #[tokio::test]
    async fn test_invalid_weights_rejected() {
        let scorer = FixedScorer(SimilarityOutcome::Unavailable("down".to_string()));
        let recommender =
            Recommender::new(create_store().await, Arc::new(scorer), ScoringWeights::default());

        let result = recommender
            .rank(
                1,
                RankOptions {
                    weights: Some(ScoringWeights::new(-1.0, 0.4)),
                    ..RankOptions::default()
                },
            )
            .await;

        assert!(matches!(result, Err(RecommendError::InvalidWeights { .. })));
    }

    #[tokio::test]
    async fn test_unknown_requester_is_empty() {
        let scorer = FixedScorer(SimilarityOutcome::Scored(HashMap::new()));
        let recommender =
            Recommender::new(create_store().await, Arc::new(scorer), ScoringWeights::default());

        assert!(recommender.rank(99, RankOptions::default()).await.unwrap().is_empty());
        assert!(recommender
            .rank_filtered(99, &FilterParams::default())
            .await
            .unwrap()
            .is_empty());
    }
}
