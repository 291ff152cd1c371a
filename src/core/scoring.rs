use crate::models::{CandidateScore, CandidateSet, ScoringWeights, TagId};
use std::collections::{BTreeSet, HashMap};

/// Number of interest tags two users share
#[inline]
pub fn tag_match_count(a: &BTreeSet<TagId>, b: &BTreeSet<TagId>) -> usize {
    a.intersection(b).count()
}

/// Combine tag overlap and similarity into one score per candidate
///
/// Scoring formula:
/// total = (
///     weights.tag_match * shared_tags +     # when similarity was fetched
///     weights.similarity * similarity       # missing ids contribute 0.0
/// )
/// total = shared_tags                       # when `similarity` is None
///
/// The requester never appears in the output.
pub fn combine_scores(
    requester_id: i32,
    requester_tags: &BTreeSet<TagId>,
    candidates: &CandidateSet,
    similarity: Option<&HashMap<i32, f64>>,
    weights: &ScoringWeights,
) -> Vec<CandidateScore> {
    candidates
        .iter()
        .filter(|(id, _)| **id != requester_id)
        .map(|(id, record)| {
            let shared = tag_match_count(requester_tags, &record.tags);
            let score = similarity.and_then(|scores| scores.get(id).copied());

            let total_score = match similarity {
                Some(_) => {
                    weights.tag_match * shared as f64
                        + weights.similarity * score.unwrap_or(0.0)
                }
                None => shared as f64,
            };

            CandidateScore {
                profile_id: *id,
                tag_match_count: shared,
                similarity: score,
                total_score,
            }
        })
        .collect()
}
