use crate::models::CandidateScore;
use std::cmp::Ordering;

/// Ranking order between two scored candidates
///
/// total score desc, similarity desc (absent = 0.0), shared tags desc, id asc.
/// The id tie-break makes the order total.
pub fn compare_scores(a: &CandidateScore, b: &CandidateScore) -> Ordering {
    b.total_score
        .total_cmp(&a.total_score)
        .then_with(|| similarity_key(b).total_cmp(&similarity_key(a)))
        .then_with(|| b.tag_match_count.cmp(&a.tag_match_count))
        .then_with(|| a.profile_id.cmp(&b.profile_id))
}

/// Absent similarity sorts as 0.0, and -0.0 ties with it
fn similarity_key(score: &CandidateScore) -> f64 {
    score.similarity.unwrap_or(0.0) + 0.0
}

/// Sort candidates into ranking order, then keep at most `final_top_k`
pub fn rank_candidates(
    mut scores: Vec<CandidateScore>,
    final_top_k: Option<usize>,
) -> Vec<CandidateScore> {
    scores.sort_by(compare_scores);

    if let Some(limit) = final_top_k {
        scores.truncate(limit);
    }

    scores
}

#[cfg(test)]
mod tests {
    use super::*;

    fn score(id: i32, shared: usize, similarity: Option<f64>, total: f64) -> CandidateScore {
        CandidateScore {
            profile_id: id,
            tag_match_count: shared,
            similarity,
            total_score: total,
        }
    }

    fn ids(scores: &[CandidateScore]) -> Vec<i32> {
        scores.iter().map(|s| s.profile_id).collect()
    }

    #[test]
    fn test_sorted_by_total_score() {
        let ranked = rank_candidates(
            vec![
                score(1, 0, Some(0.95), 0.38),
                score(2, 2, Some(0.9), 1.56),
            ],
            None,
        );
        assert_eq!(ids(&ranked), vec![2, 1]);
    }

    #[test]
    fn test_tie_breaks() {
        let ranked = rank_candidates(
            vec![
                score(5, 1, None, 1.0),
                score(4, 1, Some(0.2), 1.0),
                score(3, 2, None, 1.0),
                score(2, 1, None, 1.0),
            ],
            None,
        );
        // similarity first, then shared tags, then id
        assert_eq!(ids(&ranked), vec![4, 3, 2, 5]);
    }

    #[test]
    fn test_equal_scores_ordered_by_id() {
        let ranked = rank_candidates(
            (1..=6).rev().map(|id| score(id, 1, None, 1.0)).collect(),
            None,
        );
        assert_eq!(ids(&ranked), vec![1, 2, 3, 4, 5, 6]);
    }

    #[test]
    fn test_truncation_keeps_prefix() {
        let input: Vec<CandidateScore> = (1..=20)
            .map(|id| score(id, (id % 4) as usize, None, (id % 4) as f64))
            .collect();

        let full = rank_candidates(input.clone(), None);
        let top = rank_candidates(input, Some(5));

        assert_eq!(top.len(), 5);
        assert_eq!(ids(&top), ids(&full[..5]));
    }

    #[test]
    fn test_truncation_larger_than_input() {
        let ranked = rank_candidates(vec![score(1, 0, None, 0.0)], Some(10));
        assert_eq!(ranked.len(), 1);
    }

    #[test]
    fn test_negative_zero_similarity_ties_with_absent() {
        let ranked = rank_candidates(
            vec![score(1, 1, Some(-0.0), 0.6), score(2, 0, None, 0.6)],
            None,
        );

        // Equal similarity, so the shared-tag count decides
        assert_eq!(ranked[0].profile_id, 1);
        assert_eq!(ranked[1].profile_id, 2);
    }
}
