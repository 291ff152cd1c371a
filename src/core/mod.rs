// Core algorithm exports
pub mod filters;
pub mod ranking;
pub mod recommender;
pub mod scoring;

pub use filters::FacetFilter;
pub use ranking::{compare_scores, rank_candidates};
pub use recommender::{RankOptions, RecommendError, Recommender};
pub use scoring::{combine_scores, tag_match_count};
