// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    CandidateRecord, CandidateScore, CandidateSet, FacetIndex, Interest, InterestTag, Language,
    Profile, ScoringWeights, TagId,
};
pub use requests::{DefaultRecommendationQuery, FilterParams};
pub use responses::{ErrorResponse, HealthResponse};
