//! Buddy Match - user recommendation service
//!
//! Ranks other users for a requester by shared interest tags, optionally
//! blended with a text similarity score from an external service, and
//! supports faceted filtering over age, location, interests and languages.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use core::{RankOptions, RecommendError, Recommender};
pub use models::{CandidateScore, FilterParams, Profile, ScoringWeights};
pub use services::{CandidateStore, InMemoryStore, PostgresStore, HttpSimilarityClient, SimilarityOutcome, SimilarityScorer};
