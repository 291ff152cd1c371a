// Service exports
pub mod memory;
pub mod postgres;
pub mod similarity;
pub mod store;

pub use memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use similarity::{HttpSimilarityClient, SimilarityCandidate, SimilarityOutcome, SimilarityScorer};
pub use store::{CandidateStore, StoreError, DEFAULT_INTEREST_TAGS};
