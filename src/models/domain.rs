use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Identifier of an entry in the fixed interest-tag catalog
pub type TagId = i32;

/// User profile as returned to clients
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Profile {
    #[serde(rename = "userId")]
    pub user_id: i32,
    #[serde(rename = "firstName")]
    pub first_name: String,
    #[serde(rename = "lastName")]
    pub last_name: String,
    #[serde(default)]
    pub age: Option<i32>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub occupation: Option<String>,
    #[serde(default)]
    pub photo: Option<Vec<u8>>,
    #[serde(default)]
    pub interests: Option<String>,
}

/// Entry of the interest-tag catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterestTag {
    pub id: TagId,
    pub name: String,
}

/// Free-text interest filed under a catalog tag
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interest {
    pub name: String,
    #[serde(rename = "type")]
    pub tag: String,
}

/// Entry of the spoken-language catalog
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Language {
    pub id: i32,
    pub language: String,
    #[serde(rename = "nativeName")]
    pub native_name: String,
}

/// A profile together with its interest-tag set
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateRecord {
    pub profile: Profile,
    pub tags: BTreeSet<TagId>,
}

/// Snapshot of every candidate keyed by user id.
///
/// Ordered so that iteration order never leaks into rankings.
pub type CandidateSet = BTreeMap<i32, CandidateRecord>;

/// Lookup tables the facet filter needs beyond the profile itself
#[derive(Debug, Clone, Default)]
pub struct FacetIndex {
    /// Tag id -> catalog name
    pub tag_names: HashMap<TagId, String>,
    /// User id -> native names of the languages they speak
    pub languages: HashMap<i32, BTreeSet<String>>,
}

/// Per-request score of one candidate
#[derive(Debug, Clone, PartialEq)]
pub struct CandidateScore {
    pub profile_id: i32,
    pub tag_match_count: usize,
    pub similarity: Option<f64>,
    pub total_score: f64,
}

/// Weights of the combined score
///
/// total = tag_match * shared_tags + similarity * similarity_score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringWeights {
    pub tag_match: f64,
    pub similarity: f64,
}

impl ScoringWeights {
    pub fn new(tag_match: f64, similarity: f64) -> Self {
        Self { tag_match, similarity }
    }

    /// Weights must be finite and non-negative. They need not sum to 1.
    pub fn is_valid(&self) -> bool {
        [self.tag_match, self.similarity]
            .iter()
            .all(|w| w.is_finite() && *w >= 0.0)
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self {
            tag_match: 0.6,
            similarity: 0.4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_weights() {
        let weights = ScoringWeights::default();
        assert_eq!(weights.tag_match, 0.6);
        assert_eq!(weights.similarity, 0.4);
        assert!(weights.is_valid());
    }

    #[test]
    fn test_weights_validation() {
        assert!(ScoringWeights::new(2.0, 0.0).is_valid());
        assert!(!ScoringWeights::new(-0.1, 0.4).is_valid());
        assert!(!ScoringWeights::new(0.6, f64::NAN).is_valid());
        assert!(!ScoringWeights::new(f64::INFINITY, 0.4).is_valid());
    }

    #[test]
    fn test_profile_serializes_camel_case() {
        let profile = Profile {
            user_id: 7,
            first_name: "Anna".to_string(),
            last_name: "Petrova".to_string(),
            age: Some(27),
            bio: None,
            country: Some("Germany".to_string()),
            city: Some("Berlin".to_string()),
            occupation: None,
            photo: None,
            interests: None,
        };

        let json = serde_json::to_value(&profile).unwrap();
        assert_eq!(json["userId"], 7);
        assert_eq!(json["firstName"], "Anna");
        assert_eq!(json["city"], "Berlin");
        assert!(json["bio"].is_null());
    }
}
