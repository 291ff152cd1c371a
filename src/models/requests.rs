use serde::{Deserialize, Serialize};
use validator::Validate;

/// Query parameters of the default recommendation endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct DefaultRecommendationQuery {
    #[validate(range(min = 1))]
    #[serde(rename = "userId")]
    pub user_id: i32,
    #[serde(default)]
    pub alpha: Option<f64>,
    #[serde(default)]
    pub beta: Option<f64>,
    #[serde(default, rename = "topKApi")]
    pub top_k_api: Option<usize>,
    #[serde(default, rename = "finalTopK")]
    pub final_top_k: Option<usize>,
}

/// Raw facet parameters as they arrive on the wire.
///
/// Values stay unparsed here; `FacetFilter::from_params` decides which of
/// them become active predicates.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterParams {
    pub interests: Option<Vec<String>>,
    pub min_age: Option<String>,
    pub max_age: Option<String>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub languages: Option<Vec<String>>,
}

impl FilterParams {
    /// True when no parameter was supplied at all
    pub fn is_unset(&self) -> bool {
        self.interests.is_none()
            && self.min_age.is_none()
            && self.max_age.is_none()
            && self.city.is_none()
            && self.country.is_none()
            && self.languages.is_none()
    }

    /// Build params from decoded query pairs. Repeated `interests` and
    /// `languages` keys accumulate; for scalar keys the first value wins.
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut params = FilterParams::default();

        for (key, value) in pairs {
            match key.as_str() {
                "interests" => params.interests.get_or_insert_with(Vec::new).push(value),
                "languages" => params.languages.get_or_insert_with(Vec::new).push(value),
                "minAge" => {
                    params.min_age.get_or_insert(value);
                }
                "maxAge" => {
                    params.max_age.get_or_insert(value);
                }
                "city" => {
                    params.city.get_or_insert(value);
                }
                "country" => {
                    params.country.get_or_insert(value);
                }
                _ => {}
            }
        }

        params
    }
}
