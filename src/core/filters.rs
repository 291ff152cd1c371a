use crate::models::{CandidateRecord, FacetIndex, FilterParams, TagId};
use std::collections::BTreeSet;

/// Active facet predicates, built from raw request parameters.
///
/// Every `Some` field is one predicate; predicates combine with AND.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FacetFilter {
    pub min_age: Option<i32>,
    pub max_age: Option<i32>,
    pub city: Option<String>,
    pub country: Option<String>,
    /// Catalog tag names, matched with OR
    pub interest_tags: Option<BTreeSet<String>>,
    /// Native language names, matched with OR
    pub languages: Option<BTreeSet<String>>,
}

impl FacetFilter {
    /// Build predicates from raw parameters.
    ///
    /// Non-numeric age bounds, blank city/country and empty lists are
    /// dropped rather than rejected.
    pub fn from_params(params: &FilterParams) -> Self {
        Self {
            min_age: parse_age("minAge", params.min_age.as_deref()),
            max_age: parse_age("maxAge", params.max_age.as_deref()),
            city: non_blank(params.city.as_deref()),
            country: non_blank(params.country.as_deref()),
            interest_tags: non_empty(params.interests.as_deref()),
            languages: non_empty(params.languages.as_deref()),
        }
    }

    /// True when no predicate survived parsing
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Check a candidate against every active predicate
    pub fn matches(&self, user_id: i32, record: &CandidateRecord, index: &FacetIndex) -> bool {
        let profile = &record.profile;

        // Check age range; a missing age never satisfies a bound
        if let Some(min) = self.min_age {
            if !matches!(profile.age, Some(age) if age >= min) {
                return false;
            }
        }
        if let Some(max) = self.max_age {
            if !matches!(profile.age, Some(age) if age <= max) {
                return false;
            }
        }

        // Exact, case-sensitive location match
        if let Some(city) = &self.city {
            if profile.city.as_ref() != Some(city) {
                return false;
            }
        }
        if let Some(country) = &self.country {
            if profile.country.as_ref() != Some(country) {
                return false;
            }
        }

        // At least one selected interest tag
        if let Some(selected) = &self.interest_tags {
            if !has_selected_tag(&record.tags, selected, index) {
                return false;
            }
        }

        // At least one selected spoken language
        if let Some(selected) = &self.languages {
            let speaks_one = index
                .languages
                .get(&user_id)
                .is_some_and(|spoken| spoken.iter().any(|name| selected.contains(name)));
            if !speaks_one {
                return false;
            }
        }

        true
    }
}

#[inline]
fn has_selected_tag(tags: &BTreeSet<TagId>, selected: &BTreeSet<String>, index: &FacetIndex) -> bool {
    tags.iter().any(|tag| {
        index
            .tag_names
            .get(tag)
            .is_some_and(|name| selected.contains(name))
    })
}

fn parse_age(field: &str, raw: Option<&str>) -> Option<i32> {
    let raw = raw?;
    match raw.parse::<i32>() {
        Ok(age) => Some(age),
        Err(_) => {
            tracing::debug!("Ignoring non-numeric {} filter: {:?}", field, raw);
            None
        }
    }
}

fn non_blank(raw: Option<&str>) -> Option<String> {
    raw.filter(|value| !value.trim().is_empty())
        .map(str::to_string)
}

fn non_empty(values: Option<&[String]>) -> Option<BTreeSet<String>> {
    values
        .filter(|values| !values.is_empty())
        .map(|values| values.iter().cloned().collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Profile;
    use std::collections::HashMap;

    fn create_test_record(age: Option<i32>, city: &str, country: &str, tags: &[TagId]) -> CandidateRecord {
        CandidateRecord {
            profile: Profile {
                user_id: 10,
                first_name: "Test".to_string(),
                last_name: "User".to_string(),
                age,
                bio: None,
                country: Some(country.to_string()),
                city: Some(city.to_string()),
                occupation: None,
                photo: None,
                interests: None,
            },
            tags: tags.iter().copied().collect(),
        }
    }

    fn create_test_index() -> FacetIndex {
        FacetIndex {
            tag_names: HashMap::from([
                (1, "Музыка".to_string()),
                (2, "Кино".to_string()),
                (3, "Фитнес".to_string()),
            ]),
            languages: HashMap::from([(10, BTreeSet::from(["Deutsch".to_string()]))]),
        }
    }

    fn params() -> FilterParams {
        FilterParams::default()
    }

    #[test]
    fn test_age_bounds_are_inclusive() {
        let filter = FacetFilter::from_params(&FilterParams {
            min_age: Some("25".to_string()),
            max_age: Some("30".to_string()),
            ..params()
        });
        let index = create_test_index();

        assert!(filter.matches(10, &create_test_record(Some(25), "Berlin", "Germany", &[]), &index));
        assert!(filter.matches(10, &create_test_record(Some(30), "Berlin", "Germany", &[]), &index));
        assert!(!filter.matches(10, &create_test_record(Some(31), "Berlin", "Germany", &[]), &index));
        assert!(!filter.matches(10, &create_test_record(None, "Berlin", "Germany", &[]), &index));
    }

    #[test]
    fn test_non_numeric_age_is_dropped() {
        let filter = FacetFilter::from_params(&FilterParams {
            min_age: Some("abc".to_string()),
            max_age: Some("40".to_string()),
            ..params()
        });

        assert_eq!(filter.min_age, None);
        assert_eq!(filter.max_age, Some(40));
    }

    #[test]
    fn test_padded_age_is_dropped() {
        let filter = FacetFilter::from_params(&FilterParams {
            min_age: Some(" 18".to_string()),
            max_age: Some("40 ".to_string()),
            ..params()
        });

        assert_eq!(filter.min_age, None);
        assert_eq!(filter.max_age, None);
        assert!(filter.is_empty());
    }

    #[test]
    fn test_blank_city_is_dropped() {
        let filter = FacetFilter::from_params(&FilterParams {
            city: Some("  ".to_string()),
            ..params()
        });
        assert!(filter.is_empty());
    }

    #[test]
    fn test_city_is_case_sensitive() {
        let filter = FacetFilter::from_params(&FilterParams {
            city: Some("Berlin".to_string()),
            ..params()
        });
        let index = create_test_index();

        assert!(filter.matches(10, &create_test_record(Some(25), "Berlin", "Germany", &[]), &index));
        assert!(!filter.matches(10, &create_test_record(Some(25), "berlin", "Germany", &[]), &index));
    }

    #[test]
    fn test_interest_tags_use_or_semantics() {
        let filter = FacetFilter::from_params(&FilterParams {
            interests: Some(vec!["Кино".to_string(), "Поэзия".to_string()]),
            ..params()
        });
        let index = create_test_index();

        assert!(filter.matches(10, &create_test_record(None, "Berlin", "Germany", &[1, 2]), &index));
        assert!(!filter.matches(10, &create_test_record(None, "Berlin", "Germany", &[1, 3]), &index));
        assert!(!filter.matches(10, &create_test_record(None, "Berlin", "Germany", &[]), &index));
    }

    #[test]
    fn test_languages_filter() {
        let filter = FacetFilter::from_params(&FilterParams {
            languages: Some(vec!["Deutsch".to_string(), "Français".to_string()]),
            ..params()
        });
        let index = create_test_index();
        let record = create_test_record(None, "Berlin", "Germany", &[]);

        assert!(filter.matches(10, &record, &index));
        // user 11 has no language links
        assert!(!filter.matches(11, &record, &index));
    }

    #[test]
    fn test_predicates_combine_with_and() {
        let filter = FacetFilter::from_params(&FilterParams {
            city: Some("Berlin".to_string()),
            country: Some("Austria".to_string()),
            ..params()
        });
        let index = create_test_index();

        assert!(!filter.matches(10, &create_test_record(Some(25), "Berlin", "Germany", &[]), &index));
    }

    #[test]
    fn test_empty_lists_are_dropped() {
        let filter = FacetFilter::from_params(&FilterParams {
            interests: Some(vec![]),
            languages: Some(vec![]),
            ..params()
        });
        assert!(filter.is_empty());
    }
}
