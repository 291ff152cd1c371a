use crate::models::{
    CandidateRecord, CandidateSet, FacetIndex, Interest, InterestTag, Language, Profile, TagId,
};
use crate::services::store::{CandidateStore, StoreError, DEFAULT_INTEREST_TAGS};
use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashMap};
use tokio::sync::RwLock;

#[derive(Debug, Default)]
struct Tables {
    profiles: BTreeMap<i32, Profile>,
    tag_catalog: BTreeMap<TagId, String>,
    language_catalog: BTreeMap<i32, Language>,
    /// User id -> (interest text, tag id), in insertion order
    interests: HashMap<i32, Vec<(String, TagId)>>,
    /// User id -> language ids
    languages: HashMap<i32, BTreeSet<i32>>,
}

/// Candidate store held entirely in memory.
///
/// Every read takes a single read lock, so snapshots are never torn by a
/// concurrent write.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store pre-loaded with the default interest-tag catalog (ids start at 1)
    pub fn with_default_catalog() -> Self {
        let tables = Tables {
            tag_catalog: DEFAULT_INTEREST_TAGS
                .iter()
                .enumerate()
                .map(|(i, tag)| (i as TagId + 1, tag.to_string()))
                .collect(),
            ..Tables::default()
        };

        Self {
            tables: RwLock::new(tables),
        }
    }

    pub async fn insert_profile(&self, profile: Profile) {
        self.tables
            .write()
            .await
            .profiles
            .insert(profile.user_id, profile);
    }

    pub async fn insert_tag(&self, id: TagId, name: &str) {
        self.tables
            .write()
            .await
            .tag_catalog
            .insert(id, name.to_string());
    }

    pub async fn insert_language(&self, language: Language) {
        self.tables
            .write()
            .await
            .language_catalog
            .insert(language.id, language);
    }

    /// Link tag ids to a user directly, bypassing the catalog lookup
    pub async fn link_tags(&self, user_id: i32, tags: &[TagId]) {
        let mut tables = self.tables.write().await;
        let links = tables.interests.entry(user_id).or_default();
        links.extend(tags.iter().map(|tag| (String::new(), *tag)));
    }
}

#[async_trait]
impl CandidateStore for InMemoryStore {
    async fn load_all_with_tags(&self) -> Result<CandidateSet, StoreError> {
        let tables = self.tables.read().await;

        Ok(tables
            .profiles
            .iter()
            .map(|(user_id, profile)| {
                let tags = tables
                    .interests
                    .get(user_id)
                    .map(|links| links.iter().map(|(_, tag)| *tag).collect())
                    .unwrap_or_default();
                (
                    *user_id,
                    CandidateRecord {
                        profile: profile.clone(),
                        tags,
                    },
                )
            })
            .collect())
    }

    async fn load_tags_for(&self, user_id: i32) -> Result<BTreeSet<TagId>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .interests
            .get(&user_id)
            .map(|links| links.iter().map(|(_, tag)| *tag).collect())
            .unwrap_or_default())
    }

    async fn load_profile(&self, user_id: i32) -> Result<Option<Profile>, StoreError> {
        Ok(self.tables.read().await.profiles.get(&user_id).cloned())
    }

    async fn load_facet_index(&self, include_languages: bool) -> Result<FacetIndex, StoreError> {
        let tables = self.tables.read().await;

        let mut languages = HashMap::new();
        if include_languages {
            for (user_id, ids) in &tables.languages {
                let names: BTreeSet<String> = ids
                    .iter()
                    .filter_map(|id| tables.language_catalog.get(id))
                    .map(|language| language.native_name.clone())
                    .collect();
                languages.insert(*user_id, names);
            }
        }

        Ok(FacetIndex {
            tag_names: tables
                .tag_catalog
                .iter()
                .map(|(id, name)| (*id, name.clone()))
                .collect(),
            languages,
        })
    }

    async fn load_tag_catalog(&self) -> Result<Vec<InterestTag>, StoreError> {
        Ok(self
            .tables
            .read()
            .await
            .tag_catalog
            .iter()
            .map(|(id, name)| InterestTag {
                id: *id,
                name: name.clone(),
            })
            .collect())
    }

    async fn load_interests_for(&self, user_id: i32) -> Result<Vec<Interest>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .interests
            .get(&user_id)
            .map(|links| {
                links
                    .iter()
                    .filter_map(|(name, tag)| {
                        tables.tag_catalog.get(tag).map(|tag| Interest {
                            name: name.clone(),
                            tag: tag.clone(),
                        })
                    })
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn replace_interests(&self, user_id: i32, interests: &[Interest]) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;

        let links: Vec<(String, TagId)> = interests
            .iter()
            .filter_map(|interest| {
                let tag_id = tables
                    .tag_catalog
                    .iter()
                    .find(|(_, name)| **name == interest.tag)
                    .map(|(id, _)| *id);
                if tag_id.is_none() {
                    tracing::debug!("Skipping interest with unknown tag: {}", interest.tag);
                }
                tag_id.map(|id| (interest.name.clone(), id))
            })
            .collect();

        tables.interests.insert(user_id, links);
        Ok(())
    }

    async fn load_languages_for(&self, user_id: i32) -> Result<Vec<Language>, StoreError> {
        let tables = self.tables.read().await;
        Ok(tables
            .languages
            .get(&user_id)
            .map(|ids| {
                ids.iter()
                    .filter_map(|id| tables.language_catalog.get(id).cloned())
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn replace_languages(&self, user_id: i32, native_names: &[String]) -> Result<(), StoreError> {
        let mut tables = self.tables.write().await;

        let ids: BTreeSet<i32> = tables
            .language_catalog
            .values()
            .filter(|language| native_names.contains(&language.native_name))
            .map(|language| language.id)
            .collect();

        tables.languages.insert(user_id, ids);
        Ok(())
    }

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}
