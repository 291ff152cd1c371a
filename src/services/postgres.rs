use crate::models::{
    CandidateRecord, CandidateSet, FacetIndex, Interest, InterestTag, Language, Profile, TagId,
};
use crate::services::store::{CandidateStore, StoreError, DEFAULT_INTEREST_TAGS};
use async_trait::async_trait;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::collections::btree_map::Entry;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::time::Duration;

const PROFILE_COLUMNS: &str = r#"
    ui.user_id, ui.first_name, ui.last_name, ui.age, ui.bio, ui.country,
    ui.city, ui.occupation, ui.photo, ui.interests
"#;

/// Raw `user_info` row
#[derive(Debug, sqlx::FromRow)]
struct ProfileRow {
    user_id: i32,
    first_name: String,
    last_name: String,
    age: Option<i32>,
    bio: Option<String>,
    country: Option<String>,
    city: Option<String>,
    occupation: Option<String>,
    photo: Option<Vec<u8>>,
    interests: Option<String>,
}

/// `user_info` LEFT JOIN `user_interests`: one row per (profile, tag)
#[derive(Debug, sqlx::FromRow)]
struct ProfileTagRow {
    #[sqlx(flatten)]
    profile: ProfileRow,
    interest_tag_id: Option<i32>,
}

impl TryFrom<ProfileRow> for Profile {
    type Error = StoreError;

    fn try_from(row: ProfileRow) -> Result<Self, Self::Error> {
        if row.user_id <= 0 {
            return Err(StoreError::InvalidRow(format!(
                "user_info.user_id must be positive, got {}",
                row.user_id
            )));
        }
        if matches!(row.age, Some(age) if age < 0) {
            return Err(StoreError::InvalidRow(format!(
                "negative age for user {}",
                row.user_id
            )));
        }

        Ok(Profile {
            user_id: row.user_id,
            first_name: row.first_name,
            last_name: row.last_name,
            age: row.age,
            bio: row.bio,
            country: row.country,
            city: row.city,
            occupation: row.occupation,
            photo: row.photo,
            interests: row.interests,
        })
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LanguageRow {
    id: i32,
    language: String,
    native_name: String,
}

impl From<LanguageRow> for Language {
    fn from(row: LanguageRow) -> Self {
        Language {
            id: row.id,
            language: row.language,
            native_name: row.native_name,
        }
    }
}

/// Fold (profile, tag) rows into a candidate set.
///
/// A profile that fails validation is skipped with a warning so one bad row
/// cannot fail every snapshot.
fn group_profile_rows(rows: Vec<ProfileTagRow>) -> CandidateSet {
    let mut candidates = CandidateSet::new();
    let mut rejected = HashSet::new();

    for row in rows {
        let user_id = row.profile.user_id;
        if rejected.contains(&user_id) {
            continue;
        }

        let tag = row.interest_tag_id;
        let record = match candidates.entry(user_id) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => match Profile::try_from(row.profile) {
                Ok(profile) => entry.insert(CandidateRecord {
                    profile,
                    tags: BTreeSet::new(),
                }),
                Err(e) => {
                    tracing::warn!("Skipping profile {}: {}", user_id, e);
                    rejected.insert(user_id);
                    continue;
                }
            },
        };
        if let Some(tag) = tag {
            record.tags.insert(tag);
        }
    }

    candidates
}

/// PostgreSQL-backed candidate store
///
/// The pool is deliberately small; requests beyond `max_connections` wait
/// for a free connection up to the acquire timeout.
pub struct PostgresStore {
    pool: PgPool,
}

impl PostgresStore {
    /// Create a new store from a connection string and run migrations
    pub async fn new(
        database_url: &str,
        max_connections: u32,
        min_connections: u32,
        acquire_timeout: Duration,
    ) -> Result<Self, StoreError> {
        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(acquire_timeout)
            .idle_timeout(Duration::from_secs(600))
            .test_before_acquire(true)
            .connect(database_url)
            .await?;

        // Run migrations on startup
        sqlx::migrate!("./migrations").run(&pool).await?;

        Ok(Self { pool })
    }

    /// Create a new store from settings
    pub async fn from_settings(
        url: &str,
        max_connections: Option<u32>,
        min_connections: Option<u32>,
        acquire_timeout_secs: Option<u64>,
    ) -> Result<Self, StoreError> {
        tracing::info!("Connecting to PostgreSQL");

        Self::new(
            url,
            max_connections.unwrap_or(3),
            min_connections.unwrap_or(1),
            Duration::from_secs(acquire_timeout_secs.unwrap_or(30)),
        )
        .await
    }

    /// Insert the predefined interest-tag catalog if the table is empty.
    ///
    /// Returns the number of tags inserted.
    pub async fn seed_interest_tags(&self) -> Result<u64, StoreError> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM interest_tags")
            .fetch_one(&self.pool)
            .await?;

        if count > 0 {
            tracing::debug!("Interest tag catalog already holds {} tags", count);
            return Ok(0);
        }

        let tags: Vec<String> = DEFAULT_INTEREST_TAGS.iter().map(|t| t.to_string()).collect();
        let result = sqlx::query(
            "INSERT INTO interest_tags (tag) SELECT * FROM UNNEST($1::text[]) ON CONFLICT (tag) DO NOTHING",
        )
        .bind(&tags)
        .execute(&self.pool)
        .await?;

        tracing::info!("Seeded {} interest tags", result.rows_affected());

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl CandidateStore for PostgresStore {
    async fn load_all_with_tags(&self) -> Result<CandidateSet, StoreError> {
        let query = format!(
            r#"
            SELECT {PROFILE_COLUMNS}, uit.interest_tag_id
            FROM user_info ui
            LEFT JOIN user_interests uit ON uit.user_id = ui.user_id
            ORDER BY ui.user_id
            "#
        );

        let rows: Vec<ProfileTagRow> = sqlx::query_as(&query).fetch_all(&self.pool).await?;

        let candidates = group_profile_rows(rows);

        tracing::debug!("Loaded {} candidates with tags", candidates.len());

        Ok(candidates)
    }

    async fn load_tags_for(&self, user_id: i32) -> Result<BTreeSet<TagId>, StoreError> {
        let rows: Vec<(i32,)> =
            sqlx::query_as("SELECT interest_tag_id FROM user_interests WHERE user_id = $1")
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?;

        Ok(rows.into_iter().map(|(tag,)| tag).collect())
    }

    async fn load_profile(&self, user_id: i32) -> Result<Option<Profile>, StoreError> {
        let query = format!("SELECT {PROFILE_COLUMNS} FROM user_info ui WHERE ui.user_id = $1");

        let row: Option<ProfileRow> = sqlx::query_as(&query)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Profile::try_from).transpose()
    }

    async fn load_facet_index(&self, include_languages: bool) -> Result<FacetIndex, StoreError> {
        let tag_names = self
            .load_tag_catalog()
            .await?
            .into_iter()
            .map(|tag| (tag.id, tag.name))
            .collect();

        if !include_languages {
            return Ok(FacetIndex {
                tag_names,
                languages: HashMap::new(),
            });
        }

        let rows: Vec<(i32, String)> = sqlx::query_as(
            r#"
            SELECT ul.user_id, l.native_name
            FROM user_languages ul
            JOIN languages l ON l.id = ul.language_id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        let mut languages: HashMap<i32, BTreeSet<String>> = HashMap::new();
        for (user_id, native_name) in rows {
            languages.entry(user_id).or_default().insert(native_name);
        }

        Ok(FacetIndex { tag_names, languages })
    }

    async fn load_tag_catalog(&self) -> Result<Vec<InterestTag>, StoreError> {
        let rows: Vec<(i32, String)> = sqlx::query_as("SELECT id, tag FROM interest_tags ORDER BY id")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows
            .into_iter()
            .map(|(id, name)| InterestTag { id, name })
            .collect())
    }

    async fn load_interests_for(&self, user_id: i32) -> Result<Vec<Interest>, StoreError> {
        let rows: Vec<(String, String)> = sqlx::query_as(
            r#"
            SELECT uit.interest, it.tag
            FROM user_interests uit
            JOIN interest_tags it ON it.id = uit.interest_tag_id
            WHERE uit.user_id = $1
            ORDER BY uit.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(name, tag)| Interest { name, tag })
            .collect())
    }

    async fn replace_interests(&self, user_id: i32, interests: &[Interest]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        sqlx::query("DELETE FROM user_interests WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for interest in interests {
            let tag_id: Option<(i32,)> = sqlx::query_as("SELECT id FROM interest_tags WHERE tag = $1")
                .bind(&interest.tag)
                .fetch_optional(&mut *tx)
                .await?;

            let Some((tag_id,)) = tag_id else {
                tracing::debug!("Skipping interest with unknown tag: {}", interest.tag);
                continue;
            };

            sqlx::query(
                "INSERT INTO user_interests (user_id, interest, interest_tag_id) VALUES ($1, $2, $3)",
            )
            .bind(user_id)
            .bind(&interest.name)
            .bind(tag_id)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    async fn load_languages_for(&self, user_id: i32) -> Result<Vec<Language>, StoreError> {
        let rows: Vec<LanguageRow> = sqlx::query_as(
            r#"
            SELECT l.id, l.language, l.native_name
            FROM user_languages ul
            JOIN languages l ON l.id = ul.language_id
            WHERE ul.user_id = $1
            ORDER BY l.id
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Language::from).collect())
    }

    async fn replace_languages(&self, user_id: i32, native_names: &[String]) -> Result<(), StoreError> {
        let mut tx = self.pool.begin().await?;

        let language_ids: Vec<(i32,)> =
            sqlx::query_as("SELECT id FROM languages WHERE native_name = ANY($1)")
                .bind(native_names)
                .fetch_all(&mut *tx)
                .await?;

        sqlx::query("DELETE FROM user_languages WHERE user_id = $1")
            .bind(user_id)
            .execute(&mut *tx)
            .await?;

        for (language_id,) in language_ids {
            sqlx::query("INSERT INTO user_languages (user_id, language_id) VALUES ($1, $2)")
                .bind(user_id)
                .bind(language_id)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        Ok(())
    }

    /// Health check for the database connection
    async fn health_check(&self) -> Result<bool, StoreError> {
        sqlx::query("SELECT 1")
            .fetch_one(&self.pool)
            .await
            .map(|_| true)
            .map_err(Into::into)
    }
}
