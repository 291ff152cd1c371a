use crate::models::{CandidateSet, FacetIndex, Interest, InterestTag, Language, Profile, TagId};
use async_trait::async_trait;
use std::collections::BTreeSet;
use thiserror::Error;

/// Errors raised by a candidate store
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("SQLx error: {0}")]
    SqlxError(#[from] sqlx::Error),

    #[error("Migration error: {0}")]
    MigrateError(#[from] sqlx::migrate::MigrateError),

    #[error("Invalid row: {0}")]
    InvalidRow(String),
}

/// Read (and CRUD-side write) access to profiles, tags and languages.
///
/// The recommendation core only reads through this trait. Writes exist for
/// the profile-editing layer that sits next to it.
#[async_trait]
pub trait CandidateStore: Send + Sync {
    /// Every profile with its interest-tag set. A profile's tag set is
    /// read together with the profile, never from a separate snapshot.
    async fn load_all_with_tags(&self) -> Result<CandidateSet, StoreError>;

    async fn load_tags_for(&self, user_id: i32) -> Result<BTreeSet<TagId>, StoreError>;

    async fn load_profile(&self, user_id: i32) -> Result<Option<Profile>, StoreError>;

    /// Tag names and spoken languages used by the facet filter.
    ///
    /// The language table is only read when `include_languages` is set.
    async fn load_facet_index(&self, include_languages: bool) -> Result<FacetIndex, StoreError>;

    async fn load_tag_catalog(&self) -> Result<Vec<InterestTag>, StoreError>;

    async fn load_interests_for(&self, user_id: i32) -> Result<Vec<Interest>, StoreError>;

    /// Replace a user's interests. Interests whose tag is not in the
    /// catalog are skipped.
    async fn replace_interests(&self, user_id: i32, interests: &[Interest]) -> Result<(), StoreError>;

    async fn load_languages_for(&self, user_id: i32) -> Result<Vec<Language>, StoreError>;

    /// Replace a user's spoken languages by native name. Unknown names are skipped.
    async fn replace_languages(&self, user_id: i32, native_names: &[String]) -> Result<(), StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError>;
}

/// Interest-tag catalog seeded once at system initialization
pub const DEFAULT_INTEREST_TAGS: &[&str] = &[
    "Видео", "Чтение", "Искусство", "Фотография", "Декоративно-прикладное искусство", "Ремесла",
    "Музыка", "Вокал", "Игра на музыкальных инструментах", "Диджеинг", "Композиция",
    "Командный спорт", "Индивидуальный спорт", "Экстремальный спорт", "Фитнес", "Единоборства",
    "Туризм", "Программирование", "Искусственный интеллект", "Робототехника",
    "Естественные науки", "Космос", "Электроника", "Кулинария", "Выпечка", "Национальные кухни",
    "Здоровое питание", "Напитки", "Садоводство", "Цветоводство", "Животные", "Экология",
    "Охота и рыбалка", "Литература", "Писательство", "Поэзия", "Блогинг", "Журналистика", "Кино",
    "Видеосъемка", "Анимация", "Подкасты", "Настольные игры", "Компьютерные игры",
    "Ролевые игры", "Интеллектуальные игры", "Путешествия", "Кемпинг", "Экотуризм",
    "Гастрономический туризм", "Мода", "Стиль", "Бьюти", "Татуировки и пирсинг", "Психология",
    "Саморазвитие", "Медитация", "Коучинг", "История", "Археология", "Философия", "Религия",
    "Архитектура", "Автомобили", "Мотоциклы", "Авиация", "Железная дорога",
    "Предпринимательство", "Инвестиции", "Маркетинг", "Фриланс", "Изучение языков",
    "Образование", "Наука", "Лингвистика", "Волонтерство", "Политика", "Социология",
    "Права человека", "Здоровый образ жизни", "Медицина", "Диетология", "Семья",
    "Воспитание детей", "Домоводство", "Дизайн интерьера", "Коллекционирование", "Косплей",
    "Головоломки", "Фокусы",
];
