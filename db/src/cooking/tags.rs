use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::StoreError;

pub const TAG_NAME_LIMIT: usize = 32;
pub const TAG_SLUG_LIMIT: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq, Eq)]
pub struct Tag {
    pub tag_id: Uuid,
    pub name: String,
    pub slug: String,
}

/// Lowercase ASCII alphanumerics with every other run collapsed to `-`.
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
        } else if c == '_' {
            slug.push('_');
        } else if !slug.is_empty() && !slug.ends_with('-') {
            slug.push('-');
        }
    }

    slug.trim_end_matches('-').to_string()
}

impl Tag {
    pub async fn create(pool: &PgPool, name: &str, slug: Option<&str>) -> Result<Self, StoreError> {
        let name = name.trim();
        let slug = slug.map_or_else(|| slugify(name), ToString::to_string);

        if name.is_empty() || name.chars().count() > TAG_NAME_LIMIT {
            return Err(StoreError::Invalid(format!(
                "Tag name must be between 1 and {TAG_NAME_LIMIT} characters"
            )));
        }
        if slug.is_empty()
            || slug.len() > TAG_SLUG_LIMIT
            || !slug
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(StoreError::Invalid(format!(
                "Tag slug must be 1 to {TAG_SLUG_LIMIT} latin letters, digits, hyphens or underscores, got {slug:?}"
            )));
        }

        let tag = sqlx::query_as::<_, Tag>(
            "
            INSERT INTO tags (name, slug)
            VALUES ($1, $2)
            RETURNING tag_id, name, slug
            ",
        )
        .bind(name)
        .bind(&slug)
        .fetch_one(pool)
        .await
        .map_err(|e| match StoreError::from(e) {
            StoreError::AlreadyExists(_) => {
                StoreError::AlreadyExists(format!("Tag {name:?} or slug {slug:?} already exists"))
            }
            other => other,
        })?;

        Ok(tag)
    }

    pub async fn get_by_id(pool: &PgPool, tag_id: Uuid) -> Result<Option<Self>> {
        let tag = sqlx::query_as::<_, Tag>(
            "
            SELECT tag_id, name, slug
            FROM tags
            WHERE tag_id = $1
            ",
        )
        .bind(tag_id)
        .fetch_optional(pool)
        .await?;

        Ok(tag)
    }

    pub async fn list_all(pool: &PgPool) -> Result<Vec<Self>> {
        let tags = sqlx::query_as::<_, Tag>(
            "
            SELECT tag_id, name, slug
            FROM tags
            ORDER BY name
            ",
        )
        .fetch_all(pool)
        .await?;

        Ok(tags)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct RecipeTag {
    pub recipe_id: Uuid,
    pub tag_id: Uuid,
    pub name: String,
    pub slug: String,
}

impl RecipeTag {
    pub async fn get_by_recipes(pool: &PgPool, recipe_ids: &[Uuid]) -> Result<Vec<Self>> {
        let tags = sqlx::query_as::<_, RecipeTag>(
            "
            SELECT rt.recipe_id, t.tag_id, t.name, t.slug
            FROM recipe_tags rt
            JOIN tags t ON t.tag_id = rt.tag_id
            WHERE rt.recipe_id = ANY($1)
            ORDER BY t.name
            ",
        )
        .bind(recipe_ids)
        .fetch_all(pool)
        .await?;

        Ok(tags)
    }
}

impl From<RecipeTag> for Tag {
    fn from(value: RecipeTag) -> Self {
        Self {
            tag_id: value.tag_id,
            name: value.name,
            slug: value.slug,
        }
    }
}
