use std::{
    collections::{BTreeMap, HashMap, HashSet},
    fmt,
};

use chrono::{DateTime, Utc};
use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use super::ingredients::{escape_like, RecipeIngredient};
use super::tags::{RecipeTag, Tag};
use crate::errors::StoreError;

pub const RECIPE_NAME_LIMIT: usize = 256;
pub const MIN_COOKING_TIME: i32 = 1;
/// One day, in minutes.
pub const MAX_COOKING_TIME: i32 = 1440;
pub const MIN_AMOUNT: i32 = 1;
pub const MAX_AMOUNT: i32 = 9999;

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq, Eq)]
pub struct Recipe {
    pub recipe_id: Uuid,
    pub author_user_id: Uuid,
    pub name: String,
    pub text: String,
    pub cooking_time: i32, // minutes
    pub image_ref: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct IngredientAmount {
    pub ingredient_id: Uuid,
    pub amount: i32,
}

/// Everything an author submits when creating or replacing a recipe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeDraft {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image_ref: Option<String>,
    pub ingredients: Vec<IngredientAmount>,
    pub tag_ids: Vec<Uuid>,
}

/// Field name to messages, serialized as a JSON object.
#[derive(Debug, Default, Clone, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ValidationErrors(BTreeMap<&'static str, Vec<String>>);

impl ValidationErrors {
    pub fn add(&mut self, field: &'static str, message: impl Into<String>) {
        self.0.entry(field).or_default().push(message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn field(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, messages) in &self.0 {
            for message in messages {
                if !first {
                    f.write_str("; ")?;
                }
                write!(f, "{field}: {message}")?;
                first = false;
            }
        }

        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}

impl From<ValidationErrors> for StoreError {
    fn from(value: ValidationErrors) -> Self {
        StoreError::Invalid(value.to_string())
    }
}

fn duplicates<T: Copy + Eq + std::hash::Hash + Ord>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut seen = HashSet::new();
    let mut dups: Vec<T> = items.into_iter().filter(|i| !seen.insert(*i)).collect();
    dups.sort_unstable();
    dups.dedup();

    dups
}

fn join_ids(ids: &[Uuid]) -> String {
    ids.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

impl RecipeDraft {
    /// Checks everything that can be checked without the database.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        let mut errors = ValidationErrors::default();

        let name = self.name.trim();
        if name.is_empty() {
            errors.add("name", "Recipe name is required");
        } else if name.chars().count() > RECIPE_NAME_LIMIT {
            errors.add(
                "name",
                format!("Recipe name is longer than {RECIPE_NAME_LIMIT} characters"),
            );
        }

        if self.text.trim().is_empty() {
            errors.add("text", "Recipe text is required");
        }

        if !(MIN_COOKING_TIME..=MAX_COOKING_TIME).contains(&self.cooking_time) {
            errors.add(
                "cooking_time",
                format!(
                    "Cooking time must be between {MIN_COOKING_TIME} and {MAX_COOKING_TIME} minutes"
                ),
            );
        }

        if self.ingredients.is_empty() {
            errors.add("ingredients", "Add at least one ingredient");
        }
        let duplicate_ingredients = duplicates(self.ingredients.iter().map(|i| i.ingredient_id));
        if !duplicate_ingredients.is_empty() {
            errors.add(
                "ingredients",
                format!("Duplicate ingredients: {}", join_ids(&duplicate_ingredients)),
            );
        }
        for line in &self.ingredients {
            if !(MIN_AMOUNT..=MAX_AMOUNT).contains(&line.amount) {
                errors.add(
                    "ingredients",
                    format!(
                        "Amount for ingredient {} must be between {MIN_AMOUNT} and {MAX_AMOUNT}",
                        line.ingredient_id
                    ),
                );
            }
        }

        if self.tag_ids.is_empty() {
            errors.add("tags", "Add at least one tag");
        }
        let duplicate_tags = duplicates(self.tag_ids.iter().copied());
        if !duplicate_tags.is_empty() {
            errors.add(
                "tags",
                format!("Duplicate tags: {}", join_ids(&duplicate_tags)),
            );
        }

        errors.into_result()
    }

    async fn check_references(&self, conn: &mut PgConnection) -> Result<(), StoreError> {
        let mut errors = ValidationErrors::default();

        let ingredient_ids: Vec<Uuid> = self.ingredients.iter().map(|i| i.ingredient_id).collect();
        let known: HashSet<Uuid> = sqlx::query_scalar::<_, Uuid>(
            "SELECT ingredient_id FROM ingredients WHERE ingredient_id = ANY($1)",
        )
        .bind(&ingredient_ids)
        .fetch_all(&mut *conn)
        .await
        .map_err(StoreError::Database)?
        .into_iter()
        .collect();
        let missing: Vec<Uuid> = ingredient_ids
            .into_iter()
            .filter(|id| !known.contains(id))
            .collect();
        if !missing.is_empty() {
            errors.add(
                "ingredients",
                format!("Unknown ingredients: {}", join_ids(&missing)),
            );
        }

        let known: HashSet<Uuid> =
            sqlx::query_scalar::<_, Uuid>("SELECT tag_id FROM tags WHERE tag_id = ANY($1)")
                .bind(&self.tag_ids)
                .fetch_all(&mut *conn)
                .await
                .map_err(StoreError::Database)?
                .into_iter()
                .collect();
        let missing: Vec<Uuid> = self
            .tag_ids
            .iter()
            .copied()
            .filter(|id| !known.contains(id))
            .collect();
        if !missing.is_empty() {
            errors.add("tags", format!("Unknown tags: {}", join_ids(&missing)));
        }

        errors.into_result().map_err(StoreError::from)
    }

    async fn write_associations(
        &self,
        conn: &mut PgConnection,
        recipe_id: Uuid,
    ) -> Result<(), StoreError> {
        let ingredient_ids: Vec<Uuid> = self.ingredients.iter().map(|i| i.ingredient_id).collect();
        let amounts: Vec<i32> = self.ingredients.iter().map(|i| i.amount).collect();
        let display_order: Vec<i32> = (0..).take(self.ingredients.len()).collect();

        sqlx::query(
            "
            INSERT INTO recipe_ingredients (recipe_id, ingredient_id, amount, display_order)
            SELECT $1, line.ingredient_id, line.amount, line.display_order
            FROM UNNEST($2::uuid[], $3::int4[], $4::int4[])
                AS line (ingredient_id, amount, display_order)
            ",
        )
        .bind(recipe_id)
        .bind(&ingredient_ids)
        .bind(&amounts)
        .bind(&display_order)
        .execute(&mut *conn)
        .await?;

        sqlx::query(
            "
            INSERT INTO recipe_tags (recipe_id, tag_id)
            SELECT $1, tag_id FROM UNNEST($2::uuid[]) AS tag_id
            ",
        )
        .bind(recipe_id)
        .bind(&self.tag_ids)
        .execute(&mut *conn)
        .await?;

        Ok(())
    }
}

/// Narrows a recipe listing. Empty fields do not filter.
#[derive(Debug, Clone, Default)]
pub struct RecipeFilter {
    pub author_user_id: Option<Uuid>,
    /// Matches recipes carrying any of these tags.
    pub tag_slugs: Vec<String>,
    pub favorited_by: Option<Uuid>,
    pub in_cart_of: Option<Uuid>,
    /// Case-insensitive substring of the recipe name.
    pub name: Option<String>,
}

impl RecipeFilter {
    fn name_pattern(&self) -> Option<String> {
        self.name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .map(|name| format!("%{}%", escape_like(name)))
    }
}

const RECIPE_COLUMNS: &str = "r.recipe_id, r.author_user_id, r.name, r.text, r.cooking_time, r.image_ref, r.created_at, r.updated_at";

const FILTER_CLAUSE: &str = "
    ($1::uuid IS NULL OR r.author_user_id = $1)
    AND (cardinality($2::text[]) = 0 OR EXISTS (
        SELECT 1
        FROM recipe_tags rt
        JOIN tags t ON t.tag_id = rt.tag_id
        WHERE rt.recipe_id = r.recipe_id AND t.slug = ANY($2)
    ))
    AND ($3::uuid IS NULL OR EXISTS (
        SELECT 1 FROM favorites f WHERE f.recipe_id = r.recipe_id AND f.user_id = $3
    ))
    AND ($4::uuid IS NULL OR EXISTS (
        SELECT 1 FROM shopping_cart_entries c WHERE c.recipe_id = r.recipe_id AND c.user_id = $4
    ))
    AND ($5::text IS NULL OR r.name ILIKE $5 ESCAPE '\\')";

fn unique_name_error(name: &str) -> impl FnOnce(sqlx::Error) -> StoreError + '_ {
    move |e| match StoreError::from(e) {
        StoreError::AlreadyExists(_) => {
            StoreError::AlreadyExists(format!("You already have a recipe named {name:?}"))
        }
        other => other,
    }
}

impl Recipe {
    #[tracing::instrument(skip(pool, draft), fields(recipe.name = %draft.name), err)]
    pub async fn create(
        pool: &PgPool,
        author_user_id: Uuid,
        draft: &RecipeDraft,
    ) -> Result<Self, StoreError> {
        draft.validate()?;

        let mut transaction = pool.begin().await.map_err(StoreError::Database)?;

        draft.check_references(&mut *transaction).await?;

        let name = draft.name.trim();
        let recipe = sqlx::query_as::<_, Recipe>(&format!(
            "
            INSERT INTO recipes AS r (author_user_id, name, text, cooking_time, image_ref)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {RECIPE_COLUMNS}
            "
        ))
        .bind(author_user_id)
        .bind(name)
        .bind(&draft.text)
        .bind(draft.cooking_time)
        .bind(&draft.image_ref)
        .fetch_one(&mut *transaction)
        .await
        .map_err(unique_name_error(name))?;

        draft
            .write_associations(&mut *transaction, recipe.recipe_id)
            .await?;

        transaction.commit().await.map_err(StoreError::Database)?;

        Ok(recipe)
    }

    /// Replaces the recipe's fields, ingredient lines and tags.
    #[tracing::instrument(skip(self, pool, draft), fields(recipe.id = %self.recipe_id), err)]
    pub async fn update(&self, pool: &PgPool, draft: &RecipeDraft) -> Result<Self, StoreError> {
        draft.validate()?;

        let mut transaction = pool.begin().await.map_err(StoreError::Database)?;

        draft.check_references(&mut *transaction).await?;

        let name = draft.name.trim();
        let updated = sqlx::query_as::<_, Recipe>(&format!(
            "
            UPDATE recipes AS r
            SET name = $2,
                text = $3,
                cooking_time = $4,
                image_ref = $5,
                updated_at = NOW()
            WHERE r.recipe_id = $1
            RETURNING {RECIPE_COLUMNS}
            "
        ))
        .bind(self.recipe_id)
        .bind(name)
        .bind(&draft.text)
        .bind(draft.cooking_time)
        .bind(&draft.image_ref)
        .fetch_optional(&mut *transaction)
        .await
        .map_err(unique_name_error(name))?
        .ok_or_else(|| StoreError::NotFound("Recipe not found".to_string()))?;

        sqlx::query("DELETE FROM recipe_ingredients WHERE recipe_id = $1")
            .bind(self.recipe_id)
            .execute(&mut *transaction)
            .await?;
        sqlx::query("DELETE FROM recipe_tags WHERE recipe_id = $1")
            .bind(self.recipe_id)
            .execute(&mut *transaction)
            .await?;

        draft
            .write_associations(&mut *transaction, self.recipe_id)
            .await?;

        transaction.commit().await.map_err(StoreError::Database)?;

        Ok(updated)
    }

    /// Deletes the recipe; its lines, tags, cart entries and favorites go with it.
    #[tracing::instrument(skip(pool), err)]
    pub async fn delete(pool: &PgPool, recipe_id: Uuid) -> Result<(), StoreError> {
        let deleted = sqlx::query("DELETE FROM recipes WHERE recipe_id = $1")
            .bind(recipe_id)
            .execute(pool)
            .await?
            .rows_affected();

        if deleted == 0 {
            return Err(StoreError::NotFound("Recipe not found".to_string()));
        }

        Ok(())
    }

    pub async fn get_by_id(pool: &PgPool, recipe_id: Uuid) -> Result<Option<Self>> {
        let recipe = sqlx::query_as::<_, Recipe>(&format!(
            "
            SELECT {RECIPE_COLUMNS}
            FROM recipes r
            WHERE r.recipe_id = $1
            "
        ))
        .bind(recipe_id)
        .fetch_optional(pool)
        .await?;

        Ok(recipe)
    }

    /// Newest first. A `limit` of `None` returns every match.
    pub async fn list(
        pool: &PgPool,
        filter: &RecipeFilter,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<Vec<Self>> {
        let recipes = sqlx::query_as::<_, Recipe>(&format!(
            "
            SELECT {RECIPE_COLUMNS}
            FROM recipes r
            WHERE {FILTER_CLAUSE}
            ORDER BY r.created_at DESC, r.recipe_id DESC
            LIMIT $6 OFFSET $7
            "
        ))
        .bind(filter.author_user_id)
        .bind(&filter.tag_slugs)
        .bind(filter.favorited_by)
        .bind(filter.in_cart_of)
        .bind(filter.name_pattern())
        .bind(limit)
        .bind(offset)
        .fetch_all(pool)
        .await?;

        Ok(recipes)
    }

    pub async fn count(pool: &PgPool, filter: &RecipeFilter) -> Result<i64> {
        let count = sqlx::query_scalar::<_, i64>(&format!(
            "
            SELECT COUNT(*)
            FROM recipes r
            WHERE {FILTER_CLAUSE}
            "
        ))
        .bind(filter.author_user_id)
        .bind(&filter.tag_slugs)
        .bind(filter.favorited_by)
        .bind(filter.in_cart_of)
        .bind(filter.name_pattern())
        .fetch_one(pool)
        .await?;

        Ok(count)
    }

    /// Loads ingredient lines and tags for a page of recipes, keeping their order.
    pub async fn with_details(
        pool: &PgPool,
        recipes: Vec<Recipe>,
    ) -> Result<Vec<RecipeWithDetails>> {
        let ids: Vec<Uuid> = recipes.iter().map(|r| r.recipe_id).collect();

        let mut ingredients: HashMap<Uuid, Vec<RecipeIngredient>> = HashMap::new();
        for line in RecipeIngredient::get_by_recipes(pool, &ids).await? {
            ingredients.entry(line.recipe_id).or_default().push(line);
        }

        let mut tags: HashMap<Uuid, Vec<Tag>> = HashMap::new();
        for tag in RecipeTag::get_by_recipes(pool, &ids).await? {
            tags.entry(tag.recipe_id).or_default().push(tag.into());
        }

        Ok(recipes
            .into_iter()
            .map(|recipe| RecipeWithDetails {
                ingredients: ingredients.remove(&recipe.recipe_id).unwrap_or_default(),
                tags: tags.remove(&recipe.recipe_id).unwrap_or_default(),
                recipe,
            })
            .collect())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecipeWithDetails {
    pub recipe: Recipe,
    pub ingredients: Vec<RecipeIngredient>,
    pub tags: Vec<Tag>,
}
