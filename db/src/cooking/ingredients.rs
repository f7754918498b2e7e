use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::errors::StoreError;

pub const INGREDIENT_NAME_LIMIT: usize = 128;
pub const MEASUREMENT_UNIT_LIMIT: usize = 64;

/// Catalog entry; reference data that recipes point at.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq, Eq)]
pub struct Ingredient {
    pub ingredient_id: Uuid,
    pub name: String,
    pub measurement_unit: String,
}

/// Escapes `LIKE` wildcards so user input only ever matches literally.
pub(crate) fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(c);
    }

    escaped
}

fn like_prefix(prefix: &str) -> String {
    format!("{}%", escape_like(prefix))
}

impl Ingredient {
    /// Inserts the pair unless it is already in the catalog.
    ///
    /// Returns `None` when the (name, unit) pair already existed.
    pub async fn create_if_missing(
        pool: &PgPool,
        name: &str,
        measurement_unit: &str,
    ) -> Result<Option<Self>, StoreError> {
        let name = name.trim();
        let measurement_unit = measurement_unit.trim();

        if name.is_empty() || measurement_unit.is_empty() {
            return Err(StoreError::Invalid(
                "Ingredient name and measurement unit are required".to_string(),
            ));
        }
        if name.chars().count() > INGREDIENT_NAME_LIMIT {
            return Err(StoreError::Invalid(format!(
                "Ingredient name is longer than {INGREDIENT_NAME_LIMIT} characters"
            )));
        }
        if measurement_unit.chars().count() > MEASUREMENT_UNIT_LIMIT {
            return Err(StoreError::Invalid(format!(
                "Measurement unit is longer than {MEASUREMENT_UNIT_LIMIT} characters"
            )));
        }

        let ingredient = sqlx::query_as::<_, Ingredient>(
            "
            INSERT INTO ingredients (name, measurement_unit)
            VALUES ($1, $2)
            ON CONFLICT (name, measurement_unit) DO NOTHING
            RETURNING ingredient_id, name, measurement_unit
            ",
        )
        .bind(name)
        .bind(measurement_unit)
        .fetch_optional(pool)
        .await?;

        Ok(ingredient)
    }

    pub async fn get_by_id(pool: &PgPool, ingredient_id: Uuid) -> Result<Option<Self>> {
        let ingredient = sqlx::query_as::<_, Ingredient>(
            "
            SELECT ingredient_id, name, measurement_unit
            FROM ingredients
            WHERE ingredient_id = $1
            ",
        )
        .bind(ingredient_id)
        .fetch_optional(pool)
        .await?;

        Ok(ingredient)
    }

    /// Catalog lookup by case-insensitive name prefix, or the whole catalog
    /// when `prefix` is `None`.
    pub async fn search(pool: &PgPool, prefix: Option<&str>) -> Result<Vec<Self>> {
        let pattern = prefix.map(like_prefix);

        let ingredients = sqlx::query_as::<_, Ingredient>(
            r"
            SELECT ingredient_id, name, measurement_unit
            FROM ingredients
            WHERE $1::text IS NULL OR LOWER(name) LIKE LOWER($1) ESCAPE '\'
            ORDER BY name, measurement_unit
            ",
        )
        .bind(pattern)
        .fetch_all(pool)
        .await?;

        Ok(ingredients)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq, Eq)]
pub struct RecipeIngredient {
    pub recipe_ingredient_id: Uuid,
    pub recipe_id: Uuid,
    pub ingredient_id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
    pub display_order: i32,
}

impl RecipeIngredient {
    /// Ingredient lines of every recipe in `recipe_ids`, in display order.
    pub async fn get_by_recipes(pool: &PgPool, recipe_ids: &[Uuid]) -> Result<Vec<Self>> {
        let ingredients = sqlx::query_as::<_, RecipeIngredient>(
            "
            SELECT
                ri.recipe_ingredient_id,
                ri.recipe_id,
                ri.ingredient_id,
                i.name,
                i.measurement_unit,
                ri.amount,
                ri.display_order
            FROM recipe_ingredients ri
            JOIN ingredients i ON i.ingredient_id = ri.ingredient_id
            WHERE ri.recipe_id = ANY($1)
            ORDER BY ri.recipe_id, ri.display_order
            ",
        )
        .bind(recipe_ids)
        .fetch_all(pool)
        .await?;

        Ok(ingredients)
    }
}
