//! Totals of every ingredient needed for the recipes in a user's cart.
//!
//! Lines are grouped by the exact `(name, measurement_unit)` pair, so
//! `Flour (g)` and `flour (g)` stay separate, as do `Flour (g)` and
//! `Flour (kg)`. Nothing here writes to the database.

use std::collections::BTreeMap;

use color_eyre::Result;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// One ingredient line of one recipe in the cart.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq, Eq)]
pub struct CartLine {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

impl CartLine {
    pub async fn for_user(pool: &PgPool, user_id: Uuid) -> Result<Vec<Self>> {
        let lines = sqlx::query_as::<_, CartLine>(
            "
            SELECT i.name, i.measurement_unit, ri.amount
            FROM shopping_cart_entries c
            JOIN recipe_ingredients ri ON ri.recipe_id = c.recipe_id
            JOIN ingredients i ON i.ingredient_id = ri.ingredient_id
            WHERE c.user_id = $1
            ",
        )
        .bind(user_id)
        .fetch_all(pool)
        .await?;

        Ok(lines)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShoppingListItem {
    pub name: String,
    pub measurement_unit: String,
    pub total_amount: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShoppingList {
    /// Sorted by name, then unit.
    pub items: Vec<ShoppingListItem>,
}

impl ShoppingList {
    pub fn aggregate(lines: impl IntoIterator<Item = CartLine>) -> Self {
        let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();
        for line in lines {
            *totals
                .entry((line.name, line.measurement_unit))
                .or_default() += i64::from(line.amount);
        }

        let items = totals
            .into_iter()
            .map(|((name, measurement_unit), total_amount)| ShoppingListItem {
                name,
                measurement_unit,
                total_amount,
            })
            .collect();

        Self { items }
    }

    #[tracing::instrument(skip(pool), err)]
    pub async fn for_user(pool: &PgPool, user_id: Uuid) -> Result<Self> {
        let lines = CartLine::for_user(pool, user_id).await?;
        let list = Self::aggregate(lines);

        tracing::debug!(items = list.items.len(), "Aggregated shopping list");

        Ok(list)
    }
}
