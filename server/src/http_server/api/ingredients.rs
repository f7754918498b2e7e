use appkit::app_state::AppState as _;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use color_eyre::eyre::Context;
use db::cooking::Ingredient;
use serde::Deserialize;
use uuid::Uuid;

use super::views::IngredientView;
use crate::{
    http_server::{
        errors::{not_found, WithStatus as _},
        ResponseResult,
    },
    AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct IngredientSearch {
    name: Option<String>,
}

#[axum_macros::debug_handler]
pub async fn list_ingredients(
    State(state): State<AppState>,
    Query(search): Query<IngredientSearch>,
) -> ResponseResult<Json<Vec<IngredientView>>> {
    let prefix = search.name.as_deref().map(str::trim).filter(|n| !n.is_empty());

    let ingredients = Ingredient::search(state.db(), prefix)
        .await
        .context("Failed to search ingredients")?;

    Ok(Json(
        ingredients.into_iter().map(IngredientView::from).collect(),
    ))
}

#[axum_macros::debug_handler]
pub async fn get_ingredient(
    State(state): State<AppState>,
    Path(ingredient_id): Path<Uuid>,
) -> ResponseResult<Json<IngredientView>> {
    let ingredient = Ingredient::get_by_id(state.db(), ingredient_id)
        .await
        .context("Failed to fetch ingredient")
        .with_status(StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or_else(|| not_found("Ingredient"))?;

    Ok(Json(ingredient.into()))
}
