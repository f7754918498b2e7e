use appkit::app_state::AppState as _;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use color_eyre::eyre::{eyre, Context};
use db::{
    cooking::{IngredientAmount, Recipe, RecipeDraft, RecipeFilter, ShoppingList},
    relations::{self, Favorites, Relation, ShoppingCart},
    StoreError,
};
use serde::Deserialize;
use uuid::Uuid;

use super::views::{RecipeSummary, RecipeView};
use crate::{
    http_server::{
        current_user::CurrentUser,
        errors::{not_found, ApiJson, ServerError, WithStatus as _},
        pagination::{PageParams, Paginated},
        ResponseResult,
    },
    shopping_list::ExportFormat,
    AppState,
};

#[derive(Debug, Deserialize)]
pub struct IngredientAmountPayload {
    pub id: Uuid,
    pub amount: i32,
}

#[derive(Debug, Deserialize)]
pub struct RecipePayload {
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    #[serde(default)]
    pub image: Option<String>,
    pub ingredients: Vec<IngredientAmountPayload>,
    pub tags: Vec<Uuid>,
}

impl From<RecipePayload> for RecipeDraft {
    fn from(payload: RecipePayload) -> Self {
        Self {
            name: payload.name,
            text: payload.text,
            cooking_time: payload.cooking_time,
            image_ref: payload.image,
            ingredients: payload
                .ingredients
                .into_iter()
                .map(|line| IngredientAmount {
                    ingredient_id: line.id,
                    amount: line.amount,
                })
                .collect(),
            tag_ids: payload.tags,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RecipeListQuery {
    page: Option<u32>,
    limit: Option<u32>,
    author: Option<Uuid>,
    name: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
    is_favorited: Option<String>,
    is_in_shopping_cart: Option<String>,
}

fn is_set(flag: Option<&str>) -> bool {
    matches!(flag, Some("1" | "true"))
}

impl RecipeListQuery {
    fn filter(&self, viewer: Option<Uuid>) -> RecipeFilter {
        RecipeFilter {
            author_user_id: self.author,
            tag_slugs: self.tags.clone(),
            favorited_by: viewer.filter(|_| is_set(self.is_favorited.as_deref())),
            in_cart_of: viewer.filter(|_| is_set(self.is_in_shopping_cart.as_deref())),
            name: self.name.clone(),
        }
    }
}

async fn load_recipe(state: &AppState, recipe_id: Uuid) -> ResponseResult<Recipe> {
    Recipe::get_by_id(state.db(), recipe_id)
        .await
        .context("Failed to fetch recipe")
        .with_status(StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or_else(|| not_found("Recipe"))
}

async fn view_of(
    state: &AppState,
    viewer: Option<Uuid>,
    recipe: Recipe,
) -> ResponseResult<RecipeView> {
    RecipeView::load(state.db(), viewer, vec![recipe])
        .await
        .context("Failed to load recipe details")?
        .pop()
        .ok_or_else(|| not_found("Recipe"))
}

fn ensure_author(recipe: &Recipe, user: &CurrentUser) -> ResponseResult<()> {
    if recipe.author_user_id != user.id() {
        return Err(ServerError(
            eyre!("Only the author can change this recipe"),
            StatusCode::FORBIDDEN,
        ));
    }

    Ok(())
}

#[axum_macros::debug_handler]
#[tracing::instrument(skip_all)]
pub async fn list_recipes(
    viewer: Option<CurrentUser>,
    State(state): State<AppState>,
    uri: Uri,
    axum_extra::extract::Query(query): axum_extra::extract::Query<RecipeListQuery>,
) -> ResponseResult<Json<Paginated<RecipeView>>> {
    let viewer = viewer.map(|v| v.id());
    let page = PageParams {
        page: query.page,
        limit: query.limit,
    }
    .page()?;
    let filter = query.filter(viewer);

    let count = Recipe::count(state.db(), &filter)
        .await
        .context("Failed to count recipes")?;
    page.check_in_range(count)?;

    let recipes = Recipe::list(state.db(), &filter, Some(page.limit()), page.offset())
        .await
        .context("Failed to list recipes")?;
    let results = RecipeView::load(state.db(), viewer, recipes)
        .await
        .context("Failed to load recipe details")?;

    Ok(Json(Paginated::new(&state.app, &uri, page, count, results)))
}

#[axum_macros::debug_handler]
#[tracing::instrument(skip_all, fields(user.id = %user.id()))]
pub async fn create_recipe(
    user: CurrentUser,
    State(state): State<AppState>,
    ApiJson(payload): ApiJson<RecipePayload>,
) -> ResponseResult<impl IntoResponse> {
    let draft = RecipeDraft::from(payload);
    draft.validate()?;

    let recipe = Recipe::create(state.db(), user.id(), &draft).await?;
    let view = view_of(&state, Some(user.id()), recipe).await?;

    Ok((StatusCode::CREATED, Json(view)))
}

#[axum_macros::debug_handler]
pub async fn get_recipe(
    viewer: Option<CurrentUser>,
    State(state): State<AppState>,
    Path(recipe_id): Path<Uuid>,
) -> ResponseResult<Json<RecipeView>> {
    let recipe = load_recipe(&state, recipe_id).await?;

    Ok(Json(
        view_of(&state, viewer.map(|v| v.id()), recipe).await?,
    ))
}

#[axum_macros::debug_handler]
#[tracing::instrument(skip_all, fields(user.id = %user.id(), recipe.id = %recipe_id))]
pub async fn update_recipe(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<Uuid>,
    ApiJson(payload): ApiJson<RecipePayload>,
) -> ResponseResult<Json<RecipeView>> {
    let recipe = load_recipe(&state, recipe_id).await?;
    ensure_author(&recipe, &user)?;

    let draft = RecipeDraft::from(payload);
    draft.validate()?;

    let updated = recipe.update(state.db(), &draft).await?;

    Ok(Json(view_of(&state, Some(user.id()), updated).await?))
}

#[axum_macros::debug_handler]
#[tracing::instrument(skip_all, fields(user.id = %user.id(), recipe.id = %recipe_id))]
pub async fn delete_recipe(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<Uuid>,
) -> ResponseResult<StatusCode> {
    let recipe = load_recipe(&state, recipe_id).await?;
    ensure_author(&recipe, &user)?;

    Recipe::delete(state.db(), recipe.recipe_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[axum_macros::debug_handler]
pub async fn get_link(
    State(state): State<AppState>,
    Path(recipe_id): Path<Uuid>,
) -> ResponseResult<Json<serde_json::Value>> {
    let recipe = load_recipe(&state, recipe_id).await?;

    let link = state
        .app
        .app_url(&format!("/api/recipes/{}/", recipe.recipe_id), None);

    Ok(Json(serde_json::json!({ "short-link": link })))
}

async fn add_recipe_to<R: Relation>(
    state: &AppState,
    user: &CurrentUser,
    recipe_id: Uuid,
) -> ResponseResult<(StatusCode, Json<RecipeSummary>)> {
    relations::add::<R>(state.db(), user.id(), recipe_id).await?;

    let recipe = load_recipe(state, recipe_id).await?;

    Ok((StatusCode::CREATED, Json(RecipeSummary::from(recipe))))
}

/// Removing an entry that is not there is the caller's mistake, not a missing resource.
pub(crate) fn absent_entry_is_bad_request(err: StoreError) -> ServerError {
    match err {
        StoreError::NotFound(message) => ServerError(eyre!(message), StatusCode::BAD_REQUEST),
        other => other.into(),
    }
}

async fn remove_recipe_from<R: Relation>(
    state: &AppState,
    user: &CurrentUser,
    recipe_id: Uuid,
) -> ResponseResult<StatusCode> {
    relations::remove::<R>(state.db(), user.id(), recipe_id)
        .await
        .map_err(absent_entry_is_bad_request)?;

    Ok(StatusCode::NO_CONTENT)
}

#[axum_macros::debug_handler]
#[tracing::instrument(skip_all, fields(user.id = %user.id(), recipe.id = %recipe_id))]
pub async fn add_to_shopping_cart(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<Uuid>,
) -> ResponseResult<(StatusCode, Json<RecipeSummary>)> {
    add_recipe_to::<ShoppingCart>(&state, &user, recipe_id).await
}

#[axum_macros::debug_handler]
#[tracing::instrument(skip_all, fields(user.id = %user.id(), recipe.id = %recipe_id))]
pub async fn remove_from_shopping_cart(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<Uuid>,
) -> ResponseResult<StatusCode> {
    remove_recipe_from::<ShoppingCart>(&state, &user, recipe_id).await
}

#[axum_macros::debug_handler]
#[tracing::instrument(skip_all, fields(user.id = %user.id(), recipe.id = %recipe_id))]
pub async fn add_to_favorites(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<Uuid>,
) -> ResponseResult<(StatusCode, Json<RecipeSummary>)> {
    add_recipe_to::<Favorites>(&state, &user, recipe_id).await
}

#[axum_macros::debug_handler]
#[tracing::instrument(skip_all, fields(user.id = %user.id(), recipe.id = %recipe_id))]
pub async fn remove_from_favorites(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(recipe_id): Path<Uuid>,
) -> ResponseResult<StatusCode> {
    remove_recipe_from::<Favorites>(&state, &user, recipe_id).await
}

#[derive(Debug, Default, Deserialize)]
pub struct DownloadQuery {
    format: Option<String>,
}

#[axum_macros::debug_handler]
#[tracing::instrument(skip_all, fields(user.id = %user.id()))]
pub async fn download_shopping_cart(
    user: CurrentUser,
    State(state): State<AppState>,
    Query(query): Query<DownloadQuery>,
) -> ResponseResult<Response> {
    let format = query
        .format
        .as_deref()
        .map(str::parse::<ExportFormat>)
        .transpose()
        .with_status(StatusCode::BAD_REQUEST)?
        .unwrap_or_default();

    let list = ShoppingList::for_user(state.db(), user.id())
        .await
        .context("Failed to build the shopping list")?;
    let body = format.render(&list)?;

    Ok((
        [
            (header::CONTENT_TYPE, format.content_type().to_string()),
            (header::CONTENT_DISPOSITION, format.content_disposition()),
        ],
        body,
    )
        .into_response())
}
