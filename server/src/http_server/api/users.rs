use appkit::app_state::AppState as _;
use axum::{
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
    Json,
};
use color_eyre::eyre::Context;
use db::{
    cooking::{Recipe, RecipeFilter},
    relations::{self, Subscriptions},
    users::User,
    PgPool,
};
use serde::Deserialize;
use uuid::Uuid;

use super::{
    recipes::absent_entry_is_bad_request,
    views::{AuthorWithRecipes, RecipeSummary, UserProfile},
};
use crate::{
    http_server::{
        current_user::CurrentUser,
        errors::{not_found, WithStatus as _},
        pagination::{PageParams, Paginated},
        ResponseResult,
    },
    AppState,
};

impl AuthorWithRecipes {
    /// The author's newest recipes, at most `recipes_limit` of them.
    pub async fn load(
        pool: &PgPool,
        author: User,
        is_subscribed: bool,
        recipes_limit: Option<u32>,
    ) -> color_eyre::Result<Self> {
        let filter = RecipeFilter {
            author_user_id: Some(author.user_id),
            ..Default::default()
        };

        let recipes = Recipe::list(pool, &filter, recipes_limit.map(i64::from), 0).await?;
        let recipes_count = Recipe::count(pool, &filter).await?;

        Ok(Self {
            profile: UserProfile::new(author, is_subscribed),
            recipes: recipes.into_iter().map(RecipeSummary::from).collect(),
            recipes_count,
        })
    }
}

async fn load_user(state: &AppState, user_id: Uuid) -> ResponseResult<User> {
    User::get_by_id(state.db(), user_id)
        .await
        .context("Failed to fetch user")
        .with_status(StatusCode::INTERNAL_SERVER_ERROR)?
        .ok_or_else(|| not_found("User"))
}

#[axum_macros::debug_handler]
pub async fn list_users(
    viewer: Option<CurrentUser>,
    State(state): State<AppState>,
    uri: Uri,
    Query(params): Query<PageParams>,
) -> ResponseResult<Json<Paginated<UserProfile>>> {
    let page = params.page()?;

    let count = User::count(state.db())
        .await
        .context("Failed to count users")?;
    page.check_in_range(count)?;

    let users = User::list(state.db(), page.limit(), page.offset())
        .await
        .context("Failed to list users")?;
    let results = UserProfile::for_viewer(state.db(), viewer.map(|v| v.id()), users).await?;

    Ok(Json(Paginated::new(&state.app, &uri, page, count, results)))
}

#[axum_macros::debug_handler]
pub async fn get_user(
    viewer: Option<CurrentUser>,
    State(state): State<AppState>,
    Path(user_id): Path<Uuid>,
) -> ResponseResult<Json<UserProfile>> {
    let user = load_user(&state, user_id).await?;

    let mut profiles =
        UserProfile::for_viewer(state.db(), viewer.map(|v| v.id()), vec![user]).await?;

    profiles.pop().map(Json).ok_or_else(|| not_found("User"))
}

#[axum_macros::debug_handler(state = AppState)]
pub async fn me(user: CurrentUser) -> Json<UserProfile> {
    Json(UserProfile::new(user.user, false))
}

#[derive(Debug, Default, Deserialize)]
pub struct RecipesLimit {
    recipes_limit: Option<u32>,
}

#[axum_macros::debug_handler]
#[tracing::instrument(skip_all, fields(user.id = %user.id(), author.id = %author_id))]
pub async fn subscribe(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(author_id): Path<Uuid>,
    Query(query): Query<RecipesLimit>,
) -> ResponseResult<(StatusCode, Json<AuthorWithRecipes>)> {
    relations::add::<Subscriptions>(state.db(), user.id(), author_id).await?;

    let author = load_user(&state, author_id).await?;
    let view = AuthorWithRecipes::load(state.db(), author, true, query.recipes_limit)
        .await
        .context("Failed to load the author's recipes")?;

    Ok((StatusCode::CREATED, Json(view)))
}

#[axum_macros::debug_handler]
#[tracing::instrument(skip_all, fields(user.id = %user.id(), author.id = %author_id))]
pub async fn unsubscribe(
    user: CurrentUser,
    State(state): State<AppState>,
    Path(author_id): Path<Uuid>,
) -> ResponseResult<StatusCode> {
    relations::remove::<Subscriptions>(state.db(), user.id(), author_id)
        .await
        .map_err(absent_entry_is_bad_request)?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Default, Deserialize)]
pub struct SubscriptionsQuery {
    page: Option<u32>,
    limit: Option<u32>,
    recipes_limit: Option<u32>,
}

#[axum_macros::debug_handler]
pub async fn subscriptions(
    user: CurrentUser,
    State(state): State<AppState>,
    uri: Uri,
    Query(query): Query<SubscriptionsQuery>,
) -> ResponseResult<Json<Paginated<AuthorWithRecipes>>> {
    let page = PageParams {
        page: query.page,
        limit: query.limit,
    }
    .page()?;

    let count = User::count_subscribed_authors(state.db(), user.id())
        .await
        .context("Failed to count subscriptions")?;
    page.check_in_range(count)?;

    let authors =
        User::list_subscribed_authors(state.db(), user.id(), page.limit(), page.offset())
            .await
            .context("Failed to list subscriptions")?;

    let mut results = Vec::with_capacity(authors.len());
    for author in authors {
        results.push(
            AuthorWithRecipes::load(state.db(), author, true, query.recipes_limit)
                .await
                .context("Failed to load the author's recipes")?,
        );
    }

    Ok(Json(Paginated::new(&state.app, &uri, page, count, results)))
}
