use appkit::app_state::AppState as _;
use axum::{
    extract::{Path, State},
    Json,
};
use color_eyre::eyre::Context;
use db::cooking::Tag;
use uuid::Uuid;

use super::views::TagView;
use crate::{
    http_server::{errors::not_found, ResponseResult},
    AppState,
};

#[axum_macros::debug_handler]
pub async fn list_tags(State(state): State<AppState>) -> ResponseResult<Json<Vec<TagView>>> {
    let tags = Tag::list_all(state.db())
        .await
        .context("Failed to list tags")?;

    Ok(Json(tags.into_iter().map(TagView::from).collect()))
}

#[axum_macros::debug_handler]
pub async fn get_tag(
    State(state): State<AppState>,
    Path(tag_id): Path<Uuid>,
) -> ResponseResult<Json<TagView>> {
    let tag = Tag::get_by_id(state.db(), tag_id)
        .await
        .context("Failed to fetch tag")?
        .ok_or_else(|| not_found("Tag"))?;

    Ok(Json(tag.into()))
}
