use axum::{
    routing::{get, post},
    Router,
};

use super::{
    api::{ingredients, recipes, tags, users},
    versions,
};
use crate::AppState;

pub(crate) fn make_router() -> Router<AppState> {
    Router::new()
        .route("/_", get(versions))
        .route("/api/ingredients/", get(ingredients::list_ingredients))
        .route(
            "/api/ingredients/{ingredient_id}/",
            get(ingredients::get_ingredient),
        )
        .route("/api/tags/", get(tags::list_tags))
        .route("/api/tags/{tag_id}/", get(tags::get_tag))
        .route(
            "/api/recipes/",
            get(recipes::list_recipes).post(recipes::create_recipe),
        )
        .route(
            "/api/recipes/download_shopping_cart/",
            get(recipes::download_shopping_cart),
        )
        .route(
            "/api/recipes/{recipe_id}/",
            get(recipes::get_recipe)
                .patch(recipes::update_recipe)
                .delete(recipes::delete_recipe),
        )
        .route("/api/recipes/{recipe_id}/get-link/", get(recipes::get_link))
        .route(
            "/api/recipes/{recipe_id}/shopping_cart/",
            post(recipes::add_to_shopping_cart).delete(recipes::remove_from_shopping_cart),
        )
        .route(
            "/api/recipes/{recipe_id}/favorite/",
            post(recipes::add_to_favorites).delete(recipes::remove_from_favorites),
        )
        .route("/api/users/", get(users::list_users))
        .route("/api/users/me/", get(users::me))
        .route("/api/users/subscriptions/", get(users::subscriptions))
        .route("/api/users/{user_id}/", get(users::get_user))
        .route(
            "/api/users/{user_id}/subscribe/",
            post(users::subscribe).delete(users::unsubscribe),
        )
}
