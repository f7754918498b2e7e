//! JSON shapes returned by the API and the loaders that fill them.

use std::collections::{HashMap, HashSet};

use db::{
    cooking::{Ingredient, Recipe, RecipeIngredient, Tag},
    relations::{contained_in, Favorites, ShoppingCart, Subscriptions},
    users::User,
    PgPool,
};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub email: String,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub is_subscribed: bool,
}

impl UserProfile {
    pub fn new(user: User, is_subscribed: bool) -> Self {
        Self {
            id: user.user_id,
            email: user.email,
            username: user.username,
            first_name: user.first_name,
            last_name: user.last_name,
            is_subscribed,
        }
    }

    /// Profiles for `users`, with `is_subscribed` as seen by `viewer`.
    pub async fn for_viewer(
        pool: &PgPool,
        viewer: Option<Uuid>,
        users: Vec<User>,
    ) -> color_eyre::Result<Vec<Self>> {
        let subscribed: HashSet<Uuid> = match viewer {
            Some(viewer) => {
                let ids: Vec<Uuid> = users.iter().map(|u| u.user_id).collect();
                contained_in::<Subscriptions>(pool, viewer, &ids)
                    .await?
                    .into_iter()
                    .collect()
            }
            None => HashSet::new(),
        };

        Ok(users
            .into_iter()
            .map(|user| {
                let is_subscribed = subscribed.contains(&user.user_id);
                Self::new(user, is_subscribed)
            })
            .collect())
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TagView {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
}

impl From<Tag> for TagView {
    fn from(tag: Tag) -> Self {
        Self {
            id: tag.tag_id,
            name: tag.name,
            slug: tag.slug,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IngredientView {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
}

impl From<Ingredient> for IngredientView {
    fn from(ingredient: Ingredient) -> Self {
        Self {
            id: ingredient.ingredient_id,
            name: ingredient.name,
            measurement_unit: ingredient.measurement_unit,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct IngredientLineView {
    pub id: Uuid,
    pub name: String,
    pub measurement_unit: String,
    pub amount: i32,
}

impl From<RecipeIngredient> for IngredientLineView {
    fn from(line: RecipeIngredient) -> Self {
        Self {
            id: line.ingredient_id,
            name: line.name,
            measurement_unit: line.measurement_unit,
            amount: line.amount,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RecipeView {
    pub id: Uuid,
    pub author: UserProfile,
    pub name: String,
    pub text: String,
    pub cooking_time: i32,
    pub image: Option<String>,
    pub tags: Vec<TagView>,
    pub ingredients: Vec<IngredientLineView>,
    pub is_favorited: bool,
    pub is_in_shopping_cart: bool,
}

impl RecipeView {
    /// Full representations of `recipes`, in the order given.
    pub async fn load(
        pool: &PgPool,
        viewer: Option<Uuid>,
        recipes: Vec<Recipe>,
    ) -> color_eyre::Result<Vec<Self>> {
        let recipe_ids: Vec<Uuid> = recipes.iter().map(|r| r.recipe_id).collect();

        let author_ids: Vec<Uuid> = recipes.iter().map(|r| r.author_user_id).unique().collect();
        let authors = User::get_many(pool, &author_ids).await?;
        let authors: HashMap<Uuid, UserProfile> =
            UserProfile::for_viewer(pool, viewer, authors)
                .await?
                .into_iter()
                .map(|profile| (profile.id, profile))
                .collect();

        let (favorited, in_cart): (HashSet<Uuid>, HashSet<Uuid>) = match viewer {
            Some(viewer) => (
                contained_in::<Favorites>(pool, viewer, &recipe_ids)
                    .await?
                    .into_iter()
                    .collect(),
                contained_in::<ShoppingCart>(pool, viewer, &recipe_ids)
                    .await?
                    .into_iter()
                    .collect(),
            ),
            None => (HashSet::new(), HashSet::new()),
        };

        let details = Recipe::with_details(pool, recipes).await?;

        let mut views = Vec::with_capacity(details.len());
        for detail in details {
            let recipe = detail.recipe;
            let author = authors
                .get(&recipe.author_user_id)
                .cloned()
                .ok_or_else(|| {
                    color_eyre::eyre::eyre!(
                        "Author {} of recipe {} is missing",
                        recipe.author_user_id,
                        recipe.recipe_id
                    )
                })?;

            views.push(Self {
                id: recipe.recipe_id,
                author,
                is_favorited: favorited.contains(&recipe.recipe_id),
                is_in_shopping_cart: in_cart.contains(&recipe.recipe_id),
                name: recipe.name,
                text: recipe.text,
                cooking_time: recipe.cooking_time,
                image: recipe.image_ref,
                tags: detail.tags.into_iter().map(TagView::from).collect(),
                ingredients: detail
                    .ingredients
                    .into_iter()
                    .map(IngredientLineView::from)
                    .collect(),
            });
        }

        Ok(views)
    }
}

/// The compact recipe shown in cart, favorite and subscription responses.
#[derive(Debug, Serialize, Deserialize)]
pub struct RecipeSummary {
    pub id: Uuid,
    pub name: String,
    pub image: Option<String>,
    pub cooking_time: i32,
}

impl From<Recipe> for RecipeSummary {
    fn from(recipe: Recipe) -> Self {
        Self {
            id: recipe.recipe_id,
            name: recipe.name,
            image: recipe.image_ref,
            cooking_time: recipe.cooking_time,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AuthorWithRecipes {
    #[serde(flatten)]
    pub profile: UserProfile,
    pub recipes: Vec<RecipeSummary>,
    pub recipes_count: i64,
}
