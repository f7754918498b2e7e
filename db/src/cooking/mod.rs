pub mod ingredients;
pub mod recipe;
pub mod shopping_list;
pub mod tags;

pub use ingredients::{Ingredient, RecipeIngredient};
pub use recipe::{
    IngredientAmount, Recipe, RecipeDraft, RecipeFilter, RecipeWithDetails, ValidationErrors,
};
pub use shopping_list::{CartLine, ShoppingList, ShoppingListItem};
pub use tags::{RecipeTag, Tag};
