//! Foodgram domain engine.
//!
//! The engine owns the relational schema entities and every operation the
//! HTTP layer exposes: tags and ingredients lookups, recipe CRUD with
//! validation, favorite/shopping cart markers and the shopping list export.
//! All user context is passed explicitly as a username.

pub use commands::{IngredientAmount, RecipeCreateCmd, RecipeListFilter, RecipeOrder, RecipeUpdateCmd};
pub use error::EngineError;
pub use ingredients::{Ingredient, IngredientRecord, ImportReport};
pub use ops::{Engine, EngineBuilder, RecipeMark, RecipePage};
pub use recipes::{Recipe, RecipeIngredient, RecipeSummary};
pub use shopping_list::{ShoppingList, ShoppingListLine};
pub use tags::Tag;

mod commands;
mod error;
mod favorites;
mod ingredients;
mod media;
mod ops;
mod pdf;
mod recipe_ingredients;
mod recipe_tags;
mod recipes;
mod shopping_cart;
mod shopping_list;
mod tags;
mod users;
mod util;

type ResultEngine<T> = Result<T, EngineError>;
