//! Command structs for engine operations.
//!
//! These types group parameters for recipe writes and listing, keeping call
//! sites readable. Each write command validates itself before the engine
//! touches the database.

use crate::{
    ResultEngine, EngineError,
    util::{
        MAX_NAME_LEN, ensure_unique, normalize_required_text, validate_amount,
        validate_cooking_time,
    },
};

/// One ingredient line of a recipe write.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IngredientAmount {
    pub ingredient_id: i32,
    pub amount: i32,
}

/// Create a recipe.
#[derive(Clone, Debug)]
pub struct RecipeCreateCmd {
    pub name: String,
    pub text: String,
    /// Base64 data URL.
    pub image: String,
    pub cooking_time: i32,
    pub ingredients: Vec<IngredientAmount>,
    pub tags: Vec<i32>,
}

/// Partially update a recipe. `ingredients` and `tags` replace the stored
/// lists when present.
#[derive(Clone, Debug, Default)]
pub struct RecipeUpdateCmd {
    pub name: Option<String>,
    pub text: Option<String>,
    pub image: Option<String>,
    pub cooking_time: Option<i32>,
    pub ingredients: Option<Vec<IngredientAmount>>,
    pub tags: Option<Vec<i32>>,
}

/// Validated ingredient line, amount narrowed to the column type.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct ValidAmount {
    pub(crate) ingredient_id: i32,
    pub(crate) amount: i16,
}

#[derive(Debug)]
pub(crate) struct ValidRecipe {
    pub(crate) name: String,
    pub(crate) text: String,
    pub(crate) cooking_time: i32,
    pub(crate) ingredients: Vec<ValidAmount>,
    pub(crate) tags: Vec<i32>,
}

#[derive(Debug, Default)]
pub(crate) struct ValidRecipeUpdate {
    pub(crate) name: Option<String>,
    pub(crate) text: Option<String>,
    pub(crate) cooking_time: Option<i32>,
    pub(crate) ingredients: Option<Vec<ValidAmount>>,
    pub(crate) tags: Option<Vec<i32>>,
}

fn validate_ingredients(items: &[IngredientAmount]) -> ResultEngine<Vec<ValidAmount>> {
    if items.is_empty() {
        return Err(EngineError::validation(
            "ingredients",
            "a recipe needs at least one ingredient",
        ));
    }
    ensure_unique(
        items.iter().map(|item| item.ingredient_id),
        "ingredients",
        "ingredients must not repeat",
    )?;
    items
        .iter()
        .map(|item| {
            Ok(ValidAmount {
                ingredient_id: item.ingredient_id,
                amount: validate_amount(item.amount)?,
            })
        })
        .collect()
}

fn validate_tags(tags: &[i32]) -> ResultEngine<Vec<i32>> {
    ensure_unique(tags.iter().copied(), "tags", "tags must not repeat")?;
    Ok(tags.to_vec())
}

impl RecipeCreateCmd {
    pub(crate) fn validate(&self) -> ResultEngine<ValidRecipe> {
        validate_cooking_time(self.cooking_time)?;
        Ok(ValidRecipe {
            name: normalize_required_text(&self.name, "name", Some(MAX_NAME_LEN))?,
            text: normalize_required_text(&self.text, "text", None)?,
            cooking_time: self.cooking_time,
            ingredients: validate_ingredients(&self.ingredients)?,
            tags: validate_tags(&self.tags)?,
        })
    }
}

impl RecipeUpdateCmd {
    pub(crate) fn validate(&self) -> ResultEngine<ValidRecipeUpdate> {
        if let Some(cooking_time) = self.cooking_time {
            validate_cooking_time(cooking_time)?;
        }
        Ok(ValidRecipeUpdate {
            name: self
                .name
                .as_deref()
                .map(|name| normalize_required_text(name, "name", Some(MAX_NAME_LEN)))
                .transpose()?,
            text: self
                .text
                .as_deref()
                .map(|text| normalize_required_text(text, "text", None))
                .transpose()?,
            cooking_time: self.cooking_time,
            ingredients: self
                .ingredients
                .as_deref()
                .map(validate_ingredients)
                .transpose()?,
            tags: self.tags.as_deref().map(validate_tags).transpose()?,
        })
    }
}

/// Sort order of the recipe list.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RecipeOrder {
    IdAsc,
    /// Newest first.
    #[default]
    IdDesc,
}

impl TryFrom<&str> for RecipeOrder {
    type Error = EngineError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        match value {
            "id" => Ok(Self::IdAsc),
            "-id" => Ok(Self::IdDesc),
            other => Err(EngineError::validation(
                "ordering",
                format!("unsupported ordering: {other}"),
            )),
        }
    }
}

/// Filters and pagination of the recipe list.
#[derive(Clone, Debug)]
pub struct RecipeListFilter {
    /// Tag slugs; any match keeps the recipe.
    pub tags: Vec<String>,
    pub author: Option<String>,
    /// Ignored for anonymous viewers.
    pub is_favorited: Option<bool>,
    /// Ignored for anonymous viewers.
    pub is_in_shopping_cart: Option<bool>,
    pub order: RecipeOrder,
    /// 1-based.
    pub page: u64,
    pub limit: u64,
}

impl RecipeListFilter {
    pub const DEFAULT_LIMIT: u64 = 6;
    pub const MAX_LIMIT: u64 = 100;
}

impl Default for RecipeListFilter {
    fn default() -> Self {
        Self {
            tags: Vec::new(),
            author: None,
            is_favorited: None,
            is_in_shopping_cart: None,
            order: RecipeOrder::default(),
            page: 1,
            limit: Self::DEFAULT_LIMIT,
        }
    }
}
