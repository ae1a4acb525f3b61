use serde::{Deserialize, Serialize};

pub mod tag {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct TagView {
        pub id: i32,
        pub name: String,
        /// Hex color, `#RRGGBB`.
        pub color: String,
        pub slug: String,
    }
}

pub mod ingredient {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct IngredientView {
        pub id: i32,
        pub name: String,
        pub measurement_unit: String,
    }

    /// Query string of `GET /ingredients/`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct IngredientSearch {
        /// Case-insensitive prefix of the ingredient name.
        pub search: Option<String>,
    }
}

pub mod user {
    use super::*;

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct AuthorView {
        pub username: String,
    }
}

pub mod recipe {
    use super::*;
    use crate::{tag::TagView, user::AuthorView};

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct RecipeIngredientNew {
        /// Ingredient id.
        pub id: i32,
        pub amount: i32,
    }

    /// Request body of `POST /recipes/`.
    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct RecipeNew {
        pub ingredients: Vec<RecipeIngredientNew>,
        /// Tag ids.
        #[serde(default)]
        pub tags: Vec<i32>,
        /// Base64 data URL, e.g. `data:image/png;base64,...`.
        pub image: String,
        pub name: String,
        pub text: String,
        /// Minutes, at least 1.
        pub cooking_time: i32,
    }

    /// Request body of `PATCH /recipes/{id}/`.
    ///
    /// Missing fields are left untouched. `ingredients` and `tags` replace the
    /// whole list when present.
    #[derive(Clone, Debug, Default, Serialize, Deserialize)]
    pub struct RecipeUpdate {
        pub ingredients: Option<Vec<RecipeIngredientNew>>,
        pub tags: Option<Vec<i32>>,
        pub image: Option<String>,
        pub name: Option<String>,
        pub text: Option<String>,
        pub cooking_time: Option<i32>,
    }

    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct RecipeIngredientView {
        pub id: i32,
        pub name: String,
        pub measurement_unit: String,
        pub amount: i32,
    }

    #[derive(Clone, Debug, Serialize, Deserialize)]
    pub struct RecipeView {
        pub id: i32,
        pub tags: Vec<TagView>,
        pub author: AuthorView,
        pub ingredients: Vec<RecipeIngredientView>,
        pub is_favorited: bool,
        pub is_in_shopping_cart: bool,
        pub name: String,
        /// Path of the stored image, relative to the media root.
        pub image: String,
        pub text: String,
        pub cooking_time: i32,
    }

    /// Short representation returned by the favorite and shopping cart
    /// endpoints.
    #[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
    pub struct RecipeShort {
        pub id: i32,
        pub name: String,
        pub image: String,
        pub cooking_time: i32,
    }

    /// Query string of `GET /recipes/`.
    #[derive(Debug, Default, Serialize, Deserialize)]
    pub struct RecipeListQuery {
        /// 1-based page number.
        pub page: Option<u64>,
        /// Page size.
        pub limit: Option<u64>,
        /// Tag slugs; a recipe matches when it carries any of them.
        #[serde(default)]
        pub tags: Vec<String>,
        /// Author username.
        pub author: Option<String>,
        /// `1` keeps only the caller's favorites, `0` excludes them.
        pub is_favorited: Option<u8>,
        /// `1` keeps only recipes in the caller's cart, `0` excludes them.
        pub is_in_shopping_cart: Option<u8>,
        /// `id` or `-id`.
        pub ordering: Option<String>,
    }

    #[derive(Debug, Serialize, Deserialize)]
    pub struct RecipePage {
        pub count: u64,
        pub next: Option<u64>,
        pub previous: Option<u64>,
        pub results: Vec<RecipeView>,
    }
}
