//! Recipe API endpoints, including favorites, the shopping cart and the
//! shopping list download.

use api_types::{
    recipe::{
        RecipeIngredientNew, RecipeIngredientView, RecipeListQuery, RecipeNew, RecipePage,
        RecipeShort, RecipeUpdate, RecipeView,
    },
    user::AuthorView,
};
use axum::{
    Extension, Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
};
use axum_extra::extract::{Query, WithRejection};
use engine::{
    IngredientAmount, Recipe, RecipeCreateCmd, RecipeListFilter, RecipeOrder, RecipeSummary,
    RecipeUpdateCmd,
};

use crate::{
    JsonBody, QueryParams, ServerError, server::ServerState, tags::tag_view, user::Viewer,
};

const SHOPPING_LIST_DISPOSITION: &str = "attachment; filename=\"shopping_list.pdf\"";

fn recipe_view(recipe: Recipe) -> RecipeView {
    RecipeView {
        id: recipe.id,
        tags: recipe.tags.into_iter().map(tag_view).collect(),
        author: AuthorView {
            username: recipe.author,
        },
        ingredients: recipe
            .ingredients
            .into_iter()
            .map(|item| RecipeIngredientView {
                id: item.id,
                name: item.name,
                measurement_unit: item.measurement_unit,
                amount: item.amount,
            })
            .collect(),
        is_favorited: recipe.is_favorited,
        is_in_shopping_cart: recipe.is_in_shopping_cart,
        name: recipe.name,
        image: recipe.image,
        text: recipe.text,
        cooking_time: recipe.cooking_time,
    }
}

fn recipe_short(summary: RecipeSummary) -> RecipeShort {
    RecipeShort {
        id: summary.id,
        name: summary.name,
        image: summary.image,
        cooking_time: summary.cooking_time,
    }
}

fn amounts(items: Vec<RecipeIngredientNew>) -> Vec<IngredientAmount> {
    items
        .into_iter()
        .map(|item| IngredientAmount {
            ingredient_id: item.id,
            amount: item.amount,
        })
        .collect()
}

/// Handle requests for listing recipes, one page at a time
pub async fn list(
    Extension(viewer): Extension<Viewer>,
    State(state): State<ServerState>,
    WithRejection(Query(query), _): QueryParams<RecipeListQuery>,
) -> Result<Json<RecipePage>, ServerError> {
    let order = match query.ordering.as_deref() {
        Some(ordering) => RecipeOrder::try_from(ordering)?,
        None => RecipeOrder::default(),
    };
    let filter = RecipeListFilter {
        tags: query.tags,
        author: query.author,
        is_favorited: query.is_favorited.map(|flag| flag != 0),
        is_in_shopping_cart: query.is_in_shopping_cart.map(|flag| flag != 0),
        order,
        page: query.page.unwrap_or(1),
        limit: query.limit.unwrap_or(RecipeListFilter::DEFAULT_LIMIT),
    };

    let page = state
        .engine
        .list_recipes(&filter, viewer.username())
        .await?;

    Ok(Json(RecipePage {
        count: page.count,
        next: page.next_page(),
        previous: page.previous_page(),
        results: page.recipes.into_iter().map(recipe_view).collect(),
    }))
}

pub async fn get(
    Extension(viewer): Extension<Viewer>,
    State(state): State<ServerState>,
    Path(id): Path<i32>,
) -> Result<Json<RecipeView>, ServerError> {
    let recipe = state.engine.recipe(id, viewer.username()).await?;
    Ok(Json(recipe_view(recipe)))
}

/// Handle requests for creating a recipe authored by the caller
pub async fn create(
    Extension(viewer): Extension<Viewer>,
    State(state): State<ServerState>,
    WithRejection(Json(payload), _): JsonBody<RecipeNew>,
) -> Result<(StatusCode, Json<RecipeView>), ServerError> {
    let author = viewer.require()?;
    let cmd = RecipeCreateCmd {
        name: payload.name,
        text: payload.text,
        image: payload.image,
        cooking_time: payload.cooking_time,
        ingredients: amounts(payload.ingredients),
        tags: payload.tags,
    };

    let recipe = state.engine.create_recipe(cmd, author).await?;
    Ok((StatusCode::CREATED, Json(recipe_view(recipe))))
}

pub async fn update(
    Extension(viewer): Extension<Viewer>,
    State(state): State<ServerState>,
    Path(id): Path<i32>,
    WithRejection(Json(payload), _): JsonBody<RecipeUpdate>,
) -> Result<Json<RecipeView>, ServerError> {
    let user = viewer.require()?;
    let cmd = RecipeUpdateCmd {
        name: payload.name,
        text: payload.text,
        image: payload.image,
        cooking_time: payload.cooking_time,
        ingredients: payload.ingredients.map(amounts),
        tags: payload.tags,
    };

    let recipe = state.engine.update_recipe(id, cmd, user).await?;
    Ok(Json(recipe_view(recipe)))
}

pub async fn delete(
    Extension(viewer): Extension<Viewer>,
    State(state): State<ServerState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ServerError> {
    let user = viewer.require()?;
    state.engine.delete_recipe(id, user).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn favorite(
    Extension(viewer): Extension<Viewer>,
    State(state): State<ServerState>,
    Path(id): Path<i32>,
) -> Result<(StatusCode, Json<RecipeShort>), ServerError> {
    let user = viewer.require()?;
    let summary = state.engine.add_favorite(id, user).await?;
    Ok((StatusCode::CREATED, Json(recipe_short(summary))))
}

pub async fn unfavorite(
    Extension(viewer): Extension<Viewer>,
    State(state): State<ServerState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ServerError> {
    let user = viewer.require()?;
    state.engine.remove_favorite(id, user).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_to_cart(
    Extension(viewer): Extension<Viewer>,
    State(state): State<ServerState>,
    Path(id): Path<i32>,
) -> Result<(StatusCode, Json<RecipeShort>), ServerError> {
    let user = viewer.require()?;
    let summary = state.engine.add_to_shopping_cart(id, user).await?;
    Ok((StatusCode::CREATED, Json(recipe_short(summary))))
}

pub async fn remove_from_cart(
    Extension(viewer): Extension<Viewer>,
    State(state): State<ServerState>,
    Path(id): Path<i32>,
) -> Result<StatusCode, ServerError> {
    let user = viewer.require()?;
    state.engine.remove_from_shopping_cart(id, user).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Handle requests for the caller's shopping list as a PDF attachment
pub async fn download_shopping_cart(
    Extension(viewer): Extension<Viewer>,
    State(state): State<ServerState>,
) -> Result<Response, ServerError> {
    let user = viewer.require()?;
    let list = state.engine.shopping_list(user).await?;
    tracing::debug!("shopping list for {user}: {} lines", list.lines().len());
    let pdf = list.to_pdf()?;

    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf"),
            (header::CONTENT_DISPOSITION, SHOPPING_LIST_DISPOSITION),
        ],
        pdf,
    )
        .into_response())
}
