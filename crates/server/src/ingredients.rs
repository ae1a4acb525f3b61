//! Ingredient API endpoints

use api_types::ingredient::{IngredientSearch, IngredientView};
use axum::{
    Json,
    extract::{Path, Query, State},
};

use crate::{ServerError, server::ServerState};

fn ingredient_view(ingredient: engine::Ingredient) -> IngredientView {
    IngredientView {
        id: ingredient.id,
        name: ingredient.name,
        measurement_unit: ingredient.measurement_unit,
    }
}

/// Handle requests for searching ingredients by name prefix
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<IngredientSearch>,
) -> Result<Json<Vec<IngredientView>>, ServerError> {
    let ingredients = state
        .engine
        .search_ingredients(query.search.as_deref())
        .await?;
    Ok(Json(ingredients.into_iter().map(ingredient_view).collect()))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<i32>,
) -> Result<Json<IngredientView>, ServerError> {
    Ok(Json(ingredient_view(state.engine.ingredient(id).await?)))
}
