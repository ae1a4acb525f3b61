//! Tag API endpoints

use api_types::tag::TagView;
use axum::{
    Json,
    extract::{Path, State},
};

use crate::{ServerError, server::ServerState};

pub(crate) fn tag_view(tag: engine::Tag) -> TagView {
    TagView {
        id: tag.id,
        name: tag.name,
        color: tag.color,
        slug: tag.slug,
    }
}

/// Handle requests for listing every tag
pub async fn list(State(state): State<ServerState>) -> Result<Json<Vec<TagView>>, ServerError> {
    let tags = state.engine.list_tags().await?;
    Ok(Json(tags.into_iter().map(tag_view).collect()))
}

pub async fn get(
    State(state): State<ServerState>,
    Path(id): Path<i32>,
) -> Result<Json<TagView>, ServerError> {
    Ok(Json(tag_view(state.engine.tag(id).await?)))
}
