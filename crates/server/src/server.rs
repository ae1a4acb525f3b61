use axum::{
    Router,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::Response,
    routing::{get, post},
};
use axum_extra::{
    TypedHeader,
    headers::{Authorization, authorization::Basic},
};
use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};

use std::sync::Arc;

use crate::{ingredients, recipes, tags, user};
use engine::Engine;

#[derive(Clone)]
pub struct ServerState {
    pub engine: Arc<Engine>,
    pub db: DatabaseConnection,
}

/// Resolve the caller from HTTP Basic credentials.
///
/// Requests without an `Authorization` header go through as anonymous;
/// credentials that do not match a user are rejected.
async fn auth(
    auth_header: Option<TypedHeader<Authorization<Basic>>>,
    State(state): State<ServerState>,
    mut request: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let Some(TypedHeader(credentials)) = auth_header else {
        request.extensions_mut().insert(user::Viewer(None));
        return Ok(next.run(request).await);
    };

    if credentials.username().is_empty() || credentials.password().is_empty() {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let user: Option<user::Model> = user::Entity::find()
        .filter(user::Column::Username.eq(credentials.username()))
        .filter(user::Column::Password.eq(credentials.password()))
        .one(&state.db)
        .await
        .map_err(|err| {
            tracing::error!("failed to look up user: {err}");
            StatusCode::UNAUTHORIZED
        })?;

    let Some(user) = user else {
        return Err(StatusCode::UNAUTHORIZED);
    };

    request.extensions_mut().insert(user::Viewer(Some(user)));
    Ok(next.run(request).await)
}

/// Build the application router on top of `state`.
pub fn router(state: ServerState) -> Router {
    Router::new()
        .route("/tags/", get(tags::list))
        .route("/tags/{id}/", get(tags::get))
        .route("/ingredients/", get(ingredients::list))
        .route("/ingredients/{id}/", get(ingredients::get))
        .route("/recipes/", get(recipes::list).post(recipes::create))
        .route(
            "/recipes/download_shopping_cart/",
            get(recipes::download_shopping_cart),
        )
        .route(
            "/recipes/{id}/",
            get(recipes::get)
                .patch(recipes::update)
                .delete(recipes::delete),
        )
        .route(
            "/recipes/{id}/favorite/",
            post(recipes::favorite).delete(recipes::unfavorite),
        )
        .route(
            "/recipes/{id}/shopping_cart/",
            post(recipes::add_to_cart).delete(recipes::remove_from_cart),
        )
        .route_layer(middleware::from_fn_with_state(state.clone(), auth))
        .with_state(state)
}

pub async fn run_with_listener(
    engine: Engine,
    db: DatabaseConnection,
    listener: tokio::net::TcpListener,
) -> Result<(), std::io::Error> {
    let addr = listener.local_addr()?;
    tracing::info!("Server listening on {}", addr);

    let state = ServerState {
        engine: Arc::new(engine),
        db,
    };

    axum::serve(listener, router(state)).await
}
