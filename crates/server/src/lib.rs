use std::error::Error as StdError;

use axum::{Json, extract::rejection::JsonRejection, http::StatusCode, response::IntoResponse};
use axum_extra::extract::{QueryRejection, WithRejection};
use engine::EngineError;

use serde::Serialize;
pub use server::{ServerState, router, run_with_listener};

mod ingredients;
mod recipes;
mod server;
mod tags;
mod user;

pub enum ServerError {
    Engine(EngineError),
    /// The request body or query string could not be decoded.
    Rejected {
        status: StatusCode,
        message: String,
        field: Option<String>,
    },
    Generic(String),
}

/// JSON body whose decoding failures are reported as [`ServerError`].
pub(crate) type JsonBody<T> = WithRejection<Json<T>, ServerError>;
/// Query string whose decoding failures are reported as [`ServerError`].
pub(crate) type QueryParams<T> = WithRejection<axum_extra::extract::Query<T>, ServerError>;

#[derive(Serialize)]
struct Error {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<String>,
}

fn status_for_engine_error(err: &EngineError) -> StatusCode {
    match err {
        EngineError::Validation { .. } => StatusCode::BAD_REQUEST,
        EngineError::Forbidden(_) => StatusCode::FORBIDDEN,
        EngineError::KeyNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::ExistingKey(_) => StatusCode::CONFLICT,
        EngineError::Image(_) | EngineError::Export(_) | EngineError::Database(_) => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn body_for_engine_error(err: EngineError) -> Error {
    match err {
        EngineError::Database(db_err) => {
            tracing::error!("database error: {db_err}");
            Error {
                error: "internal server error".to_string(),
                field: None,
            }
        }
        EngineError::Image(io_err) => {
            tracing::error!("image storage error: {io_err}");
            Error {
                error: "internal server error".to_string(),
                field: None,
            }
        }
        EngineError::Export(message) => {
            tracing::error!("export error: {message}");
            Error {
                error: "internal server error".to_string(),
                field: None,
            }
        }
        EngineError::Validation { field, message } => Error {
            error: message,
            field: Some(field),
        },
        other => Error {
            error: other.to_string(),
            field: None,
        },
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> axum::response::Response {
        let (status, body) = match self {
            ServerError::Engine(err) => (status_for_engine_error(&err), body_for_engine_error(err)),
            ServerError::Rejected {
                status,
                message,
                field,
            } => (
                status,
                Error {
                    error: message,
                    field,
                },
            ),
            ServerError::Generic(err) => (
                StatusCode::BAD_REQUEST,
                Error {
                    error: err,
                    field: None,
                },
            ),
        };

        (status, Json(body)).into_response()
    }
}

impl From<EngineError> for ServerError {
    fn from(value: EngineError) -> Self {
        Self::Engine(value)
    }
}

/// Walk the source chain of `err` looking for a `T`.
fn find_source<'a, T>(err: &'a (dyn StdError + 'static)) -> Option<&'a T>
where
    T: StdError + 'static,
{
    match err.downcast_ref::<T>() {
        Some(found) => Some(found),
        None => err.source().and_then(find_source),
    }
}

/// Split a `serde_path_to_error` failure into the field path and the message.
fn field_error<E>(err: &serde_path_to_error::Error<E>) -> (Option<String>, String)
where
    E: std::fmt::Display,
{
    let path = err.path().to_string();
    let field = (path != ".").then_some(path);
    (field, err.inner().to_string())
}

impl From<JsonRejection> for ServerError {
    fn from(rejection: JsonRejection) -> Self {
        let decoded = find_source::<serde_path_to_error::Error<serde_json::Error>>(&rejection)
            .map(field_error);
        match (rejection, decoded) {
            (
                JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_),
                Some((field, message)),
            ) => Self::Rejected {
                status: StatusCode::BAD_REQUEST,
                message,
                field,
            },
            (rejection, _) => Self::Rejected {
                status: rejection.status(),
                message: rejection.body_text(),
                field: None,
            },
        }
    }
}

impl From<QueryRejection> for ServerError {
    fn from(rejection: QueryRejection) -> Self {
        let (field, message) =
            find_source::<serde_path_to_error::Error<serde::de::value::Error>>(&rejection)
                .map(field_error)
                .unwrap_or_else(|| (None, rejection.body_text()));
        Self::Rejected {
            status: StatusCode::BAD_REQUEST,
            message,
            field,
        }
    }
}
