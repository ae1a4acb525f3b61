//! Users as seen by the authentication layer.

use sea_orm::entity::prelude::*;

use crate::ServerError;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub username: String,
    pub password: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// The caller of a request: `None` when no credentials were sent.
#[derive(Clone, Debug, Default)]
pub struct Viewer(pub Option<Model>);

impl Viewer {
    pub fn username(&self) -> Option<&str> {
        self.0.as_ref().map(|user| user.username.as_str())
    }

    /// Username of an authenticated caller, or `Forbidden` for anonymous ones.
    pub fn require(&self) -> Result<&str, ServerError> {
        self.username().ok_or_else(|| {
            ServerError::Engine(engine::EngineError::Forbidden(
                "authentication required".to_string(),
            ))
        })
    }
}
