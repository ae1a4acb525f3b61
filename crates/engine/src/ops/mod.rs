use std::path::PathBuf;

use sea_orm::DatabaseConnection;

use crate::ResultEngine;

mod access;
mod ingredients;
mod marks;
mod recipes;
mod shopping_list;
mod tags;

pub use marks::RecipeMark;
pub use recipes::RecipePage;

/// Run a block inside a DB transaction, committing on success and rolling back on error.
macro_rules! with_tx {
    ($self:expr, |$tx:ident| $body:expr) => {{
        let $tx = $self.database.begin().await?;
        let result = $body;
        match result {
            Ok(value) => {
                $tx.commit().await?;
                Ok(value)
            }
            Err(err) => Err(err),
        }
    }};
}

pub(crate) use with_tx;

#[derive(Debug)]
pub struct Engine {
    database: DatabaseConnection,
    media_root: PathBuf,
}

impl Engine {
    /// Return a builder for `Engine`. Help to build the struct.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// Directory recipe images are written to.
    pub fn media_root(&self) -> &std::path::Path {
        &self.media_root
    }
}

/// The builder for `Engine`
pub struct EngineBuilder {
    database: DatabaseConnection,
    media_root: PathBuf,
}

impl Default for EngineBuilder {
    fn default() -> Self {
        Self {
            database: DatabaseConnection::default(),
            media_root: PathBuf::from("media"),
        }
    }
}

impl EngineBuilder {
    /// Pass the required database
    pub fn database(mut self, db: DatabaseConnection) -> EngineBuilder {
        self.database = db;
        self
    }

    /// Directory for uploaded images, `./media` by default.
    pub fn media_root(mut self, path: impl Into<PathBuf>) -> EngineBuilder {
        self.media_root = path.into();
        self
    }

    /// Construct `Engine`
    pub async fn build(self) -> ResultEngine<Engine> {
        Ok(Engine {
            database: self.database,
            media_root: self.media_root,
        })
    }
}
