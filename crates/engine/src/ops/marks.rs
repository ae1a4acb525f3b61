use sea_orm::{
    ActiveValue, QueryFilter, TransactionTrait, prelude::*, sea_query::OnConflict,
};

use crate::{EngineError, RecipeSummary, ResultEngine, favorites, shopping_cart};

use super::{Engine, with_tx};

/// Per-user marker a recipe can carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecipeMark {
    Favorite,
    ShoppingCart,
}

impl RecipeMark {
    fn label(self) -> &'static str {
        match self {
            Self::Favorite => "favorite",
            Self::ShoppingCart => "shopping cart entry",
        }
    }
}

impl Engine {
    /// Mark `recipe_id` for `user_id`. Marking twice is a no-op.
    pub async fn add_mark(
        &self,
        mark: RecipeMark,
        recipe_id: i32,
        user_id: &str,
    ) -> ResultEngine<RecipeSummary> {
        with_tx!(self, |db_tx| {
            let recipe = self.require_recipe(&db_tx, recipe_id).await?;
            match mark {
                RecipeMark::Favorite => {
                    favorites::Entity::insert(favorites::ActiveModel {
                        user_id: ActiveValue::Set(user_id.to_string()),
                        recipe_id: ActiveValue::Set(recipe_id),
                    })
                    .on_conflict(
                        OnConflict::columns([
                            favorites::Column::UserId,
                            favorites::Column::RecipeId,
                        ])
                        .do_nothing()
                        .to_owned(),
                    )
                    .exec_without_returning(&db_tx)
                    .await?;
                }
                RecipeMark::ShoppingCart => {
                    shopping_cart::Entity::insert(shopping_cart::ActiveModel {
                        user_id: ActiveValue::Set(user_id.to_string()),
                        recipe_id: ActiveValue::Set(recipe_id),
                    })
                    .on_conflict(
                        OnConflict::columns([
                            shopping_cart::Column::UserId,
                            shopping_cart::Column::RecipeId,
                        ])
                        .do_nothing()
                        .to_owned(),
                    )
                    .exec_without_returning(&db_tx)
                    .await?;
                }
            }
            Ok(RecipeSummary::from(&recipe))
        })
    }

    /// Remove the marker. Fails with `KeyNotFound` when the recipe or the
    /// marker does not exist.
    pub async fn remove_mark(
        &self,
        mark: RecipeMark,
        recipe_id: i32,
        user_id: &str,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            self.require_recipe(&db_tx, recipe_id).await?;
            let deleted = match mark {
                RecipeMark::Favorite => {
                    favorites::Entity::delete_many()
                        .filter(favorites::Column::UserId.eq(user_id))
                        .filter(favorites::Column::RecipeId.eq(recipe_id))
                        .exec(&db_tx)
                        .await?
                        .rows_affected
                }
                RecipeMark::ShoppingCart => {
                    shopping_cart::Entity::delete_many()
                        .filter(shopping_cart::Column::UserId.eq(user_id))
                        .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
                        .exec(&db_tx)
                        .await?
                        .rows_affected
                }
            };
            if deleted == 0 {
                return Err(EngineError::KeyNotFound(format!(
                    "{} for recipe {recipe_id}",
                    mark.label()
                )));
            }
            Ok(())
        })
    }

    pub async fn add_favorite(&self, recipe_id: i32, user_id: &str) -> ResultEngine<RecipeSummary> {
        self.add_mark(RecipeMark::Favorite, recipe_id, user_id).await
    }

    pub async fn remove_favorite(&self, recipe_id: i32, user_id: &str) -> ResultEngine<()> {
        self.remove_mark(RecipeMark::Favorite, recipe_id, user_id)
            .await
    }

    pub async fn add_to_shopping_cart(
        &self,
        recipe_id: i32,
        user_id: &str,
    ) -> ResultEngine<RecipeSummary> {
        self.add_mark(RecipeMark::ShoppingCart, recipe_id, user_id)
            .await
    }

    pub async fn remove_from_shopping_cart(
        &self,
        recipe_id: i32,
        user_id: &str,
    ) -> ResultEngine<()> {
        self.remove_mark(RecipeMark::ShoppingCart, recipe_id, user_id)
            .await
    }
}
