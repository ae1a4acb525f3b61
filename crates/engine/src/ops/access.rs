use std::collections::HashSet;

use sea_orm::{ConnectionTrait, QueryFilter, prelude::*};

use crate::{EngineError, ResultEngine, ingredients, recipes, tags};

use super::Engine;

impl Engine {
    pub(super) async fn require_recipe<C: ConnectionTrait>(
        &self,
        db: &C,
        recipe_id: i32,
    ) -> ResultEngine<recipes::Model> {
        recipes::Entity::find_by_id(recipe_id)
            .one(db)
            .await?
            .ok_or_else(|| EngineError::KeyNotFound(format!("recipe {recipe_id}")))
    }

    /// Return the recipe if `user_id` authored it.
    pub(super) async fn require_recipe_author<C: ConnectionTrait>(
        &self,
        db: &C,
        recipe_id: i32,
        user_id: &str,
    ) -> ResultEngine<recipes::Model> {
        let recipe = self.require_recipe(db, recipe_id).await?;
        if recipe.author_id != user_id {
            return Err(EngineError::Forbidden(
                "only the author can modify this recipe".to_string(),
            ));
        }
        Ok(recipe)
    }

    pub(super) async fn require_ingredients<C: ConnectionTrait>(
        &self,
        db: &C,
        ids: &[i32],
    ) -> ResultEngine<()> {
        let found: HashSet<i32> = ingredients::Entity::find()
            .filter(ingredients::Column::Id.is_in(ids.iter().copied()))
            .all(db)
            .await?
            .into_iter()
            .map(|model| model.id)
            .collect();
        if let Some(missing) = ids.iter().find(|id| !found.contains(*id)) {
            return Err(EngineError::validation(
                "ingredients",
                format!("ingredient {missing} does not exist"),
            ));
        }
        Ok(())
    }

    pub(super) async fn require_tags<C: ConnectionTrait>(
        &self,
        db: &C,
        ids: &[i32],
    ) -> ResultEngine<()> {
        if ids.is_empty() {
            return Ok(());
        }
        let found: HashSet<i32> = tags::Entity::find()
            .filter(tags::Column::Id.is_in(ids.iter().copied()))
            .all(db)
            .await?
            .into_iter()
            .map(|model| model.id)
            .collect();
        if let Some(missing) = ids.iter().find(|id| !found.contains(*id)) {
            return Err(EngineError::validation(
                "tags",
                format!("tag {missing} does not exist"),
            ));
        }
        Ok(())
    }
}
