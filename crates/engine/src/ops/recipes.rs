use std::collections::{HashMap, HashSet};

use sea_orm::{
    ActiveValue, ConnectionTrait, DatabaseTransaction, PaginatorTrait, QueryFilter, QueryOrder,
    TransactionTrait, prelude::*, sea_query::Query,
};

use crate::{
    EngineError, Recipe, RecipeCreateCmd, RecipeIngredient, RecipeListFilter, RecipeOrder,
    RecipeUpdateCmd, ResultEngine, Tag,
    commands::{ValidAmount, ValidRecipe, ValidRecipeUpdate},
    favorites, ingredients, media, recipe_ingredients, recipe_tags, recipes, shopping_cart, tags,
};

use super::{Engine, with_tx};

/// One page of the recipe list.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecipePage {
    pub recipes: Vec<Recipe>,
    /// Recipes matching the filter across all pages.
    pub count: u64,
    pub page: u64,
    pub limit: u64,
}

impl RecipePage {
    pub fn next_page(&self) -> Option<u64> {
        (self.page.saturating_mul(self.limit) < self.count).then_some(self.page + 1)
    }

    pub fn previous_page(&self) -> Option<u64> {
        (self.page > 1).then(|| self.page - 1)
    }
}

impl Engine {
    /// Create a recipe authored by `author`.
    ///
    /// The request is validated before anything is written. The image is
    /// stored first and removed again if the database write fails.
    pub async fn create_recipe(&self, cmd: RecipeCreateCmd, author: &str) -> ResultEngine<Recipe> {
        let valid = cmd.validate()?;
        let image = media::decode_data_url(&cmd.image)?;
        let image_path = media::store(&self.media_root, &image).await?;

        let recipe_id = match self.insert_recipe(valid, &image_path, author).await {
            Ok(id) => id,
            Err(err) => {
                media::discard(&self.media_root, &image_path).await;
                return Err(err);
            }
        };
        tracing::debug!("recipe {recipe_id} created by {author}");

        self.recipe(recipe_id, Some(author)).await
    }

    async fn insert_recipe(
        &self,
        valid: ValidRecipe,
        image_path: &str,
        author: &str,
    ) -> ResultEngine<i32> {
        with_tx!(self, |db_tx| {
            let ingredient_ids: Vec<i32> =
                valid.ingredients.iter().map(|i| i.ingredient_id).collect();
            self.require_ingredients(&db_tx, &ingredient_ids).await?;
            self.require_tags(&db_tx, &valid.tags).await?;

            let model = recipes::ActiveModel {
                author_id: ActiveValue::Set(author.to_string()),
                name: ActiveValue::Set(valid.name),
                text: ActiveValue::Set(valid.text),
                image: ActiveValue::Set(image_path.to_string()),
                cooking_time: ActiveValue::Set(valid.cooking_time),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;

            insert_ingredient_links(&db_tx, model.id, &valid.ingredients).await?;
            insert_tag_links(&db_tx, model.id, &valid.tags).await?;
            Ok(model.id)
        })
    }

    /// Partially update a recipe. Only its author may do it.
    ///
    /// When present, the ingredient list and the tag set are replaced as a
    /// whole: existing rows are cleared and the new ones inserted inside the
    /// same transaction as the other column changes.
    pub async fn update_recipe(
        &self,
        recipe_id: i32,
        cmd: RecipeUpdateCmd,
        user_id: &str,
    ) -> ResultEngine<Recipe> {
        let current = self
            .require_recipe_author(&self.database, recipe_id, user_id)
            .await?;
        let valid = cmd.validate()?;
        let new_image = match cmd.image.as_deref() {
            Some(data) => {
                let image = media::decode_data_url(data)?;
                Some(media::store(&self.media_root, &image).await?)
            }
            None => None,
        };

        match self
            .update_recipe_rows(recipe_id, user_id, valid, new_image.as_deref())
            .await
        {
            Ok(()) => {
                if new_image.is_some() {
                    media::discard(&self.media_root, &current.image).await;
                }
            }
            Err(err) => {
                if let Some(path) = &new_image {
                    media::discard(&self.media_root, path).await;
                }
                return Err(err);
            }
        }

        self.recipe(recipe_id, Some(user_id)).await
    }

    async fn update_recipe_rows(
        &self,
        recipe_id: i32,
        user_id: &str,
        valid: ValidRecipeUpdate,
        image_path: Option<&str>,
    ) -> ResultEngine<()> {
        with_tx!(self, |db_tx| {
            let current = self
                .require_recipe_author(&db_tx, recipe_id, user_id)
                .await?;
            if let Some(items) = &valid.ingredients {
                let ids: Vec<i32> = items.iter().map(|i| i.ingredient_id).collect();
                self.require_ingredients(&db_tx, &ids).await?;
            }
            if let Some(tag_ids) = &valid.tags {
                self.require_tags(&db_tx, tag_ids).await?;
            }

            let mut active: recipes::ActiveModel = current.into();
            if let Some(name) = valid.name {
                active.name = ActiveValue::Set(name);
            }
            if let Some(text) = valid.text {
                active.text = ActiveValue::Set(text);
            }
            if let Some(cooking_time) = valid.cooking_time {
                active.cooking_time = ActiveValue::Set(cooking_time);
            }
            if let Some(path) = image_path {
                active.image = ActiveValue::Set(path.to_string());
            }
            if active.is_changed() {
                active.update(&db_tx).await?;
            }

            if let Some(items) = &valid.ingredients {
                recipe_ingredients::Entity::delete_many()
                    .filter(recipe_ingredients::Column::RecipeId.eq(recipe_id))
                    .exec(&db_tx)
                    .await?;
                insert_ingredient_links(&db_tx, recipe_id, items).await?;
            }
            if let Some(tag_ids) = &valid.tags {
                recipe_tags::Entity::delete_many()
                    .filter(recipe_tags::Column::RecipeId.eq(recipe_id))
                    .exec(&db_tx)
                    .await?;
                insert_tag_links(&db_tx, recipe_id, tag_ids).await?;
            }
            Ok(())
        })
    }

    /// Delete a recipe with its links, favorites and cart entries. Only its
    /// author may do it.
    pub async fn delete_recipe(&self, recipe_id: i32, user_id: &str) -> ResultEngine<()> {
        let recipe = self.delete_recipe_rows(recipe_id, user_id).await?;
        media::discard(&self.media_root, &recipe.image).await;
        tracing::debug!("recipe {recipe_id} deleted by {user_id}");
        Ok(())
    }

    async fn delete_recipe_rows(
        &self,
        recipe_id: i32,
        user_id: &str,
    ) -> ResultEngine<recipes::Model> {
        with_tx!(self, |db_tx| {
            let recipe = self
                .require_recipe_author(&db_tx, recipe_id, user_id)
                .await?;

            favorites::Entity::delete_many()
                .filter(favorites::Column::RecipeId.eq(recipe_id))
                .exec(&db_tx)
                .await?;
            shopping_cart::Entity::delete_many()
                .filter(shopping_cart::Column::RecipeId.eq(recipe_id))
                .exec(&db_tx)
                .await?;
            recipe_tags::Entity::delete_many()
                .filter(recipe_tags::Column::RecipeId.eq(recipe_id))
                .exec(&db_tx)
                .await?;
            recipe_ingredients::Entity::delete_many()
                .filter(recipe_ingredients::Column::RecipeId.eq(recipe_id))
                .exec(&db_tx)
                .await?;
            recipes::Entity::delete_by_id(recipe_id)
                .exec(&db_tx)
                .await?;
            Ok(recipe)
        })
    }

    /// Return one recipe as seen by `viewer` (`None` for anonymous callers).
    pub async fn recipe(&self, recipe_id: i32, viewer: Option<&str>) -> ResultEngine<Recipe> {
        let model = self.require_recipe(&self.database, recipe_id).await?;
        self.load_recipes(&self.database, vec![model], viewer)
            .await?
            .pop()
            .ok_or_else(|| EngineError::KeyNotFound(format!("recipe {recipe_id}")))
    }

    /// List recipes matching `filter`, one page at a time.
    ///
    /// A page past the last one is reported as not found, except page 1 of
    /// an empty result.
    pub async fn list_recipes(
        &self,
        filter: &RecipeListFilter,
        viewer: Option<&str>,
    ) -> ResultEngine<RecipePage> {
        if filter.page == 0 {
            return Err(EngineError::validation("page", "page must be at least 1"));
        }
        if filter.limit == 0 || filter.limit > RecipeListFilter::MAX_LIMIT {
            return Err(EngineError::validation(
                "limit",
                format!(
                    "limit must be between 1 and {}",
                    RecipeListFilter::MAX_LIMIT
                ),
            ));
        }

        let mut query = recipes::Entity::find();
        if !filter.tags.is_empty() {
            let tag_ids = Query::select()
                .column(tags::Column::Id)
                .from(tags::Entity)
                .and_where(tags::Column::Slug.is_in(filter.tags.iter().cloned()))
                .to_owned();
            let tagged = Query::select()
                .column(recipe_tags::Column::RecipeId)
                .from(recipe_tags::Entity)
                .and_where(recipe_tags::Column::TagId.in_subquery(tag_ids))
                .to_owned();
            query = query.filter(recipes::Column::Id.in_subquery(tagged));
        }
        if let Some(author) = &filter.author {
            query = query.filter(recipes::Column::AuthorId.eq(author.clone()));
        }
        if let Some(viewer) = viewer {
            if let Some(flag) = filter.is_favorited {
                let marked = Query::select()
                    .column(favorites::Column::RecipeId)
                    .from(favorites::Entity)
                    .and_where(favorites::Column::UserId.eq(viewer))
                    .to_owned();
                query = query.filter(if flag {
                    recipes::Column::Id.in_subquery(marked)
                } else {
                    recipes::Column::Id.not_in_subquery(marked)
                });
            }
            if let Some(flag) = filter.is_in_shopping_cart {
                let marked = Query::select()
                    .column(shopping_cart::Column::RecipeId)
                    .from(shopping_cart::Entity)
                    .and_where(shopping_cart::Column::UserId.eq(viewer))
                    .to_owned();
                query = query.filter(if flag {
                    recipes::Column::Id.in_subquery(marked)
                } else {
                    recipes::Column::Id.not_in_subquery(marked)
                });
            }
        }
        query = match filter.order {
            RecipeOrder::IdAsc => query.order_by_asc(recipes::Column::Id),
            RecipeOrder::IdDesc => query.order_by_desc(recipes::Column::Id),
        };

        let paginator = query.paginate(&self.database, filter.limit);
        let count = paginator.num_items().await?;
        if filter.page > 1 && (filter.page - 1).saturating_mul(filter.limit) >= count {
            return Err(EngineError::KeyNotFound(format!("page {}", filter.page)));
        }
        let models = paginator.fetch_page(filter.page - 1).await?;
        let recipes = self.load_recipes(&self.database, models, viewer).await?;

        Ok(RecipePage {
            recipes,
            count,
            page: filter.page,
            limit: filter.limit,
        })
    }

    /// Attach tags, ingredient amounts and the viewer's markers to `models`,
    /// keeping their order.
    async fn load_recipes<C: ConnectionTrait>(
        &self,
        db: &C,
        models: Vec<recipes::Model>,
        viewer: Option<&str>,
    ) -> ResultEngine<Vec<Recipe>> {
        if models.is_empty() {
            return Ok(Vec::new());
        }
        let ids: Vec<i32> = models.iter().map(|model| model.id).collect();

        let mut tags_by_recipe: HashMap<i32, Vec<Tag>> = HashMap::new();
        for (link, tag) in recipe_tags::Entity::find()
            .filter(recipe_tags::Column::RecipeId.is_in(ids.clone()))
            .order_by_asc(recipe_tags::Column::TagId)
            .find_also_related(tags::Entity)
            .all(db)
            .await?
        {
            if let Some(tag) = tag {
                tags_by_recipe
                    .entry(link.recipe_id)
                    .or_default()
                    .push(Tag::from(tag));
            }
        }

        let mut ingredients_by_recipe: HashMap<i32, Vec<RecipeIngredient>> = HashMap::new();
        for (link, ingredient) in recipe_ingredients::Entity::find()
            .filter(recipe_ingredients::Column::RecipeId.is_in(ids.clone()))
            .order_by_asc(recipe_ingredients::Column::Id)
            .find_also_related(ingredients::Entity)
            .all(db)
            .await?
        {
            if let Some(ingredient) = ingredient {
                ingredients_by_recipe
                    .entry(link.recipe_id)
                    .or_default()
                    .push(RecipeIngredient {
                        id: ingredient.id,
                        name: ingredient.name,
                        measurement_unit: ingredient.measurement_unit,
                        amount: i32::from(link.amount),
                    });
            }
        }

        let (favorited, in_cart): (HashSet<i32>, HashSet<i32>) = match viewer {
            Some(user_id) => (
                favorites::Entity::find()
                    .filter(favorites::Column::UserId.eq(user_id))
                    .filter(favorites::Column::RecipeId.is_in(ids.clone()))
                    .all(db)
                    .await?
                    .into_iter()
                    .map(|row| row.recipe_id)
                    .collect(),
                shopping_cart::Entity::find()
                    .filter(shopping_cart::Column::UserId.eq(user_id))
                    .filter(shopping_cart::Column::RecipeId.is_in(ids))
                    .all(db)
                    .await?
                    .into_iter()
                    .map(|row| row.recipe_id)
                    .collect(),
            ),
            None => (HashSet::new(), HashSet::new()),
        };

        Ok(models
            .into_iter()
            .map(|model| Recipe {
                tags: tags_by_recipe.remove(&model.id).unwrap_or_default(),
                ingredients: ingredients_by_recipe.remove(&model.id).unwrap_or_default(),
                is_favorited: favorited.contains(&model.id),
                is_in_shopping_cart: in_cart.contains(&model.id),
                id: model.id,
                author: model.author_id,
                name: model.name,
                text: model.text,
                image: model.image,
                cooking_time: model.cooking_time,
            })
            .collect())
    }
}

async fn insert_ingredient_links(
    db_tx: &DatabaseTransaction,
    recipe_id: i32,
    items: &[ValidAmount],
) -> ResultEngine<()> {
    if items.is_empty() {
        return Ok(());
    }
    recipe_ingredients::Entity::insert_many(items.iter().map(|item| {
        recipe_ingredients::ActiveModel {
            recipe_id: ActiveValue::Set(recipe_id),
            ingredient_id: ActiveValue::Set(item.ingredient_id),
            amount: ActiveValue::Set(item.amount),
            ..Default::default()
        }
    }))
    .exec_without_returning(db_tx)
    .await?;
    Ok(())
}

async fn insert_tag_links(
    db_tx: &DatabaseTransaction,
    recipe_id: i32,
    tag_ids: &[i32],
) -> ResultEngine<()> {
    if tag_ids.is_empty() {
        return Ok(());
    }
    recipe_tags::Entity::insert_many(tag_ids.iter().map(|tag_id| recipe_tags::ActiveModel {
        recipe_id: ActiveValue::Set(recipe_id),
        tag_id: ActiveValue::Set(*tag_id),
    }))
    .exec_without_returning(db_tx)
    .await?;
    Ok(())
}
