use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    EngineError, ResultEngine, Tag, tags,
    util::{MAX_NAME_LEN, normalize_color, normalize_required_text, normalize_slug},
};

use super::{Engine, with_tx};

impl Engine {
    /// Every tag, ordered by id.
    pub async fn list_tags(&self) -> ResultEngine<Vec<Tag>> {
        let models = tags::Entity::find()
            .order_by_asc(tags::Column::Id)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Tag::from).collect())
    }

    pub async fn tag(&self, tag_id: i32) -> ResultEngine<Tag> {
        tags::Entity::find_by_id(tag_id)
            .one(&self.database)
            .await?
            .map(Tag::from)
            .ok_or_else(|| EngineError::KeyNotFound(format!("tag {tag_id}")))
    }

    /// Create a tag. Name, color and slug must each be unique.
    pub async fn create_tag(&self, name: &str, color: &str, slug: &str) -> ResultEngine<Tag> {
        let name = normalize_required_text(name, "name", Some(MAX_NAME_LEN))?;
        let color = normalize_color(color)?;
        let slug = normalize_slug(slug)?;

        with_tx!(self, |db_tx| {
            let clash = tags::Entity::find()
                .filter(
                    tags::Column::Name
                        .eq(name.clone())
                        .or(tags::Column::Color.eq(color.clone()))
                        .or(tags::Column::Slug.eq(slug.clone())),
                )
                .one(&db_tx)
                .await?;
            if let Some(existing) = clash {
                let key = if existing.name == name {
                    name
                } else if existing.color == color {
                    color
                } else {
                    slug
                };
                return Err(EngineError::ExistingKey(key));
            }

            let model = tags::ActiveModel {
                name: ActiveValue::Set(name),
                color: ActiveValue::Set(color),
                slug: ActiveValue::Set(slug),
                ..Default::default()
            }
            .insert(&db_tx)
            .await?;
            Ok(Tag::from(model))
        })
    }
}
