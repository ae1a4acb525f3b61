use std::collections::HashSet;

use sea_orm::{ActiveValue, QueryFilter, QueryOrder, TransactionTrait, prelude::*};

use crate::{
    EngineError, ImportReport, Ingredient, IngredientRecord, ResultEngine, ingredients,
    util::{MAX_NAME_LEN, normalize_key, normalize_required_text},
};

use super::{Engine, with_tx};

impl Engine {
    /// Ingredients whose name starts with `prefix`, ignoring case and
    /// accents. `None` or a blank prefix returns the whole catalogue.
    pub async fn search_ingredients(&self, prefix: Option<&str>) -> ResultEngine<Vec<Ingredient>> {
        let mut query = ingredients::Entity::find();
        let key = prefix.map(normalize_key).filter(|key| !key.is_empty());
        if let Some(key) = key {
            query = query.filter(ingredients::Column::NameNorm.starts_with(key.as_str()));
        }

        let models = query
            .order_by_asc(ingredients::Column::Name)
            .order_by_asc(ingredients::Column::MeasurementUnit)
            .all(&self.database)
            .await?;
        Ok(models.into_iter().map(Ingredient::from).collect())
    }

    pub async fn ingredient(&self, ingredient_id: i32) -> ResultEngine<Ingredient> {
        ingredients::Entity::find_by_id(ingredient_id)
            .one(&self.database)
            .await?
            .map(Ingredient::from)
            .ok_or_else(|| EngineError::KeyNotFound(format!("ingredient {ingredient_id}")))
    }

    /// Bulk-load ingredients in one transaction. Pairs of (name, unit) that
    /// already exist, in the database or earlier in `records`, are skipped.
    pub async fn import_ingredients(
        &self,
        records: &[IngredientRecord],
    ) -> ResultEngine<ImportReport> {
        let records = records
            .iter()
            .map(|record| {
                Ok((
                    normalize_required_text(&record.name, "name", Some(MAX_NAME_LEN))?,
                    normalize_required_text(
                        &record.measurement_unit,
                        "measurement_unit",
                        Some(MAX_NAME_LEN),
                    )?,
                ))
            })
            .collect::<ResultEngine<Vec<_>>>()?;

        with_tx!(self, |db_tx| {
            let mut report = ImportReport::default();
            let mut seen = HashSet::new();

            for (name, unit) in records {
                if !seen.insert((name.clone(), unit.clone())) {
                    report.skipped += 1;
                    continue;
                }

                let exists = ingredients::Entity::find()
                    .filter(ingredients::Column::Name.eq(name.clone()))
                    .filter(ingredients::Column::MeasurementUnit.eq(unit.clone()))
                    .one(&db_tx)
                    .await?
                    .is_some();
                if exists {
                    report.skipped += 1;
                    continue;
                }

                ingredients::ActiveModel {
                    name_norm: ActiveValue::Set(normalize_key(&name)),
                    name: ActiveValue::Set(name),
                    measurement_unit: ActiveValue::Set(unit),
                    ..Default::default()
                }
                .insert(&db_tx)
                .await?;
                report.created += 1;
            }

            Ok(report)
        })
    }

    /// Parse a JSON array of `{name, measurement_unit}` and import it.
    pub async fn import_ingredients_json(&self, json: &str) -> ResultEngine<ImportReport> {
        let records: Vec<IngredientRecord> = serde_json::from_str(json)
            .map_err(|err| EngineError::validation("ingredients", err.to_string()))?;
        tracing::info!("importing {} ingredient records", records.len());
        self.import_ingredients(&records).await
    }
}
