use sea_orm::{
    FromQueryResult, JoinType, QueryFilter, QueryOrder, QuerySelect, prelude::*,
    sea_query::Query,
};

use crate::{
    ResultEngine, ShoppingList, ShoppingListLine, ingredients, recipe_ingredients, shopping_cart,
};

use super::Engine;

#[derive(Debug, FromQueryResult)]
struct AggregatedRow {
    name: String,
    measurement_unit: String,
    amount: i64,
}

impl Engine {
    /// Sum ingredient amounts over every recipe in the user's cart, one line
    /// per (name, unit) pair ordered by name then unit.
    pub async fn shopping_list(&self, user_id: &str) -> ResultEngine<ShoppingList> {
        let cart = Query::select()
            .column(shopping_cart::Column::RecipeId)
            .from(shopping_cart::Entity)
            .and_where(shopping_cart::Column::UserId.eq(user_id))
            .to_owned();

        let rows = recipe_ingredients::Entity::find()
            .select_only()
            .column_as(ingredients::Column::Name, "name")
            .column_as(ingredients::Column::MeasurementUnit, "measurement_unit")
            .column_as(recipe_ingredients::Column::Amount.sum(), "amount")
            .join(
                JoinType::InnerJoin,
                recipe_ingredients::Relation::Ingredient.def(),
            )
            .filter(recipe_ingredients::Column::RecipeId.in_subquery(cart))
            .group_by(ingredients::Column::Name)
            .group_by(ingredients::Column::MeasurementUnit)
            .order_by_asc(ingredients::Column::Name)
            .order_by_asc(ingredients::Column::MeasurementUnit)
            .into_model::<AggregatedRow>()
            .all(&self.database)
            .await?;

        Ok(ShoppingList::new(
            rows.into_iter()
                .map(|row| ShoppingListLine {
                    name: row.name,
                    measurement_unit: row.measurement_unit,
                    amount: row.amount,
                })
                .collect(),
        ))
    }
}
