use std::collections::HashMap;
use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection};

use pizzeria_core::catalog::repository::{CatalogRepository, StoreError};
use pizzeria_core::domain::ingredient::{Ingredient, IngredientId};
use pizzeria_core::domain::pizza::{Pizza, PizzaId, PizzaIngredient, PizzaIngredientId};
use pizzeria_core::domain::translation::Translations;

use super::RepositoryError;
use crate::DbPool;

const INGREDIENT_TRANSLATIONS: &str = "ingredient_translation";
const PIZZA_TRANSLATIONS: &str = "pizza_translation";

pub struct SqlCatalogRepository {
    pool: DbPool,
}

impl SqlCatalogRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    async fn load_ingredient(&self, id: IngredientId) -> Result<Option<Ingredient>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query("SELECT id, slug, cost, created_at FROM ingredient WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&mut *conn)
            .await?;

        match row {
            Some(ref row) => Ok(Some(ingredient_with_translations(&mut conn, row).await?)),
            None => Ok(None),
        }
    }

    async fn load_ingredient_by_slug(
        &self,
        slug: &str,
    ) -> Result<Option<Ingredient>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query("SELECT id, slug, cost, created_at FROM ingredient WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&mut *conn)
            .await?;

        match row {
            Some(ref row) => Ok(Some(ingredient_with_translations(&mut conn, row).await?)),
            None => Ok(None),
        }
    }

    async fn load_ingredients(&self) -> Result<Vec<Ingredient>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query("SELECT id, slug, cost, created_at FROM ingredient ORDER BY id")
            .fetch_all(&mut *conn)
            .await?;

        let mut ingredients = Vec::with_capacity(rows.len());
        for row in &rows {
            ingredients.push(ingredient_with_translations(&mut conn, row).await?);
        }
        Ok(ingredients)
    }

    async fn store_ingredient(&self, ingredient: Ingredient) -> Result<IngredientId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO ingredient (id, slug, cost, created_at)
             VALUES (?, ?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET
                 slug = excluded.slug,
                 cost = excluded.cost",
        )
        .bind(ingredient.id.map(|id| id.0))
        .bind(&ingredient.slug)
        .bind(ingredient.cost.to_string())
        .bind(ingredient.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        let id = ingredient.id.unwrap_or(IngredientId(result.last_insert_rowid()));
        upsert_translations(&mut *tx, INGREDIENT_TRANSLATIONS, id.0, &ingredient.translations)
            .await?;

        tx.commit().await?;
        Ok(id)
    }

    async fn load_pizza(&self, id: PizzaId) -> Result<Option<Pizza>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query("SELECT id, slug, created_at FROM pizza WHERE id = ?")
            .bind(id.0)
            .fetch_optional(&mut *conn)
            .await?;

        match row {
            Some(ref row) => Ok(Some(hydrate_pizza(&mut conn, row).await?)),
            None => Ok(None),
        }
    }

    async fn load_pizza_by_slug(&self, slug: &str) -> Result<Option<Pizza>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let row = sqlx::query("SELECT id, slug, created_at FROM pizza WHERE slug = ?")
            .bind(slug)
            .fetch_optional(&mut *conn)
            .await?;

        match row {
            Some(ref row) => Ok(Some(hydrate_pizza(&mut conn, row).await?)),
            None => Ok(None),
        }
    }

    async fn load_pizzas(&self) -> Result<Vec<Pizza>, RepositoryError> {
        let mut conn = self.pool.acquire().await?;
        let rows = sqlx::query("SELECT id, slug, created_at FROM pizza ORDER BY id")
            .fetch_all(&mut *conn)
            .await?;

        let mut pizzas = Vec::with_capacity(rows.len());
        for row in &rows {
            pizzas.push(hydrate_pizza(&mut conn, row).await?);
        }
        Ok(pizzas)
    }

    /// Writes the pizza row, its translations and the association changes in
    /// one transaction. Only removed rows are deleted, only moved rows are
    /// updated and only new rows are inserted, so a stale copy runs into the
    /// unique indexes instead of overwriting a concurrent save.
    async fn store_pizza(&self, pizza: Pizza) -> Result<PizzaId, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            "INSERT INTO pizza (id, slug, created_at)
             VALUES (?, ?, ?)
             ON CONFLICT(id) DO UPDATE SET slug = excluded.slug",
        )
        .bind(pizza.id.map(|id| id.0))
        .bind(&pizza.slug)
        .bind(pizza.created_at.to_rfc3339())
        .execute(&mut *tx)
        .await?;

        let id = pizza.id.unwrap_or(PizzaId(result.last_insert_rowid()));
        upsert_translations(&mut *tx, PIZZA_TRANSLATIONS, id.0, &pizza.translations).await?;
        merge_associations(&mut *tx, id, &pizza).await?;

        tx.commit().await?;
        Ok(id)
    }

    async fn remove(&self, table: &str, id: i64) -> Result<bool, RepositoryError> {
        let result = sqlx::query(&format!("DELETE FROM {table} WHERE id = ?"))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl CatalogRepository for SqlCatalogRepository {
    async fn find_ingredient(&self, id: IngredientId) -> Result<Option<Ingredient>, StoreError> {
        Ok(self.load_ingredient(id).await?)
    }

    async fn find_ingredient_by_slug(&self, slug: &str) -> Result<Option<Ingredient>, StoreError> {
        Ok(self.load_ingredient_by_slug(slug).await?)
    }

    async fn list_ingredients(&self) -> Result<Vec<Ingredient>, StoreError> {
        Ok(self.load_ingredients().await?)
    }

    async fn save_ingredient(&self, ingredient: Ingredient) -> Result<Ingredient, StoreError> {
        let id = self.store_ingredient(ingredient).await?;
        self.load_ingredient(id)
            .await?
            .ok_or_else(|| StoreError::Backend(format!("ingredient {id} vanished after save")))
    }

    async fn delete_ingredient(&self, id: IngredientId) -> Result<bool, StoreError> {
        Ok(self.remove("ingredient", id.0).await?)
    }

    async fn find_pizza(&self, id: PizzaId) -> Result<Option<Pizza>, StoreError> {
        Ok(self.load_pizza(id).await?)
    }

    async fn find_pizza_by_slug(&self, slug: &str) -> Result<Option<Pizza>, StoreError> {
        Ok(self.load_pizza_by_slug(slug).await?)
    }

    async fn list_pizzas(&self) -> Result<Vec<Pizza>, StoreError> {
        Ok(self.load_pizzas().await?)
    }

    async fn save_pizza(&self, pizza: Pizza) -> Result<Pizza, StoreError> {
        let id = self.store_pizza(pizza).await?;
        self.load_pizza(id)
            .await?
            .ok_or_else(|| StoreError::Backend(format!("pizza {id} vanished after save")))
    }

    async fn delete_pizza(&self, id: PizzaId) -> Result<bool, StoreError> {
        Ok(self.remove("pizza", id.0).await?)
    }
}

/// Applies deletes, then order updates, then inserts. Rows stored by a
/// concurrent save and unknown to `pizza` are left alone.
async fn merge_associations(
    conn: &mut SqliteConnection,
    pizza_id: PizzaId,
    pizza: &Pizza,
) -> Result<(), RepositoryError> {
    for removed in pizza.removed_associations() {
        sqlx::query("DELETE FROM pizza_ingredient WHERE id = ? AND pizza_id = ?")
            .bind(removed.0)
            .bind(pizza_id.0)
            .execute(&mut *conn)
            .await?;
    }

    let rows = sqlx::query("SELECT id, sort_order FROM pizza_ingredient WHERE pizza_id = ?")
        .bind(pizza_id.0)
        .fetch_all(&mut *conn)
        .await?;
    let mut stored_orders = HashMap::with_capacity(rows.len());
    for row in &rows {
        stored_orders.insert(decode::<i64>(row, "id")?, decode::<i64>(row, "sort_order")?);
    }

    for association in pizza.pizza_ingredients() {
        let Some(association_id) = association.id else {
            continue;
        };
        let order = i64::from(association.order);
        // rows missing here were deleted by a concurrent save and stay deleted
        if stored_orders.get(&association_id.0).is_some_and(|stored| *stored != order) {
            sqlx::query("UPDATE pizza_ingredient SET sort_order = ? WHERE id = ?")
                .bind(order)
                .bind(association_id.0)
                .execute(&mut *conn)
                .await?;
        }
    }

    for association in pizza.pizza_ingredients().iter().filter(|a| a.id.is_none()) {
        let ingredient_id = association.ingredient.id.ok_or_else(|| {
            RepositoryError::Decode(format!(
                "ingredient `{}` must be stored before it is attached",
                association.ingredient.slug
            ))
        })?;

        sqlx::query(
            "INSERT INTO pizza_ingredient (pizza_id, ingredient_id, sort_order) VALUES (?, ?, ?)",
        )
        .bind(pizza_id.0)
        .bind(ingredient_id.0)
        .bind(i64::from(association.order))
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

/// Translations are never removed, so each locale is written in place.
async fn upsert_translations(
    conn: &mut SqliteConnection,
    table: &str,
    owner_id: i64,
    translations: &Translations,
) -> Result<(), RepositoryError> {
    for translation in translations.iter() {
        sqlx::query(&format!(
            "INSERT INTO {table} (translatable_id, locale, name) VALUES (?, ?, ?)
             ON CONFLICT(translatable_id, locale) DO UPDATE SET name = excluded.name"
        ))
        .bind(owner_id)
        .bind(&translation.locale)
        .bind(&translation.name)
        .execute(&mut *conn)
        .await?;
    }
    Ok(())
}

async fn load_translations(
    conn: &mut SqliteConnection,
    table: &str,
    owner_id: i64,
) -> Result<Translations, RepositoryError> {
    let rows = sqlx::query(&format!(
        "SELECT locale, name FROM {table} WHERE translatable_id = ? ORDER BY locale"
    ))
    .bind(owner_id)
    .fetch_all(&mut *conn)
    .await?;

    let mut names = Vec::with_capacity(rows.len());
    for row in &rows {
        let locale: String = decode(row, "locale")?;
        let name: String = decode(row, "name")?;
        names.push((locale, name));
    }
    Ok(Translations::from_names(names))
}

async fn ingredient_with_translations(
    conn: &mut SqliteConnection,
    row: &SqliteRow,
) -> Result<Ingredient, RepositoryError> {
    let mut ingredient = row_to_ingredient(row, "id")?;
    if let Some(id) = ingredient.id {
        ingredient.translations = load_translations(conn, INGREDIENT_TRANSLATIONS, id.0).await?;
    }
    Ok(ingredient)
}

async fn hydrate_pizza(conn: &mut SqliteConnection, row: &SqliteRow) -> Result<Pizza, RepositoryError> {
    let id = PizzaId(decode(row, "id")?);
    let slug: String = decode(row, "slug")?;
    let created_at = parse_timestamp(&decode::<String>(row, "created_at")?)?;
    let translations = load_translations(conn, PIZZA_TRANSLATIONS, id.0).await?;

    let rows = sqlx::query(
        "SELECT pi.id AS association_id, pi.sort_order, i.id AS ingredient_id,
                i.slug, i.cost, i.created_at
         FROM pizza_ingredient pi
         JOIN ingredient i ON i.id = pi.ingredient_id
         WHERE pi.pizza_id = ?
         ORDER BY pi.sort_order",
    )
    .bind(id.0)
    .fetch_all(&mut *conn)
    .await?;

    let mut associations = Vec::with_capacity(rows.len());
    for row in &rows {
        let mut ingredient = row_to_ingredient(row, "ingredient_id")?;
        if let Some(ingredient_id) = ingredient.id {
            ingredient.translations =
                load_translations(conn, INGREDIENT_TRANSLATIONS, ingredient_id.0).await?;
        }
        let order: i64 = decode(row, "sort_order")?;
        let order = u32::try_from(order)
            .map_err(|_| RepositoryError::Decode(format!("invalid sort_order `{order}`")))?;

        associations.push(PizzaIngredient {
            id: Some(PizzaIngredientId(decode(row, "association_id")?)),
            ingredient,
            order,
        });
    }

    Ok(Pizza::restore(id, slug, created_at, translations, associations))
}

fn row_to_ingredient(row: &SqliteRow, id_column: &str) -> Result<Ingredient, RepositoryError> {
    let id: i64 = decode(row, id_column)?;
    let slug: String = decode(row, "slug")?;
    let cost = parse_decimal(&decode::<String>(row, "cost")?)?;
    let created_at = parse_timestamp(&decode::<String>(row, "created_at")?)?;

    let mut ingredient = Ingredient::new(slug, cost);
    ingredient.id = Some(IngredientId(id));
    ingredient.created_at = created_at;
    Ok(ingredient)
}

fn decode<'r, T>(row: &'r SqliteRow, column: &str) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, sqlx::Sqlite> + sqlx::Type<sqlx::Sqlite>,
{
    row.try_get(column).map_err(|e| RepositoryError::Decode(e.to_string()))
}

fn parse_decimal(value: &str) -> Result<Decimal, RepositoryError> {
    Decimal::from_str(value)
        .map_err(|e| RepositoryError::Decode(format!("invalid cost `{value}`: {e}")))
}

fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, RepositoryError> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| RepositoryError::Decode(format!("invalid timestamp `{value}`: {e}")))
}
