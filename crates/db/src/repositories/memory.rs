use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use tokio::sync::RwLock;

use pizzeria_core::catalog::repository::{CatalogRepository, StoreError, UniqueConstraint};
use pizzeria_core::domain::ingredient::{Ingredient, IngredientId};
use pizzeria_core::domain::pizza::{Pizza, PizzaId, PizzaIngredient, PizzaIngredientId};

/// Catalog store backed by process memory. Enforces the same unique and
/// cascade rules as the SQL schema.
#[derive(Default)]
pub struct InMemoryCatalogRepository {
    state: RwLock<CatalogState>,
}

#[derive(Default)]
struct CatalogState {
    ingredients: BTreeMap<IngredientId, Ingredient>,
    pizzas: BTreeMap<PizzaId, Pizza>,
    last_id: i64,
}

impl CatalogState {
    fn next_id(&mut self) -> i64 {
        self.last_id += 1;
        self.last_id
    }

    /// Rebuilds a stored pizza with the current state of its ingredients.
    fn hydrate(&self, id: PizzaId, pizza: &Pizza) -> Pizza {
        let associations = pizza
            .pizza_ingredients()
            .iter()
            .filter_map(|association| {
                let ingredient = self.ingredients.get(&association.ingredient.id?)?.clone();
                Some(PizzaIngredient { id: association.id, ingredient, order: association.order })
            })
            .collect();

        Pizza::restore(
            id,
            pizza.slug.clone(),
            pizza.created_at,
            pizza.translations.clone(),
            associations,
        )
    }
}

#[async_trait]
impl CatalogRepository for InMemoryCatalogRepository {
    async fn find_ingredient(&self, id: IngredientId) -> Result<Option<Ingredient>, StoreError> {
        let state = self.state.read().await;
        Ok(state.ingredients.get(&id).cloned())
    }

    async fn find_ingredient_by_slug(&self, slug: &str) -> Result<Option<Ingredient>, StoreError> {
        let state = self.state.read().await;
        Ok(state.ingredients.values().find(|ingredient| ingredient.slug == slug).cloned())
    }

    async fn list_ingredients(&self) -> Result<Vec<Ingredient>, StoreError> {
        let state = self.state.read().await;
        Ok(state.ingredients.values().cloned().collect())
    }

    async fn save_ingredient(&self, mut ingredient: Ingredient) -> Result<Ingredient, StoreError> {
        let mut state = self.state.write().await;

        let slug_taken = state
            .ingredients
            .values()
            .any(|other| other.slug == ingredient.slug && other.id != ingredient.id);
        if slug_taken {
            return Err(StoreError::Conflict(UniqueConstraint::IngredientSlug));
        }

        let id = match ingredient.id {
            Some(id) => id,
            None => IngredientId(state.next_id()),
        };
        ingredient.id = Some(id);
        if let Some(stored) = state.ingredients.get(&id) {
            let mut translations = stored.translations.clone();
            translations.upsert_names(&ingredient.translations.names());
            ingredient.translations = translations;
        }
        state.ingredients.insert(id, ingredient.clone());
        Ok(ingredient)
    }

    async fn delete_ingredient(&self, id: IngredientId) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        if state.ingredients.remove(&id).is_none() {
            return Ok(false);
        }

        for (pizza_id, pizza) in state.pizzas.iter_mut() {
            let remaining: Vec<PizzaIngredient> = pizza
                .pizza_ingredients()
                .iter()
                .filter(|association| association.ingredient.id != Some(id))
                .cloned()
                .collect();
            *pizza = Pizza::restore(
                *pizza_id,
                pizza.slug.clone(),
                pizza.created_at,
                pizza.translations.clone(),
                remaining,
            );
        }
        Ok(true)
    }

    async fn find_pizza(&self, id: PizzaId) -> Result<Option<Pizza>, StoreError> {
        let state = self.state.read().await;
        Ok(state.pizzas.get(&id).map(|pizza| state.hydrate(id, pizza)))
    }

    async fn find_pizza_by_slug(&self, slug: &str) -> Result<Option<Pizza>, StoreError> {
        let state = self.state.read().await;
        Ok(state
            .pizzas
            .iter()
            .find(|(_, pizza)| pizza.slug == slug)
            .map(|(id, pizza)| state.hydrate(*id, pizza)))
    }

    async fn list_pizzas(&self) -> Result<Vec<Pizza>, StoreError> {
        let state = self.state.read().await;
        Ok(state.pizzas.iter().map(|(id, pizza)| state.hydrate(*id, pizza)).collect())
    }

    async fn save_pizza(&self, pizza: Pizza) -> Result<Pizza, StoreError> {
        let mut state = self.state.write().await;

        let slug_taken =
            state.pizzas.values().any(|other| other.slug == pizza.slug && other.id != pizza.id);
        if slug_taken {
            return Err(StoreError::Conflict(UniqueConstraint::PizzaSlug));
        }

        // stored rows minus the removed ones, like the SQL deletes
        let stored = pizza.id.and_then(|id| state.pizzas.get(&id));
        let removed: HashSet<PizzaIngredientId> =
            pizza.removed_associations().iter().copied().collect();
        let mut associations: Vec<PizzaIngredient> = stored
            .map(|stored| {
                stored
                    .pizza_ingredients()
                    .iter()
                    .filter(|association| {
                        association.id.is_some_and(|id| !removed.contains(&id))
                    })
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        let mut translations =
            stored.map(|stored| stored.translations.clone()).unwrap_or_default();
        translations.upsert_names(&pizza.translations.names());

        for association in pizza.pizza_ingredients() {
            let Some(kept) =
                associations.iter().position(|a| a.id.is_some() && a.id == association.id)
            else {
                continue;
            };
            let taken = associations
                .iter()
                .enumerate()
                .any(|(other, a)| other != kept && a.order == association.order);
            if taken {
                return Err(StoreError::Conflict(UniqueConstraint::PizzaIngredientOrder));
            }
            associations[kept].order = association.order;
        }

        for association in pizza.pizza_ingredients().iter().filter(|a| a.id.is_none()) {
            let ingredient_id = association.ingredient.id.ok_or_else(|| {
                StoreError::Backend(format!(
                    "ingredient `{}` must be stored before it is attached",
                    association.ingredient.slug
                ))
            })?;
            if !state.ingredients.contains_key(&ingredient_id) {
                return Err(StoreError::Backend(format!(
                    "ingredient {ingredient_id} does not exist"
                )));
            }
            if associations.iter().any(|a| a.ingredient.id == Some(ingredient_id)) {
                return Err(StoreError::Conflict(UniqueConstraint::PizzaIngredient));
            }
            if associations.iter().any(|a| a.order == association.order) {
                return Err(StoreError::Conflict(UniqueConstraint::PizzaIngredientOrder));
            }
            let mut association = association.clone();
            association.id = Some(PizzaIngredientId(state.next_id()));
            associations.push(association);
        }

        let id = match pizza.id {
            Some(id) => id,
            None => PizzaId(state.next_id()),
        };
        let stored =
            Pizza::restore(id, pizza.slug, pizza.created_at, translations, associations);
        let hydrated = state.hydrate(id, &stored);
        state.pizzas.insert(id, stored);
        Ok(hydrated)
    }

    async fn delete_pizza(&self, id: PizzaId) -> Result<bool, StoreError> {
        let mut state = self.state.write().await;
        Ok(state.pizzas.remove(&id).is_some())
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;

    use pizzeria_core::catalog::repository::{CatalogRepository, StoreError, UniqueConstraint};
    use pizzeria_core::domain::ingredient::Ingredient;
    use pizzeria_core::domain::pizza::Pizza;
    use pizzeria_core::domain::translation::Translatable;

    use super::InMemoryCatalogRepository;

    async fn stored(repository: &InMemoryCatalogRepository, slug: &str, cost: Decimal) -> Ingredient {
        repository.save_ingredient(Ingredient::new(slug, cost)).await.expect("save ingredient")
    }

    #[tokio::test]
    async fn in_memory_repository_enforces_unique_slugs() {
        let repository = InMemoryCatalogRepository::default();
        let first = stored(&repository, "tomato", Decimal::new(5, 1)).await;

        let error = repository
            .save_ingredient(Ingredient::new("tomato", Decimal::ONE))
            .await
            .expect_err("duplicate slug");
        let renamed = repository.save_ingredient(first.clone()).await.expect("re-save same id");

        assert_eq!(error, StoreError::Conflict(UniqueConstraint::IngredientSlug));
        assert_eq!(renamed.id, first.id);
    }

    #[tokio::test]
    async fn pizzas_read_current_ingredient_state() {
        let repository = InMemoryCatalogRepository::default();
        let mut tomato = stored(&repository, "tomato", Decimal::new(5, 1)).await;
        let mut pizza = Pizza::new("fun");
        pizza.set_ingredients([tomato.clone()]);
        let pizza = repository.save_pizza(pizza).await.expect("save pizza");

        tomato.cost = Decimal::TWO;
        repository.save_ingredient(tomato).await.expect("update cost");

        let reloaded =
            repository.find_pizza(pizza.id.expect("id")).await.expect("find").expect("stored");
        assert_eq!(reloaded.price(), Decimal::new(3, 0));
        assert!(reloaded.pizza_ingredients()[0].id.is_some());
    }

    #[tokio::test]
    async fn deleting_an_ingredient_cascades_to_pizzas() {
        let repository = InMemoryCatalogRepository::default();
        let tomato = stored(&repository, "tomato", Decimal::new(5, 1)).await;
        let bacon = stored(&repository, "bacon", Decimal::ONE).await;
        let mut pizza = Pizza::new("fun");
        pizza.set_ingredients([tomato.clone(), bacon]);
        let pizza = repository.save_pizza(pizza).await.expect("save pizza");

        assert!(repository.delete_ingredient(tomato.id.expect("id")).await.expect("delete"));

        let reloaded =
            repository.find_pizza(pizza.id.expect("id")).await.expect("find").expect("stored");
        let slugs: Vec<_> =
            reloaded.ingredients().map(|ingredient| ingredient.slug.as_str()).collect();
        assert_eq!(slugs, vec!["bacon"]);
    }

    #[tokio::test]
    async fn stale_copies_cannot_both_take_the_next_order() {
        let repository = InMemoryCatalogRepository::default();
        let tomato = stored(&repository, "tomato", Decimal::ONE).await;
        let feta = stored(&repository, "feta-cheese", Decimal::ONE).await;
        let bacon = stored(&repository, "bacon", Decimal::ONE).await;
        let mut pizza = Pizza::new("fun");
        pizza.set_ingredients([tomato]);
        let id = repository.save_pizza(pizza).await.expect("save pizza").id.expect("id");

        let mut first = repository.find_pizza(id).await.expect("find").expect("stored");
        let mut second = repository.find_pizza(id).await.expect("find").expect("stored");
        assert!(first.add_ingredient(feta, None));
        assert!(second.add_ingredient(bacon, None));

        repository.save_pizza(first).await.expect("first save wins");
        let error = repository.save_pizza(second).await.expect_err("order 2 is taken");

        assert_eq!(error, StoreError::Conflict(UniqueConstraint::PizzaIngredientOrder));
        let stored = repository.find_pizza(id).await.expect("find").expect("stored");
        assert_eq!(stored.pizza_ingredients().len(), 2);
    }

    #[tokio::test]
    async fn stale_copy_keeps_translations_added_meanwhile() {
        let repository = InMemoryCatalogRepository::default();
        let id = repository
            .save_pizza(Pizza::new("fun").with_names([("en", "Fun")]))
            .await
            .expect("save pizza")
            .id
            .expect("id");

        let mut first = repository.find_pizza(id).await.expect("find").expect("stored");
        let second = repository.find_pizza(id).await.expect("find").expect("stored");
        first.translate("fr").set_name("Amusante");
        first.merge_new_translations();
        repository.save_pizza(first).await.expect("add french");

        let saved = repository.save_pizza(second).await.expect("stale save");

        assert_eq!(saved.name_in("fr"), Some("Amusante"));
    }
}
