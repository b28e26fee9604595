use std::collections::BTreeMap;

use rust_decimal::Decimal;
use tracing::info;

use pizzeria_core::catalog::commands::{CreateIngredient, CreatePizza, Names};
use pizzeria_core::catalog::CatalogService;
use pizzeria_core::domain::ingredient::IngredientId;
use pizzeria_core::errors::{ApplicationError, ValidationError};
use pizzeria_core::validation::messages;

struct SeedIngredient {
    slug: &'static str,
    cost: Decimal,
    names: &'static [(&'static str, &'static str)],
}

struct SeedPizza {
    slug: &'static str,
    names: &'static [(&'static str, &'static str)],
    ingredients: &'static [&'static str],
}

const HALF: Decimal = Decimal::from_parts(5, 0, 0, false, 1); // 0.5

/// Demo catalog: eight ingredients and two pizzas named in English and French.
const SEED_INGREDIENTS: &[SeedIngredient] = &[
    SeedIngredient { slug: "tomato", cost: HALF, names: &[("en", "Tomato"), ("fr", "Tomate")] },
    SeedIngredient {
        slug: "sliced-mushrooms",
        cost: HALF,
        names: &[("en", "Sliced mushrooms"), ("fr", "Champignons en rondelles")],
    },
    SeedIngredient {
        slug: "feta-cheese",
        cost: Decimal::ONE,
        names: &[("en", "Feta cheese"), ("fr", "Feta")],
    },
    SeedIngredient {
        slug: "sausages",
        cost: Decimal::ONE,
        names: &[("en", "Sausages"), ("fr", "Saucisses")],
    },
    SeedIngredient {
        slug: "sliced-onion",
        cost: HALF,
        names: &[("en", "Sliced onion"), ("fr", "Oignons en rondelles")],
    },
    SeedIngredient {
        slug: "mozzarella-cheese",
        cost: HALF,
        names: &[("en", "Mozzarella cheese"), ("fr", "Mozzarella")],
    },
    SeedIngredient {
        slug: "oregano",
        cost: Decimal::ONE,
        names: &[("en", "Oregano"), ("fr", "Origan")],
    },
    SeedIngredient {
        slug: "bacon",
        cost: Decimal::ONE,
        names: &[("en", "Bacon"), ("fr", "Bacon")],
    },
];

const SEED_PIZZAS: &[SeedPizza] = &[
    SeedPizza {
        slug: "fun",
        names: &[("en", "Fun"), ("fr", "Fun")],
        ingredients: &[
            "tomato",
            "sliced-mushrooms",
            "feta-cheese",
            "sausages",
            "sliced-onion",
            "mozzarella-cheese",
            "oregano",
        ],
    },
    SeedPizza {
        slug: "super-mushroom",
        names: &[("en", "Super Mushroom"), ("fr", "Super Champignons")],
        ingredients: &["tomato", "bacon", "mozzarella-cheese", "sliced-onion", "oregano"],
    },
];

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SeedResult {
    pub ingredients_created: usize,
    pub ingredients_skipped: usize,
    pub pizzas_created: usize,
    pub pizzas_skipped: usize,
}

/// Loads the demo catalog through the catalog service. Entries whose slug
/// already exists are left untouched, so loading twice is harmless.
pub struct CatalogFixtures;

impl CatalogFixtures {
    pub async fn load(catalog: &CatalogService) -> Result<SeedResult, ApplicationError> {
        let mut result = SeedResult::default();

        let mut ingredient_ids: BTreeMap<String, IngredientId> = catalog
            .list_ingredients()
            .await?
            .into_iter()
            .filter_map(|ingredient| ingredient.id.map(|id| (ingredient.slug, id)))
            .collect();

        for seed in SEED_INGREDIENTS {
            if ingredient_ids.contains_key(seed.slug) {
                result.ingredients_skipped += 1;
                continue;
            }

            let created = catalog
                .create_ingredient(CreateIngredient {
                    slug: seed.slug.to_owned(),
                    cost: seed.cost,
                    translations: names(seed.names),
                })
                .await?;
            if let Some(id) = created.id {
                ingredient_ids.insert(created.slug, id);
            }
            result.ingredients_created += 1;
        }

        let existing_pizzas: Vec<String> =
            catalog.list_pizzas().await?.into_iter().map(|pizza| pizza.slug).collect();

        for seed in SEED_PIZZAS {
            if existing_pizzas.iter().any(|slug| slug == seed.slug) {
                result.pizzas_skipped += 1;
                continue;
            }

            let ingredients = seed
                .ingredients
                .iter()
                .map(|slug| {
                    ingredient_ids.get(*slug).copied().ok_or_else(|| {
                        ValidationError::new("ingredients", messages::INGREDIENT_UNKNOWN)
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;

            catalog
                .create_pizza(CreatePizza {
                    slug: seed.slug.to_owned(),
                    translations: names(seed.names),
                    ingredients,
                })
                .await?;
            result.pizzas_created += 1;
        }

        info!(
            event_name = "fixtures.catalog.loaded",
            ingredients_created = result.ingredients_created,
            ingredients_skipped = result.ingredients_skipped,
            pizzas_created = result.pizzas_created,
            pizzas_skipped = result.pizzas_skipped,
            "demo catalog loaded"
        );
        Ok(result)
    }
}

fn names(pairs: &[(&str, &str)]) -> Names {
    pairs.iter().map(|(locale, name)| ((*locale).to_owned(), (*name).to_owned())).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use rust_decimal::Decimal;

    use pizzeria_core::catalog::CatalogService;
    use pizzeria_core::domain::translation::Translatable;

    use super::{CatalogFixtures, SeedResult};
    use crate::repositories::InMemoryCatalogRepository;

    #[tokio::test]
    async fn fixtures_load_catalog_and_are_idempotent() {
        let catalog = CatalogService::new(Arc::new(InMemoryCatalogRepository::default()));

        let first = CatalogFixtures::load(&catalog).await.expect("first load");
        let second = CatalogFixtures::load(&catalog).await.expect("second load");

        assert_eq!(
            first,
            SeedResult {
                ingredients_created: 8,
                ingredients_skipped: 0,
                pizzas_created: 2,
                pizzas_skipped: 0,
            }
        );
        assert_eq!(
            second,
            SeedResult {
                ingredients_created: 0,
                ingredients_skipped: 8,
                pizzas_created: 0,
                pizzas_skipped: 2,
            }
        );
    }

    #[tokio::test]
    async fn fun_pizza_is_priced_from_its_seven_ingredients() {
        let catalog = CatalogService::new(Arc::new(InMemoryCatalogRepository::default()));
        CatalogFixtures::load(&catalog).await.expect("load");

        let pizzas = catalog.list_pizzas().await.expect("list");
        let fun = pizzas.iter().find(|pizza| pizza.slug == "fun").expect("fun pizza");
        let mushroom =
            pizzas.iter().find(|pizza| pizza.slug == "super-mushroom").expect("super mushroom");

        assert_eq!(fun.pizza_ingredients().len(), 7);
        assert_eq!(fun.price(), Decimal::new(75, 1));
        assert_eq!(mushroom.name_in("fr"), Some("Super Champignons"));
        assert_eq!(mushroom.pizza_ingredients()[1].ingredient.slug, "bacon");
        assert_eq!(mushroom.pizza_ingredients()[1].order, 2);
    }
}
