use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::json;

use pizzeria_core::catalog::commands::{
    AttachIngredient, CreateIngredient, CreatePizza, EditAssociationOrder, UpdateIngredient,
    UpdatePizza,
};
use pizzeria_core::catalog::repository::{CatalogRepository, StoreError};
use pizzeria_core::catalog::CatalogService;
use pizzeria_core::domain::ingredient::{Ingredient, IngredientId};
use pizzeria_core::domain::pizza::{Pizza, PizzaId};
use pizzeria_core::domain::translation::Translatable;
use pizzeria_core::errors::{ApplicationError, DomainError, MissingResource};
use pizzeria_core::validation::messages;
use pizzeria_db::{
    connect_with_settings, migrations::run_pending, InMemoryCatalogRepository, SqlCatalogRepository,
};

type TestResult<T = ()> = Result<T, String>;

async fn sql_repository() -> TestResult<Arc<dyn CatalogRepository>> {
    let pool = connect_with_settings("sqlite::memory:", 1, 30)
        .await
        .map_err(|error| format!("connect failed: {error}"))?;
    run_pending(&pool).await.map_err(|error| format!("migrations failed: {error}"))?;
    Ok(Arc::new(SqlCatalogRepository::new(pool)))
}

async fn repositories() -> TestResult<Vec<(&'static str, Arc<dyn CatalogRepository>)>> {
    Ok(vec![
        ("sql", sql_repository().await?),
        ("memory", Arc::new(InMemoryCatalogRepository::default())),
    ])
}

async fn ingredient(catalog: &CatalogService, slug: &str, cost: f64) -> TestResult<IngredientId> {
    let created = catalog
        .create_ingredient(
            CreateIngredient::parse(&json!({ "slug": slug, "cost": cost }))
                .map_err(|error| error.message)?,
        )
        .await
        .map_err(|error| format!("create {slug} failed: {error}"))?;
    created.id.ok_or_else(|| format!("{slug} should have an id"))
}

async fn empty_pizza(catalog: &CatalogService, slug: &str) -> TestResult<PizzaId> {
    let created = catalog
        .create_pizza(CreatePizza {
            slug: slug.to_owned(),
            translations: Default::default(),
            ingredients: Vec::new(),
        })
        .await
        .map_err(|error| format!("create {slug} failed: {error}"))?;
    created.id.ok_or_else(|| format!("{slug} should have an id"))
}

fn layout(pizza: &Pizza) -> Vec<(String, u32)> {
    pizza
        .pizza_ingredients()
        .iter()
        .map(|association| (association.ingredient.slug.clone(), association.order))
        .collect()
}

fn validation_message(error: &ApplicationError) -> Option<&str> {
    match error {
        ApplicationError::Domain(DomainError::Validation(validation)) => {
            Some(validation.message.as_str())
        }
        _ => None,
    }
}

#[tokio::test]
async fn tomato_and_feta_pizza_costs_two_and_a_quarter() -> TestResult {
    for (store, repository) in repositories().await? {
        let catalog = CatalogService::new(repository);
        let tomato = ingredient(&catalog, "tomato", 0.5).await?;
        let feta = ingredient(&catalog, "feta-cheese", 1.0).await?;

        let pizza = catalog
            .create_pizza(CreatePizza {
                slug: "fun".to_owned(),
                translations: [("en".to_owned(), "Fun".to_owned())].into_iter().collect(),
                ingredients: vec![tomato, feta],
            })
            .await
            .map_err(|error| format!("{store}: {error}"))?;

        assert_eq!(pizza.price(), Decimal::new(225, 2), "{store}");
        assert_eq!(pizza.name_in("en"), Some("Fun"), "{store}");
    }
    Ok(())
}

#[tokio::test]
async fn explicit_orders_are_read_back_sorted() -> TestResult {
    for (store, repository) in repositories().await? {
        let catalog = CatalogService::new(repository);
        let tomato = ingredient(&catalog, "tomato", 0.5).await?;
        let feta = ingredient(&catalog, "feta-cheese", 1.0).await?;
        let onion = ingredient(&catalog, "sliced-onion", 0.5).await?;
        let fun = empty_pizza(&catalog, "fun").await?;

        for (ingredient, order) in [(tomato, 1), (feta, 3), (onion, 2)] {
            catalog
                .attach_ingredient(fun, AttachIngredient { ingredient, order: Some(order) })
                .await
                .map_err(|error| format!("{store}: attach failed: {error}"))?;
        }

        let pizza = catalog.get_pizza(fun).await.map_err(|error| error.to_string())?;
        assert_eq!(
            layout(&pizza),
            vec![
                ("tomato".to_owned(), 1),
                ("sliced-onion".to_owned(), 2),
                ("feta-cheese".to_owned(), 3),
            ],
            "{store}"
        );
    }
    Ok(())
}

#[tokio::test]
async fn editing_into_a_taken_order_fails_and_keeps_state() -> TestResult {
    for (store, repository) in repositories().await? {
        let catalog = CatalogService::new(repository);
        let tomato = ingredient(&catalog, "tomato", 0.5).await?;
        let feta = ingredient(&catalog, "feta-cheese", 1.0).await?;
        let fun = empty_pizza(&catalog, "fun").await?;
        catalog
            .attach_ingredient(fun, AttachIngredient { ingredient: tomato, order: Some(1) })
            .await
            .map_err(|error| error.to_string())?;
        catalog
            .attach_ingredient(fun, AttachIngredient { ingredient: feta, order: Some(3) })
            .await
            .map_err(|error| error.to_string())?;
        let before = catalog.get_pizza(fun).await.map_err(|error| error.to_string())?;

        let error = catalog
            .edit_association_order(fun, tomato, EditAssociationOrder { order: 3 })
            .await
            .err()
            .ok_or_else(|| format!("{store}: order 3 should be rejected"))?;

        assert_eq!(validation_message(&error), Some(messages::ORDER_TAKEN), "{store}");
        let after = catalog.get_pizza(fun).await.map_err(|error| error.to_string())?;
        assert_eq!(layout(&after), layout(&before), "{store}");

        let moved = catalog
            .edit_association_order(fun, tomato, EditAssociationOrder { order: 4 })
            .await
            .map_err(|error| error.to_string())?;
        assert_eq!(
            layout(&moved),
            vec![("feta-cheese".to_owned(), 3), ("tomato".to_owned(), 4)],
            "{store}"
        );
    }
    Ok(())
}

#[tokio::test]
async fn attach_reports_conflicts_instead_of_ignoring_them() -> TestResult {
    for (store, repository) in repositories().await? {
        let catalog = CatalogService::new(repository);
        let tomato = ingredient(&catalog, "tomato", 0.5).await?;
        let bacon = ingredient(&catalog, "bacon", 1.0).await?;
        let fun = empty_pizza(&catalog, "fun").await?;
        catalog
            .attach_ingredient(fun, AttachIngredient { ingredient: tomato, order: None })
            .await
            .map_err(|error| error.to_string())?;

        let again = catalog
            .attach_ingredient(fun, AttachIngredient { ingredient: tomato, order: None })
            .await
            .err()
            .ok_or("re-attaching should fail")?;
        let taken = catalog
            .attach_ingredient(fun, AttachIngredient { ingredient: bacon, order: Some(1) })
            .await
            .err()
            .ok_or("order 1 is taken")?;
        let unknown = catalog
            .attach_ingredient(fun, AttachIngredient { ingredient: IngredientId(999), order: None })
            .await
            .err()
            .ok_or("unknown ingredient")?;

        assert_eq!(
            validation_message(&again),
            Some(messages::INGREDIENT_ALREADY_ATTACHED),
            "{store}"
        );
        assert_eq!(validation_message(&taken), Some(messages::ORDER_TAKEN), "{store}");
        assert_eq!(validation_message(&unknown), Some(messages::INGREDIENT_UNKNOWN), "{store}");

        let pizza = catalog
            .attach_ingredient(fun, AttachIngredient { ingredient: bacon, order: None })
            .await
            .map_err(|error| error.to_string())?;
        assert_eq!(
            layout(&pizza),
            vec![("tomato".to_owned(), 1), ("bacon".to_owned(), 2)],
            "{store}"
        );
    }
    Ok(())
}

#[tokio::test]
async fn duplicate_slug_create_fails_and_keeps_first_entity() -> TestResult {
    for (store, repository) in repositories().await? {
        let catalog = CatalogService::new(repository);
        let tomato = ingredient(&catalog, "tomato", 0.5).await?;

        let error = catalog
            .create_ingredient(CreateIngredient {
                slug: "tomato".to_owned(),
                cost: Decimal::new(9, 0),
                translations: Default::default(),
            })
            .await
            .err()
            .ok_or("duplicate slug should fail")?;

        assert_eq!(validation_message(&error), Some(messages::INGREDIENT_SLUG_TAKEN), "{store}");
        let stored = catalog.get_ingredient(tomato).await.map_err(|error| error.to_string())?;
        assert_eq!(stored.cost, Decimal::new(5, 1), "{store}");
    }
    Ok(())
}

#[tokio::test]
async fn deleting_tomato_detaches_it_and_keeps_the_pizza() -> TestResult {
    for (store, repository) in repositories().await? {
        let catalog = CatalogService::new(repository);
        let tomato = ingredient(&catalog, "tomato", 0.5).await?;
        let feta = ingredient(&catalog, "feta-cheese", 1.0).await?;
        let onion = ingredient(&catalog, "sliced-onion", 0.5).await?;
        let fun = catalog
            .create_pizza(CreatePizza {
                slug: "fun".to_owned(),
                translations: Default::default(),
                ingredients: vec![tomato, onion, feta],
            })
            .await
            .map_err(|error| error.to_string())?
            .id
            .ok_or("pizza id")?;

        catalog.delete_ingredient(tomato).await.map_err(|error| error.to_string())?;

        let pizza = catalog.get_pizza(fun).await.map_err(|error| error.to_string())?;
        assert_eq!(
            layout(&pizza),
            vec![("sliced-onion".to_owned(), 2), ("feta-cheese".to_owned(), 3)],
            "{store}"
        );
        assert_eq!(pizza.price(), Decimal::new(225, 2), "{store}");
    }
    Ok(())
}

#[tokio::test]
async fn removing_an_association_leaves_a_gap() -> TestResult {
    for (store, repository) in repositories().await? {
        let catalog = CatalogService::new(repository);
        let a = ingredient(&catalog, "tomato", 0.5).await?;
        let b = ingredient(&catalog, "bacon", 1.0).await?;
        let c = ingredient(&catalog, "oregano", 1.0).await?;
        let fun = catalog
            .create_pizza(CreatePizza {
                slug: "fun".to_owned(),
                translations: Default::default(),
                ingredients: vec![a, b, c],
            })
            .await
            .map_err(|error| error.to_string())?
            .id
            .ok_or("pizza id")?;

        let pizza = catalog.remove_association(fun, b).await.map_err(|error| error.to_string())?;
        let orders: Vec<u32> = pizza.pizza_ingredients().iter().map(|a| a.order).collect();
        assert_eq!(orders, vec![1, 3], "{store}");

        let missing = catalog.remove_association(fun, b).await.err().ok_or("already removed")?;
        assert!(
            matches!(missing, ApplicationError::Domain(DomainError::NotFound(MissingResource::Association { .. }))),
            "{store}"
        );
    }
    Ok(())
}

#[tokio::test]
async fn updates_apply_only_present_fields() -> TestResult {
    for (store, repository) in repositories().await? {
        let catalog = CatalogService::new(repository);
        let tomato = catalog
            .create_ingredient(
                CreateIngredient::parse(&json!({
                    "slug": "tomato",
                    "cost": 0.5,
                    "translations": { "en": "Tomato", "fr": "Tomate" }
                }))
                .map_err(|error| error.message)?,
            )
            .await
            .map_err(|error| error.to_string())?
            .id
            .ok_or("ingredient id")?;

        let update = UpdateIngredient::parse(&json!({ "cost": "0.75", "translations": { "en": "Tomatoes" } }))
            .map_err(|error| error.message)?;
        let updated =
            catalog.update_ingredient(tomato, update).await.map_err(|error| error.to_string())?;

        assert_eq!(updated.slug, "tomato", "{store}");
        assert_eq!(updated.cost, Decimal::new(75, 2), "{store}");
        assert_eq!(updated.name_in("en"), Some("Tomatoes"), "{store}");
        assert_eq!(updated.name_in("fr"), Some("Tomate"), "{store}");

        let bacon = ingredient(&catalog, "bacon", 1.0).await?;
        let fun = catalog
            .create_pizza(CreatePizza {
                slug: "fun".to_owned(),
                translations: Default::default(),
                ingredients: vec![bacon],
            })
            .await
            .map_err(|error| error.to_string())?
            .id
            .ok_or("pizza id")?;

        let renamed = catalog
            .update_pizza(fun, UpdatePizza { slug: Some("fun-two".to_owned()), ..UpdatePizza::default() })
            .await
            .map_err(|error| error.to_string())?;
        assert_eq!(layout(&renamed), vec![("bacon".to_owned(), 1)], "{store}");

        let replaced = catalog
            .update_pizza(
                fun,
                UpdatePizza { ingredients: Some(vec![tomato, bacon]), ..UpdatePizza::default() },
            )
            .await
            .map_err(|error| error.to_string())?;
        assert_eq!(
            layout(&replaced),
            vec![("tomato".to_owned(), 1), ("bacon".to_owned(), 2)],
            "{store}"
        );
        assert_eq!(replaced.slug, "fun-two", "{store}");
    }
    Ok(())
}

#[tokio::test]
async fn missing_path_resources_are_not_found() -> TestResult {
    for (store, repository) in repositories().await? {
        let catalog = CatalogService::new(repository);

        let pizza = catalog.get_pizza(PizzaId(42)).await.err().ok_or("no pizza 42")?;
        let deleted = catalog.delete_ingredient(IngredientId(42)).await.err().ok_or("no 42")?;
        let attach = catalog
            .attach_ingredient(PizzaId(42), AttachIngredient { ingredient: IngredientId(1), order: None })
            .await
            .err()
            .ok_or("no pizza 42 to attach to")?;

        assert!(
            matches!(pizza, ApplicationError::Domain(DomainError::NotFound(MissingResource::Pizza(_)))),
            "{store}"
        );
        assert!(
            matches!(
                deleted,
                ApplicationError::Domain(DomainError::NotFound(MissingResource::Ingredient(_)))
            ),
            "{store}"
        );
        assert!(
            matches!(attach, ApplicationError::Domain(DomainError::NotFound(MissingResource::Pizza(_)))),
            "{store}"
        );
    }
    Ok(())
}

/// Hides existing slugs from the catalog's pre-check and optionally serves a
/// pizza read before another writer committed, the way a concurrent request
/// would see the store between its read and its write.
struct RacingRepository {
    inner: Arc<dyn CatalogRepository>,
    stale_pizza: Option<Pizza>,
}

impl RacingRepository {
    fn hiding_slugs(inner: Arc<dyn CatalogRepository>) -> Self {
        Self { inner, stale_pizza: None }
    }

    async fn reading_stale(inner: Arc<dyn CatalogRepository>, id: PizzaId) -> TestResult<Self> {
        let snapshot = inner
            .find_pizza(id)
            .await
            .map_err(|error| error.to_string())?
            .ok_or("pizza to snapshot")?;
        Ok(Self { inner, stale_pizza: Some(snapshot) })
    }
}

#[async_trait]
impl CatalogRepository for RacingRepository {
    async fn find_ingredient(&self, id: IngredientId) -> Result<Option<Ingredient>, StoreError> {
        self.inner.find_ingredient(id).await
    }

    async fn find_ingredient_by_slug(&self, _slug: &str) -> Result<Option<Ingredient>, StoreError> {
        Ok(None)
    }

    async fn list_ingredients(&self) -> Result<Vec<Ingredient>, StoreError> {
        self.inner.list_ingredients().await
    }

    async fn save_ingredient(&self, ingredient: Ingredient) -> Result<Ingredient, StoreError> {
        self.inner.save_ingredient(ingredient).await
    }

    async fn delete_ingredient(&self, id: IngredientId) -> Result<bool, StoreError> {
        self.inner.delete_ingredient(id).await
    }

    async fn find_pizza(&self, id: PizzaId) -> Result<Option<Pizza>, StoreError> {
        match &self.stale_pizza {
            Some(stale) if stale.id == Some(id) => Ok(Some(stale.clone())),
            _ => self.inner.find_pizza(id).await,
        }
    }

    async fn find_pizza_by_slug(&self, _slug: &str) -> Result<Option<Pizza>, StoreError> {
        Ok(None)
    }

    async fn list_pizzas(&self) -> Result<Vec<Pizza>, StoreError> {
        self.inner.list_pizzas().await
    }

    async fn save_pizza(&self, pizza: Pizza) -> Result<Pizza, StoreError> {
        self.inner.save_pizza(pizza).await
    }

    async fn delete_pizza(&self, id: PizzaId) -> Result<bool, StoreError> {
        self.inner.delete_pizza(id).await
    }
}

#[tokio::test]
async fn storage_level_unique_violation_surfaces_as_validation_error() -> TestResult {
    for (store, inner) in repositories().await? {
        let catalog = CatalogService::new(Arc::new(RacingRepository::hiding_slugs(inner)));
        empty_pizza(&catalog, "fun").await?;

        let error = catalog
            .create_pizza(CreatePizza {
                slug: "fun".to_owned(),
                translations: Default::default(),
                ingredients: Vec::new(),
            })
            .await
            .err()
            .ok_or("second pizza with the same slug should fail")?;

        assert_eq!(validation_message(&error), Some(messages::PIZZA_SLUG_TAKEN), "{store}");
    }
    Ok(())
}

#[tokio::test]
async fn stale_attach_cannot_overwrite_a_concurrent_attach() -> TestResult {
    let repository = sql_repository().await?;
    let fresh = CatalogService::new(repository.clone());
    let tomato = ingredient(&fresh, "tomato", 0.5).await?;
    let feta = ingredient(&fresh, "feta-cheese", 1.0).await?;
    let bacon = ingredient(&fresh, "bacon", 1.0).await?;
    let fun = empty_pizza(&fresh, "fun").await?;
    fresh
        .attach_ingredient(fun, AttachIngredient { ingredient: tomato, order: None })
        .await
        .map_err(|error| error.to_string())?;
    let stale = CatalogService::new(Arc::new(
        RacingRepository::reading_stale(repository.clone(), fun).await?,
    ));

    fresh
        .attach_ingredient(fun, AttachIngredient { ingredient: feta, order: None })
        .await
        .map_err(|error| error.to_string())?;
    let error = stale
        .attach_ingredient(fun, AttachIngredient { ingredient: bacon, order: None })
        .await
        .err()
        .ok_or("the stale copy still sees order 2 as free")?;

    assert_eq!(validation_message(&error), Some(messages::ORDER_TAKEN));
    let pizza = fresh.get_pizza(fun).await.map_err(|error| error.to_string())?;
    assert_eq!(layout(&pizza), vec![("tomato".to_owned(), 1), ("feta-cheese".to_owned(), 2)]);
    Ok(())
}

#[tokio::test]
async fn stale_reorder_cannot_take_an_order_moved_into_meanwhile() -> TestResult {
    let repository = sql_repository().await?;
    let fresh = CatalogService::new(repository.clone());
    let tomato = ingredient(&fresh, "tomato", 0.5).await?;
    let feta = ingredient(&fresh, "feta-cheese", 1.0).await?;
    let fun = fresh
        .create_pizza(CreatePizza {
            slug: "fun".to_owned(),
            translations: Default::default(),
            ingredients: vec![tomato, feta],
        })
        .await
        .map_err(|error| error.to_string())?
        .id
        .ok_or("pizza id")?;
    let stale = CatalogService::new(Arc::new(
        RacingRepository::reading_stale(repository.clone(), fun).await?,
    ));

    fresh
        .edit_association_order(fun, tomato, EditAssociationOrder { order: 3 })
        .await
        .map_err(|error| error.to_string())?;
    let error = stale
        .edit_association_order(fun, feta, EditAssociationOrder { order: 3 })
        .await
        .err()
        .ok_or("the stale copy still sees order 3 as free")?;

    assert_eq!(validation_message(&error), Some(messages::ORDER_TAKEN));
    let pizza = fresh.get_pizza(fun).await.map_err(|error| error.to_string())?;
    assert_eq!(layout(&pizza), vec![("feta-cheese".to_owned(), 2), ("tomato".to_owned(), 3)]);
    Ok(())
}
