use std::sync::Arc;

use crate::commands::{open_pool, prepare, CommandResult};
use pizzeria_core::catalog::CatalogService;
use pizzeria_db::{migrations, CatalogFixtures, SeedResult, SqlCatalogRepository};

pub fn run() -> CommandResult {
    let (config, runtime) = match prepare("seed") {
        Ok(prepared) => prepared,
        Err(result) => return result,
    };

    let result = runtime.block_on(async {
        let pool = open_pool(&config).await?;
        migrations::run_pending(&pool)
            .await
            .map_err(|error| ("migration", error.to_string(), 5u8))?;

        let catalog = CatalogService::new(Arc::new(SqlCatalogRepository::new(pool.clone())));
        let loaded = CatalogFixtures::load(&catalog).await;

        pool.close().await;
        loaded.map_err(|error| ("seed_execution", error.to_string(), 6u8))
    });

    match result {
        Ok(seeded) => CommandResult::success("seed", summary(&seeded)),
        Err(failure) => CommandResult::from_step("seed", failure),
    }
}

fn summary(result: &SeedResult) -> String {
    format!(
        "demo catalog loaded: {} ingredients created ({} already present), {} pizzas created ({} already present)",
        result.ingredients_created,
        result.ingredients_skipped,
        result.pizzas_created,
        result.pizzas_skipped
    )
}

#[cfg(test)]
mod tests {
    use pizzeria_db::SeedResult;

    use super::summary;

    #[test]
    fn summary_reports_created_and_skipped_counts() {
        let message = summary(&SeedResult {
            ingredients_created: 0,
            ingredients_skipped: 8,
            pizzas_created: 1,
            pizzas_skipped: 1,
        });

        assert_eq!(
            message,
            "demo catalog loaded: 0 ingredients created (8 already present), 1 pizzas created (1 already present)"
        );
    }
}
