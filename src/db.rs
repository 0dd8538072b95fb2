use std::{future::Future, time::Duration};

use anyhow::Context;
use sqlx::{postgres::PgPoolOptions, PgPool};
use tracing::info;

use crate::config::AppConfig;

pub const RETRY_INTERVAL: Duration = Duration::from_secs(1);

/// Calls `probe` until it succeeds, sleeping `interval` between attempts.
/// There is no cutoff; startup simply blocks until the database answers.
pub async fn wait_until_ready<T, E, F, Fut>(mut probe: F, interval: Duration) -> T
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, E>>,
    E: std::fmt::Display,
{
    info!("Waiting for database...");
    loop {
        match probe().await {
            Ok(value) => {
                info!("Database available");
                return value;
            }
            Err(e) => {
                info!(error = %e, "Database unavailable, waiting 1 second...");
                tokio::time::sleep(interval).await;
            }
        }
    }
}

/// Connects to Postgres, retrying once a second until it accepts a connection.
pub async fn wait_for_db(config: &AppConfig) -> PgPool {
    let opts = PgPoolOptions::new().max_connections(config.db_max_connections);
    wait_until_ready(
        || {
            let opts = opts.clone();
            let url = config.database_url.clone();
            async move {
                let pool = opts.connect(&url).await?;
                sqlx::query("SELECT 1").execute(&pool).await?;
                Ok::<_, sqlx::Error>(pool)
            }
        },
        RETRY_INTERVAL,
    )
    .await
}

pub async fn run_migrations(db: &PgPool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations")
        .run(db)
        .await
        .context("run migrations")?;
    info!("migrations applied");
    Ok(())
}
