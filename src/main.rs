mod app;
mod auth;
mod catalog;
mod config;
mod db;
mod error;
mod images;
mod recipes;
mod state;
mod storage;
mod users;
mod validation;

#[cfg(test)]
mod memory;
#[cfg(test)]
mod test_support;

use crate::config::AppConfig;
use crate::state::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let env_filter = std::env::var("RUST_LOG")
        .unwrap_or_else(|_| "recipe_api=debug,axum=info,tower_http=info".to_string());
    let json_logs = std::env::var("LOG_FORMAT")
        .map(|v| v == "json")
        .unwrap_or(false);

    if json_logs {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_target(false)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let config = AppConfig::from_env()?;
    let db = db::wait_for_db(&config).await;
    db::run_migrations(&db).await?;

    let host = config.host.clone();
    let port = config.port;
    let admin = config.admin.clone();
    let state = AppState::init(config, db).await?;

    if let Some(admin) = admin {
        users::services::ensure_superuser(&state, &admin.email, &admin.password).await?;
    }

    app::serve(app::build_app(state), &host, port).await
}
