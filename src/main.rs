// main.rs
use std::sync::Arc;
use std::time::Duration;

use poem::listener::TcpListener;
use poem_blog_api::{
    AppState, auth::JwtKeys, build_app, config::Config, migration::Migrator, services,
};
use sea_orm::{ConnectOptions, Database, DatabaseConnection};
use sea_orm_migration::MigratorTrait;
use tracing_subscriber::EnvFilter;

/// Periodic rebuild of recommended friends and cleanup of read follow activity
fn spawn_maintenance(db: DatabaseConnection, every: Duration) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(every);
        loop {
            interval.tick().await;
            if let Err(err) = services::recommended::rebuild(&db).await {
                tracing::error!(error = %err, "recommended friends rebuild failed");
            }
            if let Err(err) = services::activity::delete_read_follow_actions(&db).await {
                tracing::error!(error = %err, "follow activity cleanup failed");
            }
        }
    });
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let config = Config::from_env()?;

    let mut options = ConnectOptions::new(config.database.url.clone());
    options
        .max_connections(config.database.max_connections)
        .min_connections(config.database.min_connections)
        .sqlx_logging(false);
    let db = Database::connect(options).await?;
    Migrator::up(&db, None).await?;

    spawn_maintenance(db.clone(), Duration::from_secs(config.maintenance.interval_secs.max(1)));

    let keys = JwtKeys::new(&config.auth.jwt_secret, config.auth.jwt_ttl_secs);
    let state = Arc::new(AppState::new(db, keys));
    let app = build_app(state);

    let addr = config.bind_addr();
    tracing::info!(%addr, "blog api listening");
    poem::Server::new(TcpListener::bind(addr)).run(app).await?;
    Ok(())
}
