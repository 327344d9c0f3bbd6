use std::sync::Arc;

use circle_trending::{
    config::Config,
    db::{create_pool, create_redis_client, LeaderboardCache, PgContentStore},
    routes::{create_router, AppState},
    services::LeaderboardService,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::registry()
        .with(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "circle_trending=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    let settings = config.leaderboard_settings()?;

    let pool = create_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    let store = Arc::new(PgContentStore::new(pool));

    let redis_client = create_redis_client(&config.redis_url)?;
    let (cache, cache_writer) = LeaderboardCache::spawn(redis_client);

    let leaderboards =
        LeaderboardService::new(store.clone(), store, settings).with_cache(cache);
    let app = create_router(Arc::new(AppState { leaderboards }));

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!(addr = %addr, "Trending service listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    cache_writer.shutdown().await;
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutdown signal received");
}
