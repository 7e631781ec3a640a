use mellmap::config::Config;
use mellmap::db::SqliteStore;
use mellmap::engine::Engine;
use mellmap::error::Error;
use mellmap::server::serve;

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;

    tracing::info!(database = %config.database.display(), "opening catalog");

    let store = SqliteStore::new(&config.database, config.max_connections).await?;
    let engine = Engine::new(store).await?;

    serve(engine, &config).await
}
