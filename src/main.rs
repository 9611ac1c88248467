use std::sync::Arc;

use color_eyre::eyre::Result;
use dotenv::dotenv;
use lessonbook_api::config::ApiConfig;
use lessonbook_core::store::Store;
use lessonbook_db::{PgStore, create_pool, schema::initialize_database};
use tracing::info;
use tracing_subscriber::FmtSubscriber;

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    dotenv().ok();

    let config = ApiConfig::from_env()?;

    let subscriber = FmtSubscriber::builder()
        .with_max_level(config.log_level)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let db_pool = create_pool(&config.database_url, config.database_max_connections).await?;
    initialize_database(&db_pool).await?;
    info!(
        "Studio policy: package validity {} month(s), timezone {}",
        config.policy.package_validity_months, config.policy.timezone
    );

    let store: Arc<dyn Store> = Arc::new(PgStore::new(db_pool));
    lessonbook_api::start_server(config, store).await?;

    Ok(())
}
