use sqlx::{postgres::PgPoolOptions, PgPool};

use crate::config::AppConfig;

/// Connects to Postgres and applies migrations.
///
/// An unreachable database does not stop the server: the failure is logged
/// and a lazy pool is returned, so individual requests fail later instead.
pub async fn connect(config: &AppConfig) -> anyhow::Result<PgPool> {
    let options = || PgPoolOptions::new().max_connections(config.max_connections);

    match options().connect(&config.database_url).await {
        Ok(pool) => {
            tracing::info!("database connected");
            if let Err(e) = sqlx::migrate!("./migrations").run(&pool).await {
                tracing::warn!(error = %e, "migration failed; continuing");
            }
            Ok(pool)
        }
        Err(e) => {
            tracing::error!(error = %e, "database cannot be connected; continuing with a lazy pool");
            Ok(options().connect_lazy(&config.database_url)?)
        }
    }
}
