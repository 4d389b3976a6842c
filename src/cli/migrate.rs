use sqlx::{postgres::PgPoolOptions, migrate::Migrator};
use tracing::info;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

pub struct MigrationOpts {
    pub database_url: String,
}

/// Apply any migrations that have not been run against the database yet.
pub async fn run_migrations(opts: MigrationOpts) -> anyhow::Result<()> {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&opts.database_url)
        .await?;

    info!("Running database migrations.");
    MIGRATOR.run(&pool).await?;
    info!("Database migrations complete.");

    pool.close().await;

    Ok(())
}
