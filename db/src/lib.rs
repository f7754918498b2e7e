use color_eyre::{eyre::WrapErr, Result};
use sqlx::postgres::PgPoolOptions;

pub mod cooking;
pub mod errors;
pub mod relations;
pub mod users;

pub use errors::StoreError;
pub use sqlx;
pub use sqlx::PgPool;

pub static MIGRATOR: sqlx::migrate::Migrator = sqlx::migrate!();

#[tracing::instrument(err)]
pub async fn setup_db_pool() -> Result<PgPool> {
    let database_url =
        std::env::var("DATABASE_URL").wrap_err("DATABASE_URL must be set to reach Postgres")?;
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .wrap_err("Failed to connect to Postgres")?;

    const MIGRATION_LOCK_ID: i64 = 0xDB_DB_DB_DB_DB_DB_DB;
    sqlx::query("SELECT pg_advisory_lock($1)")
        .bind(MIGRATION_LOCK_ID)
        .execute(&pool)
        .await?;

    MIGRATOR.run(&pool).await?;

    let unlocked: Option<bool> = sqlx::query_scalar("SELECT pg_advisory_unlock($1)")
        .bind(MIGRATION_LOCK_ID)
        .fetch_one(&pool)
        .await?;

    match unlocked {
        Some(true) => tracing::info!("Migration lock unlocked"),
        _ => tracing::warn!("Failed to unlock migration lock"),
    }

    Ok(pool)
}
