// File: fitroom-core/src/test_utils/helpers.rs

use sqlx::{Pool, Postgres, PgConnection, Connection};
use sqlx::postgres::PgPoolOptions;
use tracing::info;
use crate::Error;
use crate::db::Database;

const TEST_DB: &str = "fitroom_test";

/// Create the test database if it does not exist yet.
pub async fn ensure_test_database_exists() -> Result<(), Error> {
    let admin_url = std::env::var("DATABASE_ADMIN_URL")
        .unwrap_or_else(|_| "postgres://postgres@localhost/postgres".to_string());
    let mut conn = PgConnection::connect(&admin_url).await?;

    let create_db_sql = format!("CREATE DATABASE {TEST_DB};");
    match sqlx::query(&create_db_sql).execute(&mut conn).await {
        Ok(_) => info!("Created test DB '{TEST_DB}'."),
        // 42P04 => duplicate_database
        Err(e) if e.as_database_error().and_then(|d| d.code()).as_deref() == Some("42P04") => {
            info!("Test DB '{TEST_DB}' already exists; ignoring.");
        }
        Err(e) => return Err(Error::Database(e)),
    }

    Ok(())
}

/// Connection pool to the test DB, from `TEST_DATABASE_URL`.
pub async fn create_test_db_pool() -> Result<Pool<Postgres>, Error> {
    let url = std::env::var("TEST_DATABASE_URL")
        .unwrap_or_else(|_| format!("postgres://postgres@localhost/{TEST_DB}"));

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&url)
        .await?;

    Ok(pool)
}

/// Wipes out test data so each test can start fresh.
pub async fn clean_database(pool: &Pool<Postgres>) -> Result<(), Error> {
    sqlx::query(r#"
        TRUNCATE TABLE
            outfit_item,
            outfit,
            tryon,
            avatar_analysis,
            garment,
            avatar,
            session
        RESTART IDENTITY CASCADE;
    "#)
        .execute(pool)
        .await?;

    Ok(())
}

/// Returns a migrated, empty test DB handle.
pub async fn setup_test_database() -> Result<Database, Error> {
    ensure_test_database_exists().await?;

    let pool = create_test_db_pool().await?;
    let db = Database::from_pool(pool);
    db.migrate().await?;
    clean_database(db.pool()).await?;

    Ok(db)
}
