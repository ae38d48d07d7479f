use log::*;
#[cfg(feature = "sqlite")]
use sqlx::{migrate::MigrateDatabase, Sqlite};

#[cfg(feature = "sqlite")]
use crate::SqliteDatabase;

/// Loads `.env.test` if present and initialises logging. Safe to call from every test.
pub fn prepare_test_env() {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    trace!("🚀️ Test environment prepared");
}

/// A fresh SQLite URL in the system temp directory.
pub fn random_db_url() -> String {
    let path = std::env::temp_dir().join(format!("olc_test_store_{}.db", rand::random::<u64>()));
    format!("sqlite://{}", path.display())
}

/// Drops any database at `url`, then creates a new one with an up-to-date schema.
#[cfg(feature = "sqlite")]
pub async fn fresh_sqlite_database(url: &str) -> SqliteDatabase {
    prepare_test_env();
    if Sqlite::database_exists(url).await.unwrap_or(false) {
        if let Err(e) = Sqlite::drop_database(url).await {
            warn!("🚀️ Error dropping database {url}: {e:?}");
        }
    }
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error creating test database");
    info!("🚀️ Created Sqlite database {url}");
    db
}
