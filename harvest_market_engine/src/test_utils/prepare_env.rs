use std::path::Path;

use log::*;
use sqlx::{migrate, migrate::MigrateDatabase, Sqlite};

use crate::SqliteDatabase;

pub async fn prepare_test_env(url: &str) {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    debug!("🚀️ Logging initialised");
    create_database(url).await;
    run_migrations(url).await;
    debug!("🚀️ Test environment ready at {url}");
}

pub fn random_db_path() -> String {
    format!("sqlite://../data/test_market_{}.db", rand::random::<u64>())
}

pub async fn create_database<P: AsRef<Path> + Send>(path: P) {
    let path = path.as_ref();
    let db_path = path.as_os_str().to_str().expect("Invalid database path");
    if let Err(e) = Sqlite::drop_database(db_path).await {
        warn!("Could not drop database {db_path}: {e:?}");
    }
    Sqlite::create_database(db_path).await.expect("Error creating database");
    info!("🚀️ Created test database {db_path}");
}

pub async fn run_migrations(url: &str) {
    let db = SqliteDatabase::new_with_url(url, 5).await.expect("Error connecting to the test database");
    migrate!("./src/sqlite/db/migrations").run(db.pool()).await.expect("Error running migrations");
    info!("🚀️ Migrations complete");
}
