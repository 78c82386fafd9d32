use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

use super::connection::setup_database;

/// In-memory database with the full schema, for unit and integration tests.
///
/// A single pooled connection keeps every query on the same in-memory
/// database.
pub async fn setup_test_db() -> Result<DatabaseConnection, DbErr> {
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(opt).await?;
    setup_database(&db).await?;
    Ok(db)
}
