use std::time::Duration;

use sea_orm::{ConnectOptions, Database, DatabaseConnection, DbErr};

/// Open a connection pool against the configured database.
///
/// SQLite has a single writer and in-memory databases exist per connection,
/// so the pool stays at one connection with short timeouts.
pub async fn connect(database_url: &str) -> Result<DatabaseConnection, DbErr> {
    let mut options = ConnectOptions::new(database_url.to_owned());

    options.max_connections(1);
    options.min_connections(0);
    options.connect_timeout(Duration::from_secs(5));
    options.acquire_timeout(Duration::from_secs(5));
    options.idle_timeout(Duration::from_secs(30));
    options.sqlx_logging(false);

    Database::connect(options).await
}
