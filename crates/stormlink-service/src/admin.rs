use migration::{Migrator, MigratorTrait};
use sea_orm::DatabaseConnection;

use crate::error::ApiError;

/// Apply any pending schema migrations.
pub async fn run_migrations(db: &DatabaseConnection) -> Result<(), ApiError> {
    Migrator::up(db, None).await?;
    Ok(())
}

/// A minimal query to validate store connectivity.
pub async fn db_ping(db: &DatabaseConnection) -> Result<(), ApiError> {
    db.ping().await?;
    Ok(())
}
