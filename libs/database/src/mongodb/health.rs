use mongodb::{Database, bson::doc};

use crate::common::DatabaseError;

/// Run `ping` against `db`.
///
/// ```ignore
/// use database::mongodb::check_health;
///
/// check_health(&state.db).await.map_err(|e| e.to_string())?;
/// ```
pub async fn check_health(db: &Database) -> Result<(), DatabaseError> {
    db.run_command(doc! { "ping": 1 })
        .await
        .map(|_| ())
        .map_err(|e| DatabaseError::HealthCheckFailed(format!("MongoDB ping failed: {}", e)))
}
