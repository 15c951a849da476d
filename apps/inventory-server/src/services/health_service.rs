//! Store health probe.
//!
//! Used by the `healthCheck` operation and by the startup probe in `main`.

use serde::Serialize;
use tracing::{debug, error};

use ferreteria_db::{Database, DbError};

use crate::error::{ServiceError, ServiceResult};

/// Message returned when the probe succeeds.
pub const HEALTHY_MESSAGE: &str = "service operational - database connected";

/// Probe result with pool figures.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HealthReport {
    pub message: String,
    pub pool_size: u32,
    pub idle_connections: usize,
    pub max_connections: u32,
}

#[derive(Debug, Clone)]
pub struct HealthService {
    db: Database,
}

impl HealthService {
    pub fn new(db: Database) -> Self {
        HealthService { db }
    }

    /// Runs `SELECT 1` against the store.
    ///
    /// Any failure is reported as a connection error, whatever sqlx said.
    pub async fn check(&self) -> ServiceResult<HealthReport> {
        if let Err(e) = self.db.health_check().await {
            error!(error = %e, "Database health probe failed");
            return Err(ServiceError::Store(match e {
                DbError::PoolExhausted => DbError::PoolExhausted,
                other => DbError::ConnectionFailed(other.to_string()),
            }));
        }

        let status = self.db.pool_status();
        debug!(size = status.size, idle = status.idle, "Database healthy");
        Ok(HealthReport {
            message: HEALTHY_MESSAGE.to_string(),
            pool_size: status.size,
            idle_connections: status.idle,
            max_connections: status.max,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use ferreteria_db::DbConfig;

    #[tokio::test]
    async fn test_healthy_database() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let report = HealthService::new(db).check().await.unwrap();
        assert_eq!(report.message, HEALTHY_MESSAGE);
        assert_eq!(report.max_connections, 1);
    }

    #[tokio::test]
    async fn test_closed_pool_reports_connection_error() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.close().await;

        let err = HealthService::new(db).check().await.unwrap_err();
        assert_eq!(err.code(), "DB_CONNECTION_ERROR");
        assert_eq!(err.kind(), ErrorKind::StoreError);
    }
}
