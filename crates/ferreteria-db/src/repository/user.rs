//! # User Repository
//!
//! Persistent user accounts. The Authenticator snapshots this table at
//! startup and writes password changes back through it.

use sqlx::SqlitePool;
use tracing::info;

use crate::error::DbResult;
use ferreteria_core::User;

#[derive(Debug, Clone)]
pub struct UserRepository {
    pool: SqlitePool,
}

impl UserRepository {
    pub fn new(pool: SqlitePool) -> Self {
        UserRepository { pool }
    }

    /// Every account, active or not, ordered by username.
    pub async fn list(&self) -> DbResult<Vec<User>> {
        let users = sqlx::query_as::<_, User>(
            "SELECT username, password_hash, role, active FROM users ORDER BY username",
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(users)
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users")
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    /// Inserts or replaces an account keyed by username.
    pub async fn upsert(&self, user: &User) -> DbResult<()> {
        sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, role, active)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(username) DO UPDATE SET
                password_hash = excluded.password_hash,
                role = excluded.role,
                active = excluded.active
            "#,
        )
        .bind(&user.username)
        .bind(&user.password_hash)
        .bind(user.role)
        .bind(user.active)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    /// Replaces a stored digest.
    ///
    /// ## Returns
    /// * `Ok(false)` - no such user
    pub async fn update_password_hash(&self, username: &str, password_hash: &str) -> DbResult<bool> {
        let result = sqlx::query("UPDATE users SET password_hash = ?1 WHERE username = ?2")
            .bind(password_hash)
            .bind(username)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 1 {
            info!(username, "Password hash updated");
        }
        Ok(result.rows_affected() == 1)
    }
}
