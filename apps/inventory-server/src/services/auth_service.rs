//! Caller authentication and authorization.
//!
//! Wraps the in-memory [`Authenticator`] and writes password changes
//! through to the `users` table so they survive a restart.
//!
//! ## Password Change
//! ```text
//! change_lock ─► prepare (verify, strength) ─► UPDATE users ─► commit
//!                     │                             │
//!                     └── refused                   └── store error: nothing
//!                                                       changed in memory
//! ```
//!
//! ## User Source
//! ```text
//! startup
//!    │
//!    ▼
//! users table ──► non-empty ──► Authenticator::new(rows)
//!    │
//!    └── empty ──► seed_dev_users? ──yes──► upsert dev users, use them
//!                        │
//!                        └──no──► empty table, every request gets 401
//! ```

use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::{error, info, warn};

use ferreteria_core::auth::{dev_users, PasswordChangeError};
use ferreteria_core::{Authenticator, Operation, ValidationError, User};
use ferreteria_db::Database;

use crate::auth::Credentials;
use crate::error::{ServiceError, ServiceResult};

/// Builds the authenticator from the store.
pub async fn load_authenticator(db: &Database, seed_dev_users: bool) -> ServiceResult<Authenticator> {
    let users = db.users().list().await?;
    if !users.is_empty() {
        info!(users = users.len(), "Loaded users from store");
        return Ok(Authenticator::new(users));
    }

    if seed_dev_users {
        warn!("Users table is empty, seeding built-in development users");
        let users = dev_users();
        for user in &users {
            db.users().upsert(user).await?;
        }
        return Ok(Authenticator::new(users));
    }

    warn!("Users table is empty and development users are disabled; nobody can sign in");
    Ok(Authenticator::new(Vec::new()))
}

#[derive(Debug, Clone)]
pub struct AuthService {
    authenticator: Arc<Authenticator>,
    db: Database,
    /// One password change at a time, held across the store write.
    change_lock: Arc<Mutex<()>>,
}

impl AuthService {
    pub fn new(authenticator: Arc<Authenticator>, db: Database) -> Self {
        AuthService {
            authenticator,
            db,
            change_lock: Arc::new(Mutex::new(())),
        }
    }

    /// Resolves the caller.
    ///
    /// ## Returns
    /// * `AUTH_REQUIRED` - no credentials were sent
    /// * `INVALID_CREDENTIALS` - unknown user, wrong password or inactive account
    pub fn authenticate(&self, credentials: Option<&Credentials>) -> ServiceResult<User> {
        let credentials = credentials.ok_or(ServiceError::AuthRequired)?;
        self.authenticator
            .verify(&credentials.username, &credentials.password)
            .ok_or(ServiceError::InvalidCredentials)
    }

    /// Checks the caller's role against the operation's minimum.
    pub fn authorize(&self, user: &User, operation: Operation) -> ServiceResult<()> {
        if Authenticator::may_perform_op(user, operation) {
            Ok(())
        } else {
            warn!(
                username = %user.username,
                role = %user.role,
                operation = %operation,
                "Operation denied"
            );
            Err(ServiceError::Forbidden {
                username: user.username.clone(),
                operation: operation.name().to_string(),
            })
        }
    }

    /// Changes the caller's own password.
    ///
    /// The new hash is written to the store first and only then made live,
    /// so a failed write leaves the old password in force everywhere.
    pub async fn change_password(
        &self,
        username: &str,
        current: &str,
        new: &str,
    ) -> ServiceResult<()> {
        let _guard = self.change_lock.lock().await;

        let pending = self
            .authenticator
            .prepare_password_change(username, current, new)
            .map_err(password_error)?;
        let user = &pending.user;

        if !self
            .db
            .users()
            .update_password_hash(&user.username, &user.password_hash)
            .await?
        {
            // table empty with dev users disabled; the change only lives in memory
            warn!(username = %user.username, "Password changed for a user missing from the store");
        }

        self.authenticator
            .commit_password_change(pending)
            .map_err(password_error)?;
        Ok(())
    }
}

fn password_error(err: PasswordChangeError) -> ServiceError {
    match err {
        PasswordChangeError::InvalidCredentials => ValidationError::InvalidFormat {
            field: "currentPassword".to_string(),
            reason: err.to_string(),
        }
        .into(),
        PasswordChangeError::WeakPassword => ValidationError::InvalidFormat {
            field: "newPassword".to_string(),
            reason: err.to_string(),
        }
        .into(),
        // writers are serialized by change_lock
        PasswordChangeError::Conflict => {
            error!("Password table changed under the change lock");
            ServiceError::Internal(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;
    use ferreteria_core::auth::hash_password;
    use ferreteria_core::Role;
    use ferreteria_db::DbConfig;

    async fn service() -> AuthService {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let authenticator = load_authenticator(&db, true).await.unwrap();
        AuthService::new(Arc::new(authenticator), db)
    }

    fn creds(username: &str, password: &str) -> Credentials {
        Credentials {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_seeds_dev_users_into_empty_table() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let authenticator = load_authenticator(&db, true).await.unwrap();
        assert_eq!(authenticator.user_count(), 5);
        assert_eq!(db.users().count().await.unwrap(), 5);
    }

    #[tokio::test]
    async fn test_empty_table_without_seeding() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let authenticator = load_authenticator(&db, false).await.unwrap();
        assert_eq!(authenticator.user_count(), 0);
    }

    #[tokio::test]
    async fn test_store_users_win_over_dev_users() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.users()
            .upsert(&User {
                username: "maria".to_string(),
                password_hash: hash_password("Clave#2024x"),
                role: Role::Admin,
                active: true,
            })
            .await
            .unwrap();

        let authenticator = load_authenticator(&db, true).await.unwrap();
        assert_eq!(authenticator.user_count(), 1);
        assert!(authenticator.verify("admin", "FerretAdmin2024$").is_none());
        assert!(authenticator.verify("MARIA", "Clave#2024x").is_some());
    }

    #[tokio::test]
    async fn test_authenticate() {
        let svc = service().await;
        assert!(matches!(svc.authenticate(None), Err(ServiceError::AuthRequired)));

        let err = svc
            .authenticate(Some(&creds("admin", "wrong")))
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Auth);
        assert_eq!(err.code(), "INVALID_CREDENTIALS");

        let user = svc
            .authenticate(Some(&creds("operador", "StockManager#789")))
            .unwrap();
        assert_eq!(user.role, Role::Operator);
    }

    #[tokio::test]
    async fn test_authorize() {
        let svc = service().await;
        let reader = svc
            .authenticate(Some(&creds("consulta", "ReadOnly@456")))
            .unwrap();
        assert!(svc.authorize(&reader, Operation::GetByCode).is_ok());

        let err = svc.authorize(&reader, Operation::InsertItem).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn test_change_password_persists() {
        let svc = service().await;
        svc.change_password("consulta", "ReadOnly@456", "Nueva#Clave9")
            .await
            .unwrap();

        assert!(svc.authenticate(Some(&creds("consulta", "Nueva#Clave9"))).is_ok());
        assert!(svc.authenticate(Some(&creds("consulta", "ReadOnly@456"))).is_err());

        // a fresh authenticator built from the table sees the new hash
        let reloaded = load_authenticator(&svc.db, false).await.unwrap();
        assert!(reloaded.verify("consulta", "Nueva#Clave9").is_some());
    }

    #[tokio::test]
    async fn test_failed_store_write_keeps_old_password() {
        let svc = service().await;
        svc.db.close().await;

        let err = svc
            .change_password("consulta", "ReadOnly@456", "Nueva#Clave9")
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::StoreError);

        assert!(svc.authenticate(Some(&creds("consulta", "ReadOnly@456"))).is_ok());
        assert!(svc.authenticate(Some(&creds("consulta", "Nueva#Clave9"))).is_err());
    }

    #[tokio::test]
    async fn test_concurrent_changes_agree_with_store() {
        let svc = service().await;
        let attempts: Vec<_> = ["Primera#11", "Segunda#22", "Tercera#33"]
            .into_iter()
            .map(|new| {
                let svc = svc.clone();
                tokio::spawn(async move {
                    svc.change_password("operador", "StockManager#789", new)
                        .await
                        .map(|_| new)
                })
            })
            .collect();

        let mut winners = Vec::new();
        for attempt in attempts {
            if let Ok(new) = attempt.await.unwrap() {
                winners.push(new);
            }
        }
        assert_eq!(winners.len(), 1);

        let reloaded = load_authenticator(&svc.db, false).await.unwrap();
        assert!(reloaded.verify("operador", winners[0]).is_some());
        assert!(svc.authenticate(Some(&creds("operador", winners[0]))).is_ok());
    }

    #[tokio::test]
    async fn test_change_password_rejections() {
        let svc = service().await;

        let err = svc
            .change_password("consulta", "wrong", "Nueva#Clave9")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "VALIDATION_ERROR");
        assert!(err.to_string().contains("currentPassword"));

        let err = svc
            .change_password("consulta", "ReadOnly@456", "weak")
            .await
            .unwrap_err();
        assert!(err.to_string().contains("newPassword"));
    }
}
