//! # Authenticator
//!
//! Identifies callers from username + password and answers role-vs-operation
//! permission queries.
//!
//! ## User Table
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   readers (every request)            writer (password change)           │
//! │        │                                   │                            │
//! │        ▼                                   ▼                            │
//! │   users.read() ─► clone Arc          prepare: verify + strength         │
//! │        │          (guard dropped)          │   (nothing mutated)        │
//! │        ▼                                   ▼                            │
//! │   look up in snapshot               caller persists the new hash        │
//! │   (no lock held)                           │                            │
//! │                                            ▼                            │
//! │                                     commit: write_lock.lock(),          │
//! │                                     hash unchanged? ─► swap Arc         │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Callers that persist hashes write the new one between prepare and
//! commit.
//!
//! Passwords are stored as lowercase SHA-256 hex digests and compared in
//! constant time.

use sha2::{Digest, Sha256};
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, RwLock};
use subtle::ConstantTimeEq;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::operation::Operation;
use crate::types::{Role, User};

/// Characters that count as "special" for the strength check.
pub const SPECIAL_CHARS: &str = "!@#$%^&*()_+-=[]{};':\"\\|,.<>/?";

/// Minimum password length.
pub const MIN_PASSWORD_LEN: usize = 8;

type UserTable = HashMap<String, User>;

// =============================================================================
// Password Helpers
// =============================================================================

/// SHA-256 of the UTF-8 password, lowercase hex.
///
/// ## Example
/// ```rust
/// use ferreteria_core::auth::hash_password;
///
/// assert_eq!(
///     hash_password("abc"),
///     "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
/// );
/// ```
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha256::digest(password.as_bytes()))
}

/// ≥ 8 chars with an uppercase, a lowercase, a digit and a special character.
pub fn is_strong(password: &str) -> bool {
    password.chars().count() >= MIN_PASSWORD_LEN
        && password.chars().any(|c| c.is_uppercase())
        && password.chars().any(|c| c.is_lowercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(|c| SPECIAL_CHARS.contains(c))
}

fn digest_matches(stored_hex: &str, candidate_hex: &str) -> bool {
    let stored = stored_hex.as_bytes();
    let candidate = candidate_hex.as_bytes();
    if stored.len() != candidate.len() {
        return false;
    }
    stored.ct_eq(candidate).into()
}

fn table_key(username: &str) -> String {
    username.trim().to_lowercase()
}

// =============================================================================
// Errors
// =============================================================================

/// Why a password change was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PasswordChangeError {
    #[error("current password is incorrect")]
    InvalidCredentials,

    #[error("new password must have at least 8 characters, upper and lower case letters, a digit and a special character")]
    WeakPassword,

    /// Another change landed between prepare and commit.
    #[error("password was changed concurrently")]
    Conflict,
}

/// A verified password change that is not live yet.
#[derive(Debug, Clone)]
pub struct PendingPasswordChange {
    /// The account carrying its new hash.
    pub user: User,
    previous_hash: String,
}

// =============================================================================
// Authenticator
// =============================================================================

/// In-memory user table with copy-on-write updates.
#[derive(Debug, Default)]
pub struct Authenticator {
    users: RwLock<Arc<UserTable>>,
    /// Serializes writers so concurrent changes never lose an update.
    write_lock: Mutex<()>,
}

impl Authenticator {
    /// Builds the table from user records. Usernames are keyed lowercase.
    ///
    /// When two records differ only in case the first one wins and the
    /// rest are skipped with a warning.
    pub fn new(users: impl IntoIterator<Item = User>) -> Self {
        let mut table = UserTable::new();
        for user in users {
            match table.entry(table_key(&user.username)) {
                Entry::Occupied(kept) => warn!(
                    kept = %kept.get().username,
                    skipped = %user.username,
                    "Usernames differ only in case, skipping duplicate account"
                ),
                Entry::Vacant(slot) => {
                    slot.insert(user);
                }
            }
        }
        info!(users = table.len(), "Authenticator initialized");
        Authenticator {
            users: RwLock::new(Arc::new(table)),
            write_lock: Mutex::new(()),
        }
    }

    /// Built-in development accounts.
    ///
    /// Only meant as a fallback for local runs; a deployed server loads its
    /// users from the store.
    pub fn with_dev_users() -> Self {
        warn!("Using built-in development users");
        Self::new(dev_users())
    }

    fn snapshot(&self) -> Arc<UserTable> {
        match self.users.read() {
            Ok(guard) => Arc::clone(&guard),
            Err(poisoned) => Arc::clone(&poisoned.into_inner()),
        }
    }

    /// Number of accounts in the table.
    pub fn user_count(&self) -> usize {
        self.snapshot().len()
    }

    /// Looks up an account regardless of its `active` flag.
    pub fn find(&self, username: &str) -> Option<User> {
        self.snapshot().get(&table_key(username)).cloned()
    }

    /// Returns the user if the password matches and the account is active.
    pub fn verify(&self, username: &str, password: &str) -> Option<User> {
        let candidate = hash_password(password);
        let table = self.snapshot();

        let Some(user) = table.get(&table_key(username)) else {
            debug!(username = %username, "Unknown user");
            return None;
        };

        if !digest_matches(&user.password_hash, &candidate) {
            warn!(username = %username, "Invalid password");
            return None;
        }

        if !user.active {
            warn!(username = %username, "Inactive user");
            return None;
        }

        Some(user.clone())
    }

    /// Role check by operation name. Unknown names are denied.
    pub fn may_perform(&self, user: &User, operation: &str) -> bool {
        match operation.parse::<Operation>() {
            Ok(op) => Self::may_perform_op(user, op),
            Err(_) => {
                warn!(username = %user.username, operation = %operation, "Unknown operation denied");
                false
            }
        }
    }

    /// Role check for a parsed operation.
    pub fn may_perform_op(user: &User, operation: Operation) -> bool {
        user.active && user.role.satisfies(operation.required_role())
    }

    /// Re-authenticates with `current`, checks strength and swaps the hash.
    pub fn change_password(&self, username: &str, current: &str, new: &str) -> bool {
        self.try_change_password(username, current, new).is_ok()
    }

    /// Like [`change_password`](Self::change_password) but says why it failed.
    ///
    /// ## Returns
    /// The updated user record (with its new hash).
    pub fn try_change_password(
        &self,
        username: &str,
        current: &str,
        new: &str,
    ) -> Result<User, PasswordChangeError> {
        let pending = self.prepare_password_change(username, current, new)?;
        self.commit_password_change(pending)
    }

    /// Checks `current` and the strength of `new` without changing anything.
    pub fn prepare_password_change(
        &self,
        username: &str,
        current: &str,
        new: &str,
    ) -> Result<PendingPasswordChange, PasswordChangeError> {
        let user = self
            .verify(username, current)
            .ok_or(PasswordChangeError::InvalidCredentials)?;
        if !is_strong(new) {
            return Err(PasswordChangeError::WeakPassword);
        }

        Ok(PendingPasswordChange {
            previous_hash: user.password_hash.clone(),
            user: User {
                password_hash: hash_password(new),
                ..user
            },
        })
    }

    /// Makes a prepared change live.
    ///
    /// ## Returns
    /// * `Err(Conflict)` - the stored hash moved since the change was prepared
    pub fn commit_password_change(
        &self,
        pending: PendingPasswordChange,
    ) -> Result<User, PasswordChangeError> {
        let _writer = match self.write_lock.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        let key = table_key(&pending.user.username);
        let mut table = (*self.snapshot()).clone();
        match table.get_mut(&key) {
            Some(user) if user.password_hash == pending.previous_hash => {
                user.password_hash = pending.user.password_hash.clone();
            }
            _ => return Err(PasswordChangeError::Conflict),
        }

        match self.users.write() {
            Ok(mut guard) => *guard = Arc::new(table),
            Err(poisoned) => *poisoned.into_inner() = Arc::new(table),
        }

        info!(username = %pending.user.username, "Password changed");
        Ok(pending.user)
    }
}

/// The development accounts, hashed.
pub fn dev_users() -> Vec<User> {
    [
        ("admin", "FerretAdmin2024$", Role::Admin),
        ("operador", "StockManager#789", Role::Operator),
        ("consulta", "ReadOnly@456", Role::ReadOnly),
        ("supervisor", "SuperVisor!321", Role::Operator),
        ("gerente", "Manager$2024", Role::Admin),
    ]
    .into_iter()
    .map(|(username, password, role)| User {
        username: username.to_string(),
        password_hash: hash_password(password),
        role,
        active: true,
    })
    .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
