//! Users and the account directory

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use std::collections::HashMap;
use thiserror::Error;

use crate::config::UserAccount;
use crate::logger;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Password hashing failed: {0}")]
    Hash(String),
}

/// The user attached to a request
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct User {
    /// `None` for the anonymous user
    pub username: Option<String>,
    pub is_active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
}

impl User {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub const fn is_authenticated(&self) -> bool {
        self.username.is_some()
    }

    /// Name shown in access logs, `-` when anonymous
    pub fn display_name(&self) -> &str {
        self.username.as_deref().unwrap_or("-")
    }
}

impl From<&UserAccount> for User {
    fn from(account: &UserAccount) -> Self {
        Self {
            username: Some(account.username.clone()),
            is_active: account.is_active,
            is_staff: account.is_staff,
            is_superuser: account.is_superuser,
        }
    }
}

/// Accounts declared in the configuration, keyed by username
#[derive(Debug, Default)]
pub struct UserDirectory {
    accounts: HashMap<String, UserAccount>,
}

impl UserDirectory {
    pub fn new(accounts: &[UserAccount]) -> Self {
        Self {
            accounts: accounts
                .iter()
                .map(|a| (a.username.clone(), a.clone()))
                .collect(),
        }
    }

    pub fn get(&self, username: &str) -> Option<User> {
        self.accounts.get(username).map(User::from)
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }

    /// Check credentials. Inactive accounts never authenticate.
    pub fn verify(&self, username: &str, password: &str) -> Option<User> {
        let account = self.accounts.get(username).filter(|a| a.is_active)?;

        let parsed = match PasswordHash::new(&account.password_hash) {
            Ok(p) => p,
            Err(e) => {
                logger::log_warning(&format!(
                    "Invalid password hash configured for '{username}': {e}"
                ));
                return None;
            }
        };

        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .ok()
            .map(|()| User::from(account))
    }
}

/// Hash a password into an Argon2id PHC string
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn account(username: &str, password: &str, active: bool) -> UserAccount {
        UserAccount {
            username: username.to_string(),
            password_hash: hash_password(password).unwrap(),
            is_active: active,
            is_staff: false,
            is_superuser: false,
        }
    }

    #[test]
    fn test_anonymous() {
        let user = User::anonymous();
        assert!(!user.is_authenticated());
        assert!(!user.is_active);
        assert_eq!(user.display_name(), "-");
    }

    #[test]
    fn test_hash_format() {
        let hash = hash_password("123").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert_ne!(hash, hash_password("123").unwrap());
    }

    #[test]
    fn test_verify() {
        let directory = UserDirectory::new(&[
            account("testuser", "123", true),
            account("dormant", "123", false),
        ]);
        assert_eq!(directory.len(), 2);

        let user = directory.verify("testuser", "123").unwrap();
        assert_eq!(user.username.as_deref(), Some("testuser"));
        assert!(user.is_authenticated());

        assert!(directory.verify("testuser", "wrong").is_none());
        assert!(directory.verify("nobody", "123").is_none());
        assert!(directory.verify("dormant", "123").is_none());
    }

    #[test]
    fn test_malformed_hash_rejected() {
        let directory = UserDirectory::new(&[UserAccount {
            username: "broken".to_string(),
            password_hash: "plaintext".to_string(),
            is_active: true,
            is_staff: false,
            is_superuser: false,
        }]);
        assert!(directory.verify("broken", "plaintext").is_none());
    }
}
