//! Credential store collaborator.
//!
//! The gateway only ever talks to the store through the [`UserStore`] trait:
//! `verify_credentials` at login, `find_user` on every token verification and
//! `update_password` for the change-password endpoint. The builtin
//! [`MemoryUserStore`] keeps accounts in-process and seeds a default
//! `admin`/`admin` account on startup.

use std::collections::HashMap;

use argon2::password_hash::{rand_core::OsRng, SaltString};
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Admin,
}

/// Identity of an authenticated user, as owned by the credential store.
#[derive(Debug, Clone, Serialize)]
pub struct UserIdentity {
    pub id: i64,
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    pub role: Role,
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Check a username/password pair. `None` is a definite rejection.
    async fn verify_credentials(&self, username: &str, password: &str) -> Option<UserIdentity>;

    /// Look a user up by username without checking a password.
    async fn find_user(&self, username: &str) -> Option<UserIdentity>;

    async fn update_password(&self, username: &str, new_password: &str) -> anyhow::Result<()>;
}

struct StoredUser {
    identity: UserIdentity,
    password_hash: String,
}

/// In-memory user store. Volatile: accounts do not survive a restart.
pub struct MemoryUserStore {
    users: RwLock<HashMap<String, StoredUser>>,
}

impl MemoryUserStore {
    /// Create a store seeded with the default `admin`/`admin` account.
    pub fn new() -> anyhow::Result<Self> {
        let admin = StoredUser {
            identity: UserIdentity {
                id: 1,
                username: "admin".to_string(),
                first_name: "Admin".to_string(),
                last_name: "User".to_string(),
                role: Role::Admin,
            },
            password_hash: hash_password("admin")?,
        };
        let mut users = HashMap::new();
        users.insert("admin".to_string(), admin);
        tracing::info!("default admin user created");
        Ok(Self {
            users: RwLock::new(users),
        })
    }

    /// Add a user. Fails if the username is already taken.
    pub async fn create_user(
        &self,
        first_name: &str,
        last_name: &str,
        username: &str,
        password: &str,
        role: Role,
    ) -> anyhow::Result<UserIdentity> {
        let hash = hash_password(password)?;
        let mut users = self.users.write().await;
        if users.contains_key(username) {
            anyhow::bail!("username already exists: {}", username);
        }
        let id = users.len() as i64 + 1;
        let identity = UserIdentity {
            id,
            username: username.to_string(),
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            role,
        };
        users.insert(
            username.to_string(),
            StoredUser {
                identity: identity.clone(),
                password_hash: hash,
            },
        );
        Ok(identity)
    }

    /// Remove a user. Any outstanding token for them stops verifying.
    pub async fn delete_user(&self, username: &str) -> bool {
        self.users.write().await.remove(username).is_some()
    }
}

#[async_trait]
impl UserStore for MemoryUserStore {
    async fn verify_credentials(&self, username: &str, password: &str) -> Option<UserIdentity> {
        let users = self.users.read().await;
        let user = users.get(username)?;
        let parsed = PasswordHash::new(&user.password_hash).ok()?;
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .ok()?;
        Some(user.identity.clone())
    }

    async fn find_user(&self, username: &str) -> Option<UserIdentity> {
        self.users
            .read()
            .await
            .get(username)
            .map(|u| u.identity.clone())
    }

    async fn update_password(&self, username: &str, new_password: &str) -> anyhow::Result<()> {
        let hash = hash_password(new_password)?;
        let mut users = self.users.write().await;
        let user = users
            .get_mut(username)
            .ok_or_else(|| anyhow::anyhow!("user not found: {}", username))?;
        user.password_hash = hash;
        tracing::info!(username = %username, "password updated");
        Ok(())
    }
}

fn hash_password(password: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|h| h.to_string())
        .map_err(|e| anyhow::anyhow!("password hashing failed: {}", e))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn default_admin_verifies() {
        let store = MemoryUserStore::new().unwrap();
        let user = store.verify_credentials("admin", "admin").await.unwrap();
        assert_eq!(user.username, "admin");
        assert_eq!(user.role, Role::Admin);
    }

    #[tokio::test]
    async fn wrong_password_is_rejected() {
        let store = MemoryUserStore::new().unwrap();
        assert!(store.verify_credentials("admin", "nope").await.is_none());
        assert!(store.verify_credentials("ghost", "admin").await.is_none());
    }

    #[tokio::test]
    async fn create_and_find_user() {
        let store = MemoryUserStore::new().unwrap();
        store
            .create_user("Jane", "Doe", "jane", "hunter22", Role::User)
            .await
            .unwrap();
        let found = store.find_user("jane").await.unwrap();
        assert_eq!(found.first_name, "Jane");
        assert_eq!(found.role, Role::User);

        // Duplicate username is an error.
        assert!(store
            .create_user("J", "D", "jane", "pw", Role::User)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn update_password_takes_effect() {
        let store = MemoryUserStore::new().unwrap();
        store.update_password("admin", "s3cret").await.unwrap();
        assert!(store.verify_credentials("admin", "admin").await.is_none());
        assert!(store.verify_credentials("admin", "s3cret").await.is_some());
    }

    #[tokio::test]
    async fn deleted_user_is_gone() {
        let store = MemoryUserStore::new().unwrap();
        assert!(store.delete_user("admin").await);
        assert!(store.find_user("admin").await.is_none());
        assert!(!store.delete_user("admin").await);
    }
}
