//! User repository module for database operations.
//!
//! The authoritative record of accounts. The store is exposed through the
//! [`UserStore`] trait so services receive it as an injected collaborator
//! and tests can substitute an in-memory double.

use crate::errors::AuthError;
use crate::models::User;
use async_trait::async_trait;
use sqlx::PgPool;

/// Authoritative credential store: point lookups by username, insert, delete.
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Fetch an account by exact username match.
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError>;

    /// Insert a new account. Duplicate usernames yield `AuthError::UserExists`.
    async fn create(&self, username: &str, password_hash: &str) -> Result<User, AuthError>;

    /// Delete an account. Zero rows affected yields `AuthError::UserNotFound`,
    /// distinct from transport failures (`AuthError::Database`).
    async fn delete(&self, username: &str) -> Result<(), AuthError>;
}

/// Postgres-backed user store.
#[derive(Clone)]
pub struct PgUserStore {
    pool: PgPool,
}

impl PgUserStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserStore for PgUserStore {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            SELECT user_id, username, password_hash, created_at
            FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AuthError::Database(format!("Failed to fetch user by username: {}", e)))?;

        Ok(user)
    }

    async fn create(&self, username: &str, password_hash: &str) -> Result<User, AuthError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password_hash)
            VALUES ($1, $2)
            RETURNING user_id, username, password_hash, created_at
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            // Unique constraint violation means the username is taken
            if e.to_string().contains("users_username_key") {
                AuthError::UserExists
            } else {
                AuthError::Database(format!("Failed to create user: {}", e))
            }
        })?;

        Ok(user)
    }

    async fn delete(&self, username: &str) -> Result<(), AuthError> {
        let result = sqlx::query(
            r#"
            DELETE FROM users
            WHERE username = $1
            "#,
        )
        .bind(username)
        .execute(&self.pool)
        .await
        .map_err(|e| AuthError::Database(format!("Failed to delete user: {}", e)))?;

        if result.rows_affected() == 0 {
            return Err(AuthError::UserNotFound);
        }

        Ok(())
    }
}

/// Mock user store module for testing.
pub mod mock {
    use super::*;
    use chrono::Utc;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;
    use std::time::Duration;
    use uuid::Uuid;

    /// In-memory user store with switchable failures and an optional
    /// per-lookup delay for exercising the verifier's deadline.
    #[derive(Default)]
    pub struct MockUserStore {
        users: Mutex<HashMap<String, User>>,
        fail: bool,
        lookup_delay: Option<Duration>,
        find_count: AtomicUsize,
        delete_count: AtomicUsize,
    }

    impl MockUserStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// Seed an account with the given bcrypt hash.
        pub fn with_user(self, username: &str, password_hash: &str) -> Self {
            {
                let mut users = match self.users.lock() {
                    Ok(guard) => guard,
                    Err(poisoned) => poisoned.into_inner(),
                };
                users.insert(
                    username.to_string(),
                    User {
                        user_id: Uuid::new_v4(),
                        username: username.to_string(),
                        password_hash: password_hash.to_string(),
                        created_at: Utc::now(),
                    },
                );
            }
            self
        }

        /// Every operation returns a transport error.
        pub fn failing() -> Self {
            Self {
                fail: true,
                ..Self::default()
            }
        }

        /// Delay lookups, simulating a slow or hung store.
        pub fn with_lookup_delay(mut self, delay: Duration) -> Self {
            self.lookup_delay = Some(delay);
            self
        }

        pub fn find_count(&self) -> usize {
            self.find_count.load(Ordering::SeqCst)
        }

        pub fn delete_count(&self) -> usize {
            self.delete_count.load(Ordering::SeqCst)
        }

        pub fn contains(&self, username: &str) -> bool {
            let users = match self.users.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            users.contains_key(username)
        }
    }

    #[async_trait]
    impl UserStore for MockUserStore {
        async fn find_by_username(&self, username: &str) -> Result<Option<User>, AuthError> {
            self.find_count.fetch_add(1, Ordering::SeqCst);

            if let Some(delay) = self.lookup_delay {
                tokio::time::sleep(delay).await;
            }

            if self.fail {
                return Err(AuthError::Database("mock store failure".to_string()));
            }

            let users = match self.users.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            Ok(users.get(username).cloned())
        }

        async fn create(&self, username: &str, password_hash: &str) -> Result<User, AuthError> {
            if self.fail {
                return Err(AuthError::Database("mock store failure".to_string()));
            }

            let mut users = match self.users.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };

            if users.contains_key(username) {
                return Err(AuthError::UserExists);
            }

            let user = User {
                user_id: Uuid::new_v4(),
                username: username.to_string(),
                password_hash: password_hash.to_string(),
                created_at: Utc::now(),
            };
            users.insert(username.to_string(), user.clone());
            Ok(user)
        }

        async fn delete(&self, username: &str) -> Result<(), AuthError> {
            self.delete_count.fetch_add(1, Ordering::SeqCst);

            if self.fail {
                return Err(AuthError::Database("mock store failure".to_string()));
            }

            let mut users = match self.users.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };

            if users.remove(username).is_none() {
                return Err(AuthError::UserNotFound);
            }
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_create_and_find_user(pool: PgPool) -> Result<(), AuthError> {
        let store = PgUserStore::new(pool);

        let user = store
            .create(
                "alice",
                "$2b$12$LQv3c1yqBWVHxkd0LHAkCOYz6TtxMQJqhN8/LewY5GyYqExt7YD3a",
            )
            .await?;

        assert_eq!(user.username, "alice");

        let fetched = store.find_by_username("alice").await?;
        assert!(fetched.is_some());
        assert_eq!(fetched.unwrap().user_id, user.user_id);

        let missing = store.find_by_username("bob").await?;
        assert!(missing.is_none());

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_duplicate_username_rejected(pool: PgPool) -> Result<(), AuthError> {
        let store = PgUserStore::new(pool);

        store.create("dup", "hash1").await?;
        let result = store.create("dup", "hash2").await;

        assert!(matches!(result, Err(AuthError::UserExists)));

        Ok(())
    }

    #[sqlx::test(migrations = "../../migrations")]
    async fn test_delete_user(pool: PgPool) -> Result<(), AuthError> {
        let store = PgUserStore::new(pool);

        store.create("gone", "hash").await?;
        store.delete("gone").await?;

        assert!(store.find_by_username("gone").await?.is_none());

        // Second delete hits zero rows
        let result = store.delete("gone").await;
        assert!(matches!(result, Err(AuthError::UserNotFound)));

        Ok(())
    }

    #[tokio::test]
    async fn test_mock_store_behaves_like_contract() {
        let store = mock::MockUserStore::new().with_user("alice", "hash");

        assert!(store.find_by_username("alice").await.unwrap().is_some());
        assert!(store.find_by_username("bob").await.unwrap().is_none());

        assert!(matches!(
            store.create("alice", "other").await,
            Err(AuthError::UserExists)
        ));

        store.delete("alice").await.unwrap();
        assert!(matches!(
            store.delete("alice").await,
            Err(AuthError::UserNotFound)
        ));

        assert_eq!(store.find_count(), 2);
        assert_eq!(store.delete_count(), 2);
    }
}
