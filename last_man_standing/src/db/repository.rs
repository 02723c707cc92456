//! Repository trait for user storage.
//!
//! The auth manager talks to users through [`UserRepository`] so it can be
//! exercised against an in-memory implementation in tests.

use async_trait::async_trait;
use sqlx::{PgPool, Row, postgres::PgRow};

use crate::auth::{AuthError, AuthResult, User, UserId};

/// Trait for user/authentication repository operations
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a new user
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        display_name: &str,
    ) -> AuthResult<User>;

    /// Find user by username, together with the stored password hash
    async fn find_by_username(&self, username: &str) -> AuthResult<Option<(User, String)>>;

    /// Find user by ID
    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>>;

    /// Update user's last login timestamp
    async fn update_last_login(&self, user_id: UserId) -> AuthResult<()>;
}

/// Default PostgreSQL implementation of `UserRepository`
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        display_name: row.get("display_name"),
        is_admin: row.get("is_admin"),
        created_at: row.get::<chrono::NaiveDateTime, _>("created_at").and_utc(),
        last_login: row
            .get::<Option<chrono::NaiveDateTime>, _>("last_login")
            .map(|dt| dt.and_utc()),
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn create_user(
        &self,
        username: &str,
        password_hash: &str,
        display_name: &str,
    ) -> AuthResult<User> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (username, password_hash, display_name)
            VALUES ($1, $2, $3)
            RETURNING id, username, display_name, is_admin, created_at, last_login
            "#,
        )
        .bind(username)
        .bind(password_hash)
        .bind(display_name)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(ref db) if db.is_unique_violation() => AuthError::UsernameTaken,
            other => AuthError::Database(other),
        })?;

        Ok(user_from_row(&row))
    }

    async fn find_by_username(&self, username: &str) -> AuthResult<Option<(User, String)>> {
        let row = sqlx::query(
            "SELECT id, username, password_hash, display_name, is_admin, created_at, last_login
             FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|r| (user_from_row(&r), r.get("password_hash"))))
    }

    async fn find_by_id(&self, user_id: UserId) -> AuthResult<Option<User>> {
        let row = sqlx::query(
            "SELECT id, username, display_name, is_admin, created_at, last_login
             FROM users WHERE id = $1",
        )
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(user_from_row))
    }

    async fn update_last_login(&self, user_id: UserId) -> AuthResult<()> {
        sqlx::query("UPDATE users SET last_login = NOW() WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }
}
