//! Authentication manager implementation.

use super::{
    errors::{AuthError, AuthResult},
    models::{AccessTokenClaims, LoginRequest, RegisterRequest, User, UserId},
};
use crate::db::UserRepository;
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use std::sync::Arc;

/// Authentication manager
#[derive(Clone)]
pub struct AuthManager {
    users: Arc<dyn UserRepository>,
    pepper: String,
    jwt_secret: String,
    access_token_duration: Duration,
}

impl AuthManager {
    /// Create a new authentication manager
    ///
    /// # Arguments
    ///
    /// * `users` - User storage
    /// * `pepper` - Server-side pepper for password hashing
    /// * `jwt_secret` - Secret key for JWT signing
    pub fn new(users: Arc<dyn UserRepository>, pepper: String, jwt_secret: String) -> Self {
        Self {
            users,
            pepper,
            jwt_secret,
            access_token_duration: Duration::hours(12),
        }
    }

    /// Override the access token lifetime
    pub fn with_token_duration(mut self, duration: Duration) -> Self {
        self.access_token_duration = duration;
        self
    }

    /// Register a new manager account
    ///
    /// # Errors
    ///
    /// * `AuthError::UsernameTaken` - Username already exists
    /// * `AuthError::InvalidUsername` - Username format invalid
    /// * `AuthError::WeakPassword` - Password too weak
    pub async fn register(&self, request: RegisterRequest) -> AuthResult<User> {
        validate_username(&request.username)?;
        validate_password(&request.password)?;

        let display_name = request.display_name.trim();
        if display_name.is_empty() || display_name.len() > 64 {
            return Err(AuthError::InvalidDisplayName);
        }

        if self.users.find_by_username(&request.username).await?.is_some() {
            return Err(AuthError::UsernameTaken);
        }

        let password_hash = self.hash_password(&request.password)?;
        let user = self
            .users
            .create_user(&request.username, &password_hash, display_name)
            .await?;

        log::info!("Registered manager {} ({})", user.username, user.id);
        Ok(user)
    }

    /// Verify credentials and issue an access token
    ///
    /// Unknown usernames and wrong passwords both yield
    /// `AuthError::InvalidCredentials`.
    pub async fn login(&self, request: LoginRequest) -> AuthResult<(User, String)> {
        let (user, password_hash) = self
            .users
            .find_by_username(&request.username)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        self.verify_password(&request.password, &password_hash)?;
        self.users.update_last_login(user.id).await?;

        let token = self.generate_access_token(user.id, &user.username, user.is_admin)?;
        Ok((user, token))
    }

    /// Verify an access token
    pub fn verify_access_token(&self, token: &str) -> AuthResult<AccessTokenClaims> {
        let token_data = decode::<AccessTokenClaims>(
            token,
            &DecodingKey::from_secret(self.jwt_secret.as_bytes()),
            &Validation::default(),
        )?;

        Ok(token_data.claims)
    }

    /// Generate JWT access token
    pub fn generate_access_token(
        &self,
        user_id: UserId,
        username: &str,
        is_admin: bool,
    ) -> AuthResult<String> {
        let now = Utc::now();
        let claims = AccessTokenClaims {
            sub: user_id,
            username: username.to_string(),
            is_admin,
            exp: (now + self.access_token_duration).timestamp(),
            iat: now.timestamp(),
        };

        Ok(encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(self.jwt_secret.as_bytes()),
        )?)
    }

    fn hash_password(&self, password: &str) -> AuthResult<String> {
        let peppered = format!("{}{}", password, self.pepper);
        let salt = SaltString::generate(&mut OsRng);

        Ok(Argon2::default()
            .hash_password(peppered.as_bytes(), &salt)
            .map_err(|_| AuthError::HashingFailed)?
            .to_string())
    }

    fn verify_password(&self, password: &str, hash: &str) -> AuthResult<()> {
        let peppered = format!("{}{}", password, self.pepper);
        let parsed_hash = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;

        Argon2::default()
            .verify_password(peppered.as_bytes(), &parsed_hash)
            .map_err(|_| AuthError::InvalidCredentials)
    }
}

fn validate_username(username: &str) -> AuthResult<()> {
    let len = username.len();
    if !(3..=32).contains(&len) {
        return Err(AuthError::InvalidUsername(
            "Username must be 3-32 characters".to_string(),
        ));
    }

    if !username.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
        return Err(AuthError::InvalidUsername(
            "Username can only contain letters, numbers, and underscores".to_string(),
        ));
    }

    Ok(())
}

fn validate_password(password: &str) -> AuthResult<()> {
    if password.len() < 8 {
        return Err(AuthError::WeakPassword(
            "Password must be at least 8 characters".to_string(),
        ));
    }

    Ok(())
}
