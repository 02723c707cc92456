//! Manager accounts, access tokens and capability checks.
//!
//! - Argon2id password hashing with a server-side pepper
//! - JWT access tokens (HS256)
//! - [`capability::check`] decides whether a caller may act for another manager
//!
//! ## Example
//!
//! ```no_run
//! use last_man_standing::auth::{AuthManager, RegisterRequest};
//! use last_man_standing::db::{Database, PgUserRepository};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::new(&Default::default()).await?;
//!     let auth = AuthManager::new(
//!         Arc::new(PgUserRepository::new(db.pool().clone())),
//!         "secret_pepper_value".to_string(),
//!         "jwt_secret_jwt_secret_jwt_secret".to_string(),
//!     );
//!
//!     let user = auth
//!         .register(RegisterRequest {
//!             username: "office_pool".to_string(),
//!             password: "SecurePass123".to_string(),
//!             display_name: "Office Pool".to_string(),
//!         })
//!         .await?;
//!     println!("Registered manager: {}", user.username);
//!     Ok(())
//! }
//! ```

pub mod capability;
pub mod errors;
pub mod manager;
pub mod models;

pub use capability::{Caller, Permission, Role};
pub use errors::{AuthError, AuthResult};
pub use manager::AuthManager;
pub use models::{AccessTokenClaims, LoginRequest, RegisterRequest, User, UserId};
