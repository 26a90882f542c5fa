//! Credential primitives for the session service.
//!
//! Provides the building blocks the token lifecycle manager composes:
//! - Password hashing (Argon2id)
//! - Access token issuance and verification (HS256, algorithm pinned)
//! - Opaque refresh token generation
//!
//! Nothing here touches storage or the network; persistence and orchestration
//! live in the service that consumes this crate.
//!
//! # Examples
//!
//! ## Password Hashing
//! ```
//! use auth::PasswordHasher;
//!
//! let hasher = PasswordHasher::new();
//! let hash = hasher.hash("my_password").unwrap();
//! let is_valid = hasher.verify("my_password", &hash).unwrap();
//! assert!(is_valid);
//! ```
//!
//! ## Access Tokens
//! ```
//! use auth::AccessTokenCodec;
//! use chrono::Duration;
//! use chrono::Utc;
//!
//! let codec = AccessTokenCodec::new(b"secret_key_at_least_32_bytes_long!", Duration::hours(1)).unwrap();
//! let now = Utc::now();
//! let (token, claims) = codec.issue("user123", now).unwrap();
//! let decoded = codec.verify(&token, now).unwrap();
//! assert_eq!(decoded, claims);
//! ```
//!
//! ## Refresh Tokens
//! ```
//! let token = auth::generate_refresh_token();
//! assert_eq!(token.len(), 64);
//! ```

pub mod jwt;
pub mod password;
pub mod token;

// Re-export commonly used items
pub use jwt::AccessClaims;
pub use jwt::AccessTokenCodec;
pub use jwt::JwtError;
pub use password::PasswordError;
pub use password::PasswordHasher;
pub use token::generate_refresh_token;
