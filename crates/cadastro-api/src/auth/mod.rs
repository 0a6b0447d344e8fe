//! Authentication and authorization module
//!
//! - Session token generation and validation (HS256)
//! - Password hashing with Argon2
//! - Access guard middleware for protected routes
//! - Authentication service over the credential store and session registry

pub mod jwt;
pub mod middleware;
pub mod password;
pub mod service;

pub use jwt::{generate_access_token, validate_access_token, Claims, JwtConfig, JwtError};
pub use middleware::{access_guard, AuthError, AuthenticatedUser};
pub use password::{hash_password, hash_password_with_config, verify_password, PasswordConfig};
pub use service::{AuthService, Identity};
