//! JWT token generation and validation
//!
//! Implements session tokens with HMAC-SHA256 signing. A token carries the
//! account identity and has a configurable expiration time. Validation
//! applies no clock leeway.

use cadastro_core::config::AuthConfig;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use uuid::Uuid;

/// JWT Claims structure containing the account identity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Token issuer
    pub iss: String,
    /// Subject - the account's `usuario`
    pub sub: String,
    /// Account id
    pub uid: i64,
    /// JWT ID - makes every issued token distinct
    pub jti: String,
    /// Issued at timestamp (Unix epoch)
    pub iat: u64,
    /// Expiration timestamp (Unix epoch)
    pub exp: u64,
}

/// JWT token generation and validation errors
#[derive(Debug, Error)]
pub enum JwtError {
    #[error("Failed to encode JWT: {0}")]
    EncodingError(#[from] jsonwebtoken::errors::Error),

    #[error("Invalid token format")]
    InvalidToken,

    #[error("Token has expired")]
    ExpiredToken,

    #[error("Invalid token signature")]
    InvalidSignature,

    #[error("System time error: {0}")]
    SystemTimeError(#[from] std::time::SystemTimeError),

    #[error("Token lifetime of {0}s is out of range")]
    LifetimeOutOfRange(u64),
}

/// JWT Configuration
#[derive(Debug, Clone)]
pub struct JwtConfig {
    /// Secret key for HMAC signing
    pub secret: String,
    /// Token expiration time in seconds (default: 3600 = 1 hour)
    pub expiration_secs: u64,
    /// Token issuer identifier
    pub issuer: String,
}

impl Default for JwtConfig {
    fn default() -> Self {
        Self::from(&AuthConfig::default())
    }
}

impl From<&AuthConfig> for JwtConfig {
    fn from(config: &AuthConfig) -> Self {
        Self {
            secret: config.jwt_secret.clone(),
            expiration_secs: config.token_ttl_secs,
            issuer: config.issuer.clone(),
        }
    }
}

/// Sign a session token for an account
///
/// Returns the encoded token together with its claims.
pub fn generate_access_token(
    config: &JwtConfig,
    user_id: i64,
    usuario: &str,
) -> Result<(String, Claims), JwtError> {
    let now = SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs();

    let claims = Claims {
        iss: config.issuer.clone(),
        sub: usuario.to_string(),
        uid: user_id,
        jti: Uuid::new_v4().to_string(),
        iat: now,
        exp: now
            .checked_add(config.expiration_secs)
            .ok_or(JwtError::LifetimeOutOfRange(config.expiration_secs))?,
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(config.secret.as_bytes()),
    )?;

    Ok((token, claims))
}

/// Validate a session token and extract claims
pub fn validate_access_token(config: &JwtConfig, token: &str) -> Result<Claims, JwtError> {
    let mut validation = Validation::new(Algorithm::HS256);
    validation.set_issuer(&[&config.issuer]);
    validation.leeway = 0;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(config.secret.as_bytes()),
        &validation,
    )
    .map_err(|e| match e.kind() {
        jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::ExpiredToken,
        jsonwebtoken::errors::ErrorKind::InvalidSignature => JwtError::InvalidSignature,
        _ => JwtError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_and_validate_token() {
        let config = JwtConfig::default();

        let (token, issued) =
            generate_access_token(&config, 42, "admin").expect("Failed to generate token");
        let claims = validate_access_token(&config, &token).expect("Failed to validate token");

        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.uid, 42);
        assert_eq!(claims.iss, "cadastro-api");
        assert_eq!(claims.exp, claims.iat + 3600);
        assert_eq!(claims.jti, issued.jti);
    }

    #[test]
    fn test_tokens_are_distinct() {
        let config = JwtConfig::default();
        let (first, _) = generate_access_token(&config, 1, "admin").unwrap();
        let (second, _) = generate_access_token(&config, 1, "admin").unwrap();
        assert_ne!(first, second);
    }

    #[test]
    fn test_invalid_token() {
        let config = JwtConfig::default();
        assert!(matches!(
            validate_access_token(&config, "invalid.token.here"),
            Err(JwtError::InvalidToken)
        ));
        assert!(validate_access_token(&config, "").is_err());
    }

    #[test]
    fn test_wrong_secret() {
        let config1 = JwtConfig {
            secret: "secret1".to_string(),
            ..Default::default()
        };
        let config2 = JwtConfig {
            secret: "secret2".to_string(),
            ..Default::default()
        };

        let (token, _) = generate_access_token(&config1, 1, "admin").unwrap();

        let result = validate_access_token(&config2, &token);
        assert!(matches!(result, Err(JwtError::InvalidSignature)));
    }

    #[test]
    fn test_expired_token() {
        let config = JwtConfig::default();
        let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap().as_secs();

        // Expired one second ago; no leeway is granted
        let claims = Claims {
            iss: config.issuer.clone(),
            sub: "admin".to_string(),
            uid: 1,
            jti: Uuid::new_v4().to_string(),
            iat: now - 3601,
            exp: now - 1,
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.secret.as_bytes()),
        )
        .unwrap();

        let result = validate_access_token(&config, &token);
        assert!(matches!(result, Err(JwtError::ExpiredToken)));
    }

    #[test]
    fn test_huge_lifetime_is_an_error() {
        let config = JwtConfig {
            expiration_secs: u64::MAX,
            ..JwtConfig::default()
        };

        let result = generate_access_token(&config, 1, "admin");
        assert!(matches!(result, Err(JwtError::LifetimeOutOfRange(u64::MAX))));
    }
}
