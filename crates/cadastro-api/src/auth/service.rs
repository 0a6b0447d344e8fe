//! Authentication service layer
//!
//! Credential verification, token issuance, token authorization and
//! account provisioning over a [`CredentialStore`] and a
//! [`SessionRegistry`].

use super::jwt::{generate_access_token, validate_access_token, JwtConfig};
use super::middleware::{AuthError, AuthenticatedUser};
use super::password::{hash_password_with_config, verify_password, PasswordConfig};
use crate::error::AppError;
use cadastro_core::config::SessionStrategy;
use cadastro_core::models::{NewUser, UserPublic};
use cadastro_core::{CredentialStore, SessionRegistry};
use once_cell::sync::OnceCell;
use std::sync::Arc;
use tracing::{debug, error, warn};

/// Plaintext hashed once and used when the identifier does not exist
const DUMMY_PASSWORD: &str = "cadastro-dummy-password";

/// Identity established by credential verification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub user_id: i64,
    pub usuario: String,
}

/// Authentication service
pub struct AuthService {
    credentials: Arc<dyn CredentialStore>,
    sessions: Arc<dyn SessionRegistry>,
    jwt_config: JwtConfig,
    password_config: PasswordConfig,
    dummy_hash: OnceCell<String>,
}

impl AuthService {
    pub fn new(
        credentials: Arc<dyn CredentialStore>,
        sessions: Arc<dyn SessionRegistry>,
        jwt_config: JwtConfig,
    ) -> Self {
        Self {
            credentials,
            sessions,
            jwt_config,
            password_config: PasswordConfig::default(),
            dummy_hash: OnceCell::new(),
        }
    }

    /// Override the Argon2 parameters used for new hashes
    pub fn with_password_config(mut self, config: PasswordConfig) -> Self {
        self.password_config = config;
        self
    }

    pub fn jwt_config(&self) -> &JwtConfig {
        &self.jwt_config
    }

    pub fn session_strategy(&self) -> SessionStrategy {
        self.sessions.strategy()
    }

    /// Check an identifier and password against the stored credential
    ///
    /// An unknown identifier still costs one password verification, and
    /// every failure, internal ones included, is the same `InvalidCredentials`.
    pub async fn verify_credentials(
        &self,
        identifier: &str,
        senha: &str,
    ) -> Result<Identity, AppError> {
        let credential = self
            .credentials
            .find_by_usuario(identifier)
            .await
            .map_err(|e| {
                error!(error = %e, "Credential lookup failed");
                AppError::InvalidCredentials
            })?;

        let (hash, identity) = match credential {
            Some(c) => (
                c.password_hash,
                Some(Identity {
                    user_id: c.id,
                    usuario: c.usuario,
                }),
            ),
            None => {
                let hash = self.dummy_hash().await.map_err(|e| {
                    error!(error = %e, "Dummy hash unavailable");
                    AppError::InvalidCredentials
                })?;
                (hash, None)
            }
        };

        let senha = senha.to_string();
        let matches = tokio::task::spawn_blocking(move || verify_password(&senha, &hash))
            .await
            .map_err(|e| {
                error!(error = %e, "Password verification task failed");
                AppError::InvalidCredentials
            })?;

        match (matches, identity) {
            (Ok(true), Some(identity)) => Ok(identity),
            (Err(e), _) => {
                warn!(error = %e, "Stored password hash could not be used");
                Err(AppError::InvalidCredentials)
            }
            _ => Err(AppError::InvalidCredentials),
        }
    }

    /// Sign a token for `identity` and tell the session registry about it
    ///
    /// Failures surface as `InvalidCredentials`; the cause is only logged.
    pub async fn issue(&self, identity: &Identity) -> Result<String, AppError> {
        let (token, claims) =
            generate_access_token(&self.jwt_config, identity.user_id, &identity.usuario)
                .map_err(|e| {
                    error!(error = %e, user_id = identity.user_id, "Failed to generate token");
                    AppError::InvalidCredentials
                })?;

        self.sessions
            .record_issued(identity.user_id, &token, claims.exp)
            .await
            .map_err(|e| {
                error!(error = %e, user_id = identity.user_id, "Failed to record issued token");
                AppError::InvalidCredentials
            })?;

        debug!(user_id = identity.user_id, jti = %claims.jti, "Token issued");
        Ok(token)
    }

    /// Verify credentials and issue a token
    pub async fn login(&self, identifier: &str, senha: &str) -> Result<(Identity, String), AppError> {
        let identity = self.verify_credentials(identifier, senha).await?;
        let token = self.issue(&identity).await?;
        Ok((identity, token))
    }

    /// Decide whether `token` may pass the access guard
    pub async fn authorize(&self, token: &str) -> Result<AuthenticatedUser, AuthError> {
        let invalidated = self
            .sessions
            .is_invalidated(token)
            .await
            .map_err(|e| AuthError::Registry(e.to_string()))?;
        if invalidated {
            return Err(AuthError::RevokedToken);
        }

        let claims = validate_access_token(&self.jwt_config, token)?;
        Ok(AuthenticatedUser::from_claims(claims, token))
    }

    /// Invalidate the caller's token
    pub async fn logout(&self, user: &AuthenticatedUser) -> Result<(), AuthError> {
        self.sessions
            .invalidate(&user.token, user.expires_at)
            .await
            .map_err(|e| AuthError::Registry(e.to_string()))
    }

    /// Create an account with a freshly hashed password
    pub async fn register(&self, user: NewUser) -> Result<UserPublic, AppError> {
        let config = self.password_config.clone();
        let senha = user.senha;
        let hash = tokio::task::spawn_blocking(move || hash_password_with_config(&senha, &config))
            .await
            .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))?
            .map_err(|e| {
                error!(error = %e, "Failed to hash password");
                AppError::internal("Erro ao criar usuário")
            })?;

        self.credentials
            .create(&user.usuario, &hash)
            .await
            .map_err(|e| AppError::from_store("Erro ao criar usuário", e))
    }

    pub async fn list_users(&self) -> Result<Vec<UserPublic>, AppError> {
        self.credentials
            .list()
            .await
            .map_err(|e| AppError::from_store("Erro ao listar usuários", e))
    }

    async fn dummy_hash(&self) -> Result<String, AppError> {
        if let Some(hash) = self.dummy_hash.get() {
            return Ok(hash.clone());
        }

        let config = self.password_config.clone();
        let hash =
            tokio::task::spawn_blocking(move || hash_password_with_config(DUMMY_PASSWORD, &config))
                .await
                .map_err(|e| AppError::internal(format!("Password hashing task failed: {e}")))?
                .map_err(|e| AppError::internal(format!("Failed to hash password: {e}")))?;

        Ok(self.dummy_hash.get_or_init(|| hash).clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cadastro_core::models::Credential;
    use cadastro_core::{MemoryCredentialStore, RevocationList, StampedSessions, StoreError};

    /// Credential store whose token stamping always fails
    struct StampFailingStore {
        inner: MemoryCredentialStore,
    }

    #[async_trait]
    impl CredentialStore for StampFailingStore {
        async fn create(&self, usuario: &str, hash: &str) -> cadastro_core::Result<UserPublic> {
            self.inner.create(usuario, hash).await
        }

        async fn find_by_usuario(&self, usuario: &str) -> cadastro_core::Result<Option<Credential>> {
            self.inner.find_by_usuario(usuario).await
        }

        async fn list(&self) -> cadastro_core::Result<Vec<UserPublic>> {
            self.inner.list().await
        }

        async fn stamp_token(&self, _id: i64, _token: &str) -> cadastro_core::Result<()> {
            Err(StoreError::Database("connection reset".into()))
        }

        async fn clear_token(&self, token: &str) -> cadastro_core::Result<bool> {
            self.inner.clear_token(token).await
        }

        async fn token_exists(&self, token: &str) -> cadastro_core::Result<bool> {
            self.inner.token_exists(token).await
        }
    }

    async fn service(stamped: bool) -> AuthService {
        let credentials = Arc::new(MemoryCredentialStore::new());
        let sessions: Arc<dyn SessionRegistry> = if stamped {
            Arc::new(StampedSessions::new(credentials.clone()))
        } else {
            Arc::new(RevocationList::new())
        };
        let service = AuthService::new(credentials, sessions, JwtConfig::default())
            .with_password_config(PasswordConfig::light());
        service
            .register(NewUser {
                usuario: "admin".into(),
                senha: "admin123".into(),
            })
            .await
            .unwrap();
        service
    }

    #[tokio::test]
    async fn test_login_and_authorize() {
        let service = service(false).await;
        let (identity, token) = service.login("admin", "admin123").await.unwrap();
        assert_eq!(identity.usuario, "admin");

        let user = service.authorize(&token).await.unwrap();
        assert_eq!(user.usuario, "admin");
        assert_eq!(user.user_id, identity.user_id);
    }

    #[tokio::test]
    async fn test_invalid_credentials_are_indistinguishable() {
        let service = service(false).await;
        assert!(matches!(
            service.login("admin", "wrong").await,
            Err(AppError::InvalidCredentials)
        ));
        assert!(matches!(
            service.login("ghost", "admin123").await,
            Err(AppError::InvalidCredentials)
        ));
    }

    #[tokio::test]
    async fn test_logout_revokes_token() {
        let service = service(false).await;
        let (_, token) = service.login("admin", "admin123").await.unwrap();
        let user = service.authorize(&token).await.unwrap();

        service.logout(&user).await.unwrap();
        assert!(matches!(
            service.authorize(&token).await,
            Err(AuthError::RevokedToken)
        ));
    }

    #[tokio::test]
    async fn test_stamped_second_login_supersedes_first() {
        let service = service(true).await;
        let (_, first) = service.login("admin", "admin123").await.unwrap();
        let (_, second) = service.login("admin", "admin123").await.unwrap();

        assert!(matches!(
            service.authorize(&first).await,
            Err(AuthError::RevokedToken)
        ));
        assert!(service.authorize(&second).await.is_ok());
    }

    #[tokio::test]
    async fn test_garbage_token_is_invalid() {
        let service = service(false).await;
        assert!(matches!(
            service.authorize("not-a-token").await,
            Err(AuthError::InvalidToken(_))
        ));
    }

    #[tokio::test]
    async fn test_duplicate_user_conflicts() {
        let service = service(false).await;
        let result = service
            .register(NewUser {
                usuario: "admin".into(),
                senha: "another1".into(),
            })
            .await;
        assert!(matches!(result, Err(AppError::Conflict(msg)) if msg == "Usuário já existe"));
    }

    #[tokio::test]
    async fn test_login_is_unauthorized_when_stamping_fails() {
        let credentials: Arc<dyn CredentialStore> = Arc::new(StampFailingStore {
            inner: MemoryCredentialStore::new(),
        });
        let sessions = Arc::new(StampedSessions::new(credentials.clone()));
        let service = AuthService::new(credentials, sessions, JwtConfig::default())
            .with_password_config(PasswordConfig::light());
        service
            .register(NewUser {
                usuario: "admin".into(),
                senha: "admin123".into(),
            })
            .await
            .unwrap();

        let result = service.login("admin", "admin123").await;
        assert!(matches!(result, Err(AppError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_logged_out_token_stays_rejected_until_expiry_passes() {
        let credentials = Arc::new(MemoryCredentialStore::new());
        let config = JwtConfig {
            expiration_secs: 0,
            ..JwtConfig::default()
        };
        let service = AuthService::new(credentials, Arc::new(RevocationList::new()), config)
            .with_password_config(PasswordConfig::light());
        service
            .register(NewUser {
                usuario: "admin".into(),
                senha: "admin123".into(),
            })
            .await
            .unwrap();

        let (_, first) = service.login("admin", "admin123").await.unwrap();
        let Ok(user) = service.authorize(&first).await else {
            // the expiry second already passed
            return;
        };
        service.logout(&user).await.unwrap();

        // A later logout purges expired entries; `first` must not be among them
        if let Ok((_, second)) = service.login("admin", "admin123").await {
            if let Ok(other) = service.authorize(&second).await {
                service.logout(&other).await.unwrap();
            }
        }

        assert!(service.authorize(&first).await.is_err());
    }
}
