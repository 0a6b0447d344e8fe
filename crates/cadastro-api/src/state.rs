//! Application state management
//!
//! Everything shared between requests lives here and is handed to
//! handlers as `State<Arc<AppState>>`.

use crate::auth::{AuthService, JwtConfig, PasswordConfig};
use crate::error::AppError;
use cadastro_core::config::{AppConfig, SessionStrategy, StorageBackend};
use cadastro_core::models::{Client, NewUser};
use cadastro_core::{
    ClientStore, CredentialStore, MemoryClientStore, MemoryCredentialStore, MemoryProductStore,
    PgStore, ProductStore, ReadThroughCache, RevocationList, SessionRegistry, StampedSessions,
    StoreError,
};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Cache key of the client listing
pub const CLIENT_LIST_KEY: &str = "clientes_list";

/// Application state shared across handlers
pub struct AppState {
    /// Application configuration
    pub config: AppConfig,
    /// Server start time
    pub start_time: Instant,
    /// Request counter
    pub request_count: AtomicU64,
    /// Login, logout and token authorization
    pub auth: AuthService,
    pub clients: Arc<dyn ClientStore>,
    pub products: Arc<dyn ProductStore>,
    /// Read-through cache for `GET /clientes`
    pub client_cache: ReadThroughCache<&'static str, Vec<Client>>,
}

impl AppState {
    /// Assemble state from explicit stores
    ///
    /// The session registry is chosen from the configured strategy.
    pub fn new(
        config: AppConfig,
        clients: Arc<dyn ClientStore>,
        products: Arc<dyn ProductStore>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Self {
        let sessions: Arc<dyn SessionRegistry> = match config.session_strategy() {
            SessionStrategy::RevocationList => Arc::new(RevocationList::new()),
            SessionStrategy::Stamped => Arc::new(StampedSessions::new(credentials.clone())),
        };
        let auth = AuthService::new(credentials, sessions, JwtConfig::from(&config.auth));
        let client_cache = ReadThroughCache::with_config("clientes", &config.cache);

        Self {
            config,
            start_time: Instant::now(),
            request_count: AtomicU64::new(0),
            auth,
            clients,
            products,
            client_cache,
        }
    }

    /// State backed by process-local stores
    pub fn in_memory(config: AppConfig) -> Self {
        Self::new(
            config,
            Arc::new(MemoryClientStore::new()),
            Arc::new(MemoryProductStore::new()),
            Arc::new(MemoryCredentialStore::new()),
        )
    }

    /// State backed by PostgreSQL
    pub fn with_postgres(config: AppConfig, store: PgStore) -> Self {
        let store = Arc::new(store);
        Self::new(config, store.clone(), store.clone(), store)
    }

    /// Build state for the configured storage backend
    pub async fn connect(config: AppConfig) -> Result<Self, StoreError> {
        match config.storage.backend {
            StorageBackend::Memory => Ok(Self::in_memory(config)),
            StorageBackend::Postgres => {
                let store = PgStore::connect(&config.database).await?;
                Ok(Self::with_postgres(config, store))
            }
        }
    }

    /// Use different Argon2 parameters for new password hashes
    pub fn with_password_config(mut self, config: PasswordConfig) -> Self {
        self.auth = self.auth.with_password_config(config);
        self
    }

    /// Create the configured startup account unless it already exists
    pub async fn provision_admin(&self) -> Result<(), AppError> {
        let Some(senha) = self.config.auth.admin_senha.clone() else {
            return Ok(());
        };

        let usuario = self.config.auth.admin_usuario.clone();
        match self.auth.register(NewUser { usuario, senha }).await {
            Ok(user) => {
                info!(usuario = %user.usuario, "Provisioned startup account");
                Ok(())
            }
            Err(AppError::Conflict(_)) => Ok(()),
            Err(e) => Err(e),
        }
    }

    /// Increment request counter
    pub fn increment_requests(&self) -> u64 {
        self.request_count.fetch_add(1, Ordering::SeqCst)
    }

    /// Get total request count
    pub fn get_request_count(&self) -> u64 {
        self.request_count.load(Ordering::SeqCst)
    }

    /// Get uptime in seconds
    pub fn uptime_secs(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
