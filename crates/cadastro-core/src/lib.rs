//! Cadastro Core - Domain models, storage traits, and shared types
//!
//! This crate defines the core abstractions used by the cadastro backend:
//! - Client, product and user models with their field validation
//! - Storage capability traits with in-memory and PostgreSQL implementations
//! - Session invalidation strategies (revocation list, stamped sessions)
//! - Read-through cache for collection listings
//! - Configuration management
//! - Database schema and seed data

pub mod cache;
pub mod config;
pub mod memory;
pub mod models;
pub mod postgres;
pub mod schema;
pub mod session;
pub mod store;

pub use cache::{CacheStats, CacheStatsReport, ReadThroughCache};
pub use config::{
    AppConfig, AuthConfig, CacheConfig, ConfigError, DatabaseConfig, LoggingConfig, ServerConfig,
    SessionStrategy, StorageBackend, StorageConfig,
};
pub use memory::{MemoryClientStore, MemoryCredentialStore, MemoryProductStore};
pub use models::{
    Client, ClientPayload, Credential, LoginPayload, NewClient, NewProduct, NewUser, Product,
    ProductPayload, UserPayload, UserPublic,
};
pub use postgres::PgStore;
pub use session::{unix_now, RevocationList, SessionRegistry, StampedSessions};
pub use store::{ClientStore, CredentialStore, ProductStore};

use thiserror::Error;

// ============================================================================
// Error Types
// ============================================================================

/// Errors raised by storage backends
#[derive(Error, Debug)]
pub enum StoreError {
    /// A uniqueness rule was violated; the message is safe to show to callers
    #[error("{0}")]
    Conflict(String),

    #[error("Database error: {0}")]
    Database(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Database(err.to_string())
    }
}

/// Caller-correctable field validation failures
///
/// The display text of each variant is the message returned to API clients.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Nome é obrigatório")]
    MissingName,

    #[error("Email inválido")]
    InvalidEmail,

    #[error("Idade deve ser um número positivo")]
    InvalidAge,

    #[error("Idade deve ser menor que 120")]
    AgeTooHigh,

    #[error("Descrição é obrigatória")]
    MissingDescription,

    #[error("Preço deve ser um número positivo")]
    InvalidPrice,

    #[error("Usuário deve ter no mínimo 3 caracteres e senha no mínimo 6 caracteres")]
    WeakCredentials,

    #[error("Email/usuário e senha são obrigatórios")]
    MissingLoginFields,
}

pub type Result<T> = std::result::Result<T, StoreError>;
