//! Storage capability traits
//!
//! Handlers and the auth service only see these traits; the concrete
//! backend (in-memory or PostgreSQL) is picked when the app state is built.

use async_trait::async_trait;

use crate::models::{Client, Credential, NewClient, NewProduct, Product, UserPublic};
use crate::Result;

/// Client persistence
#[async_trait]
pub trait ClientStore: Send + Sync {
    /// Insert a client; a duplicate email is a `Conflict`
    async fn create(&self, client: NewClient) -> Result<Client>;

    /// All clients in insertion order
    async fn list(&self) -> Result<Vec<Client>>;

    async fn find(&self, id: i64) -> Result<Option<Client>>;

    /// Replace a client's fields; `None` when the id does not exist
    async fn update(&self, id: i64, client: NewClient) -> Result<Option<Client>>;

    /// Returns `false` when nothing was deleted
    async fn delete(&self, id: i64) -> Result<bool>;
}

/// Product persistence
#[async_trait]
pub trait ProductStore: Send + Sync {
    async fn create(&self, product: NewProduct) -> Result<Product>;

    /// All products, newest first
    async fn list(&self) -> Result<Vec<Product>>;

    async fn find(&self, id: i64) -> Result<Option<Product>>;

    /// Replace a product's fields and refresh `data_atualizado`
    async fn update(&self, id: i64, product: NewProduct) -> Result<Option<Product>>;

    async fn delete(&self, id: i64) -> Result<bool>;
}

/// Credential records, including the per-account token stamp
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Insert a credential with an already hashed password
    async fn create(&self, usuario: &str, password_hash: &str) -> Result<UserPublic>;

    async fn find_by_usuario(&self, usuario: &str) -> Result<Option<Credential>>;

    async fn list(&self) -> Result<Vec<UserPublic>>;

    /// Overwrite the stamped token of an account
    async fn stamp_token(&self, id: i64, token: &str) -> Result<()>;

    /// Clear the stamp on whichever account carries `token`
    async fn clear_token(&self, token: &str) -> Result<bool>;

    /// Whether any account currently carries `token`
    async fn token_exists(&self, token: &str) -> Result<bool>;
}
