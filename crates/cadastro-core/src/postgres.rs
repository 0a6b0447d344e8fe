//! PostgreSQL store
//!
//! Implements the client, product and credential stores over a shared
//! SQLx connection pool.

use std::time::Duration;

use async_trait::async_trait;
use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::info;

use crate::config::DatabaseConfig;
use crate::models::{Client, Credential, NewClient, NewProduct, Product, UserPublic};
use crate::store::{ClientStore, CredentialStore, ProductStore};
use crate::{schema, Result, StoreError};

const CLIENT_COLUMNS: &str = "id, nome, sobrenome, email, idade";
const PRODUCT_COLUMNS: &str = "id, nome, descricao, preco::FLOAT8 AS preco, data_atualizado";

/// PostgreSQL-backed store for every entity
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Open a connection pool
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.pool_size)
            .acquire_timeout(Duration::from_secs(config.connect_timeout_secs))
            .connect(&config.url)
            .await
            .map_err(|e| StoreError::Database(format!("PostgreSQL connection failed: {e}")))?;

        info!(pool_size = config.pool_size, "Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// Create from an existing pool
    pub fn from_pool(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get the connection pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Apply the schema
    pub async fn migrate(&self) -> Result<()> {
        schema::migrate(&self.pool).await
    }
}

/// Map a query failure, turning unique violations into `Conflict(conflict)`
fn query_error(context: &'static str, conflict: &'static str) -> impl Fn(sqlx::Error) -> StoreError {
    move |e| match &e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict(conflict.to_string())
        }
        _ => StoreError::Database(format!("Failed to {context}: {e}")),
    }
}

fn db_error(context: &'static str) -> impl Fn(sqlx::Error) -> StoreError {
    move |e| StoreError::Database(format!("Failed to {context}: {e}"))
}

// ============================================================================
// Clients
// ============================================================================

#[async_trait]
impl ClientStore for PgStore {
    async fn create(&self, client: NewClient) -> Result<Client> {
        sqlx::query_as::<_, Client>(&format!(
            "INSERT INTO clientes (nome, sobrenome, email, idade) VALUES ($1, $2, $3, $4) \
             RETURNING {CLIENT_COLUMNS}"
        ))
        .bind(&client.nome)
        .bind(&client.sobrenome)
        .bind(&client.email)
        .bind(client.idade)
        .fetch_one(&self.pool)
        .await
        .map_err(query_error("create client", "Email já cadastrado"))
    }

    async fn list(&self) -> Result<Vec<Client>> {
        sqlx::query_as::<_, Client>(&format!("SELECT {CLIENT_COLUMNS} FROM clientes ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list clients"))
    }

    async fn find(&self, id: i64) -> Result<Option<Client>> {
        sqlx::query_as::<_, Client>(&format!(
            "SELECT {CLIENT_COLUMNS} FROM clientes WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get client"))
    }

    async fn update(&self, id: i64, client: NewClient) -> Result<Option<Client>> {
        sqlx::query_as::<_, Client>(&format!(
            r#"
            UPDATE clientes SET
                nome = $2,
                sobrenome = $3,
                email = $4,
                idade = $5,
                updated_at = NOW()
            WHERE id = $1
            RETURNING {CLIENT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&client.nome)
        .bind(&client.sobrenome)
        .bind(&client.email)
        .bind(client.idade)
        .fetch_optional(&self.pool)
        .await
        .map_err(query_error("update client", "Email já cadastrado"))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM clientes WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("delete client"))?;

        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// Products
// ============================================================================

#[async_trait]
impl ProductStore for PgStore {
    async fn create(&self, product: NewProduct) -> Result<Product> {
        sqlx::query_as::<_, Product>(&format!(
            "INSERT INTO produtos (nome, descricao, preco, data_atualizado) \
             VALUES ($1, $2, $3::FLOAT8, NOW()) RETURNING {PRODUCT_COLUMNS}"
        ))
        .bind(&product.nome)
        .bind(&product.descricao)
        .bind(product.preco)
        .fetch_one(&self.pool)
        .await
        .map_err(db_error("create product"))
    }

    async fn list(&self) -> Result<Vec<Product>> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM produtos ORDER BY id DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(db_error("list products"))
    }

    async fn find(&self, id: i64) -> Result<Option<Product>> {
        sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM produtos WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get product"))
    }

    async fn update(&self, id: i64, product: NewProduct) -> Result<Option<Product>> {
        sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE produtos SET
                nome = $2,
                descricao = $3,
                preco = $4::FLOAT8,
                data_atualizado = NOW()
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&product.nome)
        .bind(&product.descricao)
        .bind(product.preco)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("update product"))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        let result = sqlx::query("DELETE FROM produtos WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("delete product"))?;

        Ok(result.rows_affected() > 0)
    }
}

// ============================================================================
// Credentials
// ============================================================================

#[async_trait]
impl CredentialStore for PgStore {
    async fn create(&self, usuario: &str, password_hash: &str) -> Result<UserPublic> {
        sqlx::query_as::<_, UserPublic>(
            "INSERT INTO usuarios (usuario, senha) VALUES ($1, $2) RETURNING id, usuario",
        )
        .bind(usuario)
        .bind(password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(query_error("create user", "Usuário já existe"))
    }

    async fn find_by_usuario(&self, usuario: &str) -> Result<Option<Credential>> {
        sqlx::query_as::<_, Credential>(
            "SELECT id, usuario, senha, token FROM usuarios WHERE usuario = $1",
        )
        .bind(usuario)
        .fetch_optional(&self.pool)
        .await
        .map_err(db_error("get user"))
    }

    async fn list(&self) -> Result<Vec<UserPublic>> {
        sqlx::query_as::<_, UserPublic>("SELECT id, usuario FROM usuarios ORDER BY id")
            .fetch_all(&self.pool)
            .await
            .map_err(db_error("list users"))
    }

    async fn stamp_token(&self, id: i64, token: &str) -> Result<()> {
        sqlx::query("UPDATE usuarios SET token = $1, updated_at = NOW() WHERE id = $2")
            .bind(token)
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(db_error("stamp token"))?;

        Ok(())
    }

    async fn clear_token(&self, token: &str) -> Result<bool> {
        let result =
            sqlx::query("UPDATE usuarios SET token = NULL, updated_at = NOW() WHERE token = $1")
                .bind(token)
                .execute(&self.pool)
                .await
                .map_err(db_error("clear token"))?;

        Ok(result.rows_affected() > 0)
    }

    async fn token_exists(&self, token: &str) -> Result<bool> {
        let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM usuarios WHERE token = $1")
            .bind(token)
            .fetch_one(&self.pool)
            .await
            .map_err(db_error("check token"))?;

        Ok(count > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn test_store() -> PgStore {
        let url = std::env::var("DATABASE_URL")
            .unwrap_or_else(|_| DatabaseConfig::default().url);
        let store = PgStore::connect(&DatabaseConfig {
            url,
            ..Default::default()
        })
        .await
        .expect("database available");
        store.migrate().await.expect("migration");
        store
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn test_client_roundtrip_and_conflict() {
        let store = test_store().await;
        let email = format!("pg-{}@example.com", crate::session::unix_now());
        let client = NewClient {
            nome: "Teste".into(),
            sobrenome: None,
            email: email.clone(),
            idade: 40,
        };

        let created = ClientStore::create(&store, client.clone()).await.unwrap();
        assert_eq!(created.email, email);
        assert!(matches!(
            ClientStore::create(&store, client).await,
            Err(StoreError::Conflict(_))
        ));
        assert!(ClientStore::delete(&store, created.id).await.unwrap());
        assert!(!ClientStore::delete(&store, created.id).await.unwrap());
    }

    #[tokio::test]
    #[ignore = "requires database"]
    async fn test_token_stamp() {
        let store = test_store().await;
        let usuario = format!("pg_user_{}", crate::session::unix_now());
        let user = CredentialStore::create(&store, &usuario, "hash").await.unwrap();

        store.stamp_token(user.id, "pg-token").await.unwrap();
        assert!(store.token_exists("pg-token").await.unwrap());
        assert!(store.clear_token("pg-token").await.unwrap());
        assert!(!store.token_exists("pg-token").await.unwrap());
    }
}
