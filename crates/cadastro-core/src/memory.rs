//! In-memory stores
//!
//! Process-local implementations of the storage traits, used for
//! development and tests. Data is lost on restart.

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use crate::models::{Client, Credential, NewClient, NewProduct, Product, UserPublic};
use crate::store::{ClientStore, CredentialStore, ProductStore};
use crate::{Result, StoreError};

/// Rows keyed by id with a monotonically increasing id sequence
#[derive(Debug)]
struct Table<T> {
    rows: BTreeMap<i64, T>,
    next_id: i64,
}

impl<T> Default for Table<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            next_id: 1,
        }
    }
}

impl<T> Table<T> {
    fn next_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}

// ============================================================================
// Clients
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryClientStore {
    table: RwLock<Table<Client>>,
}

impl MemoryClientStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn email_taken(table: &Table<Client>, email: &str, except: Option<i64>) -> bool {
    table
        .rows
        .values()
        .any(|c| c.email == email && Some(c.id) != except)
}

#[async_trait]
impl ClientStore for MemoryClientStore {
    async fn create(&self, client: NewClient) -> Result<Client> {
        let mut table = self.table.write().await;
        if email_taken(&table, &client.email, None) {
            return Err(StoreError::Conflict("Email já cadastrado".to_string()));
        }

        let id = table.next_id();
        let row = Client {
            id,
            nome: client.nome,
            sobrenome: client.sobrenome,
            email: client.email,
            idade: client.idade,
        };
        table.rows.insert(id, row.clone());
        Ok(row)
    }

    async fn list(&self) -> Result<Vec<Client>> {
        Ok(self.table.read().await.rows.values().cloned().collect())
    }

    async fn find(&self, id: i64) -> Result<Option<Client>> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn update(&self, id: i64, client: NewClient) -> Result<Option<Client>> {
        let mut table = self.table.write().await;
        if !table.rows.contains_key(&id) {
            return Ok(None);
        }
        if email_taken(&table, &client.email, Some(id)) {
            return Err(StoreError::Conflict("Email já cadastrado".to_string()));
        }

        let row = Client {
            id,
            nome: client.nome,
            sobrenome: client.sobrenome,
            email: client.email,
            idade: client.idade,
        };
        table.rows.insert(id, row.clone());
        Ok(Some(row))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        Ok(self.table.write().await.rows.remove(&id).is_some())
    }
}

// ============================================================================
// Products
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryProductStore {
    table: RwLock<Table<Product>>,
}

impl MemoryProductStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ProductStore for MemoryProductStore {
    async fn create(&self, product: NewProduct) -> Result<Product> {
        let mut table = self.table.write().await;
        let id = table.next_id();
        let row = Product {
            id,
            nome: product.nome,
            descricao: product.descricao,
            preco: product.preco,
            data_atualizado: Utc::now(),
        };
        table.rows.insert(id, row.clone());
        Ok(row)
    }

    async fn list(&self) -> Result<Vec<Product>> {
        Ok(self.table.read().await.rows.values().rev().cloned().collect())
    }

    async fn find(&self, id: i64) -> Result<Option<Product>> {
        Ok(self.table.read().await.rows.get(&id).cloned())
    }

    async fn update(&self, id: i64, product: NewProduct) -> Result<Option<Product>> {
        let mut table = self.table.write().await;
        let Some(row) = table.rows.get_mut(&id) else {
            return Ok(None);
        };

        row.nome = product.nome;
        row.descricao = product.descricao;
        row.preco = product.preco;
        row.data_atualizado = Utc::now();
        Ok(Some(row.clone()))
    }

    async fn delete(&self, id: i64) -> Result<bool> {
        Ok(self.table.write().await.rows.remove(&id).is_some())
    }
}

// ============================================================================
// Credentials
// ============================================================================

#[derive(Debug, Default)]
pub struct MemoryCredentialStore {
    table: RwLock<Table<Credential>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn create(&self, usuario: &str, password_hash: &str) -> Result<UserPublic> {
        let mut table = self.table.write().await;
        if table.rows.values().any(|c| c.usuario == usuario) {
            return Err(StoreError::Conflict("Usuário já existe".to_string()));
        }

        let id = table.next_id();
        let credential = Credential {
            id,
            usuario: usuario.to_string(),
            password_hash: password_hash.to_string(),
            token: None,
        };
        let public = UserPublic::from(&credential);
        table.rows.insert(id, credential);
        Ok(public)
    }

    async fn find_by_usuario(&self, usuario: &str) -> Result<Option<Credential>> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .values()
            .find(|c| c.usuario == usuario)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<UserPublic>> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .values()
            .map(UserPublic::from)
            .collect())
    }

    async fn stamp_token(&self, id: i64, token: &str) -> Result<()> {
        if let Some(credential) = self.table.write().await.rows.get_mut(&id) {
            credential.token = Some(token.to_string());
        }
        Ok(())
    }

    async fn clear_token(&self, token: &str) -> Result<bool> {
        let mut table = self.table.write().await;
        let mut cleared = false;
        for credential in table.rows.values_mut() {
            if credential.token.as_deref() == Some(token) {
                credential.token = None;
                cleared = true;
            }
        }
        Ok(cleared)
    }

    async fn token_exists(&self, token: &str) -> Result<bool> {
        Ok(self
            .table
            .read()
            .await
            .rows
            .values()
            .any(|c| c.token.as_deref() == Some(token)))
    }
}
