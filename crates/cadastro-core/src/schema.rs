//! Database schema and demo data
//!
//! Every statement is idempotent so `migrate` and `seed` can run on each
//! deploy.

use sqlx::PgPool;
use tracing::{debug, info};

use crate::{Result, StoreError};

/// DDL applied by [`migrate`], in order
pub const MIGRATIONS: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS usuarios (
        id BIGSERIAL PRIMARY KEY,
        usuario VARCHAR(255) NOT NULL UNIQUE,
        senha VARCHAR(255) NOT NULL,
        token TEXT,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_usuarios_token ON usuarios (token)",
    r#"
    CREATE TABLE IF NOT EXISTS clientes (
        id BIGSERIAL PRIMARY KEY,
        nome VARCHAR(255) NOT NULL,
        sobrenome VARCHAR(255),
        email VARCHAR(255) NOT NULL UNIQUE,
        idade INTEGER NOT NULL,
        created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
        updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS produtos (
        id BIGSERIAL PRIMARY KEY,
        nome VARCHAR(255) NOT NULL,
        descricao VARCHAR(1000) NOT NULL,
        preco NUMERIC(10, 2) NOT NULL,
        data_atualizado TIMESTAMPTZ NOT NULL DEFAULT NOW()
    )
    "#,
];

/// Demo rows inserted by [`seed`]
pub const SEED: &[&str] = &[
    r#"
    INSERT INTO clientes (nome, sobrenome, email, idade) VALUES
        ('Carlos', 'Alberto', 'carlos.alberto@example.com', 30),
        ('Fernanda', 'Lima', 'fernanda.lima@example.com', 25),
        ('Ricardo', 'Gomes', 'ricardo.gomes@example.com', 42),
        ('Juliana', 'Pereira', 'juliana.pereira@example.com', 35),
        ('Lucas', 'Martins', 'lucas.martins@example.com', 28)
    ON CONFLICT (email) DO NOTHING
    "#,
    r#"
    INSERT INTO produtos (nome, descricao, preco, data_atualizado)
    SELECT v.nome, v.descricao, v.preco, NOW()
    FROM (VALUES
        ('Smartphone X', 'Smartphone de última geração com câmera de 108MP', 2999.90),
        ('Notebook Pro', 'Notebook potente para trabalho e jogos', 7500.00),
        ('Smart TV 4K', 'TV com resolução 4K e HDR', 3200.50),
        ('Fone de Ouvido Bluetooth', 'Fone sem fio com cancelamento de ruído', 499.00),
        ('Mouse Gamer', 'Mouse com alta precisão para gamers', 250.75)
    ) AS v(nome, descricao, preco)
    WHERE NOT EXISTS (SELECT 1 FROM produtos p WHERE p.nome = v.nome)
    "#,
];

/// Create tables and indexes
pub async fn migrate(pool: &PgPool) -> Result<()> {
    run_all(pool, MIGRATIONS, "migration").await?;
    info!(statements = MIGRATIONS.len(), "Database schema is up to date");
    Ok(())
}

/// Insert demo clients and products
pub async fn seed(pool: &PgPool) -> Result<()> {
    run_all(pool, SEED, "seed").await?;
    info!("Demo data inserted");
    Ok(())
}

async fn run_all(pool: &PgPool, statements: &[&str], kind: &str) -> Result<()> {
    let mut tx = pool
        .begin()
        .await
        .map_err(|e| StoreError::Database(format!("Failed to start {kind}: {e}")))?;

    for (i, statement) in statements.iter().enumerate() {
        debug!(kind, step = i + 1, total = statements.len(), "Executing statement");
        sqlx::query(statement)
            .execute(&mut *tx)
            .await
            .map_err(|e| StoreError::Database(format!("{kind} step {} failed: {e}", i + 1)))?;
    }

    tx.commit()
        .await
        .map_err(|e| StoreError::Database(format!("Failed to commit {kind}: {e}")))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_statements_are_idempotent() {
        for statement in MIGRATIONS {
            assert!(statement.contains("IF NOT EXISTS"), "{statement}");
        }
        for statement in SEED {
            assert!(
                statement.contains("ON CONFLICT") || statement.contains("NOT EXISTS"),
                "{statement}"
            );
        }
    }

    #[test]
    fn test_usuarios_has_token_column() {
        assert!(MIGRATIONS[0].contains("token TEXT"));
    }
}
