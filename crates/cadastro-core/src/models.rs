//! Domain models and request payloads
//!
//! Payload types accept loosely-typed JSON and turn it into the validated
//! `New*` inputs the stores work with. The first failing rule wins.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use utoipa::ToSchema;

use crate::ValidationError;

// ============================================================================
// Clients
// ============================================================================

/// A registered client
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Client {
    pub id: i64,
    pub nome: String,
    pub sobrenome: Option<String>,
    pub email: String,
    pub idade: i32,
}

/// Client fields as received on create and update
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ClientPayload {
    pub nome: Option<String>,
    pub sobrenome: Option<String>,
    pub email: Option<String>,
    #[schema(value_type = Option<i64>)]
    pub idade: Option<Value>,
}

/// Validated client input
#[derive(Debug, Clone, PartialEq)]
pub struct NewClient {
    pub nome: String,
    pub sobrenome: Option<String>,
    pub email: String,
    pub idade: i32,
}

impl ClientPayload {
    pub fn validate(self) -> Result<NewClient, ValidationError> {
        let nome = non_blank(self.nome).ok_or(ValidationError::MissingName)?;

        let email = self
            .email
            .filter(|e| e.contains('@'))
            .ok_or(ValidationError::InvalidEmail)?;

        // Any JSON number with no fractional part; `30.0` counts as 30
        let idade = self
            .idade
            .as_ref()
            .and_then(Value::as_f64)
            .filter(|i| i.is_finite() && *i >= 0.0 && i.fract() == 0.0)
            .ok_or(ValidationError::InvalidAge)?;
        if idade >= 120.0 {
            return Err(ValidationError::AgeTooHigh);
        }

        Ok(NewClient {
            nome,
            sobrenome: self.sobrenome,
            email,
            // bounded to [0, 120) above
            idade: idade as i32,
        })
    }
}

// ============================================================================
// Products
// ============================================================================

/// A catalog product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct Product {
    pub id: i64,
    pub nome: String,
    pub descricao: String,
    pub preco: f64,
    pub data_atualizado: DateTime<Utc>,
}

/// Product fields as received on create and update
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct ProductPayload {
    pub nome: Option<String>,
    pub descricao: Option<String>,
    #[schema(value_type = Option<f64>)]
    pub preco: Option<Value>,
}

/// Validated product input
#[derive(Debug, Clone, PartialEq)]
pub struct NewProduct {
    pub nome: String,
    pub descricao: String,
    pub preco: f64,
}

impl ProductPayload {
    pub fn validate(self) -> Result<NewProduct, ValidationError> {
        let nome = non_blank(self.nome)
            .map(|s| s.trim().to_string())
            .ok_or(ValidationError::MissingName)?;
        let descricao = non_blank(self.descricao)
            .map(|s| s.trim().to_string())
            .ok_or(ValidationError::MissingDescription)?;

        let preco = self
            .preco
            .as_ref()
            .and_then(Value::as_f64)
            .filter(|p| p.is_finite() && *p > 0.0)
            .map(round_cents)
            .filter(|p| *p > 0.0)
            .ok_or(ValidationError::InvalidPrice)?;

        Ok(NewProduct {
            nome,
            descricao,
            preco,
        })
    }
}

fn round_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

// ============================================================================
// Users and credentials
// ============================================================================

/// Stored credential record
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Credential {
    pub id: i64,
    pub usuario: String,
    #[sqlx(rename = "senha")]
    pub password_hash: String,
    /// Last issued token, when the stamped session strategy is in use
    pub token: Option<String>,
}

/// User as exposed by the API (no hash, no token)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow, ToSchema)]
pub struct UserPublic {
    pub id: i64,
    pub usuario: String,
}

impl From<&Credential> for UserPublic {
    fn from(credential: &Credential) -> Self {
        Self {
            id: credential.id,
            usuario: credential.usuario.clone(),
        }
    }
}

/// User registration request
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct UserPayload {
    pub usuario: Option<String>,
    pub senha: Option<String>,
}

/// Validated registration input; the password is still plaintext
#[derive(Debug, Clone)]
pub struct NewUser {
    pub usuario: String,
    pub senha: String,
}

impl UserPayload {
    pub fn validate(self) -> Result<NewUser, ValidationError> {
        match (self.usuario, self.senha) {
            (Some(usuario), Some(senha))
                if usuario.chars().count() >= 3 && senha.chars().count() >= 6 =>
            {
                Ok(NewUser { usuario, senha })
            }
            _ => Err(ValidationError::WeakCredentials),
        }
    }
}

/// Login request; `email` and `usuario` are interchangeable identifiers
#[derive(Debug, Clone, Default, Deserialize, ToSchema)]
pub struct LoginPayload {
    pub usuario: Option<String>,
    pub email: Option<String>,
    pub senha: Option<String>,
}

impl LoginPayload {
    /// Returns `(identifier, senha)`
    pub fn validate(self) -> Result<(String, String), ValidationError> {
        let identifier = self
            .email
            .filter(|e| !e.is_empty())
            .or(self.usuario)
            .filter(|u| !u.is_empty())
            .ok_or(ValidationError::MissingLoginFields)?;
        let senha = self
            .senha
            .filter(|s| !s.is_empty())
            .ok_or(ValidationError::MissingLoginFields)?;

        Ok((identifier, senha))
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|s| !s.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use serde_json::json;

    fn client(value: Value) -> Result<NewClient, ValidationError> {
        serde_json::from_value::<ClientPayload>(value)
            .unwrap()
            .validate()
    }

    fn product(value: Value) -> Result<NewProduct, ValidationError> {
        serde_json::from_value::<ProductPayload>(value)
            .unwrap()
            .validate()
    }

    #[test]
    fn test_valid_client() {
        let c = client(json!({
            "nome": "Carlos",
            "sobrenome": "Silva",
            "email": "carlos@example.com",
            "idade": 35
        }))
        .unwrap();
        assert_eq!(c.nome, "Carlos");
        assert_eq!(c.sobrenome.as_deref(), Some("Silva"));
        assert_eq!(c.idade, 35);
    }

    #[test]
    fn test_client_rule_order() {
        assert_eq!(
            client(json!({"nome": "  ", "email": "x", "idade": -1})),
            Err(ValidationError::MissingName)
        );
        assert_eq!(
            client(json!({"nome": "Ana", "email": "ana.example.com", "idade": 200})),
            Err(ValidationError::InvalidEmail)
        );
        assert_eq!(
            client(json!({"nome": "Ana", "email": "ana@example.com", "idade": "30"})),
            Err(ValidationError::InvalidAge)
        );
        assert_eq!(
            client(json!({"nome": "Ana", "email": "ana@example.com"})),
            Err(ValidationError::InvalidAge)
        );
        assert_eq!(
            client(json!({"nome": "Ana", "email": "ana@example.com", "idade": 130})),
            Err(ValidationError::AgeTooHigh)
        );
    }

    #[test]
    fn test_client_age_boundaries() {
        assert!(client(json!({"nome": "A", "email": "a@b", "idade": 0})).is_ok());
        assert!(client(json!({"nome": "A", "email": "a@b", "idade": 119})).is_ok());
        assert_eq!(
            client(json!({"nome": "A", "email": "a@b", "idade": 120})),
            Err(ValidationError::AgeTooHigh)
        );
        assert_eq!(
            client(json!({"nome": "A", "email": "a@b", "idade": 30.5})),
            Err(ValidationError::InvalidAge)
        );
    }

    #[test]
    fn test_client_age_accepts_integral_float() {
        assert_eq!(
            client(json!({"nome": "A", "email": "a@b", "idade": 30.0})).map(|c| c.idade),
            Ok(30)
        );
        assert_eq!(
            client(json!({"nome": "A", "email": "a@b", "idade": 120.0})),
            Err(ValidationError::AgeTooHigh)
        );
        assert_eq!(
            client(json!({"nome": "A", "email": "a@b", "idade": -0.5})),
            Err(ValidationError::InvalidAge)
        );
    }

    #[test]
    fn test_product_validation() {
        let p = product(json!({"nome": " Mouse ", "descricao": " Gamer ", "preco": 250.754}))
            .unwrap();
        assert_eq!(p.nome, "Mouse");
        assert_eq!(p.descricao, "Gamer");
        assert_eq!(p.preco, 250.75);

        assert_eq!(
            product(json!({"descricao": "x", "preco": 1})),
            Err(ValidationError::MissingName)
        );
        assert_eq!(
            product(json!({"nome": "x", "descricao": "", "preco": 1})),
            Err(ValidationError::MissingDescription)
        );
        assert_eq!(
            product(json!({"nome": "x", "descricao": "y", "preco": 0})),
            Err(ValidationError::InvalidPrice)
        );
        assert_eq!(
            product(json!({"nome": "x", "descricao": "y", "preco": "10"})),
            Err(ValidationError::InvalidPrice)
        );
    }

    #[test]
    fn test_user_payload() {
        let ok = UserPayload {
            usuario: Some("ana".into()),
            senha: Some("123456".into()),
        };
        assert!(ok.validate().is_ok());

        let short = UserPayload {
            usuario: Some("an".into()),
            senha: Some("123456".into()),
        };
        assert_eq!(short.validate().unwrap_err(), ValidationError::WeakCredentials);

        assert_eq!(
            UserPayload::default().validate().unwrap_err(),
            ValidationError::WeakCredentials
        );
    }

    #[test]
    fn test_login_identifier() {
        let by_email = LoginPayload {
            usuario: Some("admin".into()),
            email: Some("admin@example.com".into()),
            senha: Some("secret".into()),
        };
        assert_eq!(by_email.validate().unwrap().0, "admin@example.com");

        let by_user = LoginPayload {
            usuario: Some("admin".into()),
            email: Some(String::new()),
            senha: Some("secret".into()),
        };
        assert_eq!(by_user.validate().unwrap().0, "admin");

        let no_secret = LoginPayload {
            usuario: Some("admin".into()),
            ..Default::default()
        };
        assert_eq!(
            no_secret.validate().unwrap_err(),
            ValidationError::MissingLoginFields
        );
    }

    #[test]
    fn test_user_public_hides_secrets() {
        let credential = Credential {
            id: 7,
            usuario: "admin".into(),
            password_hash: "$argon2id$...".into(),
            token: Some("abc".into()),
        };
        let json = serde_json::to_value(UserPublic::from(&credential)).unwrap();
        assert_eq!(json, json!({"id": 7, "usuario": "admin"}));
    }

    proptest! {
        #[test]
        fn prop_age_accepted_iff_in_range(idade in -500i64..500) {
            let result = client(json!({"nome": "A", "email": "a@b", "idade": idade}));
            match idade {
                i if i < 0 => prop_assert_eq!(result, Err(ValidationError::InvalidAge)),
                i if i >= 120 => prop_assert_eq!(result, Err(ValidationError::AgeTooHigh)),
                i => prop_assert_eq!(result.map(|c| c.idade as i64), Ok(i)),
            }
        }

        #[test]
        fn prop_price_positive_after_validation(preco in -1_000.0f64..1_000.0) {
            if let Ok(p) = product(json!({"nome": "n", "descricao": "d", "preco": preco})) {
                prop_assert!(p.preco > 0.0);
                prop_assert!(preco > 0.0);
            }
        }
    }
}
