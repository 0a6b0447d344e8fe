//! API handlers

pub mod auth;
pub mod clients;
pub mod health;
pub mod products;
pub mod users;

use crate::error::AppError;

/// Parse a path id; anything that is not an integer is a missing entity
pub(crate) fn parse_id(raw: &str, not_found: &str) -> Result<i64, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::NotFound(not_found.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42", "x").unwrap(), 42);
        assert!(matches!(
            parse_id("abc", "Cliente não encontrado"),
            Err(AppError::NotFound(m)) if m == "Cliente não encontrado"
        ));
        assert!(parse_id("1.5", "x").is_err());
    }
}
