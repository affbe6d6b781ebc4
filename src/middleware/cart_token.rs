use axum::{extract::FromRequestParts, http::request::Parts};

use crate::error::AppError;

pub const CART_TOKEN_HEADER: &str = "x-cart-token";

/// Opaque browser-side cart token sent in `X-Cart-Token`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartToken(pub String);

impl CartToken {
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        let token = raw.trim();
        let valid = (16..=128).contains(&token.len())
            && token
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
        if !valid {
            return Err(AppError::BadRequest("Invalid cart token".into()));
        }
        Ok(Self(token.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl<S> FromRequestParts<S> for CartToken
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(CART_TOKEN_HEADER)
            .ok_or_else(|| AppError::BadRequest("Missing X-Cart-Token header".into()))?
            .to_str()
            .map_err(|_| AppError::BadRequest("Invalid cart token".into()))?;
        CartToken::parse(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_generated_tokens() {
        let token = uuid::Uuid::new_v4().simple().to_string();
        assert_eq!(CartToken::parse(&token).unwrap().as_str(), token);
    }

    #[test]
    fn rejects_short_or_odd_tokens() {
        assert!(CartToken::parse("short").is_err());
        assert!(CartToken::parse("has spaces in the token value").is_err());
        assert!(CartToken::parse(&"a".repeat(129)).is_err());
    }
}
