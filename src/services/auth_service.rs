use argon2::{
    Argon2, PasswordHasher,
    password_hash::{PasswordHash, PasswordVerifier, SaltString},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use password_hash::rand_core::OsRng;

use crate::{
    audit,
    dto::auth::{Claims, LoginRequest, LoginResponse},
    error::{AppError, AppResult},
    middleware::auth::ADMIN_ROLE,
    response::{ApiResponse, Meta},
    state::AppState,
};

const TOKEN_TTL_HOURS: i64 = 12;

pub fn is_valid_pin(pin: &str) -> bool {
    pin.len() == 4 && pin.bytes().all(|b| b.is_ascii_digit())
}

/// argon2 PHC string for a PIN, as expected in `ADMIN_PIN_HASH`.
pub fn hash_pin(pin: &str) -> anyhow::Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default()
        .hash_password(pin.as_bytes(), &salt)
        .map_err(|e| anyhow::anyhow!(e.to_string()))?;
    Ok(hash.to_string())
}

pub fn verify_pin(pin: &str, phc: &str) -> AppResult<bool> {
    let parsed = PasswordHash::new(phc)
        .map_err(|_| AppError::Internal(anyhow::anyhow!("Invalid admin PIN hash")))?;
    Ok(Argon2::default()
        .verify_password(pin.as_bytes(), &parsed)
        .is_ok())
}

pub fn issue_token(secret: &str, subject: &str, role: &str) -> AppResult<LoginResponse> {
    let expires_at = Utc::now()
        .checked_add_signed(Duration::hours(TOKEN_TTL_HOURS))
        .ok_or_else(|| AppError::Internal(anyhow::anyhow!("Failed to set expiration")))?;

    let claims = Claims {
        sub: subject.to_string(),
        role: role.to_string(),
        exp: expires_at.timestamp() as usize,
    };

    let token = encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AppError::Internal(anyhow::anyhow!(e.to_string())))?;

    Ok(LoginResponse { token, expires_at })
}

pub async fn login_admin(
    state: &AppState,
    payload: LoginRequest,
) -> AppResult<ApiResponse<LoginResponse>> {
    let pin = payload.pin.trim();
    if !is_valid_pin(pin) {
        return Err(AppError::BadRequest("PIN must be 4 digits".into()));
    }

    if !verify_pin(pin, &state.config.admin_pin_hash)? {
        tracing::warn!("admin login rejected");
        return Err(AppError::Unauthorized);
    }

    let resp = issue_token(&state.config.jwt_secret, ADMIN_ROLE, ADMIN_ROLE)?;

    audit::record(
        &state.pool,
        Some(ADMIN_ROLE),
        "admin_login",
        "admin",
        serde_json::json!({ "expires_at": resp.expires_at }),
    )
    .await;

    Ok(ApiResponse::success("Logged in", resp, Some(Meta::empty())))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::auth::decode_token;

    #[test]
    fn pin_format() {
        assert!(is_valid_pin("1234"));
        assert!(!is_valid_pin("123"));
        assert!(!is_valid_pin("12345"));
        assert!(!is_valid_pin("12a4"));
    }

    #[test]
    fn hashed_pin_verifies() {
        let phc = hash_pin("4321").unwrap();
        assert!(verify_pin("4321", &phc).unwrap());
        assert!(!verify_pin("1234", &phc).unwrap());
    }

    #[test]
    fn malformed_hash_is_internal_error() {
        assert!(matches!(verify_pin("1234", "plain"), Err(AppError::Internal(_))));
    }

    #[test]
    fn issued_token_decodes_as_admin() {
        let resp = issue_token("secret", ADMIN_ROLE, ADMIN_ROLE).unwrap();
        let user = decode_token(&resp.token, "secret").unwrap();
        assert_eq!(user.role, ADMIN_ROLE);
        assert!(resp.expires_at > Utc::now() + Duration::hours(11));
        assert!(decode_token(&resp.token, "other").is_err());
    }
}
