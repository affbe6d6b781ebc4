use std::{env, path::PathBuf, time::Duration};

#[derive(Debug, Clone)]
pub struct BankDetails {
    pub bank_name: String,
    pub account_number: String,
    pub account_holder: String,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,
    pub base_url: String,
    pub jwt_secret: String,
    /// argon2 PHC string of the admin PIN.
    pub admin_pin_hash: String,
    pub upload_dir: PathBuf,
    pub reservation_ttl: Duration,
    pub sweep_interval: Duration,
    /// Empty cart sessions idle longer than this are pruned by the sweeper.
    pub cart_session_idle: Duration,
    pub default_quota: i32,
    pub store_name: String,
    pub bank: BankDetails,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Used by the maintenance binaries, which only talk to the database.
    pub fn database_url_from_env() -> anyhow::Result<String> {
        Ok(env::var("DATABASE_URL")?)
    }

    pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| anyhow::anyhow!("{key} is not set"))
        };

        let database_url = required("DATABASE_URL")?;
        let jwt_secret = required("JWT_SECRET")?;
        let admin_pin_hash = required("ADMIN_PIN_HASH")?;

        let host = lookup("APP_HOST").unwrap_or_else(|| "127.0.0.1".to_string());
        let port = parse_or(&lookup, "APP_PORT", 3000u16);
        let base_url = lookup("APP_BASE_URL")
            .unwrap_or_else(|| format!("http://{host}:{port}"))
            .trim_end_matches('/')
            .to_string();

        let upload_dir = PathBuf::from(lookup("UPLOAD_DIR").unwrap_or_else(|| "uploads".into()));
        let reservation_ttl =
            Duration::from_secs(parse_or(&lookup, "RESERVATION_TTL_MINUTES", 15u64) * 60);
        let sweep_interval = Duration::from_secs(parse_or(&lookup, "SWEEP_INTERVAL_SECS", 60u64).max(1));
        let cart_session_idle =
            Duration::from_secs(parse_or(&lookup, "CART_SESSION_IDLE_HOURS", 24u64).max(1) * 3600);
        let default_quota = parse_or(&lookup, "DEFAULT_QUOTA", 10i32).max(0);

        let store_name = lookup("STORE_NAME").unwrap_or_else(|| "Flash Sale Store".into());
        let bank = BankDetails {
            bank_name: lookup("BANK_NAME").unwrap_or_else(|| "BCA".into()),
            account_number: lookup("BANK_ACCOUNT_NUMBER").unwrap_or_default(),
            account_holder: lookup("BANK_ACCOUNT_HOLDER").unwrap_or_else(|| store_name.clone()),
        };

        Ok(Self {
            database_url,
            host,
            port,
            base_url,
            jwt_secret,
            admin_pin_hash,
            upload_dir,
            reservation_ttl,
            sweep_interval,
            cart_session_idle,
            default_quota,
            store_name,
            bank,
        })
    }

    /// Public URL for a file stored below `upload_dir`.
    pub fn upload_url(&self, relative: &str) -> String {
        format!("{}/uploads/{}", self.base_url, relative.trim_start_matches('/'))
    }
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> T
where
    F: Fn(&str) -> Option<String>,
    T: std::str::FromStr,
{
    lookup(key)
        .and_then(|v| v.trim().parse::<T>().ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn applies_defaults() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/test"),
            ("JWT_SECRET", "secret"),
            ("ADMIN_PIN_HASH", "$argon2id$stub"),
        ]))
        .unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.base_url, "http://127.0.0.1:3000");
        assert_eq!(config.reservation_ttl, Duration::from_secs(15 * 60));
        assert_eq!(config.default_quota, 10);
        assert_eq!(config.cart_session_idle, Duration::from_secs(24 * 3600));
        assert_eq!(
            config.upload_url("payment-proofs/a.png"),
            "http://127.0.0.1:3000/uploads/payment-proofs/a.png"
        );
    }

    #[test]
    fn missing_secret_is_an_error() {
        let result = AppConfig::from_lookup(lookup_from(&[("DATABASE_URL", "postgres://x")]));
        assert!(result.is_err());
    }

    #[test]
    fn bad_numbers_fall_back() {
        let config = AppConfig::from_lookup(lookup_from(&[
            ("DATABASE_URL", "postgres://localhost/test"),
            ("JWT_SECRET", "secret"),
            ("ADMIN_PIN_HASH", "hash"),
            ("APP_PORT", "not-a-port"),
            ("APP_BASE_URL", "https://shop.example.com/"),
            ("SWEEP_INTERVAL_SECS", "0"),
        ]))
        .unwrap();

        assert_eq!(config.port, 3000);
        assert_eq!(config.base_url, "https://shop.example.com");
        assert_eq!(config.sweep_interval, Duration::from_secs(1));
    }
}
