//! Environment-driven configuration with development defaults.

use storekeep_auth::DEFAULT_COST;

/// Resolved process configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: String,
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expire_hours: i64,
    pub bcrypt_cost: u32,
    /// Base URL embedded in password-reset links.
    pub frontend_url: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            tracing::warn!("JWT_SECRET not set; using insecure dev default");
            "dev-secret".to_string()
        });

        Self {
            bind_addr: env_or("BIND_ADDR", "0.0.0.0:8080"),
            database_url: env_or("DATABASE_URL", "postgres://localhost/storekeep"),
            jwt_secret,
            jwt_expire_hours: env_or("JWT_EXPIRE_HOURS", "168")
                .parse()
                .unwrap_or(168),
            bcrypt_cost: env_or("BCRYPT_COST", "")
                .parse()
                .unwrap_or(DEFAULT_COST),
            frontend_url: env_or("FRONTEND_URL", "http://localhost:5173"),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}
