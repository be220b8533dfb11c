//! Infrastructure wiring: database connection, schema bootstrap, token
//! codec, and the knobs handlers need.

use anyhow::Context;
use chrono::{DateTime, Duration, Utc};

use storekeep_auth::{Claims, Hs256Jwt, TokenError, User};
use storekeep_store::PgStore;

use crate::config::AppConfig;

pub struct AppServices {
    pub store: PgStore,
    pub jwt: Hs256Jwt,
    pub bcrypt_cost: u32,
    pub token_ttl_hours: i64,
    pub frontend_url: String,
}

impl AppServices {
    /// Sign a session token for `user` valid from `now`.
    pub fn issue_token(&self, user: &User, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = Claims {
            sub: user.id,
            role: user.role,
            issued_at: now,
            expires_at: now + Duration::hours(self.token_ttl_hours),
        };
        self.jwt.issue(&claims)
    }
}

/// Connect to Postgres, apply the schema, and assemble the service bundle.
pub async fn build_services(config: &AppConfig) -> anyhow::Result<AppServices> {
    let store = PgStore::connect(&config.database_url)
        .await
        .context("failed to connect to database")?;
    store
        .init_schema()
        .await
        .context("failed to apply schema")?;

    Ok(AppServices {
        store,
        jwt: Hs256Jwt::new(config.jwt_secret.as_bytes()),
        bcrypt_cost: config.bcrypt_cost,
        token_ttl_hours: config.jwt_expire_hours,
        frontend_url: config.frontend_url.clone(),
    })
}
