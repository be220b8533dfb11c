//! User accounts and password-reset grants.

use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::Row;
use tracing::instrument;
use uuid::Uuid;

use storekeep_auth::{NewUser, ResetToken, User};
use storekeep_checkout::StoreError;
use storekeep_core::UserId;

use super::{map_sqlx_error, PgStore};

fn user_from_row(row: &PgRow) -> Result<User, StoreError> {
    let role: String = row
        .try_get("role")
        .map_err(|e| map_sqlx_error("user_from_row", e))?;
    Ok(User {
        id: UserId::new(
            row.try_get("id")
                .map_err(|e| map_sqlx_error("user_from_row", e))?,
        ),
        name: row
            .try_get("name")
            .map_err(|e| map_sqlx_error("user_from_row", e))?,
        email: row
            .try_get("email")
            .map_err(|e| map_sqlx_error("user_from_row", e))?,
        password_hash: row
            .try_get("password_hash")
            .map_err(|e| map_sqlx_error("user_from_row", e))?,
        role: role
            .parse()
            .map_err(|_| StoreError::Integrity(format!("unknown role in users table: {role}")))?,
    })
}

impl PgStore {
    /// Insert an account. A duplicate e-mail surfaces as
    /// [`StoreError::Constraint`] via the unique index.
    #[instrument(skip(self, new), fields(email = %new.email), err)]
    pub async fn create_user(&self, new: &NewUser) -> Result<User, StoreError> {
        let row = sqlx::query(
            r#"
            INSERT INTO users (name, email, password_hash, role)
            VALUES ($1, $2, $3, $4)
            RETURNING id, name, email, password_hash, role
            "#,
        )
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.role.as_str())
        .fetch_one(self.pool())
        .await
        .map_err(|e| map_sqlx_error("create_user", e))?;
        user_from_row(&row)
    }

    pub async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, email, password_hash, role FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("find_user_by_email", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    pub async fn find_user(&self, id: UserId) -> Result<Option<User>, StoreError> {
        let row = sqlx::query(
            "SELECT id, name, email, password_hash, role FROM users WHERE id = $1",
        )
        .bind(id.as_i64())
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("find_user", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self, password_hash), err)]
    pub async fn update_password(
        &self,
        id: UserId,
        password_hash: &str,
    ) -> Result<(), StoreError> {
        sqlx::query("UPDATE users SET password_hash = $2 WHERE id = $1")
            .bind(id.as_i64())
            .bind(password_hash)
            .execute(self.pool())
            .await
            .map_err(|e| map_sqlx_error("update_password", e))?;
        Ok(())
    }

    pub async fn create_reset_token(&self, token: &ResetToken) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            INSERT INTO password_reset_tokens (token, user_id, expires_at, used)
            VALUES ($1, $2, $3, $4)
            "#,
        )
        .bind(token.token)
        .bind(token.user_id.as_i64())
        .bind(token.expires_at)
        .bind(token.used)
        .execute(self.pool())
        .await
        .map_err(|e| map_sqlx_error("create_reset_token", e))?;
        Ok(())
    }

    /// Atomically redeem a token: marks it used and returns it, or returns
    /// `None` when it is unknown, expired, or already spent.
    #[instrument(skip(self, token), err)]
    pub async fn redeem_reset_token(
        &self,
        token: Uuid,
        now: DateTime<Utc>,
    ) -> Result<Option<ResetToken>, StoreError> {
        let row = sqlx::query(
            r#"
            UPDATE password_reset_tokens
            SET used = TRUE
            WHERE token = $1 AND used = FALSE AND expires_at > $2
            RETURNING token, user_id, expires_at
            "#,
        )
        .bind(token)
        .bind(now)
        .fetch_optional(self.pool())
        .await
        .map_err(|e| map_sqlx_error("redeem_reset_token", e))?;

        match row {
            Some(row) => Ok(Some(ResetToken {
                token: row
                    .try_get("token")
                    .map_err(|e| map_sqlx_error("redeem_reset_token", e))?,
                user_id: UserId::new(
                    row.try_get("user_id")
                        .map_err(|e| map_sqlx_error("redeem_reset_token", e))?,
                ),
                expires_at: row
                    .try_get("expires_at")
                    .map_err(|e| map_sqlx_error("redeem_reset_token", e))?,
                used: true,
            })),
            None => Ok(None),
        }
    }
}
