//! Single-use password reset tokens.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use storekeep_core::UserId;

/// How long a reset token stays redeemable, in hours.
pub const RESET_TOKEN_TTL_HOURS: i64 = 1;

/// A password reset grant. Redeemable once, within the expiry window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResetToken {
    pub token: Uuid,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
    pub used: bool,
}

impl ResetToken {
    /// Issue a fresh token for `user_id`, expiring [`RESET_TOKEN_TTL_HOURS`]
    /// from `now`.
    pub fn issue(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            token: Uuid::new_v4(),
            user_id,
            expires_at: now + Duration::hours(RESET_TOKEN_TTL_HOURS),
            used: false,
        }
    }

    /// A token is redeemable while unused and unexpired.
    pub fn is_redeemable(&self, now: DateTime<Utc>) -> bool {
        !self.used && now < self.expires_at
    }
}
