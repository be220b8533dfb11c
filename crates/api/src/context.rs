use storekeep_auth::{Role, UserProfile};
use storekeep_core::UserId;

/// Authenticated identity for a request, loaded by the auth middleware.
///
/// The acting user doubles as the seller for checkout and inventory
/// routes: sellers only ever operate on their own stock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser {
    profile: UserProfile,
}

impl CurrentUser {
    pub fn new(profile: UserProfile) -> Self {
        Self { profile }
    }

    pub fn id(&self) -> UserId {
        self.profile.id
    }

    pub fn role(&self) -> Role {
        self.profile.role
    }

    pub fn profile(&self) -> &UserProfile {
        &self.profile
    }
}
