use serde::{Deserialize, Serialize};

use storekeep_core::{DomainError, DomainResult, UserId};

use crate::roles::Role;

/// Persisted user account, including the password hash.
///
/// Never serialize this to a client; use [`UserProfile`] instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

impl User {
    /// Client-safe projection (no credential material).
    pub fn profile(&self) -> UserProfile {
        UserProfile {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
            role: self.role,
        }
    }
}

/// Public view of a user account.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
}

/// Input for creating an account. The e-mail is normalized on construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

impl NewUser {
    pub fn new(
        name: &str,
        email: &str,
        password_hash: String,
        role: Role,
    ) -> DomainResult<Self> {
        let name = name.trim();
        if name.is_empty() {
            return Err(DomainError::validation("name must not be empty"));
        }
        let email = normalize_email(email);
        if !email.contains('@') {
            return Err(DomainError::validation("e-mail must contain '@'"));
        }
        Ok(Self {
            name: name.to_string(),
            email,
            password_hash,
            role,
        })
    }
}

/// Lowercased, trimmed e-mail used as the account lookup key.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_user_normalizes_email_and_trims_name() {
        let user = NewUser::new("  Ada ", " Ada@Example.COM ", "hash".into(), Role::Seller)
            .unwrap();
        assert_eq!(user.name, "Ada");
        assert_eq!(user.email, "ada@example.com");
    }

    #[test]
    fn empty_name_is_rejected() {
        let err = NewUser::new("  ", "a@b.c", "hash".into(), Role::Seller).unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
    }

    #[test]
    fn mail_without_at_sign_is_rejected() {
        assert!(NewUser::new("Ada", "nonsense", "hash".into(), Role::Seller).is_err());
    }
}
