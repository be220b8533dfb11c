use serde::{Deserialize, Serialize};

use storekeep_core::{CustomerId, DomainError, DomainResult};

/// Customer record.
///
/// Referenced by orders but never mutated by checkout; contact fields are
/// optional because bulk uploads routinely omit them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    /// External identifier carried through from source systems, if any.
    pub unique_id: Option<String>,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub zip_code: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

/// Input for creating a customer (store assigns the id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub unique_id: Option<String>,
    pub name: String,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub zip_code: Option<String>,
    pub city: Option<String>,
    pub state: Option<String>,
}

impl NewCustomer {
    /// Minimal record: a name and nothing else.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            unique_id: None,
            name: name.into(),
            phone: None,
            email: None,
            zip_code: None,
            city: None,
            state: None,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.name.trim().is_empty() {
            return Err(DomainError::validation("customer name must not be empty"));
        }
        Ok(())
    }

    /// Key used to spot duplicate rows within one bulk upload.
    pub fn dedup_key(&self) -> (String, String) {
        (
            self.email.as_deref().unwrap_or("").to_lowercase(),
            self.phone.as_deref().unwrap_or("").to_string(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_name_is_rejected() {
        let mut customer = NewCustomer::named("  ");
        assert!(customer.validate().is_err());
        customer.name = "Grace".into();
        assert!(customer.validate().is_ok());
    }

    #[test]
    fn dedup_key_is_case_insensitive_on_email() {
        let mut a = NewCustomer::named("A");
        a.email = Some("A@Example.com".into());
        let mut b = NewCustomer::named("B");
        b.email = Some("a@example.com".into());
        assert_eq!(a.dedup_key(), b.dedup_key());
    }

    #[test]
    fn contactless_rows_share_a_dedup_key() {
        assert_eq!(
            NewCustomer::named("A").dedup_key(),
            NewCustomer::named("B").dedup_key()
        );
    }
}
