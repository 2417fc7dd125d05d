//! Value objects for the customer domain.

use serde::{Deserialize, Serialize};

use crate::error::{DomainError, Result};
use crate::result::ResultExt;

common::typed_id! {
    /// Unique identifier for a customer.
    CustomerId
}

/// Longest accepted email address.
pub const EMAIL_MAX_LENGTH: usize = 256;

/// A syntactically valid, normalized email address.
///
/// Input is trimmed and lowercased before it is checked.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress(String);

impl EmailAddress {
    pub fn create(raw: impl AsRef<str>) -> Result<Self> {
        let normalized = raw.as_ref().trim().to_lowercase();
        Ok(normalized)
            .ensure(
                |v| !v.is_empty(),
                || DomainError::validation("email", "Email is required"),
            )
            .ensure(
                |v| v.chars().count() <= EMAIL_MAX_LENGTH,
                || {
                    DomainError::validation(
                        "email",
                        format!("Email must be at most {EMAIL_MAX_LENGTH} characters"),
                    )
                },
            )
            .ensure(
                |v| is_well_formed(v),
                || DomainError::validation("email", "Email is not a valid address"),
            )
            .map(Self)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn domain(&self) -> &str {
        self.0.rsplit('@').next().unwrap_or_default()
    }
}

fn is_well_formed(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    let Some((local, domain)) = value.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.contains('@')
        && domain.contains('.')
        && !domain.starts_with('.')
        && !domain.ends_with('.')
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for EmailAddress {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self> {
        Self::create(s)
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self> {
        Self::create(value)
    }
}

impl From<EmailAddress> for String {
    fn from(email: EmailAddress) -> Self {
        email.0
    }
}

impl AsRef<str> for EmailAddress {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
