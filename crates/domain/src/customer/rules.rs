//! Business rules that need the repository.

use repository::{CancellationToken, FindOptions, Repository, RepositoryError};

use crate::error::{DomainError, Result};

use super::{Customer, CustomerId, EMAIL_KEY, EmailAddress};

const RULE: &str = "EmailMustBeUnique";

/// No two customers may share an email address.
///
/// When checking an update, `exclude` names the customer being updated so
/// it does not collide with itself. The lookup goes through the store's
/// unique key index, and the store enforces the same key on write.
pub struct EmailMustBeUnique<'a, R: ?Sized> {
    repository: &'a R,
    email: &'a EmailAddress,
    exclude: Option<CustomerId>,
}

impl<'a, R> EmailMustBeUnique<'a, R>
where
    R: Repository<Customer> + ?Sized,
{
    pub const NAME: &'static str = RULE;

    pub fn new(repository: &'a R, email: &'a EmailAddress) -> Self {
        Self {
            repository,
            email,
            exclude: None,
        }
    }

    pub fn excluding(mut self, id: CustomerId) -> Self {
        self.exclude = Some(id);
        self
    }

    pub async fn check(&self, cancel: &CancellationToken) -> Result<()> {
        let exclude = self.exclude;
        let options = FindOptions::<Customer>::new()
            .unique_key(EMAIL_KEY, self.email.as_str())
            .filter(move |c: &Customer| Some(c.id()) != exclude)
            .take(1);

        let taken = !self.repository.find_all(options, cancel).await?.is_empty();
        if taken {
            return Err(violated(self.email));
        }
        Ok(())
    }
}

/// Translates a store-level email key collision on insert or update. It
/// means another writer claimed the address after the check passed.
pub(super) fn email_claimed_on_write(email: &EmailAddress, err: DomainError) -> DomainError {
    match err {
        DomainError::Repository(RepositoryError::UniqueViolation { key, .. })
            if key == EMAIL_KEY =>
        {
            violated(email)
        }
        other => other,
    }
}

fn violated(email: &EmailAddress) -> DomainError {
    DomainError::business_rule(RULE, format!("Email '{email}' is already in use"))
}
