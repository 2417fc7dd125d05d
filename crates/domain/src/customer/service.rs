//! Customer command and query handlers.

use repository::{CancellationToken, Entity, Repository, SharedRepository};
use tracing::{debug, instrument};

use crate::error::{DomainError, Result};
use crate::policy::Policy;
use crate::result::ResultExt;
use crate::validation::Validate;

use super::rules::email_claimed_on_write;
use super::{
    CreateCustomer, Customer, CustomerId, CustomerModel, DeleteCustomer, EmailMustBeUnique,
    FindAllCustomers, FindCustomer, UpdateCustomer,
};

/// Service for handling customer commands and queries.
///
/// Every request is validated before its handler runs, and every handler,
/// query handlers included, runs under the configured [`Policy`].
pub struct CustomerService<R = SharedRepository<Customer>> {
    repository: R,
    policy: Policy,
}

impl<R> CustomerService<R>
where
    R: Repository<Customer>,
{
    /// Creates a new customer service with the default policy.
    pub fn new(repository: R) -> Self {
        Self {
            repository,
            policy: Policy::default(),
        }
    }

    pub fn with_policy(mut self, policy: Policy) -> Self {
        self.policy = policy;
        self
    }

    pub fn repository(&self) -> &R {
        &self.repository
    }

    pub fn policy(&self) -> Policy {
        self.policy
    }

    #[instrument(skip(self, cancel))]
    pub async fn create(
        &self,
        cmd: CreateCustomer,
        cancel: &CancellationToken,
    ) -> Result<CustomerModel> {
        let cmd = &cmd;
        let result = match cmd.validate() {
            Ok(()) => {
                self.policy
                    .run("create_customer", || self.handle_create(cmd, cancel))
                    .await
            }
            Err(err) => Err(err),
        };
        record("create", result)
    }

    #[instrument(skip(self, cancel))]
    pub async fn update(
        &self,
        cmd: UpdateCustomer,
        cancel: &CancellationToken,
    ) -> Result<CustomerModel> {
        let cmd = &cmd;
        let result = match cmd.validate() {
            Ok(()) => {
                self.policy
                    .run("update_customer", || self.handle_update(cmd, cancel))
                    .await
            }
            Err(err) => Err(err),
        };
        record("update", result)
    }

    #[instrument(skip(self, cancel))]
    pub async fn delete(&self, cmd: DeleteCustomer, cancel: &CancellationToken) -> Result<()> {
        let cmd = &cmd;
        let result = match cmd.validate() {
            Ok(()) => {
                self.policy
                    .run("delete_customer", || self.handle_delete(cmd, cancel))
                    .await
            }
            Err(err) => Err(err),
        };
        record("delete", result)
    }

    #[instrument(skip(self, cancel))]
    pub async fn find_one(
        &self,
        query: FindCustomer,
        cancel: &CancellationToken,
    ) -> Result<CustomerModel> {
        let query = &query;
        let result = match query.validate() {
            Ok(()) => {
                self.policy
                    .run("find_customer", || self.handle_find_one(query, cancel))
                    .await
            }
            Err(err) => Err(err),
        };
        record("find_one", result)
    }

    #[instrument(skip(self, cancel))]
    pub async fn find_all(
        &self,
        query: FindAllCustomers,
        cancel: &CancellationToken,
    ) -> Result<Vec<CustomerModel>> {
        let query = &query;
        let result = match query.validate() {
            Ok(()) => {
                self.policy
                    .run("find_all_customers", || self.handle_find_all(query, cancel))
                    .await
            }
            Err(err) => Err(err),
        };
        record("find_all", result)
    }

    async fn handle_create(
        &self,
        cmd: &CreateCustomer,
        cancel: &CancellationToken,
    ) -> Result<CustomerModel> {
        let model = &cmd.model;
        let mut customer = Customer::create(&model.first_name, &model.last_name, &model.email)?;
        if let Some(status) = model.parsed_status()? {
            customer.change_status(status);
        }

        EmailMustBeUnique::new(&self.repository, customer.email())
            .check(cancel)
            .await?;

        let email = customer.email().clone();
        let stored = self
            .repository
            .insert(customer, cancel)
            .await
            .map_err(|err| email_claimed_on_write(&email, err.into()))?;
        debug!(customer_id = %stored.id(), "Customer created");
        Ok(CustomerModel::from(&stored))
    }

    /// Load, validate, mutate, stamp the caller's token, persist, map.
    async fn handle_update(
        &self,
        cmd: &UpdateCustomer,
        cancel: &CancellationToken,
    ) -> Result<CustomerModel> {
        let model = &cmd.model;
        let id = parse_id(&cmd.id)?;
        let token = model.parsed_concurrency_version()?.ok_or_else(|| {
            DomainError::validation("concurrency_version", "Concurrency version is required")
        })?;
        let status = model.parsed_status()?;

        let mut customer = self.load(id, cancel).await?;

        let email = super::EmailAddress::create(&model.email)?;
        EmailMustBeUnique::new(&self.repository, &email)
            .excluding(id)
            .check(cancel)
            .await?;

        customer
            .change_name(&model.first_name, &model.last_name)?
            .change_email(email.as_str())?;
        if let Some(status) = status {
            customer.change_status(status);
        }

        customer.set_concurrency_token(token);

        let stored = self
            .repository
            .update(customer, cancel)
            .await
            .map_err(|err| email_claimed_on_write(&email, err.into()))?;
        debug!(customer_id = %stored.id(), "Customer updated");
        Ok(CustomerModel::from(&stored))
    }

    async fn handle_delete(&self, cmd: &DeleteCustomer, cancel: &CancellationToken) -> Result<()> {
        let id = parse_id(&cmd.id)?;
        let mut customer = self.load(id, cancel).await?;
        customer.delete();
        self.repository.delete(customer, cancel).await?;
        debug!(customer_id = %id, "Customer deleted");
        Ok(())
    }

    async fn handle_find_one(
        &self,
        query: &FindCustomer,
        cancel: &CancellationToken,
    ) -> Result<CustomerModel> {
        let id = parse_id(&query.id)?;
        self.load(id, cancel).await.map(CustomerModel::from)
    }

    async fn handle_find_all(
        &self,
        query: &FindAllCustomers,
        cancel: &CancellationToken,
    ) -> Result<Vec<CustomerModel>> {
        let customers = self
            .repository
            .find_all(query.to_options(), cancel)
            .await?;
        Ok(customers.iter().map(CustomerModel::from).collect())
    }

    async fn load(&self, id: CustomerId, cancel: &CancellationToken) -> Result<Customer> {
        self.repository
            .find_one(id, cancel)
            .await?
            .ok_or_else(|| DomainError::NotFound {
                entity: Customer::entity_type(),
                id: id.to_string(),
            })
    }
}

fn parse_id(raw: &str) -> Result<CustomerId> {
    raw.parse()
        .map_err(|_| DomainError::validation("id", "Id must be a valid GUID"))
}

fn record<T>(command: &'static str, result: Result<T>) -> Result<T> {
    let outcome = match &result {
        Ok(_) => "ok",
        Err(err) => err.category().as_str(),
    };
    metrics::counter!("customer_commands_total", "command" => command, "outcome" => outcome)
        .increment(1);
    result.tap_err(|err| debug!(command, error = %err, "Customer command failed"))
}
