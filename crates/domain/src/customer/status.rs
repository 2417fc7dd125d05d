//! Customer lifecycle status.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::{Deserialize, Serialize};

use crate::enumeration::Enumeration;

/// Where a customer is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CustomerStatus {
    #[default]
    Lead,
    Active,
    Retired,
}

const ALL: [CustomerStatus; 3] = [
    CustomerStatus::Lead,
    CustomerStatus::Active,
    CustomerStatus::Retired,
];

static BY_ID: LazyLock<HashMap<i32, CustomerStatus>> =
    LazyLock::new(|| ALL.iter().map(|s| (s.id(), *s)).collect());

static BY_NAME: LazyLock<HashMap<&'static str, CustomerStatus>> =
    LazyLock::new(|| ALL.iter().map(|s| (s.name(), *s)).collect());

impl CustomerStatus {
    /// Whether the status is offered to clients. Every status currently is.
    pub fn enabled(&self) -> bool {
        match self {
            CustomerStatus::Lead | CustomerStatus::Active | CustomerStatus::Retired => true,
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            CustomerStatus::Lead => "Prospective customer, not yet active",
            CustomerStatus::Active => "Active customer",
            CustomerStatus::Retired => "Former customer",
        }
    }
}

impl Enumeration for CustomerStatus {
    fn all() -> &'static [Self] {
        &ALL
    }

    fn id(&self) -> i32 {
        match self {
            CustomerStatus::Lead => 1,
            CustomerStatus::Active => 2,
            CustomerStatus::Retired => 3,
        }
    }

    fn name(&self) -> &'static str {
        match self {
            CustomerStatus::Lead => "Lead",
            CustomerStatus::Active => "Active",
            CustomerStatus::Retired => "Retired",
        }
    }

    fn from_id(id: i32) -> Option<Self> {
        BY_ID.get(&id).copied()
    }

    fn from_name(name: &str) -> Option<Self> {
        BY_NAME.get(name).copied()
    }
}

impl std::fmt::Display for CustomerStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
