//! Audit metadata carried by every persisted entity.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Who created, last updated or deleted an entity, and when.
///
/// The deletion fields are only populated by stores that soft-delete; the
/// default stores delete rows outright.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditState {
    pub created_by: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_by: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub deleted: bool,
    pub deleted_by: Option<String>,
    pub deleted_at: Option<DateTime<Utc>>,
    pub deleted_reason: Option<String>,
}

impl AuditState {
    /// Records the creation of the entity.
    pub fn set_created(&mut self, by: impl Into<String>, at: DateTime<Utc>) {
        self.created_by = Some(by.into());
        self.created_at = Some(at);
    }

    /// Records an update of the entity.
    pub fn set_updated(&mut self, by: impl Into<String>, at: DateTime<Utc>) {
        self.updated_by = Some(by.into());
        self.updated_at = Some(at);
    }

    /// Marks the entity as deleted.
    pub fn set_deleted(
        &mut self,
        by: impl Into<String>,
        at: DateTime<Utc>,
        reason: Option<String>,
    ) {
        self.deleted = true;
        self.deleted_by = Some(by.into());
        self.deleted_at = Some(at);
        self.deleted_reason = reason;
    }

    /// Returns the most recent write timestamp, if any.
    pub fn last_modified(&self) -> Option<DateTime<Utc>> {
        self.updated_at.or(self.created_at)
    }
}
