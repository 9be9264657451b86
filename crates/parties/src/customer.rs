use serde::{Deserialize, Serialize};

use fantasy_core::{CustomerId, DomainError, DomainResult, Entity, EntityKind};

/// A customer, as persisted by the store.
///
/// `condition` is a small integer category used as a reporting group key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Customer {
    pub id: CustomerId,
    pub first_name: String,
    pub last_name: String,
    pub condition: i32,
}

/// Customer attributes before the store assigns an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewCustomer {
    pub first_name: String,
    pub last_name: String,
    pub condition: i32,
}

impl NewCustomer {
    pub fn new(first_name: impl Into<String>, last_name: impl Into<String>, condition: i32) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            condition,
        }
    }

    /// Validation applied to single-record creation.
    ///
    /// Bulk import does not call this: imported records are mapped verbatim.
    pub fn validate(&self) -> DomainResult<()> {
        if self.first_name.trim().is_empty() {
            return Err(DomainError::validation("first_name cannot be empty"));
        }
        if self.last_name.trim().is_empty() {
            return Err(DomainError::validation("last_name cannot be empty"));
        }
        if self.condition < 0 {
            return Err(DomainError::validation("condition cannot be negative"));
        }
        Ok(())
    }
}

impl Entity for Customer {
    type Id = CustomerId;
    type Draft = NewCustomer;

    const KIND: EntityKind = EntityKind::Customer;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn from_draft(id: Self::Id, draft: Self::Draft) -> Self {
        Self {
            id,
            first_name: draft.first_name,
            last_name: draft.last_name,
            condition: draft.condition,
        }
    }
}
