use serde::{Deserialize, Serialize};

use fantasy_core::{DomainError, DomainResult, Entity, EntityKind, ProductId};

/// A catalog product with its unit price.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub description: String,
    pub price: f64,
}

/// Product attributes before the store assigns an identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewProduct {
    pub description: String,
    pub price: f64,
}

impl NewProduct {
    pub fn new(description: impl Into<String>, price: f64) -> Self {
        Self {
            description: description.into(),
            price,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.description.trim().is_empty() {
            return Err(DomainError::validation("description cannot be empty"));
        }
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(DomainError::validation("price must be a non-negative number"));
        }
        Ok(())
    }
}

impl Product {
    /// Line amount for `quantity` units at this product's price.
    pub fn line_amount(&self, quantity: i64) -> f64 {
        quantity as f64 * self.price
    }
}

impl Entity for Product {
    type Id = ProductId;
    type Draft = NewProduct;

    const KIND: EntityKind = EntityKind::Product;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn from_draft(id: Self::Id, draft: Self::Draft) -> Self {
        Self {
            id,
            description: draft.description,
            price: draft.price,
        }
    }
}
