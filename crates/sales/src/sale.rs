use serde::{Deserialize, Serialize};

use fantasy_core::{DomainError, DomainResult, Entity, EntityKind, InvoiceId, ProductId, SaleId};

/// An invoice line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    pub id: SaleId,
    pub product_id: ProductId,
    pub invoice_id: InvoiceId,
    pub quantity: i64,
}

/// Sale attributes before the store assigns an identifier.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewSale {
    pub product_id: ProductId,
    pub invoice_id: InvoiceId,
    pub quantity: i64,
}

impl NewSale {
    pub fn new(product_id: ProductId, invoice_id: InvoiceId, quantity: i64) -> Self {
        Self {
            product_id,
            invoice_id,
            quantity,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        if self.quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }
        Ok(())
    }
}

impl Entity for Sale {
    type Id = SaleId;
    type Draft = NewSale;

    const KIND: EntityKind = EntityKind::Sale;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn from_draft(id: Self::Id, draft: Self::Draft) -> Self {
        Self {
            id,
            product_id: draft.product_id,
            invoice_id: draft.invoice_id,
            quantity: draft.quantity,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_zero_quantity() {
        let draft = NewSale::new(ProductId::new(1), InvoiceId::new(1), 0);
        match draft.validate().unwrap_err() {
            DomainError::Validation(_) => {}
            _ => panic!("Expected Validation error for zero quantity"),
        }
    }

    #[test]
    fn from_draft_links_invoice_and_product() {
        let sale = Sale::from_draft(
            SaleId::new(4),
            NewSale::new(ProductId::new(58), InvoiceId::new(45), 22),
        );
        assert_eq!(sale.product_id, ProductId::new(58));
        assert_eq!(sale.invoice_id, InvoiceId::new(45));
        assert_eq!(sale.quantity, 22);
    }

    #[cfg(test)]
    mod proptest_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn positive_quantities_are_valid(q in 1i64..1_000_000) {
                prop_assert!(NewSale::new(ProductId::new(1), InvoiceId::new(1), q).validate().is_ok());
            }

            #[test]
            fn non_positive_quantities_are_rejected(q in -1_000i64..=0) {
                prop_assert!(NewSale::new(ProductId::new(1), InvoiceId::new(1), q).validate().is_err());
            }
        }
    }
}
