//! Import record shapes, one per entity kind.
//!
//! Records mirror the source files field for field. The source `id` is kept only for
//! diagnostics: the store assigns its own identifiers on save.

use serde::Deserialize;
use serde::de::DeserializeOwned;

use fantasy_core::{CustomerId, Entity, InvoiceId, ProductId};
use fantasy_invoicing::{Invoice, NewInvoice};
use fantasy_parties::{Customer, NewCustomer};
use fantasy_products::{NewProduct, Product};
use fantasy_sales::{NewSale, Sale};

/// A record decoded from an import source that maps onto one entity draft.
pub trait SourceRecord: DeserializeOwned + Send + 'static {
    type Entity: Entity;

    /// Identifier carried by the source file, if any.
    fn source_id(&self) -> Option<i64>;

    fn into_draft(self) -> <Self::Entity as Entity>::Draft;
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CustomerRecord {
    #[serde(default)]
    pub id: Option<i64>,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub condition: i32,
}

impl SourceRecord for CustomerRecord {
    type Entity = Customer;

    fn source_id(&self) -> Option<i64> {
        self.id
    }

    fn into_draft(self) -> NewCustomer {
        NewCustomer {
            first_name: self.first_name,
            last_name: self.last_name,
            condition: self.condition,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InvoiceRecord {
    #[serde(default)]
    pub id: Option<i64>,
    pub datetime: String,
    pub customer_id: i64,
    #[serde(default)]
    pub total: f64,
}

impl SourceRecord for InvoiceRecord {
    type Entity = Invoice;

    fn source_id(&self) -> Option<i64> {
        self.id
    }

    fn into_draft(self) -> NewInvoice {
        NewInvoice {
            datetime: self.datetime,
            total: self.total,
            customer_id: CustomerId::new(self.customer_id),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ProductRecord {
    #[serde(default)]
    pub id: Option<i64>,
    pub description: String,
    #[serde(default)]
    pub price: f64,
}

impl SourceRecord for ProductRecord {
    type Entity = Product;

    fn source_id(&self) -> Option<i64> {
        self.id
    }

    fn into_draft(self) -> NewProduct {
        NewProduct {
            description: self.description,
            price: self.price,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SaleRecord {
    #[serde(default)]
    pub id: Option<i64>,
    pub product_id: i64,
    pub invoice_id: i64,
    pub quantity: i64,
}

impl SourceRecord for SaleRecord {
    type Entity = Sale;

    fn source_id(&self) -> Option<i64> {
        self.id
    }

    fn into_draft(self) -> NewSale {
        NewSale {
            product_id: ProductId::new(self.product_id),
            invoice_id: InvoiceId::new(self.invoice_id),
            quantity: self.quantity,
        }
    }
}
