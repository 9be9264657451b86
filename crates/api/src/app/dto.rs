use serde::Deserialize;
use serde_json::json;

use fantasy_core::{CustomerId, InvoiceId, ProductId};
use fantasy_infra::reporting::{ConditionTotal, DEFAULT_TOP_LIMIT, TopCustomer, TopProduct};
use fantasy_invoicing::{Invoice, NewInvoice};
use fantasy_parties::{Customer, NewCustomer};
use fantasy_products::{NewProduct, Product};
use fantasy_sales::{NewSale, Sale};

use crate::app::errors;

/// Largest `limit` accepted by the ranked reports.
pub const MAX_TOP_LIMIT: u32 = 100;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct CreateCustomerRequest {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub condition: i32,
}

impl From<CreateCustomerRequest> for NewCustomer {
    fn from(body: CreateCustomerRequest) -> Self {
        NewCustomer::new(body.first_name, body.last_name, body.condition)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateProductRequest {
    pub description: String,
    pub price: f64,
}

impl From<CreateProductRequest> for NewProduct {
    fn from(body: CreateProductRequest) -> Self {
        NewProduct::new(body.description, body.price)
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateInvoiceRequest {
    pub datetime: String,
    #[serde(default)]
    pub total: f64,
    pub customer_id: i64,
}

impl From<CreateInvoiceRequest> for NewInvoice {
    fn from(body: CreateInvoiceRequest) -> Self {
        NewInvoice::new(body.datetime, body.total, CustomerId::new(body.customer_id))
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSaleRequest {
    pub product_id: i64,
    pub invoice_id: i64,
    pub quantity: i64,
}

impl From<CreateSaleRequest> for NewSale {
    fn from(body: CreateSaleRequest) -> Self {
        NewSale::new(
            ProductId::new(body.product_id),
            InvoiceId::new(body.invoice_id),
            body.quantity,
        )
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct TopQuery {
    pub limit: Option<u32>,
}

impl TopQuery {
    /// Resolve the requested limit, defaulting to 5 and rejecting values outside 1..=100.
    pub fn limit(&self) -> Result<u32, axum::response::Response> {
        let limit = self.limit.unwrap_or(DEFAULT_TOP_LIMIT);
        if (1..=MAX_TOP_LIMIT).contains(&limit) {
            Ok(limit)
        } else {
            Err(errors::json_error(
                axum::http::StatusCode::BAD_REQUEST,
                "invalid_limit",
                format!("limit must be between 1 and {MAX_TOP_LIMIT}"),
            ))
        }
    }
}

// -------------------------
// Response mapping
// -------------------------

/// Round a money amount to cents for presentation.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn customer_to_json(c: &Customer) -> serde_json::Value {
    json!({
        "id": c.id,
        "first_name": c.first_name,
        "last_name": c.last_name,
        "condition": c.condition,
    })
}

pub fn product_to_json(p: &Product) -> serde_json::Value {
    json!({
        "id": p.id,
        "description": p.description,
        "price": p.price,
    })
}

pub fn invoice_to_json(i: &Invoice) -> serde_json::Value {
    json!({
        "id": i.id,
        "datetime": i.datetime,
        "customer_id": i.customer_id,
        "total": i.total,
    })
}

pub fn sale_to_json(s: &Sale) -> serde_json::Value {
    json!({
        "id": s.id,
        "product_id": s.product_id,
        "invoice_id": s.invoice_id,
        "quantity": s.quantity,
    })
}

pub fn top_product_to_json(p: &TopProduct) -> serde_json::Value {
    json!({
        "id": p.id,
        "description": p.description,
        "total": p.total,
    })
}

pub fn condition_total_to_json(t: &ConditionTotal) -> serde_json::Value {
    json!({
        "condition": t.condition,
        "total": round2(t.total),
    })
}

pub fn top_customer_to_json(c: &TopCustomer) -> serde_json::Value {
    json!({
        "id": c.id,
        "first_name": c.first_name,
        "last_name": c.last_name,
        "amount": round2(c.amount),
    })
}
