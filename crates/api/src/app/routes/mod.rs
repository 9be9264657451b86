use axum::Router;

pub mod customers;
pub mod invoices;
pub mod products;
pub mod sales;
pub mod system;

/// Router for all record and report endpoints.
pub fn router() -> Router {
    Router::new()
        .nest("/customers", customers::router())
        .nest("/products", products::router())
        .nest("/invoices", invoices::router())
        .nest("/sales", sales::router())
}
