//! SQLite-backed store implementation.
//!
//! Aggregates are pushed to SQL as grouped joins; the invoice total recompute runs in
//! one transaction so readers never see a half-applied update.
//!
//! ## Error Mapping
//!
//! | SQLx Error | StoreError |
//! |------------|------------|
//! | Database (foreign key violation) | `ReferentialViolation` |
//! | Database (check / not null violation) | `ConstraintViolation` |
//! | Database (other) | `Database` |
//! | PoolClosed / Io / other | `Database` |
//! | Column decode failure | `MalformedRow` |

use std::str::FromStr;

use async_trait::async_trait;
use sqlx::error::ErrorKind;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions, SqliteRow};
use sqlx::{FromRow, Row, SqlitePool};
use tracing::instrument;

use fantasy_core::{CustomerId, EntityKind, InvoiceId, ProductId, SaleId};
use fantasy_invoicing::{Invoice, NewInvoice};
use fantasy_parties::{Customer, NewCustomer};
use fantasy_products::{NewProduct, Product};
use fantasy_sales::{NewSale, Sale};

use super::r#trait::{ReportQueries, Repository, StoreError, StoreResult};
use crate::reporting::{ConditionTotal, TopCustomer, TopProduct};

const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS customers (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        first_name  TEXT    NOT NULL,
        last_name   TEXT    NOT NULL,
        "condition" INTEGER NOT NULL DEFAULT 0
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS products (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        description TEXT    NOT NULL,
        price       REAL    NOT NULL DEFAULT 0 CHECK (price >= 0)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS invoices (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        datetime    TEXT    NOT NULL,
        total       REAL    NOT NULL DEFAULT 0,
        customer_id INTEGER NOT NULL REFERENCES customers (id)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS sales (
        id          INTEGER PRIMARY KEY AUTOINCREMENT,
        product_id  INTEGER NOT NULL REFERENCES products (id),
        invoice_id  INTEGER NOT NULL REFERENCES invoices (id),
        quantity    INTEGER NOT NULL CHECK (quantity > 0)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS idx_invoices_customer_id ON invoices (customer_id)",
    "CREATE INDEX IF NOT EXISTS idx_sales_invoice_id ON sales (invoice_id)",
    "CREATE INDEX IF NOT EXISTS idx_sales_product_id ON sales (product_id)",
];

const RESET_INVOICE_TOTALS: &str = "UPDATE invoices SET total = 0.0";

const APPLY_INVOICE_TOTALS: &str = r#"
    UPDATE invoices
    SET total = agg.total
    FROM (
        SELECT s.invoice_id AS invoice_id, SUM(s.quantity * p.price) AS total
        FROM sales AS s
        INNER JOIN products AS p ON p.id = s.product_id
        GROUP BY s.invoice_id
    ) AS agg
    WHERE invoices.id = agg.invoice_id
"#;

const TOP_PRODUCTS: &str = r#"
    SELECT p.id AS id, p.description AS description, SUM(s.quantity) AS total
    FROM products AS p
    INNER JOIN sales AS s ON s.product_id = p.id
    GROUP BY p.id, p.description
    ORDER BY total DESC, p.id ASC
    LIMIT ?1
"#;

const TOTALS_BY_CONDITION: &str = r#"
    SELECT c."condition" AS "condition", SUM(i.total) AS total
    FROM customers AS c
    INNER JOIN invoices AS i ON i.customer_id = c.id
    GROUP BY c."condition"
    ORDER BY c."condition" ASC
"#;

const TOP_CUSTOMERS: &str = r#"
    SELECT c.id AS id, c.first_name AS first_name, c.last_name AS last_name,
           COALESCE(SUM(i.total), 0.0) AS amount
    FROM customers AS c
    LEFT JOIN invoices AS i ON i.customer_id = c.id
    GROUP BY c.id, c.first_name, c.last_name
    ORDER BY amount DESC, c.id ASC
    LIMIT ?1
"#;

/// SQLite-backed relational store.
///
/// ## Thread Safety
///
/// Uses the SQLx connection pool which is `Send + Sync`; the store can be shared
/// behind an `Arc`. In-memory databases are pinned to a single connection, because
/// every SQLite connection opens its own private `:memory:` database.
#[derive(Debug, Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Connect to `url` (e.g. `sqlite://fantasy.db` or `sqlite::memory:`) and create
    /// the tables if they are missing.
    pub async fn connect(url: &str) -> StoreResult<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .map_err(|e| map_sqlx_error("connect", EntityKind::Customer, e))?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .idle_timeout(None)
                .max_lifetime(None)
        } else {
            SqlitePoolOptions::new().max_connections(8)
        };

        let pool = pool_options
            .connect_with(options)
            .await
            .map_err(|e| map_sqlx_error("connect", EntityKind::Customer, e))?;

        Self::from_pool(pool).await
    }

    /// Wrap an existing pool, creating the tables if they are missing.
    pub async fn from_pool(pool: SqlitePool) -> StoreResult<Self> {
        let store = Self { pool };
        store.ensure_schema().await?;
        Ok(store)
    }

    async fn ensure_schema(&self) -> StoreResult<()> {
        for statement in SCHEMA {
            sqlx::query(statement)
                .execute(&self.pool)
                .await
                .map_err(|e| map_sqlx_error("ensure_schema", EntityKind::Customer, e))?;
        }
        Ok(())
    }
}

fn map_sqlx_error(operation: &'static str, entity: EntityKind, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) if db_err.is_foreign_key_violation() => {
            StoreError::referential(entity, format!("{} ({})", db_err.message(), operation))
        }
        sqlx::Error::Database(db_err)
            if matches!(db_err.kind(), ErrorKind::CheckViolation | ErrorKind::NotNullViolation) =>
        {
            StoreError::constraint(entity, format!("{} ({})", db_err.message(), operation))
        }
        sqlx::Error::ColumnDecode { index, source } => StoreError::MalformedRow {
            operation,
            message: format!("column {index}: {source}"),
        },
        other => StoreError::Database {
            operation,
            source: other,
        },
    }
}

// SQLx row types

struct CustomerRow(Customer);

impl<'r> FromRow<'r, SqliteRow> for CustomerRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(CustomerRow(Customer {
            id: CustomerId::new(row.try_get("id")?),
            first_name: row.try_get("first_name")?,
            last_name: row.try_get("last_name")?,
            condition: condition_from_row(row)?,
        }))
    }
}

struct ProductRow(Product);

impl<'r> FromRow<'r, SqliteRow> for ProductRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(ProductRow(Product {
            id: ProductId::new(row.try_get("id")?),
            description: row.try_get("description")?,
            price: row.try_get("price")?,
        }))
    }
}

struct InvoiceRow(Invoice);

impl<'r> FromRow<'r, SqliteRow> for InvoiceRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(InvoiceRow(Invoice {
            id: InvoiceId::new(row.try_get("id")?),
            datetime: row.try_get("datetime")?,
            total: row.try_get("total")?,
            customer_id: CustomerId::new(row.try_get("customer_id")?),
        }))
    }
}

struct SaleRow(Sale);

impl<'r> FromRow<'r, SqliteRow> for SaleRow {
    fn from_row(row: &'r SqliteRow) -> Result<Self, sqlx::Error> {
        Ok(SaleRow(Sale {
            id: SaleId::new(row.try_get("id")?),
            product_id: ProductId::new(row.try_get("product_id")?),
            invoice_id: InvoiceId::new(row.try_get("invoice_id")?),
            quantity: row.try_get("quantity")?,
        }))
    }
}

fn condition_from_row(row: &SqliteRow) -> Result<i32, sqlx::Error> {
    let raw: i64 = row.try_get("condition")?;
    i32::try_from(raw).map_err(|e| sqlx::Error::ColumnDecode {
        index: "condition".to_string(),
        source: Box::new(e),
    })
}

#[async_trait]
impl Repository<Customer> for SqliteStore {
    async fn find_all(&self) -> StoreResult<Vec<Customer>> {
        let rows = sqlx::query_as::<_, CustomerRow>(
            r#"SELECT id, first_name, last_name, "condition" FROM customers ORDER BY id ASC"#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_all_customers", EntityKind::Customer, e))?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    #[instrument(skip(self, draft), err)]
    async fn save(&self, draft: NewCustomer) -> StoreResult<Customer> {
        let result = sqlx::query(
            r#"INSERT INTO customers (first_name, last_name, "condition") VALUES (?1, ?2, ?3)"#,
        )
        .bind(&draft.first_name)
        .bind(&draft.last_name)
        .bind(draft.condition)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("save_customer", EntityKind::Customer, e))?;

        Ok(Customer::from_draft_row(result.last_insert_rowid(), draft))
    }
}

#[async_trait]
impl Repository<Product> for SqliteStore {
    async fn find_all(&self) -> StoreResult<Vec<Product>> {
        let rows = sqlx::query_as::<_, ProductRow>(
            "SELECT id, description, price FROM products ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_all_products", EntityKind::Product, e))?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    #[instrument(skip(self, draft), err)]
    async fn save(&self, draft: NewProduct) -> StoreResult<Product> {
        let result = sqlx::query("INSERT INTO products (description, price) VALUES (?1, ?2)")
            .bind(&draft.description)
            .bind(draft.price)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("save_product", EntityKind::Product, e))?;

        Ok(Product::from_draft_row(result.last_insert_rowid(), draft))
    }
}

#[async_trait]
impl Repository<Invoice> for SqliteStore {
    async fn find_all(&self) -> StoreResult<Vec<Invoice>> {
        let rows = sqlx::query_as::<_, InvoiceRow>(
            "SELECT id, datetime, total, customer_id FROM invoices ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_all_invoices", EntityKind::Invoice, e))?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    #[instrument(skip(self, draft), err)]
    async fn save(&self, draft: NewInvoice) -> StoreResult<Invoice> {
        let result = sqlx::query(
            "INSERT INTO invoices (datetime, total, customer_id) VALUES (?1, ?2, ?3)",
        )
        .bind(&draft.datetime)
        .bind(draft.total)
        .bind(draft.customer_id.get())
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("save_invoice", EntityKind::Invoice, e))?;

        Ok(Invoice::from_draft_row(result.last_insert_rowid(), draft))
    }
}

#[async_trait]
impl Repository<Sale> for SqliteStore {
    async fn find_all(&self) -> StoreResult<Vec<Sale>> {
        let rows = sqlx::query_as::<_, SaleRow>(
            "SELECT id, product_id, invoice_id, quantity FROM sales ORDER BY id ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("find_all_sales", EntityKind::Sale, e))?;
        Ok(rows.into_iter().map(|r| r.0).collect())
    }

    #[instrument(skip(self, draft), err)]
    async fn save(&self, draft: NewSale) -> StoreResult<Sale> {
        let result = sqlx::query(
            "INSERT INTO sales (product_id, invoice_id, quantity) VALUES (?1, ?2, ?3)",
        )
        .bind(draft.product_id.get())
        .bind(draft.invoice_id.get())
        .bind(draft.quantity)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("save_sale", EntityKind::Sale, e))?;

        Ok(Sale::from_draft_row(result.last_insert_rowid(), draft))
    }
}

#[async_trait]
impl ReportQueries for SqliteStore {
    #[instrument(skip(self), err)]
    async fn recompute_invoice_totals(&self) -> StoreResult<()> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("recompute_invoice_totals", EntityKind::Invoice, e))?;

        sqlx::query(RESET_INVOICE_TOTALS)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("recompute_invoice_totals", EntityKind::Invoice, e))?;
        let updated = sqlx::query(APPLY_INVOICE_TOTALS)
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("recompute_invoice_totals", EntityKind::Invoice, e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("recompute_invoice_totals", EntityKind::Invoice, e))?;

        tracing::debug!(invoices_with_sales = updated.rows_affected(), "invoice totals applied");
        Ok(())
    }

    async fn top_products(&self, limit: u32) -> StoreResult<Vec<TopProduct>> {
        let rows = sqlx::query(TOP_PRODUCTS)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("top_products", EntityKind::Product, e))?;

        rows.iter()
            .map(|row| -> Result<TopProduct, sqlx::Error> {
                Ok(TopProduct {
                    id: ProductId::new(row.try_get("id")?),
                    description: row.try_get("description")?,
                    total: row.try_get("total")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| map_sqlx_error("top_products", EntityKind::Product, e))
    }

    async fn invoice_totals_by_condition(&self) -> StoreResult<Vec<ConditionTotal>> {
        let rows = sqlx::query(TOTALS_BY_CONDITION)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("invoice_totals_by_condition", EntityKind::Invoice, e))?;

        rows.iter()
            .map(|row| -> Result<ConditionTotal, sqlx::Error> {
                Ok(ConditionTotal {
                    condition: condition_from_row(row)?,
                    total: row.try_get("total")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| map_sqlx_error("invoice_totals_by_condition", EntityKind::Invoice, e))
    }

    async fn top_customers(&self, limit: u32) -> StoreResult<Vec<TopCustomer>> {
        let rows = sqlx::query(TOP_CUSTOMERS)
            .bind(i64::from(limit))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("top_customers", EntityKind::Customer, e))?;

        rows.iter()
            .map(|row| -> Result<TopCustomer, sqlx::Error> {
                Ok(TopCustomer {
                    id: CustomerId::new(row.try_get("id")?),
                    first_name: row.try_get("first_name")?,
                    last_name: row.try_get("last_name")?,
                    amount: row.try_get("amount")?,
                })
            })
            .collect::<Result<Vec<_>, sqlx::Error>>()
            .map_err(|e| map_sqlx_error("top_customers", EntityKind::Customer, e))
    }
}

/// Build an entity from the rowid SQLite assigned on insert.
trait FromDraftRow: fantasy_core::Entity {
    fn from_draft_row(rowid: i64, draft: Self::Draft) -> Self;
}

impl<E> FromDraftRow for E
where
    E: fantasy_core::Entity,
    E::Id: From<i64>,
{
    fn from_draft_row(rowid: i64, draft: Self::Draft) -> Self {
        E::from_draft(E::Id::from(rowid), draft)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn memory_store() -> SqliteStore {
        SqliteStore::connect("sqlite::memory:").await.unwrap()
    }

    #[tokio::test]
    async fn save_assigns_rowids_and_find_all_reads_back() {
        let store = memory_store().await;
        let john: Customer = store.save(NewCustomer::new("John", "Doe", 1)).await.unwrap();
        let jane: Customer = store.save(NewCustomer::new("Jane", "Doe", 0)).await.unwrap();
        assert_eq!(john.id, CustomerId::new(1));
        assert_eq!(jane.id, CustomerId::new(2));

        let all: Vec<Customer> = store.find_all().await.unwrap();
        assert_eq!(all, vec![john, jane]);
    }

    #[tokio::test]
    async fn foreign_key_violation_maps_to_referential_error() {
        let store = memory_store().await;
        let _: Product = store.save(NewProduct::new("Tea", 1.5)).await.unwrap();

        let err = Repository::<Sale>::save(
            &store,
            NewSale::new(ProductId::new(1), InvoiceId::new(42), 3),
        )
        .await
        .unwrap_err();
        assert!(err.is_referential_violation(), "unexpected error: {err}");
    }

    #[tokio::test]
    async fn check_constraints_reject_negative_price_and_non_positive_quantity() {
        let store = memory_store().await;
        let err = Repository::<Product>::save(&store, NewProduct::new("p", -10.0))
            .await
            .unwrap_err();
        assert!(
            matches!(err, StoreError::ConstraintViolation { entity: EntityKind::Product, .. }),
            "unexpected error: {err}"
        );

        let _: Customer = store.save(NewCustomer::new("John", "Doe", 0)).await.unwrap();
        let _: Invoice = store
            .save(NewInvoice::new("2022-05-15", 0.0, CustomerId::new(1)))
            .await
            .unwrap();
        let _: Product = store.save(NewProduct::new("p", 10.0)).await.unwrap();
        for quantity in [0, -3] {
            let err = Repository::<Sale>::save(
                &store,
                NewSale::new(ProductId::new(1), InvoiceId::new(1), quantity),
            )
            .await
            .unwrap_err();
            assert!(err.is_constraint_violation(), "quantity {quantity}: {err}");
        }

        let products: Vec<Product> = store.find_all().await.unwrap();
        assert_eq!(products.len(), 1);
        assert!(store.top_products(5).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn grouped_queries_match_worked_example() {
        let store = memory_store().await;
        let _: Customer = store.save(NewCustomer::new("John", "Doe", 1)).await.unwrap();
        let _: Customer = store.save(NewCustomer::new("Jane", "Doe", 0)).await.unwrap();
        let _: Invoice = store
            .save(NewInvoice::new("2022-05-15", 0.0, CustomerId::new(1)))
            .await
            .unwrap();
        let _: Invoice = store
            .save(NewInvoice::new("2022-05-15", 0.0, CustomerId::new(2)))
            .await
            .unwrap();
        let _: Invoice = store
            .save(NewInvoice::new("2022-05-16", 13.0, CustomerId::new(2)))
            .await
            .unwrap();
        let _: Product = store.save(NewProduct::new("P1", 10.0)).await.unwrap();
        let _: Product = store.save(NewProduct::new("P2", 5.0)).await.unwrap();
        for (product, invoice, qty) in [(1, 1, 10), (2, 1, 10), (1, 2, 20)] {
            let _: Sale = store
                .save(NewSale::new(ProductId::new(product), InvoiceId::new(invoice), qty))
                .await
                .unwrap();
        }

        store.recompute_invoice_totals().await.unwrap();
        store.recompute_invoice_totals().await.unwrap();

        let invoices: Vec<Invoice> = store.find_all().await.unwrap();
        let totals: Vec<f64> = invoices.iter().map(|i| i.total).collect();
        assert_eq!(totals, vec![150.0, 200.0, 0.0]);

        let top = store.top_products(5).await.unwrap();
        assert_eq!(top.len(), 2);
        assert_eq!(top[0].id, ProductId::new(1));
        assert_eq!(top[0].total, 30);
        assert_eq!(top[1].total, 10);

        let groups = store.invoice_totals_by_condition().await.unwrap();
        assert_eq!(
            groups,
            vec![
                ConditionTotal { condition: 0, total: 200.0 },
                ConditionTotal { condition: 1, total: 150.0 },
            ]
        );

        let customers = store.top_customers(5).await.unwrap();
        assert_eq!(customers[0].id, CustomerId::new(2));
        assert_eq!(customers[0].amount, 200.0);
        assert_eq!(customers[1].amount, 150.0);
    }

    #[tokio::test]
    async fn top_customers_left_joins_customers_without_invoices() {
        let store = memory_store().await;
        let _: Customer = store.save(NewCustomer::new("Idle", "Doe", 0)).await.unwrap();

        let top = store.top_customers(5).await.unwrap();
        assert_eq!(top.len(), 1);
        assert_eq!(top[0].amount, 0.0);
        assert!(store.top_products(5).await.unwrap().is_empty());
        assert!(store.invoice_totals_by_condition().await.unwrap().is_empty());
    }
}
