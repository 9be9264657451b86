use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};

use fantasy_core::{CustomerId, DomainError, DomainResult, Entity, EntityKind, InvoiceId};

/// An invoice header.
///
/// `datetime` is kept as the string it was received as (`2022-05-15` or
/// `2022-05-15 00:00:00`); `total` is authoritative only after a recompute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub datetime: String,
    pub total: f64,
    pub customer_id: CustomerId,
}

/// Invoice attributes before the store assigns an identifier.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInvoice {
    pub datetime: String,
    pub total: f64,
    pub customer_id: CustomerId,
}

impl NewInvoice {
    pub fn new(datetime: impl Into<String>, total: f64, customer_id: CustomerId) -> Self {
        Self {
            datetime: datetime.into(),
            total,
            customer_id,
        }
    }

    pub fn validate(&self) -> DomainResult<()> {
        parse_invoice_datetime(&self.datetime)?;
        if !self.total.is_finite() || self.total < 0.0 {
            return Err(DomainError::validation("total must be a non-negative number"));
        }
        if self.customer_id.get() <= 0 {
            return Err(DomainError::validation("customer_id must be positive"));
        }
        Ok(())
    }
}

/// Parse an invoice timestamp, accepting a bare date or a date with time.
pub fn parse_invoice_datetime(s: &str) -> DomainResult<NaiveDateTime> {
    let s = s.trim();
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Ok(dt);
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt);
    }
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .map(|d| d.and_time(chrono::NaiveTime::MIN))
        .map_err(|_| DomainError::validation("datetime must be YYYY-MM-DD or YYYY-MM-DD HH:MM:SS"))
}

impl Entity for Invoice {
    type Id = InvoiceId;
    type Draft = NewInvoice;

    const KIND: EntityKind = EntityKind::Invoice;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn from_draft(id: Self::Id, draft: Self::Draft) -> Self {
        Self {
            id,
            datetime: draft.datetime,
            total: draft.total,
            customer_id: draft.customer_id,
        }
    }
}
