//! # Domain Types
//!
//! The records Khata keeps on the device.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │    Product      │   │    Customer     │   │    Invoice      │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │   │  id (UUID)      │   │  id (UUID)      │       │
//! │  │  sku            │   │  name           │   │  number         │       │
//! │  │  price_paise    │   │  phone          │   │  customer_id ───┼──► Customer
//! │  │  cost_paise     │   │  address        │   │  status         │       │
//! │  │  stock_qty      │   └─────────────────┘   │  items[] ───────┼──► InvoiceItem
//! │  └─────────────────┘                         └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Records serialize with camelCase keys; that JSON is both the stored
//! document body and what the UI collaborator receives.
//!
//! `customer_id` and `product_id` are advisory references. Nothing checks
//! that they resolve.

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;
use crate::validation::{
    validate_amount_paise, validate_product_name, validate_quantity, validate_sku,
    validate_stock_qty, ValidationResult,
};

// =============================================================================
// Product
// =============================================================================

/// A product on the shop's shelf.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Product {
    /// Unique identifier (UUID v4).
    pub id: String,

    /// Display name, copied onto invoice lines.
    pub name: String,

    /// Stock Keeping Unit. Expected unique, not enforced.
    pub sku: String,

    /// Selling price in paise.
    pub price_paise: i64,

    /// Purchase cost in paise.
    pub cost_paise: i64,

    /// Units on hand.
    pub stock_qty: i64,

    #[serde(default)]
    pub image_url: Option<String>,
}

impl Product {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_paise(self.price_paise)
    }

    #[inline]
    pub fn cost(&self) -> Money {
        Money::from_paise(self.cost_paise)
    }

    /// Profit per unit at the current price.
    pub fn margin(&self) -> Money {
        self.price() - self.cost()
    }

    pub fn is_low_stock(&self, threshold: i64) -> bool {
        self.stock_qty < threshold
    }

    /// Returns a copy with stock moved by `delta`, never below zero.
    ///
    /// This is the computation half of the stock-adjustment flow; the caller
    /// then submits the whole record through the product repository.
    pub fn adjust_stock(&self, delta: i64) -> Product {
        Product {
            stock_qty: self.stock_qty.saturating_add(delta).max(0),
            ..self.clone()
        }
    }

    /// Checks the field rules a stored product must satisfy.
    pub fn validate(&self) -> ValidationResult<()> {
        validate_product_name(&self.name)?;
        validate_sku(&self.sku)?;
        validate_amount_paise("price", self.price_paise)?;
        validate_amount_paise("cost", self.cost_paise)?;
        validate_stock_qty(self.stock_qty)
    }
}

/// Fields for a product that has not been stored yet.
///
/// `id` is normally left empty; the repository generates one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewProduct {
    #[serde(default)]
    pub id: Option<String>,
    pub name: String,
    pub sku: String,
    pub price_paise: i64,
    pub cost_paise: i64,
    pub stock_qty: i64,
    #[serde(default)]
    pub image_url: Option<String>,
}

impl NewProduct {
    /// Builds the stored record under the given identifier.
    pub fn into_product(self, id: String) -> Product {
        Product {
            id,
            name: self.name,
            sku: self.sku,
            price_paise: self.price_paise,
            cost_paise: self.cost_paise,
            stock_qty: self.stock_qty,
            image_url: self.image_url,
        }
    }
}

// =============================================================================
// Customer
// =============================================================================

/// A customer in the shop's ledger.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Customer {
    pub id: String,
    pub name: String,
    /// Free text here; the UI checks it with `validation::validate_phone`.
    pub phone: String,
    pub address: String,
}

impl Customer {
    /// A record with every field empty. Base for merges onto unknown ids.
    pub fn empty(id: impl Into<String>) -> Self {
        Customer {
            id: id.into(),
            name: String::new(),
            phone: String::new(),
            address: String::new(),
        }
    }
}

/// A partial customer update.
///
/// ## Merge Rules
/// ```text
/// patch field  Some(v)  →  v wins
/// patch field  None     →  existing value kept
/// patch id     None     →  a new customer is created
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CustomerPatch {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
}

impl CustomerPatch {
    /// Merges this patch onto `base`. The base identifier is kept.
    pub fn apply(&self, base: Customer) -> Customer {
        Customer {
            id: base.id,
            name: self.name.clone().unwrap_or(base.name),
            phone: self.phone.clone().unwrap_or(base.phone),
            address: self.address.clone().unwrap_or(base.address),
        }
    }
}

// =============================================================================
// Invoice Status
// =============================================================================

/// Where an invoice stands with respect to payment.
///
/// Saved invoices keep the status they were saved with; nothing in the core
/// moves an invoice between states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export)]
pub enum InvoiceStatus {
    Draft,
    #[default]
    Unpaid,
    Paid,
    Overdue,
    Cancelled,
}

impl InvoiceStatus {
    /// Unpaid and overdue invoices count towards receivables.
    pub const fn is_pending(&self) -> bool {
        matches!(self, InvoiceStatus::Unpaid | InvoiceStatus::Overdue)
    }
}

// =============================================================================
// Invoice Item
// =============================================================================

/// A line on an invoice.
///
/// `name` and `price_paise` are snapshots taken when the product was added;
/// later edits to the product do not reach saved invoices.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoiceItem {
    pub id: String,
    pub product_id: String,
    pub name: String,
    pub quantity: i64,
    /// Unit price in paise.
    pub price_paise: i64,
    /// `quantity × price_paise`.
    pub total_paise: i64,
}

impl InvoiceItem {
    /// The total this line must carry for its quantity and price, or `None`
    /// when that product does not fit in an `i64`.
    pub fn expected_total(&self) -> Option<Money> {
        line_total(self.quantity, self.price_paise)
    }
}

/// Line total for a quantity and unit price, floored at zero.
///
/// ```rust
/// use khata_core::types::line_total;
///
/// assert_eq!(line_total(2, 89_999).map(|m| m.paise()), Some(179_998));
/// assert_eq!(line_total(-1, 500).map(|m| m.paise()), Some(0));
/// assert_eq!(line_total(i64::MAX, 2), None);
/// ```
pub fn line_total(quantity: i64, price_paise: i64) -> Option<Money> {
    let total = Money::from_paise(price_paise).checked_mul_quantity(quantity)?;
    Some(if total.is_negative() { Money::zero() } else { total })
}

// =============================================================================
// Invoice
// =============================================================================

/// A saved GST invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Invoice {
    pub id: String,
    /// Human-readable number, e.g. `INV-20261015-0003`.
    #[serde(default)]
    pub number: Option<String>,
    pub customer_id: String,
    /// Timestamp string: RFC 3339, `YYYY-MM-DDTHH:MM:SS` or `YYYY-MM-DD`.
    pub date: String,
    pub status: InvoiceStatus,
    pub subtotal_paise: i64,
    pub tax_paise: i64,
    pub total_paise: i64,
    pub items: Vec<InvoiceItem>,
}

impl Invoice {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_paise(self.total_paise)
    }

    /// The instant the invoice is dated at, seen from `zone`. `None` when
    /// `date` is not a timestamp.
    pub fn timestamp<Tz: TimeZone>(&self, zone: &Tz) -> Option<DateTime<Tz>> {
        parse_invoice_date(&self.date, zone)
    }

    /// The calendar day the invoice falls on in `zone`.
    pub fn calendar_day<Tz: TimeZone>(&self, zone: &Tz) -> Option<NaiveDate> {
        self.timestamp(zone).map(|ts| ts.date_naive())
    }

    /// Checks the arithmetic invariants every stored invoice must hold.
    ///
    /// ```text
    /// item.total     == item.quantity × item.price    (each line)
    /// subtotal       == Σ item.total
    /// total          == subtotal + tax
    /// ```
    pub fn check_totals(&self) -> ValidationResult<()> {
        check_invoice_totals(
            &self.items,
            self.subtotal_paise,
            self.tax_paise,
            self.total_paise,
        )
    }
}

/// An invoice ready to be saved.
///
/// Produced by [`crate::invoice::InvoiceDraft::finish`]; `id` and `number`
/// are filled in by the invoice repository when left empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct NewInvoice {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub number: Option<String>,
    pub customer_id: String,
    pub date: String,
    pub status: InvoiceStatus,
    pub subtotal_paise: i64,
    pub tax_paise: i64,
    pub total_paise: i64,
    pub items: Vec<InvoiceItem>,
}

impl NewInvoice {
    pub fn check_totals(&self) -> ValidationResult<()> {
        check_invoice_totals(
            &self.items,
            self.subtotal_paise,
            self.tax_paise,
            self.total_paise,
        )
    }

    /// Builds the stored record under the given identifier and number.
    pub fn into_invoice(self, id: String, number: Option<String>) -> Invoice {
        Invoice {
            id,
            number,
            customer_id: self.customer_id,
            date: self.date,
            status: self.status,
            subtotal_paise: self.subtotal_paise,
            tax_paise: self.tax_paise,
            total_paise: self.total_paise,
            items: self.items,
        }
    }
}

fn check_invoice_totals(
    items: &[InvoiceItem],
    subtotal: i64,
    tax: i64,
    total: i64,
) -> ValidationResult<()> {
    let overflow = |field: &str| ValidationError::OutOfRange {
        field: field.to_string(),
        min: 0,
        max: i64::MAX,
    };

    for item in items {
        validate_quantity(item.quantity)?;
        validate_amount_paise("price", item.price_paise)?;

        let expected = item
            .expected_total()
            .ok_or_else(|| overflow("line total"))?
            .paise();
        if item.total_paise != expected {
            return Err(ValidationError::inconsistent(
                format!("line total of {}", item.name),
                expected,
                item.total_paise,
            ));
        }
    }

    validate_amount_paise("tax", tax)?;

    let expected_subtotal = items
        .iter()
        .try_fold(0i64, |acc, item| acc.checked_add(item.total_paise))
        .ok_or_else(|| overflow("subtotal"))?;
    if subtotal != expected_subtotal {
        return Err(ValidationError::inconsistent(
            "subtotal",
            expected_subtotal,
            subtotal,
        ));
    }

    let expected_total = subtotal.checked_add(tax).ok_or_else(|| overflow("total"))?;
    if total != expected_total {
        return Err(ValidationError::inconsistent("total", expected_total, total));
    }

    Ok(())
}

/// Parses the invoice date formats the editor produces, as an instant in
/// `zone`.
///
/// Timestamps with an offset (`2026-10-15T20:30:00Z`) are converted into
/// `zone`. Timestamps without one, and bare dates, are wall-clock time in
/// `zone` already.
pub fn parse_invoice_date<Tz: TimeZone>(raw: &str, zone: &Tz) -> Option<DateTime<Tz>> {
    let raw = raw.trim();

    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.with_timezone(zone));
    }

    let naive = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        })?;

    // a wall-clock time skipped by a DST jump is read as UTC
    zone.from_local_datetime(&naive)
        .earliest()
        .or_else(|| Some(zone.from_utc_datetime(&naive)))
}

// =============================================================================
// Unit Tests
// =============================================================================
