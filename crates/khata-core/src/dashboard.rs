//! # Dashboard Rollups
//!
//! Read-only summaries over the product, customer and invoice listings.
//!
//! ## Data Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   invoices ─┬──► today_sales()          paid AND dated today            │
//! │             ├──► pending_receivables()  unpaid OR overdue, any date     │
//! │             ├──► recent_invoices()      newest first                    │
//! │             ├──► monthly_sales()        YYYY-MM buckets, last N         │
//! │             └──┐                                                        │
//! │   customers ───┴──► customer_stats()    spent / pending per customer    │
//! │                                                                         │
//! │   products ────────► low_stock_count()  stock below threshold           │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every function here is pure. "Now" is passed in rather than read from
//! the clock, and its time zone is the one every invoice date is converted
//! into before it is bucketed by day or month. Invoices whose date does not
//! parse are left out of the day and month buckets.

use std::cmp::Reverse;
use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{Customer, Invoice, InvoiceStatus, Product};
use crate::{LOW_STOCK_THRESHOLD, MONTHLY_SERIES_LIMIT, RECENT_INVOICE_LIMIT};

// =============================================================================
// Result Types
// =============================================================================

/// Sales total for one calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct MonthlySales {
    /// `YYYY-MM`
    pub month: String,
    pub total_paise: i64,
}

/// Spend and outstanding balance for one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct CustomerStats {
    pub customer_id: String,
    pub name: String,
    pub invoice_count: usize,
    pub total_spent_paise: i64,
    pub pending_paise: i64,
}

/// Every rollup the dashboard shows, computed for a given day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct DashboardSummary {
    pub day: String,
    pub today_sales_paise: i64,
    pub pending_receivables_paise: i64,
    pub low_stock_count: usize,
    pub recent_invoices: Vec<Invoice>,
    pub monthly_sales: Vec<MonthlySales>,
    pub customer_stats: Vec<CustomerStats>,
}

impl DashboardSummary {
    /// Computes the summary with the default thresholds.
    pub fn compute<Tz: TimeZone>(
        products: &[Product],
        customers: &[Customer],
        invoices: &[Invoice],
        now: &DateTime<Tz>,
    ) -> Self {
        Self::compute_with_threshold(products, customers, invoices, now, LOW_STOCK_THRESHOLD)
    }

    /// `now` fixes both the day that counts as today and the zone invoice
    /// dates are read in.
    pub fn compute_with_threshold<Tz: TimeZone>(
        products: &[Product],
        customers: &[Customer],
        invoices: &[Invoice],
        now: &DateTime<Tz>,
        low_stock_threshold: i64,
    ) -> Self {
        let zone = now.timezone();
        let today = now.date_naive();

        DashboardSummary {
            day: today.format("%Y-%m-%d").to_string(),
            today_sales_paise: today_sales(invoices, today, &zone).paise(),
            pending_receivables_paise: pending_receivables(invoices).paise(),
            low_stock_count: low_stock_count(products, low_stock_threshold),
            recent_invoices: recent_invoices(invoices, &zone, RECENT_INVOICE_LIMIT),
            monthly_sales: monthly_sales(invoices, &zone, MONTHLY_SERIES_LIMIT),
            customer_stats: customer_stats(customers, invoices),
        }
    }
}

// =============================================================================
// Rollups
// =============================================================================

/// Sum of paid invoices dated on `today` in `zone`.
pub fn today_sales<Tz: TimeZone>(invoices: &[Invoice], today: NaiveDate, zone: &Tz) -> Money {
    invoices
        .iter()
        .filter(|inv| inv.status == InvoiceStatus::Paid)
        .filter(|inv| inv.calendar_day(zone) == Some(today))
        .map(Invoice::total)
        .sum()
}

/// Sum of unpaid and overdue invoices, whatever their date.
pub fn pending_receivables(invoices: &[Invoice]) -> Money {
    invoices
        .iter()
        .filter(|inv| inv.status.is_pending())
        .map(Invoice::total)
        .sum()
}

/// Number of products with stock strictly below `threshold`.
pub fn low_stock_count(products: &[Product], threshold: i64) -> usize {
    products.iter().filter(|p| p.is_low_stock(threshold)).count()
}

/// The `limit` most recently dated invoices, newest first.
///
/// Ordering is by instant, so dates written with different offsets compare
/// correctly. Invoices with an unparsable date sort after every dated one.
pub fn recent_invoices<Tz: TimeZone>(
    invoices: &[Invoice],
    zone: &Tz,
    limit: usize,
) -> Vec<Invoice> {
    let mut sorted: Vec<&Invoice> = invoices.iter().collect();
    // Option orders None < Some, so Reverse puts undated invoices last
    sorted.sort_by_cached_key(|inv| Reverse(inv.timestamp(zone)));
    sorted.into_iter().take(limit).cloned().collect()
}

/// Invoice totals bucketed by calendar month, oldest first, keeping the
/// most recent `limit` months that have invoices.
///
/// All statuses are counted. Months are those of `zone`.
pub fn monthly_sales<Tz: TimeZone>(
    invoices: &[Invoice],
    zone: &Tz,
    limit: usize,
) -> Vec<MonthlySales> {
    let mut buckets: BTreeMap<String, i64> = BTreeMap::new();

    for invoice in invoices {
        if let Some(day) = invoice.calendar_day(zone) {
            *buckets.entry(day.format("%Y-%m").to_string()).or_insert(0) += invoice.total_paise;
        }
    }

    let skip = buckets.len().saturating_sub(limit);
    buckets
        .into_iter()
        .skip(skip)
        .map(|(month, total_paise)| MonthlySales { month, total_paise })
        .collect()
}

/// Per-customer totals, in the order of `customers`.
///
/// Invoices pointing at an unknown customer are not reported.
pub fn customer_stats(customers: &[Customer], invoices: &[Invoice]) -> Vec<CustomerStats> {
    let mut by_customer: HashMap<&str, Vec<&Invoice>> = HashMap::new();
    for invoice in invoices {
        by_customer
            .entry(invoice.customer_id.as_str())
            .or_default()
            .push(invoice);
    }

    customers
        .iter()
        .map(|customer| {
            let theirs = by_customer
                .get(customer.id.as_str())
                .map(Vec::as_slice)
                .unwrap_or_default();

            CustomerStats {
                customer_id: customer.id.clone(),
                name: customer.name.clone(),
                invoice_count: theirs.len(),
                total_spent_paise: theirs.iter().map(|inv| inv.total_paise).sum(),
                pending_paise: theirs
                    .iter()
                    .filter(|inv| inv.status.is_pending())
                    .map(|inv| inv.total_paise)
                    .sum(),
            }
        })
        .collect()
}

// =============================================================================
// Unit Tests
// =============================================================================
