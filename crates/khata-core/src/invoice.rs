//! # Invoice Computation
//!
//! The invoice being composed in the editor, before it is saved.
//!
//! ## Editing Operations Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Invoice Draft Operations                             │
//! │                                                                         │
//! │  Editor Action            Draft Method              Line Change         │
//! │  ─────────────            ────────────              ───────────         │
//! │                                                                         │
//! │  Pick product ──────────► add_product() ──────────► qty += 1 or push   │
//! │                                                                         │
//! │  Type quantity ─────────► set_quantity() ─────────► qty = n  (n ≥ 1)   │
//! │                                                                         │
//! │  Type price ────────────► set_price() ────────────► price = p (p ≥ 0)  │
//! │                                                                         │
//! │  Click remove ──────────► remove_line() ──────────► line dropped       │
//! │                                                                         │
//! │  Toggle GST ────────────► set_gst() ──────────────► (totals only)      │
//! │                                                                         │
//! │  Save ──────────────────► finish() ───────────────► NewInvoice         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - One line per product (adding again bumps the quantity)
//! - Every line's total equals `quantity × price` after every call
//! - Subtotal, tax and total are computed from the lines on each query and
//!   never stored on the draft
//! - Rejected input (negative, zero quantity, unparsable text, or an
//!   amount whose line or invoice total would overflow) changes nothing;
//!   the setter reports `false`

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::{Money, TaxRate};
use crate::types::{line_total, InvoiceItem, InvoiceStatus, NewInvoice, Product};
use crate::validation::{validate_amount_paise, validate_quantity};

/// An invoice under composition.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvoiceDraft {
    items: Vec<InvoiceItem>,
    gst_enabled: bool,
    tax_rate: TaxRate,
}

impl InvoiceDraft {
    /// Creates an empty draft with GST on at the standard 18% slab.
    pub fn new() -> Self {
        InvoiceDraft {
            items: Vec::new(),
            gst_enabled: true,
            tax_rate: TaxRate::GST_STANDARD,
        }
    }

    /// Uses a different rate whenever GST is enabled.
    ///
    /// A rate the lines already on the draft cannot carry without overflow
    /// is ignored.
    pub fn with_tax_rate(mut self, rate: TaxRate) -> Self {
        let subtotal = self.items.iter().map(|line| line.total_paise);
        if checked_totals(subtotal, rate).is_some() {
            self.tax_rate = rate;
        }
        self
    }

    /// Adds one unit of `product`.
    ///
    /// ## Behavior
    /// - Product already on the draft: its quantity goes up by one
    /// - Otherwise: a new line with quantity 1 at the product's current price
    ///
    /// The price is captured now. Later price changes on the product do not
    /// touch lines already on the draft. Returns `None`, leaving the draft
    /// unchanged, when the extra unit would overflow the invoice total.
    pub fn add_product(&mut self, product: &Product) -> Option<&InvoiceItem> {
        let index = match self
            .items
            .iter()
            .position(|line| line.product_id == product.id)
        {
            Some(index) => {
                let price_paise = self.items[index].price_paise;
                let quantity = self.items[index].quantity.checked_add(1)?;
                if !self.update_line(index, quantity, price_paise) {
                    return None;
                }
                index
            }
            None => {
                let price_paise = product.price_paise.max(0);
                let subtotal = self
                    .items
                    .iter()
                    .map(|line| line.total_paise)
                    .chain(std::iter::once(price_paise));
                checked_totals(subtotal, self.tax_rate)?;

                self.items.push(InvoiceItem {
                    id: Uuid::new_v4().to_string(),
                    product_id: product.id.clone(),
                    name: product.name.clone(),
                    quantity: 1,
                    price_paise,
                    total_paise: price_paise,
                });
                self.items.len() - 1
            }
        };

        Some(&self.items[index])
    }

    /// Sets the quantity of a line. Quantities below 1 are ignored.
    ///
    /// Returns whether the draft changed.
    pub fn set_quantity(&mut self, product_id: &str, quantity: i64) -> bool {
        if validate_quantity(quantity).is_err() {
            return false;
        }

        match self.line_index(product_id) {
            Some(index) => {
                let price_paise = self.items[index].price_paise;
                self.update_line(index, quantity, price_paise)
            }
            None => false,
        }
    }

    /// Sets the unit price (paise) of a line. Negative prices are ignored.
    ///
    /// Returns whether the draft changed.
    pub fn set_price(&mut self, product_id: &str, price_paise: i64) -> bool {
        if validate_amount_paise("price", price_paise).is_err() {
            return false;
        }

        match self.line_index(product_id) {
            Some(index) => {
                let quantity = self.items[index].quantity;
                self.update_line(index, quantity, price_paise)
            }
            None => false,
        }
    }

    /// Rewrites one line, unless its total or the invoice total would
    /// overflow. Tax is checked at the draft's rate even while GST is off, so
    /// turning it back on can never overflow.
    fn update_line(&mut self, index: usize, quantity: i64, price_paise: i64) -> bool {
        let Some(total) = line_total(quantity, price_paise) else {
            return false;
        };

        let subtotal = self.items.iter().enumerate().map(|(i, line)| {
            if i == index {
                total.paise()
            } else {
                line.total_paise
            }
        });
        if checked_totals(subtotal, self.tax_rate).is_none() {
            return false;
        }

        let line = &mut self.items[index];
        line.quantity = quantity;
        line.price_paise = price_paise;
        line.total_paise = total.paise();
        true
    }

    /// [`set_quantity`](Self::set_quantity) from raw text; unparsable text is ignored.
    pub fn set_quantity_text(&mut self, product_id: &str, input: &str) -> bool {
        match input.trim().parse::<i64>() {
            Ok(quantity) => self.set_quantity(product_id, quantity),
            Err(_) => false,
        }
    }

    /// [`set_price`](Self::set_price) from a rupee string such as `"899.99"`.
    pub fn set_price_text(&mut self, product_id: &str, input: &str) -> bool {
        match Money::parse_rupees(input) {
            Ok(price) => self.set_price(product_id, price.paise()),
            Err(_) => false,
        }
    }

    /// Removes the line for `product_id`.
    pub fn remove_line(&mut self, product_id: &str) -> CoreResult<()> {
        let initial_len = self.items.len();
        self.items.retain(|line| line.product_id != product_id);

        if self.items.len() == initial_len {
            Err(CoreError::LineNotFound(product_id.to_string()))
        } else {
            Ok(())
        }
    }

    /// Drops every line. The GST setting is kept.
    pub fn clear(&mut self) {
        self.items.clear();
    }

    pub fn set_gst(&mut self, enabled: bool) {
        self.gst_enabled = enabled;
    }

    pub fn gst_enabled(&self) -> bool {
        self.gst_enabled
    }

    pub fn items(&self) -> &[InvoiceItem] {
        &self.items
    }

    pub fn line(&self, product_id: &str) -> Option<&InvoiceItem> {
        self.items.iter().find(|line| line.product_id == product_id)
    }

    fn line_index(&self, product_id: &str) -> Option<usize> {
        self.items
            .iter()
            .position(|line| line.product_id == product_id)
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.items.len()
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.items
            .iter()
            .fold(0i64, |acc, line| acc.saturating_add(line.quantity))
    }

    /// Sum of line totals.
    pub fn subtotal(&self) -> Money {
        self.items
            .iter()
            .map(|line| Money::from_paise(line.total_paise))
            .sum()
    }

    /// GST on the subtotal, or zero when GST is off.
    pub fn tax(&self) -> Money {
        if self.gst_enabled {
            self.subtotal().calculate_tax(self.tax_rate)
        } else {
            Money::zero()
        }
    }

    pub fn total(&self) -> Money {
        self.subtotal() + self.tax()
    }

    pub fn totals(&self) -> InvoiceTotals {
        InvoiceTotals::from(self)
    }

    /// Freezes the draft into an invoice ready for the invoice repository.
    ///
    /// `date` is the timestamp string written on the invoice.
    pub fn finish(
        &self,
        customer_id: impl Into<String>,
        date: impl Into<String>,
        status: InvoiceStatus,
    ) -> NewInvoice {
        let totals = self.totals();

        NewInvoice {
            id: None,
            number: None,
            customer_id: customer_id.into(),
            date: date.into(),
            status,
            subtotal_paise: totals.subtotal_paise,
            tax_paise: totals.tax_paise,
            total_paise: totals.total_paise,
            items: self.items.clone(),
        }
    }
}

/// Subtotal, tax and total for a set of line totals, or `None` if any of
/// them would overflow.
fn checked_totals(
    line_totals: impl IntoIterator<Item = i64>,
    rate: TaxRate,
) -> Option<(Money, Money, Money)> {
    let subtotal = line_totals
        .into_iter()
        .try_fold(Money::zero(), |acc, paise| {
            acc.checked_add(Money::from_paise(paise))
        })?;
    let tax = subtotal.checked_tax(rate)?;
    let total = subtotal.checked_add(tax)?;
    Some((subtotal, tax, total))
}

impl Default for InvoiceDraft {
    fn default() -> Self {
        Self::new()
    }
}

/// Totals summary handed to the editor on every render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct InvoiceTotals {
    pub line_count: usize,
    pub total_quantity: i64,
    pub subtotal_paise: i64,
    pub tax_paise: i64,
    pub total_paise: i64,
}

impl From<&InvoiceDraft> for InvoiceTotals {
    fn from(draft: &InvoiceDraft) -> Self {
        let subtotal = draft.subtotal();
        let tax = draft.tax();

        InvoiceTotals {
            line_count: draft.line_count(),
            total_quantity: draft.total_quantity(),
            subtotal_paise: subtotal.paise(),
            tax_paise: tax.paise(),
            total_paise: (subtotal + tax).paise(),
        }
    }
}
