//! # khata-core: Pure Business Logic for Khata
//!
//! This crate holds every rule of the shop ledger that can be expressed
//! without touching storage: the record types, integer money, GST math for
//! the invoice being composed, and the dashboard rollups.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Khata Architecture                             │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    UI collaborator                              │   │
//! │  │   Inventory ──► Customers ──► Invoice editor ──► Dashboard      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ khata-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  invoice  │  │ dashboard │  │   │
//! │  │   │  Product  │  │   Money   │  │  Draft    │  │  rollups  │  │   │
//! │  │   │  Invoice  │  │  TaxRate  │  │  lines    │  │  stats    │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK • PURE FUNCTIONS             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │            khata-db (document store, cache, repositories)       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Records (Product, Customer, Invoice, InvoiceItem) and patches
//! - [`money`] - Paise-denominated money and GST rates
//! - [`invoice`] - The invoice being composed and its derived totals
//! - [`dashboard`] - Read-only rollups over product and invoice listings
//! - [`validation`] - Field checks used by the editor and the repositories
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use khata_core::money::{Money, TaxRate};
//!
//! let subtotal = Money::from_paise(179_998);
//! let gst = subtotal.calculate_tax(TaxRate::GST_STANDARD);
//!
//! // 179998 × 18% = 32399.64 → 32400
//! assert_eq!(gst.paise(), 32_400);
//! ```

pub mod dashboard;
pub mod error;
pub mod invoice;
pub mod money;
pub mod types;
pub mod validation;

pub use error::{CoreError, ValidationError};
pub use invoice::InvoiceDraft;
pub use money::{Money, TaxRate};
pub use types::*;

/// Products with fewer units than this count as low stock on the dashboard.
pub const LOW_STOCK_THRESHOLD: i64 = 5;

/// Number of invoices shown in the dashboard's recent list.
pub const RECENT_INVOICE_LIMIT: usize = 5;

/// Number of calendar months kept in the monthly sales series.
pub const MONTHLY_SERIES_LIMIT: usize = 6;
