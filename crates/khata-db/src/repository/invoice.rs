//! # Invoice Repository
//!
//! Saved invoices. Saving is the only write: there is no edit or delete,
//! and a status changes only by saving the invoice again under its id.
//!
//! ## Save
//! ```text
//! NewInvoice (from InvoiceDraft::finish)
//!     │
//!     ├── check_totals()          line totals, subtotal, total consistent
//!     ├── id      ← given or UUID
//!     ├── number  ← given, else the stored invoice's, else INV-YYYYMMDD-NNNN
//!     ▼
//! store.put(invoices, id) ──► cache.invalidate(invoices) ──► Invoice
//! ```

use chrono::{Local, NaiveDate};
use khata_core::{parse_invoice_date, Invoice, NewInvoice};
use tracing::info;

use crate::cache::QueryCache;
use crate::error::DbResult;
use crate::repository::{id_or_new, refresh_listing};
use crate::store::{DocumentStore, Namespace};

const NS: Namespace = Namespace::Invoices;

/// Repository for saved invoices.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    store: DocumentStore,
    cache: QueryCache,
}

impl InvoiceRepository {
    pub fn new(store: DocumentStore, cache: QueryCache) -> Self {
        InvoiceRepository { store, cache }
    }

    /// Lists every saved invoice. An empty list is normal for a new shop.
    pub async fn list(&self) -> DbResult<Vec<Invoice>> {
        if let Some(invoices) = self.cache.get(NS) {
            return Ok(invoices);
        }

        refresh_listing(&self.store, &self.cache, NS).await
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Invoice>> {
        self.store.get(NS, id).await
    }

    /// Persists an invoice with its items and returns the stored record.
    ///
    /// ## Returns
    /// * `Err(DbError::Validation)` - Totals do not add up
    ///
    /// A failed save leaves nothing behind; the same draft can be retried.
    pub async fn save(&self, new: NewInvoice) -> DbResult<Invoice> {
        new.check_totals()?;

        let id = id_or_new(new.id.clone());
        let number = match new.number.clone().filter(|n| !n.trim().is_empty()) {
            Some(number) => number,
            None => match self.get(&id).await?.and_then(|stored| stored.number) {
                Some(number) => number,
                None => {
                    let day = parse_invoice_date(&new.date, &Local)
                        .map(|ts| ts.date_naive())
                        .unwrap_or_else(|| Local::now().date_naive());
                    self.next_number(day).await?
                }
            },
        };

        let invoice = new.into_invoice(id, Some(number));

        self.store.put(NS, &invoice.id, &invoice).await?;
        self.cache.invalidate(NS);

        info!(
            id = %invoice.id,
            number = invoice.number.as_deref().unwrap_or_default(),
            total = invoice.total_paise,
            items = invoice.items.len(),
            "Invoice saved"
        );
        Ok(invoice)
    }

    /// Next human-readable number for an invoice dated `day`.
    ///
    /// The sequence is one past the highest already issued, whatever the
    /// day, so overwriting an invoice never hands its number out again.
    pub async fn next_number(&self, day: NaiveDate) -> DbResult<String> {
        let invoices: Vec<Invoice> = self.store.list_all(NS).await?;
        let last = invoices
            .iter()
            .filter_map(|inv| inv.number.as_deref())
            .filter_map(invoice_sequence)
            .max()
            .unwrap_or(0);

        Ok(format_invoice_number(day, last + 1))
    }
}

/// `INV-YYYYMMDD-NNNN`
pub fn format_invoice_number(day: NaiveDate, sequence: usize) -> String {
    format!("INV-{}-{:04}", day.format("%Y%m%d"), sequence)
}

/// The `NNNN` of an `INV-YYYYMMDD-NNNN` number. Numbers in any other
/// format are not part of the sequence.
pub fn invoice_sequence(number: &str) -> Option<usize> {
    let (day, sequence) = number.strip_prefix("INV-")?.split_once('-')?;
    let digits = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_digit());

    if day.len() != 8 || !digits(day) || !digits(sequence) {
        return None;
    }
    sequence.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DbError;
    use crate::pool::{Database, DbConfig};
    use khata_core::{InvoiceDraft, InvoiceStatus, Product};

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn earphones() -> Product {
        Product {
            id: "p-ear".to_string(),
            name: "Redmi Buds Wireless Earphones".to_string(),
            sku: "EAR-RB".to_string(),
            price_paise: 89_999,
            cost_paise: 62_000,
            stock_qty: 4,
            image_url: None,
        }
    }

    fn draft_invoice(date: &str) -> NewInvoice {
        let mut draft = InvoiceDraft::new();
        draft.add_product(&earphones());
        draft.add_product(&earphones());
        draft.finish("c1", date, InvoiceStatus::Unpaid)
    }

    #[test]
    fn test_format_invoice_number() {
        let day = NaiveDate::from_ymd_opt(2026, 10, 15).unwrap();
        assert_eq!(format_invoice_number(day, 3), "INV-20261015-0003");
    }

    #[test]
    fn test_invoice_sequence() {
        assert_eq!(invoice_sequence("INV-20261015-0003"), Some(3));
        assert_eq!(invoice_sequence("INV-20261015-12345"), Some(12_345));
        assert_eq!(invoice_sequence("A-1"), None);
        assert_eq!(invoice_sequence("INV-2026-0003"), None);
        assert_eq!(invoice_sequence("INV-20261015-+3"), None);
    }

    #[tokio::test]
    async fn test_empty_store_lists_no_invoices() {
        let db = setup().await;
        assert!(db.invoices().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_assigns_id_and_number() {
        let db = setup().await;
        let repo = db.invoices();

        let first = repo.save(draft_invoice("2026-10-15T10:00:00")).await.unwrap();
        let second = repo.save(draft_invoice("2026-10-15T11:00:00")).await.unwrap();

        assert_ne!(first.id, second.id);
        assert_eq!(first.number.as_deref(), Some("INV-20261015-0001"));
        assert_eq!(second.number.as_deref(), Some("INV-20261015-0002"));
        assert_eq!(first.total_paise, 212_398);
    }

    #[tokio::test]
    async fn test_resave_keeps_number_and_sequence_moves_on() {
        let db = setup().await;
        let repo = db.invoices();

        let a = repo.save(draft_invoice("2026-10-15T10:00:00")).await.unwrap();
        let b = repo.save(draft_invoice("2026-10-15T11:00:00")).await.unwrap();

        let mut paid = draft_invoice("2026-10-15T10:00:00");
        paid.id = Some(a.id.clone());
        paid.status = InvoiceStatus::Paid;
        let a_resaved = repo.save(paid).await.unwrap();

        let c = repo.save(draft_invoice("2026-10-15T12:00:00")).await.unwrap();

        assert_eq!(a_resaved.id, a.id);
        assert_eq!(a_resaved.number, a.number);
        assert_eq!(a_resaved.status, InvoiceStatus::Paid);
        assert_eq!(b.number.as_deref(), Some("INV-20261015-0002"));
        assert_eq!(c.number.as_deref(), Some("INV-20261015-0003"));
        assert_eq!(repo.list().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_sequence_follows_highest_issued_number() {
        let db = setup().await;
        let repo = db.invoices();

        let mut imported = draft_invoice("2026-10-01");
        imported.number = Some("INV-20261001-0041".to_string());
        repo.save(imported).await.unwrap();

        let mut custom = draft_invoice("2026-10-02");
        custom.number = Some("A-1".to_string());
        repo.save(custom).await.unwrap();

        let next = repo.save(draft_invoice("2026-10-15")).await.unwrap();
        assert_eq!(next.number.as_deref(), Some("INV-20261015-0042"));
    }

    #[tokio::test]
    async fn test_saved_invoice_round_trips_with_items() {
        let db = setup().await;
        let repo = db.invoices();
        let saved = repo.save(draft_invoice("2026-10-15")).await.unwrap();

        let loaded = repo.get(&saved.id).await.unwrap().unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.items.len(), 1);
        assert_eq!(loaded.items[0].quantity, 2);

        let listed = repo.list().await.unwrap();
        assert_eq!(listed, vec![saved]);
    }

    #[tokio::test]
    async fn test_save_invalidates_cached_listing() {
        let db = setup().await;
        let repo = db.invoices();
        assert!(repo.list().await.unwrap().is_empty());

        repo.save(draft_invoice("2026-10-15")).await.unwrap();
        assert_eq!(repo.list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_save_rejects_inconsistent_totals() {
        let db = setup().await;
        let mut bad = draft_invoice("2026-10-15");
        bad.total_paise += 1;

        let result = db.invoices().save(bad).await;
        assert!(matches!(result, Err(DbError::Validation(_))));
        assert!(db.invoices().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_same_id_overwrites() {
        let db = setup().await;
        let repo = db.invoices();

        let mut first = draft_invoice("2026-10-15");
        first.id = Some("inv-1".to_string());
        first.number = Some("A-1".to_string());
        repo.save(first.clone()).await.unwrap();

        first.status = InvoiceStatus::Paid;
        repo.save(first).await.unwrap();

        let listed = repo.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].status, InvoiceStatus::Paid);
        assert_eq!(listed[0].number.as_deref(), Some("A-1"));
    }
}
