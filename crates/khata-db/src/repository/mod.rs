//! # Repository Module
//!
//! Typed access to each entity class, layered on the document store and the
//! query cache.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  UI collaborator                                                        │
//! │       │                                                                 │
//! │       │  db.products().list()         db.invoices().save(new)          │
//! │       ▼                                    ▼                            │
//! │  ┌──────────────────────┐    ┌───────────────────────────────┐         │
//! │  │ QueryCache           │    │ ProductRepository             │         │
//! │  │  hit? ──► listing    │◄───│ CustomerRepository            │         │
//! │  │  invalidate(ns)      │    │ InvoiceRepository             │         │
//! │  └──────────────────────┘    └───────────────┬───────────────┘         │
//! │                                              │                          │
//! │                                              ▼                          │
//! │                                     DocumentStore (SQLite)              │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every write invalidates its namespace after the store accepts it and
//! before returning. Identifier collisions overwrite (last write wins).
//!
//! ## Available Repositories
//!
//! - [`ProductRepository`](product::ProductRepository) - Inventory
//! - [`CustomerRepository`](customer::CustomerRepository) - Customer ledger
//! - [`InvoiceRepository`](invoice::InvoiceRepository) - Saved invoices

pub mod customer;
pub mod invoice;
pub mod product;

use serde::de::DeserializeOwned;
use serde::Serialize;
use uuid::Uuid;

use crate::cache::QueryCache;
use crate::error::DbResult;
use crate::store::{DocumentStore, Namespace};

/// Reads the namespace from the store and caches the result.
pub(crate) async fn refresh_listing<T>(
    store: &DocumentStore,
    cache: &QueryCache,
    ns: Namespace,
) -> DbResult<Vec<T>>
where
    T: Serialize + DeserializeOwned,
{
    let items: Vec<T> = store.list_all(ns).await?;
    cache.put(ns, &items);
    Ok(items)
}

/// The supplied identifier, or a fresh UUID when it is absent or blank.
pub(crate) fn id_or_new(id: Option<String>) -> String {
    id.filter(|id| !id.trim().is_empty())
        .unwrap_or_else(|| Uuid::new_v4().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_id_or_new() {
        assert_eq!(id_or_new(Some("p1".to_string())), "p1");

        let generated = id_or_new(Some("  ".to_string()));
        assert!(Uuid::parse_str(&generated).is_ok());
        assert_ne!(id_or_new(None), id_or_new(None));
    }
}
