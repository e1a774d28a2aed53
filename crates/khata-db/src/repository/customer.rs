//! # Customer Repository
//!
//! The customer ledger. There is one write path, [`CustomerRepository::upsert`]:
//!
//! ```text
//! patch.id = None          ──► new Customer (fresh UUID) ◄── patch fields
//! patch.id = Some(known)   ──► stored Customer            ◄── patch fields
//! patch.id = Some(unknown) ──► empty Customer with that id ◄── patch fields
//! ```

use khata_core::{Customer, CustomerPatch};
use tracing::{debug, info};

use crate::cache::QueryCache;
use crate::error::DbResult;
use crate::repository::{id_or_new, refresh_listing};
use crate::seed;
use crate::store::{DocumentStore, Namespace};

const NS: Namespace = Namespace::Customers;

/// Repository for customer records.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    store: DocumentStore,
    cache: QueryCache,
}

impl CustomerRepository {
    pub fn new(store: DocumentStore, cache: QueryCache) -> Self {
        CustomerRepository { store, cache }
    }

    /// Lists every customer, seeding the starter ledger on an empty store.
    pub async fn list(&self) -> DbResult<Vec<Customer>> {
        if let Some(customers) = self.cache.get(NS) {
            return Ok(customers);
        }

        seed::ensure_customers(&self.store).await?;
        refresh_listing(&self.store, &self.cache, NS).await
    }

    pub async fn get(&self, id: &str) -> DbResult<Option<Customer>> {
        self.store.get(NS, id).await
    }

    /// Creates or merges a customer and returns the stored record.
    ///
    /// An identifier that does not resolve is not an error: the patch is
    /// merged onto an empty record under that identifier.
    pub async fn upsert(&self, patch: CustomerPatch) -> DbResult<Customer> {
        let base = match patch.id.as_deref().filter(|id| !id.trim().is_empty()) {
            Some(id) => match self.get(id).await? {
                Some(existing) => existing,
                None => {
                    debug!(id = %id, "Customer not found, merging onto empty record");
                    Customer::empty(id)
                }
            },
            None => Customer::empty(id_or_new(None)),
        };

        let merged = patch.apply(base);

        self.store.put(NS, &merged.id, &merged).await?;
        self.cache.invalidate(NS);

        info!(id = %merged.id, "Customer saved");
        Ok(merged)
    }
}
