//! # Product Repository
//!
//! Inventory records.
//!
//! ## Stock Adjustment Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  1. read     get(id) ──────────────► Product { stock_qty: 4 }           │
//! │  2. compute  product.adjust_stock(+6) ► Product { stock_qty: 10 }       │
//! │  3. write    update(&product) ──────► full replace, cache invalidated   │
//! │                                                                         │
//! │  adjust_stock(id, delta) runs all three steps.                          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use khata_core::{NewProduct, Product};
use tracing::{debug, info};

use crate::cache::QueryCache;
use crate::error::{DbError, DbResult};
use crate::repository::{id_or_new, refresh_listing};
use crate::seed;
use crate::store::{DocumentStore, Namespace};

const NS: Namespace = Namespace::Products;

/// Repository for product records.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.products();
///
/// let products = repo.list().await?;
/// let kettle = repo.add(NewProduct { name: "Kettle".into(), .. }).await?;
/// ```
#[derive(Debug, Clone)]
pub struct ProductRepository {
    store: DocumentStore,
    cache: QueryCache,
}

impl ProductRepository {
    pub fn new(store: DocumentStore, cache: QueryCache) -> Self {
        ProductRepository { store, cache }
    }

    /// Lists every product.
    ///
    /// Served from the cache while fresh. Otherwise the store is read,
    /// seeding the starter catalogue first if it is empty.
    pub async fn list(&self) -> DbResult<Vec<Product>> {
        if let Some(products) = self.cache.get(NS) {
            return Ok(products);
        }

        seed::ensure_products(&self.store).await?;
        refresh_listing(&self.store, &self.cache, NS).await
    }

    /// Gets a product by its ID.
    pub async fn get(&self, id: &str) -> DbResult<Option<Product>> {
        self.store.get(NS, id).await
    }

    /// Stores a new product, generating an ID if none is given.
    ///
    /// ## Returns
    /// * `Ok(Product)` - The stored record
    /// * `Err(DbError::Validation)` - Empty name/SKU or a negative amount
    pub async fn add(&self, fields: NewProduct) -> DbResult<Product> {
        let id = id_or_new(fields.id.clone());
        let product = fields.into_product(id);
        product.validate()?;

        self.store.put(NS, &product.id, &product).await?;
        self.cache.invalidate(NS);

        info!(id = %product.id, sku = %product.sku, "Product added");
        Ok(product)
    }

    /// Replaces the product stored under `product.id`.
    pub async fn update(&self, product: &Product) -> DbResult<Product> {
        product.validate()?;

        self.store.put(NS, &product.id, product).await?;
        self.cache.invalidate(NS);

        debug!(id = %product.id, stock = product.stock_qty, "Product updated");
        Ok(product.clone())
    }

    /// Moves stock by `delta` (clamped at zero) and stores the result.
    ///
    /// ## Returns
    /// * `Err(DbError::NotFound)` - No product with that ID
    pub async fn adjust_stock(&self, id: &str, delta: i64) -> DbResult<Product> {
        let current = self
            .get(id)
            .await?
            .ok_or_else(|| DbError::not_found(NS.entity(), id))?;

        self.update(&current.adjust_stock(delta)).await
    }

    /// Deletes a product. Returns whether it existed.
    ///
    /// Saved invoices keep their line snapshots.
    pub async fn delete(&self, id: &str) -> DbResult<bool> {
        let removed = self.store.remove(NS, id).await?;
        self.cache.invalidate(NS);

        info!(id = %id, removed, "Product deleted");
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use std::time::Duration;

    async fn setup() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn kettle() -> NewProduct {
        NewProduct {
            name: "Electric Kettle 1.5L".to_string(),
            sku: "KET-15".to_string(),
            price_paise: 129_900,
            cost_paise: 90_000,
            stock_qty: 8,
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_first_listing_seeds_five_products() {
        let db = setup().await;

        let first = db.products().list().await.unwrap();
        assert_eq!(first.len(), 5);

        db.cache().clear();
        let second = db.products().list().await.unwrap();
        assert_eq!(second.len(), 5);

        let mut first_ids: Vec<_> = first.iter().map(|p| p.id.clone()).collect();
        let mut second_ids: Vec<_> = second.iter().map(|p| p.id.clone()).collect();
        first_ids.sort();
        second_ids.sort();
        assert_eq!(first_ids, second_ids);
    }

    #[tokio::test]
    async fn test_add_generates_id_and_invalidates() {
        let db = setup().await;
        let repo = db.products();
        assert_eq!(repo.list().await.unwrap().len(), 5);

        let added = repo.add(kettle()).await.unwrap();
        assert!(!added.id.is_empty());

        let listed = repo.list().await.unwrap();
        assert_eq!(listed.len(), 6);
        assert!(listed.iter().any(|p| p.id == added.id));
    }

    #[tokio::test]
    async fn test_add_keeps_given_id() {
        let db = setup().await;
        let added = db
            .products()
            .add(NewProduct {
                id: Some("fixed".to_string()),
                ..kettle()
            })
            .await
            .unwrap();

        assert_eq!(added.id, "fixed");
        assert_eq!(db.products().get("fixed").await.unwrap(), Some(added));
    }

    #[tokio::test]
    async fn test_add_rejects_negative_price() {
        let db = setup().await;
        let result = db
            .products()
            .add(NewProduct {
                price_paise: -1,
                ..kettle()
            })
            .await;

        assert!(matches!(result, Err(DbError::Validation(_))));
    }

    #[tokio::test]
    async fn test_updates_visible_on_next_list() {
        let db = setup().await;
        let repo = db.products();
        let added = repo.add(kettle()).await.unwrap();
        repo.list().await.unwrap();

        let mut changed = added.clone();
        changed.stock_qty = 2;
        repo.update(&changed).await.unwrap();
        changed.price_paise = 119_900;
        repo.update(&changed).await.unwrap();

        let listed = repo.list().await.unwrap();
        let stored = listed.iter().find(|p| p.id == added.id).unwrap();
        assert_eq!(stored, &changed);
    }

    #[tokio::test]
    async fn test_adjust_stock() {
        let db = setup().await;
        let repo = db.products();
        let added = repo.add(kettle()).await.unwrap();

        assert_eq!(repo.adjust_stock(&added.id, -3).await.unwrap().stock_qty, 5);
        assert_eq!(repo.adjust_stock(&added.id, -50).await.unwrap().stock_qty, 0);
        assert!(matches!(
            repo.adjust_stock("missing", 1).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_cached_listing_served_within_window() {
        let db = setup().await;
        let repo = db.products();
        let before = repo.list().await.unwrap();

        // a write that bypasses the repository is not seen until the entry expires
        let extra = kettle().into_product("sneaky".to_string());
        db.store().put(NS, &extra.id, &extra).await.unwrap();

        assert_eq!(repo.list().await.unwrap().len(), before.len());
    }

    #[tokio::test]
    async fn test_zero_window_always_reads_store() {
        let db = Database::new(DbConfig::in_memory().staleness_window(Duration::ZERO))
            .await
            .unwrap();
        let repo = db.products();
        repo.list().await.unwrap();

        let extra = kettle().into_product("direct".to_string());
        db.store().put(NS, &extra.id, &extra).await.unwrap();

        assert_eq!(repo.list().await.unwrap().len(), 6);
    }

    #[tokio::test]
    async fn test_delete() {
        let db = setup().await;
        let repo = db.products();
        let added = repo.add(kettle()).await.unwrap();

        assert!(repo.delete(&added.id).await.unwrap());
        assert!(!repo.delete(&added.id).await.unwrap());
        assert!(repo.get(&added.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_write_after_close_is_storage_unavailable() {
        let db = setup().await;
        db.close().await;

        let err = db.products().add(kettle()).await.unwrap_err();
        assert!(err.is_storage_unavailable());
    }
}
