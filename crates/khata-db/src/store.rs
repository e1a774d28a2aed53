//! # Document Store
//!
//! Durable key → JSON document persistence, one namespace per entity class.
//!
//! ## Layout
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    documents (single SQLite table)                      │
//! │                                                                         │
//! │   namespace   │ key (uuid)                │ body (JSON)                 │
//! │  ─────────────┼───────────────────────────┼─────────────────────────    │
//! │   products    │ 5b0e...                   │ {"id":"5b0e...","sku":...}  │
//! │   products    │ 91c2...                   │ {...}                       │
//! │   customers   │ 0f4a...                   │ {...}                       │
//! │   invoices    │ d7e1...                   │ {..., "items":[...]}        │
//! │                                                                         │
//! │   put    = INSERT ... ON CONFLICT DO UPDATE   (last write wins)        │
//! │   remove = DELETE                             (missing key is fine)    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each statement stands alone and nothing spans entity classes. The one
//! transaction is [`DocumentStore::seed_if_empty`], which fills an empty
//! namespace with all of its documents or none of them. Any sqlx failure
//! surfaces as [`DbError::StorageUnavailable`] and is not retried.

use std::fmt;

use chrono::Utc;
use serde::de::DeserializeOwned;
use serde::Serialize;
use sqlx::SqlitePool;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};

/// Version tag written into `store_meta` when a store is first opened.
pub const STORE_VERSION: &str = "1";

const VERSION_KEY: &str = "version";

const UPSERT_DOCUMENT: &str = r#"
    INSERT INTO documents (namespace, key, body, updated_at)
    VALUES (?1, ?2, ?3, ?4)
    ON CONFLICT (namespace, key) DO UPDATE SET
        body = excluded.body,
        updated_at = excluded.updated_at
"#;

// =============================================================================
// Namespace
// =============================================================================

/// An entity class. Each one owns an independent key space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Namespace {
    Products,
    Customers,
    Invoices,
}

impl Namespace {
    pub const ALL: [Namespace; 3] = [
        Namespace::Products,
        Namespace::Customers,
        Namespace::Invoices,
    ];

    /// Value stored in the `namespace` column.
    pub const fn as_str(&self) -> &'static str {
        match self {
            Namespace::Products => "products",
            Namespace::Customers => "customers",
            Namespace::Invoices => "invoices",
        }
    }

    /// Singular entity name, used in `NotFound` errors.
    pub const fn entity(&self) -> &'static str {
        match self {
            Namespace::Products => "Product",
            Namespace::Customers => "Customer",
            Namespace::Invoices => "Invoice",
        }
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Document Store
// =============================================================================

/// Handle to the document table. Cheap to clone (shares the pool).
#[derive(Debug, Clone)]
pub struct DocumentStore {
    pool: SqlitePool,
}

impl DocumentStore {
    pub fn new(pool: SqlitePool) -> Self {
        DocumentStore { pool }
    }

    /// Writes `value` under `key`, replacing whatever was there.
    pub async fn put<T: Serialize>(&self, ns: Namespace, key: &str, value: &T) -> DbResult<()> {
        let body = serde_json::to_string(value).map_err(|e| DbError::corrupt(ns.as_str(), key, e))?;

        sqlx::query(UPSERT_DOCUMENT)
            .bind(ns.as_str())
            .bind(key)
            .bind(&body)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await?;

        debug!(namespace = %ns, key = %key, bytes = body.len(), "Document stored");
        Ok(())
    }

    /// Writes `docs` into `ns` if, and only if, the namespace is empty.
    ///
    /// The emptiness check and every write share one transaction: a failure
    /// part way rolls the namespace back to empty, so the next call seeds it
    /// again from scratch. Returns whether anything was written.
    pub async fn seed_if_empty<'a, T, I>(&self, ns: Namespace, docs: I) -> DbResult<bool>
    where
        T: Serialize + 'a,
        I: IntoIterator<Item = (&'a str, &'a T)>,
    {
        let mut tx = self.pool.begin().await?;

        let existing: i64 =
            sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE namespace = ?1")
                .bind(ns.as_str())
                .fetch_one(&mut *tx)
                .await?;
        if existing > 0 {
            return Ok(false);
        }

        let now = Utc::now().to_rfc3339();
        let mut written = 0usize;
        for (key, value) in docs {
            let body =
                serde_json::to_string(value).map_err(|e| DbError::corrupt(ns.as_str(), key, e))?;

            sqlx::query(UPSERT_DOCUMENT)
                .bind(ns.as_str())
                .bind(key)
                .bind(&body)
                .bind(&now)
                .execute(&mut *tx)
                .await?;
            written += 1;
        }

        tx.commit().await?;

        debug!(namespace = %ns, count = written, "Namespace seeded");
        Ok(written > 0)
    }

    /// Reads one document. A missing key is `Ok(None)`.
    pub async fn get<T: DeserializeOwned>(&self, ns: Namespace, key: &str) -> DbResult<Option<T>> {
        let body: Option<String> =
            sqlx::query_scalar("SELECT body FROM documents WHERE namespace = ?1 AND key = ?2")
                .bind(ns.as_str())
                .bind(key)
                .fetch_optional(&self.pool)
                .await?;

        body.map(|body| decode(ns, key, &body)).transpose()
    }

    /// Every document in the namespace.
    ///
    /// Callers must not rely on the order.
    pub async fn list_all<T: DeserializeOwned>(&self, ns: Namespace) -> DbResult<Vec<T>> {
        let rows: Vec<(String, String)> =
            sqlx::query_as("SELECT key, body FROM documents WHERE namespace = ?1 ORDER BY rowid")
                .bind(ns.as_str())
                .fetch_all(&self.pool)
                .await?;

        debug!(namespace = %ns, count = rows.len(), "Listed documents");

        rows.iter()
            .map(|(key, body)| decode(ns, key, body))
            .collect()
    }

    /// Deletes a document. Returns whether one existed.
    pub async fn remove(&self, ns: Namespace, key: &str) -> DbResult<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE namespace = ?1 AND key = ?2")
            .bind(ns.as_str())
            .bind(key)
            .execute(&self.pool)
            .await?;

        let removed = result.rows_affected() > 0;
        debug!(namespace = %ns, key = %key, removed, "Document removed");
        Ok(removed)
    }

    pub async fn count(&self, ns: Namespace) -> DbResult<usize> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents WHERE namespace = ?1")
            .bind(ns.as_str())
            .fetch_one(&self.pool)
            .await?;

        Ok(count.max(0) as usize)
    }

    /// The initialization version tag, if the store has been initialized.
    pub async fn version(&self) -> DbResult<Option<String>> {
        let version = sqlx::query_scalar("SELECT value FROM store_meta WHERE key = ?1")
            .bind(VERSION_KEY)
            .fetch_optional(&self.pool)
            .await?;

        Ok(version)
    }

    /// Writes the version tag on a fresh store; leaves an existing tag alone.
    pub(crate) async fn init_version(&self) -> DbResult<()> {
        let result = sqlx::query("INSERT OR IGNORE INTO store_meta (key, value) VALUES (?1, ?2)")
            .bind(VERSION_KEY)
            .bind(STORE_VERSION)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() > 0 {
            info!(version = STORE_VERSION, "Initialized document store");
        }
        Ok(())
    }
}

fn decode<T: DeserializeOwned>(ns: Namespace, key: &str, body: &str) -> DbResult<T> {
    serde_json::from_str(body).map_err(|e| DbError::corrupt(ns.as_str(), key, e))
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Note {
        text: String,
    }

    fn note(text: &str) -> Note {
        Note {
            text: text.to_string(),
        }
    }

    async fn setup() -> DocumentStore {
        Database::new(DbConfig::in_memory()).await.unwrap().store()
    }

    #[tokio::test]
    async fn test_put_get_overwrite() {
        let store = setup().await;

        store.put(Namespace::Products, "k1", &note("first")).await.unwrap();
        store.put(Namespace::Products, "k1", &note("second")).await.unwrap();

        let got: Option<Note> = store.get(Namespace::Products, "k1").await.unwrap();
        assert_eq!(got, Some(note("second")));
        assert_eq!(store.count(Namespace::Products).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_missing_key_is_none() {
        let store = setup().await;
        let got: Option<Note> = store.get(Namespace::Customers, "nope").await.unwrap();
        assert!(got.is_none());
    }

    #[tokio::test]
    async fn test_namespaces_are_independent() {
        let store = setup().await;

        store.put(Namespace::Products, "same", &note("p")).await.unwrap();
        store.put(Namespace::Customers, "same", &note("c")).await.unwrap();

        let products: Vec<Note> = store.list_all(Namespace::Products).await.unwrap();
        assert_eq!(products, vec![note("p")]);
        assert_eq!(store.count(Namespace::Customers).await.unwrap(), 1);
        assert_eq!(store.count(Namespace::Invoices).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_remove_is_idempotent() {
        let store = setup().await;
        store.put(Namespace::Invoices, "i1", &note("x")).await.unwrap();

        assert!(store.remove(Namespace::Invoices, "i1").await.unwrap());
        assert!(!store.remove(Namespace::Invoices, "i1").await.unwrap());
        assert_eq!(store.count(Namespace::Invoices).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_undecodable_body_is_corrupt() {
        let store = setup().await;
        store.put(Namespace::Products, "k", &42).await.unwrap();

        let result: DbResult<Option<Note>> = store.get(Namespace::Products, "k").await;
        assert!(matches!(result, Err(DbError::Corrupt { .. })));
    }

    /// Serializes only when `ok`.
    struct Flaky {
        ok: bool,
    }

    impl Serialize for Flaky {
        fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
            if self.ok {
                s.serialize_bool(true)
            } else {
                Err(serde::ser::Error::custom("refused"))
            }
        }
    }

    #[tokio::test]
    async fn test_seed_if_empty_is_all_or_nothing() {
        let store = setup().await;
        let good = Flaky { ok: true };
        let bad = Flaky { ok: false };

        let result = store
            .seed_if_empty(Namespace::Products, [("a", &good), ("b", &good), ("c", &bad)])
            .await;
        assert!(matches!(result, Err(DbError::Corrupt { .. })));
        assert_eq!(store.count(Namespace::Products).await.unwrap(), 0);

        let seeded = store
            .seed_if_empty(Namespace::Products, [("a", &good), ("b", &good)])
            .await
            .unwrap();
        assert!(seeded);
        assert_eq!(store.count(Namespace::Products).await.unwrap(), 2);

        let again = store
            .seed_if_empty(Namespace::Products, [("z", &good)])
            .await
            .unwrap();
        assert!(!again);
        assert_eq!(store.count(Namespace::Products).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_version_tag_written_once() {
        let store = setup().await;
        assert_eq!(store.version().await.unwrap().as_deref(), Some(STORE_VERSION));

        store.init_version().await.unwrap();
        assert_eq!(store.version().await.unwrap().as_deref(), Some(STORE_VERSION));
    }
}
