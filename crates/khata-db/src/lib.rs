//! # khata-db: Local Persistence for Khata
//!
//! On-device storage for products, customers and invoices: a namespaced
//! JSON document store on SQLite, a per-entity query cache, and typed
//! repositories on top.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          Khata Data Flow                                │
//! │                                                                         │
//! │  UI collaborator (list products, save invoice, show dashboard)         │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     khata-db (THIS CRATE)                       │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories │    │  QueryCache  │  │   │
//! │  │   │   (pool.rs)   │───►│ ProductRepo   │◄──►│  (dashmap)   │  │   │
//! │  │   │               │    │ CustomerRepo  │    │  per entity  │  │   │
//! │  │   │ SqlitePool    │    │ InvoiceRepo   │    └──────────────┘  │   │
//! │  │   └───────────────┘    └───────┬───────┘                       │   │
//! │  │                                │   seed on first empty read    │   │
//! │  │                        ┌───────▼───────┐                       │   │
//! │  │                        │ DocumentStore │                       │   │
//! │  │                        └───────────────┘                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite file (khata.db)                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool, [`Database`] handle, [`DbConfig`]
//! - [`store`] - Namespaced document persistence
//! - [`cache`] - Listing cache with staleness window
//! - [`repository`] - Product, customer and invoice repositories
//! - [`seed`] - Starter records for an empty store
//! - [`config`] - Shop settings from the environment
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Database error types
//!
//! ## Usage
//!
//! ```rust,ignore
//! use khata_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("khata.db")).await?;
//!
//! let products = db.products().list().await?;   // seeds on first run
//! let summary = db.dashboard().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cache;
pub mod config;
pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod seed;
pub mod store;

// =============================================================================
// Re-exports
// =============================================================================

pub use cache::QueryCache;
pub use config::{CacheConfig, ShopConfig};
pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};
pub use store::{DocumentStore, Namespace};

pub use repository::customer::CustomerRepository;
pub use repository::invoice::InvoiceRepository;
pub use repository::product::ProductRepository;
