//! # Starter Data
//!
//! Fills an empty product or customer namespace with a small, realistic
//! catalogue the first time it is listed, so a new shop opens onto
//! something usable.
//!
//! ```text
//! list products ──► count == 0 ? ──yes──► put 5 starter products ──► list
//!                        │
//!                        no ─────────────────────────────────────────► list
//! ```
//!
//! Invoices are never seeded. The check and the inserts are not atomic;
//! there is a single local caller.

use khata_core::{Customer, Product};
use tracing::info;
use uuid::Uuid;

use crate::error::DbResult;
use crate::store::{DocumentStore, Namespace};

/// (name, sku, price paise, cost paise, stock)
const STARTER_PRODUCTS: &[(&str, &str, i64, i64, i64)] = &[
    ("Prestige Pressure Cooker 5L", "PC-5L", 249_900, 180_000, 12),
    ("Steel Tiffin Box 3 Tier", "TIF-3T", 54_900, 32_000, 25),
    ("Redmi Buds Wireless Earphones", "EAR-RB", 89_999, 62_000, 4),
    ("Tata Tea Gold 500g", "TEA-500", 28_500, 23_000, 40),
    ("Havells Ceiling Fan 1200mm", "FAN-1200", 219_900, 165_000, 3),
];

/// (name, phone, address)
const STARTER_CUSTOMERS: &[(&str, &str, &str)] = &[
    ("Asha Verma", "9876543210", "14 MG Road, Bengaluru 560001"),
    ("Rahul Mehta", "9123456780", "B-22 Andheri East, Mumbai 400069"),
    ("Sunita Iyer", "9988776655", "7 Anna Salai, Chennai 600002"),
];

/// The starter products, each under a fresh identifier.
pub fn starter_products() -> Vec<Product> {
    STARTER_PRODUCTS
        .iter()
        .map(|&(name, sku, price_paise, cost_paise, stock_qty)| Product {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            sku: sku.to_string(),
            price_paise,
            cost_paise,
            stock_qty,
            image_url: None,
        })
        .collect()
}

pub fn starter_customers() -> Vec<Customer> {
    STARTER_CUSTOMERS
        .iter()
        .map(|&(name, phone, address)| Customer {
            id: Uuid::new_v4().to_string(),
            name: name.to_string(),
            phone: phone.to_string(),
            address: address.to_string(),
        })
        .collect()
}

/// Seeds products when the namespace is empty. Returns whether it did.
///
/// All five land together or not at all.
pub async fn ensure_products(store: &DocumentStore) -> DbResult<bool> {
    let products = starter_products();
    let seeded = store
        .seed_if_empty(
            Namespace::Products,
            products.iter().map(|p| (p.id.as_str(), p)),
        )
        .await?;

    if seeded {
        info!(count = products.len(), "Seeded starter products");
    }
    Ok(seeded)
}

/// Seeds customers when the namespace is empty. Returns whether it did.
pub async fn ensure_customers(store: &DocumentStore) -> DbResult<bool> {
    let customers = starter_customers();
    let seeded = store
        .seed_if_empty(
            Namespace::Customers,
            customers.iter().map(|c| (c.id.as_str(), c)),
        )
        .await?;

    if seeded {
        info!(count = customers.len(), "Seeded starter customers");
    }
    Ok(seeded)
}
