//! # Runtime Configuration
//!
//! Shop-level settings read once at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`KHATA_*`)
//! 2. Defaults (this file)
//!
//! A malformed environment value is logged and the default kept.

use std::path::PathBuf;
use std::time::Duration;

use khata_core::{InvoiceDraft, TaxRate, LOW_STOCK_THRESHOLD};
use serde::{Deserialize, Serialize};
use tracing::warn;

/// Query cache settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheConfig {
    /// How long a cached listing is served without re-reading the store.
    /// Default: 60 seconds
    pub staleness_window: Duration,
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig {
            staleness_window: Duration::from_secs(60),
        }
    }
}

/// Shop configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopConfig {
    /// Name printed on invoices
    pub shop_name: String,

    /// SQLite file holding the document store
    pub database_path: PathBuf,

    /// Seconds a cached listing stays fresh
    pub staleness_secs: u64,

    /// GST rate applied when the invoice editor's toggle is on.
    /// e.g., 1800 = 18%
    pub gst_rate_bps: u32,

    /// Products below this stock level count as low stock
    pub low_stock_threshold: i64,

    pub currency_symbol: String,
}

impl Default for ShopConfig {
    fn default() -> Self {
        ShopConfig {
            shop_name: "Khata Store".to_string(),
            database_path: PathBuf::from("./khata.db"),
            staleness_secs: 60,
            gst_rate_bps: TaxRate::GST_STANDARD.bps(),
            low_stock_threshold: LOW_STOCK_THRESHOLD,
            currency_symbol: "₹".to_string(),
        }
    }
}

impl ShopConfig {
    /// Creates a ShopConfig from environment variables and defaults.
    ///
    /// ## Environment Variables
    /// - `KHATA_SHOP_NAME`: Override shop name
    /// - `KHATA_DB_PATH`: Override database file
    /// - `KHATA_STALE_SECS`: Cache staleness window in seconds
    /// - `KHATA_GST_BPS`: GST rate in basis points (e.g., "1200")
    /// - `KHATA_LOW_STOCK`: Low-stock threshold
    /// - `KHATA_CURRENCY`: Symbol used by [`format_currency`](Self::format_currency)
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`from_env`](Self::from_env) over any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = ShopConfig::default();

        if let Some(name) = lookup("KHATA_SHOP_NAME") {
            config.shop_name = name;
        }

        if let Some(path) = lookup("KHATA_DB_PATH") {
            config.database_path = PathBuf::from(path);
        }

        if let Some(secs) = parse_var(&lookup, "KHATA_STALE_SECS") {
            config.staleness_secs = secs;
        }

        if let Some(bps) = parse_var(&lookup, "KHATA_GST_BPS") {
            config.gst_rate_bps = bps;
        }

        if let Some(threshold) = parse_var(&lookup, "KHATA_LOW_STOCK") {
            config.low_stock_threshold = threshold;
        }

        if let Some(symbol) = lookup("KHATA_CURRENCY").filter(|s| !s.trim().is_empty()) {
            config.currency_symbol = symbol.trim().to_string();
        }

        config
    }

    pub fn gst_rate(&self) -> TaxRate {
        TaxRate::from_bps(self.gst_rate_bps)
    }

    /// An empty invoice draft taxed at this shop's GST rate.
    pub fn new_draft(&self) -> InvoiceDraft {
        InvoiceDraft::new().with_tax_rate(self.gst_rate())
    }

    pub fn cache_config(&self) -> CacheConfig {
        CacheConfig {
            staleness_window: Duration::from_secs(self.staleness_secs),
        }
    }

    /// Formats a paise amount as a currency string.
    ///
    /// ## Example
    /// ```rust
    /// use khata_db::config::ShopConfig;
    ///
    /// let config = ShopConfig::default();
    /// assert_eq!(config.format_currency(123_456), "₹1234.56");
    /// ```
    pub fn format_currency(&self, paise: i64) -> String {
        let whole = paise / 100;
        let frac = (paise % 100).abs();

        format!(
            "{}{}{}.{:02}",
            if paise < 0 { "-" } else { "" },
            self.currency_symbol,
            whole.abs(),
            frac
        )
    }
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "Ignoring malformed setting");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_format_currency() {
        let config = ShopConfig::default();
        assert_eq!(config.format_currency(123_456), "₹1234.56");
        assert_eq!(config.format_currency(5), "₹0.05");
        assert_eq!(config.format_currency(0), "₹0.00");
        assert_eq!(config.format_currency(-1_250), "-₹12.50");
    }

    #[test]
    fn test_defaults() {
        let config = ShopConfig::from_lookup(|_| None);
        assert_eq!(config.gst_rate(), TaxRate::GST_STANDARD);
        assert_eq!(config.low_stock_threshold, 5);
        assert_eq!(
            config.cache_config().staleness_window,
            Duration::from_secs(60)
        );
    }

    #[test]
    fn test_overrides_and_malformed_values() {
        let config = ShopConfig::from_lookup(lookup_from(&[
            ("KHATA_SHOP_NAME", "Sharma General Store"),
            ("KHATA_GST_BPS", "1200"),
            ("KHATA_STALE_SECS", "soon"),
            ("KHATA_LOW_STOCK", "-"),
            ("KHATA_CURRENCY", " Rs. "),
        ]));

        assert_eq!(config.shop_name, "Sharma General Store");
        assert_eq!(config.gst_rate_bps, 1200);
        assert_eq!(config.staleness_secs, 60);
        assert_eq!(config.low_stock_threshold, 5);
        assert_eq!(config.format_currency(1_250), "Rs.12.50");
    }

    #[test]
    fn test_new_draft_uses_configured_gst() {
        let config = ShopConfig::from_lookup(lookup_from(&[("KHATA_GST_BPS", "1200")]));
        let mut draft = config.new_draft();
        draft.add_product(&khata_core::Product {
            id: "p1".to_string(),
            name: "Steel Tiffin".to_string(),
            sku: "TF-3".to_string(),
            price_paise: 50_000,
            cost_paise: 30_000,
            stock_qty: 8,
            image_url: None,
        });

        assert_eq!(draft.tax().paise(), 6_000);
        assert_eq!(draft.total().paise(), 56_000);
        assert_eq!(ShopConfig::default().new_draft().tax().paise(), 0);
    }
}
