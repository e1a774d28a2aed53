//! # Validation Module
//!
//! Field checks for Khata records.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: UI collaborator                                              │
//! │  ├── Phone pattern (validate_phone), required fields                   │
//! │  └── Immediate user feedback                                           │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Invoice editor (khata_core::invoice)                         │
//! │  └── Bad quantity/price entries are dropped, previous value kept       │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Repositories (khata-db)                                      │
//! │  └── Refuse records that break stored invariants                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use crate::error::ValidationError;

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// String Validators
// =============================================================================

/// Validates a SKU.
///
/// SKUs are free text; only emptiness and length are checked.
///
/// ```rust
/// use khata_core::validation::validate_sku;
///
/// assert!(validate_sku("PC-5L").is_ok());
/// assert!(validate_sku("Steel Tiffin 3 tier").is_ok());
/// assert!(validate_sku("  ").is_err());
/// ```
pub fn validate_sku(sku: &str) -> ValidationResult<()> {
    let sku = sku.trim();

    if sku.is_empty() {
        return Err(ValidationError::Required {
            field: "sku".to_string(),
        });
    }

    if sku.chars().count() > 50 {
        return Err(ValidationError::TooLong {
            field: "sku".to_string(),
            max: 50,
        });
    }

    Ok(())
}

/// Validates a product name: non-empty, at most 200 characters.
pub fn validate_product_name(name: &str) -> ValidationResult<()> {
    let name = name.trim();

    if name.is_empty() {
        return Err(ValidationError::Required {
            field: "name".to_string(),
        });
    }

    if name.chars().count() > 200 {
        return Err(ValidationError::TooLong {
            field: "name".to_string(),
            max: 200,
        });
    }

    Ok(())
}

/// Validates an Indian mobile number.
///
/// ## Rules
/// - Spaces and hyphens are ignored
/// - Optional `+91`, `91` or `0` prefix
/// - Ten digits starting with 6, 7, 8 or 9
///
/// The store never calls this; it is offered to the customer form.
///
/// ```rust
/// use khata_core::validation::validate_phone;
///
/// assert!(validate_phone("98765 43210").is_ok());
/// assert!(validate_phone("+91-9876543210").is_ok());
/// assert!(validate_phone("12345").is_err());
/// ```
pub fn validate_phone(phone: &str) -> ValidationResult<()> {
    let digits: String = phone
        .trim()
        .chars()
        .filter(|c| *c != ' ' && *c != '-')
        .collect();

    if digits.is_empty() {
        return Err(ValidationError::Required {
            field: "phone".to_string(),
        });
    }

    let local = digits
        .strip_prefix("+91")
        .or_else(|| (digits.len() == 12).then(|| digits.strip_prefix("91")).flatten())
        .or_else(|| (digits.len() == 11).then(|| digits.strip_prefix('0')).flatten())
        .unwrap_or(&digits);

    let well_formed = local.len() == 10
        && local.chars().all(|c| c.is_ascii_digit())
        && matches!(local.chars().next(), Some('6'..='9'));

    if !well_formed {
        return Err(ValidationError::InvalidFormat {
            field: "phone".to_string(),
            reason: "must be a 10-digit mobile number starting with 6-9".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates an invoice line quantity (at least 1).
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty < 1 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    Ok(())
}

/// Validates an amount in paise. Zero is allowed (free items, no tax).
///
/// ```rust
/// use khata_core::validation::validate_amount_paise;
///
/// assert!(validate_amount_paise("price", 89_999).is_ok());
/// assert!(validate_amount_paise("price", 0).is_ok());
/// assert!(validate_amount_paise("price", -100).is_err());
/// ```
pub fn validate_amount_paise(field: &str, paise: i64) -> ValidationResult<()> {
    if paise < 0 {
        return Err(ValidationError::OutOfRange {
            field: field.to_string(),
            min: 0,
            max: i64::MAX,
        });
    }

    Ok(())
}

/// Validates a stock level (zero or more).
pub fn validate_stock_qty(qty: i64) -> ValidationResult<()> {
    validate_amount_paise("stock", qty)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_sku() {
        assert!(validate_sku("PC-5L").is_ok());
        assert!(validate_sku("has space").is_ok());
        assert!(validate_sku("").is_err());
        assert!(validate_sku(&"A".repeat(51)).is_err());
    }

    #[test]
    fn test_validate_product_name() {
        assert!(validate_product_name("Steel Tiffin Box").is_ok());
        assert!(validate_product_name("").is_err());
        assert!(validate_product_name(&"A".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("9876543210").is_ok());
        assert!(validate_phone("+919876543210").is_ok());
        assert!(validate_phone("919876543210").is_ok());
        assert!(validate_phone("09876543210").is_ok());
        assert!(validate_phone("98765-43210").is_ok());

        assert!(validate_phone("").is_err());
        assert!(validate_phone("5876543210").is_err());
        assert!(validate_phone("98765432").is_err());
        assert!(validate_phone("98765abc10").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(250).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(-1).is_err());
    }

    #[test]
    fn test_validate_stock_qty() {
        assert!(validate_stock_qty(0).is_ok());
        assert!(validate_stock_qty(-3).is_err());
    }
}
