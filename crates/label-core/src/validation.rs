//! # Validation Module
//!
//! Input rules for label configurations.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Configurator input (TypeScript)                              │
//! │  ├── maxLength=20 on the text field                                    │
//! │  └── +/- buttons bounded to 1..99                                      │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: THIS MODULE                                                  │
//! │  ├── normalize_text (trim, collapse, upper-case)                       │
//! │  └── text / quantity / color rules                                     │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Remote cart                                                  │
//! │  └── userErrors for anything it rejects                                │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use label_core::validation::{normalize_text, validate_quantity};
//!
//! assert_eq!(normalize_text("  müller   str "), "MÜLLER STR");
//! assert!(validate_quantity(5).is_ok());
//! ```

use crate::error::ValidationError;
use crate::{MAX_QUANTITY, MAX_TEXT_CHARS, MIN_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

// =============================================================================
// Text
// =============================================================================

/// Normalizes raw input into the display string of a label.
///
/// ## Rules
/// - Leading/trailing whitespace removed
/// - Internal whitespace runs collapsed to one space
/// - Upper-cased with full Unicode case mapping, so `ß` becomes `SS`
///   the way the German locale upper-cases it
pub fn normalize_text(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Validates normalized label text.
///
/// ## Rules
/// - Must not be empty
/// - At most 20 characters (counted as chars, not bytes: "Ü" is one)
///
/// ## Example
/// ```rust
/// use label_core::validation::validate_text;
///
/// assert!(validate_text("15A").is_ok());
/// assert!(validate_text("").is_err());
/// ```
pub fn validate_text(text: &str) -> ValidationResult<()> {
    if text.trim().is_empty() {
        return Err(ValidationError::Required {
            field: "text".to_string(),
        });
    }

    if text.chars().count() > MAX_TEXT_CHARS {
        return Err(ValidationError::TooLong {
            field: "text".to_string(),
            max: MAX_TEXT_CHARS,
        });
    }

    Ok(())
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a quantity value.
///
/// ## Rules
/// - 1..=99
/// - Zero is NOT a removal request here; removal is always explicit
///
/// ## User Workflow
/// ```text
/// ┌─────────────────────────────────────────────────────────────────────────┐
/// │  Cart drawer: quantity stepper                                          │
/// │                                                                         │
/// │  User taps "-" on a line with quantity 1                               │
/// │       │                                                                 │
/// │       ▼                                                                 │
/// │  UI decides: call remove(line) instead of update(line, 0)              │
/// │                                                                         │
/// │  update(line, 0) reaching this function → OutOfRange                   │
/// └─────────────────────────────────────────────────────────────────────────┘
/// ```
pub fn validate_quantity(qty: u32) -> ValidationResult<()> {
    if !(MIN_QUANTITY..=MAX_QUANTITY).contains(&qty) {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: MIN_QUANTITY as i64,
            max: MAX_QUANTITY as i64,
        });
    }

    Ok(())
}

/// Validates a `#rrggbb` color.
pub fn validate_color(color: &str) -> ValidationResult<()> {
    let hex = color.strip_prefix('#').ok_or_else(|| ValidationError::InvalidFormat {
        field: "color".to_string(),
        reason: "must start with '#'".to_string(),
    })?;

    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::InvalidFormat {
            field: "color".to_string(),
            reason: "must be six hex digits".to_string(),
        });
    }

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_text() {
        assert_eq!(normalize_text("müller"), "MÜLLER");
        assert_eq!(normalize_text("  15a  "), "15A");
        assert_eq!(normalize_text("haus \t  nr\n 3"), "HAUS NR 3");
        assert_eq!(normalize_text("straße"), "STRASSE");
        assert_eq!(normalize_text("   "), "");
    }

    #[test]
    fn test_validate_text() {
        assert!(validate_text("MÜLLER").is_ok());
        assert_eq!(
            validate_text(""),
            Err(ValidationError::Required {
                field: "text".to_string()
            })
        );
        // 20 multi-byte chars are still within bounds
        assert!(validate_text(&"Ü".repeat(20)).is_ok());
        assert!(validate_text(&"A".repeat(21)).is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(99).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(100).is_err());
    }

    #[test]
    fn test_validate_color() {
        assert!(validate_color("#000000").is_ok());
        assert!(validate_color("#A1b2C3").is_ok());
        assert!(validate_color("000000").is_err());
        assert!(validate_color("#0000").is_err());
        assert!(validate_color("#GG0000").is_err());
    }
}
