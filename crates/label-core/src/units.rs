//! # Units Module
//!
//! The single conversion table between millimeters, print points and
//! screen pixels. Preview sizing and the production artifact both go
//! through these functions, so the two can never drift apart.
//!
//! ## Derivation
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1 inch = 25.4 mm = 72 pt = 96 px (CSS reference density)              │
//! │                                                                         │
//! │  MM_TO_PX = 96 / 25.4  ≈ 3.779527559                                    │
//! │  MM_TO_PT = 72 / 25.4  ≈ 2.834645669                                    │
//! │  PT_TO_PX = 96 / 72    ≈ 1.333333333                                    │
//! │                                                                         │
//! │  Every factor is derived from the three definitions above, never       │
//! │  typed in as a rounded literal.                                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

/// Millimeters per inch.
pub const MM_PER_INCH: f64 = 25.4;

/// Points per inch (1 pt = 1/72 in).
pub const POINTS_PER_INCH: f64 = 72.0;

/// Reference screen density (CSS px per inch).
pub const REFERENCE_DPI: f64 = 96.0;

/// 1 mm in px at the reference density.
pub const MM_TO_PX: f64 = REFERENCE_DPI / MM_PER_INCH;

/// 1 mm in pt.
pub const MM_TO_PT: f64 = POINTS_PER_INCH / MM_PER_INCH;

/// 1 pt in px at the reference density.
pub const PT_TO_PX: f64 = REFERENCE_DPI / POINTS_PER_INCH;

/// Converts millimeters to pixels.
#[inline]
pub fn mm_to_px(mm: f64) -> f64 {
    mm * MM_TO_PX
}

/// Converts pixels to millimeters.
#[inline]
pub fn px_to_mm(px: f64) -> f64 {
    px / MM_TO_PX
}

/// Converts millimeters to points.
#[inline]
pub fn mm_to_pt(mm: f64) -> f64 {
    mm * MM_TO_PT
}

/// Converts points to millimeters.
#[inline]
pub fn pt_to_mm(pt: f64) -> f64 {
    pt / MM_TO_PT
}

/// Converts points to pixels.
#[inline]
pub fn pt_to_px(pt: f64) -> f64 {
    pt * PT_TO_PX
}

/// Converts pixels to points.
#[inline]
pub fn px_to_pt(px: f64) -> f64 {
    px / PT_TO_PX
}
