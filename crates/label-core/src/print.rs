//! # Print Layout
//!
//! Physical geometry of the printed label and the page layout handed to
//! the production renderer.
//!
//! ## Label Geometry (millimeters)
//! ```text
//!  0    10                                                          280
//!  ┌────┬────────────────────────────────────────────────────────────┐ 0
//!  │ O  │   ┌────────────────────────────────────────────────────┐   │
//!  │ R  │   │                                                    │   │
//!  │ D  │   │               TEXT AREA 260 × 54                   │   │
//!  │ E  │   │                                                    │   │
//!  │ R  │   └────────────────────────────────────────────────────┘   │
//!  └────┴────────────────────────────────────────────────────────────┘ 66
//!   order
//!   number strip (10 mm)
//! ```
//!
//! All point values go through [`crate::units`], the same table the
//! preview uses.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::label::LabelConfiguration;
use crate::units::mm_to_pt;

// =============================================================================
// Dimensions
// =============================================================================

/// Physical label dimensions in millimeters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct LabelDimensions {
    pub width_mm: f64,
    pub height_mm: f64,
    pub order_number_width_mm: f64,
    pub text_max_width_mm: f64,
    pub text_max_height_mm: f64,
}

/// The label the shop prints.
pub const PDF_DIMENSIONS: LabelDimensions = LabelDimensions {
    width_mm: 280.0,
    height_mm: 66.0,
    order_number_width_mm: 10.0,
    text_max_width_mm: 260.0,
    text_max_height_mm: 54.0,
};

/// Font size bounds of the production artifact, in points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct FontConstraints {
    pub min_size_pt: f64,
    pub max_size_pt: f64,
}

pub const FONT_CONSTRAINTS: FontConstraints = FontConstraints {
    min_size_pt: 40.0,
    max_size_pt: 700.0,
};

impl FontConstraints {
    pub fn clamp(&self, pt: f64) -> f64 {
        pt.clamp(self.min_size_pt, self.max_size_pt)
    }

    pub fn contains(&self, pt: f64) -> bool {
        (self.min_size_pt..=self.max_size_pt).contains(&pt)
    }
}

// =============================================================================
// Layout
// =============================================================================

/// An axis-aligned box in points, origin top-left.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PrintRect {
    pub x_pt: f64,
    pub y_pt: f64,
    pub width_pt: f64,
    pub height_pt: f64,
}

impl PrintRect {
    fn from_mm(x: f64, y: f64, width: f64, height: f64) -> Self {
        PrintRect {
            x_pt: mm_to_pt(x),
            y_pt: mm_to_pt(y),
            width_pt: mm_to_pt(width),
            height_pt: mm_to_pt(height),
        }
    }
}

/// Everything the production renderer needs for one label.
///
/// The text box is centered in the area right of the order-number strip.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct PrintLayout {
    pub page_width_pt: f64,
    pub page_height_pt: f64,
    pub order_number_strip: PrintRect,
    pub text_box: PrintRect,
    pub text: String,
    pub font_size_pt: f64,
    pub font_family: String,
    pub color: String,
    pub copies: u32,
}

impl PrintLayout {
    /// Lays out a configuration on the standard label.
    pub fn for_configuration(config: &LabelConfiguration) -> Self {
        Self::with_dimensions(config, &PDF_DIMENSIONS)
    }

    pub fn with_dimensions(config: &LabelConfiguration, dims: &LabelDimensions) -> Self {
        let right_width = dims.width_mm - dims.order_number_width_mm;
        let text_x = dims.order_number_width_mm + (right_width - dims.text_max_width_mm) / 2.0;
        let text_y = (dims.height_mm - dims.text_max_height_mm) / 2.0;

        PrintLayout {
            page_width_pt: mm_to_pt(dims.width_mm),
            page_height_pt: mm_to_pt(dims.height_mm),
            order_number_strip: PrintRect::from_mm(0.0, 0.0, dims.order_number_width_mm, dims.height_mm),
            text_box: PrintRect::from_mm(text_x, text_y, dims.text_max_width_mm, dims.text_max_height_mm),
            text: config.text().to_string(),
            font_size_pt: config.font_size_pt(),
            font_family: config.font_family().to_string(),
            color: config.color().to_string(),
            copies: config.quantity(),
        }
    }
}

// =============================================================================
// Server-Side Estimate
// =============================================================================

/// Average glyph advance of the condensed print face, in em.
const AVG_CHAR_WIDTH_RATIO: f64 = 0.7;

/// Rough largest point size at which `text` fits `max_width_mm`.
///
/// An estimate without font metrics, clamped to [`FONT_CONSTRAINTS`].
/// Returns 0 for empty text.
pub fn estimate_max_font_size_pt(text: &str, max_width_mm: f64) -> f64 {
    let chars = text.chars().count();
    if chars == 0 {
        return 0.0;
    }
    let estimate = mm_to_pt(max_width_mm) / chars as f64 / AVG_CHAR_WIDTH_RATIO;
    FONT_CONSTRAINTS.clamp(estimate)
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::label::FontSize;

    const EPS: f64 = 1e-9;

    #[test]
    fn test_page_size_in_points() {
        let config = LabelConfiguration::new("MÜLLER", FontSize::from_px(48.0), 2).unwrap();
        let layout = PrintLayout::for_configuration(&config);

        assert!((layout.page_width_pt - 280.0 * 72.0 / 25.4).abs() < EPS);
        assert!((layout.page_height_pt - 66.0 * 72.0 / 25.4).abs() < EPS);
    }

    #[test]
    fn test_text_box_is_centered_right_of_strip() {
        let config = LabelConfiguration::new("15A", FontSize::from_px(40.0), 1).unwrap();
        let layout = PrintLayout::for_configuration(&config);

        assert!((layout.text_box.x_pt - mm_to_pt(15.0)).abs() < EPS);
        assert!((layout.text_box.y_pt - mm_to_pt(6.0)).abs() < EPS);
        assert!((layout.text_box.width_pt - mm_to_pt(260.0)).abs() < EPS);
        assert!((layout.order_number_strip.width_pt - mm_to_pt(10.0)).abs() < EPS);

        let right_edge = layout.text_box.x_pt + layout.text_box.width_pt;
        assert!(right_edge <= layout.page_width_pt);
    }

    #[test]
    fn test_layout_uses_stored_font_size() {
        let config = LabelConfiguration::new("MÜLLER", FontSize::from_px(48.0), 3).unwrap();
        let layout = PrintLayout::for_configuration(&config);

        assert_eq!(layout.font_size_pt, config.font_size_pt());
        assert_eq!(layout.text, "MÜLLER");
        assert_eq!(layout.copies, 3);
    }

    #[test]
    fn test_estimate() {
        assert_eq!(estimate_max_font_size_pt("", 260.0), 0.0);

        // 260 mm = 737 pt; 10 chars → 105.3 pt
        let pt = estimate_max_font_size_pt("ABCDEFGHIJ", 260.0);
        assert!((pt - mm_to_pt(260.0) / 10.0 / 0.7).abs() < EPS);

        assert_eq!(estimate_max_font_size_pt("A", 260.0), 700.0);
        assert_eq!(estimate_max_font_size_pt(&"A".repeat(40), 260.0), 40.0);
    }

    #[test]
    fn test_font_constraints() {
        assert!(FONT_CONSTRAINTS.contains(40.0));
        assert!(FONT_CONSTRAINTS.contains(700.0));
        assert!(!FONT_CONSTRAINTS.contains(39.9));
        assert_eq!(FONT_CONSTRAINTS.clamp(1000.0), 700.0);
    }
}
