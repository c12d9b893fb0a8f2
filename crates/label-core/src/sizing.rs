//! # Sizing Engine
//!
//! Picks the largest readable font size at which a label text still fits
//! its preview box, and lets the customer nudge it up or down in whole
//! print-point steps without ever breaking the fit.
//!
//! ## Algorithm
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                          fit(text, box, steps)                          │
//! │                                                                         │
//! │  available = box_width - box_padding                                    │
//! │                                                                         │
//! │  Phase 1: base fit (linear scan, 1 px at a time)                        │
//! │  ┌────────────────────────────────────────────────────────────────┐    │
//! │  │  px = min_px                                                    │    │
//! │  │  while px < max_px && width(text, px + 1) <= available: px += 1 │    │
//! │  └────────────────────────────────────────────────────────────────┘    │
//! │                               │ base_px                                 │
//! │                               ▼                                         │
//! │  Phase 2: user adjustment                                               │
//! │  ┌────────────────────────────────────────────────────────────────┐    │
//! │  │  pt  = clamp(px_to_pt(base_px) + steps × step_pt, min_pt, max_pt)│   │
//! │  │  px  = clamp(round(pt_to_px(pt)), min_px, max_px)               │    │
//! │  │  while px > min_px && width(text, px) > available: px -= 1      │    │
//! │  └────────────────────────────────────────────────────────────────┘    │
//! │                               │                                         │
//! │                               ▼                                         │
//! │                FontSize { px, pt: px_to_pt(px) }                        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Whole Pixels
//! Adjusted sizes are rounded to whole pixels before the shrink loop. Every
//! candidate the engine ever measures is then an integer, which keeps the
//! result monotone in `user_steps` and makes `fit` idempotent on its own
//! output. The point value is always re-derived from the final pixel value.
//!
//! ## Measurement
//! Widths come from a [`TextMeasurer`]. A browser-backed measurer returns
//! `None` while the preview is not attached to a layout; the engine then
//! keeps the previous stable size rather than guessing.

use crate::label::{FontSize, LabelConfiguration};
use crate::units::{pt_to_px, px_to_pt};
use crate::validation::{normalize_text, ValidationResult};
use crate::PLACEHOLDER_TEXT;

// =============================================================================
// Text Measurement
// =============================================================================

/// Measures the rendered width of a single line of text.
pub trait TextMeasurer {
    /// Width in px of `text` rendered at `px` font size.
    ///
    /// Returns `None` when no measurement is possible right now.
    fn measure_width(&self, text: &str, px: f64) -> Option<f64>;
}

/// Average-advance width model for places without a rendering surface.
///
/// Every character advances `px × (char_width_factor + letter_spacing_em)`.
/// Condensed display faces such as Impact average a little over half an
/// em per glyph; the preview adds 0.02 em letter spacing on top.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DeterministicTextMeasurer {
    pub char_width_factor: f64,
    pub letter_spacing_em: f64,
}

impl Default for DeterministicTextMeasurer {
    fn default() -> Self {
        Self {
            char_width_factor: 0.55,
            letter_spacing_em: 0.02,
        }
    }
}

impl TextMeasurer for DeterministicTextMeasurer {
    fn measure_width(&self, text: &str, px: f64) -> Option<f64> {
        let chars = text.chars().count() as f64;
        Some(chars * px * (self.char_width_factor + self.letter_spacing_em))
    }
}

// =============================================================================
// Limits
// =============================================================================

/// Bounds of the preview font size.
///
/// Only the pixel bounds and the step are configured. The point bounds
/// are their exact conversions, so a size clamped in pixels is always
/// inside the point range too.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SizingLimits {
    /// Smallest size ever returned, in whole px.
    pub min_px: f64,
    /// Largest size ever returned, in whole px.
    pub max_px: f64,
    /// One user adjustment step, in pt.
    pub step_pt: f64,
}

impl Default for SizingLimits {
    fn default() -> Self {
        Self {
            min_px: 14.0,
            max_px: 56.0,
            step_pt: 5.0,
        }
    }
}

impl SizingLimits {
    pub fn min_pt(&self) -> f64 {
        px_to_pt(self.min_px)
    }

    pub fn max_pt(&self) -> f64 {
        px_to_pt(self.max_px)
    }
}

// =============================================================================
// Engine
// =============================================================================

/// Size the preview starts at before the first fit.
const INITIAL_PX: f64 = 36.0;

/// The auto-fit sizing engine. Stateless apart from its limits.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct SizingEngine {
    limits: SizingLimits,
}

impl SizingEngine {
    pub fn new(limits: SizingLimits) -> Self {
        Self { limits }
    }

    pub fn limits(&self) -> &SizingLimits {
        &self.limits
    }

    /// The size shown before anything was measured.
    pub fn initial_size(&self) -> FontSize {
        FontSize::from_px(INITIAL_PX.clamp(self.limits.min_px, self.limits.max_px))
    }

    /// Computes the font size for `text` in a box of `box_width` px.
    ///
    /// `user_steps` is the signed number of `step_pt` adjustments the
    /// customer made since the text last changed. `previous` is returned
    /// unchanged when the box or the measurement is unusable.
    ///
    /// The returned width stays within `box_width - box_padding` whenever
    /// the text fits at `min_px` at all. Text too long for that stays at
    /// `min_px`; use [`SizingEngine::fits`] to detect the overflow.
    pub fn fit<M: TextMeasurer + ?Sized>(
        &self,
        measurer: &M,
        text: &str,
        box_width: f64,
        box_padding: f64,
        user_steps: i32,
        previous: FontSize,
    ) -> FontSize {
        let Some(available) = available_width(box_width, box_padding) else {
            return previous;
        };
        let text = measured_text(text);
        let fits_at = |px: f64| {
            measurer
                .measure_width(text, px)
                .filter(|w| w.is_finite())
                .map(|w| w <= available)
        };
        let SizingLimits {
            min_px,
            max_px,
            step_pt,
        } = self.limits;

        // Phase 1
        if fits_at(min_px).is_none() {
            return previous;
        }
        let mut base = min_px;
        while base < max_px {
            let candidate = (base + 1.0).min(max_px);
            match fits_at(candidate) {
                Some(true) => base = candidate,
                Some(false) => break,
                None => return previous,
            }
        }

        // Phase 2
        let mut px = if user_steps == 0 {
            base
        } else {
            let adjusted_pt = (px_to_pt(base) + f64::from(user_steps) * step_pt)
                .clamp(self.limits.min_pt(), self.limits.max_pt());
            pt_to_px(adjusted_pt).round().clamp(min_px, max_px)
        };
        while px > min_px {
            match fits_at(px) {
                Some(true) => break,
                Some(false) => px = (px - 1.0).max(min_px),
                None => return previous,
            }
        }

        FontSize::from_px(px)
    }

    /// Whether one more `step_pt` increment above `current` would still fit.
    ///
    /// Uses the same padding as [`SizingEngine::fit`]. False when the
    /// next size would pass `max_px` or nothing can be measured.
    pub fn can_grow<M: TextMeasurer + ?Sized>(
        &self,
        measurer: &M,
        text: &str,
        box_width: f64,
        box_padding: f64,
        current: FontSize,
    ) -> bool {
        let next = pt_to_px(current.pt + self.limits.step_pt).round();
        if next > self.limits.max_px {
            return false;
        }
        self.fits(measurer, text, box_width, box_padding, FontSize::from_px(next))
            .unwrap_or(false)
    }

    /// Whether `text` at `size` fits the box; `None` when unmeasurable.
    pub fn fits<M: TextMeasurer + ?Sized>(
        &self,
        measurer: &M,
        text: &str,
        box_width: f64,
        box_padding: f64,
        size: FontSize,
    ) -> Option<bool> {
        let available = available_width(box_width, box_padding)?;
        measurer
            .measure_width(measured_text(text), size.px)
            .filter(|w| w.is_finite())
            .map(|w| w <= available)
    }
}

fn available_width(box_width: f64, box_padding: f64) -> Option<f64> {
    if !box_width.is_finite() || !box_padding.is_finite() || box_width <= 0.0 {
        return None;
    }
    let available = box_width - box_padding;
    (available > 0.0).then_some(available)
}

fn measured_text(text: &str) -> &str {
    if text.trim().is_empty() {
        PLACEHOLDER_TEXT
    } else {
        text
    }
}

// =============================================================================
// Sizing State
// =============================================================================

/// The configurator's sizing state: current text, user steps and the last
/// stable size.
///
/// ## Transitions
/// ```text
///   set_text (changed) ──► steps = 0
///   increase           ──► steps += 1, refit   (only if can_grow)
///   decrease           ──► steps -= 1, refit   (only above min_px)
///   refit              ──► current = fit(...)  (resize, font load)
/// ```
///
/// After every refit, `user_steps` is pulled toward zero past any step
/// that no longer changes the size (clamped by the bounds or the box), so
/// each accepted +/- moves the size.
#[derive(Debug, Clone)]
pub struct SizingState {
    engine: SizingEngine,
    text: String,
    user_steps: i32,
    current: FontSize,
}

impl SizingState {
    pub fn new(engine: SizingEngine) -> Self {
        Self {
            current: engine.initial_size(),
            engine,
            text: String::new(),
            user_steps: 0,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn user_steps(&self) -> i32 {
        self.user_steps
    }

    pub fn current(&self) -> FontSize {
        self.current
    }

    /// Stores the normalized text. Returns true when it changed, in which
    /// case the user adjustment is reset.
    pub fn set_text(&mut self, raw: &str) -> bool {
        let normalized = normalize_text(raw);
        if normalized == self.text {
            return false;
        }
        self.text = normalized;
        self.user_steps = 0;
        true
    }

    /// Re-runs the fit for the current box and keeps the result.
    pub fn refit<M: TextMeasurer + ?Sized>(
        &mut self,
        measurer: &M,
        box_width: f64,
        box_padding: f64,
    ) -> FontSize {
        let fitted = self.fit_with(measurer, box_width, box_padding, self.user_steps);

        let measurable = self
            .engine
            .fits(measurer, &self.text, box_width, box_padding, fitted)
            .is_some();
        if measurable {
            while self.user_steps != 0 {
                let toward_base = self.user_steps - self.user_steps.signum();
                if self.fit_with(measurer, box_width, box_padding, toward_base) != fitted {
                    break;
                }
                self.user_steps = toward_base;
            }
        }

        self.current = fitted;
        self.current
    }

    fn fit_with<M: TextMeasurer + ?Sized>(
        &self,
        measurer: &M,
        box_width: f64,
        box_padding: f64,
        user_steps: i32,
    ) -> FontSize {
        self.engine
            .fit(measurer, &self.text, box_width, box_padding, user_steps, self.current)
    }

    /// One step larger. Returns false (and changes nothing) when the next
    /// step would not fit or would not change the size.
    pub fn increase<M: TextMeasurer + ?Sized>(
        &mut self,
        measurer: &M,
        box_width: f64,
        box_padding: f64,
    ) -> bool {
        if !self
            .engine
            .can_grow(measurer, &self.text, box_width, box_padding, self.current)
        {
            return false;
        }
        self.step(measurer, box_width, box_padding, 1)
    }

    /// One step smaller. Returns false when the size cannot go lower.
    pub fn decrease<M: TextMeasurer + ?Sized>(
        &mut self,
        measurer: &M,
        box_width: f64,
        box_padding: f64,
    ) -> bool {
        if self.current.px <= self.engine.limits().min_px {
            return false;
        }
        self.step(measurer, box_width, box_padding, -1)
    }

    /// Applies one step; reverts and returns false if the size stayed.
    fn step<M: TextMeasurer + ?Sized>(
        &mut self,
        measurer: &M,
        box_width: f64,
        box_padding: f64,
        delta: i32,
    ) -> bool {
        let before = (self.current, self.user_steps);
        self.user_steps += delta;
        self.refit(measurer, box_width, box_padding);
        if self.current == before.0 {
            (self.current, self.user_steps) = before;
            return false;
        }
        true
    }

    /// Captures the current text and memoized size as a configuration.
    pub fn configuration(&self, quantity: u32) -> ValidationResult<LabelConfiguration> {
        LabelConfiguration::new(&self.text, self.current, quantity)
    }
}

impl Default for SizingState {
    fn default() -> Self {
        Self::new(SizingEngine::default())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    /// Layout not attached yet.
    struct Detached;

    impl TextMeasurer for Detached {
        fn measure_width(&self, _text: &str, _px: f64) -> Option<f64> {
            None
        }
    }

    const PADDING: f64 = 16.0;

    fn measurer() -> DeterministicTextMeasurer {
        DeterministicTextMeasurer::default()
    }

    fn fit(text: &str, width: f64, steps: i32) -> FontSize {
        let engine = SizingEngine::default();
        engine.fit(&measurer(), text, width, PADDING, steps, engine.initial_size())
    }

    fn width_at(text: &str, px: f64) -> f64 {
        measurer().measure_width(text, px).unwrap()
    }

    #[test]
    fn test_fit_stays_within_box() {
        let texts = ["A", "15A", "MÜLLER", "FAMILIE SCHMIDT", "HAUPTSTRASSE 128 B"];
        for text in texts {
            for width in [120.0, 180.0, 240.0, 300.0, 480.0] {
                for steps in -4..=6 {
                    let size = fit(text, width, steps);
                    if width_at(text, 14.0) <= width - PADDING {
                        assert!(
                            width_at(text, size.px) <= width - PADDING,
                            "{text} at {width} with {steps} steps overflows"
                        );
                    }
                }
            }
        }
    }

    #[test]
    fn test_base_fit_is_largest_fitting_whole_px() {
        // 6 chars × 0.57 = 3.42 px per px; 184 / 3.42 = 53.8
        let size = fit("MÜLLER", 200.0, 0);
        assert_eq!(size.px, 53.0);
        assert!(width_at("MÜLLER", 54.0) > 200.0 - PADDING);
    }

    #[test]
    fn test_short_text_caps_at_max() {
        assert_eq!(fit("A", 400.0, 0).px, 56.0);
        assert_eq!(fit("A", 400.0, 3).px, 56.0);
    }

    #[test]
    fn test_too_long_text_stays_at_min() {
        let engine = SizingEngine::default();
        let text = "HAUPTSTRASSE 128 B";
        let size = engine.fit(&measurer(), text, 100.0, PADDING, 0, engine.initial_size());
        assert_eq!(size.px, 14.0);
        assert_eq!(engine.fits(&measurer(), text, 100.0, PADDING, size), Some(false));
    }

    #[test]
    fn test_pt_is_exact_conversion() {
        for steps in -5..=5 {
            let size = fit("MÜLLER", 260.0, steps);
            assert_eq!(size.pt, px_to_pt(size.px));
        }
    }

    #[test]
    fn test_pt_bounds_hold_for_any_steps() {
        let limits = SizingLimits::default();
        for steps in [-100, -10, -1, 0, 1, 10, 100] {
            let size = fit("15A", 300.0, steps);
            assert!(size.pt >= limits.min_pt() && size.pt <= limits.max_pt());
            assert!(size.px >= limits.min_px && size.px <= limits.max_px);
        }
    }

    #[test]
    fn test_monotone_in_user_steps() {
        for text in ["15A", "MÜLLER", "FAMILIE SCHMIDT"] {
            let mut last = 0.0;
            for steps in -8..=8 {
                let size = fit(text, 240.0, steps);
                assert!(size.px >= last, "{text}: {steps} steps shrank");
                last = size.px;
            }
        }
    }

    #[test]
    fn test_monotone_in_box_width() {
        for text in ["A", "15A", "MÜLLER", "FAMILIE SCHMIDT", "HAUPTSTRASSE 128 B"] {
            for steps in [-4, -1, 0, 1, 3] {
                let mut last = 0.0;
                let mut width = 40.0;
                while width <= 640.0 {
                    let size = fit(text, width, steps);
                    assert!(
                        size.px >= last,
                        "{text} with {steps} steps shrank at width {width}"
                    );
                    last = size.px;
                    width += 5.0;
                }
            }
        }
    }

    #[test]
    fn test_fit_is_idempotent() {
        let engine = SizingEngine::default();
        for steps in -3..=3 {
            let first = engine.fit(&measurer(), "MÜLLER", 260.0, PADDING, steps, engine.initial_size());
            let second = engine.fit(&measurer(), "MÜLLER", 260.0, PADDING, steps, first);
            assert_eq!(first, second);
        }
    }

    #[test]
    fn test_negative_step_lowers_size() {
        let base = fit("MÜLLER", 200.0, 0);
        let smaller = fit("MÜLLER", 200.0, -1);
        // 53 px = 39.75 pt; -5 pt = 34.75 pt = 46.33 px → 46
        assert_eq!(smaller.px, 46.0);
        assert!(smaller.px < base.px);
    }

    #[test]
    fn test_unavailable_measurement_keeps_previous() {
        let engine = SizingEngine::default();
        let previous = FontSize::from_px(33.0);

        assert_eq!(engine.fit(&Detached, "MÜLLER", 300.0, PADDING, 0, previous), previous);
        assert_eq!(engine.fit(&measurer(), "MÜLLER", 0.0, PADDING, 0, previous), previous);
        assert_eq!(engine.fit(&measurer(), "MÜLLER", 10.0, PADDING, 0, previous), previous);
        assert_eq!(engine.fit(&measurer(), "MÜLLER", f64::NAN, PADDING, 0, previous), previous);
        assert!(!engine.can_grow(&Detached, "MÜLLER", 300.0, PADDING, previous));
    }

    #[test]
    fn test_empty_text_measures_placeholder() {
        assert_eq!(fit("", 240.0, 0), fit(PLACEHOLDER_TEXT, 240.0, 0));
        assert_eq!(fit("   ", 240.0, 0), fit(PLACEHOLDER_TEXT, 240.0, 0));
    }

    #[test]
    fn test_can_grow_uses_fit_padding() {
        let engine = SizingEngine::default();
        let size = fit("MÜLLER", 200.0, 0);
        // base is the largest fitting px, one step up cannot fit
        assert!(!engine.can_grow(&measurer(), "MÜLLER", 200.0, PADDING, size));

        let smaller = fit("MÜLLER", 200.0, -2);
        assert!(engine.can_grow(&measurer(), "MÜLLER", 200.0, PADDING, smaller));

        let max = FontSize::from_px(56.0);
        assert!(!engine.can_grow(&measurer(), "A", 1000.0, PADDING, max));
    }

    #[test]
    fn test_state_resets_steps_on_text_change() {
        let mut state = SizingState::default();
        assert!(state.set_text("müller"));
        state.refit(&measurer(), 200.0, PADDING);
        assert!(state.decrease(&measurer(), 200.0, PADDING));
        assert_eq!(state.user_steps(), -1);

        // same text after normalization is not a change
        assert!(!state.set_text("  MÜLLER "));
        assert_eq!(state.user_steps(), -1);

        assert!(state.set_text("15a"));
        assert_eq!(state.user_steps(), 0);
        assert_eq!(state.text(), "15A");
    }

    #[test]
    fn test_state_increase_stops_at_fit() {
        let mut state = SizingState::default();
        state.set_text("MÜLLER");
        let base = state.refit(&measurer(), 200.0, PADDING);

        assert!(!state.increase(&measurer(), 200.0, PADDING));
        assert_eq!(state.current(), base);
        assert_eq!(state.user_steps(), 0);

        assert!(state.decrease(&measurer(), 200.0, PADDING));
        assert!(state.increase(&measurer(), 200.0, PADDING));
        assert_eq!(state.current(), base);
    }

    #[test]
    fn test_state_decrease_stops_at_min() {
        let mut state = SizingState::default();
        state.set_text("HAUPTSTRASSE 128 B");
        state.refit(&measurer(), 100.0, PADDING);
        assert_eq!(state.current().px, 14.0);
        assert!(!state.decrease(&measurer(), 100.0, PADDING));
    }

    #[test]
    fn test_state_steps_follow_narrowed_box() {
        let mut state = SizingState::default();
        state.set_text("MÜLLER");
        state.refit(&measurer(), 200.0, PADDING);
        for _ in 0..3 {
            assert!(state.decrease(&measurer(), 200.0, PADDING));
        }
        assert_eq!(state.user_steps(), -3);
        assert_eq!(state.current().px, 33.0);

        // base drops to 25 px; three steps down would go below min_px
        state.refit(&measurer(), 103.0, PADDING);
        assert_eq!(state.current().px, 14.0);
        assert_eq!(state.user_steps(), -2);

        assert!(!state.decrease(&measurer(), 103.0, PADDING));
        assert!(state.increase(&measurer(), 103.0, PADDING));
        assert_eq!(state.current().px, 18.0);
        assert_eq!(state.user_steps(), -1);
    }

    #[test]
    fn test_state_accepted_steps_always_move_size() {
        let mut state = SizingState::default();
        state.set_text("FAMILIE SCHMIDT");
        for width in [480.0, 300.0, 150.0, 90.0, 220.0, 600.0] {
            state.refit(&measurer(), width, PADDING);
            for up in [false, false, true, false, true, true, true] {
                let before = state.current();
                let accepted = if up {
                    state.increase(&measurer(), width, PADDING)
                } else {
                    state.decrease(&measurer(), width, PADDING)
                };
                if accepted {
                    assert_ne!(state.current(), before, "no-op step accepted at {width}");
                } else {
                    assert_eq!(state.current(), before);
                }
            }
        }
    }

    #[test]
    fn test_state_detached_refit_keeps_steps() {
        let mut state = SizingState::default();
        state.set_text("MÜLLER");
        state.refit(&measurer(), 200.0, PADDING);
        assert!(state.decrease(&measurer(), 200.0, PADDING));
        let size = state.current();

        assert_eq!(state.refit(&Detached, 200.0, PADDING), size);
        assert_eq!(state.user_steps(), -1);
        assert!(!state.decrease(&Detached, 200.0, PADDING));
        assert_eq!(state.user_steps(), -1);
    }

    #[test]
    fn test_state_captures_memoized_size() {
        let mut state = SizingState::default();
        state.set_text("müller");
        let size = state.refit(&measurer(), 200.0, PADDING);

        let config = state.configuration(2).unwrap();
        assert_eq!(config.text(), "MÜLLER");
        assert_eq!(config.font_size_px(), size.px);
        assert_eq!(config.font_size_pt(), size.pt);
        assert_eq!(config.quantity(), 2);

        let empty = SizingState::default();
        assert!(matches!(
            empty.configuration(1),
            Err(ValidationError::Required { .. })
        ));
    }
}
