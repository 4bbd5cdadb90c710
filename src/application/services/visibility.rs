//! One-shot viewport visibility detection.
//!
//! A gate observes the vertical span an asset card occupies against the
//! current viewport and flips exactly once, slightly ahead of the card
//! actually scrolling into view. Priority assets bypass observation.

/// Rows of lookahead added around the viewport before testing
/// intersection, so loads start just before a card scrolls into view.
pub const DEFAULT_LOOKAHEAD_ROWS: usize = 5;

/// Minimal fraction of a card that must intersect the expanded viewport.
pub const DEFAULT_MIN_VISIBLE_RATIO: f32 = 0.1;

/// Vertical span of rows occupied by an item or a viewport.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RowSpan {
    /// First row of the span.
    pub top: usize,
    /// Number of rows covered.
    pub height: usize,
}

impl RowSpan {
    /// Creates a span starting at `top` covering `height` rows.
    #[must_use]
    pub const fn new(top: usize, height: usize) -> Self {
        Self { top, height }
    }

    /// Exclusive bottom row.
    #[must_use]
    pub const fn bottom(&self) -> usize {
        self.top + self.height
    }

    /// Number of rows shared with `other`.
    #[must_use]
    pub fn overlap(&self, other: &Self) -> usize {
        self.bottom()
            .min(other.bottom())
            .saturating_sub(self.top.max(other.top))
    }
}

/// Observation parameters for a visibility gate.
#[derive(Debug, Clone, Copy)]
pub struct ObserverConfig {
    /// Lookahead margin in rows.
    pub lookahead_rows: usize,
    /// Minimal visible fraction that counts as an intersection.
    pub min_visible_ratio: f32,
}

impl Default for ObserverConfig {
    fn default() -> Self {
        Self {
            lookahead_rows: DEFAULT_LOOKAHEAD_ROWS,
            min_visible_ratio: DEFAULT_MIN_VISIBLE_RATIO,
        }
    }
}

/// One-shot gate deciding when an asset enters the viewing region.
///
/// The entered flag is monotonic: once true it never resets, and further
/// observations are ignored. Callers without any layout information
/// construct the gate with [`VisibilityGate::assume_visible`], degrading
/// to immediately-visible rather than stalling loads forever.
#[derive(Debug, Clone)]
pub struct VisibilityGate {
    entered: bool,
    config: ObserverConfig,
}

impl VisibilityGate {
    /// Creates a gate. Priority gates are visible from the start and
    /// never observe.
    #[must_use]
    pub fn new(priority: bool) -> Self {
        Self::with_config(priority, ObserverConfig::default())
    }

    /// Creates a gate with explicit observation parameters.
    #[must_use]
    pub const fn with_config(priority: bool, config: ObserverConfig) -> Self {
        Self {
            entered: priority,
            config,
        }
    }

    /// Creates a gate that is already visible. Used when no viewport
    /// information exists.
    #[must_use]
    pub fn assume_visible() -> Self {
        Self {
            entered: true,
            config: ObserverConfig::default(),
        }
    }

    /// Tests `item` against `viewport` expanded by the lookahead margin.
    ///
    /// Returns true only on the single transition into visibility.
    pub fn observe(&mut self, item: RowSpan, viewport: RowSpan) -> bool {
        if self.entered {
            return false;
        }

        let expanded = RowSpan::new(
            viewport.top.saturating_sub(self.config.lookahead_rows),
            viewport.height + 2 * self.config.lookahead_rows,
        );

        let qualifies = if item.height == 0 {
            item.top >= expanded.top && item.top < expanded.bottom()
        } else {
            #[allow(clippy::cast_precision_loss)]
            let ratio = item.overlap(&expanded) as f32 / item.height as f32;
            ratio >= self.config.min_visible_ratio
        };

        if qualifies {
            self.entered = true;
        }
        qualifies
    }

    /// Returns true once the item has entered the viewport.
    #[must_use]
    pub const fn has_entered(&self) -> bool {
        self.entered
    }
}
