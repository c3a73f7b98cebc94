//! Bar rendering strategies.
//!
//! A [`BarRenderer`] turns a completion percentage into the interior cells of the
//! bar. The tracker owns exactly one renderer, chosen at construction, and wraps
//! whatever it returns in `[` `]`. New styles only need a new implementation of
//! the trait.

use std::fmt;

/// Default glyph for the filled part of a [`SimpleRenderer`] bar.
pub const DEFAULT_GLYPH: char = '#';

/// Turns a completion percentage into bar cells.
pub trait BarRenderer: fmt::Debug + Send {
    /// Renders `width` cells for `percent` (0..=100, values outside are clamped).
    ///
    /// Implementations must return exactly `width` characters.
    fn render(&self, percent: f64, width: usize) -> String;
}

/// Number of whole cells covered by `percent` of `width`, clamped to `[0, width]`.
#[allow(
    clippy::cast_possible_truncation,
    clippy::cast_precision_loss,
    clippy::cast_sign_loss
)]
#[must_use]
pub fn filled_cells(percent: f64, width: usize) -> usize {
    if !percent.is_finite() || percent <= 0.0 {
        return 0;
    }
    let cells = (percent / 100.0 * width as f64).floor();
    (cells as usize).min(width)
}

/// Fills completed cells with a single glyph and pads the rest with spaces.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct SimpleRenderer {
    glyph: char,
}

impl Default for SimpleRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_GLYPH)
    }
}

impl SimpleRenderer {
    /// Creates a renderer that draws completed cells with `glyph`.
    #[must_use]
    pub const fn new(glyph: char) -> Self {
        Self { glyph }
    }

    /// Returns the fill glyph.
    #[must_use]
    pub const fn glyph(&self) -> char {
        self.glyph
    }
}

impl BarRenderer for SimpleRenderer {
    fn render(&self, percent: f64, width: usize) -> String {
        let filled = filled_cells(percent, width);
        let mut bar = String::with_capacity(width * self.glyph.len_utf8());
        bar.extend(std::iter::repeat_n(self.glyph, filled));
        bar.extend(std::iter::repeat_n(' ', width - filled));
        bar
    }
}

/// Uses Unicode block elements so one cell can show eighths of progress.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct SubCellRenderer;

impl SubCellRenderer {
    const FULL: char = '█';
    // Index n holds the glyph for n/8 of a cell.
    const PARTIAL: [char; 8] = [' ', '▏', '▎', '▍', '▌', '▋', '▊', '▉'];
}

impl BarRenderer for SubCellRenderer {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_precision_loss,
        clippy::cast_sign_loss
    )]
    fn render(&self, percent: f64, width: usize) -> String {
        let eighths = if percent.is_finite() && percent > 0.0 {
            ((percent / 100.0 * (width * 8) as f64).floor() as usize).min(width * 8)
        } else {
            0
        };
        let full = eighths / 8;
        let mut bar = String::with_capacity(width * 3);
        bar.extend(std::iter::repeat_n(Self::FULL, full));
        let mut used = full;
        if full < width {
            bar.push(Self::PARTIAL[eighths % 8]);
            used += 1;
        }
        bar.extend(std::iter::repeat_n(' ', width - used));
        bar
    }
}

/// Serializable selector for the built-in renderers.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum RendererKind {
    /// [`SimpleRenderer`].
    #[default]
    Simple,
    /// [`SubCellRenderer`].
    SubCell,
}

impl RendererKind {
    /// Instantiates the selected renderer. `glyph` only applies to [`RendererKind::Simple`].
    #[must_use]
    pub fn instantiate(self, glyph: char) -> Box<dyn BarRenderer> {
        match self {
            Self::Simple => Box::new(SimpleRenderer::new(glyph)),
            Self::SubCell => Box::new(SubCellRenderer),
        }
    }
}
