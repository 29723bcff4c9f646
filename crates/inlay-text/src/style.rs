//! Font metrics and uniform text styling.

use std::fmt;

use inlay_core::Rgba;
use unicode_segmentation::UnicodeSegmentation;

/// Vertical and horizontal metrics of the text font.
///
/// The model font is monospaced: every grapheme cluster advances by the same
/// width, which keeps layout deterministic without a shaping engine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FontMetrics {
    /// Height of a flat capital above the baseline.
    pub cap_height: f64,
    /// Distance from baseline to the top of the line box.
    pub ascent: f64,
    /// Distance from baseline to the bottom of the line box.
    pub descent: f64,
    /// Advance width of one grapheme cluster.
    pub advance: f64,
}

impl FontMetrics {
    /// Create metrics from explicit values.
    #[must_use]
    pub const fn new(cap_height: f64, ascent: f64, descent: f64, advance: f64) -> Self {
        Self {
            cap_height,
            ascent,
            descent,
            advance,
        }
    }

    /// Default body font of the model host.
    #[must_use]
    pub const fn body() -> Self {
        Self::new(12.0, 14.0, 4.0, 7.0)
    }

    /// Total line box height.
    #[must_use]
    pub fn line_height(&self) -> f64 {
        self.ascent + self.descent
    }

    /// Advance width of a string.
    #[must_use]
    pub fn text_width(&self, text: &str) -> f64 {
        text.graphemes(true).count() as f64 * self.advance
    }
}

impl Default for FontMetrics {
    fn default() -> Self {
        Self::body()
    }
}

impl fmt::Display for FontMetrics {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cap={} ascent={} descent={} advance={}",
            self.cap_height, self.ascent, self.descent, self.advance
        )
    }
}

/// Paragraph alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Alignment {
    /// Flush left.
    #[default]
    Left,
    /// Centered.
    Center,
    /// Flush right.
    Right,
}

/// Uniform styling for a styled buffer: one font, one color, one paragraph
/// alignment, applied to the full display string.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TextStyle {
    /// Font metrics for every text run.
    pub font: FontMetrics,
    /// Glyph color.
    pub color: Rgba,
    /// Paragraph alignment, passed through to the host unchanged.
    pub alignment: Alignment,
}

impl TextStyle {
    /// Style with the given font and defaults elsewhere.
    #[must_use]
    pub fn with_font(font: FontMetrics) -> Self {
        Self {
            font,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn line_height_sums_ascent_and_descent() {
        let font = FontMetrics::new(12.0, 14.0, 4.0, 7.0);
        assert_eq!(font.line_height(), 18.0);
    }

    #[test]
    fn text_width_counts_grapheme_clusters() {
        let font = FontMetrics::new(12.0, 14.0, 4.0, 10.0);
        assert_eq!(font.text_width("abc"), 30.0);
        // A combining sequence is one cluster, not two.
        assert_eq!(font.text_width("e\u{0301}"), 10.0);
        assert_eq!(font.text_width(""), 0.0);
    }

    #[test]
    fn body_is_default() {
        assert_eq!(FontMetrics::default(), FontMetrics::body());
        assert_eq!(TextStyle::default().alignment, Alignment::Left);
    }
}
