//! The styled buffer: text runs interleaved with attachment cells.

use inlay_attach::Attachment;
use inlay_core::{AttachStrategy, WidgetBuilder};

use crate::anchor::TemplateDocument;
use crate::style::TextStyle;

/// The object-replacement character marking a cell in flattened output.
pub const PLACEHOLDER: char = '\u{FFFC}';

/// What one run holds.
#[derive(Debug)]
pub enum RunContent {
    /// A segment of the display string.
    Text(String),
    /// One attachment cell.
    Cell(Attachment),
}

/// One run of the styled buffer.
#[derive(Debug)]
pub struct Run {
    content: RunContent,
    baseline_offset: f64,
}

impl Run {
    /// The run's content.
    #[must_use]
    pub fn content(&self) -> &RunContent {
        &self.content
    }

    /// Baseline shift applied by the centering pass (text runs only).
    #[must_use]
    pub fn baseline_offset(&self) -> f64 {
        self.baseline_offset
    }

    /// Whether this run is an attachment cell.
    #[must_use]
    pub fn is_cell(&self) -> bool {
        matches!(self.content, RunContent::Cell(_))
    }

    /// The text content, if this is a text run.
    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match &self.content {
            RunContent::Text(text) => Some(text),
            RunContent::Cell(_) => None,
        }
    }

    /// The attachment, if this is a cell run.
    #[must_use]
    pub fn as_cell(&self) -> Option<&Attachment> {
        match &self.content {
            RunContent::Text(_) => None,
            RunContent::Cell(cell) => Some(cell),
        }
    }
}

/// A finished styled buffer, ready for layout.
///
/// Owns the attachment cells it created; the uniform [`TextStyle`] covers
/// every text run.
#[derive(Debug)]
pub struct StyledBuffer {
    style: TextStyle,
    runs: Vec<Run>,
    text_baseline_offset: f64,
}

impl StyledBuffer {
    /// Build the buffer for a resolved document.
    ///
    /// Walks the anchors in ascending order, splitting the display string
    /// into text runs and inserting one cell per anchor, each bound to
    /// `contents[content_index]`. Layout-phase sizing builds every widget
    /// eagerly so line geometry can reserve space before anything
    /// rasterizes; other strategies defer building to the first size query.
    /// Ends with the baseline-centering pass.
    #[must_use]
    pub fn build(
        document: &TemplateDocument,
        style: TextStyle,
        contents: Vec<WidgetBuilder>,
        strategy: AttachStrategy,
    ) -> Self {
        let text = document.display_text();
        let mut slots: Vec<Option<WidgetBuilder>> = contents.into_iter().map(Some).collect();
        let mut runs = Vec::with_capacity(document.anchors().len() * 2 + 1);
        let mut cursor_chars = 0usize;
        let mut cursor_byte = 0usize;

        for (prior, anchor) in document.anchors().iter().enumerate() {
            // Anchor offsets already count one slot per earlier placeholder;
            // strip those to index the bare display string.
            let split_chars = anchor.offset - prior;
            debug_assert!(split_chars >= cursor_chars, "anchors must be ascending");

            let split_byte = byte_after_chars(text, cursor_byte, split_chars - cursor_chars);
            if split_byte > cursor_byte {
                runs.push(Run {
                    content: RunContent::Text(text[cursor_byte..split_byte].to_string()),
                    baseline_offset: 0.0,
                });
            }

            if let Some(builder) = slots.get_mut(anchor.content_index).and_then(Option::take) {
                let cell = if strategy.is_layout_phase() {
                    Attachment::with_eager_size(anchor.content_index, builder)
                } else {
                    Attachment::new(anchor.content_index, builder)
                };
                runs.push(Run {
                    content: RunContent::Cell(cell),
                    baseline_offset: 0.0,
                });
            }

            cursor_chars = split_chars;
            cursor_byte = split_byte;
        }

        if cursor_byte < text.len() {
            runs.push(Run {
                content: RunContent::Text(text[cursor_byte..].to_string()),
                baseline_offset: 0.0,
            });
        }

        let mut buffer = Self {
            style,
            runs,
            text_baseline_offset: 0.0,
        };
        buffer.apply_baseline_centering();
        buffer
    }

    /// Center plain text against the tallest cell.
    ///
    /// When the tallest attachment exceeds the font's cap height, every text
    /// run is shifted by half the overshoot. Cell runs are never touched.
    fn apply_baseline_centering(&mut self) {
        let tallest = self
            .attachments()
            .map(|cell| cell.cell_size().height)
            .fold(0.0, f64::max);
        let cap_height = self.style.font.cap_height;
        if tallest <= cap_height {
            return;
        }

        let offset = (tallest - cap_height) / 2.0;
        self.text_baseline_offset = offset;
        for run in &mut self.runs {
            if matches!(run.content, RunContent::Text(_)) {
                run.baseline_offset = offset;
            }
        }
    }

    /// The uniform style.
    #[must_use]
    pub fn style(&self) -> &TextStyle {
        &self.style
    }

    /// All runs, in content order.
    #[must_use]
    pub fn runs(&self) -> &[Run] {
        &self.runs
    }

    /// The uniform baseline shift applied to text runs (0 when no cell
    /// overtops the cap height).
    #[must_use]
    pub fn text_baseline_offset(&self) -> f64 {
        self.text_baseline_offset
    }

    /// Attachment cells, in content order.
    pub fn attachments(&self) -> impl Iterator<Item = &Attachment> {
        self.runs.iter().filter_map(Run::as_cell)
    }

    /// Number of attachment cells.
    #[must_use]
    pub fn cell_count(&self) -> usize {
        self.attachments().count()
    }

    /// The display string with every cell flattened to [`PLACEHOLDER`].
    #[must_use]
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for run in &self.runs {
            match &run.content {
                RunContent::Text(text) => out.push_str(text),
                RunContent::Cell(_) => out.push(PLACEHOLDER),
            }
        }
        out
    }
}

/// Byte position after advancing `n` characters from `start`.
fn byte_after_chars(text: &str, start: usize, n: usize) -> usize {
    if n == 0 {
        return start;
    }
    text[start..]
        .char_indices()
        .nth(n)
        .map_or(text.len(), |(byte, _)| start + byte)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anchor::resolve;
    use crate::style::FontMetrics;
    use inlay_core::{Canvas, Rect, Size, Widget};
    use std::cell::Cell as Counter;
    use std::rc::Rc;

    #[derive(Debug)]
    struct Tile(Size);

    impl Widget for Tile {
        fn natural_size(&self) -> Size {
            self.0
        }

        fn paint(&self, canvas: &mut Canvas) {
            canvas.fill_rect(Rect::from_size(self.0), inlay_core::Rgba::BLACK);
        }
    }

    fn tile_builders(count: usize, height: f64) -> Vec<WidgetBuilder> {
        (0..count)
            .map(|_| {
                Box::new(move || Rc::new(Tile(Size::new(10.0, height))) as Rc<dyn Widget>)
                    as WidgetBuilder
            })
            .collect()
    }

    fn counting_builders(count: usize, built: &Rc<Counter<usize>>) -> Vec<WidgetBuilder> {
        (0..count)
            .map(|_| {
                let built = Rc::clone(built);
                Box::new(move || {
                    built.set(built.get() + 1);
                    Rc::new(Tile(Size::new(10.0, 10.0))) as Rc<dyn Widget>
                }) as WidgetBuilder
            })
            .collect()
    }

    #[test]
    fn placeholders_land_where_tokens_were() {
        let doc = resolve("You have {{c}} unread, {{c}} alerts.", "{{c}}", 2);
        let buffer = StyledBuffer::build(
            &doc,
            TextStyle::default(),
            tile_builders(2, 10.0),
            AttachStrategy::DeferredCommit,
        );

        assert_eq!(
            buffer.plain_text(),
            "You have \u{FFFC} unread, \u{FFFC} alerts."
        );
        assert_eq!(buffer.cell_count(), 2);
        let indices: Vec<_> = buffer.attachments().map(Attachment::content_index).collect();
        assert_eq!(indices, vec![0, 1]);
    }

    #[test]
    fn dropped_anchor_leaves_no_placeholder() {
        let doc = resolve("You have {{c}} unread, {{c}} alerts.", "{{c}}", 1);
        let buffer = StyledBuffer::build(
            &doc,
            TextStyle::default(),
            tile_builders(1, 10.0),
            AttachStrategy::DeferredCommit,
        );

        assert_eq!(buffer.plain_text(), "You have \u{FFFC} unread,  alerts.");
        assert_eq!(buffer.cell_count(), 1);
    }

    #[test]
    fn adjacent_cells_produce_no_empty_text_runs() {
        let doc = resolve("{{c}}{{c}}", "{{c}}", 2);
        let buffer = StyledBuffer::build(
            &doc,
            TextStyle::default(),
            tile_builders(2, 10.0),
            AttachStrategy::DeferredCommit,
        );

        assert_eq!(buffer.runs().len(), 2);
        assert!(buffer.runs().iter().all(Run::is_cell));
    }

    #[test]
    fn tall_cell_centers_text_runs() {
        let style = TextStyle::with_font(FontMetrics::new(12.0, 14.0, 4.0, 7.0));
        let doc = resolve("a {{c}} b", "{{c}}", 1);
        let buffer = StyledBuffer::build(
            &doc,
            style,
            tile_builders(1, 30.0),
            AttachStrategy::DeferredCommit,
        );

        assert_eq!(buffer.text_baseline_offset(), 9.0);
        for run in buffer.runs() {
            if run.is_cell() {
                assert_eq!(run.baseline_offset(), 0.0);
            } else {
                assert_eq!(run.baseline_offset(), 9.0);
            }
        }
    }

    #[test]
    fn short_cell_leaves_baselines_alone() {
        let style = TextStyle::with_font(FontMetrics::new(12.0, 14.0, 4.0, 7.0));
        let doc = resolve("a {{c}} b", "{{c}}", 1);
        let buffer = StyledBuffer::build(
            &doc,
            style,
            tile_builders(1, 12.0),
            AttachStrategy::DeferredCommit,
        );

        assert_eq!(buffer.text_baseline_offset(), 0.0);
        assert!(buffer.runs().iter().all(|run| run.baseline_offset() == 0.0));
    }

    #[test]
    fn layout_phase_sizing_builds_widgets_eagerly() {
        let built = Rc::new(Counter::new(0));
        let doc = resolve("x {{c}} y", "{{c}}", 1);
        let _buffer = StyledBuffer::build(
            &doc,
            TextStyle::default(),
            counting_builders(1, &built),
            AttachStrategy::LayoutPhaseProvider,
        );
        assert_eq!(built.get(), 1);
    }

    #[test]
    fn deferred_sizing_still_measures_for_baseline_pass() {
        // The centering pass queries every cell's size, so lazy strategies
        // build at that point rather than at insertion.
        let built = Rc::new(Counter::new(0));
        let doc = resolve("x {{c}} y", "{{c}}", 1);
        let buffer = StyledBuffer::build(
            &doc,
            TextStyle::default(),
            counting_builders(1, &built),
            AttachStrategy::ForcedImmediate,
        );
        assert_eq!(built.get(), 1);
        assert!(buffer.attachments().all(|cell| cell.is_measured()));
    }

    #[test]
    fn multibyte_text_splits_on_char_boundaries() {
        let doc = resolve("héllo {{c}} wörld", "{{c}}", 1);
        let buffer = StyledBuffer::build(
            &doc,
            TextStyle::default(),
            tile_builders(1, 10.0),
            AttachStrategy::DeferredCommit,
        );

        assert_eq!(buffer.plain_text(), "héllo \u{FFFC} wörld");
        assert_eq!(buffer.runs()[0].as_text(), Some("héllo "));
        assert_eq!(buffer.runs()[2].as_text(), Some(" wörld"));
    }
}
