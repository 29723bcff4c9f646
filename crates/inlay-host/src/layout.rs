//! Greedy inline line layout.
//!
//! The layout pass places a run of inline items (text segments and
//! attachment cells) into horizontal line fragments, wrapping greedily at a
//! maximum width. Items are atomic: a segment wider than the line still
//! occupies one line by itself. Cells sit on the baseline; text boxes keep
//! their descent below it.

use inlay_core::{Rect, Size};

/// What an inline item stands for. Indices refer back into the caller's run
/// and cell lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InlineItemKind {
    /// A text segment; `run` indexes the caller's run list.
    Text {
        /// Index of the source text run.
        run: usize,
    },
    /// An attachment cell; `cell` indexes the caller's cell list.
    Cell {
        /// Index of the source attachment.
        cell: usize,
    },
}

/// One measured inline item, in content order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InlineItem {
    /// What this item stands for.
    pub kind: InlineItemKind,
    /// Measured advance width.
    pub width: f64,
    /// Measured height (text: line height; cell: intrinsic height).
    pub height: f64,
}

/// An item placed by layout.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedItem {
    /// What this item stands for.
    pub kind: InlineItemKind,
    /// Final frame in surface coordinates.
    pub frame: Rect,
    /// Index of the line fragment holding the item.
    pub line: usize,
}

/// One horizontal fragment of laid-out content.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LineFragment {
    /// Fragment bounds.
    pub rect: Rect,
    /// Baseline position, in surface coordinates from the top.
    pub baseline: f64,
}

/// The result of an inline layout pass.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct InlineLayout {
    /// Line fragments, top to bottom.
    pub lines: Vec<LineFragment>,
    /// Placed items, in content order.
    pub items: Vec<PlacedItem>,
    /// Total extent of the laid-out content.
    pub size: Size,
}

impl InlineLayout {
    /// Placed attachment cells, in content order.
    pub fn cells(&self) -> impl Iterator<Item = &PlacedItem> {
        self.items
            .iter()
            .filter(|item| matches!(item.kind, InlineItemKind::Cell { .. }))
    }
}

/// Lay out `items` into lines no wider than `max_width`.
///
/// `line_height` is the text line box height and `descent` the portion of it
/// below the baseline. A line's height grows to fit its tallest cell; the
/// baseline sits `descent` above the line bottom, text boxes are placed so
/// their baseline coincides with it, and cells rest their bottom edge on it.
#[must_use]
pub fn layout_inline(
    items: &[InlineItem],
    max_width: f64,
    line_height: f64,
    descent: f64,
) -> InlineLayout {
    let ascent = (line_height - descent).max(0.0);
    let mut layout = InlineLayout::default();
    let mut start = 0;

    while start < items.len() {
        // Greedy fill: take items until the next one would overflow.
        let mut end = start + 1;
        let mut width = items[start].width;
        while end < items.len() && width + items[end].width <= max_width {
            width += items[end].width;
            end += 1;
        }

        let line_ascent = items[start..end]
            .iter()
            .map(|item| match item.kind {
                InlineItemKind::Text { .. } => ascent,
                InlineItemKind::Cell { .. } => item.height,
            })
            .fold(ascent, f64::max);
        let y = layout.size.height;
        let baseline = y + line_ascent;
        let line_index = layout.lines.len();

        let mut x = 0.0;
        for item in &items[start..end] {
            let frame = match item.kind {
                InlineItemKind::Text { .. } => {
                    Rect::new(x, baseline - ascent, item.width, item.height)
                }
                InlineItemKind::Cell { .. } => {
                    Rect::new(x, baseline - item.height, item.width, item.height)
                }
            };
            layout.items.push(PlacedItem {
                kind: item.kind,
                frame,
                line: line_index,
            });
            x += item.width;
        }

        layout.lines.push(LineFragment {
            rect: Rect::new(0.0, y, width, line_ascent + descent),
            baseline,
        });
        layout.size.width = layout.size.width.max(width);
        layout.size.height += line_ascent + descent;
        start = end;
    }

    layout
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn text(run: usize, width: f64) -> InlineItem {
        InlineItem {
            kind: InlineItemKind::Text { run },
            width,
            height: 16.0,
        }
    }

    fn cell(idx: usize, width: f64, height: f64) -> InlineItem {
        InlineItem {
            kind: InlineItemKind::Cell { cell: idx },
            width,
            height,
        }
    }

    #[test]
    fn single_line_advances_x() {
        let layout = layout_inline(&[text(0, 40.0), cell(0, 10.0, 10.0), text(1, 30.0)], 200.0, 16.0, 4.0);

        assert_eq!(layout.lines.len(), 1);
        assert_eq!(layout.items[0].frame.x, 0.0);
        assert_eq!(layout.items[1].frame.x, 40.0);
        assert_eq!(layout.items[2].frame.x, 50.0);
        assert_eq!(layout.size.width, 80.0);
    }

    #[test]
    fn wraps_when_line_overflows() {
        let layout = layout_inline(&[text(0, 60.0), text(1, 60.0), text(2, 60.0)], 130.0, 16.0, 4.0);

        assert_eq!(layout.lines.len(), 2);
        assert_eq!(layout.items[0].line, 0);
        assert_eq!(layout.items[1].line, 0);
        assert_eq!(layout.items[2].line, 1);
        assert_eq!(layout.items[2].frame.x, 0.0);
    }

    #[test]
    fn oversized_item_gets_its_own_line() {
        let layout = layout_inline(&[text(0, 500.0), text(1, 10.0)], 100.0, 16.0, 4.0);

        assert_eq!(layout.lines.len(), 2);
        assert_eq!(layout.items[0].line, 0);
        assert_eq!(layout.items[1].line, 1);
    }

    #[test]
    fn tall_cell_grows_line_and_sits_on_baseline() {
        let layout = layout_inline(&[text(0, 40.0), cell(0, 20.0, 30.0)], 200.0, 16.0, 4.0);

        let line = layout.lines[0];
        assert_eq!(line.rect.height, 34.0); // 30.0 cell ascent + 4.0 descent
        assert_eq!(line.baseline, 30.0);

        let cell_frame = layout.items[1].frame;
        assert_eq!(cell_frame.bottom(), line.baseline);
        assert_eq!(cell_frame.y, 0.0);

        // Text baseline coincides with the line baseline.
        let text_frame = layout.items[0].frame;
        assert_eq!(text_frame.y, 30.0 - 12.0); // baseline - ascent
    }

    #[test]
    fn cells_iterator_keeps_content_order() {
        let layout = layout_inline(
            &[cell(0, 10.0, 10.0), text(0, 5.0), cell(1, 10.0, 10.0)],
            200.0,
            16.0,
            4.0,
        );
        let cells: Vec<_> = layout.cells().collect();
        assert_eq!(cells.len(), 2);
        assert_eq!(cells[0].kind, InlineItemKind::Cell { cell: 0 });
        assert_eq!(cells[1].kind, InlineItemKind::Cell { cell: 1 });
    }

    #[test]
    fn empty_input_is_empty_layout() {
        let layout = layout_inline(&[], 100.0, 16.0, 4.0);
        assert!(layout.lines.is_empty());
        assert!(layout.items.is_empty());
        assert_eq!(layout.size, Size::ZERO);
    }

    #[test]
    fn stacked_lines_accumulate_height() {
        let layout = layout_inline(&[text(0, 90.0), text(1, 90.0)], 100.0, 16.0, 4.0);
        assert_eq!(layout.lines[0].rect.y, 0.0);
        assert_eq!(layout.lines[1].rect.y, 16.0);
        assert_eq!(layout.size.height, 32.0);
    }

    proptest! {
        #[test]
        fn proptest_every_item_is_placed_once_in_order(
            widths in proptest::collection::vec(1.0f64..50.0, 1..40),
            max_width in 20.0f64..200.0,
        ) {
            let items: Vec<InlineItem> = widths
                .iter()
                .enumerate()
                .map(|(i, &w)| if i % 3 == 0 { cell(i, w, 10.0) } else { text(i, w) })
                .collect();
            let layout = layout_inline(&items, max_width, 16.0, 4.0);

            prop_assert_eq!(layout.items.len(), items.len());
            for (item, placed) in items.iter().zip(&layout.items) {
                prop_assert_eq!(placed.kind, item.kind);
                prop_assert!((placed.frame.width - item.width).abs() < 1e-9);
            }
            // Line indices never decrease, and x resets at each new line.
            for pair in layout.items.windows(2) {
                prop_assert!(pair[1].line >= pair[0].line);
                if pair[1].line == pair[0].line {
                    prop_assert!(pair[1].frame.x >= pair[0].frame.right() - 1e-9);
                } else {
                    prop_assert_eq!(pair[1].frame.x, 0.0);
                }
            }
        }
    }
}
