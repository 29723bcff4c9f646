//! Template scanning: turn a template string plus a placeholder token into a
//! display string and an ordered anchor list.

use smallvec::SmallVec;

/// One widget insertion point in the display string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    /// Character offset of the anchor, counted as if every earlier token
    /// span were already collapsed to the single placeholder character that
    /// will replace it.
    pub offset: usize,
    /// Index into the content list this anchor is bound to.
    pub content_index: usize,
}

/// The result of resolving a template: the token-stripped display string and
/// the anchors, sorted by strictly ascending offset.
///
/// Built once, immutable thereafter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateDocument {
    display_text: String,
    anchors: SmallVec<[Anchor; 4]>,
    dropped_anchors: usize,
}

impl TemplateDocument {
    /// The template with every token occurrence removed.
    #[must_use]
    pub fn display_text(&self) -> &str {
        &self.display_text
    }

    /// Anchors in ascending offset order.
    #[must_use]
    pub fn anchors(&self) -> &[Anchor] {
        &self.anchors
    }

    /// Occurrences dropped because they exceeded the content count.
    #[must_use]
    pub fn dropped_anchors(&self) -> usize {
        self.dropped_anchors
    }
}

/// Scan `template` for non-overlapping occurrences of `token`, left to
/// right, and produce the display string plus one anchor per occurrence.
///
/// Each anchor's offset is its character position with the cumulative length
/// of earlier token spans subtracted and one unit added back per earlier
/// anchor: the position it will occupy once every prior span is a single
/// placeholder character.
///
/// Occurrences beyond `content_count` are dropped: the valid prefix is kept,
/// a warning is logged, and the drop count is recorded on the document.
/// Pure and deterministic; an empty token yields no anchors.
#[must_use]
pub fn resolve(template: &str, token: &str, content_count: usize) -> TemplateDocument {
    let mut display = String::with_capacity(template.len());
    let mut anchors = SmallVec::new();
    let mut dropped = 0usize;

    if token.is_empty() {
        display.push_str(template);
        return TemplateDocument {
            display_text: display,
            anchors,
            dropped_anchors: 0,
        };
    }

    let mut occurrence = 0usize;
    let mut stripped_chars = 0usize;
    let mut tail_start = 0usize;

    for (start, _) in template.match_indices(token) {
        let segment = &template[tail_start..start];
        stripped_chars += segment.chars().count();
        display.push_str(segment);

        if occurrence < content_count {
            anchors.push(Anchor {
                offset: stripped_chars + occurrence,
                content_index: occurrence,
            });
        } else {
            dropped += 1;
        }

        occurrence += 1;
        tail_start = start + token.len();
    }
    display.push_str(&template[tail_start..]);

    if dropped > 0 {
        tracing::warn!(
            dropped,
            content_count,
            occurrences = occurrence,
            "template has more token occurrences than content entries; extra anchors dropped"
        );
    }

    TemplateDocument {
        display_text: display,
        anchors,
        dropped_anchors: dropped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use tracing_test::traced_test;

    #[test]
    fn two_occurrences_resolve_to_two_anchors() {
        let doc = resolve("You have {{c}} unread, {{c}} alerts.", "{{c}}", 2);

        assert_eq!(doc.display_text(), "You have  unread,  alerts.");
        assert_eq!(doc.anchors().len(), 2);
        assert_eq!(doc.anchors()[0], Anchor { offset: 9, content_index: 0 });
        assert_eq!(doc.anchors()[1], Anchor { offset: 19, content_index: 1 });
        assert_eq!(doc.dropped_anchors(), 0);
    }

    #[traced_test]
    #[test]
    fn excess_occurrences_are_dropped_with_warning() {
        let doc = resolve("You have {{c}} unread, {{c}} alerts.", "{{c}}", 1);

        assert_eq!(doc.display_text(), "You have  unread,  alerts.");
        assert_eq!(doc.anchors().len(), 1);
        assert_eq!(doc.anchors()[0].content_index, 0);
        assert_eq!(doc.dropped_anchors(), 1);
        assert!(logs_contain("extra anchors dropped"));
    }

    #[test]
    fn no_occurrences_returns_template_verbatim() {
        let doc = resolve("plain text", "{{c}}", 3);
        assert_eq!(doc.display_text(), "plain text");
        assert!(doc.anchors().is_empty());
        assert_eq!(doc.dropped_anchors(), 0);
    }

    #[test]
    fn empty_token_yields_no_anchors() {
        let doc = resolve("abc", "", 3);
        assert_eq!(doc.display_text(), "abc");
        assert!(doc.anchors().is_empty());
    }

    #[test]
    fn adjacent_tokens_keep_strictly_ascending_offsets() {
        let doc = resolve("{{c}}{{c}}{{c}}", "{{c}}", 3);
        assert_eq!(doc.display_text(), "");
        let offsets: Vec<_> = doc.anchors().iter().map(|a| a.offset).collect();
        assert_eq!(offsets, vec![0, 1, 2]);
    }

    #[test]
    fn leading_and_trailing_tokens() {
        let doc = resolve("{{c}}mid{{c}}", "{{c}}", 2);
        assert_eq!(doc.display_text(), "mid");
        assert_eq!(doc.anchors()[0].offset, 0);
        assert_eq!(doc.anchors()[1].offset, 4);
    }

    #[test]
    fn multibyte_text_uses_char_offsets() {
        let doc = resolve("héllo {{c}} wörld", "{{c}}", 1);
        assert_eq!(doc.display_text(), "héllo  wörld");
        // "héllo " is six characters regardless of its byte length.
        assert_eq!(doc.anchors()[0].offset, 6);
    }

    #[test]
    fn zero_content_count_drops_everything() {
        let doc = resolve("a{{c}}b", "{{c}}", 0);
        assert_eq!(doc.display_text(), "ab");
        assert!(doc.anchors().is_empty());
        assert_eq!(doc.dropped_anchors(), 1);
    }

    fn segment_strategy() -> impl Strategy<Value = String> {
        // Segments avoid the token's characters entirely so occurrences are
        // exactly the ones we interleave.
        proptest::collection::vec(prop_oneof![Just('a'), Just('é'), Just(' '), Just('.')], 0..12)
            .prop_map(|chars| chars.into_iter().collect())
    }

    proptest! {
        #[test]
        fn proptest_anchor_count_and_order(
            segments in proptest::collection::vec(segment_strategy(), 1..8),
            extra in 0usize..4,
        ) {
            let token = "{{x}}";
            let k = segments.len() - 1;
            let template = segments.join(token);
            let doc = resolve(&template, token, k + extra);

            prop_assert_eq!(doc.anchors().len(), k);
            prop_assert_eq!(doc.dropped_anchors(), 0);
            prop_assert_eq!(doc.display_text(), segments.concat());

            let display_chars = doc.display_text().chars().count();
            for (i, anchor) in doc.anchors().iter().enumerate() {
                prop_assert_eq!(anchor.content_index, i);
                // Valid position in the display string once earlier
                // placeholders occupy one slot each.
                prop_assert!(anchor.offset - i <= display_chars);
                if i > 0 {
                    prop_assert!(anchor.offset > doc.anchors()[i - 1].offset);
                }
            }
        }

        #[test]
        fn proptest_overflow_keeps_prefix(
            segments in proptest::collection::vec(segment_strategy(), 2..8),
            content_count in 0usize..3,
        ) {
            let token = "{{x}}";
            let k = segments.len() - 1;
            let template = segments.join(token);
            let doc = resolve(&template, token, content_count);

            let kept = k.min(content_count);
            prop_assert_eq!(doc.anchors().len(), kept);
            prop_assert_eq!(doc.dropped_anchors(), k - kept);
            // Dropping never changes the display text.
            prop_assert_eq!(doc.display_text(), segments.concat());
        }
    }
}
