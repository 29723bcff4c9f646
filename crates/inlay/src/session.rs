//! The inline rendering session: layout pass, display pass, commit.

use inlay_attach::Attachment;
use inlay_core::{Rect, WidgetBuilder};
use inlay_host::{
    InlineItem, InlineItemKind, InlineLayout, PipelinePhase, Surface, layout_inline,
};
use inlay_text::{RunContent, StyledBuffer, resolve};

use crate::{RenderConfig, TimingController};

/// A renderable surface bound to one resolved template.
///
/// The session drives the host's frame pipeline in the order the host
/// itself would: the layout pass computes line geometry (and materializes
/// layout-provider cells), the display pass delivers draw callbacks for
/// every placed cell, and the commit processes the open transaction. Tests
/// and drivers can also run the passes individually; the host is free to
/// deliver redundant display passes, and every attachment path tolerates
/// that.
pub struct InlineSession {
    surface: Surface,
    buffer: StyledBuffer,
    cells: Vec<Attachment>,
    controller: TimingController,
    config: RenderConfig,
    layout: Option<InlineLayout>,
}

impl InlineSession {
    /// Open a session on a fresh surface with detected capabilities.
    #[must_use]
    pub fn new(
        config: RenderConfig,
        template: &str,
        token: &str,
        contents: Vec<WidgetBuilder>,
    ) -> Self {
        Self::with_surface(Surface::new(), config, template, token, contents)
    }

    /// Open a session on an existing surface.
    ///
    /// The strategy is resolved against the surface's capabilities here;
    /// the styled buffer is built with the *effective* strategy so eager
    /// sizing matches the path actually taken.
    #[must_use]
    pub fn with_surface(
        surface: Surface,
        config: RenderConfig,
        template: &str,
        token: &str,
        contents: Vec<WidgetBuilder>,
    ) -> Self {
        let controller = TimingController::new(config.strategy, surface.capabilities());
        let document = resolve(template, token, contents.len());
        let buffer = StyledBuffer::build(
            &document,
            config.style,
            contents,
            controller.effective_strategy(),
        );
        let cells = buffer.attachments().cloned().collect();
        Self {
            surface,
            buffer,
            cells,
            controller,
            config,
            layout: None,
        }
    }

    /// Run one full frame: layout, display, commit.
    pub fn render_frame(&mut self) {
        let _span = tracing::debug_span!(
            "render_frame",
            strategy = %self.controller.effective_strategy(),
            cells = self.cells.len(),
        )
        .entered();

        self.layout_pass();
        self.display_pass();
        self.surface.commit();
    }

    /// Compute line geometry and reserve space for every cell.
    ///
    /// Under the layout-provider strategy this is also where attachment
    /// happens: the materialize hook runs here, strictly before any
    /// rasterization of the frame.
    pub fn layout_pass(&mut self) {
        self.surface.set_phase(PipelinePhase::Layout);
        self.surface.push_context("InlineSession::layout_pass");

        let font = self.buffer.style().font;
        let mut cell_ordinal = 0usize;
        let items: Vec<InlineItem> = self
            .buffer
            .runs()
            .iter()
            .enumerate()
            .map(|(index, run)| match run.content() {
                RunContent::Text(text) => InlineItem {
                    kind: InlineItemKind::Text { run: index },
                    width: font.text_width(text),
                    height: font.line_height(),
                },
                RunContent::Cell(cell) => {
                    let size = self.controller.cell_size(cell);
                    let item = InlineItem {
                        kind: InlineItemKind::Cell { cell: cell_ordinal },
                        width: size.width,
                        height: size.height,
                    };
                    cell_ordinal += 1;
                    item
                }
            })
            .collect();

        let layout = layout_inline(&items, self.config.max_width, font.line_height(), font.descent);

        if self.controller.uses_layout_provider() {
            self.surface.push_context("TextLayout::materialize_providers");
            for (ordinal, frame) in placed_cells(&layout) {
                self.controller
                    .materialize(&mut self.surface, &self.cells[ordinal], frame);
            }
            self.surface.pop_context();
        }

        self.layout = Some(layout);
        self.surface.pop_context();
        self.surface.set_phase(PipelinePhase::Idle);
    }

    /// Deliver a draw callback for every placed cell region.
    ///
    /// Requires a prior [`layout_pass`](Self::layout_pass); a pass without
    /// one is a no-op.
    pub fn display_pass(&mut self) {
        self.surface.set_phase(PipelinePhase::Display);
        self.surface.push_context("InlineSession::display_pass");

        let placed: Vec<(usize, Rect)> = self
            .layout
            .as_ref()
            .map(|layout| placed_cells(layout).collect())
            .unwrap_or_default();
        for (ordinal, frame) in placed {
            self.controller
                .on_draw(&mut self.surface, &self.cells[ordinal], frame);
        }

        self.surface.pop_context();
        self.surface.set_phase(PipelinePhase::Idle);
    }

    /// Mark every mounted cell stale so the next commit repaints it.
    pub fn invalidate_attachments(&mut self) {
        for cell in &self.cells {
            if let Some(node) = cell.node() {
                self.surface.set_needs_display(node);
            }
        }
    }

    /// The session's host surface.
    #[must_use]
    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    /// Mutable access to the host surface (observer installation, manual
    /// commits).
    pub fn surface_mut(&mut self) -> &mut Surface {
        &mut self.surface
    }

    /// The styled buffer this session renders.
    #[must_use]
    pub fn buffer(&self) -> &StyledBuffer {
        &self.buffer
    }

    /// The timing controller in effect.
    #[must_use]
    pub fn controller(&self) -> &TimingController {
        &self.controller
    }

    /// The configuration the session was opened with.
    #[must_use]
    pub fn config(&self) -> &RenderConfig {
        &self.config
    }

    /// Geometry from the most recent layout pass.
    #[must_use]
    pub fn layout(&self) -> Option<&InlineLayout> {
        self.layout.as_ref()
    }
}

/// Cell ordinals and frames placed by a layout, in content order.
fn placed_cells(layout: &InlineLayout) -> impl Iterator<Item = (usize, Rect)> + '_ {
    layout.cells().filter_map(|placed| match placed.kind {
        InlineItemKind::Cell { cell } => Some((cell, placed.frame)),
        InlineItemKind::Text { .. } => None,
    })
}

impl std::fmt::Debug for InlineSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InlineSession")
            .field("config", &self.config)
            .field("cells", &self.cells.len())
            .field("laid_out", &self.layout.is_some())
            .finish()
    }
}
