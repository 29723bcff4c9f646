//! The attachment timing controller.

use inlay_core::{AttachStrategy, Rect, Size};
use inlay_host::{HostCapabilities, Surface};

use crate::cell::{AttachState, Attachment};

/// Dispatches the three attachment timing strategies over the host surface.
///
/// The controller is a tagged-variant dispatcher: the strategy is resolved
/// once, at construction, against the host's capabilities, and every draw or
/// materialize callback routes through a `match` on it. No ambient state is
/// consulted afterwards.
#[derive(Debug, Clone, Copy)]
pub struct TimingController {
    requested: AttachStrategy,
    effective: AttachStrategy,
}

impl TimingController {
    /// Resolve `strategy` against `caps` and build the controller.
    ///
    /// A layout-provider request on a host without the facility falls back
    /// to [`AttachStrategy::DeferredCommit`] transparently.
    #[must_use]
    pub fn new(strategy: AttachStrategy, caps: HostCapabilities) -> Self {
        let effective = if strategy.is_layout_phase() && !caps.layout_providers {
            tracing::debug!(
                requested = %strategy,
                "host lacks layout providers; falling back to deferred commit"
            );
            AttachStrategy::DeferredCommit
        } else {
            strategy
        };
        Self {
            requested: strategy,
            effective,
        }
    }

    /// The strategy the caller asked for.
    #[must_use]
    pub fn requested_strategy(&self) -> AttachStrategy {
        self.requested
    }

    /// The strategy actually in effect after capability gating.
    #[must_use]
    pub fn effective_strategy(&self) -> AttachStrategy {
        self.effective
    }

    /// Whether attachment happens through the layout pass's materialize
    /// hook rather than the draw callback.
    #[must_use]
    pub fn uses_layout_provider(&self) -> bool {
        self.effective.is_layout_phase()
    }

    /// Inline space to reserve for a cell, under every strategy.
    #[must_use]
    pub fn cell_size(&self, cell: &Attachment) -> Size {
        cell.cell_size()
    }

    /// The host's draw callback for a cell's anchor region.
    ///
    /// Re-entrant: the host may deliver several draw callbacks for the same
    /// cell before a transaction boundary fires; every path here is
    /// idempotent with respect to attachment.
    pub fn on_draw(&self, surface: &mut Surface, cell: &Attachment, region: Rect) {
        surface.push_context("TimingController::on_draw");
        match self.effective {
            AttachStrategy::ForcedImmediate => self.draw_forced(surface, cell, region),
            AttachStrategy::DeferredCommit => self.draw_deferred(surface, cell, region),
            // Attachment is owned by the materialize hook; a draw callback
            // only refreshes the frame of an already-attached cell.
            AttachStrategy::LayoutPhaseProvider => {
                if cell.state() == AttachState::Attached {
                    cell.update_frame(surface, region);
                }
            }
        }
        surface.pop_context();
    }

    fn draw_forced(&self, surface: &mut Surface, cell: &Attachment, region: Rect) {
        if cell.state() == AttachState::Attached {
            cell.update_frame(surface, region);
            return;
        }
        let node = cell.attach_now(surface, region);
        // Rasterize the whole subtree before returning from the draw
        // callback. The compositing link queued by attach_now has not
        // connected yet, so the first raster observes a broken chain.
        surface.rasterize_now(node);
    }

    fn draw_deferred(&self, surface: &mut Surface, cell: &Attachment, region: Rect) {
        match cell.state() {
            AttachState::Unattached => {
                cell.capture_frame(region);
                cell.begin_pending();
                let handle = cell.clone();
                surface.add_boundary_callback(Box::new(move |s| {
                    finish_deferred_attach(s, &handle);
                }));
            }
            // A boundary callback is already in flight; just refresh the
            // frame it will commit.
            AttachState::PendingCommit => cell.capture_frame(region),
            AttachState::Attached => cell.update_frame(surface, region),
        }
    }

    /// The layout pass's materialize hook (layout-provider strategy only).
    ///
    /// Invoked once per on-screen occurrence, strictly before any
    /// rasterization of the region; the surface connects both hierarchies
    /// within the same commit, ahead of its display pass.
    pub fn materialize(&self, surface: &mut Surface, cell: &Attachment, location: Rect) {
        debug_assert!(self.uses_layout_provider());
        if cell.state() != AttachState::Unattached {
            return;
        }
        surface.push_context("AttachmentProvider::materialize");
        cell.attach_now(surface, location);
        surface.pop_context();
    }
}

fn finish_deferred_attach(surface: &mut Surface, cell: &Attachment) {
    // Re-check: a cell that attached through another path while the
    // callback was queued must not attach twice.
    if cell.state() != AttachState::PendingCommit {
        return;
    }
    let frame = cell.target_frame().unwrap_or_default();
    cell.attach_now(surface, frame);
}
