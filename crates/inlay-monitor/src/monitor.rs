//! The raster-hierarchy monitor.

use std::rc::Rc;
use std::sync::Arc;

use inlay_host::{PipelinePhase, RasterObservation, RasterObserver, Surface};
use smallvec::SmallVec;
use web_time::Instant;

use crate::log::{DiagnosticEvent, DiagnosticLog, MAX_CONTEXT_FRAMES};

/// Observes the host's rasterization entrypoint and records first-raster
/// diagnostics.
///
/// The monitor occupies the surface's single observer seat, a decorator
/// wired in once at startup, so installing twice is a no-op by construction.
/// It records exactly one event per node, at the node's first rasterization:
/// that is the moment a broken ancestor chain bakes a corrupted transform
/// into the cache, and later repaints add no information. Rendering itself
/// is never altered; the host paints unconditionally after notifying the
/// monitor.
#[derive(Debug)]
pub struct RasterMonitor {
    log: Arc<DiagnosticLog>,
}

impl RasterMonitor {
    /// Create a monitor writing to `log`.
    #[must_use]
    pub fn new(log: Arc<DiagnosticLog>) -> Self {
        Self { log }
    }

    /// Install a monitor writing to `log` into the surface's observer seat.
    ///
    /// Returns `false`, changing nothing, if the seat is already occupied.
    pub fn install(surface: &mut Surface, log: Arc<DiagnosticLog>) -> bool {
        surface.install_raster_observer(Rc::new(Self::new(log)))
    }

    /// Install a monitor writing to the process-wide log.
    pub fn install_global(surface: &mut Surface) -> bool {
        Self::install(surface, DiagnosticLog::global())
    }

    /// The log this monitor writes to.
    #[must_use]
    pub fn log(&self) -> &Arc<DiagnosticLog> {
        &self.log
    }
}

impl RasterObserver for RasterMonitor {
    fn on_raster(&self, observation: &RasterObservation<'_>) {
        // Only the first rasterization matters: the transform state is
        // baked into the cache then, and repaints inherit it.
        if !observation.first_raster {
            return;
        }

        let context: SmallVec<[&'static str; MAX_CONTEXT_FRAMES]> = observation
            .context
            .iter()
            .rev()
            .take(MAX_CONTEXT_FRAMES)
            .copied()
            .collect();

        let event = DiagnosticEvent {
            node: observation.node,
            timestamp: Instant::now(),
            ancestor_depth_at_least_2: observation.ancestor_depth_at_least_2,
            during_layout: observation.phase == PipelinePhase::Layout,
            during_commit: observation.phase == PipelinePhase::Commit,
            sequence: 0,
            context,
        };

        if event.is_violation() {
            tracing::debug!(
                node = observation.node.index(),
                phase = %observation.phase,
                "first raster observed on a disconnected ancestor chain"
            );
        }
        self.log.record(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use inlay_core::{Canvas, Rect, Size, Widget};

    #[derive(Debug)]
    struct Dot;

    impl Widget for Dot {
        fn natural_size(&self) -> Size {
            Size::new(4.0, 4.0)
        }

        fn paint(&self, canvas: &mut Canvas) {
            canvas.fill_rect(Rect::new(0.0, 0.0, 4.0, 4.0), inlay_core::Rgba::BLACK);
        }
    }

    fn monitored_surface() -> (Surface, Arc<DiagnosticLog>) {
        let mut surface = Surface::new();
        let log = Arc::new(DiagnosticLog::new());
        assert!(RasterMonitor::install(&mut surface, Arc::clone(&log)));
        (surface, log)
    }

    #[test]
    fn second_install_is_a_no_op() {
        let (mut surface, _log) = monitored_surface();
        let other = Arc::new(DiagnosticLog::new());
        assert!(!RasterMonitor::install(&mut surface, other));
    }

    #[test]
    fn committed_attach_records_connected_event() {
        let (mut surface, log) = monitored_surface();
        let node = surface.create_node(Some(Rc::new(Dot)));
        surface.attach_child(surface.content_root(), node);
        surface.set_frame(node, Rect::new(0.0, 0.0, 4.0, 4.0));

        surface.commit();

        let cid = surface.compositing_of(node).unwrap();
        let events = log.events_for(cid);
        assert_eq!(events.len(), 1);
        assert!(events[0].ancestor_depth_at_least_2);
        assert!(events[0].during_commit);
        assert!(!events[0].during_layout);
        assert_eq!(log.violation_count(), 0);
    }

    #[test]
    fn premature_raster_records_violation() {
        let (mut surface, log) = monitored_surface();
        let node = surface.create_node(Some(Rc::new(Dot)));
        surface.attach_child(surface.content_root(), node);

        surface.rasterize_now(node);

        let cid = surface.compositing_of(node).unwrap();
        let events = log.events_for(cid);
        assert_eq!(events.len(), 1);
        assert!(events[0].is_violation());
        assert_eq!(log.violation_count(), 1);
    }

    #[test]
    fn repaint_emits_no_second_event() {
        let (mut surface, log) = monitored_surface();
        let node = surface.create_node(Some(Rc::new(Dot)));
        surface.attach_child(surface.content_root(), node);
        surface.commit();

        surface.set_needs_display(node);
        surface.commit();

        let cid = surface.compositing_of(node).unwrap();
        assert_eq!(log.events_for(cid).len(), 1);
    }

    #[test]
    fn context_capture_is_bounded_and_innermost_first() {
        let (mut surface, log) = monitored_surface();
        const FRAMES: [&str; 18] = [
            "f0", "f1", "f2", "f3", "f4", "f5", "f6", "f7", "f8", "f9", "f10", "f11", "f12",
            "f13", "f14", "f15", "f16", "f17",
        ];
        for frame in FRAMES {
            surface.push_context(frame);
        }

        let node = surface.create_node(Some(Rc::new(Dot)));
        surface.attach_child(surface.content_root(), node);
        surface.rasterize_now(node);

        let cid = surface.compositing_of(node).unwrap();
        let event = &log.events_for(cid)[0];
        assert_eq!(event.context.len(), MAX_CONTEXT_FRAMES);
        // Innermost frame first; rasterize_now pushed its own frame on top.
        assert_eq!(event.context[0], "Surface::rasterize_now");
        assert_eq!(event.context[1], "f17");
    }

    #[test]
    fn events_preserve_first_raster_sequence_order() {
        let (mut surface, log) = monitored_surface();
        let a = surface.create_node(Some(Rc::new(Dot)));
        let b = surface.create_node(Some(Rc::new(Dot)));
        surface.attach_child(surface.content_root(), a);
        surface.attach_child(surface.content_root(), b);

        surface.commit();

        let snapshot = log.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert!(snapshot[0].sequence < snapshot[1].sequence);
    }
}
