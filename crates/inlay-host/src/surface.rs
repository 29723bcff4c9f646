//! The host surface: node management, the commit pipeline, and the raster
//! engine.

use std::mem;
use std::rc::Rc;

use inlay_core::{Canvas, Rect, Widget};
use smallvec::SmallVec;

use crate::caps::HostCapabilities;
use crate::compositing::{CompositingArena, CompositingId, RasterContent};
use crate::observer::{PipelinePhase, RasterObservation, RasterObserver};
use crate::presentation::{PresentationArena, PresentationId};
use crate::transaction::{BoundaryCallback, Transaction};

/// A rendering surface holding the two node hierarchies and the open
/// transaction.
///
/// The surface is created with two structural nodes whose compositing links
/// are established immediately: a root and a content root (the text
/// container). Widgets attach beneath the content root, which is what gives
/// a correctly-connected widget an ancestor chain of depth two.
pub struct Surface {
    pres: PresentationArena,
    comp: CompositingArena,
    txn: Transaction,
    observer: Option<Rc<dyn RasterObserver>>,
    phase: PipelinePhase,
    context: SmallVec<[&'static str; 16]>,
    caps: HostCapabilities,
    root: PresentationId,
    content_root: PresentationId,
}

impl Surface {
    /// Create a surface with detected host capabilities.
    #[must_use]
    pub fn new() -> Self {
        Self::with_capabilities(HostCapabilities::detect())
    }

    /// Create a surface with explicit capabilities.
    #[must_use]
    pub fn with_capabilities(caps: HostCapabilities) -> Self {
        let mut surface = Self {
            pres: PresentationArena::new(),
            comp: CompositingArena::new(),
            txn: Transaction::default(),
            observer: None,
            phase: PipelinePhase::Idle,
            context: SmallVec::new(),
            caps,
            root: PresentationId(0),
            content_root: PresentationId(0),
        };
        surface.root = surface.create_node(None);
        surface.content_root = surface.create_node(None);
        // Structural scaffolding connects both hierarchies immediately; only
        // client attachments go through the transaction.
        surface.attach_child_now(surface.root, surface.content_root);
        surface
    }

    /// The capabilities this surface was created with.
    #[must_use]
    pub fn capabilities(&self) -> HostCapabilities {
        self.caps
    }

    /// The surface root node.
    #[must_use]
    pub fn root(&self) -> PresentationId {
        self.root
    }

    /// The text container node that inline attachments connect beneath.
    #[must_use]
    pub fn content_root(&self) -> PresentationId {
        self.content_root
    }

    /// Read access to the presentation hierarchy.
    #[must_use]
    pub fn presentation(&self) -> &PresentationArena {
        &self.pres
    }

    /// Read access to the compositing hierarchy.
    #[must_use]
    pub fn compositing(&self) -> &CompositingArena {
        &self.comp
    }

    // --- node management --------------------------------------------------

    /// Create an unattached node (and its compositing twin).
    pub fn create_node(&mut self, painter: Option<Rc<dyn Widget>>) -> PresentationId {
        let pid = self.pres.next_id();
        let cid = self.comp.insert(pid);
        let inserted = self.pres.insert(cid, painter);
        debug_assert_eq!(inserted, pid);
        inserted
    }

    /// Connect `child` beneath `parent` in the presentation hierarchy,
    /// synchronously, and queue the compositing link on the open
    /// transaction.
    pub fn attach_child(&mut self, parent: PresentationId, child: PresentationId) {
        self.pres.attach(parent, child);
        if self.pres.parent(child) == Some(parent) {
            self.txn.queue_link(child);
        }
    }

    /// Connect `child` beneath `parent` in both hierarchies at once.
    ///
    /// Used for structural scaffolding and for assembling a widget's own
    /// subtree off-screen, where the pieces form one ownership unit. The
    /// link from a subtree root to the surface still goes through
    /// [`attach_child`](Self::attach_child).
    pub fn attach_child_now(&mut self, parent: PresentationId, child: PresentationId) {
        self.pres.attach(parent, child);
        if self.pres.parent(child) != Some(parent) {
            return;
        }
        let (Some(parent_c), Some(child_c)) = (
            self.pres.compositing_of(parent),
            self.pres.compositing_of(child),
        ) else {
            return;
        };
        self.comp.connect(parent_c, child_c);
    }

    /// Assign a node's frame.
    pub fn set_frame(&mut self, node: PresentationId, frame: Rect) {
        if let Some(n) = self.pres.get_mut(node) {
            n.frame = frame;
        }
    }

    /// A node's current frame.
    #[must_use]
    pub fn frame(&self, node: PresentationId) -> Rect {
        self.pres.frame(node)
    }

    /// The compositing twin of a presentation node.
    #[must_use]
    pub fn compositing_of(&self, node: PresentationId) -> Option<CompositingId> {
        self.pres.compositing_of(node)
    }

    // --- transactions -----------------------------------------------------

    /// Register a one-shot callback to run at the next transaction boundary.
    pub fn add_boundary_callback(&mut self, cb: BoundaryCallback) {
        self.txn.add_boundary_callback(cb);
    }

    /// Boundary callbacks waiting on the open transaction.
    #[must_use]
    pub fn pending_boundary_count(&self) -> usize {
        self.txn.boundary_count()
    }

    /// Compositing links waiting on the open transaction.
    #[must_use]
    pub fn pending_link_count(&self) -> usize {
        self.txn.pending_link_count()
    }

    /// Commit the open transaction.
    ///
    /// Step order: establish pending compositing links, run the display
    /// pass over the now-connected tree, then fire boundary callbacks.
    /// Boundary callbacks therefore observe a fully connected, freshly
    /// rasterized tree; this is the empirical ordering the deferred-commit
    /// attachment strategy depends on. Work queued by a callback lands on
    /// the next transaction.
    pub fn commit(&mut self) {
        let txn = mem::take(&mut self.txn);
        let _span = tracing::debug_span!(
            "commit",
            links = txn.pending_link_count(),
            boundary = txn.boundary_count(),
        )
        .entered();

        self.phase = PipelinePhase::Commit;
        self.push_context("Surface::commit");

        self.push_context("Transaction::connect_links");
        for child in &txn.pending_links {
            self.connect_link(*child);
        }
        self.pop_context();

        self.display_pass();

        self.push_context("Transaction::boundary_callbacks");
        for cb in txn.boundary {
            cb(self);
        }
        self.pop_context();

        self.pop_context();
        self.phase = PipelinePhase::Idle;
    }

    fn connect_link(&mut self, child: PresentationId) {
        let Some(parent) = self.pres.parent(child) else {
            return;
        };
        let (Some(parent_c), Some(child_c)) = (
            self.pres.compositing_of(parent),
            self.pres.compositing_of(child),
        ) else {
            return;
        };
        self.comp.connect(parent_c, child_c);
    }

    // --- rasterization ----------------------------------------------------

    /// Rasterize every dirty node reachable from the root.
    fn display_pass(&mut self) {
        self.push_context("Surface::display_pass");
        let root_c = self
            .pres
            .compositing_of(self.root)
            .unwrap_or(CompositingId(0));
        for cid in self.comp.preorder(root_c) {
            if self.comp.is_dirty(cid) {
                self.raster_node(cid);
            }
        }
        self.pop_context();
    }

    /// Immediately rasterize `node`'s compositing subtree, connected or not.
    ///
    /// This is the forced path: it runs wherever the caller happens to be in
    /// the pipeline, before any pending links have a chance to connect.
    pub fn rasterize_now(&mut self, node: PresentationId) {
        self.push_context("Surface::rasterize_now");
        if let Some(root_c) = self.pres.compositing_of(node) {
            for cid in self.comp.preorder(root_c) {
                self.raster_node(cid);
            }
        }
        self.pop_context();
    }

    /// Mark a node's content stale so the next display pass repaints it.
    pub fn set_needs_display(&mut self, node: PresentationId) {
        if let Some(cid) = self.pres.compositing_of(node) {
            self.comp.set_needs_display(cid);
        }
    }

    fn raster_node(&mut self, cid: CompositingId) {
        let Some(pid) = self.comp.presentation_of(cid) else {
            return;
        };
        // Structural nodes carry no painter and produce no raster content.
        let Some(painter) = self.pres.painter(pid) else {
            return;
        };

        let first_raster = !self.comp.has_content(cid);
        let depth_ok = self.comp.ancestor_depth_at_least(cid, 2);

        if let Some(observer) = self.observer.clone() {
            observer.on_raster(&RasterObservation {
                node: cid,
                first_raster,
                ancestor_depth_at_least_2: depth_ok,
                phase: self.phase,
                context: self.context.as_slice(),
            });
        }

        // The observer never alters rendering: paint unconditionally.
        let frame = self.pres.frame(pid);
        let mut canvas = Canvas::new(frame.size());
        painter.paint(&mut canvas);
        self.comp.store_content(cid, RasterContent { canvas });

        // A first rasterization against a broken chain bakes the inverted
        // transform into the cache; later repaints keep the stamp.
        if first_raster && !depth_ok {
            self.comp.mark_transform_inverted(cid);
            tracing::debug!(node = cid.index(), "first raster on disconnected chain");
        }
    }

    // --- phases and call context -------------------------------------------

    /// The pipeline stage currently executing.
    #[must_use]
    pub fn phase(&self) -> PipelinePhase {
        self.phase
    }

    /// Enter a pipeline stage. The commit stage is managed by
    /// [`commit`](Self::commit) itself.
    pub fn set_phase(&mut self, phase: PipelinePhase) {
        self.phase = phase;
    }

    /// Push a frame label onto the call-context stack.
    pub fn push_context(&mut self, frame: &'static str) {
        self.context.push(frame);
    }

    /// Pop the innermost frame label.
    pub fn pop_context(&mut self) {
        self.context.pop();
    }

    /// The call-context stack, outermost first.
    #[must_use]
    pub fn context(&self) -> &[&'static str] {
        &self.context
    }

    // --- observer seam ----------------------------------------------------

    /// Install the rasterization observer.
    ///
    /// The seat holds exactly one observer for the surface's lifetime;
    /// installing a second is a no-op returning `false`.
    pub fn install_raster_observer(&mut self, observer: Rc<dyn RasterObserver>) -> bool {
        if self.observer.is_some() {
            return false;
        }
        self.observer = Some(observer);
        true
    }

    /// Whether an observer is installed.
    #[must_use]
    pub fn has_raster_observer(&self) -> bool {
        self.observer.is_some()
    }
}

impl Default for Surface {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Surface")
            .field("nodes", &self.pres.len())
            .field("phase", &self.phase)
            .field("txn", &self.txn)
            .field("observer", &self.observer.is_some())
            .finish()
    }
}
