//! The attachment cell: one embedded widget bound to one anchor.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use inlay_core::{Rect, Size, Widget, WidgetBuilder};
use inlay_host::{PresentationId, Surface};

/// Lifecycle of an attachment cell.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AttachState {
    /// No presentation node exists yet.
    #[default]
    Unattached,
    /// A transaction-boundary callback is queued to perform the attach.
    /// Guards against double registration while the callback is in flight.
    PendingCommit,
    /// The presentation node is connected and owns the widget's subtree.
    Attached,
}

struct Inner {
    content_index: usize,
    builder: WidgetBuilder,
    widget: Option<Rc<dyn Widget>>,
    intrinsic: Option<Size>,
    state: AttachState,
    target_frame: Option<Rect>,
    node: Option<PresentationId>,
}

/// One embedded widget bound to one anchor.
///
/// The styled buffer that builds a cell owns it; the handle is cheap to
/// clone because a boundary callback must reach the same cell later. Once
/// attached, the presentation node (and with it the widget subtree) is owned
/// by the host surface.
#[derive(Clone)]
pub struct Attachment {
    inner: Rc<RefCell<Inner>>,
}

impl Attachment {
    /// Create a cell whose widget is built lazily, at the first size query.
    #[must_use]
    pub fn new(content_index: usize, builder: WidgetBuilder) -> Self {
        Self {
            inner: Rc::new(RefCell::new(Inner {
                content_index,
                builder,
                widget: None,
                intrinsic: None,
                state: AttachState::Unattached,
                target_frame: None,
                node: None,
            })),
        }
    }

    /// Create a cell and build + measure its widget immediately.
    ///
    /// The layout-provider strategy sizes cells this way so the layout pass
    /// can reserve correct inline space before anything rasterizes.
    #[must_use]
    pub fn with_eager_size(content_index: usize, builder: WidgetBuilder) -> Self {
        let cell = Self::new(content_index, builder);
        let _ = cell.cell_size();
        cell
    }

    /// Attachments are never reconstructed from archived state.
    ///
    /// # Panics
    ///
    /// Always. An archive carries neither the widget builder nor a live
    /// presentation node, so decoding could only produce a
    /// partially-initialized cell.
    #[must_use]
    pub fn from_archived_state(_bytes: &[u8]) -> Self {
        panic!("attachment cells cannot be constructed from archived state");
    }

    /// Index of the content entry this cell renders.
    #[must_use]
    pub fn content_index(&self) -> usize {
        self.inner.borrow().content_index
    }

    /// Current lifecycle state.
    #[must_use]
    pub fn state(&self) -> AttachState {
        self.inner.borrow().state
    }

    /// The cell's fitted intrinsic size.
    ///
    /// Memoized; the first query builds the widget if it does not exist yet.
    /// The host uses this to reserve inline space during layout regardless
    /// of strategy.
    #[must_use]
    pub fn cell_size(&self) -> Size {
        if let Some(size) = self.inner.borrow().intrinsic {
            return size;
        }
        let widget = self.widget();
        let size = widget.natural_size();
        self.inner.borrow_mut().intrinsic = Some(size);
        size
    }

    /// Whether the intrinsic size has been computed.
    #[must_use]
    pub fn is_measured(&self) -> bool {
        self.inner.borrow().intrinsic.is_some()
    }

    /// Whether the widget instance has been built.
    #[must_use]
    pub fn is_instantiated(&self) -> bool {
        self.inner.borrow().widget.is_some()
    }

    /// The presentation node, once mounted.
    #[must_use]
    pub fn node(&self) -> Option<PresentationId> {
        self.inner.borrow().node
    }

    /// The frame captured from the most recent draw callback.
    #[must_use]
    pub fn target_frame(&self) -> Option<Rect> {
        self.inner.borrow().target_frame
    }

    /// Build (or reuse) the widget instance.
    pub(crate) fn widget(&self) -> Rc<dyn Widget> {
        if let Some(widget) = self.inner.borrow().widget.clone() {
            return widget;
        }
        let widget = (self.inner.borrow().builder)();
        self.inner.borrow_mut().widget = Some(Rc::clone(&widget));
        widget
    }

    /// Remember the region handed to the draw callback.
    pub(crate) fn capture_frame(&self, frame: Rect) {
        self.inner.borrow_mut().target_frame = Some(frame);
    }

    /// `Unattached → PendingCommit`, marking a boundary callback in flight.
    pub(crate) fn begin_pending(&self) {
        let mut inner = self.inner.borrow_mut();
        debug_assert_eq!(inner.state, AttachState::Unattached);
        inner.state = AttachState::PendingCommit;
        tracing::debug!(cell = inner.content_index, "attach pending commit");
    }

    /// Mount the widget subtree, connect it beneath the surface's content
    /// root, assign `frame`, and transition to `Attached`.
    ///
    /// The subtree's internal compositing links connect at mount (it is
    /// assembled off-screen as one ownership unit); only the root's link to
    /// the surface goes through the open transaction.
    pub(crate) fn attach_now(&self, surface: &mut Surface, frame: Rect) -> PresentationId {
        let widget = self.widget();
        let node = mount_subtree(surface, &widget);
        surface.attach_child(surface.content_root(), node);
        surface.set_frame(node, frame);

        let mut inner = self.inner.borrow_mut();
        inner.node = Some(node);
        inner.target_frame = Some(frame);
        inner.state = AttachState::Attached;
        tracing::debug!(cell = inner.content_index, node = node.index(), "attached");
        node
    }

    /// Refresh the frame of an already-attached cell.
    pub(crate) fn update_frame(&self, surface: &mut Surface, frame: Rect) {
        let node = {
            let mut inner = self.inner.borrow_mut();
            inner.target_frame = Some(frame);
            inner.node
        };
        if let Some(node) = node {
            surface.set_frame(node, frame);
        }
    }
}

/// Create presentation nodes for a widget and its child layers.
fn mount_subtree(surface: &mut Surface, widget: &Rc<dyn Widget>) -> PresentationId {
    let node = surface.create_node(Some(Rc::clone(widget)));
    for child in widget.child_layers() {
        let child_node = mount_subtree(surface, &child);
        surface.attach_child_now(node, child_node);
        surface.set_frame(child_node, Rect::from_size(child.natural_size()));
    }
    node
}

impl fmt::Debug for Attachment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Attachment")
            .field("content_index", &inner.content_index)
            .field("state", &inner.state)
            .field("intrinsic", &inner.intrinsic)
            .field("node", &inner.node)
            .finish()
    }
}
