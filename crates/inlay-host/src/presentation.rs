//! The presentation hierarchy: visible interactive objects, connected
//! synchronously on insertion.

use std::rc::Rc;

use inlay_core::{Rect, Widget};
use smallvec::SmallVec;

use crate::compositing::CompositingId;

/// Identifies a node in the presentation arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PresentationId(pub(crate) u32);

impl PresentationId {
    /// Arena slot index.
    #[inline]
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

/// One presentation node.
///
/// Every presentation node owns exactly one compositing twin, created with
/// it. The presentation parent link is set synchronously by the surface; the
/// twin's parent link goes through the transaction queue.
#[derive(Debug)]
pub(crate) struct PresentationNode {
    pub(crate) parent: Option<PresentationId>,
    pub(crate) children: SmallVec<[PresentationId; 4]>,
    pub(crate) frame: Rect,
    pub(crate) compositing: CompositingId,
    pub(crate) painter: Option<Rc<dyn Widget>>,
}

/// Vec-backed arena of presentation nodes with typed ids.
#[derive(Debug, Default)]
pub struct PresentationArena {
    nodes: Vec<PresentationNode>,
}

impl PresentationArena {
    /// Create an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes ever created (ids are never reused).
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The id the next inserted node will receive.
    pub(crate) fn next_id(&self) -> PresentationId {
        PresentationId(self.nodes.len() as u32)
    }

    pub(crate) fn insert(
        &mut self,
        compositing: CompositingId,
        painter: Option<Rc<dyn Widget>>,
    ) -> PresentationId {
        let id = self.next_id();
        self.nodes.push(PresentationNode {
            parent: None,
            children: SmallVec::new(),
            frame: Rect::default(),
            compositing,
            painter,
        });
        id
    }

    pub(crate) fn get(&self, id: PresentationId) -> Option<&PresentationNode> {
        self.nodes.get(id.index())
    }

    pub(crate) fn get_mut(&mut self, id: PresentationId) -> Option<&mut PresentationNode> {
        self.nodes.get_mut(id.index())
    }

    /// Connect `child` beneath `parent`, synchronously.
    ///
    /// A child that already has a parent is left untouched.
    pub(crate) fn attach(&mut self, parent: PresentationId, child: PresentationId) {
        if parent == child || self.get(child).is_none() || self.get(parent).is_none() {
            return;
        }
        if self.nodes[child.index()].parent.is_some() {
            return;
        }
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    /// The node's parent, if connected.
    #[must_use]
    pub fn parent(&self, id: PresentationId) -> Option<PresentationId> {
        self.get(id).and_then(|n| n.parent)
    }

    /// The node's children, in insertion order.
    #[must_use]
    pub fn children(&self, id: PresentationId) -> &[PresentationId] {
        self.get(id).map_or(&[], |n| n.children.as_slice())
    }

    /// The node's current frame.
    #[must_use]
    pub fn frame(&self, id: PresentationId) -> Rect {
        self.get(id).map_or_else(Rect::default, |n| n.frame)
    }

    /// The node's compositing twin.
    #[must_use]
    pub fn compositing_of(&self, id: PresentationId) -> Option<CompositingId> {
        self.get(id).map(|n| n.compositing)
    }

    /// The node's painter, if it carries content.
    #[must_use]
    pub fn painter(&self, id: PresentationId) -> Option<Rc<dyn Widget>> {
        self.get(id).and_then(|n| n.painter.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_assigns_sequential_ids() {
        let mut arena = PresentationArena::new();
        let a = arena.insert(CompositingId(0), None);
        let b = arena.insert(CompositingId(1), None);
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn attach_links_both_directions() {
        let mut arena = PresentationArena::new();
        let parent = arena.insert(CompositingId(0), None);
        let child = arena.insert(CompositingId(1), None);

        arena.attach(parent, child);

        assert_eq!(arena.parent(child), Some(parent));
        assert_eq!(arena.children(parent), &[child]);
    }

    #[test]
    fn attach_refuses_reparenting() {
        let mut arena = PresentationArena::new();
        let a = arena.insert(CompositingId(0), None);
        let b = arena.insert(CompositingId(1), None);
        let child = arena.insert(CompositingId(2), None);

        arena.attach(a, child);
        arena.attach(b, child);

        assert_eq!(arena.parent(child), Some(a));
        assert!(arena.children(b).is_empty());
    }

    #[test]
    fn attach_to_self_is_ignored() {
        let mut arena = PresentationArena::new();
        let a = arena.insert(CompositingId(0), None);
        arena.attach(a, a);
        assert_eq!(arena.parent(a), None);
    }

    #[test]
    fn frame_defaults_to_zero() {
        let mut arena = PresentationArena::new();
        let a = arena.insert(CompositingId(0), None);
        assert_eq!(arena.frame(a), Rect::default());
    }
}
