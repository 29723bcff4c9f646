//! The compositing hierarchy: rasterization nodes, connected lazily by the
//! commit pipeline.

use bitflags::bitflags;
use inlay_core::Canvas;
use smallvec::SmallVec;

use crate::presentation::PresentationId;

/// Identifies a node in the compositing arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CompositingId(pub(crate) u32);

impl CompositingId {
    /// Arena slot index.
    #[inline]
    #[must_use]
    pub const fn index(&self) -> usize {
        self.0 as usize
    }
}

bitflags! {
    /// Per-node state bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct CompositingFlags: u8 {
        /// First rasterization ran against a broken ancestor chain; the
        /// cached content carries an inverted coordinate transform for the
        /// node's lifetime. Never cleared.
        const TRANSFORM_INVERTED = 1 << 0;
        /// Content must be re-rasterized at the next display pass.
        const NEEDS_DISPLAY = 1 << 1;
    }
}

/// Cached raster output of one node.
#[derive(Debug, Clone)]
pub struct RasterContent {
    /// Recorded paint operations.
    pub canvas: Canvas,
}

#[derive(Debug)]
struct CompositingNode {
    parent: Option<CompositingId>,
    children: SmallVec<[CompositingId; 4]>,
    presentation: PresentationId,
    content: Option<RasterContent>,
    flags: CompositingFlags,
}

/// Vec-backed arena of compositing nodes with typed ids and index
/// back-references into the presentation arena.
#[derive(Debug, Default)]
pub struct CompositingArena {
    nodes: Vec<CompositingNode>,
}

impl CompositingArena {
    /// Create an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of nodes ever created.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn insert(&mut self, presentation: PresentationId) -> CompositingId {
        let id = CompositingId(self.nodes.len() as u32);
        self.nodes.push(CompositingNode {
            parent: None,
            children: SmallVec::new(),
            presentation,
            content: None,
            flags: CompositingFlags::empty(),
        });
        id
    }

    /// Establish the parent link for `child`.
    ///
    /// Idempotent: a child whose link is already established is left alone.
    pub(crate) fn connect(&mut self, parent: CompositingId, child: CompositingId) {
        if parent == child
            || child.index() >= self.nodes.len()
            || parent.index() >= self.nodes.len()
        {
            return;
        }
        if self.nodes[child.index()].parent.is_some() {
            return;
        }
        self.nodes[child.index()].parent = Some(parent);
        self.nodes[parent.index()].children.push(child);
    }

    /// The node's parent link, if established.
    #[must_use]
    pub fn parent(&self, id: CompositingId) -> Option<CompositingId> {
        self.nodes.get(id.index()).and_then(|n| n.parent)
    }

    /// The node's children, in connection order.
    #[must_use]
    pub fn children(&self, id: CompositingId) -> &[CompositingId] {
        self.nodes
            .get(id.index())
            .map_or(&[], |n| n.children.as_slice())
    }

    /// The presentation node this compositing node renders for.
    #[must_use]
    pub fn presentation_of(&self, id: CompositingId) -> Option<PresentationId> {
        self.nodes.get(id.index()).map(|n| n.presentation)
    }

    /// Number of established parent links above `id`, walking at most
    /// `limit` levels.
    #[must_use]
    pub fn ancestor_depth(&self, id: CompositingId, limit: usize) -> usize {
        let mut depth = 0;
        let mut current = id;
        while depth < limit {
            match self.parent(current) {
                Some(parent) => {
                    depth += 1;
                    current = parent;
                }
                None => break,
            }
        }
        depth
    }

    /// Whether the ancestor chain above `id` has at least `depth` links.
    ///
    /// This is the bounded walk the render-hierarchy monitor uses; it never
    /// traverses more than `depth` levels.
    #[must_use]
    pub fn ancestor_depth_at_least(&self, id: CompositingId, depth: usize) -> bool {
        self.ancestor_depth(id, depth) >= depth
    }

    /// Whether the node has cached raster content.
    #[must_use]
    pub fn has_content(&self, id: CompositingId) -> bool {
        self.nodes
            .get(id.index())
            .is_some_and(|n| n.content.is_some())
    }

    /// The node's cached raster content.
    #[must_use]
    pub fn content(&self, id: CompositingId) -> Option<&RasterContent> {
        self.nodes.get(id.index()).and_then(|n| n.content.as_ref())
    }

    /// The node's state bits.
    #[must_use]
    pub fn flags(&self, id: CompositingId) -> CompositingFlags {
        self.nodes
            .get(id.index())
            .map_or_else(CompositingFlags::empty, |n| n.flags)
    }

    /// Whether the node's cached content carries an inverted transform.
    #[must_use]
    pub fn transform_inverted(&self, id: CompositingId) -> bool {
        self.flags(id).contains(CompositingFlags::TRANSFORM_INVERTED)
    }

    /// Whether the node must rasterize at the next display pass.
    #[must_use]
    pub fn is_dirty(&self, id: CompositingId) -> bool {
        self.nodes.get(id.index()).is_some_and(|n| {
            n.content.is_none() || n.flags.contains(CompositingFlags::NEEDS_DISPLAY)
        })
    }

    pub(crate) fn set_needs_display(&mut self, id: CompositingId) {
        if let Some(node) = self.nodes.get_mut(id.index()) {
            node.flags.insert(CompositingFlags::NEEDS_DISPLAY);
        }
    }

    /// Store raster output. Clears NEEDS_DISPLAY; TRANSFORM_INVERTED is
    /// never touched here.
    pub(crate) fn store_content(&mut self, id: CompositingId, content: RasterContent) {
        if let Some(node) = self.nodes.get_mut(id.index()) {
            node.content = Some(content);
            node.flags.remove(CompositingFlags::NEEDS_DISPLAY);
        }
    }

    pub(crate) fn mark_transform_inverted(&mut self, id: CompositingId) {
        if let Some(node) = self.nodes.get_mut(id.index()) {
            node.flags.insert(CompositingFlags::TRANSFORM_INVERTED);
        }
    }

    /// Preorder traversal of the subtree rooted at `root`.
    #[must_use]
    pub fn preorder(&self, root: CompositingId) -> Vec<CompositingId> {
        let mut order = Vec::new();
        let mut stack = vec![root];
        while let Some(id) = stack.pop() {
            if id.index() >= self.nodes.len() {
                continue;
            }
            order.push(id);
            // Push in reverse so the first child is visited first.
            for &child in self.children(id).iter().rev() {
                stack.push(child);
            }
        }
        order
    }
}
