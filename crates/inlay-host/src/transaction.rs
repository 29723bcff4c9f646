//! Transactions: batched compositing-link ops and one-shot boundary
//! callbacks.

use std::fmt;

use crate::presentation::PresentationId;
use crate::surface::Surface;

/// A one-shot callback run after the transaction's links have connected and
/// the display pass has finished.
pub type BoundaryCallback = Box<dyn FnOnce(&mut Surface)>;

/// The open transaction on a surface.
///
/// `attach_child` queues a compositing-link op here; clients queue boundary
/// callbacks through [`Surface::add_boundary_callback`]. Everything drains
/// in one [`Surface::commit`], in this order: links connect, the display
/// pass rasterizes, boundary callbacks run. Callbacks registered during a
/// commit land on the next transaction.
#[derive(Default)]
pub struct Transaction {
    pub(crate) pending_links: Vec<PresentationId>,
    pub(crate) boundary: Vec<BoundaryCallback>,
}

impl Transaction {
    /// Queue the compositing link for `child` to connect at commit.
    pub(crate) fn queue_link(&mut self, child: PresentationId) {
        self.pending_links.push(child);
    }

    /// Register a one-shot boundary callback.
    pub(crate) fn add_boundary_callback(&mut self, cb: BoundaryCallback) {
        self.boundary.push(cb);
    }

    /// Number of link ops waiting to connect.
    #[must_use]
    pub fn pending_link_count(&self) -> usize {
        self.pending_links.len()
    }

    /// Number of boundary callbacks waiting to fire.
    #[must_use]
    pub fn boundary_count(&self) -> usize {
        self.boundary.len()
    }

    /// Whether the transaction carries no work.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.pending_links.is_empty() && self.boundary.is_empty()
    }
}

impl fmt::Debug for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Transaction")
            .field("pending_links", &self.pending_links)
            .field("boundary", &self.boundary.len())
            .finish()
    }
}
