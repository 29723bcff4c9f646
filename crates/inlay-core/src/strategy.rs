//! Attachment timing strategy selection.

use std::fmt;

/// When an embedded widget is inserted into the presentation hierarchy and
/// when its frame is committed.
///
/// The three variants are interchangeable at the call site but differ in how
/// they order attachment against the host's asynchronous compositing-link
/// step. See `inlay-attach` for the state machine each variant drives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AttachStrategy {
    /// Attach during the draw callback and force an immediate recursive
    /// rasterization of the widget's compositing subtree before returning.
    ///
    /// The compositing link is still queued on the open transaction at that
    /// point, so the first rasterization always observes a disconnected
    /// ancestor chain. This variant exists to make the failure mode
    /// deterministic for diagnostics and tests; it is not a production
    /// strategy.
    ForcedImmediate,
    /// Capture the frame during the draw callback, then attach from a
    /// one-shot transaction-boundary callback.
    ///
    /// Relies on the host running boundary callbacks after it connects
    /// pending compositing links. That ordering is an empirical property of
    /// the host, not a contract.
    DeferredCommit,
    /// Attach during the host's layout pass, strictly before any
    /// rasterization of the region.
    ///
    /// The host invokes the materialize hook while computing line geometry
    /// and connects both hierarchies itself within the same commit, so no
    /// race window exists. Preferred wherever the host supports layout
    /// providers; falls back to [`DeferredCommit`](Self::DeferredCommit)
    /// otherwise.
    #[default]
    LayoutPhaseProvider,
}

impl AttachStrategy {
    /// Whether this strategy attaches through the layout-provider hook
    /// rather than the draw callback.
    #[must_use]
    pub const fn is_layout_phase(&self) -> bool {
        matches!(self, Self::LayoutPhaseProvider)
    }
}

impl fmt::Display for AttachStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ForcedImmediate => write!(f, "forced-immediate"),
            Self::DeferredCommit => write!(f, "deferred-commit"),
            Self::LayoutPhaseProvider => write!(f, "layout-phase-provider"),
        }
    }
}
