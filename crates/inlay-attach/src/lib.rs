#![forbid(unsafe_code)]

//! Attachment cells and timing strategies.
//!
//! # Role in Inlay
//! An [`Attachment`] binds one embedded widget to one anchor in a styled
//! buffer and tracks its lifecycle: `Unattached → PendingCommit → Attached`.
//! The [`TimingController`] decides *when* the widget's presentation node is
//! inserted into the host surface and when its frame is committed, by
//! dispatching on [`AttachStrategy`](inlay_core::AttachStrategy):
//!
//! - `ForcedImmediate` attaches inside the draw callback and forces the
//!   widget's compositing subtree to rasterize before the callback returns,
//!   deterministically ahead of the compositing link, reproducing the
//!   broken-chain failure on every run.
//! - `DeferredCommit` captures the frame during the draw callback and
//!   attaches from a one-shot transaction-boundary callback, relying on the
//!   host's empirical commit ordering.
//! - `LayoutPhaseProvider` attaches from the layout pass's materialize hook,
//!   strictly before rasterization by the host's own pipeline contract.

pub mod cell;
pub mod controller;

pub use cell::{AttachState, Attachment};
pub use controller::TimingController;
