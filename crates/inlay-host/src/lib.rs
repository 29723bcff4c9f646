#![forbid(unsafe_code)]

//! Deterministic host surface model for Inlay.
//!
//! # Role in Inlay
//! The attachment protocol in `inlay-attach` is only meaningful against a
//! host whose callback ordering is explicit. This crate is that host: two
//! parallel node hierarchies over the same visual objects, a transaction
//! queue, and a commit pipeline whose step order (connect pending
//! compositing links, rasterize, then run boundary callbacks) is the
//! empirical ordering the timing strategies depend on.
//!
//! # The two hierarchies
//! - The **presentation** hierarchy ([`PresentationArena`]) connects
//!   synchronously: [`Surface::attach_child`] links parent and child the
//!   moment it runs.
//! - The **compositing** hierarchy ([`CompositingArena`]) connects lazily:
//!   `attach_child` only queues a link op on the open [`Transaction`], and
//!   the link is established when [`Surface::commit`] processes it.
//!
//! A compositing node rasterized before its link connects observes a broken
//! ancestor chain; the raster engine then stamps the cached content with an
//! inverted-transform flag that re-rasterization never clears. The
//! [`RasterObserver`] seam lets a diagnostic monitor watch every
//! rasterization without altering it.

pub mod caps;
pub mod compositing;
pub mod layout;
pub mod observer;
pub mod presentation;
pub mod surface;
pub mod transaction;

pub use caps::HostCapabilities;
pub use compositing::{CompositingArena, CompositingFlags, CompositingId, RasterContent};
pub use layout::{
    InlineItem, InlineItemKind, InlineLayout, LineFragment, PlacedItem, layout_inline,
};
pub use observer::{PipelinePhase, RasterObservation, RasterObserver};
pub use presentation::{PresentationArena, PresentationId};
pub use surface::Surface;
pub use transaction::{BoundaryCallback, Transaction};
