#![forbid(unsafe_code)]

//! Template anchor resolution and styled buffers.
//!
//! # Role in Inlay
//! This crate turns a template string with placeholder tokens into a styled
//! buffer ready for layout: [`resolve`] strips the tokens and records where
//! each embedded widget belongs, and [`StyledBuffer::build`] interleaves
//! text runs with attachment cells and applies the baseline-centering pass
//! that keeps plain text vertically centered against tall widgets.

pub mod anchor;
pub mod buffer;
pub mod style;

pub use anchor::{Anchor, TemplateDocument, resolve};
pub use buffer::{Run, RunContent, StyledBuffer};
pub use style::{Alignment, FontMetrics, TextStyle};
