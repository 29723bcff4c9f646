//! The widget trait and the canvas it paints into.
//!
//! Embedded content is anything that can report a natural size and paint
//! itself. Rasterization in `inlay-host` drives [`Widget::paint`] against a
//! [`Canvas`], a deterministic paint-op recorder that stands in for a pixel
//! surface: tests inspect the recorded ops instead of comparing bitmaps.

use std::fmt;
use std::rc::Rc;

use crate::geometry::{Point, Rect, Size};

/// A packed RGBA color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Rgba(pub u32);

impl Rgba {
    /// Construct from channel values.
    #[inline]
    #[must_use]
    pub const fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self(((r as u32) << 24) | ((g as u32) << 16) | ((b as u32) << 8) | a as u32)
    }

    /// Opaque black.
    pub const BLACK: Self = Self::new(0, 0, 0, 255);
    /// Opaque white.
    pub const WHITE: Self = Self::new(255, 255, 255, 255);
    /// Fully transparent.
    pub const TRANSPARENT: Self = Self::new(0, 0, 0, 0);

    /// Red channel.
    #[inline]
    #[must_use]
    pub const fn r(&self) -> u8 {
        (self.0 >> 24) as u8
    }

    /// Alpha channel.
    #[inline]
    #[must_use]
    pub const fn a(&self) -> u8 {
        self.0 as u8
    }
}

/// A recorded paint operation.
#[derive(Debug, Clone, PartialEq)]
pub enum PaintOp {
    /// Fill a rectangle with a solid color.
    FillRect {
        /// Target rectangle in canvas-local coordinates.
        rect: Rect,
        /// Fill color.
        color: Rgba,
    },
    /// Draw a text label.
    Label {
        /// Baseline origin in canvas-local coordinates.
        origin: Point,
        /// Label content.
        text: String,
        /// Glyph color.
        color: Rgba,
    },
}

/// A deterministic paint target.
///
/// Widgets paint into a canvas during rasterization; the host caches the
/// resulting op list as the node's raster content.
#[derive(Debug, Clone, PartialEq)]
pub struct Canvas {
    size: Size,
    ops: Vec<PaintOp>,
}

impl Canvas {
    /// Create an empty canvas of the given size.
    #[must_use]
    pub fn new(size: Size) -> Self {
        Self {
            size,
            ops: Vec::new(),
        }
    }

    /// The canvas size.
    #[inline]
    #[must_use]
    pub fn size(&self) -> Size {
        self.size
    }

    /// Fill a rectangle.
    pub fn fill_rect(&mut self, rect: Rect, color: Rgba) {
        self.ops.push(PaintOp::FillRect { rect, color });
    }

    /// Draw a label at a baseline origin.
    pub fn label(&mut self, origin: Point, text: impl Into<String>, color: Rgba) {
        self.ops.push(PaintOp::Label {
            origin,
            text: text.into(),
            color,
        });
    }

    /// The recorded operations, in paint order.
    #[must_use]
    pub fn ops(&self) -> &[PaintOp] {
        &self.ops
    }

    /// Whether anything was painted.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ops.is_empty()
    }
}

/// Embedded inline content.
///
/// A widget reports its natural size once, paints its own content, and may
/// carry child layers that the host mounts beneath it. Widgets are built
/// off-screen by a [`WidgetBuilder`] and handed to the host when the owning
/// attachment mounts; they are shared via `Rc` because the presentation node
/// keeps the painter alive for redisplay.
pub trait Widget: fmt::Debug {
    /// Natural size of the widget before any inline fitting.
    fn natural_size(&self) -> Size;

    /// Paint the widget's own content.
    fn paint(&self, canvas: &mut Canvas);

    /// Child layers mounted beneath this widget, in z-order.
    ///
    /// Most widgets are a single layer; composite widgets return clones of
    /// their shared children.
    fn child_layers(&self) -> Vec<Rc<dyn Widget>> {
        Vec::new()
    }
}

/// Builds one widget instance off-screen.
///
/// The timing strategy decides when the builder runs: eagerly at buffer
/// construction (layout-phase sizing) or lazily at the first size query.
pub type WidgetBuilder = Box<dyn Fn() -> Rc<dyn Widget>>;
