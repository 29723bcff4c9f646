#![forbid(unsafe_code)]

//! Inlay public facade.
//!
//! Inlay embeds dynamic, independently-rendered widgets at character
//! positions inside laid-out text, and keeps them visually correct against a
//! host whose compositing hierarchy connects asynchronously. The entrypoint
//! is [`render_inline`]: resolve a template, build the styled buffer, and
//! get an [`InlineSession`] whose frame pipeline drives layout, draw
//! callbacks, and the commit.
//!
//! ```
//! use inlay::prelude::*;
//! use std::rc::Rc;
//!
//! #[derive(Debug)]
//! struct Counter(u32);
//!
//! impl Widget for Counter {
//!     fn natural_size(&self) -> Size {
//!         Size::new(18.0, 14.0)
//!     }
//!
//!     fn paint(&self, canvas: &mut Canvas) {
//!         canvas.label(Point::new(2.0, 11.0), self.0.to_string(), Rgba::BLACK);
//!     }
//! }
//!
//! let contents: Vec<WidgetBuilder> = vec![
//!     Box::new(|| Rc::new(Counter(3)) as Rc<dyn Widget>),
//!     Box::new(|| Rc::new(Counter(7)) as Rc<dyn Widget>),
//! ];
//! let mut session = render_inline(
//!     "You have {{c}} unread, {{c}} alerts.",
//!     "{{c}}",
//!     contents,
//!     TextStyle::default(),
//!     AttachStrategy::LayoutPhaseProvider,
//! );
//! session.render_frame();
//! assert_eq!(session.buffer().cell_count(), 2);
//! ```

use std::fmt;

pub mod session;

// --- Core re-exports -------------------------------------------------------

pub use inlay_core::{
    AttachStrategy, Canvas, PaintOp, Point, Rect, Rgba, Size, Widget, WidgetBuilder,
};

// --- Host re-exports -------------------------------------------------------

pub use inlay_host::{
    CompositingId, HostCapabilities, InlineLayout, PipelinePhase, PresentationId, Surface,
};

// --- Attachment re-exports -------------------------------------------------

pub use inlay_attach::{AttachState, Attachment, TimingController};

// --- Text re-exports -------------------------------------------------------

pub use inlay_text::{
    Alignment, Anchor, FontMetrics, StyledBuffer, TemplateDocument, TextStyle, resolve,
};

// --- Diagnostics re-exports ------------------------------------------------

pub use inlay_monitor::{DiagnosticEvent, DiagnosticLog, RasterMonitor};

pub use session::InlineSession;

/// Default wrap width for sessions built without an explicit configuration.
pub const DEFAULT_MAX_WIDTH: f64 = 640.0;

/// Explicit configuration threaded into a session.
///
/// There is no ambient configuration anywhere in Inlay: whatever a session
/// needs arrives through this value at construction.
#[derive(Debug, Clone, Copy)]
pub struct RenderConfig {
    /// Attachment timing strategy.
    pub strategy: AttachStrategy,
    /// Uniform text style, passed through to the styled buffer unchanged.
    pub style: TextStyle,
    /// Maximum line width for the layout pass.
    pub max_width: f64,
}

impl RenderConfig {
    /// Configuration with the given strategy and defaults elsewhere.
    #[must_use]
    pub fn new(strategy: AttachStrategy) -> Self {
        Self {
            strategy,
            style: TextStyle::default(),
            max_width: DEFAULT_MAX_WIDTH,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self::new(AttachStrategy::default())
    }
}

impl fmt::Display for RenderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} max_width={}", self.strategy, self.max_width)
    }
}

/// Resolve `template`, build the styled buffer, and open a session on a
/// fresh surface.
///
/// `contents` supplies one widget builder per token occurrence, bound in
/// order; excess occurrences are dropped with a warning.
#[must_use]
pub fn render_inline(
    template: &str,
    token: &str,
    contents: Vec<WidgetBuilder>,
    style: TextStyle,
    strategy: AttachStrategy,
) -> InlineSession {
    let config = RenderConfig {
        strategy,
        style,
        max_width: DEFAULT_MAX_WIDTH,
    };
    render_inline_with(config, template, token, contents)
}

/// [`render_inline`] with a full [`RenderConfig`].
#[must_use]
pub fn render_inline_with(
    config: RenderConfig,
    template: &str,
    token: &str,
    contents: Vec<WidgetBuilder>,
) -> InlineSession {
    InlineSession::new(config, template, token, contents)
}

// --- Prelude ---------------------------------------------------------------

/// Day-to-day imports.
pub mod prelude {
    pub use crate::{
        AttachState, AttachStrategy, Attachment, Canvas, DiagnosticLog, FontMetrics,
        HostCapabilities, InlineSession, PaintOp, Point, RasterMonitor, Rect, RenderConfig, Rgba,
        Size, StyledBuffer, Surface, TextStyle, Widget, WidgetBuilder, render_inline,
        render_inline_with,
    };
}
