//! The append-only diagnostic event log.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

use inlay_host::CompositingId;
use smallvec::SmallVec;
use web_time::Instant;

/// Upper bound on captured call-context frames per event.
pub const MAX_CONTEXT_FRAMES: usize = 15;

/// One record of a node's first rasterization.
///
/// Immutable after creation; appended to the log and never revised.
#[derive(Debug, Clone)]
pub struct DiagnosticEvent {
    /// The compositing node that rasterized.
    pub node: CompositingId,
    /// When the rasterization was observed.
    pub timestamp: Instant,
    /// Whether the node's ancestor chain had at least two established links
    /// at that moment. `false` means the cached content is corrupted for the
    /// node's lifetime.
    pub ancestor_depth_at_least_2: bool,
    /// Whether the host's layout stage was active.
    pub during_layout: bool,
    /// Whether the host's commit stage was active.
    pub during_commit: bool,
    /// Monotonic sequence number, process-wide per log.
    pub sequence: u64,
    /// Abbreviated call context, innermost frame first, at most
    /// [`MAX_CONTEXT_FRAMES`] entries.
    pub context: SmallVec<[&'static str; MAX_CONTEXT_FRAMES]>,
}

impl DiagnosticEvent {
    /// Whether this event records an ordering violation.
    #[must_use]
    pub fn is_violation(&self) -> bool {
        !self.ancestor_depth_at_least_2
    }
}

impl fmt::Display for DiagnosticEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "#{} node={} chain={} layout={} commit={}",
            self.sequence,
            self.node.index(),
            if self.ancestor_depth_at_least_2 {
                "connected"
            } else {
                "broken"
            },
            self.during_layout,
            self.during_commit,
        )?;
        if !self.context.is_empty() {
            write!(f, " ctx={}", self.context.join(" < "))?;
        }
        Ok(())
    }
}

/// Process-wide, append-only store of diagnostic events.
///
/// Sequence numbers and the violation counter are atomic so first
/// rasterizations observed from concurrent test processes never interleave
/// increments. Events are only ever appended; there is no way to remove one.
#[derive(Debug, Default)]
pub struct DiagnosticLog {
    events: Mutex<Vec<DiagnosticEvent>>,
    sequence: AtomicU64,
    violations: AtomicU64,
}

impl DiagnosticLog {
    /// Create an empty log.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            events: Mutex::new(Vec::new()),
            sequence: AtomicU64::new(0),
            violations: AtomicU64::new(0),
        }
    }

    /// The process-wide log.
    #[must_use]
    pub fn global() -> Arc<Self> {
        static GLOBAL: OnceLock<Arc<DiagnosticLog>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(Self::new())))
    }

    /// Append an event, assigning its sequence number. Returns the number.
    pub(crate) fn record(&self, mut event: DiagnosticEvent) -> u64 {
        let mut events = self.events.lock().unwrap_or_else(|e| e.into_inner());
        let sequence = self.sequence.fetch_add(1, Ordering::Relaxed);
        event.sequence = sequence;
        if event.is_violation() {
            self.violations.fetch_add(1, Ordering::Relaxed);
        }
        events.push(event);
        sequence
    }

    /// Number of recorded events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Whether the log is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total ordering violations recorded.
    #[must_use]
    pub fn violation_count(&self) -> u64 {
        self.violations.load(Ordering::Relaxed)
    }

    /// A point-in-time copy of the log, in append order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<DiagnosticEvent> {
        self.events
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    /// Events recorded for one node.
    #[must_use]
    pub fn events_for(&self, node: CompositingId) -> Vec<DiagnosticEvent> {
        self.snapshot()
            .into_iter()
            .filter(|event| event.node == node)
            .collect()
    }
}
