//! Host capability gating.

use std::fmt;

/// What the running host version supports.
///
/// The attachment controller consults this once, at construction, to decide
/// whether the layout-provider path is available; no component reads
/// ambient version state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostCapabilities {
    /// Whether the text-layout system accepts provider registrations and
    /// invokes materialize hooks during the layout pass.
    pub layout_providers: bool,
}

impl HostCapabilities {
    /// A current host: all capabilities present.
    #[must_use]
    pub const fn full() -> Self {
        Self {
            layout_providers: true,
        }
    }

    /// A host predating the layout-provider facility.
    #[must_use]
    pub const fn legacy() -> Self {
        Self {
            layout_providers: false,
        }
    }

    /// Probe the running host.
    ///
    /// The deterministic model host always reports full capabilities; tests
    /// construct [`legacy()`](Self::legacy) explicitly to exercise the
    /// fallback path.
    #[must_use]
    pub const fn detect() -> Self {
        Self::full()
    }
}

impl Default for HostCapabilities {
    fn default() -> Self {
        Self::detect()
    }
}

impl fmt::Display for HostCapabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "layout_providers={}",
            if self.layout_providers { "yes" } else { "no" }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detect_reports_full() {
        assert_eq!(HostCapabilities::detect(), HostCapabilities::full());
        assert!(HostCapabilities::default().layout_providers);
    }

    #[test]
    fn legacy_lacks_providers() {
        assert!(!HostCapabilities::legacy().layout_providers);
    }
}
