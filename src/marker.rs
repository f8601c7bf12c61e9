//! Session marker detection.
//!
//! The chat service sets a cookie once a visitor has an active session.  The
//! client never inspects the cookie's value; the name appearing anywhere in the
//! cookie string is enough to reveal the access element.

/// Cookie name used when none is configured.
pub const DEFAULT_MARKER: &str = "session";

/// The textual marker that signals an active session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMarker {
    name: String,
}

impl SessionMarker {
    /// Creates a marker that looks for `name`.
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    /// The text searched for.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns true if `cookies` contains the marker text.
    pub fn is_present(&self, cookies: &str) -> bool {
        !self.name.is_empty() && cookies.contains(&self.name)
    }
}

impl Default for SessionMarker {
    fn default() -> Self {
        Self::new(DEFAULT_MARKER)
    }
}

/// Visibility of the element gated by the session marker.
///
/// The gate starts hidden and, once opened, stays open for the lifetime of
/// the page view.
#[derive(Debug, Clone, Default)]
pub struct AccessGate {
    marker: SessionMarker,
    visible: bool,
}

impl AccessGate {
    /// Creates a hidden gate watching `marker`.
    pub fn new(marker: SessionMarker) -> Self {
        Self {
            marker,
            visible: false,
        }
    }

    /// Re-check the cookie string.  Returns true if this call revealed the gate.
    pub fn refresh(&mut self, cookies: &str) -> bool {
        if !self.visible && self.marker.is_present(cookies) {
            self.visible = true;
            tracing::debug!(marker = self.marker.name(), "session marker found");
            return true;
        }
        false
    }

    /// Whether the gated element is shown.
    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// The marker being watched.
    pub fn marker(&self) -> &SessionMarker {
        &self.marker
    }
}
