//! Global notification slot.
//!
//! A single toast-like record with last-write-wins semantics: a new
//! notification fully replaces the current one even while it is visible.
//! There is no queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::watch;

/// Notification severity, fixing color, icon, and default display time.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Severity {
    /// Confirmation of a completed action.
    #[default]
    Success,
    /// A failed request or server problem.
    Error,
    /// Something the user should know but can recover from.
    Warning,
    /// Neutral information.
    Info,
}

impl Severity {
    /// Theme color name for the toast.
    #[must_use]
    pub const fn color(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Error => "error",
            Self::Warning => "warning",
            Self::Info => "info",
        }
    }

    /// Icon name for the toast.
    #[must_use]
    pub const fn icon(self) -> &'static str {
        match self {
            Self::Success => "mdi-check-circle",
            Self::Error => "mdi-alert-circle",
            Self::Warning => "mdi-alert",
            Self::Info => "mdi-information",
        }
    }

    /// How long the toast stays up by default.
    #[must_use]
    pub const fn default_timeout(self) -> Duration {
        match self {
            Self::Success | Self::Info => Duration::from_secs(3),
            Self::Warning => Duration::from_secs(4),
            Self::Error => Duration::from_secs(5),
        }
    }
}

/// The notification record.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notification {
    /// Whether the toast is currently shown. [`Notifier::hide`] flips only
    /// this flag so an exit transition can still read the stale text.
    pub visible: bool,

    /// Main message.
    pub text: String,

    /// Optional heading.
    pub title: Option<String>,

    /// Severity (drives color, icon, and default timeout).
    pub severity: Severity,

    /// Display time.
    pub timeout: Duration,

    /// Raw diagnostic detail (e.g. the error response body).
    pub details: Option<String>,
}

impl Notification {
    /// Create a notification with the severity's default timeout.
    #[must_use]
    pub fn new(severity: Severity, text: impl Into<String>) -> Self {
        Self {
            visible: false,
            text: text.into(),
            title: None,
            severity,
            timeout: severity.default_timeout(),
            details: None,
        }
    }

    /// Builder: set the heading.
    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Builder: set the display time.
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Builder: attach diagnostic detail.
    #[must_use]
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl Default for Notification {
    fn default() -> Self {
        Self::new(Severity::Success, "")
    }
}

/// Owner of the single notification slot.
///
/// Cheap to clone; all clones share the slot.
#[derive(Clone, Debug)]
pub struct Notifier {
    slot: Arc<watch::Sender<Notification>>,
    shown: Arc<AtomicUsize>,
}

impl Notifier {
    /// Create an empty notifier.
    #[must_use]
    pub fn new() -> Self {
        let (slot, _) = watch::channel(Notification::default());
        Self {
            slot: Arc::new(slot),
            shown: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Display a notification, replacing whatever is currently shown.
    pub fn show(&self, notification: Notification) {
        let mut notification = notification;
        notification.visible = true;
        self.shown.fetch_add(1, Ordering::Relaxed);
        self.slot.send_replace(notification);
    }

    /// Display a success toast.
    pub fn success(&self, text: impl Into<String>) {
        self.show(Notification::new(Severity::Success, text));
    }

    /// Display an error toast with optional heading and diagnostic detail.
    pub fn error(&self, text: impl Into<String>, title: Option<String>, details: Option<String>) {
        let mut notification = Notification::new(Severity::Error, text);
        notification.title = title;
        notification.details = details;
        self.show(notification);
    }

    /// Display a warning toast with an optional heading.
    pub fn warning(&self, text: impl Into<String>, title: Option<String>) {
        let mut notification = Notification::new(Severity::Warning, text);
        notification.title = title;
        self.show(notification);
    }

    /// Display an info toast.
    pub fn info(&self, text: impl Into<String>) {
        self.show(Notification::new(Severity::Info, text));
    }

    /// Hide the toast without clearing its fields.
    pub fn hide(&self) {
        self.slot.send_modify(|notification| notification.visible = false);
    }

    /// Snapshot of the current record.
    #[must_use]
    pub fn current(&self) -> Notification {
        self.slot.borrow().clone()
    }

    /// How many notifications have been shown since creation.
    #[must_use]
    pub fn shown_count(&self) -> usize {
        self.shown.load(Ordering::Relaxed)
    }

    /// Subscribe to record changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Notification> {
        self.slot.subscribe()
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::new()
    }
}
