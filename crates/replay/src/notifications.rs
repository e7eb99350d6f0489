//! User-facing notifications emitted by the recording controller.
//!
//! Rendering is out of scope for this crate: operations emit fire-and-forget
//! [`NotificationEvent`]s, which are mirrored to the log output and archived
//! in a capped journal. A console or UI layer reads either surface.

use bevy::prelude::*;

/// Severity of a notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// Informational: an operation succeeded or progressed.
    Info,
    /// A rejected operation, with remedial guidance in the text.
    Warning,
}

/// Fire-and-forget user-visible message.
#[derive(Event, Debug, Clone)]
pub struct NotificationEvent {
    pub text: String,
    pub kind: NotificationKind,
}

impl NotificationEvent {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: NotificationKind::Info,
        }
    }

    pub fn warning(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            kind: NotificationKind::Warning,
        }
    }
}

/// One archived notification.
#[derive(Debug, Clone)]
pub struct JournalEntry {
    pub kind: NotificationKind,
    pub text: String,
}

/// Journal of notifications, oldest first, trimmed to `max_entries`.
#[derive(Resource)]
pub struct NotificationLog {
    pub entries: Vec<JournalEntry>,
    pub max_entries: usize,
}

impl Default for NotificationLog {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            max_entries: 256,
        }
    }
}

impl NotificationLog {
    pub fn push(&mut self, kind: NotificationKind, text: &str) {
        self.entries.push(JournalEntry {
            kind,
            text: text.to_string(),
        });
        if self.entries.len() > self.max_entries {
            let excess = self.entries.len() - self.max_entries;
            self.entries.drain(..excess);
        }
    }

    /// The most recent entry, if any.
    pub fn last(&self) -> Option<&JournalEntry> {
        self.entries.last()
    }
}

/// Collect events into the journal and mirror them to the log output.
pub fn collect_notifications(
    mut events: EventReader<NotificationEvent>,
    mut log: ResMut<NotificationLog>,
) {
    for event in events.read() {
        match event.kind {
            NotificationKind::Info => info!("{}", event.text),
            NotificationKind::Warning => warn!("{}", event.text),
        }
        log.push(event.kind, &event.text);
    }
}
