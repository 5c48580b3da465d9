// ============================================================================
// HISTORY STACK — bounded, cursor-addressed sequence of Settings snapshots
// ============================================================================
//
// Undo/redo is cursor movement over full deep snapshots. Recording after a
// rewind truncates the redo branch first, which gives the conventional
// branch-discarding editor semantics. Continuous drag adjustments must not
// record; only commits do.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::settings::ProjectSettings;

/// Maximum number of retained entries. Oldest entries are evicted first.
pub const MAX_HISTORY: usize = 50;

/// One labeled snapshot. `settings` is a value copy — later live mutations
/// never alias into it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryItem {
    pub id: Uuid,
    pub label: String,
    pub timestamp_ms: u64,
    pub settings: ProjectSettings,
}

impl HistoryItem {
    fn new(label: &str, settings: &ProjectSettings) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: label.to_string(),
            timestamp_ms: now_millis(),
            settings: settings.clone(),
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Append-with-truncation history of edit states plus a cursor.
///
/// Invariant: `cursor < items.len()` whenever the stack is non-empty; the
/// item at the cursor is the currently-applied state.
#[derive(Clone, Debug, Default)]
pub struct HistoryStack {
    items: Vec<HistoryItem>,
    cursor: usize,
}

impl HistoryStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stack with a single seed entry, as used on project creation
    /// ("Original") and when resuming a saved project ("Resumed").
    pub fn seeded(settings: &ProjectSettings, label: &str) -> Self {
        Self {
            items: vec![HistoryItem::new(label, settings)],
            cursor: 0,
        }
    }

    /// Discard everything past the cursor, append a snapshot of `settings`,
    /// and cap the stack to the [`MAX_HISTORY`] most recent entries.
    pub fn record(&mut self, settings: &ProjectSettings, label: &str) {
        if !self.items.is_empty() {
            self.items.truncate(self.cursor + 1);
        }
        self.items.push(HistoryItem::new(label, settings));
        if self.items.len() > MAX_HISTORY {
            let overflow = self.items.len() - MAX_HISTORY;
            self.items.drain(..overflow);
        }
        self.cursor = self.items.len() - 1;
    }

    /// Move the cursor one step back and return a deep copy of the snapshot
    /// there for the caller to apply. `None` at the start boundary.
    pub fn undo(&mut self) -> Option<ProjectSettings> {
        if self.cursor == 0 || self.items.is_empty() {
            log::debug!("undo ignored: already at start of history");
            return None;
        }
        self.cursor -= 1;
        Some(self.items[self.cursor].settings.clone())
    }

    /// Move the cursor one step forward and return a deep copy of the
    /// snapshot there. `None` at the end boundary.
    pub fn redo(&mut self) -> Option<ProjectSettings> {
        if self.items.is_empty() || self.cursor + 1 >= self.items.len() {
            log::debug!("redo ignored: already at end of history");
            return None;
        }
        self.cursor += 1;
        Some(self.items[self.cursor].settings.clone())
    }

    /// Replace the whole stack with a single seed entry.
    pub fn reset(&mut self, settings: &ProjectSettings, label: &str) {
        self.items = vec![HistoryItem::new(label, settings)];
        self.cursor = 0;
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        !self.items.is_empty() && self.cursor + 1 < self.items.len()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// The currently-applied snapshot, if any.
    pub fn current(&self) -> Option<&HistoryItem> {
        self.items.get(self.cursor)
    }

    pub fn items(&self) -> &[HistoryItem] {
        &self.items
    }

    /// Entry labels in stack order, for history panels.
    pub fn labels(&self) -> Vec<&str> {
        self.items.iter().map(|i| i.label.as_str()).collect()
    }
}
