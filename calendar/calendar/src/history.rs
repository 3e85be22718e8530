//! Bounded undo/redo log of page edits.

use std::collections::VecDeque;
use std::fmt::Display;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::geometry::{Frame, FrameType, ImageTransform};
use crate::ids::{AssetId, ProjectId};
use crate::page::MonthSlot;

pub const HISTORY_CAPACITY: usize = 20;

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum HistoryKind {
    Frame,
    Transform,
    Assign,
}

impl Display for HistoryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HistoryKind::Frame => f.write_str("frame"),
            HistoryKind::Transform => f.write_str("transform"),
            HistoryKind::Assign => f.write_str("assign"),
        }
    }
}

/// The values before and after an edit.
#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum HistoryChange {
    Frame {
        frame_type: FrameType,
        before: Frame,
        after: Frame,
    },
    Transform {
        before: ImageTransform,
        after: ImageTransform,
    },
    /// Assigning an image resets the transform, so the previous transform is kept to be restored on undo.
    Assign {
        before: Option<AssetId>,
        before_transform: ImageTransform,
        after: Option<AssetId>,
        after_transform: ImageTransform,
    },
}

impl HistoryChange {
    pub fn kind(&self) -> HistoryKind {
        match self {
            HistoryChange::Frame { .. } => HistoryKind::Frame,
            HistoryChange::Transform { .. } => HistoryKind::Transform,
            HistoryChange::Assign { .. } => HistoryKind::Assign,
        }
    }
}

#[derive(Debug, serde::Serialize, serde::Deserialize, Clone, PartialEq)]
pub struct HistoryEntry {
    pub id: Uuid,
    pub timestamp: DateTime<Utc>,
    pub project_id: ProjectId,
    /// The page index at the time of the edit, for logging.
    pub page_index: usize,
    /// Identifies the page, indexes change when the pages are reconciled.
    pub slot: MonthSlot,
    pub change: HistoryChange,
}

impl HistoryEntry {
    pub fn new(project_id: ProjectId, page_index: usize, slot: MonthSlot, change: HistoryChange) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            project_id,
            page_index,
            slot,
            change,
        }
    }
}

/// Entries before the cursor have been applied, entries from the cursor onwards can be redone.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<HistoryEntry>,
    cursor: usize,
    capacity: usize,
}

impl Default for History {
    fn default() -> Self {
        Self::with_capacity(HISTORY_CAPACITY)
    }
}

impl History {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(capacity),
            cursor: 0,
            capacity,
        }
    }

    /// Append an entry, discarding the redo entries and then the oldest entries beyond the capacity.
    pub fn record(&mut self, entry: HistoryEntry) {
        self.entries.truncate(self.cursor);
        self.entries.push_back(entry);
        while self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.cursor = self.entries.len();
    }

    /// Step back, returns the entry to revert.
    pub fn undo(&mut self) -> Option<&HistoryEntry> {
        if self.cursor == 0 {
            return None;
        }
        self.cursor -= 1;
        self.entries.get(self.cursor)
    }

    /// Step forward, returns the entry to re-apply.
    pub fn redo(&mut self) -> Option<&HistoryEntry> {
        let entry = self.entries.get(self.cursor)?;
        self.cursor += 1;
        Some(entry)
    }

    pub fn can_undo(&self) -> bool {
        self.cursor > 0
    }

    pub fn can_redo(&self) -> bool {
        self.cursor < self.entries.len()
    }

    /// Index of the most recently applied entry.
    pub fn index(&self) -> Option<usize> {
        self.cursor.checked_sub(1)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.cursor = 0;
    }
}
