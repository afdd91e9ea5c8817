//! Undo/Redo history.
//!
//! Every applied mutation pushes one full page snapshot; undo/redo move a
//! cursor over the snapshot list. Snapshots are shared `Arc`s, so handing
//! the current page to the renderer or the store never copies the tree.
//! Pushing after an undo discards the redo branch.

use std::sync::Arc;

use pb_core::model::PageDocument;

/// One entry of the history: the page and what produced it.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub page: Arc<PageDocument>,
    pub description: String,
}

/// Linear snapshot history with a cursor.
///
/// Invariant: `0 <= index < len`.
#[derive(Debug, Clone)]
pub struct HistoryStack {
    entries: Vec<Snapshot>,
    index: usize,
    /// Maximum number of snapshots kept; the oldest is dropped beyond it.
    max_depth: usize,
}

impl HistoryStack {
    pub fn new(initial: PageDocument, max_depth: usize) -> Self {
        Self {
            entries: vec![Snapshot {
                page: Arc::new(initial),
                description: "open".to_string(),
            }],
            index: 0,
            max_depth: max_depth.max(1),
        }
    }

    /// Record a new page as the present, discarding anything ahead of the
    /// cursor.
    pub fn push(&mut self, page: PageDocument, description: &str) {
        self.entries.truncate(self.index + 1);
        self.entries.push(Snapshot {
            page: Arc::new(page),
            description: description.to_string(),
        });
        if self.entries.len() > self.max_depth {
            let excess = self.entries.len() - self.max_depth;
            self.entries.drain(..excess);
            log::debug!("history: dropped {excess} oldest snapshot(s)");
        }
        self.index = self.entries.len() - 1;
    }

    /// Step back one snapshot and return it.
    pub fn undo(&mut self) -> Option<Arc<PageDocument>> {
        if !self.can_undo() {
            return None;
        }
        let undone = &self.entries[self.index].description;
        log::debug!("history: undo {undone}");
        self.index -= 1;
        Some(self.current())
    }

    /// Step forward one snapshot and return it.
    pub fn redo(&mut self) -> Option<Arc<PageDocument>> {
        if !self.can_redo() {
            return None;
        }
        self.index += 1;
        log::debug!("history: redo {}", self.entries[self.index].description);
        Some(self.current())
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    /// The page at the cursor.
    pub fn current(&self) -> Arc<PageDocument> {
        Arc::clone(&self.entries[self.index].page)
    }

    /// Description of the snapshot that `undo` would revert.
    pub fn undo_description(&self) -> Option<&str> {
        self.can_undo()
            .then(|| self.entries[self.index].description.as_str())
    }

    /// Description of the snapshot that `redo` would re-apply.
    pub fn redo_description(&self) -> Option<&str> {
        self.can_redo()
            .then(|| self.entries[self.index + 1].description.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn max_depth(&self) -> usize {
        self.max_depth
    }
}
