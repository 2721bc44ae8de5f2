//! Edit notifications.

/// One mutation of a document: `removed` bytes starting at `from` were
/// replaced by `added` bytes.
///
/// Inserts have `removed == 0`, deletions have `added == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Edit {
    /// Byte offset at which the edit starts.
    pub from: usize,
    /// Number of bytes removed.
    pub removed: usize,
    /// Number of bytes inserted.
    pub added: usize,
}

impl Edit {
    /// Creates an edit record.
    #[must_use]
    pub const fn new(from: usize, removed: usize, added: usize) -> Self {
        Self {
            from,
            removed,
            added,
        }
    }

    /// Maps an offset from before the edit to after it.
    ///
    /// Offsets at or before `from` are unchanged. Offsets past `from` but
    /// within the removed span collapse to `from`. Later offsets shift by
    /// `added - removed`.
    #[must_use]
    pub const fn remap(&self, position: usize) -> usize {
        let removed_end = self.from.saturating_add(self.removed);
        if position <= self.from {
            position
        } else if position <= removed_end {
            self.from
        } else {
            position - self.removed + self.added
        }
    }
}

/// Receiver of document edit notifications.
///
/// Called synchronously after each successful mutation, once the document
/// state is consistent again.
pub trait EditListener {
    /// Reacts to one edit.
    fn on_edit(&self, edit: &Edit);
}
