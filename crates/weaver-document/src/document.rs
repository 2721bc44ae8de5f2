//! The document buffer and its listener registry.

use std::cell::RefCell;
use std::fmt;
use std::ops::Range;
use std::rc::{Rc, Weak};

use crate::edit::{Edit, EditListener};
use crate::error::DocumentError;
use crate::mark::Mark;

/// Identifies a registered [`EditListener`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

pub(crate) struct DocumentState {
    text: String,
    cursor: usize,
    listeners: Vec<(ListenerId, Weak<dyn EditListener>)>,
    next_listener: u64,
}

impl DocumentState {
    fn check_offset(&self, offset: usize) -> Result<(), DocumentError> {
        if offset > self.text.len() {
            return Err(DocumentError::OutOfBounds {
                offset,
                len: self.text.len(),
            });
        }
        if !self.text.is_char_boundary(offset) {
            return Err(DocumentError::NotCharBoundary { offset });
        }
        Ok(())
    }

    fn check_range(&self, range: &Range<usize>) -> Result<(), DocumentError> {
        if range.start > range.end {
            return Err(DocumentError::InvertedRange {
                start: range.start,
                end: range.end,
            });
        }
        self.check_offset(range.start)?;
        self.check_offset(range.end)
    }

    pub(crate) fn line_column(&self, offset: usize) -> Result<(usize, usize), DocumentError> {
        self.check_offset(offset)?;
        let before = self.text.get(..offset).unwrap_or_default();
        let line_start = before.rfind('\n').map_or(0, |newline| newline + 1);
        let line = before.matches('\n').count() + 1;
        let column = before.get(line_start..).unwrap_or_default().chars().count() + 1;
        Ok((line, column))
    }

    pub(crate) fn set_cursor(&mut self, offset: usize) -> Result<(), DocumentError> {
        self.check_offset(offset)?;
        self.cursor = offset;
        Ok(())
    }

    pub(crate) fn unsubscribe(&mut self, id: ListenerId) {
        self.listeners.retain(|(existing, _)| *existing != id);
    }
}

/// A single-threaded text buffer that reports every edit.
///
/// Cloning a `Document` yields another handle to the same buffer. Offsets
/// are byte offsets and must fall on character boundaries.
#[derive(Clone)]
pub struct Document {
    state: Rc<RefCell<DocumentState>>,
}

impl Document {
    /// Creates a document holding `text`, with the cursor at offset 0.
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            state: Rc::new(RefCell::new(DocumentState {
                text: text.into(),
                cursor: 0,
                listeners: Vec::new(),
                next_listener: 0,
            })),
        }
    }

    /// Returns a copy of the current text.
    #[must_use]
    pub fn text(&self) -> String {
        self.state.borrow().text.clone()
    }

    /// Returns the text length in bytes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.borrow().text.len()
    }

    /// Returns whether the document is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.borrow().text.is_empty()
    }

    /// Returns the cursor offset.
    #[must_use]
    pub fn cursor_position(&self) -> usize {
        self.state.borrow().cursor
    }

    /// Moves the cursor.
    ///
    /// # Errors
    ///
    /// Returns an error if `offset` is out of bounds or inside a character.
    pub fn set_cursor_position(&self, offset: usize) -> Result<(), DocumentError> {
        self.state.borrow_mut().set_cursor(offset)
    }

    /// Returns the one-based line and column (in characters) of `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if `offset` is out of bounds or inside a character.
    pub fn line_column(&self, offset: usize) -> Result<(usize, usize), DocumentError> {
        self.state.borrow().line_column(offset)
    }

    /// Inserts `text` at `offset`.
    ///
    /// # Errors
    ///
    /// Returns an error if `offset` is out of bounds or inside a character.
    pub fn insert(&self, offset: usize, text: &str) -> Result<(), DocumentError> {
        self.replace(offset..offset, text)
    }

    /// Removes the bytes in `range`.
    ///
    /// # Errors
    ///
    /// Returns an error if the range is inverted, out of bounds, or splits a
    /// character.
    pub fn remove(&self, range: Range<usize>) -> Result<(), DocumentError> {
        self.replace(range, "")
    }

    /// Replaces the bytes in `range` with `text`.
    ///
    /// Listeners are notified once, after the buffer has been updated.
    ///
    /// # Errors
    ///
    /// Returns an error if the range is inverted, out of bounds, or splits a
    /// character.
    pub fn replace(&self, range: Range<usize>, text: &str) -> Result<(), DocumentError> {
        let edit = Edit::new(range.start, range.len(), text.len());
        let listeners = {
            let mut state = self.state.borrow_mut();
            state.check_range(&range)?;
            state.text.replace_range(range, text);
            state.cursor = edit.remap(state.cursor);
            state.listeners.retain(|(_, listener)| listener.strong_count() > 0);
            state
                .listeners
                .iter()
                .filter_map(|(_, listener)| listener.upgrade())
                .collect::<Vec<_>>()
        };

        tracing::trace!(
            from = edit.from,
            removed = edit.removed,
            added = edit.added,
            listeners = listeners.len(),
            "document edited"
        );

        for listener in listeners {
            listener.on_edit(&edit);
        }
        Ok(())
    }

    /// Registers `listener` for edit notifications.
    ///
    /// The document keeps only a weak reference; a dropped listener is
    /// forgotten on the next edit.
    #[must_use]
    pub fn subscribe(&self, listener: &Rc<dyn EditListener>) -> ListenerId {
        let mut state = self.state.borrow_mut();
        let id = ListenerId(state.next_listener);
        state.next_listener += 1;
        state.listeners.push((id, Rc::downgrade(listener)));
        id
    }

    /// Unregisters a listener. Unknown ids are ignored.
    pub fn unsubscribe(&self, id: ListenerId) {
        self.state.borrow_mut().unsubscribe(id);
    }

    /// Returns the number of live listeners.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.state
            .borrow()
            .listeners
            .iter()
            .filter(|(_, listener)| listener.strong_count() > 0)
            .count()
    }

    /// Creates a mark at `offset` that follows subsequent edits.
    ///
    /// # Errors
    ///
    /// Returns an error if `offset` is out of bounds or inside a character.
    pub fn create_mark(&self, offset: usize) -> Result<Mark, DocumentError> {
        self.state.borrow().check_offset(offset)?;
        Ok(Mark::attach(self, offset))
    }

    pub(crate) fn downgrade(&self) -> Weak<RefCell<DocumentState>> {
        Rc::downgrade(&self.state)
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.state.borrow();
        f.debug_struct("Document")
            .field("len", &state.text.len())
            .field("cursor", &state.cursor)
            .field("listeners", &state.listeners.len())
            .finish()
    }
}
