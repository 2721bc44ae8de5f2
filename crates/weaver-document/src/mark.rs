//! Self-adjusting positions.

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use crate::document::{Document, DocumentState, ListenerId};
use crate::edit::{Edit, EditListener};

struct MarkState {
    position: Cell<usize>,
}

impl EditListener for MarkState {
    fn on_edit(&self, edit: &Edit) {
        self.position.set(edit.remap(self.position.get()));
    }
}

/// A byte offset that tracks its logical position through document edits.
///
/// The mark holds a weak reference to its document. After the document is
/// dropped the mark is invalid: queries log an error and return 0.
pub struct Mark {
    state: Rc<MarkState>,
    document: Weak<RefCell<DocumentState>>,
    listener: ListenerId,
}

impl Mark {
    pub(crate) fn attach(document: &Document, position: usize) -> Self {
        let state = Rc::new(MarkState {
            position: Cell::new(position),
        });
        let listener: Rc<dyn EditListener> = state.clone();
        let id = document.subscribe(&listener);
        Self {
            state,
            document: document.downgrade(),
            listener: id,
        }
    }

    /// Returns whether the owning document still exists.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.document.strong_count() > 0
    }

    fn live_document(&self, operation: &'static str) -> Option<Rc<RefCell<DocumentState>>> {
        let document = self.document.upgrade();
        if document.is_none() {
            tracing::error!(operation, "mark used after its document was dropped");
        }
        document
    }

    /// Returns the current byte offset, or 0 if the document is gone.
    #[must_use]
    pub fn position(&self) -> usize {
        self.live_document("position")
            .map_or(0, |_| self.state.position.get())
    }

    /// Returns the one-based line of the mark, or 0 if the document is gone.
    #[must_use]
    pub fn line(&self) -> usize {
        self.line_column("line").map_or(0, |(line, _)| line)
    }

    /// Returns the one-based column (in characters) of the mark, or 0 if the
    /// document is gone.
    #[must_use]
    pub fn column(&self) -> usize {
        self.line_column("column").map_or(0, |(_, column)| column)
    }

    fn line_column(&self, operation: &'static str) -> Option<(usize, usize)> {
        let document = self.live_document(operation)?;
        let resolved = document.borrow().line_column(self.state.position.get());
        resolved
            .inspect_err(|err| tracing::error!(operation, %err, "mark position is stale"))
            .ok()
    }

    /// Moves the document cursor to the mark. Does nothing if the document
    /// is gone.
    pub fn restore(&self) {
        let Some(document) = self.live_document("restore") else {
            return;
        };
        let position = self.state.position.get();
        if let Err(err) = document.borrow_mut().set_cursor(position) {
            tracing::error!(operation = "restore", %err, "mark position is stale");
        }
    }
}

impl Drop for Mark {
    fn drop(&mut self) {
        if let Some(document) = self.document.upgrade() {
            document.borrow_mut().unsubscribe(self.listener);
        }
    }
}

impl fmt::Debug for Mark {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Mark")
            .field("position", &self.state.position.get())
            .field("valid", &self.is_valid())
            .finish()
    }
}
