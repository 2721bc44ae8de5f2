//! Minimal text document with edit notifications and position marks.
//!
//! A [`Document`] owns a text buffer and, after every successful mutation,
//! synchronously notifies its registered [`EditListener`]s with an [`Edit`]
//! describing the change. A [`Mark`] is such a listener: it holds a single
//! byte offset and keeps it pointing at the same logical position as text
//! is inserted and removed around it.
//!
//! Documents are single-threaded (`Rc`-based). Marks hold only a weak
//! reference to their document; once the document is dropped, a mark
//! reports position 0 and logs an error instead of panicking.
//!
//! ```ignore
//! use weaver_document::Document;
//!
//! let document = Document::new("let value = 1;");
//! let mark = document.create_mark(12)?;
//! document.insert(0, "// set\n")?;
//! assert_eq!(mark.position(), 19);
//! assert_eq!((mark.line(), mark.column()), (2, 13));
//! # Ok::<(), weaver_document::DocumentError>(())
//! ```

mod document;
mod edit;
mod error;
mod mark;

pub use document::{Document, ListenerId};
pub use edit::{Edit, EditListener};
pub use error::DocumentError;
pub use mark::Mark;
