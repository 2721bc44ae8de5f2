//! Error types for document edits.

use thiserror::Error;

/// Failure of a document operation. The document is left unchanged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum DocumentError {
    /// An offset lies past the end of the text.
    #[error("offset {offset} is out of bounds for a document of {len} bytes")]
    OutOfBounds {
        /// The rejected offset.
        offset: usize,
        /// Length of the text in bytes.
        len: usize,
    },

    /// An offset falls inside a multi-byte character.
    #[error("offset {offset} is not on a character boundary")]
    NotCharBoundary {
        /// The rejected offset.
        offset: usize,
    },

    /// A range ends before it starts.
    #[error("range {start}..{end} is inverted")]
    InvertedRange {
        /// Start of the rejected range.
        start: usize,
        /// End of the rejected range.
        end: usize,
    },
}
