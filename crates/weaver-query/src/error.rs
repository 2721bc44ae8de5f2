//! Error types for parsing, query compilation, and transformation.
//!
//! Each stage of the pipeline owns an error type so callers can tell a
//! grammar failure from a malformed query or an unsafe rewrite without
//! string matching.

use std::fmt;
use std::ops::Range;

use thiserror::Error;

use crate::language::SupportedLanguage;

/// Failure to produce a syntax tree.
///
/// Malformed programs still parse; their trees carry ERROR and MISSING nodes.
/// These variants cover the library refusing to produce any tree at all.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ParseError {
    /// The grammar could not be loaded into a parser.
    #[error("failed to initialise parser for {language}: {message}")]
    ParserInit {
        /// The grammar that failed to load.
        language: SupportedLanguage,
        /// Description of the failure.
        message: String,
    },

    /// The parser returned no tree.
    #[error("failed to parse {language} source: parser produced no tree")]
    NoTree {
        /// The grammar used for the attempt.
        language: SupportedLanguage,
    },
}

impl ParseError {
    /// Creates a parser initialisation error.
    #[must_use]
    pub fn parser_init(language: SupportedLanguage, message: impl Into<String>) -> Self {
        Self::ParserInit {
            language,
            message: message.into(),
        }
    }
}

/// Category of a query compilation failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryErrorKind {
    /// Malformed s-expression (unbalanced parentheses, stray tokens).
    Syntax,
    /// Reference to a node type the grammar does not define.
    NodeType,
    /// Reference to a field name the grammar does not define.
    Field,
    /// A predicate names a capture the pattern never binds.
    Capture,
    /// Pattern shape impossible under the grammar, e.g. a token where a node
    /// was expected.
    Structure,
    /// A predicate name absent from the registry.
    UnknownPredicate,
    /// A predicate called with too few or too many arguments.
    PredicateArity,
    /// A predicate argument of the wrong kind or an unusable literal.
    PredicateArgument,
    /// The grammar itself is incompatible with the query engine.
    Language,
}

impl fmt::Display for QueryErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Syntax => "syntax error",
            Self::NodeType => "unknown node type",
            Self::Field => "unknown field",
            Self::Capture => "capture error",
            Self::Structure => "structure error",
            Self::UnknownPredicate => "unknown predicate",
            Self::PredicateArity => "predicate arity error",
            Self::PredicateArgument => "predicate argument error",
            Self::Language => "language error",
        };
        f.write_str(label)
    }
}

/// A query that failed to compile.
///
/// Positions are zero-based and refer to the pattern text passed by the
/// caller.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind} at {row}:{column}: {message}")]
pub struct QueryError {
    kind: QueryErrorKind,
    row: usize,
    column: usize,
    offset: usize,
    message: String,
}

impl QueryError {
    /// Creates a query error at the given position.
    #[must_use]
    pub fn new(
        kind: QueryErrorKind,
        row: usize,
        column: usize,
        offset: usize,
        message: impl Into<String>,
    ) -> Self {
        Self {
            kind,
            row,
            column,
            offset,
            message: message.into(),
        }
    }

    /// Returns the failure category.
    #[must_use]
    pub const fn kind(&self) -> QueryErrorKind {
        self.kind
    }

    /// Returns the zero-based row of the offending token.
    #[must_use]
    pub const fn row(&self) -> usize {
        self.row
    }

    /// Returns the zero-based column of the offending token.
    #[must_use]
    pub const fn column(&self) -> usize {
        self.column
    }

    /// Returns the byte offset of the offending token in the pattern text.
    #[must_use]
    pub const fn offset(&self) -> usize {
        self.offset
    }

    /// Returns the human-readable description.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Failure while registering a predicate.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum RegistryError {
    /// A predicate with the same name is already registered.
    #[error("predicate '{name}' is already registered")]
    Duplicate {
        /// The conflicting predicate name.
        name: String,
    },

    /// The predicate name is not usable inside a query.
    #[error("invalid predicate name '{name}': {reason}")]
    InvalidName {
        /// The rejected name.
        name: String,
        /// Why the name was rejected.
        reason: &'static str,
    },
}

/// Failure of a transformation run.
///
/// A transformation either rewrites every accepted match or returns one of
/// these errors; partial output is never produced.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TransformationError {
    /// The source could not be parsed.
    #[error(transparent)]
    Parse(#[from] ParseError),

    /// The query was compiled for a different grammar than the parser.
    #[error("query targets {query} but the parser targets {parser}")]
    LanguageMismatch {
        /// Grammar of the compiled query.
        query: SupportedLanguage,
        /// Grammar of the parser.
        parser: SupportedLanguage,
    },

    /// A pattern or match does not bind the anchor capture.
    #[error("pattern {pattern_index} does not bind the anchor capture @{anchor}")]
    MissingAnchorCapture {
        /// Index of the offending pattern.
        pattern_index: usize,
        /// Name of the required capture.
        anchor: String,
    },

    /// A match overlaps a span that an earlier match already rewrites.
    #[error(
        "match at bytes {}..{} overlaps the replacement at bytes {}..{}",
        range.start,
        range.end,
        previous.start,
        previous.end
    )]
    RecursiveOrOverlappingMatch {
        /// Anchor span of the rejected match.
        range: Range<usize>,
        /// Anchor span of the earlier replacement it collides with.
        previous: Range<usize>,
    },

    /// The template references a capture the query never defines.
    #[error("template references undefined capture @{name}")]
    UnknownPlaceholder {
        /// The placeholder name.
        name: String,
    },

    /// A replacement range does not fall on UTF-8 character boundaries.
    #[error("replacement range {}..{} is not on a UTF-8 boundary", range.start, range.end)]
    InvalidRange {
        /// The offending byte range.
        range: Range<usize>,
    },
}
