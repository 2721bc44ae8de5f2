//! Tree-sitter parsing wrapper and borrowed node views.
//!
//! [`Parser`] turns source text into an owned, immutable [`SyntaxTree`].
//! Nodes are exposed as [`SyntaxNode`] values that borrow the tree, so the
//! compiler rejects any attempt to keep a node after its tree is dropped.

use std::fmt;
use std::ops::Range;

use crate::error::ParseError;
use crate::language::SupportedLanguage;

/// An owned syntax tree together with the text it was parsed from.
///
/// Tree-sitter is error-tolerant, so a tree may contain ERROR and MISSING
/// nodes. Callers inspect [`SyntaxTree::has_errors`] or the per-node flags;
/// parsing itself never rejects malformed input.
#[derive(Debug, Clone)]
pub struct SyntaxTree {
    tree: tree_sitter::Tree,
    source: String,
    language: SupportedLanguage,
}

impl SyntaxTree {
    /// Returns the root node.
    #[must_use]
    pub fn root_node(&self) -> SyntaxNode<'_> {
        SyntaxNode::new(self.tree.root_node(), &self.source)
    }

    /// Returns the source code that was parsed.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the grammar of the parsed code.
    #[must_use]
    pub const fn language(&self) -> SupportedLanguage {
        self.language
    }

    /// Returns the underlying Tree-sitter tree.
    #[must_use]
    pub const fn tree(&self) -> &tree_sitter::Tree {
        &self.tree
    }

    /// Returns whether the tree contains any ERROR or MISSING nodes.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.tree.root_node().has_error()
    }

    /// Collects all syntax errors found in the tree.
    #[must_use]
    pub fn errors(&self) -> Vec<SyntaxErrorInfo> {
        let mut errors = Vec::new();
        collect_error_nodes(self.tree.root_node(), &self.source, &mut errors);
        errors
    }
}

/// Information about a syntax error found during parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyntaxErrorInfo {
    /// Byte range of the error in the source.
    pub byte_range: Range<usize>,
    /// Line number (one-based) where the error starts.
    pub line: u32,
    /// Column number (one-based) where the error starts.
    pub column: u32,
    /// A snippet of the problematic source text.
    pub context: String,
    /// Human-readable description of the error.
    pub message: String,
}

impl SyntaxErrorInfo {
    fn from_node(node: tree_sitter::Node<'_>, source: &str) -> Self {
        let byte_range = node.byte_range();

        let context = source
            .get(byte_range.clone())
            .map(|s| {
                if s.len() > 50 {
                    let truncated: String = s.chars().take(47).collect();
                    format!("{truncated}...")
                } else {
                    s.to_owned()
                }
            })
            .unwrap_or_default();

        let message = if node.is_missing() {
            format!("missing {}", node.kind())
        } else {
            "syntax error".to_owned()
        };

        let (line, column) = point_to_one_based(node.start_position());

        Self {
            byte_range,
            line,
            column,
            context,
            message,
        }
    }
}

impl fmt::Display for SyntaxErrorInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} near '{}'",
            self.line, self.column, self.message, self.context
        )
    }
}

/// A borrowed view of one node in a [`SyntaxTree`].
///
/// The `'tree` lifetime ties the view to its tree; nodes are cheap to copy.
#[derive(Clone, Copy)]
pub struct SyntaxNode<'tree> {
    node: tree_sitter::Node<'tree>,
    source: &'tree str,
}

impl<'tree> SyntaxNode<'tree> {
    pub(crate) const fn new(node: tree_sitter::Node<'tree>, source: &'tree str) -> Self {
        Self { node, source }
    }

    /// Returns the grammar type name of the node, e.g. `field_expression`.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        self.node.kind()
    }

    /// Returns whether the node is grammar-significant (not punctuation).
    #[must_use]
    pub fn is_named(&self) -> bool {
        self.node.is_named()
    }

    /// Returns whether the parser inserted this node to recover from an error.
    #[must_use]
    pub fn is_missing(&self) -> bool {
        self.node.is_missing()
    }

    /// Returns whether this node is an ERROR node.
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.node.is_error()
    }

    /// Returns whether this node or any descendant is an ERROR or MISSING node.
    #[must_use]
    pub fn has_error(&self) -> bool {
        self.node.has_error()
    }

    /// Returns the byte range the node spans.
    #[must_use]
    pub fn byte_range(&self) -> Range<usize> {
        self.node.byte_range()
    }

    /// Returns the start position (line, column), both one-based.
    #[must_use]
    pub fn start_position(&self) -> (u32, u32) {
        point_to_one_based(self.node.start_position())
    }

    /// Returns the end position (line, column), both one-based.
    #[must_use]
    pub fn end_position(&self) -> (u32, u32) {
        point_to_one_based(self.node.end_position())
    }

    /// Returns the exact source text the node spans.
    #[must_use]
    pub fn text(&self) -> &'tree str {
        self.source.get(self.byte_range()).unwrap_or_default()
    }

    /// Returns the text the node spans within `source`.
    ///
    /// Byte offsets are applied verbatim; an out-of-range or non-boundary
    /// span yields an empty string.
    #[must_use]
    pub fn text_in<'s>(&self, source: &'s str) -> &'s str {
        source.get(self.byte_range()).unwrap_or_default()
    }

    /// Returns all children, named and anonymous, in source order.
    #[must_use]
    pub fn children(&self) -> Vec<Self> {
        let mut cursor = self.node.walk();
        self.node
            .children(&mut cursor)
            .map(|child| self.wrap(child))
            .collect()
    }

    /// Returns only the grammar-significant children in source order.
    #[must_use]
    pub fn named_children(&self) -> Vec<Self> {
        let mut cursor = self.node.walk();
        self.node
            .named_children(&mut cursor)
            .map(|child| self.wrap(child))
            .collect()
    }

    /// Returns the first child, if any.
    #[must_use]
    pub fn first_child(&self) -> Option<Self> {
        self.node.child(0).map(|child| self.wrap(child))
    }

    /// Returns the child bound to `field`, if any.
    #[must_use]
    pub fn child_by_field_name(&self, field: &str) -> Option<Self> {
        self.node
            .child_by_field_name(field)
            .map(|child| self.wrap(child))
    }

    /// Returns the parent node, or `None` for the root.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.node.parent().map(|parent| self.wrap(parent))
    }

    /// Iterates over the ancestors of this node, nearest first.
    pub fn ancestors(&self) -> impl Iterator<Item = SyntaxNode<'tree>> + use<'tree> {
        std::iter::successors(self.parent(), SyntaxNode::parent)
    }

    /// Returns the previous sibling, named or anonymous.
    #[must_use]
    pub fn prev_sibling(&self) -> Option<Self> {
        self.node.prev_sibling().map(|sibling| self.wrap(sibling))
    }

    /// Returns the next sibling, named or anonymous.
    #[must_use]
    pub fn next_sibling(&self) -> Option<Self> {
        self.node.next_sibling().map(|sibling| self.wrap(sibling))
    }

    pub(crate) const fn source(&self) -> &'tree str {
        self.source
    }

    /// Returns the underlying Tree-sitter node.
    #[must_use]
    pub const fn as_tree_sitter(&self) -> tree_sitter::Node<'tree> {
        self.node
    }

    const fn wrap(&self, node: tree_sitter::Node<'tree>) -> Self {
        Self::new(node, self.source)
    }
}

impl PartialEq for SyntaxNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.node == other.node
    }
}

impl Eq for SyntaxNode<'_> {}

impl fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyntaxNode")
            .field("kind", &self.kind())
            .field("byte_range", &self.byte_range())
            .field("text", &self.text())
            .finish()
    }
}

/// Tree-sitter parser wrapper for a specific grammar.
///
/// Each parser instance is configured for a single grammar. Create multiple
/// parsers if you need to parse multiple languages.
pub struct Parser {
    inner: tree_sitter::Parser,
    language: SupportedLanguage,
}

impl fmt::Debug for Parser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Parser")
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

impl Parser {
    /// Creates a new parser for the given grammar.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::ParserInit`] if the grammar is incompatible
    /// with the linked Tree-sitter runtime.
    pub fn new(language: SupportedLanguage) -> Result<Self, ParseError> {
        let mut inner = tree_sitter::Parser::new();
        inner
            .set_language(&language.tree_sitter_language())
            .map_err(|e| ParseError::parser_init(language, e.to_string()))?;

        Ok(Self { inner, language })
    }

    /// Returns the grammar this parser is configured for.
    #[must_use]
    pub const fn language(&self) -> SupportedLanguage {
        self.language
    }

    /// Parses source code into a fresh tree.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::NoTree`] if Tree-sitter produces no tree. This
    /// is rare and typically indicates a parser configuration issue.
    pub fn parse(&mut self, source: &str) -> Result<SyntaxTree, ParseError> {
        let tree = self
            .inner
            .parse(source, None)
            .ok_or(ParseError::NoTree {
                language: self.language,
            })?;

        tracing::trace!(
            language = %self.language,
            bytes = source.len(),
            has_errors = tree.root_node().has_error(),
            "parsed source"
        );

        Ok(SyntaxTree {
            tree,
            source: source.to_owned(),
            language: self.language,
        })
    }
}

/// Converts a zero-based Tree-sitter point to one-based (line, column).
fn point_to_one_based(point: tree_sitter::Point) -> (u32, u32) {
    let one_based = |value: usize| u32::try_from(value.saturating_add(1)).unwrap_or(u32::MAX);
    (one_based(point.row), one_based(point.column))
}

/// Recursively collects all ERROR and MISSING nodes from a syntax tree.
fn collect_error_nodes(
    node: tree_sitter::Node<'_>,
    source: &str,
    errors: &mut Vec<SyntaxErrorInfo>,
) {
    if node.is_error() || node.is_missing() {
        errors.push(SyntaxErrorInfo::from_node(node, source));
    }

    if !node.has_error() {
        return;
    }

    let mut cursor = node.walk();
    for child in node.children(&mut cursor) {
        collect_error_nodes(child, source, errors);
    }
}
