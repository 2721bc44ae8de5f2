//! Data a predicate check can inspect.

use crate::cursor::Match;
use crate::parser::SyntaxNode;

use super::CaptureRef;

/// A candidate match together with the source text it was found in.
///
/// Node text is always read from [`PredicateContext::source`], the text the
/// evaluator was bound to, so a check never sees text from another buffer.
#[derive(Debug, Clone, Copy)]
pub struct PredicateContext<'a> {
    matched: &'a Match<'a, 'a>,
    source: &'a str,
}

impl<'a> PredicateContext<'a> {
    /// Creates a context for one candidate match.
    #[must_use]
    pub const fn new(matched: &'a Match<'a, 'a>, source: &'a str) -> Self {
        Self { matched, source }
    }

    /// Returns the candidate match.
    #[must_use]
    pub const fn matched(&self) -> &'a Match<'a, 'a> {
        self.matched
    }

    /// Returns the source text the evaluator is bound to.
    #[must_use]
    pub const fn source(&self) -> &'a str {
        self.source
    }

    /// Returns the nodes bound to `capture`, in source order.
    #[must_use]
    pub fn nodes(&self, capture: &CaptureRef) -> Vec<SyntaxNode<'a>> {
        self.matched.nodes_for_index(capture.index())
    }

    /// Returns the source text of every node bound to `capture`.
    #[must_use]
    pub fn texts(&self, capture: &CaptureRef) -> Vec<&'a str> {
        self.nodes(capture)
            .iter()
            .map(|node| node.text_in(self.source))
            .collect()
    }

    /// Returns the text of `node` within the bound source.
    #[must_use]
    pub fn text_of(&self, node: &SyntaxNode<'_>) -> &'a str {
        node.text_in(self.source)
    }
}
