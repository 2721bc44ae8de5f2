//! Matches produced by a [`QueryCursor`](super::QueryCursor).

use std::ops::Range;

use crate::parser::SyntaxNode;
use crate::query::strip_sigil;

/// One node bound to a capture within a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MatchCapture<'tree, 'query> {
    index: u32,
    name: &'query str,
    node: SyntaxNode<'tree>,
}

impl<'tree, 'query> MatchCapture<'tree, 'query> {
    pub(crate) const fn new(index: u32, name: &'query str, node: SyntaxNode<'tree>) -> Self {
        Self { index, name, node }
    }

    /// Returns the capture index within the query.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Returns the capture name without the `@` sigil.
    #[must_use]
    pub const fn name(&self) -> &'query str {
        self.name
    }

    /// Returns the bound node.
    #[must_use]
    pub const fn node(&self) -> SyntaxNode<'tree> {
        self.node
    }
}

/// A successful application of one pattern.
///
/// A capture name maps to every node it bound, in source order; quantified
/// captures (`+`, `*`) therefore yield several nodes under one name. A match
/// borrows both the tree and the query it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Match<'tree, 'query> {
    pattern_index: usize,
    captures: Vec<MatchCapture<'tree, 'query>>,
}

impl<'tree, 'query> Match<'tree, 'query> {
    pub(crate) fn new(pattern_index: usize, mut captures: Vec<MatchCapture<'tree, 'query>>) -> Self {
        captures.sort_by_key(|capture| capture.node.byte_range().start);
        Self {
            pattern_index,
            captures,
        }
    }

    /// Returns the index of the pattern that produced this match.
    #[must_use]
    pub const fn pattern_index(&self) -> usize {
        self.pattern_index
    }

    /// Returns every bound node in source order.
    #[must_use]
    pub fn captures(&self) -> &[MatchCapture<'tree, 'query>] {
        &self.captures
    }

    /// Returns the nodes bound to `name`, in source order.
    ///
    /// An unknown or unbound name yields an empty list.
    #[must_use]
    pub fn captures_named(&self, name: &str) -> Vec<SyntaxNode<'tree>> {
        let bare = strip_sigil(name);
        self.captures
            .iter()
            .filter(|capture| capture.name == bare)
            .map(|capture| capture.node)
            .collect()
    }

    /// Returns the first node bound to `name`.
    #[must_use]
    pub fn capture(&self, name: &str) -> Option<SyntaxNode<'tree>> {
        let bare = strip_sigil(name);
        self.captures
            .iter()
            .find(|capture| capture.name == bare)
            .map(|capture| capture.node)
    }

    /// Returns whether `name` bound at least one node.
    #[must_use]
    pub fn has_capture(&self, name: &str) -> bool {
        self.capture(name).is_some()
    }

    /// Returns the byte range of the outermost captured node, or `None`
    /// for a match without captures.
    #[must_use]
    pub fn byte_range(&self) -> Option<Range<usize>> {
        outermost(&self.captures)
    }

    pub(crate) fn nodes_for_index(&self, index: u32) -> Vec<SyntaxNode<'tree>> {
        self.captures
            .iter()
            .filter(|capture| capture.index == index)
            .map(|capture| capture.node)
            .collect()
    }
}

/// Earliest start, and on ties the widest span.
pub(super) fn outermost(captures: &[MatchCapture<'_, '_>]) -> Option<Range<usize>> {
    captures
        .iter()
        .map(|capture| capture.node.byte_range())
        .min_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)))
}
