//! Execution of compiled queries over a syntax tree.
//!
//! A [`QueryCursor`] walks a tree (or a subtree) and yields [`Match`]es in
//! tree pre-order of their outermost captured node. When a [`Predicates`]
//! evaluator is attached, matches rejected by a predicate are skipped; the
//! caller never observes them.

mod capture;

use std::cmp::Ordering;
use std::collections::VecDeque;
use std::fmt;
use std::ops::Range;

use tree_sitter::StreamingIterator;

use crate::parser::SyntaxNode;
use crate::predicate::Predicates;
use crate::query::Query;

pub use capture::{Match, MatchCapture};

/// Lifecycle of a [`QueryCursor`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CursorState {
    /// No query has been executed yet.
    #[default]
    Idle,
    /// Matches may remain.
    Executing,
    /// Every match has been returned.
    Exhausted,
}

/// Iteration state for running one query over one tree.
///
/// [`execute`](Self::execute) resets the cursor and prepares the candidate
/// matches; [`next_match`](Self::next_match) (or the [`Iterator`] impl)
/// returns them one at a time. Once exhausted the cursor keeps returning
/// `None` until executed again.
///
/// `execute` collects every raw match up front so they can be put in
/// pre-order; memory therefore grows with the number of structural matches
/// in the tree or byte range, not with the number the caller consumes.
/// Predicates still run lazily, one candidate per `next_match`. Narrow
/// large trees with [`set_byte_range`](Self::set_byte_range).
///
/// ```ignore
/// let mut cursor = QueryCursor::new();
/// cursor.execute(&query, tree.root_node(), Some(Predicates::new(tree.source())));
/// for m in cursor.by_ref() {
///     println!("{:?}", m.capture("name"));
/// }
/// ```
pub struct QueryCursor<'tree, 'query> {
    inner: tree_sitter::QueryCursor,
    byte_range: Option<Range<usize>>,
    query: Option<&'query Query>,
    predicates: Option<Predicates<'tree>>,
    pending: VecDeque<Match<'tree, 'query>>,
    state: CursorState,
    accepted: usize,
    rejected: usize,
}

impl<'tree, 'query> QueryCursor<'tree, 'query> {
    /// Creates an idle cursor.
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: tree_sitter::QueryCursor::new(),
            byte_range: None,
            query: None,
            predicates: None,
            pending: VecDeque::new(),
            state: CursorState::Idle,
            accepted: 0,
            rejected: 0,
        }
    }

    /// Restricts subsequent executions to nodes intersecting `range`.
    pub fn set_byte_range(&mut self, range: Range<usize>) -> &mut Self {
        self.byte_range = Some(range);
        self
    }

    /// Returns the current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> CursorState {
        self.state
    }

    /// Starts running `query` over `node` and its descendants.
    ///
    /// Any previous iteration is discarded. With `predicates` set to `None`
    /// only the structural shape is matched and predicate clauses are
    /// ignored.
    pub fn execute(
        &mut self,
        query: &'query Query,
        node: SyntaxNode<'tree>,
        predicates: Option<Predicates<'tree>>,
    ) {
        if let Some(range) = &self.byte_range {
            self.inner.set_byte_range(range.clone());
        }

        let mut candidates = self.collect_candidates(query, node);
        candidates.sort_by(|a, b| pre_order(a.byte_range(), b.byte_range()));

        tracing::debug!(
            patterns = query.pattern_count(),
            candidates = candidates.len(),
            evaluate_predicates = predicates.is_some(),
            "executing query"
        );

        self.query = Some(query);
        self.predicates = predicates;
        self.pending = candidates.into();
        self.state = CursorState::Executing;
        self.accepted = 0;
        self.rejected = 0;
    }

    /// Returns the next accepted match, or `None` once exhausted.
    pub fn next_match(&mut self) -> Option<Match<'tree, 'query>> {
        if self.state != CursorState::Executing {
            return None;
        }

        while let Some(candidate) = self.pending.pop_front() {
            if self.accepts(&candidate) {
                self.accepted += 1;
                return Some(candidate);
            }
            self.rejected += 1;
            tracing::trace!(
                pattern_index = candidate.pattern_index(),
                range = ?candidate.byte_range(),
                "match rejected by predicate"
            );
        }

        self.state = CursorState::Exhausted;
        tracing::trace!(
            accepted = self.accepted,
            rejected = self.rejected,
            "query cursor exhausted"
        );
        None
    }

    /// Drains every remaining accepted match, in order.
    pub fn all_remaining_matches(&mut self) -> Vec<Match<'tree, 'query>> {
        self.by_ref().collect()
    }

    fn collect_candidates(
        &mut self,
        query: &'query Query,
        node: SyntaxNode<'tree>,
    ) -> Vec<Match<'tree, 'query>> {
        let source = node.source();
        let mut candidates = Vec::new();
        let mut raw = self
            .inner
            .matches(query.inner(), node.as_tree_sitter(), source.as_bytes());
        while let Some(found) = raw.next() {
            let captures = found
                .captures
                .iter()
                .filter_map(|capture| {
                    query.capture_name(capture.index).map(|name| {
                        MatchCapture::new(capture.index, name, SyntaxNode::new(capture.node, source))
                    })
                })
                .collect();
            candidates.push(Match::new(found.pattern_index, captures));
        }
        candidates
    }

    fn accepts(&self, candidate: &Match<'tree, 'query>) -> bool {
        match (self.query, &self.predicates) {
            (Some(query), Some(predicates)) => predicates.accepts(query, candidate),
            _ => true,
        }
    }
}

impl Default for QueryCursor<'_, '_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'tree, 'query> Iterator for QueryCursor<'tree, 'query> {
    type Item = Match<'tree, 'query>;

    fn next(&mut self) -> Option<Self::Item> {
        self.next_match()
    }
}

impl fmt::Debug for QueryCursor<'_, '_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueryCursor")
            .field("state", &self.state)
            .field("byte_range", &self.byte_range)
            .field("pending", &self.pending.len())
            .finish_non_exhaustive()
    }
}

/// Orders by start ascending, then by end descending, so an enclosing node
/// precedes the nodes it contains. Matches without captures come first.
fn pre_order(left: Option<Range<usize>>, right: Option<Range<usize>>) -> Ordering {
    match (left, right) {
        (Some(a), Some(b)) => a.start.cmp(&b.start).then(b.end.cmp(&a.end)),
        (a, b) => a.is_some().cmp(&b.is_some()),
    }
}
