//! Evaluation of a pattern's predicate clauses against a match.

use crate::cursor::Match;
use crate::query::Query;

use super::{PredicateContext, PredicateInvocation};

/// Predicate evaluator bound to one source text.
///
/// All node text is read from the bound source, so an evaluator must only
/// be used with matches from the tree parsed from that text.
#[derive(Debug, Clone, Copy)]
pub struct Predicates<'s> {
    source: &'s str,
}

impl<'s> Predicates<'s> {
    /// Binds an evaluator to `source`.
    #[must_use]
    pub const fn new(source: &'s str) -> Self {
        Self { source }
    }

    /// Returns the bound source text.
    #[must_use]
    pub const fn source(&self) -> &'s str {
        self.source
    }

    /// Evaluates a single predicate clause.
    #[must_use]
    pub fn evaluate(&self, invocation: &PredicateInvocation, matched: &Match<'_, '_>) -> bool {
        invocation.check(&PredicateContext::new(matched, self.source))
    }

    /// Returns whether every predicate of the match's pattern holds.
    ///
    /// Evaluation stops at the first rejecting clause. A pattern without
    /// predicates accepts every match.
    #[must_use]
    pub fn accepts(&self, query: &Query, matched: &Match<'_, '_>) -> bool {
        query
            .pattern(matched.pattern_index())
            .is_none_or(|pattern| {
                pattern
                    .predicates()
                    .iter()
                    .all(|invocation| self.evaluate(invocation, matched))
            })
    }
}
