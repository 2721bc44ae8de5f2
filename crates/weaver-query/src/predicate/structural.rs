//! Structural predicates that inspect the tree around a capture.
//!
//! These cover context a query pattern cannot express on its own, such as
//! "this call sits between two marker macros".

use std::fmt;
use std::sync::Arc;

use crate::parser::SyntaxNode;

use super::{
    ArgumentRule, CaptureRef, Predicate, PredicateArgument, PredicateCheck, PredicateContext,
    PredicateSignature,
};

type NodeTest = dyn for<'a> Fn(&[SyntaxNode<'a>]) -> bool + Send + Sync;

/// Adapts a closure over captured nodes into a predicate.
///
/// The predicate takes one or more captures and no literals. The closure
/// receives the nodes of every capture argument, in argument order and then
/// source order. A clause whose captures bind nothing evaluates to `false`
/// without calling the closure.
#[derive(Clone)]
pub struct StructuralPredicate {
    test: Arc<NodeTest>,
}

impl StructuralPredicate {
    /// Wraps `test` as a captures-only predicate.
    pub fn new<F>(test: F) -> Self
    where
        F: for<'a> Fn(&[SyntaxNode<'a>]) -> bool + Send + Sync + 'static,
    {
        Self {
            test: Arc::new(test),
        }
    }
}

impl fmt::Debug for StructuralPredicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructuralPredicate").finish_non_exhaustive()
    }
}

impl Predicate for StructuralPredicate {
    fn signature(&self) -> PredicateSignature {
        PredicateSignature::at_least(1, ArgumentRule::CapturesOnly)
    }

    fn bind(&self, arguments: &[PredicateArgument]) -> Result<Box<dyn PredicateCheck>, String> {
        Ok(Box::new(StructuralCheck {
            captures: capture_arguments(arguments)?,
            test: Arc::clone(&self.test),
        }))
    }
}

struct StructuralCheck {
    captures: Vec<CaptureRef>,
    test: Arc<NodeTest>,
}

impl PredicateCheck for StructuralCheck {
    fn check(&self, context: &PredicateContext<'_>) -> bool {
        let nodes: Vec<_> = self
            .captures
            .iter()
            .flat_map(|capture| context.nodes(capture))
            .collect();
        !nodes.is_empty() && (self.test)(&nodes)
    }
}

/// Accepts nodes that sit inside a block opened and closed by marker calls.
///
/// A node is inside the block when the nearest marker token before it is the
/// opening one. Previous siblings are searched from the last token back,
/// then the previous siblings of each ancestor, so markers are found whether
/// the grammar reads `BEGIN_MESSAGE_MAP(Dialog, Base)` as a statement, a
/// declaration or an error node at file scope. Every node bound to every
/// capture argument must be inside a block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnclosingBlock {
    begin: String,
    end: String,
}

impl EnclosingBlock {
    /// Creates a predicate for blocks delimited by `begin` and `end`.
    #[must_use]
    pub fn new(begin: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            begin: begin.into(),
            end: end.into(),
        }
    }

    /// The `BEGIN_MESSAGE_MAP` / `END_MESSAGE_MAP` pair behind the
    /// built-in `in_message_map?`.
    #[must_use]
    pub fn message_map() -> Self {
        Self::new("BEGIN_MESSAGE_MAP", "END_MESSAGE_MAP")
    }

    /// Returns the opening marker.
    #[must_use]
    pub fn begin(&self) -> &str {
        &self.begin
    }

    /// Returns the closing marker.
    #[must_use]
    pub fn end(&self) -> &str {
        &self.end
    }

    /// Returns whether `node` is enclosed by the markers, reading marker
    /// text from `source`.
    #[must_use]
    pub fn encloses(&self, node: SyntaxNode<'_>, source: &str) -> bool {
        for level in std::iter::once(node).chain(node.ancestors()) {
            let mut sibling = level.prev_sibling();
            while let Some(current) = sibling {
                match self.last_marker(current, source) {
                    Some(Marker::Begin) => return true,
                    Some(Marker::End) => return false,
                    None => sibling = current.prev_sibling(),
                }
            }
        }
        false
    }

    /// Returns the last marker token inside `node`.
    fn last_marker(&self, node: SyntaxNode<'_>, source: &str) -> Option<Marker> {
        let children = node.children();
        if children.is_empty() {
            return self.marker(node.text_in(source));
        }
        children
            .into_iter()
            .rev()
            .find_map(|child| self.last_marker(child, source))
    }

    fn marker(&self, text: &str) -> Option<Marker> {
        if text == self.begin {
            Some(Marker::Begin)
        } else if text == self.end {
            Some(Marker::End)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Begin,
    End,
}

impl Predicate for EnclosingBlock {
    fn signature(&self) -> PredicateSignature {
        PredicateSignature::at_least(1, ArgumentRule::CapturesOnly)
    }

    fn bind(&self, arguments: &[PredicateArgument]) -> Result<Box<dyn PredicateCheck>, String> {
        Ok(Box::new(EnclosingBlockCheck {
            block: self.clone(),
            captures: capture_arguments(arguments)?,
        }))
    }
}

struct EnclosingBlockCheck {
    block: EnclosingBlock,
    captures: Vec<CaptureRef>,
}

impl PredicateCheck for EnclosingBlockCheck {
    fn check(&self, context: &PredicateContext<'_>) -> bool {
        let nodes: Vec<_> = self
            .captures
            .iter()
            .flat_map(|capture| context.nodes(capture))
            .collect();
        !nodes.is_empty()
            && nodes
                .iter()
                .all(|node| self.block.encloses(*node, context.source()))
    }
}

fn capture_arguments(arguments: &[PredicateArgument]) -> Result<Vec<CaptureRef>, String> {
    arguments
        .iter()
        .map(|argument| {
            argument
                .as_capture()
                .cloned()
                .ok_or_else(|| format!("expected a capture, got {argument}"))
        })
        .collect()
}
