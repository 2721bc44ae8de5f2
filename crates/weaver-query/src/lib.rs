//! Tree-sitter powered query and rewrite engine.
//!
//! The crate compiles declarative tree queries, runs them over parsed
//! source, filters matches through pluggable predicates, and rewrites the
//! matched spans through text templates:
//!
//! - **Parsing** via [`Parser`], producing an owned [`SyntaxTree`] whose
//!   [`SyntaxNode`] views cannot outlive it
//! - **Query compilation** via [`Query`], which validates node types,
//!   fields, captures and predicate clauses up front
//! - **Predicates** via [`PredicateRegistry`]: `eq?`, `match?`,
//!   `in_message_map?`, and any [`Predicate`] a host registers
//! - **Matching** via [`QueryCursor`], yielding [`Match`]es in tree
//!   pre-order with every node of a quantified capture preserved
//! - **Rewriting** via [`Transformation`], which replaces the span of an
//!   anchor capture (`@from`) with an instantiated template
//!
//! # Supported Languages
//!
//! - C++ (`.cpp`, `.cc`, `.cxx`, `.h`, `.hpp`, ...)
//! - Rust (`.rs`)
//! - Python (`.py`, `.pyi`)
//! - TypeScript (`.ts`, `.tsx`, `.mts`, `.cts`)
//!
//! # Query Language
//!
//! Queries use Tree-sitter's s-expression syntax: `(node_type)`, fields
//! (`field: (pattern)`), wildcards (`(_)`), anonymous tokens (`"."`),
//! captures (`@name`), quantifiers (`?`, `*`, `+`) and predicate clauses
//! such as `(#eq? @name "main")`. Predicate arguments may appear in any
//! order as long as the predicate's signature is satisfied.
//!
//! # Example: Querying
//!
//! ```ignore
//! use weaver_query::{Parser, Predicates, Query, QueryCursor, SupportedLanguage};
//!
//! let mut parser = Parser::new(SupportedLanguage::Cpp)?;
//! let tree = parser.parse("int main() {} int mainImpl() {}")?;
//! let query = Query::new(
//!     SupportedLanguage::Cpp,
//!     r#"(function_declarator declarator: (_) @name (#eq? @name "main"))"#,
//! )?;
//!
//! let mut cursor = QueryCursor::new();
//! cursor.execute(&query, tree.root_node(), Some(Predicates::new(tree.source())));
//! let names: Vec<_> = cursor
//!     .map(|m| m.capture("name").map(|n| n.text()).unwrap_or_default())
//!     .collect();
//! assert_eq!(names, ["main"]);
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Example: Rewriting
//!
//! ```ignore
//! use std::sync::Arc;
//! use weaver_query::{Parser, Query, SupportedLanguage, transform};
//!
//! let query = Query::new(
//!     SupportedLanguage::Cpp,
//!     r#"(field_expression argument: (_) @arg "." field: (_) @field) @from"#,
//! )?;
//! let result = transform(
//!     "void f() { object.field = 1; }",
//!     Parser::new(SupportedLanguage::Cpp)?,
//!     Arc::new(query),
//!     "@arg->@field",
//! )?;
//! assert_eq!(result.output(), "void f() { object->field = 1; }");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

mod cursor;
mod error;
mod language;
mod parser;
mod predicate;
mod query;
mod template;
mod transformation;

pub mod telemetry;

pub use cursor::{CursorState, Match, MatchCapture, QueryCursor};
pub use error::{ParseError, QueryError, QueryErrorKind, RegistryError, TransformationError};
pub use language::{LanguageParseError, SupportedLanguage};
pub use parser::{Parser, SyntaxErrorInfo, SyntaxNode, SyntaxTree};
pub use predicate::{
    ArgumentRule, CaptureRef, EnclosingBlock, EqPredicate, MatchPredicate, Predicate,
    PredicateArgument, PredicateCheck, PredicateContext, PredicateInvocation, PredicateRegistry,
    PredicateSignature, Predicates, StructuralPredicate,
};
pub use query::{Pattern, PatternCapture, Quantifier, Query};
pub use template::{Segment, Template};
pub use transformation::{Transformation, TransformationResult, transform};
