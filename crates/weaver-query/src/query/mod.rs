//! Compilation and validation of tree queries.
//!
//! A [`Query`] is compiled once from pattern text and a grammar, then shared
//! read-only between cursors. Compilation validates node types, field
//! names, capture references and predicate clauses; a query that compiles
//! can always be executed, and its predicates always evaluate to a boolean.

mod namespace;

use std::fmt;

use tree_sitter::{CaptureQuantifier, QueryPredicateArg};

use crate::error::{QueryError, QueryErrorKind};
use crate::language::SupportedLanguage;
use crate::predicate::{CaptureRef, PredicateArgument, PredicateInvocation, PredicateRegistry};

use namespace::Namespaced;

/// How many nodes a capture binds within one match of a pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quantifier {
    /// Exactly one node.
    One,
    /// Zero or one node (`?`).
    ZeroOrOne,
    /// Any number of nodes (`*`).
    ZeroOrMore,
    /// At least one node (`+`).
    OneOrMore,
}

impl Quantifier {
    const fn from_tree_sitter(quantifier: CaptureQuantifier) -> Option<Self> {
        match quantifier {
            CaptureQuantifier::Zero => None,
            CaptureQuantifier::ZeroOrOne => Some(Self::ZeroOrOne),
            CaptureQuantifier::ZeroOrMore => Some(Self::ZeroOrMore),
            CaptureQuantifier::One => Some(Self::One),
            CaptureQuantifier::OneOrMore => Some(Self::OneOrMore),
        }
    }

    /// Returns whether a match may bind more than one node.
    #[must_use]
    pub const fn is_repeatable(self) -> bool {
        matches!(self, Self::ZeroOrMore | Self::OneOrMore)
    }

    /// Returns whether a match may bind no node at all.
    #[must_use]
    pub const fn is_optional(self) -> bool {
        matches!(self, Self::ZeroOrOne | Self::ZeroOrMore)
    }
}

/// A capture a pattern can bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternCapture {
    index: u32,
    name: String,
    quantifier: Quantifier,
}

impl PatternCapture {
    /// Returns the capture index within the query.
    #[must_use]
    pub const fn index(&self) -> u32 {
        self.index
    }

    /// Returns the capture name without the `@` sigil.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns how many nodes one match binds.
    #[must_use]
    pub const fn quantifier(&self) -> Quantifier {
        self.quantifier
    }
}

/// One top-level alternative of a [`Query`].
#[derive(Debug)]
pub struct Pattern {
    index: usize,
    start_byte: usize,
    captures: Vec<PatternCapture>,
    predicates: Vec<PredicateInvocation>,
}

impl Pattern {
    /// Returns the pattern's position within the query.
    #[must_use]
    pub const fn index(&self) -> usize {
        self.index
    }

    /// Returns the byte offset at which the pattern starts in the query text.
    #[must_use]
    pub const fn start_byte(&self) -> usize {
        self.start_byte
    }

    /// Returns the captures this pattern can bind, in query order.
    #[must_use]
    pub fn captures(&self) -> &[PatternCapture] {
        &self.captures
    }

    /// Returns the predicate clauses attached to this pattern, in order.
    #[must_use]
    pub fn predicates(&self) -> &[PredicateInvocation] {
        &self.predicates
    }

    /// Returns the quantifier of `name`, or `None` if this pattern never
    /// binds it.
    #[must_use]
    pub fn quantifier(&self, name: &str) -> Option<Quantifier> {
        let bare = strip_sigil(name);
        self.captures
            .iter()
            .find(|capture| capture.name == bare)
            .map(PatternCapture::quantifier)
    }

    /// Returns whether this pattern can bind `name`.
    #[must_use]
    pub fn binds(&self, name: &str) -> bool {
        self.quantifier(name).is_some()
    }
}

/// A compiled, immutable tree query.
///
/// # Example
///
/// ```ignore
/// use weaver_query::{Query, SupportedLanguage};
///
/// let query = Query::new(
///     SupportedLanguage::Cpp,
///     r#"((identifier) @name (#eq? @name "main"))"#,
/// )?;
/// assert_eq!(query.captures(), ["name"]);
/// assert_eq!(query.patterns()[0].predicates()[0].name(), "eq?");
/// # Ok::<(), weaver_query::QueryError>(())
/// ```
pub struct Query {
    inner: tree_sitter::Query,
    source: String,
    language: SupportedLanguage,
    captures: Vec<String>,
    patterns: Vec<Pattern>,
}

impl Query {
    /// Compiles `source` for `language` using the built-in predicates.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] whose kind identifies the failed check.
    pub fn new(language: SupportedLanguage, source: &str) -> Result<Self, QueryError> {
        Self::with_registry(language, source, PredicateRegistry::builtins())
    }

    /// Compiles `source` for `language`, resolving predicates in `registry`.
    ///
    /// # Errors
    ///
    /// Returns a [`QueryError`] for malformed pattern text, unknown node
    /// types or fields, predicates referencing unbound captures, impossible
    /// pattern structure, unregistered predicates, and predicate clauses
    /// that violate their signature.
    pub fn with_registry(
        language: SupportedLanguage,
        source: &str,
        registry: &PredicateRegistry,
    ) -> Result<Self, QueryError> {
        let namespaced = Namespaced::new(source);
        let inner = tree_sitter::Query::new(&language.tree_sitter_language(), namespaced.text())
            .map_err(|err| {
                let error = namespaced.translate(&err);
                tracing::debug!(%language, error = %error, "query rejected by grammar");
                error
            })?;

        let captures: Vec<String> = inner
            .capture_names()
            .iter()
            .map(|name| (*name).to_owned())
            .collect();

        let starts: Vec<usize> = (0..inner.pattern_count())
            .map(|index| namespaced.to_original(inner.start_byte_for_pattern(index)))
            .collect();

        let patterns = (0..inner.pattern_count())
            .map(|index| compile_pattern(&inner, &namespaced, registry, &captures, &starts, index))
            .collect::<Result<Vec<_>, _>>()?;

        tracing::debug!(
            %language,
            patterns = patterns.len(),
            captures = captures.len(),
            "compiled query"
        );

        Ok(Self {
            inner,
            source: source.to_owned(),
            language,
            captures,
            patterns,
        })
    }

    /// Returns the distinct capture names, in order of first appearance.
    #[must_use]
    pub fn captures(&self) -> &[String] {
        &self.captures
    }

    /// Returns the index of capture `name`, accepting an optional `@`.
    #[must_use]
    pub fn capture_index(&self, name: &str) -> Option<u32> {
        let bare = strip_sigil(name);
        self.captures
            .iter()
            .position(|candidate| candidate == bare)
            .and_then(|position| u32::try_from(position).ok())
    }

    /// Returns the name of the capture with `index`.
    #[must_use]
    pub fn capture_name(&self, index: u32) -> Option<&str> {
        usize::try_from(index)
            .ok()
            .and_then(|position| self.captures.get(position))
            .map(String::as_str)
    }

    /// Returns the patterns in query order.
    #[must_use]
    pub fn patterns(&self) -> &[Pattern] {
        &self.patterns
    }

    /// Returns the pattern at `index`.
    #[must_use]
    pub fn pattern(&self, index: usize) -> Option<&Pattern> {
        self.patterns.get(index)
    }

    /// Returns the number of patterns.
    #[must_use]
    pub fn pattern_count(&self) -> usize {
        self.patterns.len()
    }

    /// Returns the pattern text the query was compiled from.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the grammar the query was compiled for.
    #[must_use]
    pub const fn language(&self) -> SupportedLanguage {
        self.language
    }

    pub(crate) const fn inner(&self) -> &tree_sitter::Query {
        &self.inner
    }
}

impl fmt::Debug for Query {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("language", &self.language)
            .field("source", &self.source)
            .field("captures", &self.captures)
            .field("patterns", &self.patterns)
            .finish_non_exhaustive()
    }
}

/// Removes a leading `@` from a capture name.
pub(crate) fn strip_sigil(name: &str) -> &str {
    name.strip_prefix('@').unwrap_or(name)
}

fn compile_pattern(
    inner: &tree_sitter::Query,
    namespaced: &Namespaced<'_>,
    registry: &PredicateRegistry,
    names: &[String],
    starts: &[usize],
    index: usize,
) -> Result<Pattern, QueryError> {
    let start_byte = starts.get(index).copied().unwrap_or_default();
    let end_byte = starts.get(index + 1).copied().unwrap_or(usize::MAX);

    let captures = inner
        .capture_quantifiers(index)
        .iter()
        .zip(names)
        .enumerate()
        .filter_map(|(capture_index, (raw, name))| {
            Some(PatternCapture {
                index: u32::try_from(capture_index).ok()?,
                name: name.clone(),
                quantifier: Quantifier::from_tree_sitter(*raw)?,
            })
        })
        .collect();

    let mut sites = namespaced
        .predicate_sites()
        .filter(|site| (start_byte..end_byte).contains(site));

    let predicates = inner
        .general_predicates(index)
        .iter()
        .map(|clause| {
            let site = sites.next().unwrap_or(start_byte);
            let name = Namespaced::operator(&clause.operator);
            let arguments = clause
                .args
                .iter()
                .map(|argument| convert_argument(argument, names))
                .collect();
            registry
                .compile(name, arguments)
                .map_err(|failure| namespaced.error_at(failure.kind, site, failure.message))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Pattern {
        index,
        start_byte,
        captures,
        predicates,
    })
}

fn convert_argument(argument: &QueryPredicateArg, names: &[String]) -> PredicateArgument {
    match argument {
        QueryPredicateArg::Capture(index) => {
            let name = usize::try_from(*index)
                .ok()
                .and_then(|position| names.get(position))
                .cloned()
                .unwrap_or_default();
            PredicateArgument::Capture(CaptureRef::new(*index, name))
        }
        QueryPredicateArg::String(text) => PredicateArgument::Literal(text.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn compile(source: &str) -> Result<Query, QueryError> {
        Query::new(SupportedLanguage::Cpp, source)
    }

    #[test]
    fn captures_are_listed_once_in_first_appearance_order() {
        let query = compile(
            "(field_expression argument: (_) @arg field: (_) @field) @from\n\
             (call_expression function: (_) @field) @from",
        )
        .expect("query compiles");

        assert_eq!(query.captures(), ["arg", "field", "from"]);
        assert_eq!(query.pattern_count(), 2);
        assert_eq!(query.capture_index("@field"), Some(1));
        assert_eq!(query.capture_name(2), Some("from"));
        assert_eq!(query.capture_name(3), None);
    }

    #[test]
    fn patterns_report_only_their_own_captures() {
        let query = compile(
            "(field_expression argument: (_) @arg) @from\n(identifier) @id",
        )
        .expect("query compiles");

        let first = query.pattern(0).expect("first pattern");
        let second = query.pattern(1).expect("second pattern");
        assert!(first.binds("from"));
        assert!(first.binds("@arg"));
        assert!(!first.binds("id"));
        assert!(second.binds("id"));
        assert!(!second.binds("from"));
        assert!(second.start_byte() > first.start_byte());
    }

    #[rstest]
    #[case("(identifier) @x", Quantifier::One)]
    #[case("(parameter_list (parameter_declaration)? @x)", Quantifier::ZeroOrOne)]
    #[case("(parameter_list (parameter_declaration)* @x)", Quantifier::ZeroOrMore)]
    #[case("(parameter_list (parameter_declaration)+ @x)", Quantifier::OneOrMore)]
    fn capture_quantifiers_are_exposed(#[case] source: &str, #[case] expected: Quantifier) {
        let query = compile(source).expect("query compiles");
        let pattern = query.pattern(0).expect("pattern");

        assert_eq!(pattern.quantifier("x"), Some(expected));
        assert_eq!(expected.is_repeatable(), matches!(expected, Quantifier::ZeroOrMore | Quantifier::OneOrMore));
    }

    #[test]
    fn predicate_arguments_keep_their_kind_and_order() {
        let query = compile(r#"((identifier) @name (#eq? "main" @name))"#).expect("query compiles");
        let invocation = query
            .pattern(0)
            .and_then(|pattern| pattern.predicates().first())
            .expect("predicate");

        assert_eq!(invocation.name(), "eq?");
        assert_eq!(
            invocation.arguments(),
            [
                PredicateArgument::Literal("main".to_owned()),
                PredicateArgument::Capture(CaptureRef::new(0, "name")),
            ]
        );
    }

    #[rstest]
    #[case("(field_expression", QueryErrorKind::Syntax)]
    #[case("(field_expr)", QueryErrorKind::NodeType)]
    #[case("(field_expression arg: (_))", QueryErrorKind::Field)]
    #[case("((field_expression) @a (#eq? @b \"x\"))", QueryErrorKind::Capture)]
    #[case("((identifier) @a (#no-such-predicate? @a))", QueryErrorKind::UnknownPredicate)]
    #[case("((identifier) @a (#eq? @a))", QueryErrorKind::PredicateArity)]
    #[case("((identifier) @a (#eq?))", QueryErrorKind::PredicateArity)]
    #[case("((identifier) @a (#match? @a))", QueryErrorKind::PredicateArity)]
    #[case("((identifier) @a (#eq? \"x\" \"y\"))", QueryErrorKind::PredicateArgument)]
    #[case("((identifier) @a (#match? @a \"(\"))", QueryErrorKind::PredicateArgument)]
    #[case("((identifier) @a (#in_message_map? @a \"x\"))", QueryErrorKind::PredicateArgument)]
    fn malformed_queries_report_their_kind(#[case] source: &str, #[case] expected: QueryErrorKind) {
        let error = compile(source).expect_err("query must not compile");
        assert_eq!(error.kind(), expected, "{error}");
    }

    #[test]
    fn predicate_errors_point_at_the_clause() {
        let source = "(identifier) @a\n((identifier) @b (#frobnicate? @b))";
        let error = compile(source).expect_err("unknown predicate");

        assert_eq!(error.kind(), QueryErrorKind::UnknownPredicate);
        assert_eq!(error.offset(), source.find('#').expect("hash"));
        assert_eq!((error.row(), error.column()), (1, 18));
        assert!(error.message().contains("#frobnicate?"));
        assert!(!error.message().contains("weaver-"));
    }

    #[test]
    fn custom_registries_extend_the_language() {
        let mut registry = PredicateRegistry::new();
        registry
            .register(
                "named?",
                crate::predicate::StructuralPredicate::new(|nodes| {
                    nodes.iter().all(crate::parser::SyntaxNode::is_named)
                }),
            )
            .expect("register");

        let query = Query::with_registry(
            SupportedLanguage::Cpp,
            "((identifier) @a (#named? @a))",
            &registry,
        )
        .expect("custom predicate compiles");
        assert_eq!(query.pattern(0).map(|p| p.predicates().len()), Some(1));

        let error = Query::with_registry(
            SupportedLanguage::Cpp,
            "((identifier) @a (#eq? @a \"x\"))",
            &registry,
        )
        .expect_err("eq? is not registered");
        assert_eq!(error.kind(), QueryErrorKind::UnknownPredicate);
    }

    #[test]
    fn queries_are_shareable_across_threads() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<Query>();
    }
}
