//! Runtime predicates attached to query patterns.
//!
//! Predicate clauses such as `(#eq? @name "main")` are resolved against a
//! [`PredicateRegistry`] while the query compiles. The registry checks the
//! clause against the predicate's [`PredicateSignature`] and asks the
//! predicate to [`bind`](Predicate::bind) its arguments, so arity errors and
//! bad literals (an invalid regular expression, say) surface before any
//! match is attempted. Evaluation is then total: a bound check always
//! answers `true` or `false`.

mod builtin;
mod context;
mod evaluator;
mod structural;

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::error::{QueryErrorKind, RegistryError};

pub use builtin::{EqPredicate, MatchPredicate};
pub use context::PredicateContext;
pub use evaluator::Predicates;
pub use structural::{EnclosingBlock, StructuralPredicate};

/// Reference to a capture by its index in the compiled query.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CaptureRef {
    index: u32,
    name: String,
}

impl CaptureRef {
    /// Creates a capture reference.
    #[must_use]
    pub fn new(index: u32, name: impl Into<String>) -> Self {
        Self {
            index,
            name: name.into(),
        }
    }

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
}

/// One argument of a predicate clause.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PredicateArgument {
    /// A capture reference such as `@name`.
    Capture(CaptureRef),
    /// A quoted string literal.
    Literal(String),
}

impl PredicateArgument {
    /// Returns the capture reference, if this argument is one.
    #[must_use]
    pub const fn as_capture(&self) -> Option<&CaptureRef> {
        match self {
            Self::Capture(capture) => Some(capture),
            Self::Literal(_) => None,
        }
    }

    /// Returns the literal text, if this argument is one.
    #[must_use]
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Self::Literal(text) => Some(text),
            Self::Capture(_) => None,
        }
    }
}

impl fmt::Display for PredicateArgument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Capture(capture) => write!(f, "@{}", capture.name()),
            Self::Literal(text) => write!(f, "{text:?}"),
        }
    }
}

/// Constraint on the kinds of arguments a predicate accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgumentRule {
    /// Every argument must be a capture.
    CapturesOnly,
    /// At least one argument must be a capture.
    AtLeastOneCapture,
    /// Exactly one capture and exactly one literal, in either order.
    OneCaptureOneLiteral,
    /// No constraint on argument kinds.
    Any,
}

/// Arity and argument-kind contract of a predicate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PredicateSignature {
    min_arguments: usize,
    max_arguments: Option<usize>,
    rule: ArgumentRule,
}

impl PredicateSignature {
    /// Creates a signature accepting `min..=max` arguments (`None` means
    /// unbounded).
    #[must_use]
    pub const fn new(min_arguments: usize, max_arguments: Option<usize>, rule: ArgumentRule) -> Self {
        Self {
            min_arguments,
            max_arguments,
            rule,
        }
    }

    /// Creates a signature accepting exactly `count` arguments.
    #[must_use]
    pub const fn exactly(count: usize, rule: ArgumentRule) -> Self {
        Self::new(count, Some(count), rule)
    }

    /// Creates a signature accepting `min` or more arguments.
    #[must_use]
    pub const fn at_least(min: usize, rule: ArgumentRule) -> Self {
        Self::new(min, None, rule)
    }

    /// Returns the minimum argument count.
    #[must_use]
    pub const fn min_arguments(&self) -> usize {
        self.min_arguments
    }

    /// Returns the maximum argument count, if bounded.
    #[must_use]
    pub const fn max_arguments(&self) -> Option<usize> {
        self.max_arguments
    }

    /// Returns the argument-kind rule.
    #[must_use]
    pub const fn rule(&self) -> ArgumentRule {
        self.rule
    }

    fn accepts_count(&self, count: usize) -> bool {
        count >= self.min_arguments && self.max_arguments.is_none_or(|max| count <= max)
    }

    fn describe_count(&self) -> String {
        match self.max_arguments {
            Some(max) if max == self.min_arguments => format!("exactly {max}"),
            Some(max) => format!("between {} and {max}", self.min_arguments),
            None => format!("at least {}", self.min_arguments),
        }
    }

    fn check_kinds(&self, arguments: &[PredicateArgument]) -> Result<(), String> {
        let captures = arguments
            .iter()
            .filter(|argument| argument.as_capture().is_some())
            .count();
        let literals = arguments.len().saturating_sub(captures);

        match self.rule {
            ArgumentRule::CapturesOnly if literals > 0 => {
                Err("accepts capture arguments only".to_owned())
            }
            ArgumentRule::AtLeastOneCapture if captures == 0 => {
                Err("requires at least one capture argument".to_owned())
            }
            ArgumentRule::OneCaptureOneLiteral if captures != 1 || literals != 1 => {
                Err("requires one capture and one string literal".to_owned())
            }
            _ => Ok(()),
        }
    }
}

/// A named test that can be attached to query patterns.
///
/// Implementations describe their contract through [`signature`] and turn
/// validated arguments into a [`PredicateCheck`] through [`bind`]. Binding
/// happens once per clause at compile time; the returned check runs once
/// per candidate match.
///
/// [`signature`]: Predicate::signature
/// [`bind`]: Predicate::bind
pub trait Predicate: Send + Sync {
    /// Returns the arity and argument-kind contract.
    fn signature(&self) -> PredicateSignature;

    /// Prepares a check for one clause.
    ///
    /// The arguments already satisfy [`signature`](Predicate::signature).
    ///
    /// # Errors
    ///
    /// Returns a description of the problem when an argument is unusable,
    /// for example a literal that is not a valid regular expression.
    fn bind(&self, arguments: &[PredicateArgument]) -> Result<Box<dyn PredicateCheck>, String>;
}

/// A predicate clause bound to its arguments.
pub trait PredicateCheck: Send + Sync {
    /// Tests a candidate match. Must be free of side effects.
    fn check(&self, context: &PredicateContext<'_>) -> bool;
}

/// A predicate clause of a compiled pattern.
pub struct PredicateInvocation {
    name: String,
    arguments: Vec<PredicateArgument>,
    check: Box<dyn PredicateCheck>,
}

impl PredicateInvocation {
    /// Returns the predicate name, e.g. `eq?`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the arguments in clause order.
    #[must_use]
    pub fn arguments(&self) -> &[PredicateArgument] {
        &self.arguments
    }

    pub(crate) fn check(&self, context: &PredicateContext<'_>) -> bool {
        self.check.check(context)
    }
}

impl fmt::Debug for PredicateInvocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateInvocation")
            .field("name", &self.name)
            .field("arguments", &self.arguments)
            .finish_non_exhaustive()
    }
}

/// Why a predicate clause was rejected by the registry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PredicateFailure {
    pub(crate) kind: QueryErrorKind,
    pub(crate) message: String,
}

impl PredicateFailure {
    fn new(kind: QueryErrorKind, message: String) -> Self {
        Self { kind, message }
    }
}

/// Table of predicates available to the query compiler.
///
/// [`PredicateRegistry::default`] contains the built-ins `eq?`, `match?`
/// and `in_message_map?`; [`PredicateRegistry::new`] starts empty.
///
/// # Example
///
/// ```ignore
/// use weaver_query::{PredicateRegistry, StructuralPredicate};
///
/// let mut registry = PredicateRegistry::default();
/// registry.register(
///     "is_leaf?",
///     StructuralPredicate::new(|nodes| nodes.iter().all(|n| n.children().is_empty())),
/// )?;
/// assert!(registry.contains("is_leaf?"));
/// # Ok::<(), weaver_query::RegistryError>(())
/// ```
#[derive(Clone)]
pub struct PredicateRegistry {
    predicates: HashMap<String, Arc<dyn Predicate>>,
}

static DEFAULT_REGISTRY: Lazy<PredicateRegistry> = Lazy::new(PredicateRegistry::with_builtins);

impl PredicateRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self {
            predicates: HashMap::new(),
        }
    }

    /// Creates a registry holding the built-in predicates.
    #[must_use]
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        registry.insert("eq?", Arc::new(EqPredicate));
        registry.insert("match?", Arc::new(MatchPredicate));
        registry.insert("in_message_map?", Arc::new(EnclosingBlock::message_map()));
        registry
    }

    /// Returns a shared registry holding the built-in predicates.
    #[must_use]
    pub fn builtins() -> &'static Self {
        &DEFAULT_REGISTRY
    }

    /// Registers a predicate under `name`.
    ///
    /// Names follow the query language's convention and end in `?` (tests)
    /// or `!` (directives).
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Duplicate`] if the name is taken, and
    /// [`RegistryError::InvalidName`] if it cannot appear in a query.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        predicate: impl Predicate + 'static,
    ) -> Result<(), RegistryError> {
        let bare = validate_name(name.into())?;
        if self.predicates.contains_key(&bare) {
            return Err(RegistryError::Duplicate { name: bare });
        }
        self.insert(&bare, Arc::new(predicate));
        Ok(())
    }

    /// Looks up a predicate by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Predicate>> {
        self.predicates.get(name)
    }

    /// Returns whether a predicate with this name is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.predicates.contains_key(name)
    }

    /// Returns the registered names in lexical order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<_> = self.predicates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Returns the number of registered predicates.
    #[must_use]
    pub fn len(&self) -> usize {
        self.predicates.len()
    }

    /// Returns `true` when no predicates are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    fn insert(&mut self, name: &str, predicate: Arc<dyn Predicate>) {
        self.predicates.insert(name.to_owned(), predicate);
    }

    /// Validates a clause and binds it to its predicate.
    pub(crate) fn compile(
        &self,
        name: &str,
        arguments: Vec<PredicateArgument>,
    ) -> Result<PredicateInvocation, PredicateFailure> {
        let Some(predicate) = self.get(name) else {
            return Err(PredicateFailure::new(
                QueryErrorKind::UnknownPredicate,
                format!("unknown predicate #{name}"),
            ));
        };

        let signature = predicate.signature();
        if !signature.accepts_count(arguments.len()) {
            return Err(PredicateFailure::new(
                QueryErrorKind::PredicateArity,
                format!(
                    "#{name} expects {} arguments, got {}",
                    signature.describe_count(),
                    arguments.len()
                ),
            ));
        }

        signature.check_kinds(&arguments).map_err(|reason| {
            PredicateFailure::new(
                QueryErrorKind::PredicateArgument,
                format!("#{name} {reason}"),
            )
        })?;

        let check = predicate.bind(&arguments).map_err(|reason| {
            PredicateFailure::new(
                QueryErrorKind::PredicateArgument,
                format!("#{name}: {reason}"),
            )
        })?;

        Ok(PredicateInvocation {
            name: name.to_owned(),
            arguments,
            check,
        })
    }
}

impl Default for PredicateRegistry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for PredicateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateRegistry")
            .field("names", &self.names())
            .finish()
    }
}

fn validate_name(name: String) -> Result<String, RegistryError> {
    let bare = name.strip_prefix('#').unwrap_or(&name).to_owned();

    if !(bare.ends_with('?') || bare.ends_with('!')) {
        return Err(RegistryError::InvalidName {
            name,
            reason: "predicate names end in '?' or '!'",
        });
    }

    let valid_chars = bare
        .chars()
        .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '?' | '!'));
    let valid_start = bare
        .chars()
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_');

    if !valid_chars || !valid_start {
        return Err(RegistryError::InvalidName {
            name,
            reason: "predicate names are identifiers",
        });
    }

    Ok(bare)
}
