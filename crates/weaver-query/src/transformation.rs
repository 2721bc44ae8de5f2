//! Span rewriting driven by query matches.
//!
//! A [`Transformation`] parses its source, runs a query over the tree and,
//! for every accepted match, replaces the span of the anchor capture with
//! the instantiated template. Replacements are spliced into the original
//! text in one pass; the tree is never re-parsed between edits.

use std::ops::Range;
use std::sync::Arc;

use weaver_config::{Config, DEFAULT_ANCHOR_CAPTURE};

use crate::cursor::QueryCursor;
use crate::error::TransformationError;
use crate::parser::Parser;
use crate::predicate::Predicates;
use crate::query::{Query, strip_sigil};
use crate::template::Template;

/// A rewrite of one source text by one query and template.
///
/// # Example
///
/// ```ignore
/// use std::sync::Arc;
/// use weaver_query::{Parser, Query, SupportedLanguage, Transformation};
///
/// let language = SupportedLanguage::Cpp;
/// let query = Query::new(
///     language,
///     r#"(field_expression argument: (_) @arg "." field: (_) @field) @from"#,
/// )?;
/// let mut transformation = Transformation::new(
///     "int f() { return object.field; }",
///     Parser::new(language)?,
///     Arc::new(query),
///     "@arg->@field",
/// )?;
/// let result = transformation.run()?;
/// assert_eq!(result.output(), "int f() { return object->field; }");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct Transformation {
    source: String,
    parser: Parser,
    query: Arc<Query>,
    template: Template,
    anchor: String,
}

impl Transformation {
    /// Prepares a transformation.
    ///
    /// # Errors
    ///
    /// Returns [`TransformationError::LanguageMismatch`] if the query and
    /// parser target different grammars, and
    /// [`TransformationError::UnknownPlaceholder`] if the template names a
    /// capture the query does not define.
    pub fn new(
        source: impl Into<String>,
        parser: Parser,
        query: Arc<Query>,
        template: &str,
    ) -> Result<Self, TransformationError> {
        if query.language() != parser.language() {
            return Err(TransformationError::LanguageMismatch {
                query: query.language(),
                parser: parser.language(),
            });
        }

        let parsed = Template::parse(template, &query)?;

        Ok(Self {
            source: source.into(),
            parser,
            query,
            template: parsed,
            anchor: DEFAULT_ANCHOR_CAPTURE.to_owned(),
        })
    }

    /// Replaces the anchor capture, `from` by default.
    #[must_use]
    pub fn with_anchor_capture(mut self, name: impl AsRef<str>) -> Self {
        self.anchor = strip_sigil(name.as_ref()).to_owned();
        self
    }

    /// Applies the anchor capture configured in `config`.
    #[must_use]
    pub fn with_config(self, config: &Config) -> Self {
        self.with_anchor_capture(config.anchor_capture())
    }

    /// Returns the anchor capture name.
    #[must_use]
    pub fn anchor_capture(&self) -> &str {
        &self.anchor
    }

    /// Returns the text being transformed.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Returns the query driving the transformation.
    #[must_use]
    pub fn query(&self) -> &Query {
        &self.query
    }

    /// Returns the rewrite template.
    #[must_use]
    pub const fn template(&self) -> &Template {
        &self.template
    }

    /// Runs the transformation.
    ///
    /// The run is all or nothing: on error no output is produced.
    ///
    /// # Errors
    ///
    /// Returns [`TransformationError::MissingAnchorCapture`] if a pattern
    /// cannot bind the anchor or an accepted match leaves it unbound,
    /// [`TransformationError::RecursiveOrOverlappingMatch`] if two anchor
    /// spans overlap, [`TransformationError::Parse`] if parsing fails and
    /// [`TransformationError::InvalidRange`] if a span is not on character
    /// boundaries.
    pub fn run(&mut self) -> Result<TransformationResult, TransformationError> {
        self.check_patterns_bind_anchor()?;

        let tree = self.parser.parse(&self.source)?;
        let mut cursor = QueryCursor::new();
        cursor.execute(
            &self.query,
            tree.root_node(),
            Some(Predicates::new(tree.source())),
        );

        let mut replacements: Vec<Replacement> = Vec::new();
        for matched in cursor {
            let Some(anchor) = matched.capture(&self.anchor) else {
                return Err(TransformationError::MissingAnchorCapture {
                    pattern_index: matched.pattern_index(),
                    anchor: self.anchor.clone(),
                });
            };

            let range = anchor.byte_range();
            if let Some(previous) = replacements
                .iter()
                .find(|replacement| overlaps(&replacement.range, &range))
            {
                tracing::debug!(?range, previous = ?previous.range, "overlapping match");
                return Err(TransformationError::RecursiveOrOverlappingMatch {
                    range,
                    previous: previous.range.clone(),
                });
            }

            replacements.push(Replacement {
                text: self.template.render(&matched, tree.source()),
                range,
            });
        }

        let num_replacements = replacements.len();
        let output = splice(&self.source, replacements)?;

        tracing::debug!(
            language = %self.query.language(),
            replacements = num_replacements,
            "transformation applied"
        );

        Ok(TransformationResult {
            output,
            num_replacements,
        })
    }

    fn check_patterns_bind_anchor(&self) -> Result<(), TransformationError> {
        self.query
            .patterns()
            .iter()
            .find(|pattern| !pattern.binds(&self.anchor))
            .map_or(Ok(()), |pattern| {
                Err(TransformationError::MissingAnchorCapture {
                    pattern_index: pattern.index(),
                    anchor: self.anchor.clone(),
                })
            })
    }
}

/// Prepares and runs a transformation in one call.
///
/// # Errors
///
/// Returns any error of [`Transformation::new`] or [`Transformation::run`].
pub fn transform(
    source: impl Into<String>,
    parser: Parser,
    query: Arc<Query>,
    template: &str,
) -> Result<TransformationResult, TransformationError> {
    Transformation::new(source, parser, query, template)?.run()
}

#[derive(Debug)]
struct Replacement {
    range: Range<usize>,
    text: String,
}

/// Empty spans overlap only an identical empty span.
fn overlaps(a: &Range<usize>, b: &Range<usize>) -> bool {
    (a.start < b.end && b.start < a.end) || a == b
}

fn splice(source: &str, mut replacements: Vec<Replacement>) -> Result<String, TransformationError> {
    replacements.sort_by_key(|replacement| replacement.range.start);

    let mut output = String::with_capacity(source.len());
    let mut position = 0;
    for replacement in replacements {
        let kept = source
            .get(position..replacement.range.start)
            .ok_or_else(|| TransformationError::InvalidRange {
                range: replacement.range.clone(),
            })?;
        if !source.is_char_boundary(replacement.range.end) {
            return Err(TransformationError::InvalidRange {
                range: replacement.range,
            });
        }
        output.push_str(kept);
        output.push_str(&replacement.text);
        position = replacement.range.end;
    }

    let rest = source
        .get(position..)
        .ok_or(TransformationError::InvalidRange {
            range: position..source.len(),
        })?;
    output.push_str(rest);
    Ok(output)
}

/// Outcome of a successful [`Transformation::run`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransformationResult {
    output: String,
    num_replacements: usize,
}

impl TransformationResult {
    /// Returns the rewritten text.
    #[must_use]
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Consumes the result, returning the rewritten text.
    #[must_use]
    pub fn into_output(self) -> String {
        self.output
    }

    /// Returns the number of replaced spans.
    #[must_use]
    pub const fn num_replacements(&self) -> usize {
        self.num_replacements
    }

    /// Returns whether any span was replaced.
    #[must_use]
    pub const fn has_changes(&self) -> bool {
        self.num_replacements > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(0..3, 3..5, false)]
    #[case(0..3, 2..5, true)]
    #[case(1..2, 0..5, true)]
    #[case(2..2, 2..2, true)]
    #[case(2..2, 0..5, true)]
    #[case(0..2, 2..2, false)]
    fn overlap_is_symmetric_and_half_open(
        #[case] a: Range<usize>,
        #[case] b: Range<usize>,
        #[case] expected: bool,
    ) {
        assert_eq!(overlaps(&a, &b), expected);
        assert_eq!(overlaps(&b, &a), expected);
    }

    #[test]
    fn splice_applies_replacements_in_offset_order() {
        let replacements = vec![
            Replacement {
                range: 6..9,
                text: "THREE".to_owned(),
            },
            Replacement {
                range: 0..3,
                text: "1".to_owned(),
            },
        ];
        assert_eq!(
            splice("one + two", replacements).expect("splice"),
            "1 + THREE"
        );
    }

    #[test]
    fn splice_rejects_ranges_inside_a_character() {
        let replacements = vec![Replacement {
            range: 1..2,
            text: String::new(),
        }];
        assert_eq!(
            splice("é", replacements),
            Err(TransformationError::InvalidRange { range: 1..2 })
        );
    }
}
