//! Rewrite templates with `@capture` placeholders.
//!
//! A template is plain text in which `@name` stands for the source text of
//! the node bound to capture `name`. After `@` the longest run of
//! capture-name characters (letters, digits, `_ - . ? !`) is read and
//! resolved to the longest prefix the query defines as a capture, so
//! `@arg->@field` and `@func.name` both work. `@@` is a literal `@`, and an
//! `@` not followed by a name character is copied as is.

use std::iter::Peekable;
use std::str::Chars;

use crate::cursor::Match;
use crate::error::TransformationError;
use crate::query::Query;

/// One piece of a parsed template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// Text copied verbatim.
    Literal(String),
    /// A capture name to substitute, without the `@` sigil.
    Placeholder(String),
}

/// A parsed rewrite template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Template {
    text: String,
    segments: Vec<Segment>,
}

impl Template {
    /// Parses `text` into literal and placeholder segments, resolving
    /// placeholders against the captures `query` defines.
    ///
    /// # Errors
    ///
    /// Returns [`TransformationError::UnknownPlaceholder`] when an `@name`
    /// has no prefix naming a capture of `query`.
    pub fn parse(text: impl Into<String>, query: &Query) -> Result<Self, TransformationError> {
        let text = text.into();
        let segments = split_segments(&text, query)?;
        Ok(Self { text, segments })
    }

    /// Returns the template as written.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Returns the parsed segments in order.
    #[must_use]
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Returns every placeholder name in order of appearance.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.segments.iter().filter_map(|segment| match segment {
            Segment::Placeholder(name) => Some(name.as_str()),
            Segment::Literal(_) => None,
        })
    }

    /// Instantiates the template for one match.
    ///
    /// Each placeholder becomes the text, read from `source`, of the first
    /// node its capture bound; a capture with no node renders as nothing.
    #[must_use]
    pub fn render(&self, matched: &Match<'_, '_>, source: &str) -> String {
        let mut out = String::with_capacity(self.text.len());
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Placeholder(name) => {
                    if let Some(node) = matched.capture(name) {
                        out.push_str(node.text_in(source));
                    }
                }
            }
        }
        out
    }
}

/// Returns whether `c` may appear in a capture name.
fn is_capture_char(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '-' | '.' | '?' | '!')
}

/// Reads the longest run of capture-name characters from a stream
/// positioned just after `@`.
fn scan_name(chars: &mut Peekable<Chars<'_>>) -> String {
    let mut run = String::new();
    while let Some(c) = chars.next_if(|c| is_capture_char(*c)) {
        run.push(c);
    }
    run
}

/// Splits `run` into the longest prefix naming a query capture and the
/// remaining text.
fn longest_capture<'r>(run: &'r str, query: &Query) -> Option<(&'r str, &'r str)> {
    run.char_indices()
        .map(|(offset, c)| offset + c.len_utf8())
        .rev()
        .find_map(|end| {
            let name = run.get(..end)?;
            query.capture_index(name)?;
            Some((name, run.get(end..)?))
        })
}

fn split_segments(text: &str, query: &Query) -> Result<Vec<Segment>, TransformationError> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '@' {
            literal.push(c);
            continue;
        }
        if chars.next_if_eq(&'@').is_some() {
            literal.push('@');
            continue;
        }

        let run = scan_name(&mut chars);
        if run.is_empty() {
            literal.push('@');
            continue;
        }

        let Some((name, rest)) = longest_capture(&run, query) else {
            return Err(TransformationError::UnknownPlaceholder {
                name: run
                    .trim_end_matches(|c: char| !c.is_alphanumeric() && c != '_')
                    .to_owned(),
            });
        };

        if !literal.is_empty() {
            segments.push(Segment::Literal(std::mem::take(&mut literal)));
        }
        segments.push(Segment::Placeholder(name.to_owned()));
        literal.push_str(rest);
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}
