//! Predicate-name namespacing for the grammar library's query parser.
//!
//! The Tree-sitter runtime interprets a handful of predicate names (`eq?`,
//! `match?`, `any-of?` and friends) itself, with argument rules of its own.
//! Every predicate in this crate is owned by a [`PredicateRegistry`], so
//! operator names are prefixed before the text reaches Tree-sitter. All
//! clauses then surface as general predicates, and positions reported
//! against the prefixed text are mapped back to the caller's text.
//!
//! [`PredicateRegistry`]: crate::PredicateRegistry

use crate::error::{QueryError, QueryErrorKind};

pub(super) const PREFIX: &str = "weaver-";

/// Query text with namespaced predicate operators.
#[derive(Debug, Clone)]
pub(super) struct Namespaced<'a> {
    original: &'a str,
    text: String,
    /// Original offsets at which [`PREFIX`] was inserted, ascending.
    insertions: Vec<usize>,
}

impl<'a> Namespaced<'a> {
    /// Prefixes every `#operator` outside string literals and comments.
    pub(super) fn new(original: &'a str) -> Self {
        let mut text = String::with_capacity(original.len());
        let mut insertions = Vec::new();
        let mut chars = original.char_indices().peekable();

        while let Some((offset, c)) = chars.next() {
            text.push(c);
            match c {
                '"' => {
                    while let Some((_, inner)) = chars.next() {
                        text.push(inner);
                        match inner {
                            '\\' => {
                                if let Some((_, escaped)) = chars.next() {
                                    text.push(escaped);
                                }
                            }
                            '"' => break,
                            _ => {}
                        }
                    }
                }
                ';' => {
                    while let Some((_, inner)) = chars.next_if(|(_, inner)| *inner != '\n') {
                        text.push(inner);
                    }
                }
                '#' => {
                    let starts_name = chars
                        .peek()
                        .is_some_and(|(_, next)| !next.is_whitespace() && *next != ')');
                    if starts_name {
                        text.push_str(PREFIX);
                        insertions.push(offset + c.len_utf8());
                    }
                }
                _ => {}
            }
        }

        Self {
            original,
            text,
            insertions,
        }
    }

    /// Returns the text handed to Tree-sitter.
    pub(super) fn text(&self) -> &str {
        &self.text
    }

    /// Returns the offsets of the `#` of every predicate clause, in the
    /// caller's text.
    pub(super) fn predicate_sites(&self) -> impl Iterator<Item = usize> + '_ {
        self.insertions.iter().map(|offset| offset.saturating_sub(1))
    }

    /// Maps an offset in the prefixed text back to the caller's text.
    ///
    /// Offsets inside an inserted prefix map to the start of the operator
    /// name.
    pub(super) fn to_original(&self, offset: usize) -> usize {
        let mut shift = 0;
        for &inserted_at in &self.insertions {
            let start = inserted_at + shift;
            if offset < start {
                break;
            }
            if offset < start + PREFIX.len() {
                return inserted_at;
            }
            shift += PREFIX.len();
        }
        offset.saturating_sub(shift)
    }

    /// Strips the namespace from an operator name.
    pub(super) fn operator<'o>(operator: &'o str) -> &'o str {
        operator.strip_prefix(PREFIX).unwrap_or(operator)
    }

    /// Builds a [`QueryError`] positioned in the caller's text.
    pub(super) fn error_at(
        &self,
        kind: QueryErrorKind,
        offset: usize,
        message: impl Into<String>,
    ) -> QueryError {
        let (row, column) = row_column(self.original, offset);
        QueryError::new(kind, row, column, offset, message)
    }

    /// Translates a Tree-sitter compile error into the caller's coordinates.
    pub(super) fn translate(&self, error: &tree_sitter::QueryError) -> QueryError {
        let offset = self.to_original(error.offset).min(self.original.len());
        let kind = translate_kind(&error.kind);
        let message = match error.kind {
            tree_sitter::QueryErrorKind::Syntax | tree_sitter::QueryErrorKind::Structure => {
                caret_message(self.original, offset)
            }
            _ => {
                let message = error.message.replace(&format!("#{PREFIX}"), "#");
                Self::operator(&message).to_owned()
            }
        };
        self.error_at(kind, offset, message)
    }
}

const fn translate_kind(kind: &tree_sitter::QueryErrorKind) -> QueryErrorKind {
    match kind {
        tree_sitter::QueryErrorKind::Syntax => QueryErrorKind::Syntax,
        tree_sitter::QueryErrorKind::NodeType => QueryErrorKind::NodeType,
        tree_sitter::QueryErrorKind::Field => QueryErrorKind::Field,
        tree_sitter::QueryErrorKind::Capture => QueryErrorKind::Capture,
        tree_sitter::QueryErrorKind::Structure => QueryErrorKind::Structure,
        tree_sitter::QueryErrorKind::Predicate => QueryErrorKind::PredicateArgument,
        tree_sitter::QueryErrorKind::Language => QueryErrorKind::Language,
    }
}

/// Zero-based row and byte column of `offset`.
fn row_column(text: &str, offset: usize) -> (usize, usize) {
    let before = text.get(..offset).unwrap_or(text);
    let row = before.matches('\n').count();
    let column = before.rfind('\n').map_or(before.len(), |newline| {
        before.len().saturating_sub(newline + 1)
    });
    (row, column)
}

/// The offending line followed by a caret under the error column.
fn caret_message(text: &str, offset: usize) -> String {
    let (_, column) = row_column(text, offset);
    let line_start = offset.saturating_sub(column);
    let line = text
        .get(line_start..)
        .and_then(|rest| rest.lines().next())
        .unwrap_or_default();
    format!("{line}\n{}^", " ".repeat(column))
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("(identifier) @id", "(identifier) @id")]
    #[case("((identifier) @id (#eq? @id \"x\"))", "((identifier) @id (#weaver-eq? @id \"x\"))")]
    #[case("((x) @a (#match? @a \"#not-a-predicate\"))", "((x) @a (#weaver-match? @a \"#not-a-predicate\"))")]
    #[case("; #eq? in a comment\n(x)", "; #eq? in a comment\n(x)")]
    #[case("((x) @a (#eq? @a \"\\\"#q\"))", "((x) @a (#weaver-eq? @a \"\\\"#q\"))")]
    fn prefixes_operators_outside_strings_and_comments(
        #[case] input: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(Namespaced::new(input).text(), expected);
    }

    #[test]
    fn offsets_map_back_to_the_caller_text() {
        let input = "((x) @a (#eq? @a \"1\") (#eq? @a \"2\"))";
        let namespaced = Namespaced::new(input);
        let second = namespaced
            .text()
            .rfind("#weaver-eq?")
            .expect("second clause");

        assert_eq!(namespaced.to_original(0), 0);
        assert_eq!(namespaced.to_original(second), input.rfind('#').expect("hash"));
        assert_eq!(namespaced.to_original(namespaced.text().len()), input.len());
        assert_eq!(
            namespaced.predicate_sites().collect::<Vec<_>>(),
            vec![9, 23]
        );
    }

    #[test]
    fn offsets_inside_a_prefix_map_to_the_operator() {
        let namespaced = Namespaced::new("(#eq? @a)");
        assert_eq!(namespaced.to_original(4), 2);
    }

    #[rstest]
    #[case("abc", 2, (0, 2))]
    #[case("ab\ncd", 4, (1, 1))]
    #[case("ab\n", 3, (1, 0))]
    fn rows_and_columns_are_zero_based(
        #[case] text: &str,
        #[case] offset: usize,
        #[case] expected: (usize, usize),
    ) {
        assert_eq!(row_column(text, offset), expected);
    }

    #[test]
    fn operator_names_lose_their_prefix() {
        assert_eq!(Namespaced::operator("weaver-eq?"), "eq?");
        assert_eq!(Namespaced::operator("plain?"), "plain?");
    }
}
