//! Grammar handles.
//!
//! [`SupportedLanguage`] is the grammar handle accepted by the parser and the
//! query compiler. Each variant names a Tree-sitter grammar linked into the
//! crate; node-type and field vocabularies come from that grammar.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;

/// Grammars linked into the crate.
///
/// A query compiled for one grammar only runs against trees produced by a
/// parser for the same grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SupportedLanguage {
    /// C and C++ sources and headers.
    #[default]
    Cpp,
    /// Rust.
    Rust,
    /// Python, including stub files.
    Python,
    /// TypeScript and TSX.
    TypeScript,
}

/// Names and file extensions a grammar answers to.
struct Vocabulary {
    name: &'static str,
    aliases: &'static [&'static str],
    extensions: &'static [&'static str],
}

const CPP: Vocabulary = Vocabulary {
    name: "cpp",
    aliases: &["c++", "cxx"],
    extensions: &["cpp", "cc", "cxx", "c++", "h", "hh", "hpp", "hxx"],
};

const RUST: Vocabulary = Vocabulary {
    name: "rust",
    aliases: &["rs"],
    extensions: &["rs"],
};

const PYTHON: Vocabulary = Vocabulary {
    name: "python",
    aliases: &["py"],
    extensions: &["py", "pyi"],
};

const TYPESCRIPT: Vocabulary = Vocabulary {
    name: "typescript",
    aliases: &["ts", "tsx"],
    extensions: &["ts", "tsx", "mts", "cts"],
};

impl SupportedLanguage {
    /// Every linked grammar, C++ first.
    pub const ALL: [Self; 4] = [Self::Cpp, Self::Rust, Self::Python, Self::TypeScript];

    const fn vocabulary(self) -> &'static Vocabulary {
        match self {
            Self::Cpp => &CPP,
            Self::Rust => &RUST,
            Self::Python => &PYTHON,
            Self::TypeScript => &TYPESCRIPT,
        }
    }

    /// Resolves a file extension (without the dot), ignoring case.
    ///
    /// ```ignore
    /// use weaver_query::SupportedLanguage;
    ///
    /// assert_eq!(SupportedLanguage::from_extension("HPP"), Some(SupportedLanguage::Cpp));
    /// assert_eq!(SupportedLanguage::from_extension("json"), None);
    /// ```
    #[must_use]
    pub fn from_extension(extension: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|language| {
            language
                .vocabulary()
                .extensions
                .iter()
                .any(|known| known.eq_ignore_ascii_case(extension))
        })
    }

    /// Resolves the extension of `path`.
    #[must_use]
    pub fn from_path(path: &Path) -> Option<Self> {
        path.extension()
            .and_then(|extension| extension.to_str())
            .and_then(Self::from_extension)
    }

    /// Returns the Tree-sitter grammar.
    #[must_use]
    pub fn tree_sitter_language(self) -> tree_sitter::Language {
        match self {
            Self::Cpp => tree_sitter_cpp::LANGUAGE.into(),
            Self::Rust => tree_sitter_rust::LANGUAGE.into(),
            Self::Python => tree_sitter_python::LANGUAGE.into(),
            // TSX is a superset of the TypeScript grammar.
            Self::TypeScript => tree_sitter_typescript::LANGUAGE_TSX.into(),
        }
    }

    /// Returns the canonical lower-case name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.vocabulary().name
    }
}

impl fmt::Display for SupportedLanguage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A language name that matches no linked grammar.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unsupported language: '{0}'")]
pub struct LanguageParseError(String);

impl LanguageParseError {
    /// Returns the rejected input, trimmed.
    #[must_use]
    pub fn input(&self) -> &str {
        &self.0
    }
}

impl FromStr for SupportedLanguage {
    type Err = LanguageParseError;

    /// Accepts the canonical name or a short alias, ignoring case and
    /// surrounding whitespace.
    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let wanted = input.trim();
        Self::ALL
            .into_iter()
            .find(|language| {
                let vocabulary = language.vocabulary();
                vocabulary.name.eq_ignore_ascii_case(wanted)
                    || vocabulary
                        .aliases
                        .iter()
                        .any(|alias| alias.eq_ignore_ascii_case(wanted))
            })
            .ok_or_else(|| LanguageParseError(wanted.to_owned()))
    }
}
