//! Text predicates: `eq?` and `match?`.

use regex::Regex;

use super::{
    ArgumentRule, CaptureRef, Predicate, PredicateArgument, PredicateCheck, PredicateContext,
    PredicateSignature,
};

/// `(#eq? a b)`: both sides have identical source text.
///
/// Either side may be a capture or a literal, but at least one must be a
/// capture. A quantified capture passes only when every bound node agrees.
/// An unbound capture never compares equal.
#[derive(Debug, Clone, Copy, Default)]
pub struct EqPredicate;

impl Predicate for EqPredicate {
    fn signature(&self) -> PredicateSignature {
        PredicateSignature::exactly(2, ArgumentRule::AtLeastOneCapture)
    }

    fn bind(&self, arguments: &[PredicateArgument]) -> Result<Box<dyn PredicateCheck>, String> {
        let [left, right] = arguments else {
            return Err(format!("expected 2 arguments, got {}", arguments.len()));
        };
        Ok(Box::new(EqCheck {
            left: left.clone(),
            right: right.clone(),
        }))
    }
}

struct EqCheck {
    left: PredicateArgument,
    right: PredicateArgument,
}

impl PredicateCheck for EqCheck {
    fn check(&self, context: &PredicateContext<'_>) -> bool {
        let left = resolve(&self.left, context);
        let right = resolve(&self.right, context);

        if left.is_empty() || right.is_empty() {
            return false;
        }

        left.iter().all(|l| right.iter().all(|r| l == r))
    }
}

fn resolve<'a>(argument: &'a PredicateArgument, context: &PredicateContext<'a>) -> Vec<&'a str> {
    match argument {
        PredicateArgument::Capture(capture) => context.texts(capture),
        PredicateArgument::Literal(text) => vec![text.as_str()],
    }
}

/// `(#match? @capture "regex")`: the capture's text matches a regular
/// expression.
///
/// Arguments may appear in either order. The expression is compiled when
/// the query compiles and is searched unanchored, so use `^...$` for a whole
/// match.
#[derive(Debug, Clone, Copy, Default)]
pub struct MatchPredicate;

impl Predicate for MatchPredicate {
    fn signature(&self) -> PredicateSignature {
        PredicateSignature::exactly(2, ArgumentRule::OneCaptureOneLiteral)
    }

    fn bind(&self, arguments: &[PredicateArgument]) -> Result<Box<dyn PredicateCheck>, String> {
        let capture = arguments
            .iter()
            .find_map(PredicateArgument::as_capture)
            .ok_or_else(|| "missing capture argument".to_owned())?;
        let pattern = arguments
            .iter()
            .find_map(PredicateArgument::as_literal)
            .ok_or_else(|| "missing regular expression argument".to_owned())?;

        let regex = Regex::new(pattern)
            .map_err(|err| format!("invalid regular expression {pattern:?}: {err}"))?;

        Ok(Box::new(MatchCheck {
            capture: capture.clone(),
            regex,
        }))
    }
}

struct MatchCheck {
    capture: CaptureRef,
    regex: Regex,
}

impl PredicateCheck for MatchCheck {
    fn check(&self, context: &PredicateContext<'_>) -> bool {
        let texts = context.texts(&self.capture);
        !texts.is_empty() && texts.iter().all(|text| self.regex.is_match(text))
    }
}
