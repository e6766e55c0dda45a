//! Both lexing levels share the same strategy: an ordered table of rules, each one a nom parser
//! anchored at the start of the remaining input. The first rule that matches wins, its match is
//! consumed, and the loop starts over on whatever is left.

use nom::error::{VerboseError, VerboseErrorKind};

pub mod block;
pub mod inline;

/// Error type every grammar matcher is instantiated with.
pub(crate) type RuleError<'source> = VerboseError<&'source str>;
pub(crate) type RuleResult<'source, O> = nom::IResult<&'source str, O, RuleError<'source>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum Level {
    #[display(fmt = "block")]
    Block,
    #[display(fmt = "inline")]
    Inline,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LexError {
    /// Remaining text is not recognized by any rule of the active set.
    #[error("no {level} rule matches at: {remaining:?}")]
    NoRule { level: Level, remaining: Box<str> },
    /// A construct was recognized by its opening, but never properly closed.
    #[error("malformed {construct} at: {remaining:?}")]
    Malformed {
        construct: &'static str,
        remaining: Box<str>,
    },
    /// Quotes and lists are nested deeper than allowed.
    #[error("nesting is deeper than {limit} levels")]
    TooDeep { limit: usize },
}

impl LexError {
    pub(crate) fn no_rule(level: Level, remaining: &str) -> Self {
        Self::NoRule {
            level,
            remaining: Box::from(remaining),
        }
    }

    fn malformed(err: RuleError<'_>) -> Self {
        // outermost context names the construct; its input is where the construct started
        let (remaining, construct) = err
            .errors
            .iter()
            .rev()
            .find_map(|(input, kind)| match kind {
                VerboseErrorKind::Context(ctx) => Some((*input, *ctx)),
                _ => None,
            })
            .or_else(|| err.errors.first().map(|(input, _)| (*input, "construct")))
            .unwrap_or(("", "construct"));
        Self::Malformed {
            construct,
            remaining: Box::from(remaining),
        }
    }
}

/// Sorts out a single rule application:
/// - `Ok(Some(..))`: rule matched
/// - `Ok(None)`: rule does not apply here, next one should be tried
/// - `Err(..)`: rule committed to the input and found it malformed
pub(crate) fn applied<'source, O>(
    result: RuleResult<'source, O>,
) -> Result<Option<(&'source str, O)>, LexError> {
    match result {
        Ok(ok) => Ok(Some(ok)),
        Err(nom::Err::Error(_)) => Ok(None),
        Err(nom::Err::Failure(err)) => Err(LexError::malformed(err)),
        Err(nom::Err::Incomplete(_)) => unreachable!("This is a complete input"),
    }
}
