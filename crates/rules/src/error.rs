//! Expression Diagnostics
//!
//! Malformed expressions are an expected, user-facing condition, so they are
//! reported as plain values rather than `exn` error trees. A single parse can
//! produce several [`ParseError`]s; none of them abort anything beyond the
//! rule they belong to.

use crate::Field;
use crate::lex::Span;
use derive_more::{Display, Error};

/// What went wrong while reading an expression.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ParseErrorKind {
    /// A `"` was opened but never closed.
    #[display("unterminated string literal")]
    UnterminatedLiteral,
    /// A character that cannot start any token.
    #[display("unexpected character '{_0}'")]
    UnexpectedChar(#[error(not(source))] char),
    /// The expression contains no tokens at all.
    #[display("expression is empty")]
    Empty,
    /// A field keyword was not followed by a quoted string.
    #[display("expected a quoted string after {_0}")]
    MissingLiteral(#[error(not(source))] Field),
    /// A field keyword (or group) was required but something else was found.
    #[display("expected a field keyword, found {_0}")]
    ExpectedField(#[error(not(source))] String),
    /// A bare word that is not a known field keyword.
    #[display("unknown field keyword '{_0}'")]
    UnknownField(#[error(not(source))] String),
    /// A quoted string with no field keyword in front of it.
    #[display("string \"{_0}\" is not preceded by a field keyword")]
    StrayLiteral(#[error(not(source))] String),
    /// Tokens left over once a complete expression has been read.
    #[display("unexpected {_0} after complete expression")]
    Trailing(#[error(not(source))] String),
    /// A `(` without its matching `)`.
    #[display("unclosed parenthesis")]
    UnclosedParen,
    /// Parentheses nested beyond [`MAX_DEPTH`](crate::MAX_DEPTH).
    #[display("parentheses nested more than {} deep", crate::MAX_DEPTH)]
    TooDeep,
    /// More field matches than [`MAX_OPERANDS`](crate::MAX_OPERANDS).
    #[display("expression has more than {} field matches", crate::MAX_OPERANDS)]
    TooLong,
}

/// A single diagnostic, anchored to the byte range of the offending token.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
#[display("{kind} at position {}", span.start)]
pub struct ParseError {
    pub kind: ParseErrorKind,
    pub span: Span,
}
impl ParseError {
    pub fn new(kind: ParseErrorKind, span: Span) -> Self {
        Self { kind, span }
    }
}
