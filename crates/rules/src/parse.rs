//! Recursive-descent parser for rule expressions.
//!
//! ```text
//! expr   := term (OR term)*
//! term   := factor (AND factor)*
//! factor := FIELD_KEYWORD STRING_LITERAL
//!         | "(" expr ")"
//! ```
//!
//! `AND` binds tighter than `OR` and both are left-associative. The parser
//! never stops at the first fault: it records a diagnostic, skips the smallest
//! sensible amount of input and carries on, so every independent mistake in
//! an expression is reported together.
//!
//! The only exceptions are expressions nested deeper than [`MAX_DEPTH`] or
//! with more than [`MAX_OPERANDS`] field matches. Parsing stops there, which
//! keeps both the parser and any tree it builds shallow enough to walk
//! recursively.

use crate::Predicate;
use crate::error::{ParseError, ParseErrorKind};
use crate::lex::{Span, Token, TokenKind, tokenize};
use crate::normalize::normalize;
use tracing::instrument;

/// Maximum number of parentheses open at once.
pub const MAX_DEPTH: usize = 64;
/// Maximum number of field matches in one expression.
pub const MAX_OPERANDS: usize = 512;

/// Parses expression text into a [`Predicate`] tree.
///
/// Returns every diagnostic found if the expression is malformed in any way;
/// a partially valid expression never yields a tree.
#[instrument(level = "trace")]
pub fn parse(input: &str) -> Result<Predicate, Vec<ParseError>> {
    let tokens = normalize(tokenize(input));
    Parser::new(&tokens).parse()
}

struct Parser<'a> {
    tokens: &'a [Token],
    position: usize,
    depth: usize,
    operands: usize,
    /// Set once a limit is hit; everything after that point is ignored.
    halted: bool,
    errors: Vec<ParseError>,
}

impl<'a> Parser<'a> {
    /// `tokens` must end with [`TokenKind::Eof`], which [`tokenize`] guarantees.
    fn new(tokens: &'a [Token]) -> Self {
        Self { tokens, position: 0, depth: 0, operands: 0, halted: false, errors: Vec::new() }
    }

    fn parse(mut self) -> Result<Predicate, Vec<ParseError>> {
        if matches!(self.peek().kind, TokenKind::Eof) {
            return Err(vec![ParseError::new(ParseErrorKind::Empty, self.peek().span)]);
        }
        let tree = self.expression();
        self.trailing();
        match tree {
            Some(tree) if self.errors.is_empty() => Ok(tree),
            _ => Err(self.errors),
        }
    }

    fn peek(&self) -> &'a Token {
        // Never walks past the final Eof token.
        &self.tokens[self.position.min(self.tokens.len() - 1)]
    }

    fn bump(&mut self) -> &'a Token {
        let token = self.peek();
        if !matches!(token.kind, TokenKind::Eof) {
            self.position += 1;
        }
        token
    }

    fn error(&mut self, kind: ParseErrorKind, span: Span) {
        self.errors.push(ParseError::new(kind, span));
    }

    /// Records `kind` and jumps straight to the end of input.
    fn halt(&mut self, kind: ParseErrorKind, span: Span) {
        self.error(kind, span);
        self.halted = true;
        self.position = self.tokens.len() - 1;
    }

    /// Records and steps over lexical faults sitting between operands.
    fn skip_invalid(&mut self) {
        while let TokenKind::Invalid(kind) = &self.peek().kind {
            let span = self.bump().span;
            self.error(kind.clone(), span);
        }
    }

    fn expression(&mut self) -> Option<Predicate> {
        let mut left = self.term();
        loop {
            self.skip_invalid();
            if !matches!(self.peek().kind, TokenKind::Or) {
                break;
            }
            self.bump();
            let right = self.term();
            left = combine(left, right, Predicate::or);
        }
        left
    }

    fn term(&mut self) -> Option<Predicate> {
        let mut left = self.factor();
        loop {
            self.skip_invalid();
            if !matches!(self.peek().kind, TokenKind::And) {
                break;
            }
            self.bump();
            let right = self.factor();
            left = combine(left, right, Predicate::and);
        }
        left
    }

    fn factor(&mut self) -> Option<Predicate> {
        let token = self.peek();
        match &token.kind {
            TokenKind::Field(_) if self.operands == MAX_OPERANDS => {
                self.halt(ParseErrorKind::TooLong, token.span);
                None
            },
            TokenKind::Field(field) => {
                self.operands += 1;
                self.bump();
                let next = self.peek();
                match &next.kind {
                    TokenKind::Literal(literal) => {
                        self.bump();
                        Some(Predicate::field(*field, literal.clone()))
                    },
                    // The literal is there but broken; one diagnostic is enough.
                    TokenKind::Invalid(kind) => {
                        self.bump();
                        self.error(kind.clone(), next.span);
                        None
                    },
                    // Leave the offending token for the caller to deal with.
                    _ => {
                        self.error(ParseErrorKind::MissingLiteral(*field), next.span);
                        None
                    },
                }
            },
            TokenKind::OpenParen if self.depth == MAX_DEPTH => {
                self.halt(ParseErrorKind::TooDeep, token.span);
                None
            },
            TokenKind::OpenParen => {
                self.bump();
                self.depth += 1;
                let inner = self.expression();
                self.depth -= 1;
                match self.peek().kind {
                    TokenKind::CloseParen => {
                        self.bump();
                    },
                    _ if self.halted => (),
                    _ => self.error(ParseErrorKind::UnclosedParen, token.span),
                }
                inner
            },
            TokenKind::Word(word) => {
                self.bump();
                self.error(ParseErrorKind::UnknownField(word.clone()), token.span);
                // Swallow its literal so it isn't reported a second time.
                if matches!(self.peek().kind, TokenKind::Literal(_)) {
                    self.bump();
                }
                None
            },
            TokenKind::Literal(literal) => {
                self.bump();
                self.error(ParseErrorKind::StrayLiteral(literal.clone()), token.span);
                None
            },
            TokenKind::Invalid(kind) => {
                self.bump();
                self.error(kind.clone(), token.span);
                self.skip_invalid();
                match starts_factor(&self.peek().kind) {
                    true => self.factor(),
                    false => None,
                }
            },
            TokenKind::And | TokenKind::Or | TokenKind::CloseParen | TokenKind::Eof => {
                self.error(ParseErrorKind::ExpectedField(token.kind.describe()), token.span);
                None
            },
        }
    }

    /// Reports whatever is left after a complete expression: the first
    /// leftover token once, plus every lexical fault hiding in the rest.
    fn trailing(&mut self) {
        let mut reported = false;
        while !matches!(self.peek().kind, TokenKind::Eof) {
            let token = self.bump();
            match &token.kind {
                TokenKind::Invalid(kind) => self.error(kind.clone(), token.span),
                other if !reported => {
                    self.error(ParseErrorKind::Trailing(other.describe()), token.span);
                    reported = true;
                },
                _ => (),
            }
        }
    }
}

fn starts_factor(kind: &TokenKind) -> bool {
    matches!(
        kind,
        TokenKind::Field(_) | TokenKind::OpenParen | TokenKind::Word(_) | TokenKind::Literal(_)
    )
}

fn combine(
    left: Option<Predicate>,
    right: Option<Predicate>,
    operator: fn(Predicate, Predicate) -> Predicate,
) -> Option<Predicate> {
    Some(operator(left?, right?))
}
