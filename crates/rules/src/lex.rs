//! Tokenizer for rule expressions.
//!
//! Produces a flat token list that always ends with [`TokenKind::Eof`].
//! Lexical faults do not stop tokenizing: they are emitted in place as
//! [`TokenKind::Invalid`] so the parser can report them alongside any
//! structural problems in the same pass.

use crate::Field;
use crate::error::ParseErrorKind;

/// Byte range of a token within the expression text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Span {
    pub start: usize,
    pub end: usize,
}
impl Span {
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenKind {
    /// One of the known field keywords.
    Field(Field),
    /// Contents of a double-quoted string, quotes removed.
    Literal(String),
    And,
    Or,
    OpenParen,
    CloseParen,
    /// A bare word that is neither an operator nor a field keyword. Left for
    /// the normalization pass (and, failing that, the parser) to deal with.
    Word(String),
    /// A lexical fault, carried through to the parser.
    Invalid(ParseErrorKind),
    Eof,
}
impl TokenKind {
    /// Short human-readable description used in diagnostics.
    pub fn describe(&self) -> String {
        match self {
            Self::Field(field) => field.to_string(),
            Self::Literal(literal) => format!("string \"{literal}\""),
            Self::And => "AND".to_string(),
            Self::Or => "OR".to_string(),
            Self::OpenParen => "'('".to_string(),
            Self::CloseParen => "')'".to_string(),
            Self::Word(word) => format!("'{word}'"),
            Self::Invalid(kind) => kind.to_string(),
            Self::Eof => "end of input".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
}
impl Token {
    pub fn new(kind: TokenKind, start: usize, end: usize) -> Self {
        Self { kind, span: Span::new(start, end) }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn classify(word: &str) -> TokenKind {
    if word.eq_ignore_ascii_case("AND") {
        TokenKind::And
    } else if word.eq_ignore_ascii_case("OR") {
        TokenKind::Or
    } else if let Some(field) = Field::from_keyword(word) {
        TokenKind::Field(field)
    } else {
        TokenKind::Word(word.to_string())
    }
}

/// Splits `input` into tokens. Whitespace between tokens is insignificant.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = input.char_indices().peekable();

    while let Some((start, c)) = chars.next() {
        match c {
            c if c.is_whitespace() => continue,
            '"' => match input[start + 1..].find('"') {
                Some(offset) => {
                    let end = start + 1 + offset;
                    tokens.push(Token::new(TokenKind::Literal(input[start + 1..end].to_string()), start, end + 1));
                    // Skip past the closing quote.
                    while chars.next_if(|&(i, _)| i <= end).is_some() {}
                },
                None => {
                    // Everything up to the end belongs to the broken literal.
                    tokens.push(Token::new(TokenKind::Invalid(ParseErrorKind::UnterminatedLiteral), start, input.len()));
                    break;
                },
            },
            '(' => tokens.push(Token::new(TokenKind::OpenParen, start, start + 1)),
            ')' => tokens.push(Token::new(TokenKind::CloseParen, start, start + 1)),
            // Runs of `&` or `|` are kept as words so that `&&` and `||` can
            // be normalized into operators later.
            '&' | '|' => {
                let mut end = start + 1;
                while let Some((i, next)) = chars.next_if(|&(_, next)| next == c) {
                    end = i + next.len_utf8();
                }
                tokens.push(Token::new(TokenKind::Word(input[start..end].to_string()), start, end));
            },
            c if is_word_char(c) => {
                let mut end = start + c.len_utf8();
                while let Some((i, next)) = chars.next_if(|&(_, next)| is_word_char(next)) {
                    end = i + next.len_utf8();
                }
                tokens.push(Token::new(classify(&input[start..end]), start, end));
            },
            c => tokens.push(Token::new(TokenKind::Invalid(ParseErrorKind::UnexpectedChar(c)), start, start + c.len_utf8())),
        }
    }

    tokens.push(Token::new(TokenKind::Eof, input.len(), input.len()));
    tokens
}
