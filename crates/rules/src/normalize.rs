//! Best-effort rewriting of common near-miss keywords.
//!
//! Runs between tokenizing and parsing. Only [`TokenKind::Word`] tokens are
//! touched; anything this pass does not recognize is left for the parser to
//! report as an unknown keyword.

use crate::Field;
use crate::lex::{Token, TokenKind};

/// Minimum word length before single-edit misspellings are corrected.
/// Shorter words are too likely to be something else entirely.
const MIN_FUZZY_LENGTH: usize = 5;

pub(crate) fn normalize(tokens: Vec<Token>) -> Vec<Token> {
    tokens
        .into_iter()
        .map(|token| {
            let TokenKind::Word(word) = &token.kind else {
                return token;
            };
            let Some(kind) = correct(word) else {
                return token;
            };
            tracing::debug!(from = %word, to = %kind.describe(), position = token.span.start, "Normalized near-miss keyword");
            Token { kind, span: token.span }
        })
        .collect()
}

fn correct(word: &str) -> Option<TokenKind> {
    let upper = word.to_uppercase();
    let field = match upper.as_str() {
        "&&" => return Some(TokenKind::And),
        "||" => return Some(TokenKind::Or),
        "TITLES" | "NAME" => Field::Title,
        "STUDIOS" => Field::Studio,
        "GENRES" => Field::Genre,
        "ACTORS" | "ACTRESS" | "CAST" => Field::Actor,
        "DIRECTORS" => Field::Director,
        _ if upper.chars().count() >= MIN_FUZZY_LENGTH => {
            let mut candidates = Field::ALL.into_iter().filter(|field| edit_distance(&upper, field.as_str()) <= 1);
            match (candidates.next(), candidates.next()) {
                (Some(field), None) => field,
                _ => return None,
            }
        },
        _ => return None,
    };
    Some(TokenKind::Field(field))
}

/// Optimal string alignment distance: Levenshtein plus adjacent transpositions.
fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();
    let mut rows = vec![vec![0usize; b.len() + 1]; a.len() + 1];
    for (i, row) in rows.iter_mut().enumerate() {
        row[0] = i;
    }
    for j in 0..=b.len() {
        rows[0][j] = j;
    }
    for i in 1..=a.len() {
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            let mut best = (rows[i - 1][j] + 1).min(rows[i][j - 1] + 1).min(rows[i - 1][j - 1] + cost);
            if i > 1 && j > 1 && a[i - 1] == b[j - 2] && a[i - 2] == b[j - 1] {
                best = best.min(rows[i - 2][j - 2] + 1);
            }
            rows[i][j] = best;
        }
    }
    rows[a.len()][b.len()]
}
