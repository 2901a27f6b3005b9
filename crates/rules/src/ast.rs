//! Abstract syntax tree of the rule expression language.

use std::fmt::{Display, Formatter, Result as FmtResult};

/// Metadata attribute an expression can match against.
///
/// Keywords are case-insensitive in expression text; the canonical spelling
/// is upper-case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Field {
    /// Item title (single value)
    Title,
    /// Production studio (single, optional value)
    Studio,
    /// Any of the item's genres
    Genre,
    /// Any of the item's cast members
    Actor,
    /// Any of the item's directors
    Director,
}
impl Field {
    pub const ALL: [Field; 5] = [Field::Title, Field::Studio, Field::Genre, Field::Actor, Field::Director];

    /// Returns the canonical keyword for the field.
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::Title => "TITLE",
            Field::Studio => "STUDIO",
            Field::Genre => "GENRE",
            Field::Actor => "ACTOR",
            Field::Director => "DIRECTOR",
        }
    }

    /// Looks up a field by its keyword, ignoring case.
    pub fn from_keyword(word: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str().eq_ignore_ascii_case(word))
    }
}
impl Display for Field {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// A compiled boolean predicate over one item's metadata.
///
/// Trees are only ever built bottom-up by the parser (or the constructors
/// below), so they are finite and acyclic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    /// `FIELD "literal"`: substring match against the field's value(s).
    FieldMatch { field: Field, literal: String },
    /// Both operands must match.
    And(Box<Predicate>, Box<Predicate>),
    /// Either operand must match.
    Or(Box<Predicate>, Box<Predicate>),
}
impl Predicate {
    pub fn field(field: Field, literal: impl Into<String>) -> Self {
        Self::FieldMatch { field, literal: literal.into() }
    }

    pub fn and(left: Predicate, right: Predicate) -> Self {
        Self::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Predicate, right: Predicate) -> Self {
        Self::Or(Box::new(left), Box::new(right))
    }

    fn precedence(&self) -> u8 {
        match self {
            Self::FieldMatch { .. } => 2,
            Self::And(..) => 1,
            Self::Or(..) => 0,
        }
    }

    /// Writes an operand, parenthesizing it when printing it bare would parse
    /// back into a different tree. Operators are left-associative, so a right
    /// operand of equal precedence needs parentheses too.
    fn fmt_operand(&self, f: &mut Formatter<'_>, operand: &Predicate, right: bool) -> FmtResult {
        let parens = operand.precedence() < self.precedence() || (right && operand.precedence() == self.precedence());
        match parens {
            true => write!(f, "({operand})"),
            false => write!(f, "{operand}"),
        }
    }
}
impl Display for Predicate {
    /// Renders the tree back into expression text that parses to an equal tree.
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Self::FieldMatch { field, literal } => write!(f, "{field} \"{literal}\""),
            Self::And(left, right) | Self::Or(left, right) => {
                let operator = if matches!(self, Self::And(..)) { "AND" } else { "OR" };
                self.fmt_operand(f, left, false)?;
                write!(f, " {operator} ")?;
                self.fmt_operand(f, right, true)
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("TITLE", Some(Field::Title))]
    #[case("studio", Some(Field::Studio))]
    #[case("Genre", Some(Field::Genre))]
    #[case("aCtOr", Some(Field::Actor))]
    #[case("DIRECTOR", Some(Field::Director))]
    #[case("DIRECTORS", None)]
    #[case("", None)]
    fn test_from_keyword(#[case] word: &str, #[case] expected: Option<Field>) {
        assert_eq!(Field::from_keyword(word), expected);
    }

    #[test]
    fn test_display_respects_precedence() {
        let tree = Predicate::and(
            Predicate::or(Predicate::field(Field::Title, "a"), Predicate::field(Field::Title, "b")),
            Predicate::field(Field::Genre, "c"),
        );
        assert_eq!(tree.to_string(), r#"(TITLE "a" OR TITLE "b") AND GENRE "c""#);
    }

    #[test]
    fn test_display_left_associative_chain_has_no_parens() {
        let tree = Predicate::or(
            Predicate::or(Predicate::field(Field::Actor, "a"), Predicate::field(Field::Actor, "b")),
            Predicate::and(Predicate::field(Field::Studio, "c"), Predicate::field(Field::Genre, "d")),
        );
        assert_eq!(tree.to_string(), r#"ACTOR "a" OR ACTOR "b" OR STUDIO "c" AND GENRE "d""#);
    }
}
