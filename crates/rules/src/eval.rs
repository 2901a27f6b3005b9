use crate::{Field, Predicate};
use curate_media::MediaItem;

fn contains(haystack: &str, needle: &str, case_sensitive: bool) -> bool {
    match case_sensitive {
        true => haystack.contains(needle),
        false => haystack.to_lowercase().contains(&needle.to_lowercase()),
    }
}

impl Field {
    /// Returns `true` if `literal` is a substring of this field's value on
    /// `item`, or of any value for set-valued fields. Absent values never
    /// match.
    pub fn matches(&self, item: &MediaItem, literal: &str, case_sensitive: bool) -> bool {
        match self {
            Field::Title => contains(&item.title, literal, case_sensitive),
            Field::Studio => item.studio.as_deref().is_some_and(|studio| contains(studio, literal, case_sensitive)),
            Field::Genre => item.genres.iter().any(|genre| contains(genre, literal, case_sensitive)),
            Field::Actor => item.actors.iter().any(|actor| contains(actor, literal, case_sensitive)),
            Field::Director => item.directors.iter().any(|director| contains(director, literal, case_sensitive)),
        }
    }
}

impl Predicate {
    /// Evaluates the tree against one item. Pure: the same inputs always give
    /// the same answer.
    ///
    /// `case_sensitive` is a rule-level setting and applies to every field
    /// match in the tree.
    pub fn evaluate(&self, item: &MediaItem, case_sensitive: bool) -> bool {
        match self {
            Predicate::FieldMatch { field, literal } => field.matches(item, literal, case_sensitive),
            Predicate::And(left, right) => left.evaluate(item, case_sensitive) && right.evaluate(item, case_sensitive),
            Predicate::Or(left, right) => left.evaluate(item, case_sensitive) || right.evaluate(item, case_sensitive),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse;
    use rstest::rstest;

    fn avengers() -> MediaItem {
        MediaItem::new("1", "Marvel's Avengers")
            .with_studio("Marvel Studios")
            .with_genres(["Action", "Science Fiction"])
            .with_actors(["Robert Downey Jr.", "Scarlett Johansson"])
            .with_directors(["Joss Whedon"])
    }

    fn bare() -> MediaItem {
        MediaItem::new("2", "Untitled Home Video")
    }

    #[rstest]
    #[case(r#"TITLE "marvel""#, false, true)]
    #[case(r#"TITLE "marvel""#, true, false)]
    #[case(r#"TITLE "Marvel""#, true, true)]
    #[case(r#"STUDIO "marvel studios""#, false, true)]
    #[case(r#"GENRE "fiction""#, false, true)]
    #[case(r#"GENRE "Drama""#, false, false)]
    #[case(r#"ACTOR "Johansson""#, true, true)]
    #[case(r#"DIRECTOR "whedon""#, true, false)]
    #[case(r#"STUDIO "Marvel" AND GENRE "Action""#, false, true)]
    #[case(r#"STUDIO "Marvel" AND GENRE "Drama""#, false, false)]
    #[case(r#"STUDIO "Pixar" OR ACTOR "Downey""#, false, true)]
    #[case(r#"TITLE """#, true, true)]
    fn test_evaluate(#[case] expression: &str, #[case] case_sensitive: bool, #[case] expected: bool) {
        let predicate = parse(expression).unwrap();
        assert_eq!(predicate.evaluate(&avengers(), case_sensitive), expected);
    }

    #[rstest]
    #[case(Field::Studio)]
    #[case(Field::Genre)]
    #[case(Field::Actor)]
    #[case(Field::Director)]
    fn test_absent_values_never_match(#[case] field: Field) {
        // Not even the empty string, which is a substring of everything present.
        assert!(!Predicate::field(field, "").evaluate(&bare(), false));
    }

    #[test]
    fn test_director_either_or_neither() {
        let predicate = parse(r#"DIRECTOR "Spielberg" OR DIRECTOR "Nolan""#).unwrap();
        let jaws = MediaItem::new("3", "Jaws").with_directors(["Steven Spielberg"]);
        let inception = MediaItem::new("4", "Inception").with_directors(["Christopher Nolan"]);
        let heat = MediaItem::new("5", "Heat").with_directors(["Michael Mann"]);
        assert!(predicate.evaluate(&jaws, false));
        assert!(predicate.evaluate(&inception, false));
        assert!(!predicate.evaluate(&heat, false));
        assert!(!predicate.evaluate(&bare(), false));
    }

    #[test]
    fn test_longest_accepted_chain() {
        let mut terms = vec![r#"GENRE "Western""#; crate::MAX_OPERANDS - 1];
        terms.push(r#"ACTOR "Johansson""#);
        let predicate = parse(&terms.join(" OR ")).unwrap();
        assert!(predicate.evaluate(&avengers(), false));
        assert!(!predicate.evaluate(&bare(), false));
    }

    #[test]
    fn test_case_folding_is_unicode_aware() {
        let item = MediaItem::new("6", "ÉCOLE DES FEMMES");
        assert!(Predicate::field(Field::Title, "école").evaluate(&item, false));
        assert!(!Predicate::field(Field::Title, "école").evaluate(&item, true));
    }
}
