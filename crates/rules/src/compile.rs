//! Rule compilation.
//!
//! Normalizes both rule styles into [`CompiledRule`]s that share one shape:
//! a target collection name plus a `matches` test. Compilation never fails as
//! a whole. A rule that cannot be compiled is kept as an *inert* rule that
//! matches nothing, and its problems are returned as a [`RuleDiagnostic`].

use crate::{Field, Predicate, parse};
use curate_media::MediaItem;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use tracing::instrument;

/// Simple rule: the item title contains `match_value`.
///
/// This is the older, tag-style rule format and is kept for compatibility.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TitleRule {
    /// Substring to look for in item titles
    #[cfg_attr(feature = "serde", serde(rename = "match"))]
    pub match_value: String,
    /// Target collection name
    pub collection: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub case_sensitive: bool,
}

/// Expression rule: the item satisfies a boolean expression over its metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ExpressionRule {
    /// Target collection name
    pub collection: String,
    /// Expression text, e.g. `STUDIO "Marvel" AND GENRE "Action"`
    pub expression: String,
    #[cfg_attr(feature = "serde", serde(default))]
    pub case_sensitive: bool,
}

/// All configured rules, as loaded at the start of a sync pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct RuleSet {
    #[cfg_attr(feature = "serde", serde(default))]
    pub title_rules: Vec<TitleRule>,
    #[cfg_attr(feature = "serde", serde(default))]
    pub expression_rules: Vec<ExpressionRule>,
}
impl RuleSet {
    pub fn len(&self) -> usize {
        self.title_rules.len() + self.expression_rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Where a compiled rule came from: its list and (zero-based) position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum RuleOrigin {
    Title(usize),
    Expression(usize),
}
impl Display for RuleOrigin {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            RuleOrigin::Title(index) => write!(f, "title rule #{}", index + 1),
            RuleOrigin::Expression(index) => write!(f, "expression rule #{}", index + 1),
        }
    }
}

/// A rule in evaluable form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledRule {
    origin: RuleOrigin,
    collection: String,
    /// `None` when the rule failed to compile; such a rule matches nothing.
    predicate: Option<Predicate>,
    case_sensitive: bool,
}
impl CompiledRule {
    pub fn new(origin: RuleOrigin, collection: impl Into<String>, predicate: Predicate, case_sensitive: bool) -> Self {
        Self { origin, collection: collection.into(), predicate: Some(predicate), case_sensitive }
    }

    /// A rule that matches nothing.
    pub fn inert(origin: RuleOrigin, collection: impl Into<String>) -> Self {
        Self { origin, collection: collection.into(), predicate: None, case_sensitive: false }
    }

    pub fn origin(&self) -> RuleOrigin {
        self.origin
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn predicate(&self) -> Option<&Predicate> {
        self.predicate.as_ref()
    }

    pub fn is_inert(&self) -> bool {
        self.predicate.is_none()
    }

    pub fn matches(&self, item: &MediaItem) -> bool {
        self.predicate.as_ref().is_some_and(|predicate| predicate.evaluate(item, self.case_sensitive))
    }
}

/// Problems found while compiling one rule, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleDiagnostic {
    pub origin: RuleOrigin,
    pub collection: String,
    /// Expression text, or the match value of a title rule.
    pub source: String,
    /// Human-readable messages in the order they were found.
    pub messages: Vec<String>,
}
impl Display for RuleDiagnostic {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} (collection \"{}\"): {}", self.origin, self.collection, self.messages.join("; "))
    }
}

/// Output of [`compile_all`].
#[derive(Debug, Clone, Default)]
pub struct CompiledRules {
    pub rules: Vec<CompiledRule>,
    pub diagnostics: Vec<RuleDiagnostic>,
}
impl CompiledRules {
    /// Groups rules by target collection. Several rules naming the same
    /// collection are matched as a union.
    pub fn by_collection(&self) -> BTreeMap<&str, Vec<&CompiledRule>> {
        let mut map: BTreeMap<&str, Vec<&CompiledRule>> = BTreeMap::new();
        for rule in &self.rules {
            map.entry(rule.collection()).or_default().push(rule);
        }
        map
    }

    pub fn has_errors(&self) -> bool {
        !self.diagnostics.is_empty()
    }
}

/// Compiles every rule in `rules`.
///
/// Title rules become a single `TITLE` field match without going through the
/// parser. Expression rules are parsed; a rule that fails to parse is kept in
/// inert form so its collection still takes part in the sync pass, and its
/// diagnostics are reported alongside.
///
/// A rule without a collection name has nowhere to go and is only reported.
#[instrument(skip_all, fields(title_rules = rules.title_rules.len(), expression_rules = rules.expression_rules.len()))]
pub fn compile_all(rules: &RuleSet) -> CompiledRules {
    let mut compiled = CompiledRules::default();

    for (index, rule) in rules.title_rules.iter().enumerate() {
        let origin = RuleOrigin::Title(index);
        let mut messages = Vec::new();
        if rule.collection.trim().is_empty() {
            messages.push("collection name is empty".to_string());
        }
        if rule.match_value.is_empty() {
            messages.push("match value is empty".to_string());
        }
        let predicate = Predicate::field(Field::Title, rule.match_value.clone());
        compiled.push(origin, &rule.collection, &rule.match_value, Ok(predicate), rule.case_sensitive, messages);
    }

    for (index, rule) in rules.expression_rules.iter().enumerate() {
        let origin = RuleOrigin::Expression(index);
        let mut messages = Vec::new();
        if rule.collection.trim().is_empty() {
            messages.push("collection name is empty".to_string());
        }
        let parsed = parse(&rule.expression).map_err(|errors| errors.iter().map(ToString::to_string).collect());
        compiled.push(origin, &rule.collection, &rule.expression, parsed, rule.case_sensitive, messages);
    }

    tracing::debug!(
        compiled = compiled.rules.len(),
        inert = compiled.rules.iter().filter(|rule| rule.is_inert()).count(),
        diagnostics = compiled.diagnostics.len(),
        "Compiled rules"
    );
    compiled
}

impl CompiledRules {
    fn push(
        &mut self,
        origin: RuleOrigin,
        collection: &str,
        source: &str,
        parsed: Result<Predicate, Vec<String>>,
        case_sensitive: bool,
        mut messages: Vec<String>,
    ) {
        let has_collection = !collection.trim().is_empty();
        let predicate = match parsed {
            Ok(predicate) if messages.is_empty() => Some(predicate),
            Ok(_) => None,
            Err(errors) => {
                messages.extend(errors);
                None
            },
        };
        match (predicate, has_collection) {
            (Some(predicate), _) => self.rules.push(CompiledRule::new(origin, collection, predicate, case_sensitive)),
            (None, true) => self.rules.push(CompiledRule::inert(origin, collection)),
            (None, false) => (),
        }
        if !messages.is_empty() {
            tracing::warn!(%origin, collection, errors = messages.len(), "Rule is inert and will match nothing");
            self.diagnostics.push(RuleDiagnostic {
                origin,
                collection: collection.to_string(),
                source: source.to_string(),
                messages,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn title(match_value: &str, collection: &str, case_sensitive: bool) -> TitleRule {
        TitleRule { match_value: match_value.into(), collection: collection.into(), case_sensitive }
    }

    fn expression(collection: &str, expression: &str) -> ExpressionRule {
        ExpressionRule { collection: collection.into(), expression: expression.into(), case_sensitive: false }
    }

    #[test]
    fn test_title_rule_compiles_without_parser() {
        let rules = RuleSet { title_rules: vec![title("Star Wars", "Star Wars", true)], ..Default::default() };
        let compiled = compile_all(&rules);
        assert!(!compiled.has_errors());
        assert_eq!(compiled.rules.len(), 1);
        // Quotes would break the expression language, not a title rule.
        let rules = RuleSet { title_rules: vec![title(r#"The "Thing""#, "Horror", false)], ..Default::default() };
        let compiled = compile_all(&rules);
        assert_eq!(compiled.rules[0].predicate(), Some(&Predicate::field(Field::Title, r#"The "Thing""#)));
        assert!(compiled.rules[0].matches(&MediaItem::new("1", r#"John Carpenter's The "Thing""#)));
    }

    #[test]
    fn test_title_rule_case_sensitivity() {
        let item = MediaItem::new("1", "Marvel's Avengers");
        let insensitive = compile_all(&RuleSet { title_rules: vec![title("marvel", "M", false)], ..Default::default() });
        let sensitive = compile_all(&RuleSet { title_rules: vec![title("marvel", "M", true)], ..Default::default() });
        assert!(insensitive.rules[0].matches(&item));
        assert!(!sensitive.rules[0].matches(&item));
    }

    #[test]
    fn test_broken_expression_is_inert_not_fatal() {
        let rules = RuleSet {
            title_rules: vec![],
            expression_rules: vec![
                expression("Hanks Dramas", r#"ACTOR "Tom Hanks" AND GENRE "Drama" AND"#),
                expression("Marvel", r#"STUDIO "Marvel""#),
            ],
        };
        let compiled = compile_all(&rules);
        assert_eq!(compiled.rules.len(), 2);
        assert_eq!(compiled.diagnostics.len(), 1);

        let broken = &compiled.rules[0];
        assert!(broken.is_inert());
        let item = MediaItem::new("1", "Cast Away").with_actors(["Tom Hanks"]).with_genres(["Drama"]);
        assert!(!broken.matches(&item));

        let diagnostic = &compiled.diagnostics[0];
        assert_eq!(diagnostic.origin, RuleOrigin::Expression(0));
        assert_eq!(diagnostic.collection, "Hanks Dramas");
        assert!(!diagnostic.messages.is_empty());
        assert!(!compiled.rules[1].is_inert());
    }

    #[test]
    fn test_all_parse_errors_are_surfaced() {
        let rules =
            RuleSet { expression_rules: vec![expression("X", r#"STUDIO AND BOGUS "y" OR"#)], ..Default::default() };
        let compiled = compile_all(&rules);
        assert_eq!(
            compiled.diagnostics[0].messages,
            vec![
                "expected a quoted string after STUDIO at position 7".to_string(),
                "unknown field keyword 'BOGUS' at position 11".to_string(),
                "expected a field keyword, found end of input at position 23".to_string(),
            ]
        );
    }

    #[test]
    fn test_invalid_title_rules() {
        let rules = RuleSet { title_rules: vec![title("", "Empty", false), title("x", " ", false)], ..Default::default() };
        let compiled = compile_all(&rules);
        // The nameless rule has no collection to belong to.
        assert_eq!(compiled.rules.len(), 1);
        assert!(compiled.rules[0].is_inert());
        assert_eq!(compiled.diagnostics.len(), 2);
        assert_eq!(compiled.diagnostics[0].messages, vec!["match value is empty".to_string()]);
        assert_eq!(compiled.diagnostics[1].messages, vec!["collection name is empty".to_string()]);
    }

    #[test]
    fn test_group_by_collection() {
        let rules = RuleSet {
            title_rules: vec![title("Avengers", "Marvel Universe", false), title("Batman", "DC", false)],
            expression_rules: vec![expression("Marvel Universe", r#"STUDIO "Marvel""#)],
        };
        let compiled = compile_all(&rules);
        let groups = compiled.by_collection();
        assert_eq!(groups.keys().copied().collect::<Vec<_>>(), vec!["DC", "Marvel Universe"]);
        assert_eq!(groups["Marvel Universe"].len(), 2);
    }

    #[test]
    fn test_oversized_expression_is_inert() {
        let chain = vec![r#"TITLE "x""#; 300_000].join(" OR ");
        let compiled = compile_all(&RuleSet { expression_rules: vec![expression("Huge", &chain)], ..Default::default() });
        assert!(compiled.rules[0].is_inert());
        assert_eq!(compiled.diagnostics[0].messages.len(), 1);
        assert!(compiled.diagnostics[0].messages[0].starts_with("expression has more than"));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_rule_set_field_names() {
        let rules: RuleSet = serde_json::from_str(
            r#"{
                "title_rules": [{"match": "Avengers", "collection": "Marvel Universe"}],
                "expression_rules": [{"collection": "Noir", "expression": "GENRE \"Noir\"", "case_sensitive": true}]
            }"#,
        )
        .unwrap();
        assert_eq!(rules.title_rules, vec![title("Avengers", "Marvel Universe", false)]);
        assert_eq!(rules.expression_rules[0].expression, r#"GENRE "Noir""#);
        assert!(rules.expression_rules[0].case_sensitive);

        let value = serde_json::to_value(&rules.title_rules[0]).unwrap();
        assert_eq!(value["match"], "Avengers");
        assert!(value.get("match_value").is_none());
        assert_eq!(serde_json::from_value::<TitleRule>(value).unwrap(), rules.title_rules[0]);
    }

    #[test]
    fn test_diagnostic_display() {
        let diagnostic = RuleDiagnostic {
            origin: RuleOrigin::Expression(2),
            collection: "Noir".into(),
            source: "GENRE".into(),
            messages: vec!["a".into(), "b".into()],
        };
        assert_eq!(diagnostic.to_string(), r#"expression rule #3 (collection "Noir"): a; b"#);
    }
}
