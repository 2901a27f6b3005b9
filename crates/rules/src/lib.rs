//! Collection rules and the expression language behind them.
//!
//! Two styles of rule decide which media items belong in a collection:
//!
//! - **Title rules** — a single case-(in)sensitive substring match against the
//!   item title.
//! - **Expression rules** — a small boolean language over several metadata
//!   fields, e.g. `STUDIO "Marvel" AND GENRE "Action"`.
//!
//! Expressions go through [`tokenize`](crate::lex::tokenize), a best-effort
//! typo normalization pass and then the [`parse`] step, which yields either a
//! [`Predicate`] tree or every diagnostic it could find. [`compile_all`] turns
//! a whole [`RuleSet`] into [`CompiledRules`] without ever failing: broken
//! rules become inert and their diagnostics are handed back to the caller.
//!
//! ```
//! use curate_media::MediaItem;
//! use curate_rules::{Field, Predicate, parse};
//!
//! let predicate = parse(r#"STUDIO "Marvel" AND GENRE "Action""#).unwrap();
//! assert_eq!(
//!     predicate,
//!     Predicate::and(Predicate::field(Field::Studio, "Marvel"), Predicate::field(Field::Genre, "Action")),
//! );
//!
//! let item = MediaItem::new("1", "Iron Man").with_studio("Marvel Studios").with_genres(["Action"]);
//! assert!(predicate.evaluate(&item, false));
//! ```

mod ast;
mod compile;
pub mod error;
mod eval;
pub mod lex;
mod normalize;
mod parse;

pub use crate::ast::{Field, Predicate};
pub use crate::compile::{
    CompiledRule, CompiledRules, ExpressionRule, RuleDiagnostic, RuleOrigin, RuleSet, TitleRule, compile_all,
};
pub use crate::error::{ParseError, ParseErrorKind};
pub use crate::parse::{MAX_DEPTH, MAX_OPERANDS, parse};
