pub mod rules;
pub(crate) mod util;

pub use rules::{CategoryRule, CategoryRuleEngine, MatchType, RuleError};
