use ledgerline_core::{DebitCredit, Transaction};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::levenshtein_distance;

const DEFAULT_RULES: &str = include_str!("default_rules.toml");

#[derive(Debug, Error)]
pub enum RuleError {
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid regex in rule '{rule}': {source}")]
    InvalidRegex {
        rule: String,
        #[source]
        source: regex::Error,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryRule {
    pub name: String,
    #[serde(default)]
    pub priority: i32,
    pub pattern: String,
    #[serde(default)]
    pub match_type: MatchType,
    pub category: String,
    /// Only match debits or only credits.
    #[serde(default)]
    pub direction: Option<DebitCredit>,
    /// Bounds on the absolute amount, inclusive.
    #[serde(default)]
    pub amount_min: Option<Decimal>,
    #[serde(default)]
    pub amount_max: Option<Decimal>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub enum MatchType {
    #[default]
    Contains,
    Exact,
    Regex,
    Fuzzy {
        threshold: f32,
    },
}

impl std::str::FromStr for MatchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "contains" => Ok(MatchType::Contains),
            "exact" => Ok(MatchType::Exact),
            "regex" => Ok(MatchType::Regex),
            s if s.starts_with("fuzzy:") => {
                let threshold = s[6..]
                    .parse::<f32>()
                    .map_err(|_| "Invalid fuzzy threshold".to_string())?;
                Ok(MatchType::Fuzzy { threshold })
            }
            other => Err(format!("Unknown match type: '{other}'")),
        }
    }
}

#[derive(Deserialize)]
struct RuleFile {
    #[serde(default)]
    rule: Vec<CategoryRule>,
}

/// A rule with its regex compiled once up front.
struct CompiledRule {
    rule: CategoryRule,
    compiled_regex: Option<regex::Regex>,
}

pub struct CategoryRuleEngine {
    rules: Vec<CompiledRule>,
}

impl CategoryRuleEngine {
    /// Rules with an invalid regex are kept but never match; use
    /// [`CategoryRuleEngine::try_new`] to reject them instead.
    pub fn new(rules: Vec<CategoryRule>) -> Self {
        let compiled = rules
            .into_iter()
            .map(|rule| {
                let compiled_regex = match &rule.match_type {
                    MatchType::Regex => match regex::Regex::new(&rule.pattern) {
                        Ok(re) => Some(re),
                        Err(e) => {
                            tracing::warn!("Rule '{}' has an invalid regex: {e}", rule.name);
                            None
                        }
                    },
                    _ => None,
                };
                CompiledRule { rule, compiled_regex }
            })
            .collect();
        Self::sorted(compiled)
    }

    pub fn try_new(rules: Vec<CategoryRule>) -> Result<Self, RuleError> {
        let compiled = rules
            .into_iter()
            .map(|rule| {
                let compiled_regex = match &rule.match_type {
                    MatchType::Regex => Some(regex::Regex::new(&rule.pattern).map_err(|source| {
                        RuleError::InvalidRegex {
                            rule: rule.name.clone(),
                            source,
                        }
                    })?),
                    _ => None,
                };
                Ok(CompiledRule { rule, compiled_regex })
            })
            .collect::<Result<Vec<_>, RuleError>>()?;
        Ok(Self::sorted(compiled))
    }

    fn sorted(mut compiled: Vec<CompiledRule>) -> Self {
        // Highest priority first; stable, so file order breaks ties.
        compiled.sort_by(|a, b| b.rule.priority.cmp(&a.rule.priority));
        Self { rules: compiled }
    }

    /// Parse `[[rule]]` tables.
    pub fn from_toml(toml_content: &str) -> Result<Self, RuleError> {
        let file: RuleFile = toml::from_str(toml_content)?;
        Self::try_new(file.rule)
    }

    /// The bundled keyword categories.
    pub fn default_rules() -> Result<Self, RuleError> {
        Self::from_toml(DEFAULT_RULES)
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    pub fn find_matching_rule(&self, tx: &Transaction) -> Option<&CategoryRule> {
        self.rules
            .iter()
            .find(|cr| self.rule_matches(cr, tx))
            .map(|cr| &cr.rule)
    }

    /// Returns indices + matched rules for all transactions, in order.
    pub fn apply_rules<'a>(&'a self, transactions: &[Transaction]) -> Vec<(usize, &'a CategoryRule)> {
        transactions
            .iter()
            .enumerate()
            .filter_map(|(idx, tx)| self.find_matching_rule(tx).map(|r| (idx, r)))
            .collect()
    }

    /// Fill `category` on transactions that have none. Returns how many were
    /// assigned.
    pub fn categorize(&self, transactions: &mut [Transaction]) -> usize {
        let mut assigned = 0;
        for tx in transactions.iter_mut().filter(|tx| tx.category.is_none()) {
            if let Some(rule) = self.find_matching_rule(tx) {
                tracing::debug!("{} -> {} (rule '{}')", tx.source, rule.category, rule.name);
                tx.category = Some(rule.category.clone());
                assigned += 1;
            }
        }
        tracing::info!("Categorized {assigned} of {} transactions", transactions.len());
        assigned
    }

    fn rule_matches(&self, cr: &CompiledRule, tx: &Transaction) -> bool {
        let rule = &cr.rule;

        if rule.direction.is_some_and(|d| d != tx.debit_credit()) {
            return false;
        }

        let magnitude = tx.amount().abs().as_decimal();
        if rule.amount_min.is_some_and(|min| magnitude < min) {
            return false;
        }
        if rule.amount_max.is_some_and(|max| magnitude > max) {
            return false;
        }

        let text = tx.description.to_lowercase();
        let pattern = rule.pattern.to_lowercase();
        if pattern.is_empty() {
            return false;
        }

        match &rule.match_type {
            MatchType::Contains => text.contains(&pattern),
            MatchType::Exact => text == pattern,
            MatchType::Regex => cr
                .compiled_regex
                .as_ref()
                .is_some_and(|re| re.is_match(&tx.description)),
            MatchType::Fuzzy { threshold } => fuzzy_score(&text, &pattern) >= *threshold,
        }
    }
}

fn fuzzy_score(s1: &str, s2: &str) -> f32 {
    let max_len = s1.chars().count().max(s2.chars().count());
    if max_len == 0 {
        return 1.0;
    }
    1.0 - (levenshtein_distance(s1, s2) as f32 / max_len as f32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use ledgerline_core::{Money, SourceRef};
    use std::str::FromStr;

    fn make_tx(desc: &str, amount: &str) -> Transaction {
        Transaction::new(
            NaiveDate::from_ymd_opt(2024, 1, 15).unwrap(),
            desc,
            Money::from_decimal(Decimal::from_str(amount).unwrap()),
            SourceRef { page: 0, table: 0, row: 0 },
        )
        .unwrap()
    }

    fn make_rule(pattern: &str, match_type: MatchType, category: &str, priority: i32) -> CategoryRule {
        CategoryRule {
            name: "test".to_string(),
            priority,
            pattern: pattern.to_string(),
            match_type,
            category: category.to_string(),
            direction: None,
            amount_min: None,
            amount_max: None,
        }
    }

    // ── match types ──────────────────────────────────────────────────────────

    #[test]
    fn contains_match_case_insensitive() {
        let engine = CategoryRuleEngine::new(vec![make_rule("whole foods", MatchType::Contains, "food", 1)]);
        assert!(engine.find_matching_rule(&make_tx("WHOLE FOODS MARKET 123", "-50")).is_some());
        assert!(engine.find_matching_rule(&make_tx("STARBUCKS", "-5")).is_none());
    }

    #[test]
    fn exact_match() {
        let engine = CategoryRuleEngine::new(vec![make_rule("starbucks", MatchType::Exact, "food", 1)]);
        assert!(engine.find_matching_rule(&make_tx("STARBUCKS", "-5")).is_some());
        assert!(engine.find_matching_rule(&make_tx("STARBUCKS RESERVE", "-5")).is_none());
    }

    #[test]
    fn regex_match() {
        let engine = CategoryRuleEngine::new(vec![make_rule(r"^AMZN|AMAZON", MatchType::Regex, "shopping", 1)]);
        assert!(engine.find_matching_rule(&make_tx("AMAZON MARKETPLACE", "-19.99")).is_some());
        assert!(engine.find_matching_rule(&make_tx("AMZN*PRIME", "-13.99")).is_some());
        assert!(engine.find_matching_rule(&make_tx("WHOLE FOODS", "-10")).is_none());
    }

    #[test]
    fn fuzzy_match_similar_strings() {
        let engine = CategoryRuleEngine::new(vec![make_rule(
            "starbucks",
            MatchType::Fuzzy { threshold: 0.8 },
            "food",
            1,
        )]);
        assert!(engine.find_matching_rule(&make_tx("starbuck", "-5")).is_some());
        assert!(engine.find_matching_rule(&make_tx("WHOLE FOODS", "-5")).is_none());
    }

    #[test]
    fn empty_pattern_never_matches() {
        let engine = CategoryRuleEngine::new(vec![make_rule("", MatchType::Contains, "x", 1)]);
        assert!(engine.find_matching_rule(&make_tx("ANYTHING", "-1")).is_none());
    }

    #[test]
    fn match_type_from_str() {
        assert_eq!(MatchType::from_str("Regex").unwrap(), MatchType::Regex);
        assert_eq!(MatchType::from_str("fuzzy:0.75").unwrap(), MatchType::Fuzzy { threshold: 0.75 });
        assert!(MatchType::from_str("fuzzy:abc").is_err());
        assert!(MatchType::from_str("glob").is_err());
    }

    // ── filters and ordering ─────────────────────────────────────────────────

    #[test]
    fn priority_ordering_highest_wins() {
        let engine = CategoryRuleEngine::new(vec![
            make_rule("amazon", MatchType::Contains, "shopping", 1),
            make_rule("amazon", MatchType::Contains, "software", 10),
        ]);
        let rule = engine.find_matching_rule(&make_tx("AMAZON WEB SERVICES", "-99")).unwrap();
        assert_eq!(rule.category, "software");
    }

    #[test]
    fn amount_limits_use_magnitude() {
        let mut rule = make_rule("amazon", MatchType::Contains, "big purchase", 1);
        rule.amount_min = Some(Decimal::from(100));
        rule.amount_max = Some(Decimal::from(500));
        let engine = CategoryRuleEngine::new(vec![rule]);
        assert!(engine.find_matching_rule(&make_tx("AMAZON", "-99.99")).is_none());
        assert!(engine.find_matching_rule(&make_tx("AMAZON", "-100")).is_some());
        assert!(engine.find_matching_rule(&make_tx("AMAZON", "500")).is_some());
        assert!(engine.find_matching_rule(&make_tx("AMAZON", "-500.01")).is_none());
    }

    #[test]
    fn direction_filter() {
        let mut rule = make_rule("refund", MatchType::Contains, "income", 1);
        rule.direction = Some(DebitCredit::Credit);
        let engine = CategoryRuleEngine::new(vec![rule]);
        assert!(engine.find_matching_rule(&make_tx("REFUND", "20")).is_some());
        assert!(engine.find_matching_rule(&make_tx("REFUND", "-20")).is_none());
    }

    // ── engine ───────────────────────────────────────────────────────────────

    #[test]
    fn categorize_fills_only_missing() {
        let engine = CategoryRuleEngine::new(vec![make_rule("github", MatchType::Contains, "software", 1)]);
        let mut txs = vec![
            make_tx("GITHUB SUBSCRIPTION", "-10"),
            make_tx("STARBUCKS", "-5"),
            make_tx("GITHUB ACTIONS", "-2"),
        ];
        txs[2].category = Some("ci".to_string());
        assert_eq!(engine.categorize(&mut txs), 1);
        assert_eq!(txs[0].category.as_deref(), Some("software"));
        assert!(txs[1].category.is_none());
        assert_eq!(txs[2].category.as_deref(), Some("ci"));
    }

    #[test]
    fn apply_rules_returns_matched_indices() {
        let engine = CategoryRuleEngine::new(vec![make_rule("github", MatchType::Contains, "software", 1)]);
        let txs = vec![
            make_tx("GITHUB SUBSCRIPTION", "-10"),
            make_tx("STARBUCKS", "-5"),
            make_tx("GITHUB ACTIONS", "-2"),
        ];
        let idx: Vec<_> = engine.apply_rules(&txs).into_iter().map(|(i, _)| i).collect();
        assert_eq!(idx, vec![0, 2]);
    }

    #[test]
    fn from_toml_rule_tables() {
        let engine = CategoryRuleEngine::from_toml(
            r#"
            [[rule]]
            name = "coffee"
            pattern = "coffee"
            category = "food"

            [[rule]]
            name = "payroll"
            priority = 5
            pattern = "payroll"
            match_type = "Exact"
            category = "income"
            direction = "credit"
            amount_min = 1000

            [[rule]]
            name = "typo"
            pattern = "starbucks"
            match_type = { Fuzzy = { threshold = 0.8 } }
            category = "food"
            "#,
        )
        .unwrap();
        assert_eq!(engine.len(), 3);
        assert_eq!(
            engine.find_matching_rule(&make_tx("PAYROLL", "2500")).unwrap().name,
            "payroll"
        );
        assert!(engine.find_matching_rule(&make_tx("PAYROLL", "10")).is_none());
        assert_eq!(engine.find_matching_rule(&make_tx("STARBUKS", "-4")).unwrap().name, "typo");
    }

    #[test]
    fn from_toml_rejects_bad_regex() {
        let err = CategoryRuleEngine::from_toml(
            "[[rule]]\nname = \"broken\"\npattern = \"(\"\nmatch_type = \"Regex\"\ncategory = \"x\"",
        )
        .err()
        .unwrap();
        assert!(matches!(err, RuleError::InvalidRegex { ref rule, .. } if rule == "broken"));
    }

    #[test]
    fn new_keeps_bad_regex_inert() {
        let engine = CategoryRuleEngine::new(vec![make_rule("(", MatchType::Regex, "x", 1)]);
        assert_eq!(engine.len(), 1);
        assert!(engine.find_matching_rule(&make_tx("(", "-1")).is_none());
    }

    #[test]
    fn empty_file_is_empty_engine() {
        assert!(CategoryRuleEngine::from_toml("").unwrap().is_empty());
    }

    #[test]
    fn default_rules_cover_keyword_categories() {
        let engine = CategoryRuleEngine::default_rules().unwrap();
        let category = |desc: &str, amount: &str| {
            engine
                .find_matching_rule(&make_tx(desc, amount))
                .map(|r| r.category.clone())
        };
        assert_eq!(category("SALARY JAN", "2500").as_deref(), Some("income"));
        assert_eq!(category("WALMART SUPERCENTER", "-125.50").as_deref(), Some("shopping"));
        assert_eq!(category("STARBUCKS #1234", "-4.75").as_deref(), Some("food"));
        assert_eq!(category("UBER TRIP", "-18").as_deref(), Some("transportation"));
        assert_eq!(category("CITY WATER DEPT", "-40").as_deref(), Some("utilities"));
        assert_eq!(category("NETFLIX.COM", "-15.49").as_deref(), Some("entertainment"));
        assert_eq!(category("CVS PHARMACY", "-12").as_deref(), Some("healthcare"));
        assert_eq!(category("ATM WDL", "-2000"), None);
        // Income keywords only apply to credits.
        assert_eq!(category("SECURITY DEPOSIT", "-500"), None);
    }

    #[test]
    fn fuzzy_score_bounds() {
        assert_eq!(fuzzy_score("starbucks", "starbucks"), 1.0);
        assert_eq!(fuzzy_score("", ""), 1.0);
    }
}
