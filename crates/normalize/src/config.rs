use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::vocabulary::VocabularyEntry;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Tunable thresholds and vocabulary for the whole pipeline.
///
/// Every section falls back to its defaults, so a config file only needs the
/// keys it changes:
///
/// ```toml
/// [classifier]
/// min_rows = 3
///
/// [[vocabulary]]
/// role = "DESCRIPTION"
/// phrase = "beneficiary"
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct NormalizeConfig {
    pub classifier: ClassifierConfig,
    pub dates: DateConfig,
    pub assemble: AssembleConfig,
    pub validation: ValidationConfig,
    pub vocabulary: Vec<VocabularyEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierConfig {
    /// Tables with fewer non-blank rows are summaries, not ledgers.
    pub min_rows: usize,
    /// How many leading rows to sample when looking for a date column.
    pub date_sample_rows: usize,
    /// Share of non-blank sampled cells that must parse as dates.
    pub date_column_ratio: f64,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            min_rows: 1,
            date_sample_rows: 20,
            date_column_ratio: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DateConfig {
    /// Read `03/04/2024` as 3 April (true) or March 4 (false).
    pub day_first: bool,
}

impl Default for DateConfig {
    fn default() -> Self {
        Self { day_first: true }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssembleConfig {
    /// Fold description-only rows into the preceding transaction.
    pub merge_continuation_rows: bool,
    /// Descriptions marking opening/closing/total lines.
    pub summary_keywords: Vec<String>,
}

impl Default for AssembleConfig {
    fn default() -> Self {
        Self {
            merge_continuation_rows: true,
            summary_keywords: [
                "opening balance",
                "closing balance",
                "balance brought forward",
                "balance carried forward",
                "brought forward",
                "carried forward",
                "total",
                "grand total",
                "b f",
                "c f",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ValidationConfig {
    /// Largest plausible absolute amount.
    pub max_abs_amount: Decimal,
    pub earliest_year: i32,
    /// Days past the processing date still accepted.
    pub future_tolerance_days: i64,
    pub repair_sign_from_balance: bool,
}

impl Default for ValidationConfig {
    fn default() -> Self {
        Self {
            max_abs_amount: Decimal::from(1_000_000_000i64),
            earliest_year: 1970,
            future_tolerance_days: 0,
            repair_sign_from_balance: true,
        }
    }
}

/// Ten years; anything later is not a statement date.
const MAX_FUTURE_TOLERANCE_DAYS: i64 = 3650;

impl NormalizeConfig {
    pub fn from_toml(toml_content: &str) -> Result<Self, ConfigError> {
        let config: NormalizeConfig = toml::from_str(toml_content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml(&content)?;
        tracing::info!("Loaded normalizer config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let ratio = self.classifier.date_column_ratio;
        if !(0.0..=1.0).contains(&ratio) {
            return Err(ConfigError::Invalid(format!(
                "classifier.date_column_ratio must be within 0..=1, got {ratio}"
            )));
        }
        if self.classifier.date_sample_rows == 0 {
            return Err(ConfigError::Invalid(
                "classifier.date_sample_rows must be at least 1".to_string(),
            ));
        }
        if self.validation.max_abs_amount <= Decimal::ZERO {
            return Err(ConfigError::Invalid(
                "validation.max_abs_amount must be positive".to_string(),
            ));
        }
        let tolerance = self.validation.future_tolerance_days;
        if !(0..=MAX_FUTURE_TOLERANCE_DAYS).contains(&tolerance) {
            return Err(ConfigError::Invalid(format!(
                "validation.future_tolerance_days must be within 0..={MAX_FUTURE_TOLERANCE_DAYS}, got {tolerance}"
            )));
        }
        if let Some(e) = self.vocabulary.iter().find(|e| e.phrase.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("empty vocabulary phrase for role {}", e.role)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::ColumnRole;
    use std::io::Write;

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(NormalizeConfig::from_toml("").unwrap(), NormalizeConfig::default());
    }

    #[test]
    fn partial_sections_keep_defaults() {
        let config = NormalizeConfig::from_toml(
            r#"
            [classifier]
            min_rows = 3

            [validation]
            max_abs_amount = 50000
            earliest_year = 2000

            [[vocabulary]]
            role = "DESCRIPTION"
            phrase = "beneficiary"
            "#,
        )
        .unwrap();
        assert_eq!(config.classifier.min_rows, 3);
        assert_eq!(config.classifier.date_sample_rows, 20);
        assert_eq!(config.validation.max_abs_amount, Decimal::from(50_000));
        assert_eq!(config.validation.earliest_year, 2000);
        assert!(config.validation.repair_sign_from_balance);
        assert!(config.dates.day_first);
        assert_eq!(config.vocabulary[0].role, ColumnRole::Description);
    }

    #[test]
    fn rejects_out_of_range_ratio() {
        let err = NormalizeConfig::from_toml("[classifier]\ndate_column_ratio = 1.5").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_non_positive_ceiling() {
        let err = NormalizeConfig::from_toml("[validation]\nmax_abs_amount = 0").unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn rejects_future_tolerance_outside_bounds() {
        for raw in ["-1", "3651", "10000000000"] {
            let toml = format!("[validation]\nfuture_tolerance_days = {raw}");
            let err = NormalizeConfig::from_toml(&toml).unwrap_err();
            assert!(matches!(err, ConfigError::Invalid(_)), "{raw}");
        }
        let config = NormalizeConfig::from_toml("[validation]\nfuture_tolerance_days = 3650").unwrap();
        assert_eq!(config.validation.future_tolerance_days, 3650);
    }

    #[test]
    fn rejects_malformed_toml() {
        assert!(matches!(
            NormalizeConfig::from_toml("[classifier\nmin_rows = 1"),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[dates]\nday_first = false").unwrap();
        let config = NormalizeConfig::load(file.path()).unwrap();
        assert!(!config.dates.day_first);
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = NormalizeConfig::load(&dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }
}
