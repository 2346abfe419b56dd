pub mod assemble;
pub mod classify;
pub mod config;
pub mod fields;
pub mod mapping;
pub mod pipeline;
pub mod report;
pub mod summary;
pub mod validate;
pub mod vocabulary;

pub use assemble::DropReason;
pub use classify::{Classification, RejectReason};
pub use config::{ConfigError, NormalizeConfig};
pub use fields::{parse_amount, parse_date, FieldError};
pub use mapping::{map_columns, AmountEncoding, ColumnMapping, ColumnRole};
pub use pipeline::{NormalizeError, NormalizeOutput, Normalizer};
pub use report::{QualityReport, TableReport};
pub use summary::StatementSummary;
pub use validate::{Implausibility, Rejection};
pub use vocabulary::VocabularyEntry;

use ledgerline_core::RawTable;

/// Normalize extracted tables with the default configuration.
pub fn normalize(tables: &[RawTable]) -> Result<NormalizeOutput, NormalizeError> {
    Normalizer::new(NormalizeConfig::default()).normalize(tables)
}
