pub mod money;
pub mod period;
pub mod table;
pub mod transaction;

pub use money::Money;
pub use period::DateRange;
pub use table::{RawTable, SourceRef};
pub use transaction::{DebitCredit, Transaction, TransactionError};
