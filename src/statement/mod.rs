//! Credit-card statement ingestion: PDF text recovery, bank detection and
//! transaction extraction for Taiwanese banks.

pub mod cathay;
pub mod extract;
pub mod fubon;
pub mod lines;
pub mod passwords;
pub mod registry;
pub mod taishin;

use chrono::NaiveDate;

use crate::models::Transaction;

pub use passwords::Password;
pub use registry::{ParseOutcome, ParserRegistry};

/// One issuing bank's statement dialect.
pub trait BankParser: Send + Sync {
    /// Stable name used to attribute parsed files.
    fn bank_name(&self) -> &'static str;

    /// True when the text carries one of this bank's literal markers.
    fn can_parse(&self, content: &str) -> bool;

    /// Best-effort extraction; `today` anchors dates printed without a year.
    fn parse_as_of(&self, content: &str, today: NaiveDate) -> Vec<Transaction>;

    fn parse(&self, content: &str) -> Vec<Transaction> {
        self.parse_as_of(content, chrono::Local::now().date_naive())
    }
}

/// Every built-in parser in match-priority order.
pub fn builtin_parsers() -> Vec<Box<dyn BankParser>> {
    vec![
        Box::new(cathay::CathayParser::new()),
        Box::new(taishin::TaishinParser::new()),
        Box::new(fubon::FubonParser::new()),
    ]
}
