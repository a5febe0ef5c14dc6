//! 台新銀行 (Taishin International Bank) credit-card statements.
//!
//! Newer statements print a full `YYYY/MM/DD` date, older ones `MM/DD`.

use chrono::NaiveDate;

use super::lines::{DateFormat, LineMatcher};
use super::BankParser;
use crate::models::Transaction;

pub struct TaishinParser {
    detect_patterns: Vec<&'static str>,
    lines: LineMatcher,
}

impl TaishinParser {
    pub fn new() -> Self {
        Self {
            detect_patterns: vec!["台新銀行", "台新國際商業銀行", "TAISHIN", "TSB"],
            lines: LineMatcher::new(&[DateFormat::Gregorian, DateFormat::MonthDay]),
        }
    }
}

impl BankParser for TaishinParser {
    fn bank_name(&self) -> &'static str {
        "台新銀行"
    }

    fn can_parse(&self, content: &str) -> bool {
        self.detect_patterns.iter().any(|p| content.contains(p))
    }

    fn parse_as_of(&self, content: &str, today: NaiveDate) -> Vec<Transaction> {
        self.lines.extract(content, today)
    }
}
