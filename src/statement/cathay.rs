//! 國泰世華 (Cathay United Bank) credit-card statements.
//!
//! Charges are printed as `MM/DD description amount`, e.g. `12/25 全聯福利中心 1,234`.

use chrono::NaiveDate;

use super::lines::{DateFormat, LineMatcher};
use super::BankParser;
use crate::models::Transaction;

pub struct CathayParser {
    detect_patterns: Vec<&'static str>,
    lines: LineMatcher,
}

impl CathayParser {
    pub fn new() -> Self {
        Self {
            detect_patterns: vec!["國泰世華", "CATHAY", "國泰銀行"],
            lines: LineMatcher::new(&[DateFormat::MonthDay]),
        }
    }
}

impl BankParser for CathayParser {
    fn bank_name(&self) -> &'static str {
        "國泰世華"
    }

    fn can_parse(&self, content: &str) -> bool {
        self.detect_patterns.iter().any(|p| content.contains(p))
    }

    fn parse_as_of(&self, content: &str, today: NaiveDate) -> Vec<Transaction> {
        self.lines.extract(content, today)
    }
}
