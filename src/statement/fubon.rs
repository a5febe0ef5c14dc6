//! 富邦銀行 (Taipei Fubon Bank) credit-card statements.
//!
//! Dates use the ROC calendar (`114/12/25`); some sections fall back to `MM/DD`.

use chrono::NaiveDate;

use super::lines::{DateFormat, LineMatcher};
use super::BankParser;
use crate::models::Transaction;

pub struct FubonParser {
    detect_patterns: Vec<&'static str>,
    lines: LineMatcher,
}

impl FubonParser {
    pub fn new() -> Self {
        Self {
            detect_patterns: vec!["富邦銀行", "台北富邦", "FUBON", "富邦金控"],
            lines: LineMatcher::new(&[DateFormat::Roc, DateFormat::MonthDay]),
        }
    }
}

impl BankParser for FubonParser {
    fn bank_name(&self) -> &'static str {
        "富邦銀行"
    }

    fn can_parse(&self, content: &str) -> bool {
        self.detect_patterns.iter().any(|p| content.contains(p))
    }

    fn parse_as_of(&self, content: &str, today: NaiveDate) -> Vec<Transaction> {
        self.lines.extract(content, today)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_detect() {
        let p = FubonParser::new();
        assert!(p.can_parse("台北富邦商業銀行"));
        assert!(p.can_parse("TAIPEI FUBON BANK"));
        assert!(p.can_parse("富邦金控 旗下"));
        assert!(!p.can_parse("fubon"));
        assert!(!p.can_parse(""));
    }

    #[test]
    fn test_parse_roc_dates() {
        let p = FubonParser::new();
        let txns = p.parse_as_of("富邦銀行\n114/12/25 餐廳消費 2,500", day(2026, 2, 1));
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].date, day(2025, 12, 25));
        assert_eq!(txns[0].description, "餐廳消費");
        assert_eq!(txns[0].amount, 2500.0);
    }

    #[test]
    fn test_falls_back_to_month_day() {
        let p = FubonParser::new();
        let content = "富邦銀行\n113/01/15 好市多 3,980\n02/03 誠品生活 450\nxx/yy 無效 10";
        let txns = p.parse_as_of(content, day(2024, 2, 10));
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].date, day(2024, 1, 15));
        assert_eq!(txns[1].date, day(2024, 2, 3));
        assert_eq!(txns[1].description, "誠品生活");
    }
}
