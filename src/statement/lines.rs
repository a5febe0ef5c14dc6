//! Line-oriented transaction extraction shared by every bank variant.
//!
//! Each bank is a [`LineMatcher`] configured with the date notations it prints,
//! tried longest first. A line that matches none of them, or whose date or
//! amount does not parse, is skipped without affecting the rest of the text.

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use crate::models::Transaction;

/// Offset between the Republic of China calendar and the Gregorian calendar.
pub const ROC_YEAR_OFFSET: i32 = 1911;

// The date token must not be glued to a preceding digit or slash, so that
// "2025/12/25" is never read as ROC "025/12/25" or short "25/12".
const DATE_PREFIX: &str = r"(?:^|[^0-9/])";
const TAIL: &str = r"\s+(.+?)\s+([0-9,]+)";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateFormat {
    /// `YYYY/MM/DD`
    Gregorian,
    /// `RRR/MM/DD`, year counted from 1912.
    Roc,
    /// `MM/DD`, year inferred from the processing date.
    MonthDay,
}

impl DateFormat {
    fn token_pattern(self) -> &'static str {
        match self {
            Self::Gregorian => r"([0-9]{4})/([0-9]{2})/([0-9]{2})",
            Self::Roc => r"([0-9]{3})/([0-9]{2})/([0-9]{2})",
            Self::MonthDay => r"()([0-9]{2})/([0-9]{2})",
        }
    }

    fn resolve(self, year: &str, month: u32, day: u32, today: NaiveDate) -> Option<NaiveDate> {
        let year = match self {
            Self::Gregorian => year.parse().ok()?,
            Self::Roc => roc_to_gregorian(year.parse().ok()?),
            Self::MonthDay => implied_year(month, today),
        };
        NaiveDate::from_ymd_opt(year, month, day)
    }
}

pub fn roc_to_gregorian(roc_year: i32) -> i32 {
    roc_year + ROC_YEAR_OFFSET
}

/// Statements list charges from the closing period, so a month later than the
/// current one belongs to last year (a December charge processed in January).
pub fn implied_year(month: u32, today: NaiveDate) -> i32 {
    if month > today.month() {
        today.year() - 1
    } else {
        today.year()
    }
}

/// Strip thousands separators; `None` for anything that is not a
/// non-negative decimal number.
pub fn parse_amount(raw: &str) -> Option<f64> {
    let cleaned = raw.replace(',', "");
    let amount: f64 = cleaned.trim().parse().ok()?;
    (amount.is_finite() && amount >= 0.0).then_some(amount)
}

struct DatePattern {
    format: DateFormat,
    re: Regex,
}

pub struct LineMatcher {
    patterns: Vec<DatePattern>,
    card: Regex,
}

impl LineMatcher {
    /// `formats` are tried in the given order for each line; put the most
    /// specific notation first.
    pub fn new(formats: &[DateFormat]) -> Self {
        let patterns = formats
            .iter()
            .map(|&format| DatePattern {
                format,
                re: Regex::new(&format!("{DATE_PREFIX}{}{TAIL}", format.token_pattern()))
                    .expect("static date pattern"),
            })
            .collect();
        Self {
            patterns,
            card: Regex::new(
                r"(?:卡號|末四碼|Card No\.?)[^0-9Xx*]*(?:[0-9Xx*]{4}[-\s]?){0,3}([0-9]{4})\b",
            )
            .expect("static card pattern"),
        }
    }

    /// Extract every recognisable transaction line. Card-number header lines
    /// set the card suffix for the transactions that follow them.
    pub fn extract(&self, content: &str, today: NaiveDate) -> Vec<Transaction> {
        let mut transactions = Vec::new();
        let mut card_last4: Option<String> = None;
        let mut skipped = 0usize;

        for line in content.lines() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }
            match self.match_line(line, today) {
                LineMatch::Transaction(mut txn) => {
                    txn.card_last4 = card_last4.clone();
                    transactions.push(txn);
                }
                LineMatch::Malformed => skipped += 1,
                LineMatch::NoMatch => {
                    if let Some(caps) = self.card.captures(line) {
                        card_last4 = Some(caps[1].to_string());
                    }
                }
            }
        }

        if skipped > 0 {
            log::debug!("skipped {skipped} lines with unparseable date or amount");
        }
        transactions
    }

    fn match_line(&self, line: &str, today: NaiveDate) -> LineMatch {
        for pattern in &self.patterns {
            let Some(caps) = pattern.re.captures(line) else {
                continue;
            };
            let (Ok(month), Ok(day)) = (caps[2].parse::<u32>(), caps[3].parse::<u32>()) else {
                return LineMatch::Malformed;
            };
            let Some(date) = pattern.format.resolve(&caps[1], month, day, today) else {
                return LineMatch::Malformed;
            };
            let Some(amount) = parse_amount(&caps[5]) else {
                return LineMatch::Malformed;
            };
            let description = caps[4].trim();
            return LineMatch::Transaction(Transaction::twd(date, description, amount));
        }
        LineMatch::NoMatch
    }
}

enum LineMatch {
    Transaction(Transaction),
    Malformed,
    NoMatch,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1,234"), Some(1234.0));
        assert_eq!(parse_amount("1,234,567"), Some(1234567.0));
        assert_eq!(parse_amount("0"), Some(0.0));
        assert_eq!(parse_amount(",,,"), None);
        assert_eq!(parse_amount(""), None);
        assert_eq!(parse_amount("-5"), None);
    }

    #[test]
    fn test_implied_year_rolls_back_across_new_year() {
        assert_eq!(implied_year(12, day(2026, 1, 10)), 2025);
        assert_eq!(implied_year(1, day(2026, 1, 10)), 2026);
        assert_eq!(implied_year(6, day(2026, 6, 30)), 2026);
        assert_eq!(implied_year(7, day(2026, 6, 30)), 2025);
    }

    #[test]
    fn test_roc_years() {
        for roc in 80..=150 {
            assert_eq!(roc_to_gregorian(roc), roc + 1911);
        }
        assert_eq!(roc_to_gregorian(114), 2025);
    }

    #[test]
    fn test_month_day_line() {
        let m = LineMatcher::new(&[DateFormat::MonthDay]);
        let txns = m.extract("  12/25  全聯福利中心   1,234  ", day(2026, 1, 5));
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].date, day(2025, 12, 25));
        assert_eq!(txns[0].description, "全聯福利中心");
        assert_eq!(txns[0].amount, 1234.0);
        assert_eq!(txns[0].currency, "TWD");
        assert!(txns[0].category.is_none());
    }

    #[test]
    fn test_same_month_keeps_current_year() {
        let m = LineMatcher::new(&[DateFormat::MonthDay]);
        let txns = m.extract("03/02 UBER 250", day(2026, 3, 15));
        assert_eq!(txns[0].date, day(2026, 3, 2));
    }

    #[test]
    fn test_description_keeps_inner_spaces() {
        let m = LineMatcher::new(&[DateFormat::MonthDay]);
        let txns = m.extract("11/03 APPLE.COM/BILL ITUNES 90", day(2026, 11, 20));
        assert_eq!(txns[0].description, "APPLE.COM/BILL ITUNES");
        assert_eq!(txns[0].amount, 90.0);
    }

    #[test]
    fn test_gregorian_before_month_day() {
        let m = LineMatcher::new(&[DateFormat::Gregorian, DateFormat::MonthDay]);
        let txns = m.extract("2024/12/25 誠品書店 880\n01/03 7-ELEVEN 65", day(2025, 1, 20));
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].date, day(2024, 12, 25));
        assert_eq!(txns[0].description, "誠品書店");
        assert_eq!(txns[1].date, day(2025, 1, 3));
        assert_eq!(txns[1].description, "7-ELEVEN");
    }

    #[test]
    fn test_roc_before_month_day() {
        let m = LineMatcher::new(&[DateFormat::Roc, DateFormat::MonthDay]);
        let txns = m.extract("114/12/25 餐廳消費 2,500\n12/24 加油站 1,100", day(2026, 1, 2));
        assert_eq!(txns.len(), 2);
        assert_eq!(txns[0].date, day(2025, 12, 25));
        assert_eq!(txns[0].amount, 2500.0);
        assert_eq!(txns[1].date, day(2025, 12, 24));
    }

    #[test]
    fn test_gregorian_date_not_read_as_roc() {
        let m = LineMatcher::new(&[DateFormat::Roc, DateFormat::MonthDay]);
        let txns = m.extract("2025/12/25 餐廳消費 2,500", day(2026, 1, 2));
        assert!(txns.is_empty());
    }

    #[test]
    fn test_malformed_lines_are_skipped() {
        let m = LineMatcher::new(&[DateFormat::MonthDay]);
        let content = "本期應繳總額 12,345\n13/45 不存在的日期 100\n02/30 二月三十日 100\n12/01 OK SHOP 300\n";
        let txns = m.extract(content, day(2025, 12, 31));
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].description, "OK SHOP");
    }

    #[test]
    fn test_card_header_applies_to_following_lines() {
        let m = LineMatcher::new(&[DateFormat::MonthDay]);
        let content = "12/01 FIRST 100\n卡號：4563-XXXX-XXXX-1234\n12/02 SECOND 200\n末四碼 9876\n12/03 THIRD 300";
        let txns = m.extract(content, day(2025, 12, 31));
        assert_eq!(txns.len(), 3);
        assert_eq!(txns[0].card_last4, None);
        assert_eq!(txns[1].card_last4.as_deref(), Some("1234"));
        assert_eq!(txns[2].card_last4.as_deref(), Some("9876"));
    }

    #[test]
    fn test_empty_text() {
        let m = LineMatcher::new(&[DateFormat::Gregorian, DateFormat::MonthDay]);
        assert!(m.extract("", day(2025, 1, 1)).is_empty());
    }
}
