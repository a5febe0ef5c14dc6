use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const CURRENCY_TWD: &str = "TWD";
pub const TYPE_EXPENSE: &str = "expense";
pub const SOURCE_PDF_IMPORT: &str = "pdf_import";

/// One statement line as extracted by a bank parser.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    pub currency: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card_last4: Option<String>,
}

impl Transaction {
    pub fn twd(date: NaiveDate, description: impl Into<String>, amount: f64) -> Self {
        Self {
            date,
            description: description.into(),
            amount,
            currency: CURRENCY_TWD.to_string(),
            category: None,
            card_last4: None,
        }
    }
}

/// A transaction after duplicate tagging.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParsedTransaction {
    #[serde(flatten)]
    pub transaction: Transaction,
    #[serde(default)]
    pub is_duplicate: bool,
}

/// Outcome of running one uploaded file through the pipeline.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FileReport {
    pub filename: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank: Option<String>,
    #[serde(default)]
    pub transactions: Vec<ParsedTransaction>,
    #[serde(default)]
    pub total_amount: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileReport {
    pub fn failed(filename: &str, error: impl ToString) -> Self {
        Self {
            filename: filename.to_string(),
            error: Some(error.to_string()),
            ..Default::default()
        }
    }

    pub fn duplicate_count(&self) -> usize {
        self.transactions.iter().filter(|t| t.is_duplicate).count()
    }
}

/// Row handed to the ledger for insertion.
#[derive(Debug, Clone)]
pub struct NewTransaction {
    pub date: NaiveDate,
    pub description: String,
    pub amount: f64,
    pub category_id: Option<i64>,
    pub txn_type: &'static str,
    pub source: &'static str,
}

#[derive(Debug, Clone)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub category_type: String,
}

#[derive(Debug, Clone)]
pub struct PdfPassword {
    pub priority: i64,
    pub label: Option<String>,
    pub has_value: bool,
}

#[derive(Debug, Clone)]
pub struct ImportRecord {
    pub filename: String,
    pub bank: Option<String>,
    pub record_count: i64,
    pub imported_count: i64,
    pub date_range_start: Option<String>,
    pub date_range_end: Option<String>,
    pub import_date: String,
}
