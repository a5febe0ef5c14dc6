use std::path::Path;

use chrono::NaiveDate;
use serde::Serialize;

use super::extract::{PdfTextExtractor, TextExtractor};
use super::passwords::{self, FilenameRule, Password};
use super::{builtin_parsers, BankParser};
use crate::error::{BillnoteError, Result};
use crate::models::Transaction;

#[derive(Debug, Clone, Serialize)]
pub struct ParseOutcome {
    pub bank: String,
    pub transactions: Vec<Transaction>,
}

/// Bank parsers in match-priority order plus the filename password rules.
/// Read-only once built, so one registry serves every worker thread.
pub struct ParserRegistry {
    parsers: Vec<Box<dyn BankParser>>,
    rules: Vec<FilenameRule>,
    extractor: Box<dyn TextExtractor>,
}

impl Default for ParserRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ParserRegistry {
    /// An empty registry backed by the PDF extractor.
    pub fn new() -> Self {
        Self {
            parsers: Vec::new(),
            rules: Vec::new(),
            extractor: Box::new(PdfTextExtractor),
        }
    }

    pub fn with_builtin_parsers() -> Self {
        let mut registry = Self::new();
        for parser in builtin_parsers() {
            registry.register(parser);
        }
        registry
    }

    pub fn with_extractor(mut self, extractor: Box<dyn TextExtractor>) -> Self {
        self.extractor = extractor;
        self
    }

    /// Later registrations only win when no earlier parser recognises the text.
    pub fn register(&mut self, parser: Box<dyn BankParser>) {
        self.parsers.push(parser);
    }

    pub fn set_rules(&mut self, rules: Vec<FilenameRule>) {
        self.rules = rules;
    }

    pub fn load_rules(&mut self, path: &Path) -> Result<()> {
        self.set_rules(passwords::load_rules(path)?);
        log::debug!("loaded {} filename rules from {}", self.rules.len(), path.display());
        Ok(())
    }

    pub fn rules(&self) -> &[FilenameRule] {
        &self.rules
    }

    pub fn bank_names(&self) -> Vec<&'static str> {
        self.parsers.iter().map(|p| p.bank_name()).collect()
    }

    pub fn passwords_for_file(&self, filename: &str) -> Vec<Password> {
        passwords::rule_passwords(filename, &self.rules)
    }

    /// Try no password, then each candidate in order, stopping at the first
    /// that opens the document. A corrupt document fails immediately.
    pub fn extract_text(&self, pdf: &[u8], passwords: &[Password]) -> Result<String> {
        let attempts = std::iter::once("").chain(passwords.iter().map(|p| p.as_str()));
        let mut tried = 0usize;
        for password in attempts {
            tried += 1;
            match self.extractor.extract(pdf, password) {
                Ok(text) => {
                    if tried > 1 {
                        log::info!("PDF decrypted with password #{}", tried - 1);
                    }
                    return Ok(text);
                }
                Err(BillnoteError::DecryptionFailed) => {
                    log::debug!("password attempt {tried} did not open the document");
                }
                Err(e) => return Err(e),
            }
        }
        Err(BillnoteError::AllPasswordsExhausted { attempts: tried })
    }

    /// First parser whose detector accepts the text.
    pub fn detect(&self, content: &str) -> Option<&dyn BankParser> {
        self.parsers
            .iter()
            .find(|p| p.can_parse(content))
            .map(|p| p.as_ref())
    }

    pub fn parse_content_as_of(&self, content: &str, today: NaiveDate) -> Result<ParseOutcome> {
        let parser = self.detect(content).ok_or(BillnoteError::NoMatchingParser)?;
        Ok(outcome(parser, parser.parse_as_of(content, today)))
    }

    pub fn parse_content(&self, content: &str) -> Result<ParseOutcome> {
        let parser = self.detect(content).ok_or(BillnoteError::NoMatchingParser)?;
        Ok(outcome(parser, parser.parse(content)))
    }

    pub fn parse_bytes(&self, pdf: &[u8], passwords: &[Password]) -> Result<ParseOutcome> {
        let content = self.extract_text(pdf, passwords)?;
        self.parse_content(&content)
    }

    pub fn parse(&self, pdf_path: &Path, passwords: &[Password]) -> Result<ParseOutcome> {
        let pdf = std::fs::read(pdf_path)?;
        self.parse_bytes(&pdf, passwords)
    }

    /// Candidates come from the filename rules alone.
    pub fn parse_with_auto_password(&self, pdf_path: &Path) -> Result<ParseOutcome> {
        let passwords = self.passwords_for_file(&file_name(pdf_path));
        self.parse(pdf_path, &passwords)
    }

    /// Owner's stored passwords first, then the filename rules.
    pub fn parse_with_stored_passwords(
        &self,
        pdf_path: &Path,
        stored: &[Password],
    ) -> Result<ParseOutcome> {
        let passwords = passwords::passwords_for(&file_name(pdf_path), &self.rules, stored);
        self.parse(pdf_path, &passwords)
    }
}

fn outcome(parser: &dyn BankParser, transactions: Vec<Transaction>) -> ParseOutcome {
    log::info!(
        "{} statement: {} transactions",
        parser.bank_name(),
        transactions.len()
    );
    ParseOutcome {
        bank: parser.bank_name().to_string(),
        transactions,
    }
}

pub fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default()
}
