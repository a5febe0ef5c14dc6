use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

use sha2::{Digest, Sha256};

use crate::error::{BillnoteError, Result};
use crate::models::{
    FileReport, NewTransaction, ParsedTransaction, Transaction, SOURCE_PDF_IMPORT, TYPE_EXPENSE,
};
use crate::statement::registry::file_name;
use crate::statement::{ParseOutcome, ParserRegistry, Password};

/// The transaction store as seen by one owner.
pub trait Ledger {
    /// True when a row with the same date, amount and description exists.
    fn exists(&self, txn: &Transaction) -> Result<bool>;

    /// Category id for an exact name match.
    fn category_id(&self, label: &str) -> Result<Option<i64>>;

    fn insert(&self, txn: &NewTransaction) -> Result<i64>;
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub fn compute_checksum(file_path: &Path) -> Result<String> {
    let data = std::fs::read(file_path)?;
    let mut hasher = Sha256::new();
    hasher.update(&data);
    Ok(hex::encode(hasher.finalize()))
}

/// Earliest and latest transaction dates as `YYYY-MM-DD`.
pub fn date_range(transactions: &[ParsedTransaction]) -> Option<(String, String)> {
    let min = transactions.iter().map(|t| t.transaction.date).min()?;
    let max = transactions.iter().map(|t| t.transaction.date).max()?;
    Some((
        min.format("%Y-%m-%d").to_string(),
        max.format("%Y-%m-%d").to_string(),
    ))
}

// ---------------------------------------------------------------------------
// Reconciliation
// ---------------------------------------------------------------------------

/// Tag each transaction with whether the ledger already holds it. Order and
/// count are preserved.
pub fn tag_duplicates(
    transactions: Vec<Transaction>,
    ledger: &dyn Ledger,
) -> Result<Vec<ParsedTransaction>> {
    transactions
        .into_iter()
        .map(|transaction| {
            let is_duplicate = ledger.exists(&transaction)?;
            Ok(ParsedTransaction {
                transaction,
                is_duplicate,
            })
        })
        .collect()
}

/// Re-check a previously reviewed batch. A flag already set stays set, so a
/// reviewer can still exclude a line by hand.
pub fn refresh_duplicates(tagged: &mut [ParsedTransaction], ledger: &dyn Ledger) -> Result<()> {
    for parsed in tagged.iter_mut().filter(|t| !t.is_duplicate) {
        parsed.is_duplicate = ledger.exists(&parsed.transaction)?;
    }
    Ok(())
}

/// Persist every non-duplicate transaction as a `pdf_import` expense.
///
/// Stops at the first rejected write; rows written before it stay and the
/// error carries their count.
pub fn import_transactions(tagged: &[ParsedTransaction], ledger: &dyn Ledger) -> Result<usize> {
    let mut imported = 0usize;
    for parsed in tagged.iter().filter(|t| !t.is_duplicate) {
        let txn = &parsed.transaction;
        let row = NewTransaction {
            date: txn.date,
            description: txn.description.clone(),
            amount: txn.amount,
            category_id: resolve_category(txn, ledger),
            txn_type: TYPE_EXPENSE,
            source: SOURCE_PDF_IMPORT,
        };
        ledger.insert(&row).map_err(|e| BillnoteError::Persistence {
            imported,
            source: Box::new(e),
        })?;
        imported += 1;
    }
    Ok(imported)
}

// Unknown labels and lookup failures both leave the row uncategorized.
fn resolve_category(txn: &Transaction, ledger: &dyn Ledger) -> Option<i64> {
    let label = txn.category.as_deref().filter(|c| !c.is_empty())?;
    match ledger.category_id(label) {
        Ok(Some(id)) => Some(id),
        Ok(None) => {
            log::debug!("no category named {label:?}, importing uncategorized");
            None
        }
        Err(e) => {
            log::warn!("category lookup for {label:?} failed: {e}");
            None
        }
    }
}

/// Import one file's report. Duplicates are re-checked first so rows written
/// by earlier files of the same batch count as stored.
pub fn import_report(report: &mut FileReport, ledger: &dyn Ledger) -> Result<ImportSummary> {
    refresh_duplicates(&mut report.transactions, ledger)?;
    let skipped = report.duplicate_count();
    let imported = import_transactions(&report.transactions, ledger)?;
    log::info!(
        "{}: {imported} imported, {skipped} duplicates skipped",
        report.filename
    );
    Ok(ImportSummary { imported, skipped })
}

// ---------------------------------------------------------------------------
// Batch parsing
// ---------------------------------------------------------------------------

/// Parse every file on at most `workers` threads. Results line up with
/// `paths`; one file failing never affects another.
pub fn parse_files(
    registry: &ParserRegistry,
    paths: &[PathBuf],
    stored: &[Password],
    workers: usize,
) -> Vec<Result<ParseOutcome>> {
    let workers = workers.clamp(1, paths.len().max(1));
    let next = AtomicUsize::new(0);
    let mut slots: Vec<Option<Result<ParseOutcome>>> = paths.iter().map(|_| None).collect();

    std::thread::scope(|s| {
        let next = &next;
        let mut handles = Vec::with_capacity(workers);
        for _ in 0..workers {
            handles.push(s.spawn(move || {
                let mut done = Vec::new();
                loop {
                    let i = next.fetch_add(1, Ordering::Relaxed);
                    let Some(path) = paths.get(i) else { break };
                    log::debug!("parsing {}", path.display());
                    let outcome = if stored.is_empty() {
                        registry.parse_with_auto_password(path)
                    } else {
                        registry.parse_with_stored_passwords(path, stored)
                    };
                    done.push((i, outcome));
                }
                done
            }));
        }
        for handle in handles {
            match handle.join() {
                Ok(done) => {
                    for (i, result) in done {
                        slots[i] = Some(result);
                    }
                }
                Err(_) => log::error!("statement parser thread panicked"),
            }
        }
    });

    slots
        .into_iter()
        .map(|slot| {
            slot.unwrap_or_else(|| Err(BillnoteError::Other("parser thread panicked".to_string())))
        })
        .collect()
}

pub fn build_report(filename: &str, outcome: Result<ParseOutcome>, ledger: &dyn Ledger) -> FileReport {
    let outcome = match outcome {
        Ok(outcome) => outcome,
        Err(e) => {
            log::warn!("{filename}: {e}");
            return FileReport::failed(filename, e);
        }
    };

    let total_amount = outcome.transactions.iter().map(|t| t.amount).sum();
    match tag_duplicates(outcome.transactions, ledger) {
        Ok(transactions) => FileReport {
            filename: filename.to_string(),
            bank: Some(outcome.bank),
            transactions,
            total_amount,
            error: None,
        },
        Err(e) => FileReport {
            bank: Some(outcome.bank),
            ..FileReport::failed(filename, e)
        },
    }
}

/// Parse a batch in parallel, then tag duplicates against the ledger on the
/// calling thread. One report per path, in input order.
pub fn process_files(
    registry: &ParserRegistry,
    paths: &[PathBuf],
    stored: &[Password],
    workers: usize,
    ledger: &dyn Ledger,
) -> Vec<FileReport> {
    parse_files(registry, paths, stored, workers)
        .into_iter()
        .zip(paths)
        .map(|(outcome, path)| build_report(&file_name(path), outcome, ledger))
        .collect()
}
