use std::path::PathBuf;

use colored::Colorize;
use comfy_table::{Cell, Table};

use crate::cli::{load_registry, open_owner};
use crate::db::{stored_passwords, SqliteLedger};
use crate::error::{BillnoteError, Result};
use crate::fmt::twd;
use crate::importer::process_files;
use crate::models::FileReport;
use crate::settings::load_settings;

pub fn run(files: &[String], json: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let registry = load_registry(&settings)?;
    let (conn, owner_id) = open_owner(&settings)?;
    let stored = stored_passwords(&conn, owner_id)?;
    let ledger = SqliteLedger::new(&conn, owner_id);

    let paths: Vec<PathBuf> = files.iter().map(PathBuf::from).collect();
    let reports = process_files(&registry, &paths, &stored, settings.worker_count(), &ledger);

    for report in &reports {
        print_report(report);
    }

    if let Some(out) = json {
        let data = serde_json::to_string_pretty(&reports)?;
        std::fs::write(out, format!("{data}\n"))?;
        println!("Wrote {out}");
    }

    check_failures(&reports)
}

pub(crate) fn print_report(report: &FileReport) {
    if let Some(err) = &report.error {
        println!("{} {}", report.filename.bold(), err.red());
        return;
    }

    let bank = report.bank.as_deref().unwrap_or("?");
    println!("{} [{bank}]", report.filename.bold());
    if report.transactions.is_empty() {
        println!("  {}", "No transactions found".yellow());
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Date", "Description", "Amount", "Card", ""]);
    for parsed in &report.transactions {
        let txn = &parsed.transaction;
        table.add_row(vec![
            Cell::new(txn.date.format("%Y-%m-%d")),
            Cell::new(&txn.description),
            Cell::new(twd(txn.amount)),
            Cell::new(txn.card_last4.as_deref().unwrap_or_default()),
            Cell::new(if parsed.is_duplicate { "duplicate" } else { "" }),
        ]);
    }
    println!("{table}");
    println!(
        "{} transactions, {} duplicates, total {}",
        report.transactions.len(),
        report.duplicate_count(),
        twd(report.total_amount)
    );
}

pub(crate) fn check_failures(reports: &[FileReport]) -> Result<()> {
    let failed = reports.iter().filter(|r| r.error.is_some()).count();
    if failed > 0 {
        return Err(BillnoteError::Other(format!(
            "{failed} of {} files could not be processed",
            reports.len()
        )));
    }
    Ok(())
}
