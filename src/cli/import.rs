use std::path::PathBuf;

use colored::Colorize;
use rusqlite::Connection;

use crate::cli::parse::{check_failures, print_report};
use crate::cli::{load_registry, open_owner};
use crate::db::{record_import, stored_passwords, NewImport, SqliteLedger};
use crate::error::{BillnoteError, Result};
use crate::importer::{compute_checksum, date_range, import_report, process_files, ImportSummary};
use crate::models::FileReport;
use crate::settings::load_settings;

pub fn run(files: &[String], from: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let (conn, owner_id) = open_owner(&settings)?;
    let ledger = SqliteLedger::new(&conn, owner_id);

    let (mut reports, paths) = match from {
        Some(json) => {
            let data = std::fs::read_to_string(json)?;
            let reports: Vec<FileReport> = serde_json::from_str(&data)?;
            (reports, Vec::new())
        }
        None => {
            let registry = load_registry(&settings)?;
            let stored = stored_passwords(&conn, owner_id)?;
            let paths: Vec<PathBuf> = files.iter().map(PathBuf::from).collect();
            let reports =
                process_files(&registry, &paths, &stored, settings.worker_count(), &ledger);
            (reports, paths)
        }
    };

    let mut total = ImportSummary::default();
    for (i, report) in reports.iter_mut().enumerate() {
        if report.error.is_some() {
            print_report(report);
            continue;
        }

        let (summary, failure) = match import_report(report, &ledger) {
            Ok(summary) => (summary, None),
            Err(BillnoteError::Persistence { imported, source }) => (
                ImportSummary {
                    imported,
                    skipped: report.duplicate_count(),
                },
                Some(source.to_string()),
            ),
            Err(e) => {
                log::warn!("{}: {e}", report.filename);
                report.error = Some(e.to_string());
                print_report(report);
                continue;
            }
        };

        let checksum = match paths.get(i) {
            Some(path) => Some(compute_checksum(path)?),
            None => None,
        };
        log_import(&conn, owner_id, report, &summary, checksum)?;

        let bank = report.bank.as_deref().unwrap_or("?");
        println!(
            "{} [{bank}]: {} imported, {} skipped (duplicates)",
            report.filename.bold(),
            summary.imported,
            summary.skipped
        );
        if let Some(err) = failure {
            println!("  {}", format!("stopped early: {err}").red());
            report.error = Some(err);
        }
        total.imported += summary.imported;
        total.skipped += summary.skipped;
    }

    if reports.len() > 1 {
        println!("Total: {} imported, {} skipped", total.imported, total.skipped);
    }
    check_failures(&reports)
}

fn log_import(
    conn: &Connection,
    owner_id: i64,
    report: &FileReport,
    summary: &ImportSummary,
    checksum: Option<String>,
) -> Result<()> {
    record_import(
        conn,
        owner_id,
        &NewImport {
            filename: &report.filename,
            bank: report.bank.as_deref(),
            record_count: report.transactions.len(),
            imported_count: summary.imported,
            date_range: date_range(&report.transactions),
            checksum,
        },
    )?;
    Ok(())
}
