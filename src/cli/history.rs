use comfy_table::{Cell, Table};

use crate::cli::open_owner;
use crate::db::list_imports;
use crate::error::Result;
use crate::settings::load_settings;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let (conn, owner_id) = open_owner(&settings)?;
    let imports = list_imports(&conn, owner_id)?;
    if imports.is_empty() {
        println!("No imports yet.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Date", "File", "Bank", "Parsed", "Imported", "Range"]);
    for imp in imports {
        let range = match (imp.date_range_start, imp.date_range_end) {
            (Some(start), Some(end)) => format!("{start} ~ {end}"),
            _ => String::new(),
        };
        table.add_row(vec![
            Cell::new(imp.import_date),
            Cell::new(imp.filename),
            Cell::new(imp.bank.unwrap_or_default()),
            Cell::new(imp.record_count),
            Cell::new(imp.imported_count),
            Cell::new(range),
        ]);
    }
    println!("Imports\n{table}");
    Ok(())
}
