use crate::cli::open_owner;
use crate::error::Result;
use crate::fmt::{format_bytes, twd};
use crate::settings::load_settings;
use crate::statement::ParserRegistry;

pub fn run() -> Result<()> {
    let settings = load_settings();
    let db_path = settings.db_path();

    println!("Owner:      {}", settings.owner);
    println!("Data dir:   {}", settings.data_dir);
    println!("Database:   {}", db_path.display());
    println!("Encrypted:  {}", if settings.encrypt_db { "yes" } else { "no" });
    println!("Banks:      {}", ParserRegistry::with_builtin_parsers().bank_names().join(", "));
    match settings.rules_path() {
        Some(path) => println!("Rules file: {}", path.display()),
        None => println!("Rules file: (none)"),
    }

    if !db_path.exists() {
        println!();
        println!("Database not found. Run `billnote init` to set up.");
        return Ok(());
    }

    let size = std::fs::metadata(&db_path)?.len();
    println!("DB size:    {}", format_bytes(size));

    let (conn, owner_id) = open_owner(&settings)?;
    let (transactions, total): (i64, f64) = conn.query_row(
        "SELECT count(*), COALESCE(SUM(amount), 0) FROM transactions WHERE owner_id = ?1",
        [owner_id],
        |r| Ok((r.get(0)?, r.get(1)?)),
    )?;
    let imported: i64 = conn.query_row(
        "SELECT count(*) FROM transactions WHERE owner_id = ?1 AND source = 'pdf_import'",
        [owner_id],
        |r| r.get(0),
    )?;
    let uncategorized: i64 = conn.query_row(
        "SELECT count(*) FROM transactions WHERE owner_id = ?1 AND category_id IS NULL",
        [owner_id],
        |r| r.get(0),
    )?;
    let passwords: i64 = conn.query_row(
        "SELECT count(*) FROM pdf_passwords WHERE owner_id = ?1",
        [owner_id],
        |r| r.get(0),
    )?;
    let imports: i64 = conn.query_row(
        "SELECT count(*) FROM imports WHERE owner_id = ?1",
        [owner_id],
        |r| r.get(0),
    )?;

    println!();
    println!("Transactions:   {transactions} ({})", twd(total));
    println!("From PDFs:      {imported}");
    println!("Uncategorized:  {uncategorized}");
    println!("Passwords:      {passwords}");
    println!("Imports:        {imports}");
    Ok(())
}
