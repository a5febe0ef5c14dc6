use std::path::Path;

use rusqlite::{Connection, OptionalExtension};
use zeroize::Zeroizing;

use crate::error::{BillnoteError, Result};
use crate::importer::Ledger;
use crate::models::{Category, ImportRecord, NewTransaction, PdfPassword, Transaction};
use crate::statement::Password;

pub const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS owners (
    id INTEGER PRIMARY KEY,
    name TEXT NOT NULL UNIQUE,
    created_at TEXT DEFAULT (datetime('now'))
);

CREATE TABLE IF NOT EXISTS categories (
    id INTEGER PRIMARY KEY,
    owner_id INTEGER NOT NULL,
    name TEXT NOT NULL,
    category_type TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    UNIQUE (owner_id, name),
    FOREIGN KEY (owner_id) REFERENCES owners(id)
);

CREATE TABLE IF NOT EXISTS transactions (
    id INTEGER PRIMARY KEY,
    owner_id INTEGER NOT NULL,
    category_id INTEGER,
    amount REAL NOT NULL,
    txn_type TEXT NOT NULL,
    description TEXT NOT NULL,
    transaction_date TEXT NOT NULL,
    source TEXT NOT NULL DEFAULT 'manual',
    created_at TEXT DEFAULT (datetime('now')),
    FOREIGN KEY (owner_id) REFERENCES owners(id),
    FOREIGN KEY (category_id) REFERENCES categories(id)
);

CREATE INDEX IF NOT EXISTS idx_transactions_match
    ON transactions (owner_id, transaction_date, amount, description);

CREATE TABLE IF NOT EXISTS pdf_passwords (
    id INTEGER PRIMARY KEY,
    owner_id INTEGER NOT NULL,
    priority INTEGER NOT NULL CHECK (priority BETWEEN 1 AND 4),
    label TEXT,
    password TEXT NOT NULL,
    created_at TEXT DEFAULT (datetime('now')),
    updated_at TEXT DEFAULT (datetime('now')),
    UNIQUE (owner_id, priority),
    FOREIGN KEY (owner_id) REFERENCES owners(id)
);

CREATE TABLE IF NOT EXISTS imports (
    id INTEGER PRIMARY KEY,
    owner_id INTEGER NOT NULL,
    filename TEXT NOT NULL,
    bank TEXT,
    import_date TEXT DEFAULT (datetime('now')),
    record_count INTEGER,
    imported_count INTEGER,
    date_range_start TEXT,
    date_range_end TEXT,
    checksum TEXT,
    FOREIGN KEY (owner_id) REFERENCES owners(id)
);
";

// (name, category_type)
const DEFAULT_CATEGORIES: &[(&str, &str)] = &[
    ("餐飲", "expense"),
    ("交通", "expense"),
    ("購物", "expense"),
    ("娛樂", "expense"),
    ("生活", "expense"),
    ("醫療", "expense"),
    ("其他", "expense"),
    ("薪資", "income"),
];

pub fn get_connection(db_path: &Path) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

/// Open a SQLCipher database. The key must be set before any other statement.
pub fn get_keyed_connection(db_path: &Path, key: &str) -> Result<Connection> {
    let conn = Connection::open(db_path)?;
    conn.pragma_update(None, "key", key)?;
    // Fails with "file is not a database" on a wrong key.
    conn.query_row("SELECT count(*) FROM sqlite_master", [], |r| r.get::<_, i64>(0))?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_db(conn: &Connection) -> Result<()> {
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Look up an owner, creating it with the default categories on first use.
pub fn ensure_owner(conn: &Connection, name: &str) -> Result<i64> {
    if let Some(id) = find_owner(conn, name)? {
        return Ok(id);
    }
    conn.execute("INSERT INTO owners (name) VALUES (?1)", [name])?;
    let id = conn.last_insert_rowid();
    for (cat, cat_type) in DEFAULT_CATEGORIES {
        conn.execute(
            "INSERT INTO categories (owner_id, name, category_type) VALUES (?1, ?2, ?3)",
            rusqlite::params![id, cat, cat_type],
        )?;
    }
    log::info!("created owner {name}");
    Ok(id)
}

pub fn owner_id(conn: &Connection, name: &str) -> Result<i64> {
    find_owner(conn, name)?.ok_or_else(|| BillnoteError::UnknownOwner(name.to_string()))
}

fn find_owner(conn: &Connection, name: &str) -> Result<Option<i64>> {
    Ok(conn
        .query_row("SELECT id FROM owners WHERE name = ?1", [name], |r| r.get(0))
        .optional()?)
}

// ---------------------------------------------------------------------------
// Categories
// ---------------------------------------------------------------------------

pub fn add_category(conn: &Connection, owner_id: i64, name: &str, category_type: &str) -> Result<i64> {
    if category_type != "income" && category_type != "expense" {
        return Err(BillnoteError::Other(format!(
            "Category type must be income or expense, got {category_type}"
        )));
    }
    conn.execute(
        "INSERT INTO categories (owner_id, name, category_type) VALUES (?1, ?2, ?3)",
        rusqlite::params![owner_id, name, category_type],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_categories(conn: &Connection, owner_id: i64) -> Result<Vec<Category>> {
    let mut stmt = conn.prepare(
        "SELECT id, name, category_type FROM categories WHERE owner_id = ?1 ORDER BY category_type, id",
    )?;
    let rows = stmt
        .query_map([owner_id], |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
                category_type: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Statement passwords
// ---------------------------------------------------------------------------

pub fn set_pdf_password(
    conn: &Connection,
    owner_id: i64,
    priority: i64,
    label: Option<&str>,
    password: &str,
) -> Result<()> {
    if !(1..=4).contains(&priority) {
        return Err(BillnoteError::Other(format!(
            "Priority must be between 1 and 4, got {priority}"
        )));
    }
    conn.execute(
        "INSERT INTO pdf_passwords (owner_id, priority, label, password) VALUES (?1, ?2, ?3, ?4) \
         ON CONFLICT (owner_id, priority) DO UPDATE SET \
         label = excluded.label, password = excluded.password, updated_at = datetime('now')",
        rusqlite::params![owner_id, priority, label, password],
    )?;
    Ok(())
}

pub fn list_pdf_passwords(conn: &Connection, owner_id: i64) -> Result<Vec<PdfPassword>> {
    let mut stmt = conn.prepare(
        "SELECT priority, label, password <> '' FROM pdf_passwords WHERE owner_id = ?1 ORDER BY priority",
    )?;
    let rows = stmt
        .query_map([owner_id], |row| {
            Ok(PdfPassword {
                priority: row.get(0)?,
                label: row.get(1)?,
                has_value: row.get(2)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn remove_pdf_password(conn: &Connection, owner_id: i64, priority: i64) -> Result<()> {
    let removed = conn.execute(
        "DELETE FROM pdf_passwords WHERE owner_id = ?1 AND priority = ?2",
        rusqlite::params![owner_id, priority],
    )?;
    if removed == 0 {
        return Err(BillnoteError::Other(format!("No password with priority {priority}")));
    }
    Ok(())
}

/// Stored password values by ascending priority, empty ones skipped.
pub fn stored_passwords(conn: &Connection, owner_id: i64) -> Result<Vec<Password>> {
    let mut stmt = conn.prepare(
        "SELECT password FROM pdf_passwords WHERE owner_id = ?1 AND password <> '' ORDER BY priority",
    )?;
    let rows = stmt
        .query_map([owner_id], |row| row.get::<_, String>(0).map(Zeroizing::new))?
        .collect::<std::result::Result<Vec<Password>, _>>()?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Import history
// ---------------------------------------------------------------------------

pub struct NewImport<'a> {
    pub filename: &'a str,
    pub bank: Option<&'a str>,
    pub record_count: usize,
    pub imported_count: usize,
    pub date_range: Option<(String, String)>,
    pub checksum: Option<String>,
}

pub fn record_import(conn: &Connection, owner_id: i64, import: &NewImport) -> Result<i64> {
    let (start, end) = match &import.date_range {
        Some((s, e)) => (Some(s.as_str()), Some(e.as_str())),
        None => (None, None),
    };
    conn.execute(
        "INSERT INTO imports (owner_id, filename, bank, record_count, imported_count, \
         date_range_start, date_range_end, checksum) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        rusqlite::params![
            owner_id,
            import.filename,
            import.bank,
            import.record_count as i64,
            import.imported_count as i64,
            start,
            end,
            import.checksum,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_imports(conn: &Connection, owner_id: i64) -> Result<Vec<ImportRecord>> {
    let mut stmt = conn.prepare(
        "SELECT filename, bank, record_count, imported_count, date_range_start, date_range_end, import_date \
         FROM imports WHERE owner_id = ?1 ORDER BY id DESC",
    )?;
    let rows = stmt
        .query_map([owner_id], |row| {
            Ok(ImportRecord {
                filename: row.get(0)?,
                bank: row.get(1)?,
                record_count: row.get::<_, Option<i64>>(2)?.unwrap_or(0),
                imported_count: row.get::<_, Option<i64>>(3)?.unwrap_or(0),
                date_range_start: row.get(4)?,
                date_range_end: row.get(5)?,
                import_date: row.get(6)?,
            })
        })?
        .collect::<std::result::Result<Vec<_>, _>>()?;
    Ok(rows)
}

// ---------------------------------------------------------------------------
// Ledger backed by the transactions table
// ---------------------------------------------------------------------------

/// One owner's view of the transactions table.
pub struct SqliteLedger<'a> {
    conn: &'a Connection,
    owner_id: i64,
}

impl<'a> SqliteLedger<'a> {
    pub fn new(conn: &'a Connection, owner_id: i64) -> Self {
        Self { conn, owner_id }
    }
}

impl Ledger for SqliteLedger<'_> {
    fn exists(&self, txn: &Transaction) -> Result<bool> {
        let mut stmt = self.conn.prepare_cached(
            "SELECT 1 FROM transactions WHERE owner_id = ?1 AND transaction_date = ?2 \
             AND amount = ?3 AND description = ?4",
        )?;
        Ok(stmt.exists(rusqlite::params![
            self.owner_id,
            txn.date.format("%Y-%m-%d").to_string(),
            txn.amount,
            txn.description,
        ])?)
    }

    fn category_id(&self, label: &str) -> Result<Option<i64>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id FROM categories WHERE owner_id = ?1 AND name = ?2",
                rusqlite::params![self.owner_id, label],
                |r| r.get(0),
            )
            .optional()?)
    }

    fn insert(&self, txn: &NewTransaction) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO transactions (owner_id, category_id, amount, txn_type, description, \
             transaction_date, source) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            rusqlite::params![
                self.owner_id,
                txn.category_id,
                txn.amount,
                txn.txn_type,
                txn.description,
                txn.date.format("%Y-%m-%d").to_string(),
                txn.source,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }
}
