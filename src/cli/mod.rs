pub mod categories;
pub mod history;
pub mod import;
pub mod init;
pub mod parse;
pub mod passwords;
pub mod rules;
pub mod status;

use clap::{Parser, Subcommand};
use rusqlite::Connection;
use zeroize::Zeroizing;

use crate::db::{ensure_owner, get_connection, get_keyed_connection, init_db};
use crate::error::{BillnoteError, Result};
use crate::settings::Settings;
use crate::statement::ParserRegistry;

pub(crate) const DB_KEY_ENV: &str = "BILLNOTE_DB_KEY";
pub(crate) const PDF_PASSWORD_ENV: &str = "BILLNOTE_PDF_PASSWORD";

/// Read a secret from `env_var` when set, else prompt without echo.
pub(crate) fn read_secret(prompt: &str, env_var: &str) -> Result<Zeroizing<String>> {
    if let Ok(value) = std::env::var(env_var) {
        return Ok(Zeroizing::new(value));
    }
    Ok(Zeroizing::new(rpassword::prompt_password(prompt)?))
}

/// Open (and migrate) the configured database.
pub(crate) fn open_db(settings: &Settings) -> Result<Connection> {
    let db_path = settings.db_path();
    if !db_path.exists() {
        return Err(BillnoteError::Other(format!(
            "Database not found at {}. Run `billnote init` first.",
            db_path.display()
        )));
    }
    let conn = if settings.encrypt_db {
        let key = read_secret("Database key: ", DB_KEY_ENV)?;
        get_keyed_connection(&db_path, &key)?
    } else {
        get_connection(&db_path)?
    };
    init_db(&conn)?;
    Ok(conn)
}

pub(crate) fn open_owner(settings: &Settings) -> Result<(Connection, i64)> {
    let conn = open_db(settings)?;
    let owner_id = ensure_owner(&conn, &settings.owner)?;
    Ok((conn, owner_id))
}

/// Built-in parsers plus the configured filename rules.
pub(crate) fn load_registry(settings: &Settings) -> Result<ParserRegistry> {
    let mut registry = ParserRegistry::with_builtin_parsers();
    if let Some(path) = settings.rules_path() {
        registry.load_rules(&path)?;
    }
    Ok(registry)
}

#[derive(Parser)]
#[command(name = "billnote", about = "Import Taiwanese credit-card PDF statements into a local ledger.")]
pub struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Set up billnote: choose a data directory and initialize the database.
    Init {
        /// Path for billnote data (default: ~/Documents/billnote)
        #[arg(long = "data-dir")]
        data_dir: Option<String>,
        /// Owner whose ledger commands act on
        #[arg(long)]
        owner: Option<String>,
        /// Encrypt the database with SQLCipher
        #[arg(long)]
        encrypt: bool,
    },
    /// Parse statements and show their transactions without importing.
    Parse {
        /// PDF statements to parse
        #[arg(required = true)]
        files: Vec<String>,
        /// Also write the results as JSON for a later `import --from`
        #[arg(long)]
        json: Option<String>,
    },
    /// Parse statements and import every non-duplicate transaction.
    Import {
        /// PDF statements to import
        #[arg(required_unless_present = "from", conflicts_with = "from")]
        files: Vec<String>,
        /// Import a reviewed JSON file written by `parse --json`
        #[arg(long)]
        from: Option<String>,
    },
    /// Manage stored statement passwords.
    Passwords {
        #[command(subcommand)]
        command: PasswordsCommands,
    },
    /// Inspect filename password rules.
    Rules {
        #[command(subcommand)]
        command: RulesCommands,
    },
    /// Manage categories.
    Categories {
        #[command(subcommand)]
        command: CategoriesCommands,
    },
    /// Show current database and summary statistics.
    Status,
    /// List previous imports.
    History,
}

#[derive(Subcommand)]
pub enum PasswordsCommands {
    /// Store a password in a priority slot (1-4), replacing any existing one.
    Set {
        #[arg(long, value_parser = clap::value_parser!(i64).range(1..=4))]
        priority: i64,
        /// Reminder of what the password is, e.g. 'ID number'
        #[arg(long)]
        label: Option<String>,
    },
    /// List stored passwords (values are never shown).
    List,
    /// Remove the password in a priority slot.
    Remove {
        #[arg(long)]
        priority: i64,
    },
}

#[derive(Subcommand)]
pub enum RulesCommands {
    /// List filename password rules.
    List,
    /// Show which rules match a filename.
    Test {
        /// Statement filename, e.g. TSB_Creditcard_Estatement_202512.pdf
        filename: String,
    },
}

#[derive(Subcommand)]
pub enum CategoriesCommands {
    /// Add a category.
    Add {
        name: String,
        /// Category type: income or expense
        #[arg(long = "type", default_value = "expense")]
        category_type: String,
    },
    /// List categories.
    List,
}
