use std::path::PathBuf;

use crate::cli::{read_secret, DB_KEY_ENV};
use crate::db::{ensure_owner, get_connection, get_keyed_connection, init_db};
use crate::error::Result;
use crate::settings::{load_settings, save_settings, shellexpand_path};

pub fn run(data_dir: Option<String>, owner: Option<String>, encrypt: bool) -> Result<()> {
    let mut settings = load_settings();

    if let Some(dir) = data_dir {
        settings.data_dir = shellexpand_path(&dir);
    }
    if let Some(owner) = owner {
        settings.owner = owner;
    }
    settings.encrypt_db = settings.encrypt_db || encrypt;

    let resolved = PathBuf::from(&settings.data_dir);
    std::fs::create_dir_all(&resolved)?;

    let conn = if settings.encrypt_db {
        let key = read_secret("Database key: ", DB_KEY_ENV)?;
        get_keyed_connection(&settings.db_path(), &key)?
    } else {
        get_connection(&settings.db_path())?
    };
    init_db(&conn)?;
    ensure_owner(&conn, &settings.owner)?;

    save_settings(&settings)?;

    println!("Initialized billnote at {}", resolved.display());
    println!("Owner: {}", settings.owner);
    if settings.rules_path().is_none() {
        println!(
            "Add filename password rules at {} to unlock statements automatically.",
            resolved.join("filename_rules.json").display()
        );
    }
    Ok(())
}
