use comfy_table::{Cell, Table};

use crate::cli::{open_owner, read_secret, PDF_PASSWORD_ENV};
use crate::db::{list_pdf_passwords, remove_pdf_password, set_pdf_password};
use crate::error::{BillnoteError, Result};
use crate::settings::load_settings;

pub fn set(priority: i64, label: Option<&str>) -> Result<()> {
    let settings = load_settings();
    let (conn, owner_id) = open_owner(&settings)?;

    let password = read_secret(&format!("Statement password #{priority}: "), PDF_PASSWORD_ENV)?;
    if password.is_empty() {
        return Err(BillnoteError::Other("Password cannot be empty".to_string()));
    }
    set_pdf_password(&conn, owner_id, priority, label, &password)?;
    println!("Stored password #{priority}");
    Ok(())
}

pub fn list() -> Result<()> {
    let settings = load_settings();
    let (conn, owner_id) = open_owner(&settings)?;
    let passwords = list_pdf_passwords(&conn, owner_id)?;
    if passwords.is_empty() {
        println!("No stored passwords. Add one with `billnote passwords set --priority 1`.");
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["Priority", "Label", "Set"]);
    for pw in passwords {
        table.add_row(vec![
            Cell::new(pw.priority),
            Cell::new(pw.label.unwrap_or_default()),
            Cell::new(if pw.has_value { "yes" } else { "no" }),
        ]);
    }
    println!("Statement passwords\n{table}");
    Ok(())
}

pub fn remove(priority: i64) -> Result<()> {
    let settings = load_settings();
    let (conn, owner_id) = open_owner(&settings)?;
    remove_pdf_password(&conn, owner_id, priority)?;
    println!("Removed password #{priority}");
    Ok(())
}
