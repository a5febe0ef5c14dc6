use comfy_table::{Cell, Table};

use crate::cli::open_owner;
use crate::db::{add_category, list_categories};
use crate::error::Result;
use crate::settings::load_settings;

pub fn add(name: &str, category_type: &str) -> Result<()> {
    let settings = load_settings();
    let (conn, owner_id) = open_owner(&settings)?;
    add_category(&conn, owner_id, name, category_type)?;
    println!("Added category: {name}");
    Ok(())
}

pub fn list() -> Result<()> {
    let settings = load_settings();
    let (conn, owner_id) = open_owner(&settings)?;
    let categories = list_categories(&conn, owner_id)?;

    let mut table = Table::new();
    table.set_header(vec!["ID", "Name", "Type"]);
    for cat in categories {
        table.add_row(vec![
            Cell::new(cat.id),
            Cell::new(cat.name),
            Cell::new(cat.category_type),
        ]);
    }
    println!("Categories ({})\n{table}", settings.owner);
    Ok(())
}
