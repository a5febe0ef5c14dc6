use comfy_table::{Cell, Table};

use crate::cli::load_registry;
use crate::error::Result;
use crate::settings::load_settings;
use crate::statement::passwords::glob_matches;

pub fn list() -> Result<()> {
    let settings = load_settings();
    let registry = load_registry(&settings)?;
    if registry.rules().is_empty() {
        match settings.rules_path() {
            Some(path) => println!("No rules in {}", path.display()),
            None => println!("No filename rules configured."),
        }
        return Ok(());
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "Pattern", "Bank", "Password"]);
    for (i, rule) in registry.rules().iter().enumerate() {
        table.add_row(vec![
            Cell::new(i + 1),
            Cell::new(&rule.pattern),
            Cell::new(&rule.bank),
            Cell::new(if rule.password.is_empty() { "no" } else { "yes" }),
        ]);
    }
    println!("Filename rules\n{table}");
    Ok(())
}

pub fn test(filename: &str) -> Result<()> {
    let settings = load_settings();
    let registry = load_registry(&settings)?;
    let matched: Vec<_> = registry
        .rules()
        .iter()
        .enumerate()
        .filter(|(_, rule)| glob_matches(&rule.pattern, filename))
        .collect();

    if matched.is_empty() {
        println!("No rule matches {filename}");
        return Ok(());
    }
    for (i, rule) in matched {
        let bank = if rule.bank.is_empty() { "-" } else { rule.bank.as_str() };
        println!("#{} {} ({bank})", i + 1, rule.pattern);
    }
    let candidates = registry.passwords_for_file(filename).len();
    println!("{candidates} distinct password candidates from rules");
    Ok(())
}
