mod cli;
mod db;
mod error;
mod fmt;
mod importer;
mod models;
mod settings;
mod statement;

use clap::Parser;

use cli::{CategoriesCommands, Cli, Commands, PasswordsCommands, RulesCommands};

fn init_logging(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default))
        .format_timestamp(None)
        .init();
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Init {
            data_dir,
            owner,
            encrypt,
        } => cli::init::run(data_dir, owner, encrypt),
        Commands::Parse { files, json } => cli::parse::run(&files, json.as_deref()),
        Commands::Import { files, from } => cli::import::run(&files, from.as_deref()),
        Commands::Passwords { command } => match command {
            PasswordsCommands::Set { priority, label } => cli::passwords::set(priority, label.as_deref()),
            PasswordsCommands::List => cli::passwords::list(),
            PasswordsCommands::Remove { priority } => cli::passwords::remove(priority),
        },
        Commands::Rules { command } => match command {
            RulesCommands::List => cli::rules::list(),
            RulesCommands::Test { filename } => cli::rules::test(&filename),
        },
        Commands::Categories { command } => match command {
            CategoriesCommands::Add { name, category_type } => cli::categories::add(&name, &category_type),
            CategoriesCommands::List => cli::categories::list(),
        },
        Commands::Status => cli::status::run(),
        Commands::History => cli::history::run(),
    };

    if let Err(e) = result {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
