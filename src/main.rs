mod db;
mod errors;
mod import;
mod ledger;
mod models;
mod money;
mod run;

use anyhow::{Context, Result};
use std::path::PathBuf;

use crate::errors::LedgerError;

const DB_ENV_VAR: &str = "LEDGERBOOK_DB";

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let args: Vec<String> = std::env::args().collect();
    let db_path = get_db_path()?;
    log::debug!("Using database {}", db_path.display());
    let mut db = db::Database::open(&db_path)?;

    match run::as_cli(&args, &mut db) {
        Ok(()) => Ok(()),
        Err(err) => match err.downcast_ref::<LedgerError>() {
            Some(e) if e.is_not_found() => {
                eprintln!("{e}");
                std::process::exit(2);
            }
            Some(e) if e.is_validation() => {
                eprintln!("{e}");
                std::process::exit(1);
            }
            _ => Err(err),
        },
    }
}

fn get_db_path() -> Result<PathBuf> {
    if let Some(path) = std::env::var_os(DB_ENV_VAR).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(path));
    }
    let proj_dirs = directories::ProjectDirs::from("com", "ledgerbook", "Ledgerbook")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    let data_dir = proj_dirs.data_dir();
    std::fs::create_dir_all(data_dir)
        .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;
    Ok(data_dir.join("ledgerbook.db"))
}
