use anyhow::{Context, Result};
use std::path::Path;

use crate::db::Database;
use crate::import::CsvImporter;
use crate::ledger;
use crate::models::{Balance, Category, TransactionType};
use crate::money::parse_value;

pub(crate) fn as_cli(args: &[String], db: &mut Database) -> Result<()> {
    let Some(command) = args.get(1) else {
        print_usage();
        return Ok(());
    };
    match command.as_str() {
        "add" => cli_add(&args[2..], db),
        "list" | "ls" => cli_list(db),
        "balance" | "b" => cli_balance(db),
        "delete" | "rm" => cli_delete(&args[2..], db),
        "import" => cli_import(&args[2..], db),
        "categories" => cli_categories(&args[2..], db),
        "add-category" => cli_add_category(&args[2..], db),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("ledgerbook {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("Ledgerbook - personal income/outcome ledger");
    println!();
    println!("Usage: ledgerbook <command>");
    println!();
    println!("Commands:");
    println!("  add <title> <income|outcome> <value> [category]");
    println!("                                Record a transaction");
    println!("  list, ls                      List transactions and the balance");
    println!("  balance, b                    Print income, outcome and total");
    println!("  delete, rm <id>               Delete a transaction");
    println!("  import <file.csv>             Import a CSV file (title,type,value,category)");
    println!("                                The file is removed afterwards");
    println!("  categories [title...]         List categories, optionally by exact title");
    println!("  add-category <title>          Create an empty category");
    println!("  --help, -h                    Show this help");
    println!("  --version, -V                 Show version");
    println!();
    println!("Environment:");
    println!("  LEDGERBOOK_DB                 Database path (default: platform data dir)");
    println!("  RUST_LOG                      Log filter, e.g. info or debug");
}

fn cli_add(args: &[String], db: &mut Database) -> Result<()> {
    let [title, kind, value, rest @ ..] = args else {
        anyhow::bail!("Usage: ledgerbook add <title> <income|outcome> <value> [category]");
    };
    let kind = TransactionType::parse(kind).ok_or_else(|| {
        let allowed: Vec<&str> = TransactionType::all().iter().map(|t| t.as_str()).collect();
        anyhow::anyhow!("Type must be one of {}, got '{kind}'", allowed.join("|"))
    })?;
    let value = parse_value(value)?;
    let category = rest.first().map(String::as_str);

    let txn = ledger::create_transaction(db, title, kind, value, category)?;
    println!(
        "Added #{} {} {} ${:.2}",
        txn.id.unwrap_or(0),
        txn.title,
        txn.kind,
        txn.value
    );
    Ok(())
}

fn cli_list(db: &mut Database) -> Result<()> {
    let txns = db.get_transactions()?;
    let categories = db.get_categories()?;

    if txns.is_empty() {
        println!("No transactions");
    } else {
        println!(
            "{:<5} {:<24} {:<8} {:>12}  Category",
            "ID", "Title", "Type", "Value"
        );
        println!("{}", "─".repeat(64));
        for txn in &txns {
            let category = txn
                .category_id
                .and_then(|id| Category::find_by_id(&categories, id))
                .map(|c| c.title.as_str())
                .unwrap_or("-");
            let sign = if txn.is_outcome() { "-" } else { "" };
            println!(
                "{:<5} {:<24} {:<8} {:>12}  {}",
                txn.id.unwrap_or(0),
                txn.title,
                txn.kind,
                format!("{sign}${:.2}", txn.value),
                category,
            );
        }
        println!();
    }

    print_balance(&Balance::from_transactions(&txns)?);
    Ok(())
}

fn cli_balance(db: &mut Database) -> Result<()> {
    print_balance(&ledger::balance(db)?);
    println!("  Transactions: {}", db.get_transaction_count()?);
    Ok(())
}

fn print_balance(balance: &Balance) {
    println!("  Income:   ${:.2}", balance.income);
    println!("  Outcome:  ${:.2}", balance.outcome);
    println!("  Total:    ${:.2}", balance.total);
}

fn cli_delete(args: &[String], db: &mut Database) -> Result<()> {
    let id: i64 = args
        .first()
        .ok_or_else(|| anyhow::anyhow!("Usage: ledgerbook delete <id>"))?
        .parse()
        .context("Transaction id must be a number")?;
    // Title is only for the message; a row that fails to load can still be deleted.
    let title = db.get_transaction_by_id(id).ok().flatten().map(|t| t.title);
    ledger::delete_transaction(db, id)?;
    println!("Deleted transaction #{id} ({})", title.unwrap_or_default());
    Ok(())
}

fn cli_import(args: &[String], db: &mut Database) -> Result<()> {
    let Some(file_path) = args.first() else {
        anyhow::bail!("Usage: ledgerbook import <file.csv>");
    };
    let path = Path::new(file_path);
    if !path.exists() {
        anyhow::bail!("File not found: {file_path}");
    }

    let txns = CsvImporter::import(db, path)?;
    let income = txns.iter().filter(|t| t.is_income()).count();
    let categorized = txns.iter().filter(|t| t.category_id.is_some()).count();
    println!(
        "Imported {} transactions ({income} income, {} outcome, {categorized} with a category)",
        txns.len(),
        txns.len() - income
    );
    Ok(())
}

fn cli_categories(args: &[String], db: &mut Database) -> Result<()> {
    let categories = if args.is_empty() {
        db.get_categories()?
    } else {
        db.find_categories_by_titles(args)?
    };
    if categories.is_empty() {
        println!("No categories");
        return Ok(());
    }

    println!("{:<5} Title", "ID");
    println!("{}", "─".repeat(30));
    for cat in &categories {
        println!("{:<5} {}", cat.id.unwrap_or(0), cat);
    }
    Ok(())
}

fn cli_add_category(args: &[String], db: &mut Database) -> Result<()> {
    let title = args.first().map(|t| t.trim()).unwrap_or_default();
    if title.is_empty() {
        anyhow::bail!("Usage: ledgerbook add-category <title>");
    }
    let id = db
        .insert_category(&Category::new(title.to_string()))
        .with_context(|| format!("Could not create category '{title}'"))?;
    println!("Added category #{id} {title}");
    Ok(())
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
