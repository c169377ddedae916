use anyhow::Result;
use log::info;
use rust_decimal::Decimal;

use crate::db::Database;
use crate::errors::LedgerError;
use crate::models::{Balance, Category, Transaction, TransactionType};

pub(crate) fn balance(db: &Database) -> Result<Balance> {
    db.get_balance()
}

/// Remove one transaction. Fails with `TransactionNotFound` when nothing matched.
pub(crate) fn delete_transaction(db: &Database, id: i64) -> Result<()> {
    if db.delete_transaction(id)? == 0 {
        return Err(LedgerError::TransactionNotFound(id).into());
    }
    info!("Deleted transaction {id}");
    Ok(())
}

/// Insert a single transaction, resolving its category by title.
pub(crate) fn create_transaction(
    db: &mut Database,
    title: &str,
    kind: TransactionType,
    value: Decimal,
    category_title: Option<&str>,
) -> Result<Transaction> {
    let title = title.trim();
    if title.is_empty() {
        return Err(LedgerError::MissingField("title").into());
    }

    let category_id = match category_title.map(str::trim).filter(|t| !t.is_empty()) {
        Some(category_title) => {
            let resolved = db.get_or_create_categories(&[category_title.to_string()])?;
            Category::find_by_title(&resolved.all(), category_title).and_then(|c| c.id)
        }
        None => None,
    };

    let mut txn = Transaction::new(title.to_string(), kind, value, category_id);
    txn.id = Some(db.insert_transaction(&txn)?);
    info!("Created {kind} transaction {:?} ({title})", txn.id);
    Ok(txn)
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
