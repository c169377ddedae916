use anyhow::{Context, Result};
use log::{debug, info, warn};
use rust_decimal::Decimal;
use std::collections::HashSet;
use std::fs::{self, File};
use std::path::Path;

use crate::db::Database;
use crate::errors::LedgerError;
use crate::models::{Category, Transaction, TransactionType};
use crate::money::parse_value;

/// One data row, cells trimmed, in the fixed column order
/// `title, type, value, category`. Missing trailing cells are empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct CsvRow {
    pub(crate) title: String,
    pub(crate) kind: String,
    pub(crate) value: String,
    pub(crate) category: String,
}

/// A row that passed validation and can become a `Transaction`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedRow {
    pub(crate) title: String,
    pub(crate) kind: TransactionType,
    pub(crate) value: Decimal,
    pub(crate) category: Option<String>,
}

impl CsvRow {
    fn from_record(record: &csv::StringRecord) -> Self {
        let cell = |i: usize| record.get(i).unwrap_or_default().trim().to_string();
        Self {
            title: cell(0),
            kind: cell(1),
            value: cell(2),
            category: cell(3),
        }
    }

    /// `None` when title, type or value is missing or unusable.
    pub(crate) fn parse(&self) -> Option<ParsedRow> {
        if self.title.is_empty() || self.kind.is_empty() || self.value.is_empty() {
            return None;
        }
        let kind = TransactionType::parse(&self.kind)?;
        let value = parse_value(&self.value).ok()?;
        let category = Some(self.category.clone()).filter(|c| !c.is_empty());
        Some(ParsedRow {
            title: self.title.clone(),
            kind,
            value,
            category,
        })
    }
}

/// Rows of an open CSV file, yielded one at a time. Exhaustion is the end of
/// the file; the iterator cannot be restarted.
pub(crate) struct CsvRows {
    records: csv::StringRecordsIntoIter<File>,
}

impl Iterator for CsvRows {
    type Item = Result<CsvRow>;

    fn next(&mut self) -> Option<Self::Item> {
        self.records.next().map(|record| {
            record
                .map(|r| CsvRow::from_record(&r))
                .context("Failed to read CSV record")
        })
    }
}

pub(crate) struct CsvImporter;

impl CsvImporter {
    /// Open `path` and stream its data rows. The header row is skipped.
    pub(crate) fn rows(path: &Path) -> Result<CsvRows> {
        let rdr = csv::ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .trim(csv::Trim::All)
            .from_path(path)
            .with_context(|| format!("Failed to open CSV file: {}", path.display()))?;
        Ok(CsvRows {
            records: rdr.into_records(),
        })
    }

    /// Import every valid row of `path`, creating missing categories.
    ///
    /// The file is consumed: once it has been opened it is removed exactly
    /// once, whether the import succeeds or fails.
    pub(crate) fn import(db: &mut Database, path: &Path) -> Result<Vec<Transaction>> {
        let rows = Self::rows(path)?;
        let result = import_rows(db, rows);
        let removed = fs::remove_file(path)
            .with_context(|| format!("Failed to remove CSV file: {}", path.display()));

        match (result, removed) {
            (Ok(txns), Ok(())) => Ok(txns),
            (Ok(_), Err(e)) => Err(e),
            (Err(e), removed) => {
                if let Err(remove_err) = removed {
                    warn!("{remove_err:#}");
                }
                Err(e)
            }
        }
    }
}

fn import_rows(db: &mut Database, rows: CsvRows) -> Result<Vec<Transaction>> {
    let mut parsed = Vec::new();
    let mut category_titles = Vec::new();
    let mut seen_titles = HashSet::new();

    for (i, row) in rows.enumerate() {
        let row = row?;
        match row.parse() {
            Some(p) => {
                if let Some(category) = &p.category {
                    if seen_titles.insert(category.clone()) {
                        category_titles.push(category.clone());
                    }
                }
                parsed.push(p);
            }
            // +2: one for the header, one for 1-based line numbers
            None => debug!("Skipping CSV line {}: {:?}", i + 2, row),
        }
    }

    if category_titles.is_empty() {
        return Err(LedgerError::NoCategories.into());
    }
    if parsed.is_empty() {
        return Err(LedgerError::NoTransactions.into());
    }

    let resolved = db.get_or_create_categories(&category_titles)?;
    info!(
        "Import resolved {} existing and created {} new categories",
        resolved.existing.len(),
        resolved.created.len()
    );
    let categories = resolved.all();

    let txns: Vec<Transaction> = parsed
        .into_iter()
        .map(|row| {
            let category_id = row
                .category
                .as_deref()
                .and_then(|title| Category::find_by_title(&categories, title))
                .and_then(|c| c.id);
            Transaction::new(row.title, row.kind, row.value, category_id)
        })
        .collect();

    let saved = db.insert_transactions_batch(&txns)?;
    info!("Imported {} transactions", saved.len());
    Ok(saved)
}

#[cfg(test)]
#[path = "csv_import_tests.rs"]
mod tests;
