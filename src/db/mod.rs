mod schema;

use anyhow::{Context, Result};
use log::debug;
use rusqlite::{params, Connection, TransactionBehavior};
use std::collections::HashSet;
use std::path::Path;
use std::time::Duration;

use crate::models::*;
use crate::money::parse_value;

/// How long a writer waits for another connection's lock before failing.
const BUSY_TIMEOUT: Duration = Duration::from_secs(5);

const TRANSACTION_COLUMNS: &str = "id, title, type, value, category_id, created_at";

pub(crate) struct Database {
    conn: Connection,
}

/// Result of a get-or-create over a set of category titles.
#[derive(Debug, Default)]
pub(crate) struct CategoryResolution {
    pub(crate) existing: Vec<Category>,
    pub(crate) created: Vec<Category>,
}

impl CategoryResolution {
    /// Newly created first, then pre-existing.
    pub(crate) fn all(&self) -> Vec<Category> {
        self.created
            .iter()
            .chain(self.existing.iter())
            .cloned()
            .collect()
    }
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.busy_timeout(BUSY_TIMEOUT)
            .context("Failed to set busy timeout")?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("Failed to set database pragmas")?;
        let db = Self { conn };
        db.create_schema().context("Failed to create database schema")?;
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let db = Self { conn };
        db.create_schema()?;
        Ok(db)
    }

    fn create_schema(&self) -> Result<()> {
        self.conn.execute_batch(schema::SCHEMA)?;
        Ok(())
    }

    // ── Transactions ──────────────────────────────────────────

    pub(crate) fn insert_transaction(&self, txn: &Transaction) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO transactions (title, type, value, category_id, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                txn.title,
                txn.kind.as_str(),
                txn.value.to_string(),
                txn.category_id,
                txn.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Insert all rows in one SQLite transaction and return them with their ids.
    pub(crate) fn insert_transactions_batch(
        &mut self,
        txns: &[Transaction],
    ) -> Result<Vec<Transaction>> {
        let tx = self.conn.transaction()?;
        let mut saved = Vec::with_capacity(txns.len());
        for txn in txns {
            tx.execute(
                "INSERT INTO transactions (title, type, value, category_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                params![
                    txn.title,
                    txn.kind.as_str(),
                    txn.value.to_string(),
                    txn.category_id,
                    txn.created_at,
                ],
            )?;
            saved.push(Transaction {
                id: Some(tx.last_insert_rowid()),
                ..txn.clone()
            });
        }
        tx.commit()?;
        debug!("Saved {} transactions", saved.len());
        Ok(saved)
    }

    pub(crate) fn get_transactions(&self) -> Result<Vec<Transaction>> {
        let mut stmt = self
            .conn
            .prepare(&format!("SELECT {TRANSACTION_COLUMNS} FROM transactions ORDER BY id"))?;
        let rows = stmt.query_map([], StoredTransaction::from_row)?;
        let txns = rows
            .map(|row| row?.into_transaction())
            .collect::<Result<Vec<_>>>()?;
        Ok(txns)
    }

    pub(crate) fn get_transaction_by_id(&self, id: i64) -> Result<Option<Transaction>> {
        let result = self.conn.query_row(
            &format!("SELECT {TRANSACTION_COLUMNS} FROM transactions WHERE id = ?1"),
            params![id],
            StoredTransaction::from_row,
        );
        match result {
            Ok(stored) => Ok(Some(stored.into_transaction()?)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn get_transaction_count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM transactions", [], |row| row.get(0))?)
    }

    /// Returns the number of rows removed.
    pub(crate) fn delete_transaction(&self, id: i64) -> Result<usize> {
        Ok(self
            .conn
            .execute("DELETE FROM transactions WHERE id = ?1", params![id])?)
    }

    /// Recomputed from every stored transaction on each call.
    pub(crate) fn get_balance(&self) -> Result<Balance> {
        Balance::from_transactions(&self.get_transactions()?)
    }

    // ── Categories ────────────────────────────────────────────

    pub(crate) fn get_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, title, created_at FROM categories ORDER BY title")?;
        let rows = stmt.query_map([], category_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn find_categories_by_titles(&self, titles: &[String]) -> Result<Vec<Category>> {
        select_categories_by_titles(&self.conn, titles)
    }

    pub(crate) fn insert_category(&self, cat: &Category) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO categories (title, created_at) VALUES (?1, ?2)",
            params![cat.title, cat.created_at],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Look up every title and create the ones that are missing.
    ///
    /// Runs under an IMMEDIATE transaction so the write lock is held from the
    /// first read; concurrent importers serialize instead of both deciding a
    /// title is missing. The UNIQUE constraint on `title` backs this up.
    pub(crate) fn get_or_create_categories(
        &mut self,
        titles: &[String],
    ) -> Result<CategoryResolution> {
        let mut unique: Vec<&String> = Vec::new();
        let mut seen: HashSet<&str> = HashSet::new();
        for title in titles {
            if seen.insert(title.as_str()) {
                unique.push(title);
            }
        }

        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;

        let mut existing = select_categories_by_titles(&tx, &unique)?;
        let found: HashSet<String> = existing.iter().map(|c| c.title.clone()).collect();

        let mut created = Vec::new();
        for title in unique.iter().filter(|t| !found.contains(t.as_str())) {
            let cat = Category::new(title.to_string());
            let inserted = tx.execute(
                "INSERT OR IGNORE INTO categories (title, created_at) VALUES (?1, ?2)",
                params![cat.title, cat.created_at],
            )?;
            if inserted == 1 {
                created.push(Category {
                    id: Some(tx.last_insert_rowid()),
                    ..cat
                });
            } else {
                existing.extend(select_categories_by_titles(&tx, &[*title])?);
            }
        }

        tx.commit()?;
        debug!(
            "Resolved categories: {} existing, {} created",
            existing.len(),
            created.len()
        );
        Ok(CategoryResolution { existing, created })
    }
}

/// Stays well under SQLite's bound-parameter limit.
const TITLE_CHUNK: usize = 500;

fn select_categories_by_titles<T: AsRef<str>>(
    conn: &Connection,
    titles: &[T],
) -> Result<Vec<Category>> {
    let mut found = Vec::new();
    for chunk in titles.chunks(TITLE_CHUNK) {
        let placeholders: String = (0..chunk.len())
            .map(|i| format!("?{}", i + 1))
            .collect::<Vec<_>>()
            .join(",");
        let sql = format!(
            "SELECT id, title, created_at FROM categories WHERE title IN ({placeholders})"
        );
        let mut stmt = conn.prepare(&sql)?;
        let rows = stmt.query_map(
            rusqlite::params_from_iter(chunk.iter().map(AsRef::<str>::as_ref)),
            category_from_row,
        )?;
        found.extend(rows.collect::<std::result::Result<Vec<_>, _>>()?);
    }
    found.sort_by_key(|c| c.id);
    Ok(found)
}

fn category_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: Some(row.get(0)?),
        title: row.get(1)?,
        created_at: row.get(2)?,
    })
}

/// A transaction row as SQLite hands it back, before its text columns are
/// converted into domain types.
struct StoredTransaction {
    id: i64,
    title: String,
    kind: String,
    value: String,
    category_id: Option<i64>,
    created_at: String,
}

impl StoredTransaction {
    fn from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            kind: row.get(2)?,
            value: row.get(3)?,
            category_id: row.get(4)?,
            created_at: row.get(5)?,
        })
    }

    fn into_transaction(self) -> Result<Transaction> {
        let kind = TransactionType::parse(&self.kind).with_context(|| {
            format!("Transaction {} has unknown type '{}'", self.id, self.kind)
        })?;
        let value = parse_value(&self.value)
            .with_context(|| format!("Transaction {} has a corrupt value", self.id))?;
        Ok(Transaction {
            id: Some(self.id),
            title: self.title,
            kind,
            value,
            category_id: self.category_id,
            created_at: self.created_at,
        })
    }
}
