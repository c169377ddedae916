#![allow(clippy::unwrap_used)]

use super::*;
use rust_decimal_macros::dec;
use std::path::PathBuf;

const HEADER: &str = "title,type,value,category\n";

fn make_csv_file(content: &str) -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("import.csv");
    fs::write(&path, content).unwrap();
    (dir, path)
}

fn ledger_error(err: &anyhow::Error) -> &LedgerError {
    err.downcast_ref::<LedgerError>().unwrap()
}

fn row(title: &str, kind: &str, value: &str, category: &str) -> CsvRow {
    CsvRow {
        title: title.into(),
        kind: kind.into(),
        value: value.into(),
        category: category.into(),
    }
}

// ── CsvRow::parse ─────────────────────────────────────────────

#[test]
fn test_parse_valid_row() {
    let parsed = row("Salary", "income", "5000", "Work").parse().unwrap();
    assert_eq!(parsed.title, "Salary");
    assert_eq!(parsed.kind, TransactionType::Income);
    assert_eq!(parsed.value, dec!(5000));
    assert_eq!(parsed.category.as_deref(), Some("Work"));
}

#[test]
fn test_parse_missing_required_fields() {
    assert!(row("", "income", "5000", "Work").parse().is_none());
    assert!(row("Salary", "", "5000", "Work").parse().is_none());
    assert!(row("Salary", "income", "", "Work").parse().is_none());
}

#[test]
fn test_parse_unusable_fields() {
    assert!(row("Salary", "bonus", "5000", "Work").parse().is_none());
    assert!(row("Salary", "income", "lots", "Work").parse().is_none());
}

#[test]
fn test_parse_empty_category() {
    let parsed = row("Tip", "income", "5", "").parse().unwrap();
    assert!(parsed.category.is_none());
}

// ── CsvImporter::rows ─────────────────────────────────────────

#[test]
fn test_rows_skip_header_and_trim() {
    let (_dir, path) = make_csv_file(&format!(
        "{HEADER}  Salary , income ,  5000 ,  Work  \nRent,outcome,1200,Housing\n"
    ));
    let rows: Vec<CsvRow> = CsvImporter::rows(&path)
        .unwrap()
        .collect::<Result<Vec<_>>>()
        .unwrap();
    assert_eq!(
        rows,
        vec![
            row("Salary", "income", "5000", "Work"),
            row("Rent", "outcome", "1200", "Housing"),
        ]
    );
}

#[test]
fn test_rows_short_records_are_padded() {
    let (_dir, path) = make_csv_file(&format!("{HEADER}Salary,income\n"));
    let rows: Vec<CsvRow> = CsvImporter::rows(&path)
        .unwrap()
        .collect::<Result<Vec<_>>>()
        .unwrap();
    assert_eq!(rows, vec![row("Salary", "income", "", "")]);
    assert!(rows[0].parse().is_none());
}

#[test]
fn test_rows_missing_file() {
    let dir = tempfile::tempdir().unwrap();
    assert!(CsvImporter::rows(&dir.path().join("nope.csv")).is_err());
}

// ── CsvImporter::import ───────────────────────────────────────

#[test]
fn test_import_creates_transactions_and_categories() {
    let mut db = Database::open_in_memory().unwrap();
    let (_dir, path) = make_csv_file(&format!(
        "{HEADER}Salary,income,5000,Work\nRent,outcome,1200,Housing\n"
    ));

    let txns = CsvImporter::import(&mut db, &path).unwrap();
    assert_eq!(txns.len(), 2);
    assert!(txns.iter().all(|t| t.id.is_some() && t.category_id.is_some()));

    let categories = db.get_categories().unwrap();
    assert_eq!(categories.len(), 2);
    let work = Category::find_by_title(&categories, "Work").unwrap();
    assert_eq!(txns[0].title, "Salary");
    assert_eq!(txns[0].category_id, work.id);

    let balance = db.get_balance().unwrap();
    assert_eq!(balance.income, dec!(5000));
    assert_eq!(balance.outcome, dec!(1200));
    assert_eq!(balance.total, dec!(3800));

    assert!(!path.exists());
}

#[test]
fn test_import_reuses_existing_category() {
    let mut db = Database::open_in_memory().unwrap();
    let work_id = db.insert_category(&Category::new("Work".into())).unwrap();
    let (_dir, path) = make_csv_file(&format!("{HEADER}Salary,income,5000,Work\n"));

    let txns = CsvImporter::import(&mut db, &path).unwrap();
    assert_eq!(txns[0].category_id, Some(work_id));
    assert_eq!(db.get_categories().unwrap().len(), 1);
}

#[test]
fn test_import_deduplicates_new_categories() {
    let mut db = Database::open_in_memory().unwrap();
    let (_dir, path) = make_csv_file(&format!(
        "{HEADER}Lunch,outcome,12,Food\nDinner,outcome,30,Food\nSnack,outcome,3,food\n"
    ));

    let txns = CsvImporter::import(&mut db, &path).unwrap();
    assert_eq!(txns.len(), 3);
    assert_eq!(txns[0].category_id, txns[1].category_id);
    assert_ne!(txns[0].category_id, txns[2].category_id);
    assert_eq!(db.get_categories().unwrap().len(), 2);
}

#[test]
fn test_import_twice_shares_categories() {
    let mut db = Database::open_in_memory().unwrap();
    let (_a, first) = make_csv_file(&format!("{HEADER}Salary,income,5000,Work\n"));
    let (_b, second) = make_csv_file(&format!("{HEADER}Bonus,income,800,Work\n"));

    let a = CsvImporter::import(&mut db, &first).unwrap();
    let b = CsvImporter::import(&mut db, &second).unwrap();
    assert_eq!(a[0].category_id, b[0].category_id);
    assert_eq!(db.get_categories().unwrap().len(), 1);
    assert_eq!(db.get_transaction_count().unwrap(), 2);
}

#[test]
fn test_import_drops_invalid_rows() {
    let mut db = Database::open_in_memory().unwrap();
    let (_dir, path) = make_csv_file(&format!(
        "{HEADER}Salary,income,5000,Work\n,income,10,Ghost\nBad,refund,1,Ghost\nRent,outcome,1200,Housing\n"
    ));

    let txns = CsvImporter::import(&mut db, &path).unwrap();
    assert_eq!(txns.len(), 2);
    // Categories of dropped rows are never created
    let categories = db.get_categories().unwrap();
    assert!(Category::find_by_title(&categories, "Ghost").is_none());
    assert_eq!(categories.len(), 2);
}

#[test]
fn test_import_row_without_category() {
    let mut db = Database::open_in_memory().unwrap();
    let (_dir, path) = make_csv_file(&format!(
        "{HEADER}Salary,income,5000,Work\nTip,income,5,\n"
    ));

    let txns = CsvImporter::import(&mut db, &path).unwrap();
    assert_eq!(txns.len(), 2);
    assert!(txns[0].category_id.is_some());
    assert!(txns[1].category_id.is_none());
}

#[test]
fn test_import_every_row_missing_title() {
    let mut db = Database::open_in_memory().unwrap();
    let (_dir, path) = make_csv_file(&format!(
        "{HEADER},income,5000,Work\n,outcome,1200,Housing\n"
    ));

    let err = CsvImporter::import(&mut db, &path).unwrap_err();
    // Rows without a title contribute no category either, so the
    // category check trips first
    assert!(ledger_error(&err).is_validation());
    assert_eq!(ledger_error(&err), &LedgerError::NoCategories);
    assert!(!path.exists());
    assert_eq!(db.get_transaction_count().unwrap(), 0);
}

#[test]
fn test_import_no_categories() {
    let mut db = Database::open_in_memory().unwrap();
    let (_dir, path) = make_csv_file(&format!("{HEADER}Salary,income,5000,\n"));

    let err = CsvImporter::import(&mut db, &path).unwrap_err();
    assert_eq!(ledger_error(&err), &LedgerError::NoCategories);
    assert_eq!(err.to_string(), "No categories found");
    assert!(!path.exists());
    assert!(db.get_categories().unwrap().is_empty());
}

#[test]
fn test_import_header_only() {
    let mut db = Database::open_in_memory().unwrap();
    let (_dir, path) = make_csv_file(HEADER);

    let err = CsvImporter::import(&mut db, &path).unwrap_err();
    assert!(ledger_error(&err).is_validation());
    assert!(!path.exists());
}

#[test]
fn test_import_missing_file_is_unclassified() {
    let mut db = Database::open_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();

    let err = CsvImporter::import(&mut db, &dir.path().join("gone.csv")).unwrap_err();
    assert!(err.downcast_ref::<LedgerError>().is_none());
}

#[test]
fn test_import_cannot_run_twice() {
    let mut db = Database::open_in_memory().unwrap();
    let (_dir, path) = make_csv_file(&format!("{HEADER}Salary,income,5000,Work\n"));

    CsvImporter::import(&mut db, &path).unwrap();
    assert!(CsvImporter::import(&mut db, &path).is_err());
    assert_eq!(db.get_transaction_count().unwrap(), 1);
}

#[test]
fn test_import_invalid_utf8_is_an_error() {
    let mut db = Database::open_in_memory().unwrap();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("bad.csv");
    let mut bytes = HEADER.as_bytes().to_vec();
    bytes.extend_from_slice(b"Sal\xffary,income,5000,Work\n");
    fs::write(&path, bytes).unwrap();

    let err = CsvImporter::import(&mut db, &path).unwrap_err();
    assert!(err.downcast_ref::<LedgerError>().is_none());
    assert!(!path.exists());
    assert_eq!(db.get_transaction_count().unwrap(), 0);
}

// ── Volume and failures ───────────────────────────────────────

#[test]
fn test_import_many_rows_one_category() {
    let mut db = Database::open_in_memory().unwrap();
    let mut content = HEADER.to_string();
    for i in 0..40_000 {
        content.push_str(&format!("T{i},income,1,Work\n"));
    }
    let (_dir, path) = make_csv_file(&content);

    let txns = CsvImporter::import(&mut db, &path).unwrap();
    assert_eq!(txns.len(), 40_000);
    assert_eq!(db.get_categories().unwrap().len(), 1);
    assert_eq!(db.get_transaction_count().unwrap(), 40_000);
    assert_eq!(db.get_balance().unwrap().income, dec!(40000));
}

#[test]
fn test_import_balance_past_decimal_range_is_an_error() {
    let mut db = Database::open_in_memory().unwrap();
    let (_dir, path) = make_csv_file(&format!(
        "{HEADER}A,income,79228162514264337593543950335,Work\nB,income,1,Work\n"
    ));

    CsvImporter::import(&mut db, &path).unwrap();
    assert!(db.get_balance().is_err());
}

#[test]
fn test_import_store_failure_still_removes_file() {
    let dir = tempfile::tempdir().unwrap();
    let db_path = dir.path().join("ledger.db");
    let mut db = Database::open(&db_path).unwrap();
    rusqlite::Connection::open(&db_path)
        .unwrap()
        .execute_batch(
            "CREATE TRIGGER fail_insert BEFORE INSERT ON transactions
             WHEN NEW.title = 'Boom'
             BEGIN SELECT RAISE(ABORT, 'boom'); END;",
        )
        .unwrap();
    let (_csv_dir, path) = make_csv_file(&format!(
        "{HEADER}Salary,income,5000,Work\nBoom,outcome,1,Work\n"
    ));

    let err = CsvImporter::import(&mut db, &path).unwrap_err();
    assert!(err.downcast_ref::<LedgerError>().is_none());
    assert!(!path.exists());
    assert_eq!(db.get_transaction_count().unwrap(), 0);
}
