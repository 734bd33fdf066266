#![allow(clippy::unwrap_used)]

use super::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

fn date(s: &str) -> NaiveDate {
    NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
}

fn category_id(db: &Database, name: &str) -> i64 {
    db.find_category_by_name(name).unwrap().unwrap().id
}

fn add(db: &Database, amount: Decimal, category: &str, on: &str) -> i64 {
    let expense = NewExpense::new(
        amount,
        format!("{category} on {on}"),
        category_id(db, category),
        date(on),
        "Cash".into(),
    );
    db.add_expense(&expense).unwrap()
}

// ── Default data ──────────────────────────────────────────────

#[test]
fn test_default_categories_seeded() {
    let db = Database::open_in_memory().unwrap();
    let cats = db.list_categories().unwrap();
    assert_eq!(cats.len(), 8);
    assert_eq!(cats[0].name, "Food");
    assert_eq!(cats[0].budget, dec!(5000));
    assert_eq!(cats[4].name, "Rent");
    assert_eq!(cats[4].budget, dec!(15000));
    assert_eq!(cats[7].name, "Others");
}

#[test]
fn test_categories_ordered_by_id() {
    let db = Database::open_in_memory().unwrap();
    db.add_category("Aardvark Care", Decimal::ZERO).unwrap();
    let ids: Vec<i64> = db.list_categories().unwrap().iter().map(|c| c.id).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
}

#[test]
fn test_seeding_twice_keeps_eight_categories() {
    let mut db = Database::open_in_memory().unwrap();
    db.seed_default_categories().unwrap();
    assert_eq!(db.list_categories().unwrap().len(), 8);
}

#[test]
fn test_reseeding_does_not_reset_budgets() {
    let mut db = Database::open_in_memory().unwrap();
    let food = category_id(&db, "Food");
    db.update_category_budget(food, dec!(123)).unwrap();
    db.seed_default_categories().unwrap();
    let cats = db.list_categories().unwrap();
    assert_eq!(Category::find_by_id(&cats, food).unwrap().budget, dec!(123));
}

#[test]
fn test_reopen_file_is_idempotent() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("tracker.db");
    {
        let db = Database::open(&path).unwrap();
        db.add_category("Travel", dec!(800)).unwrap();
        add(&db, dec!(42), "Travel", "2024-03-01");
    }
    let db = Database::open(&path).unwrap();
    let cats = db.list_categories().unwrap();
    assert_eq!(cats.len(), 9);
    assert_eq!(db.expense_count().unwrap(), 1);
}

#[test]
fn test_migrate_existing_database_is_noop() {
    let mut db = Database::open_in_memory().unwrap();
    db.migrate().unwrap();
    let version: i32 = db
        .conn
        .query_row("SELECT version FROM schema_version", [], |row| row.get(0))
        .unwrap();
    assert_eq!(version, schema::CURRENT_VERSION);
}

// ── Categories ────────────────────────────────────────────────

#[test]
fn test_add_category() {
    let db = Database::open_in_memory().unwrap();
    let id = db.add_category("Travel", dec!(2500.50)).unwrap();
    let cats = db.list_categories().unwrap();
    let travel = Category::find_by_id(&cats, id).unwrap();
    assert_eq!(travel.name, "Travel");
    assert_eq!(travel.budget, dec!(2500.50));
}

#[test]
fn test_add_duplicate_category_fails() {
    let db = Database::open_in_memory().unwrap();
    db.add_category("Travel", Decimal::ZERO).unwrap();
    let before = db.list_categories().unwrap().len();

    let err = db.add_category("Travel", dec!(10)).unwrap_err();
    assert!(matches!(err, TrackerError::DuplicateName(ref n) if n == "Travel"));
    assert_eq!(db.list_categories().unwrap().len(), before);
}

#[test]
fn test_add_seeded_name_is_duplicate() {
    let db = Database::open_in_memory().unwrap();
    let err = db.add_category("Food", Decimal::ZERO).unwrap_err();
    assert!(matches!(err, TrackerError::DuplicateName(_)));
}

#[test]
fn test_case_variant_of_existing_name_is_duplicate() {
    let db = Database::open_in_memory().unwrap();
    let err = db.add_category("food", dec!(100)).unwrap_err();
    assert!(matches!(err, TrackerError::DuplicateName(ref n) if n == "food"));

    db.add_category("Travel", Decimal::ZERO).unwrap();
    assert!(matches!(
        db.add_category("TRAVEL", Decimal::ZERO).unwrap_err(),
        TrackerError::DuplicateName(_)
    ));
    assert_eq!(db.list_categories().unwrap().len(), 9);

    // The only row that answers to any casing is the original one.
    let travel = db.find_category_by_name("travel").unwrap().unwrap();
    assert_eq!(travel.name, "Travel");
}

#[test]
fn test_store_rejects_empty_category_name() {
    let db = Database::open_in_memory().unwrap();
    let err = db.add_category("", Decimal::ZERO).unwrap_err();
    assert!(matches!(err, TrackerError::InvalidInput(_)));
    assert_eq!(db.list_categories().unwrap().len(), 8);
}

#[test]
fn test_find_category_by_name_ignores_case() {
    let db = Database::open_in_memory().unwrap();
    let found = db.find_category_by_name("healthcare").unwrap().unwrap();
    assert_eq!(found.name, "Healthcare");
    assert!(db.find_category_by_name("Pets").unwrap().is_none());
}

#[test]
fn test_update_category_budget() {
    let db = Database::open_in_memory().unwrap();
    let rent = category_id(&db, "Rent");
    db.update_category_budget(rent, dec!(18000)).unwrap();
    let rent = db.find_category_by_name("Rent").unwrap().unwrap();
    assert_eq!(rent.budget, dec!(18000));

    db.update_category_budget(rent.id, Decimal::ZERO).unwrap();
    let rent = db.find_category_by_name("Rent").unwrap().unwrap();
    assert_eq!(rent.budget, Decimal::ZERO);
}

#[test]
fn test_update_missing_category_budget_fails() {
    let db = Database::open_in_memory().unwrap();
    let err = db.update_category_budget(9999, dec!(1)).unwrap_err();
    assert!(matches!(err, TrackerError::NotFound(_)));
}

// ── Expenses ──────────────────────────────────────────────────

#[test]
fn test_add_and_list_expense() {
    let db = Database::open_in_memory().unwrap();
    let food = category_id(&db, "Food");
    let expense = NewExpense::new(
        dec!(500),
        "Groceries".into(),
        food,
        date("2024-01-15"),
        "UPI".into(),
    )
    .with_transaction("txn-1".into());
    let id = db.add_expense(&expense).unwrap();
    assert!(id > 0);

    let all = db.list_expenses(&ExpenseFilter::default()).unwrap();
    assert_eq!(all.len(), 1);
    let e = &all[0];
    assert_eq!(e.id, id);
    assert_eq!(e.amount, dec!(500));
    assert_eq!(e.description, "Groceries");
    assert_eq!(e.category_id, food);
    assert_eq!(e.category_name, "Food");
    assert_eq!(e.date, date("2024-01-15"));
    assert_eq!(e.payment_method, "UPI");
    assert_eq!(e.transaction_id.as_deref(), Some("txn-1"));
}

#[test]
fn test_add_expense_unknown_category_inserts_nothing() {
    let db = Database::open_in_memory().unwrap();
    let expense = NewExpense::new(
        dec!(10),
        "Ghost".into(),
        4242,
        date("2024-01-15"),
        "Cash".into(),
    );
    let err = db.add_expense(&expense).unwrap_err();
    assert!(matches!(err, TrackerError::InvalidCategory(4242)));
    assert_eq!(db.expense_count().unwrap(), 0);
}

#[test]
fn test_amounts_keep_exact_precision() {
    let db = Database::open_in_memory().unwrap();
    add(&db, dec!(0.1), "Food", "2024-01-01");
    add(&db, dec!(0.2), "Food", "2024-01-02");
    let totals = db.category_totals(None, None).unwrap();
    let food = totals.iter().find(|t| t.name == "Food").unwrap();
    assert_eq!(food.total, dec!(0.3));
}

#[test]
fn test_list_expenses_ordered_by_date_desc() {
    let db = Database::open_in_memory().unwrap();
    add(&db, dec!(1), "Food", "2024-01-10");
    add(&db, dec!(2), "Rent", "2024-03-01");
    add(&db, dec!(3), "Food", "2024-02-05");
    let dates: Vec<NaiveDate> = db
        .list_expenses(&ExpenseFilter::default())
        .unwrap()
        .iter()
        .map(|e| e.date)
        .collect();
    assert_eq!(
        dates,
        vec![date("2024-03-01"), date("2024-02-05"), date("2024-01-10")]
    );
}

#[test]
fn test_same_day_expenses_newest_first() {
    let db = Database::open_in_memory().unwrap();
    let first = add(&db, dec!(1), "Food", "2024-01-10");
    let second = add(&db, dec!(2), "Food", "2024-01-10");
    let ids: Vec<i64> = db
        .list_expenses(&ExpenseFilter::default())
        .unwrap()
        .iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec![second, first]);
}

fn setup_range_data(db: &Database) {
    add(db, dec!(10), "Food", "2023-12-31");
    add(db, dec!(20), "Food", "2024-01-01");
    add(db, dec!(30), "Rent", "2024-01-15");
    add(db, dec!(40), "Food", "2024-01-31");
    add(db, dec!(50), "Shopping", "2024-02-01");
}

#[test]
fn test_list_expenses_date_range_is_inclusive() {
    let db = Database::open_in_memory().unwrap();
    setup_range_data(&db);

    let filter = ExpenseFilter::between(Some(date("2024-01-01")), Some(date("2024-01-31")));
    let jan = db.list_expenses(&filter).unwrap();
    let amounts: Vec<Decimal> = jan.iter().map(|e| e.amount).collect();
    assert_eq!(amounts, vec![dec!(40), dec!(30), dec!(20)]);
    assert!(jan
        .iter()
        .all(|e| e.date >= date("2024-01-01") && e.date <= date("2024-01-31")));
}

#[test]
fn test_list_expenses_open_ended_bounds() {
    let db = Database::open_in_memory().unwrap();
    setup_range_data(&db);

    let from = db
        .list_expenses(&ExpenseFilter::between(Some(date("2024-01-31")), None))
        .unwrap();
    assert_eq!(from.len(), 2);

    let until = db
        .list_expenses(&ExpenseFilter::between(None, Some(date("2024-01-01"))))
        .unwrap();
    assert_eq!(until.len(), 2);
}

#[test]
fn test_list_expenses_by_category() {
    let db = Database::open_in_memory().unwrap();
    setup_range_data(&db);
    let food = category_id(&db, "Food");

    let all_food = db
        .list_expenses(&ExpenseFilter::default().in_category(food))
        .unwrap();
    assert_eq!(all_food.len(), 3);
    assert!(all_food.iter().all(|e| e.category_name == "Food"));

    let jan_food = db
        .list_expenses(
            &ExpenseFilter::between(Some(date("2024-01-01")), Some(date("2024-01-31")))
                .in_category(food),
        )
        .unwrap();
    assert_eq!(jan_food.len(), 2);
}

#[test]
fn test_list_expenses_no_filter_returns_all() {
    let db = Database::open_in_memory().unwrap();
    setup_range_data(&db);
    assert_eq!(db.list_expenses(&ExpenseFilter::default()).unwrap().len(), 5);
}

#[test]
fn test_list_expenses_empty_range() {
    let db = Database::open_in_memory().unwrap();
    setup_range_data(&db);
    let filter = ExpenseFilter::between(Some(date("2025-06-01")), Some(date("2025-06-30")));
    assert!(db.list_expenses(&filter).unwrap().is_empty());
}

#[test]
fn test_delete_expense() {
    let db = Database::open_in_memory().unwrap();
    let keep = add(&db, dec!(1), "Food", "2024-01-10");
    let gone = add(&db, dec!(2), "Food", "2024-01-11");
    db.delete_expense(gone).unwrap();
    let ids: Vec<i64> = db
        .list_expenses(&ExpenseFilter::default())
        .unwrap()
        .iter()
        .map(|e| e.id)
        .collect();
    assert_eq!(ids, vec![keep]);
}

#[test]
fn test_delete_missing_expense_is_ok() {
    let db = Database::open_in_memory().unwrap();
    add(&db, dec!(1), "Food", "2024-01-10");
    add(&db, dec!(2), "Rent", "2024-01-11");
    db.delete_expense(987_654).unwrap();
    assert_eq!(db.expense_count().unwrap(), 2);
}

// ── Analytics ─────────────────────────────────────────────────

#[test]
fn test_category_totals_january_scenario() {
    let db = Database::open_in_memory().unwrap();
    add(&db, dec!(500), "Food", "2024-01-15");

    let totals = db
        .category_totals(Some(date("2024-01-01")), Some(date("2024-01-31")))
        .unwrap();
    assert_eq!(totals.len(), 8);
    assert_eq!(totals[0].name, "Food");
    assert_eq!(totals[0].total, dec!(500));
    assert_eq!(totals[0].budget, dec!(5000));

    for t in &totals[1..] {
        assert_eq!(t.total, Decimal::ZERO, "{} should be zero", t.name);
        let (_, seeded) = DEFAULT_CATEGORIES
            .iter()
            .find(|(n, _)| *n == t.name)
            .unwrap();
        assert_eq!(t.budget, Decimal::from(*seeded));
    }
}

#[test]
fn test_category_totals_one_row_per_category() {
    let db = Database::open_in_memory().unwrap();
    db.add_category("Travel", dec!(100)).unwrap();
    setup_range_data(&db);
    let totals = db.category_totals(None, None).unwrap();
    assert_eq!(totals.len(), db.list_categories().unwrap().len());
    let travel = totals.iter().find(|t| t.name == "Travel").unwrap();
    assert_eq!(travel.total, Decimal::ZERO);
}

#[test]
fn test_category_totals_sum_matches_expenses_in_range() {
    let db = Database::open_in_memory().unwrap();
    setup_range_data(&db);
    add(&db, dec!(12.34), "Rent", "2024-01-20");

    let (start, end) = (Some(date("2024-01-01")), Some(date("2024-01-31")));
    let totals = db.category_totals(start, end).unwrap();
    let expenses = db.list_expenses(&ExpenseFilter::between(start, end)).unwrap();

    let from_totals: Decimal = totals.iter().map(|t| t.total).sum();
    let from_expenses: Decimal = expenses.iter().map(|e| e.amount).sum();
    assert_eq!(from_totals, from_expenses);
    assert_eq!(from_totals, dec!(102.34));

    for t in &totals {
        let expected: Decimal = expenses
            .iter()
            .filter(|e| e.category_id == t.category_id)
            .map(|e| e.amount)
            .sum();
        assert_eq!(t.total, expected);
    }
}

#[test]
fn test_category_totals_ordered_by_total_desc() {
    let db = Database::open_in_memory().unwrap();
    setup_range_data(&db);
    let totals = db.category_totals(None, None).unwrap();
    let names: Vec<&str> = totals.iter().take(3).map(|t| t.name.as_str()).collect();
    assert_eq!(names, vec!["Food", "Shopping", "Rent"]);
    assert!(totals.windows(2).all(|w| w[0].total >= w[1].total));
}

#[test]
fn test_category_totals_zero_rows_keep_id_order() {
    let db = Database::open_in_memory().unwrap();
    let totals = db.category_totals(None, None).unwrap();
    let ids: Vec<i64> = totals.iter().map(|t| t.category_id).collect();
    let mut sorted = ids.clone();
    sorted.sort();
    assert_eq!(ids, sorted);
}

#[test]
fn test_category_totals_empty_store() {
    let db = Database::open_in_memory().unwrap();
    db.conn.execute("DELETE FROM categories", []).unwrap();
    assert!(db.list_categories().unwrap().is_empty());
    assert!(db.category_totals(None, None).unwrap().is_empty());
}

// ── Payment transactions ──────────────────────────────────────

#[test]
fn test_pending_transaction_lifecycle() {
    let db = Database::open_in_memory().unwrap();
    db.create_pending_transaction("txn-1", dec!(250), "lunch")
        .unwrap();

    let txn = db.get_transaction("txn-1").unwrap().unwrap();
    assert_eq!(txn.amount, dec!(250));
    assert_eq!(txn.description, "lunch");
    assert_eq!(txn.status, TransactionStatus::Pending);
    assert_eq!(txn.date, chrono::Local::now().date_naive());

    db.mark_transaction_status("txn-1", TransactionStatus::Completed)
        .unwrap();
    assert!(db.get_transaction("txn-1").unwrap().unwrap().is_completed());
}

#[test]
fn test_transaction_ids_are_never_reused() {
    let db = Database::open_in_memory().unwrap();
    db.create_pending_transaction("txn-1", dec!(1), "a").unwrap();
    let err = db
        .create_pending_transaction("txn-1", dec!(2), "b")
        .unwrap_err();
    assert!(matches!(err, TrackerError::DuplicateTransaction(_)));
    assert_eq!(db.get_transaction("txn-1").unwrap().unwrap().amount, dec!(1));
}

#[test]
fn test_completed_transaction_cannot_revert() {
    let db = Database::open_in_memory().unwrap();
    db.create_pending_transaction("txn-1", dec!(1), "a").unwrap();
    db.mark_transaction_status("txn-1", TransactionStatus::Completed)
        .unwrap();

    let err = db
        .mark_transaction_status("txn-1", TransactionStatus::Pending)
        .unwrap_err();
    assert!(matches!(
        err,
        TrackerError::InvalidStatusTransition {
            from: TransactionStatus::Completed,
            to: TransactionStatus::Pending,
        }
    ));
    assert!(db.get_transaction("txn-1").unwrap().unwrap().is_completed());

    // Completing twice is harmless.
    db.mark_transaction_status("txn-1", TransactionStatus::Completed)
        .unwrap();
}

#[test]
fn test_mark_missing_transaction_fails() {
    let db = Database::open_in_memory().unwrap();
    let err = db
        .mark_transaction_status("nope", TransactionStatus::Completed)
        .unwrap_err();
    assert!(matches!(err, TrackerError::NotFound(_)));
}

#[test]
fn test_get_missing_transaction_is_none() {
    let db = Database::open_in_memory().unwrap();
    assert!(db.get_transaction("nope").unwrap().is_none());
}

#[test]
fn test_list_transactions() {
    let db = Database::open_in_memory().unwrap();
    assert!(db.list_transactions().unwrap().is_empty());
    db.create_pending_transaction("txn-1", dec!(1), "a").unwrap();
    db.create_pending_transaction("txn-2", dec!(2), "b").unwrap();
    let ids: Vec<String> = db
        .list_transactions()
        .unwrap()
        .into_iter()
        .map(|t| t.transaction_id)
        .collect();
    assert_eq!(ids, vec!["txn-2".to_string(), "txn-1".to_string()]);
}

#[test]
fn test_corrupt_status_surfaces_as_storage_error() {
    let db = Database::open_in_memory().unwrap();
    db.create_pending_transaction("txn-1", dec!(1), "a").unwrap();
    db.conn
        .execute(
            "UPDATE upi_transactions SET status = 'refunded' WHERE transaction_id = 'txn-1'",
            [],
        )
        .unwrap();
    let err = db.get_transaction("txn-1").unwrap_err();
    assert!(matches!(err, TrackerError::Storage(_)));
}
