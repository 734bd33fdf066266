mod schema;

pub(crate) use schema::DATE_FORMAT;

use chrono::NaiveDate;
use rusqlite::types::Type;
use rusqlite::{ffi, params, Connection, OptionalExtension, Row};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;

use crate::error::{constraint_code, Result, TrackerError};
use crate::models::*;

pub(crate) struct Database {
    conn: Connection,
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
        let mut db = Self { conn };
        db.migrate()?;
        db.seed_default_categories()?;
        log::info!("Opened expense database at {}", path.display());
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut db = Self { conn };
        db.migrate()?;
        db.seed_default_categories()?;
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn conn_for_tests(&self) -> &Connection {
        &self.conn
    }

    fn migrate(&mut self) -> Result<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            // Fresh database - apply full schema
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            log::debug!("Created schema version {}", schema::CURRENT_VERSION);
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .optional()?
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
            log::info!(
                "Migrated schema from version {current} to {}",
                schema::CURRENT_VERSION
            );
        }

        Ok(())
    }

    /// Insert-if-absent by name, so re-running never duplicates or resets budgets.
    fn seed_default_categories(&mut self) -> Result<()> {
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        for (name, budget) in DEFAULT_CATEGORIES {
            inserted += tx.execute(
                "INSERT OR IGNORE INTO categories (name, budget) VALUES (?1, ?2)",
                params![name, Decimal::from(*budget).to_string()],
            )?;
        }
        tx.commit()?;
        if inserted > 0 {
            log::debug!("Seeded {inserted} default categories");
        }
        Ok(())
    }

    // ── Categories ────────────────────────────────────────────

    pub(crate) fn list_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, budget FROM categories ORDER BY id")?;
        let rows = stmt.query_map([], category_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn find_category_by_name(&self, name: &str) -> Result<Option<Category>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id, name, budget FROM categories WHERE name = ?1 COLLATE NOCASE",
                params![name.trim()],
                category_from_row,
            )
            .optional()?)
    }

    pub(crate) fn add_category(&self, name: &str, budget: Decimal) -> Result<i64> {
        let result = self.conn.execute(
            "INSERT INTO categories (name, budget) VALUES (?1, ?2)",
            params![name, budget.to_string()],
        );
        match result {
            Ok(_) => {
                let id = self.conn.last_insert_rowid();
                log::debug!("Added category {id} '{name}' with budget {budget}");
                Ok(id)
            }
            Err(e) => Err(match constraint_code(&e) {
                Some(ffi::SQLITE_CONSTRAINT_UNIQUE) => TrackerError::DuplicateName(name.into()),
                Some(ffi::SQLITE_CONSTRAINT_CHECK) => {
                    TrackerError::invalid_input("category name must not be empty")
                }
                _ => e.into(),
            }),
        }
    }

    pub(crate) fn update_category_budget(&self, category_id: i64, budget: Decimal) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE categories SET budget = ?1 WHERE id = ?2",
            params![budget.to_string(), category_id],
        )?;
        if changed == 0 {
            return Err(TrackerError::not_found(format!("Category {category_id}")));
        }
        log::debug!("Set budget of category {category_id} to {budget}");
        Ok(())
    }

    // ── Expenses ──────────────────────────────────────────────

    pub(crate) fn add_expense(&self, expense: &NewExpense) -> Result<i64> {
        let result = self.conn.execute(
            "INSERT INTO expenses (amount, description, category_id, date, payment_method, transaction_id)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                expense.amount.to_string(),
                expense.description,
                expense.category_id,
                expense.date.format(DATE_FORMAT).to_string(),
                expense.payment_method,
                expense.transaction_id,
            ],
        );
        match result {
            Ok(_) => {
                let id = self.conn.last_insert_rowid();
                log::debug!(
                    "Added expense {id}: {} in category {}",
                    expense.amount,
                    expense.category_id
                );
                Ok(id)
            }
            Err(e) if constraint_code(&e) == Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => {
                Err(TrackerError::InvalidCategory(expense.category_id))
            }
            Err(e) => Err(e.into()),
        }
    }

    pub(crate) fn list_expenses(&self, filter: &ExpenseFilter) -> Result<Vec<Expense>> {
        let mut sql = String::from(
            "SELECT e.id, e.amount, e.description, e.category_id, c.name,
                    e.date, e.payment_method, e.transaction_id
             FROM expenses e JOIN categories c ON e.category_id = c.id WHERE 1=1",
        );
        let mut param_values: Vec<Box<dyn rusqlite::types::ToSql>> = Vec::new();

        if let Some(start) = filter.start_date {
            sql.push_str(&format!(" AND e.date >= ?{}", param_values.len() + 1));
            param_values.push(Box::new(start.format(DATE_FORMAT).to_string()));
        }
        if let Some(end) = filter.end_date {
            sql.push_str(&format!(" AND e.date <= ?{}", param_values.len() + 1));
            param_values.push(Box::new(end.format(DATE_FORMAT).to_string()));
        }
        if let Some(cid) = filter.category_id {
            sql.push_str(&format!(" AND e.category_id = ?{}", param_values.len() + 1));
            param_values.push(Box::new(cid));
        }

        sql.push_str(" ORDER BY e.date DESC, e.id DESC");

        let params_ref: Vec<&dyn rusqlite::types::ToSql> =
            param_values.iter().map(|p| p.as_ref()).collect();

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params_ref.as_slice(), |row| {
            Ok(Expense {
                id: row.get(0)?,
                amount: decimal_column(row, 1)?,
                description: row.get(2)?,
                category_id: row.get(3)?,
                category_name: row.get(4)?,
                date: date_column(row, 5)?,
                payment_method: row.get(6)?,
                transaction_id: row.get(7)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Id of the expense recorded for a settled payment, if any.
    pub(crate) fn find_expense_by_transaction(&self, transaction_id: &str) -> Result<Option<i64>> {
        Ok(self
            .conn
            .query_row(
                "SELECT id FROM expenses WHERE transaction_id = ?1 ORDER BY id LIMIT 1",
                params![transaction_id],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub(crate) fn expense_count(&self) -> Result<i64> {
        Ok(self
            .conn
            .query_row("SELECT COUNT(*) FROM expenses", [], |row| row.get(0))?)
    }

    /// Removing an id that does not exist is not an error.
    pub(crate) fn delete_expense(&self, id: i64) -> Result<()> {
        let removed = self
            .conn
            .execute("DELETE FROM expenses WHERE id = ?1", params![id])?;
        if removed == 0 {
            log::debug!("Delete of expense {id} matched no rows");
        }
        Ok(())
    }

    // ── Analytics ─────────────────────────────────────────────

    /// Spend per category within the optional inclusive date range, highest first.
    /// Every category is present; those with no matching expenses total zero.
    pub(crate) fn category_totals(
        &self,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<CategoryTotal>> {
        // The date predicate sits in the join so empty categories survive the range.
        let mut stmt = self.conn.prepare(
            "SELECT c.id, c.name, c.budget, e.amount
             FROM categories c
             LEFT JOIN expenses e ON e.category_id = c.id
                AND (?1 IS NULL OR e.date >= ?1)
                AND (?2 IS NULL OR e.date <= ?2)
             ORDER BY c.id, e.id",
        )?;
        let start = start_date.map(|d| d.format(DATE_FORMAT).to_string());
        let end = end_date.map(|d| d.format(DATE_FORMAT).to_string());
        let rows = stmt.query_map(params![start, end], |row| {
            let amount = match row.get::<_, Option<String>>(3)? {
                Some(s) => Some(parse_decimal(&s, 3)?),
                None => None,
            };
            Ok((row.get::<_, i64>(0)?, row.get::<_, String>(1)?, decimal_column(row, 2)?, amount))
        })?;

        // Sums are done in Decimal; SQLite would add the text amounts as floats.
        let mut totals: Vec<CategoryTotal> = Vec::new();
        for row in rows {
            let (id, name, budget, amount) = row?;
            match totals.last_mut() {
                Some(last) if last.category_id == id => {
                    last.total += amount.unwrap_or_default();
                }
                _ => totals.push(CategoryTotal {
                    category_id: id,
                    name,
                    total: amount.unwrap_or_default(),
                    budget,
                }),
            }
        }

        // Stable sort keeps id order among equal totals.
        totals.sort_by(|a, b| b.total.cmp(&a.total));
        Ok(totals)
    }

    // ── Payment transactions ──────────────────────────────────

    pub(crate) fn create_pending_transaction(
        &self,
        transaction_id: &str,
        amount: Decimal,
        description: &str,
    ) -> Result<()> {
        let today = chrono::Local::now().date_naive();
        let result = self.conn.execute(
            "INSERT INTO upi_transactions (transaction_id, amount, description, status, date)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                transaction_id,
                amount.to_string(),
                description,
                TransactionStatus::Pending.as_str(),
                today.format(DATE_FORMAT).to_string(),
            ],
        );
        match result {
            Ok(_) => {
                log::debug!("Recorded pending transaction {transaction_id} for {amount}");
                Ok(())
            }
            Err(e) => Err(match constraint_code(&e) {
                Some(ffi::SQLITE_CONSTRAINT_PRIMARYKEY | ffi::SQLITE_CONSTRAINT_UNIQUE) => {
                    TrackerError::DuplicateTransaction(transaction_id.into())
                }
                _ => e.into(),
            }),
        }
    }

    pub(crate) fn mark_transaction_status(
        &self,
        transaction_id: &str,
        status: TransactionStatus,
    ) -> Result<()> {
        let current = self
            .get_transaction(transaction_id)?
            .ok_or_else(|| TrackerError::not_found(format!("Transaction {transaction_id}")))?;

        if !current.status.can_become(status) {
            return Err(TrackerError::InvalidStatusTransition {
                from: current.status,
                to: status,
            });
        }
        if current.status == status {
            return Ok(());
        }

        self.conn.execute(
            "UPDATE upi_transactions SET status = ?1 WHERE transaction_id = ?2",
            params![status.as_str(), transaction_id],
        )?;
        log::debug!("Transaction {transaction_id}: {} -> {status}", current.status);
        Ok(())
    }

    pub(crate) fn get_transaction(&self, transaction_id: &str) -> Result<Option<PendingTransaction>> {
        Ok(self
            .conn
            .query_row(
                "SELECT transaction_id, amount, description, status, date
                 FROM upi_transactions WHERE transaction_id = ?1",
                params![transaction_id],
                transaction_from_row,
            )
            .optional()?)
    }

    /// Payment history, newest first.
    pub(crate) fn list_transactions(&self) -> Result<Vec<PendingTransaction>> {
        let mut stmt = self.conn.prepare(
            "SELECT transaction_id, amount, description, status, date
             FROM upi_transactions ORDER BY date DESC, rowid DESC",
        )?;
        let rows = stmt.query_map([], transaction_from_row)?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }
}

// ── Row mapping ───────────────────────────────────────────────

fn category_from_row(row: &Row<'_>) -> rusqlite::Result<Category> {
    Ok(Category {
        id: row.get(0)?,
        name: row.get(1)?,
        budget: decimal_column(row, 2)?,
    })
}

fn transaction_from_row(row: &Row<'_>) -> rusqlite::Result<PendingTransaction> {
    let status: String = row.get(3)?;
    Ok(PendingTransaction {
        transaction_id: row.get(0)?,
        amount: decimal_column(row, 1)?,
        description: row.get(2)?,
        status: TransactionStatus::parse(&status).ok_or_else(|| {
            rusqlite::Error::FromSqlConversionFailure(
                3,
                Type::Text,
                format!("unknown transaction status '{status}'").into(),
            )
        })?,
        date: date_column(row, 4)?,
    })
}

fn decimal_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<Decimal> {
    let s: String = row.get(idx)?;
    parse_decimal(&s, idx)
}

fn parse_decimal(s: &str, idx: usize) -> rusqlite::Result<Decimal> {
    Decimal::from_str(s)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn date_column(row: &Row<'_>, idx: usize) -> rusqlite::Result<NaiveDate> {
    let s: String = row.get(idx)?;
    NaiveDate::parse_from_str(&s, DATE_FORMAT)
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

#[cfg(test)]
mod tests;
