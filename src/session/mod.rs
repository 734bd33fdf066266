//! Per-session state for the front end: form input and the in-flight payment.

mod validate;

pub(crate) use validate::{parse_amount, parse_budget, parse_date, require_text};

use chrono::NaiveDate;
use rust_decimal::Decimal;

use crate::db::{Database, DATE_FORMAT};
use crate::error::{Result, TrackerError};
use crate::models::{NewExpense, DEFAULT_PAYMENT_METHOD, UPI_PAYMENT_METHOD};
use crate::payment::{payable_amount, PaymentRequest, PaymentStub, Settlement, StatusSource};

/// Raw field values of the add-expense form.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ExpenseForm {
    pub(crate) amount: String,
    pub(crate) description: String,
    pub(crate) category: String,
    pub(crate) date: String,
    pub(crate) payment_method: String,
}

impl ExpenseForm {
    pub(crate) fn new() -> Self {
        Self {
            amount: String::new(),
            description: String::new(),
            category: String::new(),
            date: today().format(DATE_FORMAT).to_string(),
            payment_method: DEFAULT_PAYMENT_METHOD.to_string(),
        }
    }

    pub(crate) fn clear(&mut self) {
        *self = Self::new();
    }
}

impl Default for ExpenseForm {
    fn default() -> Self {
        Self::new()
    }
}

/// Result of checking the in-flight payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum PaymentOutcome {
    /// Settled and recorded as the given expense.
    Settled { expense_id: i64 },
    Pending,
}

pub(crate) struct Session<S: StatusSource> {
    db: Database,
    payments: PaymentStub<S>,
    pub(crate) form: ExpenseForm,
    current_transaction: Option<String>,
}

impl<S: StatusSource> Session<S> {
    pub(crate) fn new(db: Database, source: S) -> Self {
        Self {
            db,
            payments: PaymentStub::new(source),
            form: ExpenseForm::new(),
            current_transaction: None,
        }
    }

    pub(crate) fn db(&self) -> &Database {
        &self.db
    }

    pub(crate) fn current_transaction(&self) -> Option<&str> {
        self.current_transaction.as_deref()
    }

    // ── Expenses ──────────────────────────────────────────────

    /// Validate the form, store the expense and reset the form.
    pub(crate) fn submit_expense(&mut self) -> Result<i64> {
        let amount = parse_amount(&self.form.amount)?;
        let description = require_text("description", &self.form.description)?;
        let category_id = self.resolve_category(&self.form.category)?;
        let date = parse_date(&self.form.date)?;
        let payment_method = require_text("payment method", &self.form.payment_method)?;

        let expense = NewExpense::new(amount, description, category_id, date, payment_method);
        let id = self.db.add_expense(&expense)?;
        self.form.clear();
        Ok(id)
    }

    // ── Categories ────────────────────────────────────────────

    pub(crate) fn add_category(&self, name: &str, budget: &str) -> Result<i64> {
        let name = require_text("category name", name)?;
        let budget = parse_budget(budget)?;
        self.db.add_category(&name, budget)
    }

    pub(crate) fn update_budget(&self, category_id: i64, budget: &str) -> Result<()> {
        if budget.trim().is_empty() {
            return Err(TrackerError::invalid_input("budget is required"));
        }
        let budget = parse_budget(budget)?;
        self.db.update_category_budget(category_id, budget)
    }

    fn resolve_category(&self, name: &str) -> Result<i64> {
        let name = require_text("category", name)?;
        self.db
            .find_category_by_name(&name)?
            .map(|c| c.id)
            .ok_or_else(|| TrackerError::invalid_input(format!("unknown category '{name}'")))
    }

    // ── Payments ──────────────────────────────────────────────

    /// Create a QR payment request and make it the in-flight payment.
    ///
    /// `Ok(None)` means the stub could not build the request.
    pub(crate) fn start_payment(
        &mut self,
        amount: &str,
        description: &str,
    ) -> Result<Option<PaymentRequest>> {
        let amount = parse_amount(amount)?;
        if payable_amount(amount) <= Decimal::ZERO {
            return Err(TrackerError::invalid_input("amount is less than one paisa"));
        }
        let description = require_text("description", description)?;
        let request = self
            .payments
            .create_payment_request(&self.db, amount, &description);
        if let Some(req) = &request {
            self.current_transaction = Some(req.transaction_id.clone());
        }
        Ok(request)
    }

    /// Pay for what is typed into the expense form.
    pub(crate) fn pay_from_form(&mut self) -> Result<Option<PaymentRequest>> {
        let amount = self.form.amount.clone();
        let description = self.form.description.clone();
        self.start_payment(&amount, &description)
    }

    /// Make an existing payment request the in-flight one.
    pub(crate) fn resume_payment(&mut self, transaction_id: &str) -> Result<()> {
        if self.db.get_transaction(transaction_id)?.is_none() {
            return Err(TrackerError::not_found(format!("Transaction {transaction_id}")));
        }
        self.current_transaction = Some(transaction_id.to_string());
        Ok(())
    }

    /// Poll the in-flight payment; once settled, record it as an expense in `category`.
    pub(crate) fn check_payment(&mut self, category: &str) -> Result<PaymentOutcome> {
        let transaction_id = self
            .current_transaction
            .clone()
            .ok_or(TrackerError::NoActivePayment)?;
        let category_id = self.resolve_category(category)?;

        if self.payments.check_status(&self.db, &transaction_id)? == Settlement::Pending {
            return Ok(PaymentOutcome::Pending);
        }

        let expense_id = match self.db.find_expense_by_transaction(&transaction_id)? {
            Some(existing) => existing,
            None => {
                let txn = self
                    .db
                    .get_transaction(&transaction_id)?
                    .ok_or_else(|| TrackerError::not_found(format!("Transaction {transaction_id}")))?;
                let expense = NewExpense::new(
                    txn.amount,
                    txn.description,
                    category_id,
                    txn.date,
                    UPI_PAYMENT_METHOD.to_string(),
                )
                .with_transaction(transaction_id.clone());
                self.db.add_expense(&expense)?
            }
        };

        self.current_transaction = None;
        Ok(PaymentOutcome::Settled { expense_id })
    }
}

fn today() -> NaiveDate {
    chrono::Local::now().date_naive()
}
