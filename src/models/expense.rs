use chrono::NaiveDate;
use rust_decimal::Decimal;

/// Payment methods offered by the front end. The store accepts any tag.
pub const PAYMENT_METHODS: &[&str] = &[
    "Cash",
    "Credit Card",
    "Debit Card",
    "UPI",
    "Bank Transfer",
    "Other",
];

pub const DEFAULT_PAYMENT_METHOD: &str = "Cash";

/// Payment method recorded for expenses settled through the QR flow.
pub const UPI_PAYMENT_METHOD: &str = "UPI";

/// An expense to be inserted.
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub amount: Decimal,
    pub description: String,
    pub category_id: i64,
    pub date: NaiveDate,
    pub payment_method: String,
    pub transaction_id: Option<String>,
}

impl NewExpense {
    pub fn new(
        amount: Decimal,
        description: String,
        category_id: i64,
        date: NaiveDate,
        payment_method: String,
    ) -> Self {
        Self {
            amount,
            description,
            category_id,
            date,
            payment_method,
            transaction_id: None,
        }
    }

    pub fn with_transaction(mut self, transaction_id: String) -> Self {
        self.transaction_id = Some(transaction_id);
        self
    }
}

/// A stored expense joined with its category name.
#[derive(Debug, Clone)]
pub struct Expense {
    pub id: i64,
    pub amount: Decimal,
    pub description: String,
    pub category_id: i64,
    pub category_name: String,
    pub date: NaiveDate,
    pub payment_method: String,
    pub transaction_id: Option<String>,
}

/// Optional constraints for listing expenses. `None` means unconstrained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ExpenseFilter {
    /// Inclusive lower bound.
    pub start_date: Option<NaiveDate>,
    /// Inclusive upper bound.
    pub end_date: Option<NaiveDate>,
    pub category_id: Option<i64>,
}

impl ExpenseFilter {
    pub fn between(start_date: Option<NaiveDate>, end_date: Option<NaiveDate>) -> Self {
        Self {
            start_date,
            end_date,
            category_id: None,
        }
    }

    pub fn in_category(mut self, category_id: i64) -> Self {
        self.category_id = Some(category_id);
        self
    }
}
