mod category;
mod expense;
mod pending_transaction;
mod summary;

pub use category::Category;
pub(crate) use category::DEFAULT_CATEGORIES;
pub use expense::{
    Expense, ExpenseFilter, NewExpense, DEFAULT_PAYMENT_METHOD, PAYMENT_METHODS,
    UPI_PAYMENT_METHOD,
};
pub use pending_transaction::{PendingTransaction, TransactionStatus};
pub use summary::{CategoryTotal, SpendSummary};
