use chrono::NaiveDate;
use rust_decimal::Decimal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionStatus {
    Pending,
    Completed,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Completed => "completed",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pending" => Some(Self::Pending),
            "completed" => Some(Self::Completed),
            _ => None,
        }
    }

    /// Status only moves forward: pending may become completed, never the reverse.
    pub fn can_become(&self, next: TransactionStatus) -> bool {
        !matches!((self, next), (Self::Completed, Self::Pending))
    }
}

impl std::fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A simulated payment request awaiting settlement.
#[derive(Debug, Clone)]
pub struct PendingTransaction {
    pub transaction_id: String,
    pub amount: Decimal,
    pub description: String,
    pub status: TransactionStatus,
    pub date: NaiveDate,
}

impl PendingTransaction {
    pub fn is_completed(&self) -> bool {
        self.status == TransactionStatus::Completed
    }
}
