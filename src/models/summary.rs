use rust_decimal::Decimal;

/// Spend against budget for one category over a date range.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category_id: i64,
    pub name: String,
    pub total: Decimal,
    pub budget: Decimal,
}

impl CategoryTotal {
    /// Budget left; negative when the category is over budget.
    pub fn remaining(&self) -> Decimal {
        self.budget - self.total
    }

    pub fn is_over_budget(&self) -> bool {
        self.total > self.budget
    }
}

/// Totals across every row of a category breakdown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SpendSummary {
    pub total_spent: Decimal,
    pub total_budget: Decimal,
}

impl SpendSummary {
    pub fn from_totals(totals: &[CategoryTotal]) -> Self {
        totals.iter().fold(Self::default(), |acc, t| Self {
            total_spent: acc.total_spent + t.total,
            total_budget: acc.total_budget + t.budget,
        })
    }

    pub fn remaining(&self) -> Decimal {
        self.total_budget - self.total_spent
    }
}
