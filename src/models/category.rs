use rust_decimal::Decimal;

#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub id: i64,
    pub name: String,
    /// Monthly budget, never negative.
    pub budget: Decimal,
}

impl Category {
    /// Find a category by ID in a slice.
    pub fn find_by_id(categories: &[Category], id: i64) -> Option<&Category> {
        categories.iter().find(|c| c.id == id)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// Categories seeded on first initialization, with their starter budgets.
pub(crate) const DEFAULT_CATEGORIES: &[(&str, i64)] = &[
    ("Food", 5000),
    ("Transportation", 3000),
    ("Entertainment", 2000),
    ("Utilities", 4000),
    ("Rent", 15000),
    ("Shopping", 3000),
    ("Healthcare", 2000),
    ("Others", 1000),
];
