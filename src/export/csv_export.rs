use std::io::Write;
use std::path::{Path, PathBuf};

use crate::db::{Database, DATE_FORMAT};
use crate::error::Result;
use crate::models::{Expense, ExpenseFilter};

/// Column order of the export. Consumers rely on it.
pub(crate) const EXPORT_HEADER: [&str; 6] = [
    "ID",
    "Amount",
    "Description",
    "Category",
    "Date",
    "Payment Method",
];

/// Append `.csv` unless the path already ends with it.
pub(crate) fn with_csv_extension(path: &Path) -> PathBuf {
    let has_ext = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
    if has_ext {
        path.to_path_buf()
    } else {
        let mut name = path.as_os_str().to_owned();
        name.push(".csv");
        PathBuf::from(name)
    }
}

/// Write the expenses matching `filter` to a CSV file. Returns the path written and the row count.
pub(crate) fn export_expenses(
    db: &Database,
    path: &Path,
    filter: &ExpenseFilter,
) -> Result<(PathBuf, usize)> {
    let path = with_csv_extension(path);
    let expenses = db.list_expenses(filter)?;
    let file = std::fs::File::create(&path)?;
    write_expenses(file, &expenses)?;
    log::info!("Exported {} expenses to {}", expenses.len(), path.display());
    Ok((path, expenses.len()))
}

pub(crate) fn write_expenses<W: Write>(writer: W, expenses: &[Expense]) -> Result<()> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(EXPORT_HEADER)?;
    for e in expenses {
        wtr.write_record([
            e.id.to_string(),
            e.amount.to_string(),
            e.description.clone(),
            e.category_name.clone(),
            e.date.format(DATE_FORMAT).to_string(),
            e.payment_method.clone(),
        ])?;
    }
    wtr.flush()?;
    Ok(())
}

#[cfg(test)]
#[path = "csv_export_tests.rs"]
mod tests;
