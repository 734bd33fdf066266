use anyhow::{Context, Result};
use std::path::Path;

use super::format::{format_amount, format_remaining, truncate};
use crate::config::{expand_home, DB_PATH_VAR, LOG_LEVEL_VAR};
use crate::db::{Database, DATE_FORMAT};
use crate::export::export_expenses;
use crate::models::{Category, ExpenseFilter, SpendSummary, PAYMENT_METHODS};
use crate::payment::{PaymentRequest, StatusSource};
use crate::session::{parse_date, PaymentOutcome, Session};

const DEFAULT_EXPORT_FILE: &str = "expenses_export.csv";

/// Flags that take a value, so their values are not mistaken for positionals.
const VALUE_FLAGS: &[&str] = &["--category", "--date", "--method", "--from", "--to", "--svg"];

pub(crate) fn as_cli<S: StatusSource>(args: &[String], session: &mut Session<S>) -> Result<()> {
    let Some(command) = args.first() else {
        print_usage();
        return Ok(());
    };
    let rest = &args[1..];
    match command.as_str() {
        "categories" | "cats" => cli_categories(session.db()),
        "add-category" => cli_add_category(rest, session),
        "set-budget" => cli_set_budget(rest, session),
        "add" => cli_add(rest, session),
        "list" | "ls" => cli_list(rest, session.db()),
        "summary" | "s" => cli_summary(rest, session.db()),
        "delete" | "rm" => cli_delete(rest, session.db()),
        "export" => cli_export(rest, session.db()),
        "pay" => cli_pay(rest, session),
        "check" => cli_check(rest, session),
        "status" => cli_status(rest, session.db()),
        "payments" => cli_payments(session.db()),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("expense-tracker {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    println!("Expense Tracker — local expense and budget tracker with UPI QR payments");
    println!();
    println!("Usage: expense-tracker [--db <path>] <command>");
    println!();
    println!("Commands:");
    println!("  categories                      List categories and budgets");
    println!("  add-category <name> [budget]    Add a category (budget defaults to 0)");
    println!("  set-budget <category-id> <amt>  Change a category's monthly budget");
    println!("  add <amount> <description>      Record an expense");
    println!("    --category <name>             Category (required)");
    println!("    --date <YYYY-MM-DD>           Date (default: today)");
    println!("    --method <method>             One of: {}", PAYMENT_METHODS.join(", "));
    println!("    --pay                         Pay via UPI QR instead of recording directly");
    println!("  list                            List expenses, newest first");
    println!("    --from/--to <YYYY-MM-DD>      Inclusive date range");
    println!("    --category <name>             Only this category");
    println!("  summary                         Spend vs budget per category (--from/--to)");
    println!("  delete <expense-id>             Delete an expense");
    println!("  export [path]                   Export filtered expenses to CSV (default: {DEFAULT_EXPORT_FILE})");
    println!("  pay <amount> <description>      Generate a UPI QR payment request");
    println!("    --svg <path>                  Also save the QR code as SVG");
    println!("  check <transaction-id>          Check a payment and record it when settled");
    println!("    --category <name>             Category for the expense (default: first)");
    println!("  status <transaction-id>         Show a payment request");
    println!("  payments                        List payment requests");
    println!("  --help, -h                      Show this help");
    println!("  --version, -V                   Show version");
    println!();
    println!("Environment:");
    println!("  {DB_PATH_VAR}              Database file (overridden by --db)");
    println!("  {LOG_LEVEL_VAR}             error, warn, info, debug or trace");
}

// ── Argument helpers ─────────────────────────────────────────

/// Pull a leading-or-anywhere `--db <path>` out of the arguments.
pub(crate) fn split_db_flag(args: &[String]) -> Result<(Option<String>, Vec<String>)> {
    let mut db = None;
    let mut rest = Vec::with_capacity(args.len());
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg == "--db" {
            let Some(path) = iter.next() else {
                anyhow::bail!("Usage: expense-tracker --db <path> <command>");
            };
            db = Some(path.clone());
        } else if let Some(path) = arg.strip_prefix("--db=") {
            db = Some(path.to_string());
        } else {
            rest.push(arg.clone());
        }
    }
    Ok((db, rest))
}

fn flag_value<'a>(args: &'a [String], flag: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == flag)
        .map(|w| w[1].as_str())
}

/// Arguments that are neither flags nor flag values.
fn positionals(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut skip_next = false;
    for arg in args {
        if skip_next {
            skip_next = false;
            continue;
        }
        if arg.starts_with("--") {
            skip_next = VALUE_FLAGS.contains(&arg.as_str());
            continue;
        }
        out.push(arg.as_str());
    }
    out
}

fn parse_filter(args: &[String], db: &Database) -> Result<ExpenseFilter> {
    let start = flag_value(args, "--from").map(parse_date).transpose()?;
    let end = flag_value(args, "--to").map(parse_date).transpose()?;
    let mut filter = ExpenseFilter::between(start, end);
    if let Some(name) = flag_value(args, "--category") {
        let category = db
            .find_category_by_name(name)?
            .ok_or_else(|| anyhow::anyhow!("Category '{name}' not found"))?;
        filter = filter.in_category(category.id);
    }
    Ok(filter)
}

fn parse_id(arg: Option<&str>, usage: &str) -> Result<i64> {
    let arg = arg.ok_or_else(|| anyhow::anyhow!("Usage: expense-tracker {usage}"))?;
    arg.parse()
        .with_context(|| format!("'{arg}' is not a valid id"))
}

// ── Categories ───────────────────────────────────────────────

fn cli_categories(db: &Database) -> Result<()> {
    let categories = db.list_categories()?;
    if categories.is_empty() {
        println!("No categories");
        return Ok(());
    }

    println!("{:<4} {:<20} {:>14}", "ID", "Name", "Budget");
    println!("{}", "─".repeat(40));
    for cat in &categories {
        println!(
            "{:<4} {:<20} {:>14}",
            cat.id,
            truncate(&cat.name, 20),
            format_amount(cat.budget)
        );
    }
    Ok(())
}

fn cli_add_category<S: StatusSource>(args: &[String], session: &Session<S>) -> Result<()> {
    let pos = positionals(args);
    let name = pos
        .first()
        .ok_or_else(|| anyhow::anyhow!("Usage: expense-tracker add-category <name> [budget]"))?;
    let budget = pos.get(1).copied().unwrap_or("");
    let id = session.add_category(name, budget)?;
    println!("Added category {id}: {}", name.trim());
    Ok(())
}

fn cli_set_budget<S: StatusSource>(args: &[String], session: &Session<S>) -> Result<()> {
    let pos = positionals(args);
    let usage = "set-budget <category-id> <budget>";
    let id = parse_id(pos.first().copied(), usage)?;
    let budget = pos
        .get(1)
        .ok_or_else(|| anyhow::anyhow!("Usage: expense-tracker {usage}"))?;
    session.update_budget(id, budget)?;

    let categories = session.db().list_categories()?;
    if let Some(cat) = Category::find_by_id(&categories, id) {
        println!("Budget for {cat} is now {}", format_amount(cat.budget));
    }
    Ok(())
}

// ── Expenses ─────────────────────────────────────────────────

fn cli_add<S: StatusSource>(args: &[String], session: &mut Session<S>) -> Result<()> {
    let pos = positionals(args);
    let usage = "Usage: expense-tracker add <amount> <description> --category <name>";
    let (Some(amount), Some(description)) = (pos.first(), pos.get(1)) else {
        anyhow::bail!(usage);
    };
    let Some(category) = flag_value(args, "--category") else {
        let names: Vec<String> = session
            .db()
            .list_categories()?
            .into_iter()
            .map(|c| c.name)
            .collect();
        anyhow::bail!("{usage}\nCategories: {}", names.join(", "));
    };

    session.form.amount = amount.to_string();
    session.form.description = description.to_string();
    session.form.category = category.to_string();
    if let Some(date) = flag_value(args, "--date") {
        session.form.date = date.to_string();
    }
    if let Some(method) = flag_value(args, "--method") {
        session.form.payment_method = method.to_string();
    }

    if args.iter().any(|a| a == "--pay") {
        let Some(request) = session.pay_from_form()? else {
            anyhow::bail!("Failed to generate UPI QR code");
        };
        return print_request(&request, flag_value(args, "--svg"));
    }

    let id = session.submit_expense()?;
    println!("Added expense {id}");
    Ok(())
}

fn cli_list(args: &[String], db: &Database) -> Result<()> {
    let filter = parse_filter(args, db)?;
    let expenses = db.list_expenses(&filter)?;
    if expenses.is_empty() {
        println!("No expenses");
        return Ok(());
    }

    println!(
        "{:<5} {:<10} {:>14} {:<16} {:<13} Description",
        "ID", "Date", "Amount", "Category", "Method"
    );
    println!("{}", "─".repeat(80));
    for e in &expenses {
        let upi = if e.transaction_id.is_some() { "*" } else { " " };
        println!(
            "{:<5}{upi}{:<10} {:>14} {:<16} {:<13} {}",
            e.id,
            e.date.format(DATE_FORMAT),
            format_amount(e.amount),
            truncate(&e.category_name, 16),
            truncate(&e.payment_method, 13),
            truncate(&e.description, 30),
        );
    }
    let total: rust_decimal::Decimal = expenses.iter().map(|e| e.amount).sum();
    let mut category_ids: Vec<i64> = expenses.iter().map(|e| e.category_id).collect();
    category_ids.sort_unstable();
    category_ids.dedup();
    println!("{}", "─".repeat(80));
    println!(
        "{} expenses in {} categories, {}",
        expenses.len(),
        category_ids.len(),
        format_amount(total)
    );
    if expenses.iter().any(|e| e.transaction_id.is_some()) {
        println!("* paid via UPI QR");
    }
    Ok(())
}

fn cli_summary(args: &[String], db: &Database) -> Result<()> {
    let start = flag_value(args, "--from").map(parse_date).transpose()?;
    let end = flag_value(args, "--to").map(parse_date).transpose()?;
    let totals = db.category_totals(start, end)?;
    let summary = SpendSummary::from_totals(&totals);

    let range = match (start, end) {
        (None, None) => "all time".to_string(),
        (s, e) => format!(
            "{} to {}",
            s.map_or("…".to_string(), |d| d.to_string()),
            e.map_or("…".to_string(), |d| d.to_string())
        ),
    };
    println!("Spending summary — {range}");
    println!("{}", "─".repeat(64));
    println!(
        "  {:<20} {:>13} {:>13} {:>13}",
        "Category", "Spent", "Budget", "Remaining"
    );
    for t in &totals {
        let marker = if t.is_over_budget() { " !" } else { "" };
        println!(
            "  {:<20} {:>13} {:>13} {:>13}{marker}",
            truncate(&t.name, 20),
            format_amount(t.total),
            format_amount(t.budget),
            format_remaining(t.remaining()),
        );
    }
    println!("{}", "─".repeat(64));
    println!(
        "  {:<20} {:>13} {:>13} {:>13}",
        "TOTAL",
        format_amount(summary.total_spent),
        format_amount(summary.total_budget),
        format_remaining(summary.remaining()),
    );
    println!();
    println!("  Recorded expenses: {}", db.expense_count()?);
    Ok(())
}

fn cli_delete(args: &[String], db: &Database) -> Result<()> {
    let id = parse_id(positionals(args).first().copied(), "delete <expense-id>")?;
    db.delete_expense(id)?;
    println!("Deleted expense {id}");
    Ok(())
}

fn cli_export(args: &[String], db: &Database) -> Result<()> {
    let output = positionals(args)
        .first()
        .map(|p| expand_home(p))
        .unwrap_or_else(|| DEFAULT_EXPORT_FILE.to_string());
    let filter = parse_filter(args, db)?;

    let (path, count) = export_expenses(db, Path::new(&output), &filter)
        .with_context(|| format!("Failed to export expenses to {output}"))?;
    if count == 0 {
        println!("No expenses matched; wrote header only to {}", path.display());
    } else {
        println!("Exported {count} expenses to {}", path.display());
    }
    Ok(())
}

// ── Payments ─────────────────────────────────────────────────

fn cli_pay<S: StatusSource>(args: &[String], session: &mut Session<S>) -> Result<()> {
    let pos = positionals(args);
    let (Some(amount), Some(description)) = (pos.first(), pos.get(1)) else {
        anyhow::bail!("Usage: expense-tracker pay <amount> <description> [--svg <path>]");
    };

    let Some(request) = session.start_payment(amount, description)? else {
        anyhow::bail!("Failed to generate UPI QR code");
    };
    print_request(&request, flag_value(args, "--svg"))
}

fn print_request(request: &PaymentRequest, svg_path: Option<&str>) -> Result<()> {
    println!("{}", request.qr.to_terminal());
    println!("Scan the QR code with any UPI app to pay.");
    println!("  Transaction: {}", request.transaction_id);
    println!("  URI:         {}", request.uri);
    println!("  QR size:     {0}x{0} modules", request.qr.width());

    if let Some(svg_path) = svg_path {
        let svg_path = expand_home(svg_path);
        std::fs::write(&svg_path, request.qr.to_svg())
            .with_context(|| format!("Failed to write QR code to {svg_path}"))?;
        println!("  Saved QR:    {svg_path}");
    }

    println!();
    println!(
        "Run `expense-tracker check {}` once paid.",
        request.transaction_id
    );
    Ok(())
}

fn cli_check<S: StatusSource>(args: &[String], session: &mut Session<S>) -> Result<()> {
    let Some(id) = positionals(args).first().map(|s| s.to_string()) else {
        anyhow::bail!("Usage: expense-tracker check <transaction-id> [--category <name>]");
    };
    let category = match flag_value(args, "--category") {
        Some(name) => name.to_string(),
        None => session
            .db()
            .list_categories()?
            .into_iter()
            .next()
            .map(|c| c.name)
            .ok_or_else(|| anyhow::anyhow!("No categories to record the payment under"))?,
    };

    session.resume_payment(&id)?;
    match session.check_payment(&category)? {
        PaymentOutcome::Settled { expense_id } => {
            println!("Payment successful. Recorded as expense {expense_id} in {category}.");
        }
        PaymentOutcome::Pending => {
            println!("Payment is still pending. Try checking again after a few moments.");
            if let Some(id) = session.current_transaction() {
                println!("  Waiting on: {id}");
            }
        }
    }
    Ok(())
}

fn cli_status(args: &[String], db: &Database) -> Result<()> {
    let Some(id) = positionals(args).first().copied() else {
        anyhow::bail!("Usage: expense-tracker status <transaction-id>");
    };
    let txn = db
        .get_transaction(id)?
        .ok_or_else(|| anyhow::anyhow!("Transaction {id} not found"))?;

    println!("Transaction: {}", txn.transaction_id);
    println!("  Amount:      {}", format_amount(txn.amount));
    println!("  Description: {}", txn.description);
    println!("  Status:      {}", txn.status);
    println!("  Date:        {}", txn.date);
    if let Some(expense_id) = db.find_expense_by_transaction(id)? {
        println!("  Expense:     {expense_id}");
    }
    Ok(())
}

fn cli_payments(db: &Database) -> Result<()> {
    let txns = db.list_transactions()?;
    if txns.is_empty() {
        println!("No payment requests");
        return Ok(());
    }

    println!(
        "{:<36}  {:<10} {:>14} {:<10} Description",
        "Transaction", "Date", "Amount", "Status"
    );
    println!("{}", "─".repeat(90));
    for t in &txns {
        println!(
            "{:<36}  {:<10} {:>14} {:<10} {}",
            t.transaction_id,
            t.date.format(DATE_FORMAT),
            format_amount(t.amount),
            t.status.as_str(),
            truncate(&t.description, 24),
        );
    }
    Ok(())
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
