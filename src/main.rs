mod config;
mod db;
mod error;
mod export;
mod models;
mod payment;
mod run;
mod session;

use anyhow::{Context, Result};

fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let (db_flag, args) = run::split_db_flag(args.get(1..).unwrap_or(&[]))?;

    let config = config::AppConfig::resolve(db_flag.as_deref())?;
    config::init_logging(config.log_level);

    let db = db::Database::open(&config.db_path)
        .with_context(|| format!("Failed to open database: {}", config.db_path.display()))?;
    let mut session = session::Session::new(db, payment::RandomStatusSource::default());

    run::as_cli(&args, &mut session)
}
