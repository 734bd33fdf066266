use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub(crate) const DB_PATH_VAR: &str = "EXPENSE_TRACKER_DB";
pub(crate) const LOG_LEVEL_VAR: &str = "EXPENSE_TRACKER_LOG";
const DB_FILE_NAME: &str = "expense_tracker.db";

/// Settings resolved once at startup.
#[derive(Debug, Clone)]
pub(crate) struct AppConfig {
    pub(crate) db_path: PathBuf,
    pub(crate) log_level: log::LevelFilter,
}

impl AppConfig {
    /// `--db` beats the environment, which beats the platform data directory.
    pub(crate) fn resolve(db_flag: Option<&str>) -> Result<Self> {
        let env_path = std::env::var(DB_PATH_VAR).ok();
        let db_path = match pick_db_path(db_flag, env_path.as_deref()) {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    ensure_dir(parent)?;
                }
                path
            }
            None => default_db_path()?,
        };
        let log_level = parse_log_level(std::env::var(LOG_LEVEL_VAR).ok().as_deref());
        Ok(Self { db_path, log_level })
    }
}

fn pick_db_path(flag: Option<&str>, env: Option<&str>) -> Option<PathBuf> {
    flag.or(env)
        .map(str::trim)
        .filter(|p| !p.is_empty())
        .map(|p| PathBuf::from(expand_home(p)))
}

fn default_db_path() -> Result<PathBuf> {
    let proj_dirs = directories::ProjectDirs::from("com", "expense-tracker", "ExpenseTracker")
        .ok_or_else(|| anyhow::anyhow!("Could not determine data directory"))?;
    let data_dir = proj_dirs.data_dir();
    ensure_dir(data_dir)?;
    Ok(data_dir.join(DB_FILE_NAME))
}

fn ensure_dir(dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create data directory: {}", dir.display()))
}

pub(crate) fn parse_log_level(value: Option<&str>) -> log::LevelFilter {
    match value.map(|v| v.trim().to_lowercase()).as_deref() {
        Some("off") => log::LevelFilter::Off,
        Some("error") => log::LevelFilter::Error,
        Some("info") => log::LevelFilter::Info,
        Some("debug") => log::LevelFilter::Debug,
        Some("trace") => log::LevelFilter::Trace,
        _ => log::LevelFilter::Warn,
    }
}

pub(crate) fn init_logging(level: log::LevelFilter) {
    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp_secs()
        .format_module_path(false)
        .format_target(false)
        .init();
    log::debug!("Logging initialised at {level}");
}

pub(crate) fn expand_home(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}
