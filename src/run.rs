mod cli;
mod format;

pub(crate) use cli::{as_cli, split_db_flag};
