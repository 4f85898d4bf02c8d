//! CLI smoke entry point.
//!
//! # Responsibility
//! - Provide a minimal executable to verify `vacation_core` linkage.
//! - Optionally dump the user directory of a database file as JSON.
//!
//! Usage: `vacation_cli [DB_PATH] [LOG_DIR]`

use log::error;
use std::process::ExitCode;
use vacation_core::{default_log_level, init_logging, open_db, DbContext, LogConfig, UserService};

fn main() -> ExitCode {
    println!("vacation_core ping={}", vacation_core::ping());
    println!("vacation_core version={}", vacation_core::core_version());

    let mut args = std::env::args().skip(1);
    let Some(db_path) = args.next() else {
        return ExitCode::SUCCESS;
    };

    if let Some(log_dir) = args.next() {
        if let Err(err) = init_logging(&LogConfig::new(default_log_level(), log_dir)) {
            eprintln!("logging disabled: {err}");
        }
    }

    match list_users(&db_path) {
        Ok(json) => {
            println!("{json}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            error!("event=cli_list_users module=cli status=error error={err}");
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

fn list_users(db_path: &str) -> Result<String, Box<dyn std::error::Error>> {
    let conn = open_db(db_path)?;
    let context = DbContext::new(&conn);
    let users = UserService::new(&context).list_users()?;
    Ok(serde_json::to_string_pretty(&users)?)
}
