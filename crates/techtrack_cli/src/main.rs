//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `techtrack_core` linkage and storage bootstrap from a terminal.
//! - Print one deterministic summary line per concern.

use std::process::ExitCode;
use techtrack_core::db::open_db;
use techtrack_core::{
    init_logging, SqliteKvStore, StoreConfig, SystemClock, TechStatus, TechnologyStore,
};

fn main() -> ExitCode {
    println!("techtrack_core ping={}", techtrack_core::ping());
    println!("techtrack_core version={}", techtrack_core::core_version());

    let config = StoreConfig::from_env();
    let log_dir = config.log_dir.to_string_lossy();
    match init_logging(config.log_level, &log_dir) {
        Ok(()) => println!(
            "techtrack_core logging level={} dir={log_dir}",
            config.log_level
        ),
        Err(err) => eprintln!("techtrack_core logging error={err}"),
    }

    let conn = match open_db(&config.db_path) {
        Ok(conn) => conn,
        Err(err) => {
            eprintln!(
                "techtrack_core db_path={} error={err}",
                config.db_path.display()
            );
            return ExitCode::FAILURE;
        }
    };

    let store = TechnologyStore::load_with(
        SqliteKvStore::new(&conn),
        config.storage_key.as_str(),
        SystemClock,
    );
    let stats = store.stats();
    println!("techtrack_core db_path={}", config.db_path.display());
    println!(
        "techtrack_core records={} average_progress={} completion_rate={}",
        stats.total, stats.average_progress, stats.completion_rate
    );
    for status in TechStatus::ALL {
        println!("techtrack_core status.{}={}", status.as_str(), stats.count(status));
    }

    ExitCode::SUCCESS
}
