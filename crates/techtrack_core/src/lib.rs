//! Core domain logic for the technology learning tracker.
//! This crate is the single source of truth for record invariants.

pub mod clock;
pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod storage;
pub mod store;

pub use clock::{Clock, FixedClock, SystemClock};
pub use config::StoreConfig;
pub use logging::{default_log_level, init_logging, logging_status};
pub use model::form::{validate_new_technology, validate_notes, FormErrors};
pub use model::record::{
    next_status, NewTechnology, RecordId, TechStatus, TechnologyRecord, NOTES_MAX_CHARS,
};
pub use storage::{KvStore, MemoryKvStore, SqliteKvStore, StorageError, StorageResult};
pub use store::export::{export_file_name, ExportDocument, ExportError};
pub use store::import::{ImportError, ImportedRecord};
pub use store::stats::{compute_stats, TechnologyStats};
pub use store::{StoreChange, SubscriptionId, TechnologyStore, DEFAULT_STORAGE_KEY};

/// Minimal health-check API for early integration.
pub fn ping() -> &'static str {
    "pong"
}

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::{core_version, ping};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
