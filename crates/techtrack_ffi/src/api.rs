//! FFI use-case API for Flutter-facing calls.
//!
//! # Responsibility
//! - Expose store operations to Dart via FRB as flat, stable envelopes.
//! - Run caller-side validation (form rules, notes limit) before mutating.
//!
//! # Invariants
//! - Exported functions must not panic across the FFI boundary.
//! - Calls are serialized process-wide; each call loads, mutates and writes
//!   the store under one lock so concurrent isolates never lose updates.

use std::sync::{Mutex, OnceLock, PoisonError};
use techtrack_core::db::open_db;
use techtrack_core::{
    core_version as core_version_inner, export_file_name, init_logging as init_logging_inner,
    ping as ping_inner, validate_new_technology, validate_notes, Clock, NewTechnology, RecordId,
    SqliteKvStore, StoreConfig, SystemClock, TechStatus, TechnologyRecord, TechnologyStats,
    TechnologyStore,
};

static STORE_CONFIG: OnceLock<StoreConfig> = OnceLock::new();
static STORE_LOCK: Mutex<()> = Mutex::new(());

/// Unknown ids are a no-op, reported as `ok` with `affected == 0`.
const NO_MATCH_MESSAGE: &str = "No matching technology; nothing changed.";

/// Minimal health-check API for FRB smoke integration.
#[flutter_rust_bridge::frb(sync)]
pub fn ping() -> String {
    ping_inner().to_owned()
}

/// Expose core crate version through FFI.
#[flutter_rust_bridge::frb(sync)]
pub fn core_version() -> String {
    core_version_inner().to_owned()
}

/// Initializes Rust core logging once per process.
///
/// Returns an empty string on success and an error message on failure.
/// Safe to call repeatedly with the same `level + log_dir`. A blank `level`
/// uses the configured one (`TECHTRACK_LOG_LEVEL` or the build default).
#[flutter_rust_bridge::frb(sync)]
pub fn init_logging(level: String, log_dir: String) -> String {
    let level = match level.trim() {
        "" => resolve_store_config().log_level,
        explicit => explicit,
    };
    match init_logging_inner(level, log_dir.as_str()) {
        Ok(()) => String::new(),
        Err(err) => err,
    }
}

/// Flat projection of one record for UI rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TechItem {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: String,
    /// `planned|in-progress|completed|paused`.
    pub status: String,
    pub progress: u32,
    pub notes: String,
    pub started_at: String,
    pub completed_at: String,
    pub created_at: String,
    pub deadline: String,
    pub resources: Vec<String>,
}

impl From<&TechnologyRecord> for TechItem {
    fn from(record: &TechnologyRecord) -> Self {
        Self {
            id: record.id,
            title: record.title.clone(),
            description: record.description.clone(),
            category: record.category.clone(),
            difficulty: record.difficulty.clone(),
            status: record.status.as_str().to_string(),
            progress: u32::from(record.progress),
            notes: record.notes.clone(),
            started_at: record.started_at.clone(),
            completed_at: record.completed_at.clone(),
            created_at: record.created_at.clone(),
            deadline: record.deadline.clone(),
            resources: record.resources.clone(),
        }
    }
}

/// List/search response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TechListResponse {
    pub items: Vec<TechItem>,
    /// Human-readable response message for diagnostics.
    pub message: String,
}

/// Generic mutation response envelope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TechActionResponse {
    pub ok: bool,
    /// Affected record id, when the action targets or creates one.
    pub id: Option<i64>,
    /// Number of records touched.
    pub affected: u32,
    pub message: String,
}

impl TechActionResponse {
    fn success(message: impl Into<String>, id: Option<RecordId>, affected: usize) -> Self {
        Self {
            ok: true,
            id,
            affected: u32::try_from(affected).unwrap_or(u32::MAX),
            message: message.into(),
        }
    }

    fn failure(message: impl Into<String>) -> Self {
        Self {
            ok: false,
            id: None,
            affected: 0,
            message: message.into(),
        }
    }
}

/// Aggregate counters for dashboards.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TechStatsResponse {
    pub total: u32,
    pub planned: u32,
    pub in_progress: u32,
    pub completed: u32,
    pub paused: u32,
    pub average_progress: u32,
    pub completion_rate: u32,
}

impl From<TechnologyStats> for TechStatsResponse {
    fn from(stats: TechnologyStats) -> Self {
        let count = |value: usize| u32::try_from(value).unwrap_or(u32::MAX);
        Self {
            total: count(stats.total),
            planned: count(stats.planned),
            in_progress: count(stats.in_progress),
            completed: count(stats.completed),
            paused: count(stats.paused),
            average_progress: u32::from(stats.average_progress),
            completion_rate: u32::from(stats.completion_rate),
        }
    }
}

/// Export payload plus the suggested download file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TechExportResponse {
    pub ok: bool,
    pub file_name: String,
    pub json: String,
    pub message: String,
}

/// Lists all records in insertion order.
#[flutter_rust_bridge::frb(sync)]
pub fn tech_list() -> TechListResponse {
    tech_search(String::new())
}

/// Case-insensitive search over title, description and category.
#[flutter_rust_bridge::frb(sync)]
pub fn tech_search(term: String) -> TechListResponse {
    match with_store(|store| store.search(&term).map(TechItem::from).collect::<Vec<_>>()) {
        Ok(items) => {
            let message = if items.is_empty() {
                "No results.".to_string()
            } else {
                format!("Found {} technology(ies).", items.len())
            };
            TechListResponse { items, message }
        }
        Err(err) => TechListResponse {
            items: Vec::new(),
            message: format!("tech_search failed: {err}"),
        },
    }
}

/// Reads one record; `None` when missing or storage is unavailable.
#[flutter_rust_bridge::frb(sync)]
pub fn tech_get(id: i64) -> Option<TechItem> {
    with_store(|store| store.get(id).map(TechItem::from))
        .ok()
        .flatten()
}

/// Validates form input and appends a new `planned` record.
#[flutter_rust_bridge::frb(sync)]
pub fn tech_add(
    title: String,
    description: String,
    category: String,
    difficulty: Option<String>,
    deadline: Option<String>,
    resources: Vec<String>,
) -> TechActionResponse {
    let fields = NewTechnology {
        title,
        description,
        category,
        difficulty: difficulty.unwrap_or_default(),
        deadline: deadline.unwrap_or_default(),
        resources,
    };
    if let Err(errors) = validate_new_technology(&fields, SystemClock.today()) {
        return TechActionResponse::failure(format!("tech_add rejected: {errors}"));
    }

    match with_store(|store| store.add(fields)) {
        Ok(Some(id)) => TechActionResponse::success("Technology added.", Some(id), 1),
        Ok(None) => TechActionResponse::failure("tech_add rejected: record was not added"),
        Err(err) => TechActionResponse::failure(format!("tech_add failed: {err}")),
    }
}

/// Sets one record's status (`planned|in-progress|completed|paused`).
#[flutter_rust_bridge::frb(sync)]
pub fn tech_update_status(id: i64, status: String) -> TechActionResponse {
    let Some(status) = TechStatus::parse(&status) else {
        return TechActionResponse::failure(format!("unknown status `{status}`"));
    };
    single_record_action("tech_update_status", id, "Status updated.", |store| {
        store.update_status(id, status)
    })
}

/// Advances one record along `planned -> in-progress -> completed -> paused`.
#[flutter_rust_bridge::frb(sync)]
pub fn tech_cycle_status(id: i64) -> TechActionResponse {
    match with_store(|store| store.cycle_status(id)) {
        Ok(Some(status)) => {
            TechActionResponse::success(format!("Status is now {}.", status.as_str()), Some(id), 1)
        }
        Ok(None) => TechActionResponse::success(NO_MATCH_MESSAGE, Some(id), 0),
        Err(err) => TechActionResponse::failure(format!("tech_cycle_status failed: {err}")),
    }
}

/// Sets progress; values outside 0..=100 are clamped.
#[flutter_rust_bridge::frb(sync)]
pub fn tech_update_progress(id: i64, progress: i64) -> TechActionResponse {
    single_record_action("tech_update_progress", id, "Progress updated.", |store| {
        store.update_progress(id, progress)
    })
}

/// Replaces notes after checking the editor length limit.
#[flutter_rust_bridge::frb(sync)]
pub fn tech_update_notes(id: i64, notes: String) -> TechActionResponse {
    if let Err(errors) = validate_notes(&notes) {
        return TechActionResponse::failure(format!("tech_update_notes rejected: {errors}"));
    }
    single_record_action("tech_update_notes", id, "Notes saved.", |store| {
        store.update_notes(id, notes)
    })
}

/// Deletes one record. Deleting a missing record still reports success.
#[flutter_rust_bridge::frb(sync)]
pub fn tech_remove(id: i64) -> TechActionResponse {
    match with_store(|store| store.remove(id)) {
        Ok(removed) => {
            TechActionResponse::success("Technology removed.", Some(id), usize::from(removed))
        }
        Err(err) => TechActionResponse::failure(format!("tech_remove failed: {err}")),
    }
}

/// Sets the same status on every listed record with a single write.
#[flutter_rust_bridge::frb(sync)]
pub fn tech_bulk_update_status(ids: Vec<i64>, status: String) -> TechActionResponse {
    let Some(status) = TechStatus::parse(&status) else {
        return TechActionResponse::failure(format!("unknown status `{status}`"));
    };
    if ids.is_empty() {
        return TechActionResponse::failure("no technologies selected");
    }
    match with_store(|store| store.bulk_update_status(&ids, status)) {
        Ok(applied) => TechActionResponse::success(
            format!("Updated {} technology(ies).", applied.len()),
            None,
            applied.len(),
        ),
        Err(err) => TechActionResponse::failure(format!("tech_bulk_update_status failed: {err}")),
    }
}

/// Completes every record.
#[flutter_rust_bridge::frb(sync)]
pub fn tech_mark_all_completed() -> TechActionResponse {
    match with_store(|store| {
        store.mark_all_completed();
        store.len()
    }) {
        Ok(count) => TechActionResponse::success("All technologies completed.", None, count),
        Err(err) => TechActionResponse::failure(format!("tech_mark_all_completed failed: {err}")),
    }
}

/// Returns every record to `planned`.
#[flutter_rust_bridge::frb(sync)]
pub fn tech_reset_all_statuses() -> TechActionResponse {
    match with_store(|store| {
        store.reset_all_statuses();
        store.len()
    }) {
        Ok(count) => TechActionResponse::success("All statuses reset.", None, count),
        Err(err) => TechActionResponse::failure(format!("tech_reset_all_statuses failed: {err}")),
    }
}

/// Imports a JSON file body (bare array or export document).
#[flutter_rust_bridge::frb(sync)]
pub fn tech_import_json(text: String) -> TechActionResponse {
    match with_store(|store| store.import_json(&text)) {
        Ok(Ok(ids)) => TechActionResponse::success(
            format!("Imported {} technology(ies).", ids.len()),
            None,
            ids.len(),
        ),
        Ok(Err(err)) => TechActionResponse::failure(format!("tech_import_json rejected: {err}")),
        Err(err) => TechActionResponse::failure(format!("tech_import_json failed: {err}")),
    }
}

/// Serializes the store for download.
///
/// `with_metadata = false` yields the bare record array;
/// `true` yields the export document with counters.
#[flutter_rust_bridge::frb(sync)]
pub fn tech_export_json(with_metadata: bool) -> TechExportResponse {
    let file_name = export_file_name(SystemClock.today());
    let exported = with_store(|store| {
        if with_metadata {
            store.export_document()
        } else {
            store.export_snapshot()
        }
    });
    match exported {
        Ok(Ok(json)) => TechExportResponse {
            ok: true,
            file_name,
            json,
            message: "Export ready.".to_string(),
        },
        Ok(Err(err)) => export_failure(file_name, err.to_string()),
        Err(err) => export_failure(file_name, err),
    }
}

/// Per-status counts and progress aggregates.
#[flutter_rust_bridge::frb(sync)]
pub fn tech_stats() -> TechStatsResponse {
    with_store(|store| store.stats())
        .map(TechStatsResponse::from)
        .unwrap_or_default()
}

fn export_failure(file_name: String, error: String) -> TechExportResponse {
    TechExportResponse {
        ok: false,
        file_name,
        json: String::new(),
        message: format!("tech_export_json failed: {error}"),
    }
}

fn single_record_action(
    operation: &str,
    id: RecordId,
    message: &str,
    f: impl FnOnce(&mut TechnologyStore<SqliteKvStore<'_>>) -> bool,
) -> TechActionResponse {
    match with_store(f) {
        Ok(true) => TechActionResponse::success(message, Some(id), 1),
        Ok(false) => TechActionResponse::success(NO_MATCH_MESSAGE, Some(id), 0),
        Err(err) => TechActionResponse::failure(format!("{operation} failed: {err}")),
    }
}

fn resolve_store_config() -> &'static StoreConfig {
    STORE_CONFIG.get_or_init(StoreConfig::from_env)
}

fn with_store<T>(
    f: impl FnOnce(&mut TechnologyStore<SqliteKvStore<'_>>) -> T,
) -> Result<T, String> {
    let _guard = STORE_LOCK.lock().unwrap_or_else(PoisonError::into_inner);
    let config = resolve_store_config();
    let conn = open_db(&config.db_path).map_err(|err| format!("store DB open failed: {err}"))?;
    let mut store = TechnologyStore::load_with(
        SqliteKvStore::new(&conn),
        config.storage_key.as_str(),
        SystemClock,
    );
    Ok(f(&mut store))
}

#[cfg(test)]
mod tests {
    use super::{
        core_version, init_logging, ping, resolve_store_config, tech_add,
        tech_bulk_update_status, tech_cycle_status, tech_export_json, tech_get,
        tech_import_json, tech_remove, tech_search, tech_stats, tech_update_notes,
        tech_update_progress, tech_update_status,
    };
    use std::time::{SystemTime, UNIX_EPOCH};

    #[test]
    fn ping_returns_pong() {
        assert_eq!(ping(), "pong");
    }

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }

    #[test]
    fn init_logging_rejects_bad_input() {
        assert!(!init_logging("info".to_string(), String::new()).is_empty());
        assert!(!init_logging("verbose".to_string(), "tmp/logs".to_string()).is_empty());
    }

    #[test]
    fn blank_level_falls_back_to_configured_level() {
        let dir = std::env::temp_dir().join(unique_token("ffi-logs"));
        let dir = dir.to_string_lossy().into_owned();
        let configured = resolve_store_config().log_level;

        assert_eq!(init_logging(String::new(), dir.clone()), "");
        assert_eq!(init_logging(configured.to_string(), dir.clone()), "");

        let other = if configured == "error" { "trace" } else { "error" };
        assert!(!init_logging(other.to_string(), dir).is_empty());
    }

    #[test]
    fn add_then_search_finds_record() {
        let token = unique_token("ffi-search");
        let id = add_record(&token);

        let response = tech_search(token.to_uppercase());
        assert_eq!(response.items.len(), 1);
        assert_eq!(response.items[0].id, id);
        assert_eq!(response.items[0].status, "planned");
    }

    #[test]
    fn add_rejects_invalid_form() {
        let response = tech_add(
            "x".to_string(),
            "short".to_string(),
            String::new(),
            None,
            Some("1999-01-01".to_string()),
            vec!["not a url".to_string()],
        );
        assert!(!response.ok);
        assert!(response.message.contains("title"));
        assert!(response.message.contains("deadline"));
    }

    #[test]
    fn status_and_progress_updates_keep_invariants() {
        let id = add_record(&unique_token("ffi-status"));

        assert!(tech_update_progress(id, 100).ok);
        let item = tech_get(id).expect("record exists");
        assert_eq!(item.status, "completed");
        assert!(!item.completed_at.is_empty());

        assert!(tech_update_status(id, "paused".to_string()).ok);
        let item = tech_get(id).expect("record exists");
        assert_eq!(item.completed_at, "");
        assert!(item.progress < 100);

        let unknown = tech_update_status(id, "not-started".to_string());
        assert!(!unknown.ok);
        assert!(unknown.message.contains("unknown status"));
    }

    #[test]
    fn cycle_and_bulk_update() {
        let first = add_record(&unique_token("ffi-bulk-a"));
        let second = add_record(&unique_token("ffi-bulk-b"));

        let cycled = tech_cycle_status(first);
        assert!(cycled.ok, "{}", cycled.message);
        assert_eq!(tech_get(first).unwrap().status, "in-progress");

        let bulk = tech_bulk_update_status(vec![first, second, -7], "completed".to_string());
        assert!(bulk.ok);
        assert_eq!(bulk.affected, 2);
        assert_eq!(tech_get(second).unwrap().progress, 100);
    }

    #[test]
    fn notes_limit_is_enforced_before_store() {
        let id = add_record(&unique_token("ffi-notes"));

        assert!(!tech_update_notes(id, "n".repeat(1001)).ok);
        assert!(tech_update_notes(id, "learned lifetimes".to_string()).ok);
        assert_eq!(tech_get(id).unwrap().notes, "learned lifetimes");
    }

    #[test]
    fn unknown_ids_are_no_ops_and_remove_is_idempotent() {
        let id = add_record(&unique_token("ffi-remove"));

        let first = tech_remove(id);
        let second = tech_remove(id);
        assert!(first.ok && second.ok);
        assert_eq!(first.affected, 1);
        assert_eq!(second.affected, 0);
        assert!(tech_get(id).is_none());

        for response in [
            tech_update_progress(id, 10),
            tech_update_status(id, "paused".to_string()),
            tech_update_notes(id, "gone".to_string()),
            tech_cycle_status(id),
        ] {
            assert!(response.ok, "{}", response.message);
            assert_eq!(response.affected, 0);
        }
        assert!(tech_get(id).is_none());
    }

    #[test]
    fn import_and_export_round_trip() {
        let token = unique_token("ffi-import");
        let payload = format!(r#"[{{"id": 1, "title": "{token}", "category": "imported"}}]"#);

        let imported = tech_import_json(payload);
        assert!(imported.ok, "{}", imported.message);
        assert_eq!(imported.affected, 1);

        let rejected = tech_import_json(r#"{"nope": true}"#.to_string());
        assert!(!rejected.ok);

        let export = tech_export_json(true);
        assert!(export.ok);
        assert!(export.file_name.starts_with("technologies_"));
        assert!(export.json.contains(&token));
        assert!(tech_stats().total >= 1);
    }

    fn add_record(title: &str) -> i64 {
        let response = tech_add(
            title.to_string(),
            "Description long enough".to_string(),
            "testing".to_string(),
            None,
            None,
            Vec::new(),
        );
        assert!(response.ok, "{}", response.message);
        response.id.expect("add should return id")
    }

    fn unique_token(prefix: &str) -> String {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("time went backwards")
            .as_nanos();
        format!("{prefix}-{nanos}")
    }
}
