//! Technology record store.
//!
//! # Responsibility
//! - Own the ordered record list; no other component holds a writable copy.
//! - Write the whole list through to durable storage after each mutation.
//! - Notify subscribers after every applied mutation.
//!
//! # Invariants
//! - Record ids are unique after `add`, `import_records` and load.
//! - Insertion order is preserved.
//! - Operations on unknown ids are no-ops: no write, no notification.
//! - A failed durable write is logged and never rolls back memory.
//!
//! # See also
//! - `model::record` for the status/progress transition rules.

pub mod export;
pub mod import;
pub mod search;
pub mod stats;

use crate::clock::{Clock, SystemClock};
use crate::model::defaults::default_records;
use crate::model::record::{
    next_status, NewTechnology, RecordId, TechStatus, TechnologyRecord,
};
use crate::storage::KvStore;
use export::{write_export_file, ExportDocument, ExportError};
use import::{parse_import, validate_batch, ImportError, ImportedRecord};
use log::{error, info, warn};
use search::Search;
use stats::{compute_stats, TechnologyStats};
use std::collections::HashSet;
use std::fmt::{Debug, Formatter};
use std::path::{Path, PathBuf};

/// Storage key holding the JSON record array.
pub const DEFAULT_STORAGE_KEY: &str = "technologies";

/// What a mutation changed. Delivered to subscribers with the new snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreChange {
    Added(RecordId),
    StatusChanged {
        ids: Vec<RecordId>,
        status: TechStatus,
    },
    ProgressChanged(RecordId),
    NotesChanged(RecordId),
    Removed(RecordId),
    AllCompleted,
    AllReset,
    Imported(Vec<RecordId>),
}

impl StoreChange {
    fn label(&self) -> &'static str {
        match self {
            Self::Added(_) => "add",
            Self::StatusChanged { .. } => "update_status",
            Self::ProgressChanged(_) => "update_progress",
            Self::NotesChanged(_) => "update_notes",
            Self::Removed(_) => "remove",
            Self::AllCompleted => "mark_all_completed",
            Self::AllReset => "reset_all_statuses",
            Self::Imported(_) => "import",
        }
    }
}

/// Handle returned by `subscribe`, used to unsubscribe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&StoreChange, &[TechnologyRecord])>;

/// Where the initial snapshot came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LoadSource {
    Durable,
    Defaults,
}

/// Write-through store of technology records over a `KvStore`.
pub struct TechnologyStore<S: KvStore> {
    storage: S,
    key: String,
    clock: Box<dyn Clock>,
    records: Vec<TechnologyRecord>,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
    durable_in_sync: bool,
}

impl<S: KvStore> Debug for TechnologyStore<S> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TechnologyStore")
            .field("key", &self.key)
            .field("records", &self.records.len())
            .field("listeners", &self.listeners.len())
            .field("durable_in_sync", &self.durable_in_sync)
            .finish()
    }
}

impl<S: KvStore> TechnologyStore<S> {
    /// Loads the store from `storage` under the default key and wall clock.
    pub fn load(storage: S) -> Self {
        Self::load_with(storage, DEFAULT_STORAGE_KEY, SystemClock)
    }

    /// Loads the store from `storage[key]`.
    ///
    /// Absent, unreadable or unparsable durable state falls back to the
    /// built-in seed list. A corrupt value is left in place until the next
    /// mutation overwrites it.
    pub fn load_with(storage: S, key: impl Into<String>, clock: impl Clock + 'static) -> Self {
        let key = key.into();
        let today = clock.today_iso();
        let (mut records, source) = read_durable(&storage, &key, &today);

        let mut repaired = 0usize;
        let mut dropped = 0usize;
        let mut ids = IdAllocator::above(&records);
        records.retain_mut(|record| {
            if !ids.claim(record.id) {
                let Some(id) = ids.allocate() else {
                    dropped += 1;
                    return false;
                };
                record.id = id;
                repaired += 1;
            }
            record.normalize(&today);
            true
        });
        if repaired > 0 || dropped > 0 {
            warn!(
                "event=store_load module=store status=repaired key={key} reassigned_ids={repaired} dropped={dropped}"
            );
        }

        info!(
            "event=store_load module=store status=ok key={key} source={} records={}",
            match source {
                LoadSource::Durable => "durable",
                LoadSource::Defaults => "defaults",
            },
            records.len()
        );

        Self {
            storage,
            key,
            clock: Box::new(clock),
            records,
            listeners: Vec::new(),
            next_subscription: 0,
            durable_in_sync: source == LoadSource::Durable,
        }
    }

    /// Current snapshot in insertion order.
    pub fn records(&self) -> &[TechnologyRecord] {
        &self.records
    }

    pub fn get(&self, id: RecordId) -> Option<&TechnologyRecord> {
        self.records.iter().find(|record| record.id == id)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Underlying durable storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Whether the last write-through reached durable storage.
    ///
    /// `false` after a failed write, and right after a load that fell back
    /// to the seed list, until the next successful write.
    pub fn is_durable_in_sync(&self) -> bool {
        self.durable_in_sync
    }

    /// Registers a listener called after every applied mutation.
    pub fn subscribe(
        &mut self,
        listener: impl FnMut(&StoreChange, &[TechnologyRecord]) + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Removes a listener. Returns `false` when it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(listener_id, _)| *listener_id != id);
        self.listeners.len() != before
    }

    /// Appends a new `planned` record and returns its id.
    ///
    /// Returns `None` without touching state when `title` or `description`
    /// is blank; richer validation belongs to the caller
    /// (see `model::form::validate_new_technology`).
    pub fn add(&mut self, fields: NewTechnology) -> Option<RecordId> {
        if !fields.has_required_fields() {
            return None;
        }
        let Some(id) = IdAllocator::for_records(&self.records).allocate() else {
            warn!("event=store_add module=store status=rejected error_code=ids_exhausted");
            return None;
        };
        let today = self.clock.today_iso();
        self.records
            .push(TechnologyRecord::from_new(id, fields, &today));
        self.commit(StoreChange::Added(id));
        Some(id)
    }

    /// Moves one record to `status`. Returns `false` for an unknown id.
    pub fn update_status(&mut self, id: RecordId, status: TechStatus) -> bool {
        let today = self.clock.today_iso();
        let Some(record) = self.record_mut(id) else {
            return false;
        };
        record.apply_status(status, &today);
        self.commit(StoreChange::StatusChanged {
            ids: vec![id],
            status,
        });
        true
    }

    /// Advances one record along the status cycle and returns its new status.
    pub fn cycle_status(&mut self, id: RecordId) -> Option<TechStatus> {
        let next = next_status(self.get(id)?.status);
        self.update_status(id, next);
        Some(next)
    }

    /// Sets progress (clamped to 0..=100). Returns `false` for an unknown id.
    pub fn update_progress(&mut self, id: RecordId, progress: i64) -> bool {
        let today = self.clock.today_iso();
        let Some(record) = self.record_mut(id) else {
            return false;
        };
        record.apply_progress(progress, &today);
        self.commit(StoreChange::ProgressChanged(id));
        true
    }

    /// Replaces notes verbatim. Length limits are the caller's concern.
    pub fn update_notes(&mut self, id: RecordId, notes: impl Into<String>) -> bool {
        let Some(record) = self.record_mut(id) else {
            return false;
        };
        record.notes = notes.into();
        self.commit(StoreChange::NotesChanged(id));
        true
    }

    /// Deletes a record. Removing an absent id is a no-op.
    pub fn remove(&mut self, id: RecordId) -> bool {
        let before = self.records.len();
        self.records.retain(|record| record.id != id);
        if self.records.len() == before {
            return false;
        }
        self.commit(StoreChange::Removed(id));
        true
    }

    /// Applies `update_status` to every listed id with a single write.
    ///
    /// Returns the ids that matched, in store order.
    pub fn bulk_update_status(&mut self, ids: &[RecordId], status: TechStatus) -> Vec<RecordId> {
        let wanted = ids.iter().copied().collect::<HashSet<_>>();
        let today = self.clock.today_iso();
        let mut applied = Vec::new();
        for record in self
            .records
            .iter_mut()
            .filter(|record| wanted.contains(&record.id))
        {
            record.apply_status(status, &today);
            applied.push(record.id);
        }
        if !applied.is_empty() {
            self.commit(StoreChange::StatusChanged {
                ids: applied.clone(),
                status,
            });
        }
        applied
    }

    /// Completes every record in one batch.
    pub fn mark_all_completed(&mut self) {
        self.apply_to_all(TechStatus::Completed);
        self.commit(StoreChange::AllCompleted);
    }

    /// Returns every record to `planned` in one batch. `started_at` is kept.
    pub fn reset_all_statuses(&mut self) {
        self.apply_to_all(TechStatus::Planned);
        self.commit(StoreChange::AllReset);
    }

    /// Appends externally supplied records, never overwriting existing ones.
    ///
    /// An incoming id that is missing, non-positive or already taken (by the
    /// store or an earlier record of the batch) is replaced by a fresh id.
    ///
    /// # Errors
    /// - `ImportError::MissingField` when any record lacks `title` or
    ///   `category`; nothing is imported in that case.
    /// - `ImportError::IdsExhausted` when no unused positive id is left for a
    ///   record; nothing is imported in that case either.
    pub fn import_records(
        &mut self,
        incoming: Vec<ImportedRecord>,
    ) -> Result<Vec<RecordId>, ImportError> {
        validate_batch(&incoming)?;

        let mut ids = IdAllocator::for_records(&self.records);
        let mut reassigned = 0usize;
        let mut imported = Vec::with_capacity(incoming.len());
        for (index, item) in incoming.iter().enumerate() {
            let id = match item.id {
                Some(id) if ids.claim(id) => id,
                _ => {
                    reassigned += 1;
                    ids.allocate().ok_or(ImportError::IdsExhausted { index })?
                }
            };
            imported.push(id);
        }

        let today = self.clock.today_iso();
        self.records.extend(
            incoming
                .into_iter()
                .zip(&imported)
                .map(|(item, id)| item.into_record(*id, &today)),
        );

        info!(
            "event=store_import module=store status=ok imported={} reassigned_ids={reassigned}",
            imported.len()
        );
        self.commit(StoreChange::Imported(imported.clone()));
        Ok(imported)
    }

    /// Parses an import file (bare array or export document) and imports it.
    pub fn import_json(&mut self, text: &str) -> Result<Vec<RecordId>, ImportError> {
        match parse_import(text) {
            Ok(records) => self.import_records(records),
            Err(err) => {
                warn!("event=store_import module=store status=rejected error={err}");
                Err(err)
            }
        }
    }

    /// Pretty JSON array of the current snapshot.
    pub fn export_snapshot(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(&self.records)?)
    }

    /// Pretty JSON export document with metadata and counters.
    pub fn export_document(&self) -> Result<String, ExportError> {
        let document = ExportDocument::new(&self.records, self.clock.now_rfc3339());
        Ok(serde_json::to_string_pretty(&document)?)
    }

    /// Writes `export_snapshot()` to `dir/technologies_<today>.json`.
    pub fn write_export(&self, dir: impl AsRef<Path>) -> Result<PathBuf, ExportError> {
        let contents = self.export_snapshot()?;
        write_export_file(dir.as_ref(), self.clock.today(), &contents)
    }

    /// Records matching `term` in title, description or category,
    /// case-insensitively. A blank term yields the whole snapshot.
    pub fn search(&self, term: &str) -> Search<'_> {
        Search::new(&self.records, term)
    }

    /// Records whose category equals `category` exactly.
    pub fn by_category<'a>(
        &'a self,
        category: &'a str,
    ) -> impl Iterator<Item = &'a TechnologyRecord> + Clone + 'a {
        self.records
            .iter()
            .filter(move |record| record.category == category)
    }

    /// Distinct categories in first-seen order.
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.records
            .iter()
            .map(|record| record.category.as_str())
            .filter(|category| seen.insert(*category))
            .collect()
    }

    /// Per-status counts and progress aggregates.
    pub fn stats(&self) -> TechnologyStats {
        compute_stats(&self.records)
    }

    fn record_mut(&mut self, id: RecordId) -> Option<&mut TechnologyRecord> {
        self.records.iter_mut().find(|record| record.id == id)
    }

    fn apply_to_all(&mut self, status: TechStatus) {
        let today = self.clock.today_iso();
        for record in &mut self.records {
            record.apply_status(status, &today);
        }
    }

    fn commit(&mut self, change: StoreChange) {
        self.persist(change.label());
        for (_, listener) in &mut self.listeners {
            listener(&change, &self.records);
        }
    }

    fn persist(&mut self, operation: &str) {
        let payload = match serde_json::to_string(&self.records) {
            Ok(payload) => payload,
            Err(err) => {
                self.durable_in_sync = false;
                error!(
                    "event=store_persist module=store status=error op={operation} error_code=serialize_failed error={err}"
                );
                return;
            }
        };

        match self.storage.set(&self.key, &payload) {
            Ok(()) => {
                self.durable_in_sync = true;
                info!(
                    "event=store_persist module=store status=ok op={operation} records={} bytes={}",
                    self.records.len(),
                    payload.len()
                );
            }
            Err(err) => {
                self.durable_in_sync = false;
                error!(
                    "event=store_persist module=store status=error op={operation} error_code=write_failed error={err}"
                );
            }
        }
    }
}

fn read_durable<S: KvStore>(
    storage: &S,
    key: &str,
    today: &str,
) -> (Vec<TechnologyRecord>, LoadSource) {
    let raw = match storage.get(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return (default_records(today), LoadSource::Defaults),
        Err(err) => {
            error!(
                "event=store_load module=store status=error key={key} error_code=read_failed error={err}"
            );
            return (default_records(today), LoadSource::Defaults);
        }
    };

    match serde_json::from_str::<Vec<TechnologyRecord>>(&raw) {
        Ok(records) => (records, LoadSource::Durable),
        Err(err) => {
            error!(
                "event=store_load module=store status=error key={key} error_code=parse_failed error={err}"
            );
            (default_records(today), LoadSource::Defaults)
        }
    }
}

/// Hands out unused positive ids.
///
/// Ids count upward from the largest existing id. Once that would pass
/// `RecordId::MAX`, the lowest unused positive id is handed out instead.
struct IdAllocator {
    taken: HashSet<RecordId>,
    next: Option<RecordId>,
}

impl IdAllocator {
    /// Counts from above every id in `records` without claiming any of them.
    fn above(records: &[TechnologyRecord]) -> Self {
        let max = records.iter().map(|record| record.id).max().unwrap_or(0);
        Self {
            taken: HashSet::with_capacity(records.len()),
            next: max.max(0).checked_add(1),
        }
    }

    /// Like `above`, with every id in `records` already claimed.
    fn for_records(records: &[TechnologyRecord]) -> Self {
        let mut ids = Self::above(records);
        for record in records {
            ids.claim(record.id);
        }
        ids
    }

    /// Claims `id` if it is positive and unused.
    fn claim(&mut self, id: RecordId) -> bool {
        id > 0 && self.taken.insert(id)
    }

    fn allocate(&mut self) -> Option<RecordId> {
        while let Some(id) = self.next {
            self.next = id.checked_add(1);
            if self.taken.insert(id) {
                return Some(id);
            }
        }
        let id = (1..=RecordId::MAX).find(|id| !self.taken.contains(id))?;
        self.taken.insert(id);
        Some(id)
    }
}

#[cfg(test)]
mod tests {
    use super::IdAllocator;
    use crate::model::record::{NewTechnology, RecordId, TechnologyRecord};

    fn records(ids: &[RecordId]) -> Vec<TechnologyRecord> {
        ids.iter()
            .map(|id| {
                TechnologyRecord::from_new(*id, NewTechnology::new("T", "D", ""), "2026-10-19")
            })
            .collect()
    }

    #[test]
    fn allocator_counts_past_the_largest_id() {
        let mut ids = IdAllocator::for_records(&records(&[3, 1]));
        assert!(!ids.claim(3));
        assert!(ids.claim(5));
        assert_eq!(ids.allocate(), Some(4));
        assert_eq!(ids.allocate(), Some(6));
    }

    #[test]
    fn allocator_fills_gaps_once_the_range_is_exhausted() {
        let mut ids = IdAllocator::for_records(&records(&[1, RecordId::MAX]));
        assert_eq!(ids.allocate(), Some(2));
        assert_eq!(ids.allocate(), Some(3));
        assert!(!ids.claim(0));
        assert!(!ids.claim(-4));
    }
}
