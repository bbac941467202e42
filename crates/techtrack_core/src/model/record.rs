//! Technology record model and status transitions.
//!
//! # Responsibility
//! - Define `TechnologyRecord`, the only entity owned by the store.
//! - Apply status/progress changes while keeping date stamps consistent.
//! - Normalize records arriving from durable state or imports.
//!
//! # Invariants
//! - `status == Completed` iff `progress == 100` and `completed_at` is set.
//! - `status == InProgress` implies `started_at` is set.
//! - `started_at` is never cleared by a transition.
//! - Leaving `Completed` clears `completed_at`.

use serde::{Deserialize, Deserializer, Serialize};

/// Store-unique identifier of a record.
pub type RecordId = i64;

/// Maximum notes length accepted by the notes editor.
pub const NOTES_MAX_CHARS: usize = 1000;

/// Category assigned when a caller leaves it blank.
pub const DEFAULT_CATEGORY: &str = "other";

/// Difficulty assigned when a caller leaves it blank.
pub const DEFAULT_DIFFICULTY: &str = "beginner";

/// Learning status of one technology.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TechStatus {
    /// Not started yet.
    #[default]
    Planned,
    /// Actively being learned.
    InProgress,
    /// Finished; progress is 100.
    Completed,
    /// Started and put on hold.
    Paused,
}

impl TechStatus {
    /// Every status in display order.
    pub const ALL: [TechStatus; 4] = [
        TechStatus::Planned,
        TechStatus::InProgress,
        TechStatus::Completed,
        TechStatus::Paused,
    ];

    /// Stable wire label (`planned|in-progress|completed|paused`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Planned => "planned",
            Self::InProgress => "in-progress",
            Self::Completed => "completed",
            Self::Paused => "paused",
        }
    }

    /// Parses a wire label. Labels outside the canonical set are rejected.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim() {
            "planned" => Some(Self::Planned),
            "in-progress" => Some(Self::InProgress),
            "completed" => Some(Self::Completed),
            "paused" => Some(Self::Paused),
            _ => None,
        }
    }
}

/// Next status for single-click cycling:
/// `planned -> in-progress -> completed -> paused -> planned`.
///
/// This is a UI policy; `TechnologyStore::update_status` accepts any target.
pub fn next_status(current: TechStatus) -> TechStatus {
    match current {
        TechStatus::Planned => TechStatus::InProgress,
        TechStatus::InProgress => TechStatus::Completed,
        TechStatus::Completed => TechStatus::Paused,
        TechStatus::Paused => TechStatus::Planned,
    }
}

/// One tracked technology.
///
/// Date fields hold ISO dates (`YYYY-MM-DD`) and use the empty string for
/// "unset", matching the persisted JSON layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnologyRecord {
    pub id: RecordId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub difficulty: String,
    #[serde(default)]
    pub status: TechStatus,
    /// Stored values outside 0..=100 (or fractional) are clamped on decode.
    #[serde(default, deserialize_with = "deserialize_progress")]
    pub progress: u8,
    #[serde(default)]
    pub notes: String,
    #[serde(default)]
    pub started_at: String,
    #[serde(default)]
    pub completed_at: String,
    #[serde(default)]
    pub created_at: String,
    #[serde(default)]
    pub deadline: String,
    #[serde(default)]
    pub resources: Vec<String>,
}

/// Caller-supplied fields for a new record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewTechnology {
    pub title: String,
    pub description: String,
    pub category: String,
    pub difficulty: String,
    pub deadline: String,
    pub resources: Vec<String>,
}

impl NewTechnology {
    /// Shorthand for the three text fields most callers provide.
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            category: category.into(),
            ..Self::default()
        }
    }

    /// Whether the required text fields are present.
    pub fn has_required_fields(&self) -> bool {
        !self.title.trim().is_empty() && !self.description.trim().is_empty()
    }
}

impl TechnologyRecord {
    /// Builds a fresh `planned` record created on `today`.
    pub fn from_new(id: RecordId, fields: NewTechnology, today: &str) -> Self {
        let category = non_blank_or(fields.category, DEFAULT_CATEGORY);
        let difficulty = non_blank_or(fields.difficulty, DEFAULT_DIFFICULTY);
        Self {
            id,
            title: fields.title.trim().to_string(),
            description: fields.description.trim().to_string(),
            category,
            difficulty,
            status: TechStatus::Planned,
            progress: 0,
            notes: String::new(),
            started_at: String::new(),
            completed_at: String::new(),
            created_at: today.to_string(),
            deadline: fields.deadline.trim().to_string(),
            resources: fields
                .resources
                .into_iter()
                .map(|resource| resource.trim().to_string())
                .filter(|resource| !resource.is_empty())
                .collect(),
        }
    }

    /// Moves this record to `status`, stamping or clearing dates.
    ///
    /// - Entering `Completed` forces progress 100 and stamps `completed_at`.
    /// - Entering `InProgress` stamps `started_at` when unset.
    /// - Entering `Planned` resets progress to 0.
    /// - Leaving `Completed` clears `completed_at` and resets progress to 0.
    pub fn apply_status(&mut self, status: TechStatus, today: &str) {
        if self.status == TechStatus::Completed && status != TechStatus::Completed {
            self.completed_at.clear();
            self.progress = 0;
        }

        match status {
            TechStatus::Planned => self.progress = 0,
            TechStatus::InProgress => stamp_if_unset(&mut self.started_at, today),
            TechStatus::Completed => {
                self.progress = 100;
                stamp_if_unset(&mut self.completed_at, today);
            }
            TechStatus::Paused => {}
        }

        self.status = status;
    }

    /// Sets progress (clamped to 0..=100) and derives the status from it.
    ///
    /// - 100 completes the record.
    /// - Below 100 on a completed record reopens it as `InProgress`.
    /// - Above 0 on a planned record promotes it to `InProgress`.
    pub fn apply_progress(&mut self, progress: i64, today: &str) {
        let progress = clamp_progress(progress);

        if progress == 100 {
            self.apply_status(TechStatus::Completed, today);
            return;
        }

        match self.status {
            TechStatus::Completed => {
                self.apply_status(TechStatus::InProgress, today);
            }
            TechStatus::Planned if progress > 0 => {
                self.apply_status(TechStatus::InProgress, today);
            }
            _ => {}
        }
        self.progress = progress;
    }

    /// Repairs a record loaded from outside the store so invariants hold.
    pub fn normalize(&mut self, today: &str) {
        self.progress = self.progress.min(100);

        if self.status == TechStatus::Completed || self.progress == 100 {
            self.status = TechStatus::Completed;
            self.progress = 100;
            stamp_if_unset(&mut self.completed_at, today);
        } else {
            self.completed_at.clear();
        }

        if self.status == TechStatus::InProgress {
            stamp_if_unset(&mut self.started_at, today);
        }
        stamp_if_unset(&mut self.created_at, today);

        if self.category.trim().is_empty() {
            self.category = DEFAULT_CATEGORY.to_string();
        }
    }

    /// Case-insensitive match of an already-lowercased needle against
    /// title, description and category.
    pub(crate) fn matches_lowercase(&self, needle: &str) -> bool {
        [&self.title, &self.description, &self.category]
            .iter()
            .any(|field| field.to_lowercase().contains(needle))
    }
}

/// Clamps an arbitrary integer into the 0..=100 progress range.
pub fn clamp_progress(value: i64) -> u8 {
    // Bounded by the clamp, so the cast is lossless.
    value.clamp(0, 100) as u8
}

fn deserialize_progress<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    // `as` saturates on out-of-range floats, then the clamp bounds it.
    let raw = Option::<f64>::deserialize(deserializer)?;
    Ok(raw.map_or(0, |value| clamp_progress(value.round() as i64)))
}

fn stamp_if_unset(field: &mut String, today: &str) {
    if field.is_empty() {
        field.push_str(today);
    }
}

fn non_blank_or(value: String, fallback: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        fallback.to_string()
    } else {
        trimmed.to_string()
    }
}
