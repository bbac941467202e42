//! Import payload parsing and validation.
//!
//! # Responsibility
//! - Accept both import shapes: a bare array of records, or an export
//!   document carrying a `technologies` array.
//! - Validate every incoming record before the store mutates anything.
//!
//! # Invariants
//! - A payload is accepted or rejected as a whole.
//! - Incoming ids are hints only; the store decides the final id.

use crate::model::record::{
    clamp_progress, RecordId, TechStatus, TechnologyRecord, DEFAULT_DIFFICULTY,
};
use serde::Deserialize;
use serde_json::Value;
use std::error::Error;
use std::fmt::{Display, Formatter};

/// Typed failure for a rejected import.
#[derive(Debug)]
pub enum ImportError {
    /// Input is not valid JSON.
    InvalidJson(serde_json::Error),
    /// JSON is neither an array nor an object with a `technologies` array.
    UnsupportedShape,
    /// One element cannot be decoded into a record.
    InvalidRecord { index: usize, message: String },
    /// One element lacks a required non-empty text field.
    MissingField { index: usize, field: &'static str },
    /// No unused positive id is left for the record at `index`.
    IdsExhausted { index: usize },
}

impl Display for ImportError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvalidJson(err) => write!(f, "import is not valid JSON: {err}"),
            Self::UnsupportedShape => write!(
                f,
                "import must be an array or an object with a `technologies` array"
            ),
            Self::InvalidRecord { index, message } => {
                write!(f, "import record #{index} is invalid: {message}")
            }
            Self::MissingField { index, field } => {
                write!(f, "import record #{index} is missing `{field}`")
            }
            Self::IdsExhausted { index } => {
                write!(f, "no free id left for import record #{index}")
            }
        }
    }
}

impl Error for ImportError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidJson(err) => Some(err),
            _ => None,
        }
    }
}

/// Loosely shaped record as found in import files.
///
/// Everything is optional at the decode step; `validate` enforces the
/// required fields afterwards so errors can name the offending record.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImportedRecord {
    pub id: Option<RecordId>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<String>,
    pub difficulty: Option<String>,
    pub status: Option<TechStatus>,
    pub progress: Option<i64>,
    pub notes: Option<String>,
    pub started_at: Option<String>,
    pub completed_at: Option<String>,
    pub created_at: Option<String>,
    pub deadline: Option<String>,
    pub resources: Option<Vec<String>>,
}

impl ImportedRecord {
    /// Minimal record with the two required fields.
    pub fn new(title: impl Into<String>, category: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            category: Some(category.into()),
            ..Self::default()
        }
    }

    fn validate(&self, index: usize) -> Result<(), ImportError> {
        if is_blank(self.title.as_deref()) {
            return Err(ImportError::MissingField {
                index,
                field: "title",
            });
        }
        if is_blank(self.category.as_deref()) {
            return Err(ImportError::MissingField {
                index,
                field: "category",
            });
        }
        Ok(())
    }

    /// Converts into a normalized store record under `id`.
    pub(crate) fn into_record(self, id: RecordId, today: &str) -> TechnologyRecord {
        let mut record = TechnologyRecord {
            id,
            title: self.title.unwrap_or_default().trim().to_string(),
            description: self.description.unwrap_or_default(),
            category: self.category.unwrap_or_default().trim().to_string(),
            difficulty: self
                .difficulty
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_DIFFICULTY.to_string()),
            status: self.status.unwrap_or_default(),
            progress: clamp_progress(self.progress.unwrap_or(0)),
            notes: self.notes.unwrap_or_default(),
            started_at: self.started_at.unwrap_or_default(),
            completed_at: self.completed_at.unwrap_or_default(),
            created_at: self.created_at.unwrap_or_default(),
            deadline: self.deadline.unwrap_or_default(),
            resources: self.resources.unwrap_or_default(),
        };
        record.normalize(today);
        record
    }
}

/// Validates an in-memory batch; the first failing record rejects it.
pub fn validate_batch(records: &[ImportedRecord]) -> Result<(), ImportError> {
    records
        .iter()
        .enumerate()
        .try_for_each(|(index, record)| record.validate(index))
}

/// Parses an import file in either accepted shape and validates it.
pub fn parse_import(text: &str) -> Result<Vec<ImportedRecord>, ImportError> {
    let value: Value = serde_json::from_str(text).map_err(ImportError::InvalidJson)?;

    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut object) => match object.remove("technologies") {
            Some(Value::Array(items)) => items,
            _ => return Err(ImportError::UnsupportedShape),
        },
        _ => return Err(ImportError::UnsupportedShape),
    };

    let records = items
        .into_iter()
        .enumerate()
        .map(|(index, item)| {
            serde_json::from_value::<ImportedRecord>(item).map_err(|err| {
                ImportError::InvalidRecord {
                    index,
                    message: err.to_string(),
                }
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    validate_batch(&records)?;
    Ok(records)
}

fn is_blank(value: Option<&str>) -> bool {
    value.map_or(true, |text| text.trim().is_empty())
}
