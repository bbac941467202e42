//! Caller-side validation for add/edit forms.
//!
//! # Responsibility
//! - Check user input before it reaches `TechnologyStore::add`.
//! - Report every failing field at once so forms can highlight them.
//!
//! # Invariants
//! - The store never calls these checks itself; its own guard is limited
//!   to rejecting blank required fields.

use crate::model::record::{NewTechnology, NOTES_MAX_CHARS};
use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::BTreeMap;
use std::error::Error;
use std::fmt::{Display, Formatter};

const TITLE_MIN_CHARS: usize = 2;
const TITLE_MAX_CHARS: usize = 50;
const DESCRIPTION_MIN_CHARS: usize = 10;

static ISO_DATE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date regex"));
static RESOURCE_URL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^https?://[^\s/$.?#][^\s]*$").expect("valid url regex"));

/// Field-keyed validation failures.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormErrors {
    fields: BTreeMap<String, String>,
}

impl FormErrors {
    fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.fields.entry(field.into()).or_insert_with(|| message.into());
    }

    /// Message for one field, if it failed.
    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    fn into_result(self) -> Result<(), FormErrors> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }
}

impl Display for FormErrors {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut first = true;
        for (field, message) in &self.fields {
            if !first {
                f.write_str("; ")?;
            }
            write!(f, "{field}: {message}")?;
            first = false;
        }
        Ok(())
    }
}

impl Error for FormErrors {}

/// Validates add/edit form input against `today`.
///
/// # Errors
/// - `title` blank or outside 2..=50 characters.
/// - `description` blank or shorter than 10 characters.
/// - `deadline` set but not a `YYYY-MM-DD` date, or earlier than `today`.
/// - `resources[i]` non-blank and not an `http(s)://` URL.
pub fn validate_new_technology(input: &NewTechnology, today: NaiveDate) -> Result<(), FormErrors> {
    let mut errors = FormErrors::default();

    let title = input.title.trim();
    let title_len = title.chars().count();
    if title.is_empty() {
        errors.push("title", "title is required");
    } else if title_len < TITLE_MIN_CHARS {
        errors.push(
            "title",
            format!("title must be at least {TITLE_MIN_CHARS} characters"),
        );
    } else if title_len > TITLE_MAX_CHARS {
        errors.push(
            "title",
            format!("title must be at most {TITLE_MAX_CHARS} characters"),
        );
    }

    let description = input.description.trim();
    if description.is_empty() {
        errors.push("description", "description is required");
    } else if description.chars().count() < DESCRIPTION_MIN_CHARS {
        errors.push(
            "description",
            format!("description must be at least {DESCRIPTION_MIN_CHARS} characters"),
        );
    }

    let deadline = input.deadline.trim();
    if !deadline.is_empty() {
        match parse_iso_date(deadline) {
            Some(date) if date < today => {
                errors.push("deadline", "deadline cannot be in the past");
            }
            Some(_) => {}
            None => errors.push("deadline", "deadline must be a YYYY-MM-DD date"),
        }
    }

    for (index, resource) in input.resources.iter().enumerate() {
        let resource = resource.trim();
        if !resource.is_empty() && !RESOURCE_URL_RE.is_match(resource) {
            errors.push(
                format!("resources[{index}]"),
                "resource must be an http(s) URL",
            );
        }
    }

    errors.into_result()
}

/// Checks the notes editor limit.
pub fn validate_notes(notes: &str) -> Result<(), FormErrors> {
    let mut errors = FormErrors::default();
    if notes.chars().count() > NOTES_MAX_CHARS {
        errors.push(
            "notes",
            format!("notes must be at most {NOTES_MAX_CHARS} characters"),
        );
    }
    errors.into_result()
}

/// Parses a strict `YYYY-MM-DD` date.
pub fn parse_iso_date(value: &str) -> Option<NaiveDate> {
    if !ISO_DATE_RE.is_match(value) {
        return None;
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d").ok()
}
