//! Domain model for tracked technologies.
//!
//! # Responsibility
//! - Define the canonical record shape persisted by the store.
//! - Own the status/progress transition rules so every caller shares them.
//! - Provide caller-side form validation for add/edit flows.
//!
//! # Invariants
//! - Every record is identified by a store-unique integer `RecordId`.
//! - `completed` status, `progress == 100` and a non-empty `completedAt`
//!   always agree after any transition helper runs.

pub mod defaults;
pub mod form;
pub mod record;
