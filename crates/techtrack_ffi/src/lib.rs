//! Flutter-facing bindings for the technology tracker core.

pub mod api;
