//! Assorted helpers that don't belong to one pipeline stage
pub mod path_helpers;
