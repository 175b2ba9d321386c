//! Shared helper functions for CLI commands
//!
//! This module contains utility functions that are used across multiple
//! command modules to avoid code duplication.

use miette::Result;
use serde::de::DeserializeOwned;
use std::path::PathBuf;

use crate::core::identity::{EntityId, EntityPrefix};
use crate::core::loader;
use crate::core::project::Project;
use crate::core::shortid::ShortIdIndex;

/// Format an EntityId for display, truncating if too long
///
/// IDs longer than 16 characters are truncated to 13 chars with "..." suffix.
/// This provides a consistent display format across all list/table outputs.
pub fn format_short_id(id: &EntityId) -> String {
    let s = id.to_string();
    if s.len() > 16 {
        format!("{}...", &s[..13])
    } else {
        s
    }
}

/// Truncate a string to max_len, adding "..." if truncated
///
/// Useful for table columns that need fixed-width output.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..max_len.saturating_sub(3)])
    }
}

/// Escape a string for CSV output
///
/// Handles commas, quotes, and newlines according to RFC 4180.
pub fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Resolve a user-supplied reference (`@N`, full or partial ID) and load
/// the matching record of the given type.
///
/// Returns the file path alongside the record so callers can write back
/// after mutating.
pub fn load_record<T: DeserializeOwned + 'static>(
    project: &Project,
    prefix: EntityPrefix,
    reference: &str,
    kind: &str,
) -> Result<(PathBuf, T)> {
    let short_ids = ShortIdIndex::load(project);
    let resolved = short_ids
        .resolve(reference)
        .unwrap_or_else(|| reference.to_string());

    loader::load_entity(&project.entity_dir(prefix), &resolved)?
        .ok_or_else(|| miette::miette!("No {} found matching '{}'", kind, reference))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_short_id() {
        let id = EntityId::new(EntityPrefix::Cons);
        let formatted = format_short_id(&id);
        // ULID IDs are 31 chars (4 prefix + 1 dash + 26 ULID), so should truncate
        assert!(formatted.len() <= 16);
        assert!(formatted.ends_with("..."));
    }

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
    }

    #[test]
    fn test_escape_csv() {
        assert_eq!(escape_csv("simple"), "simple");
        assert_eq!(escape_csv("with,comma"), "\"with,comma\"");
        assert_eq!(escape_csv("with\"quote"), "\"with\"\"quote\"");
        assert_eq!(escape_csv("with\nnewline"), "\"with\nnewline\"");
    }
}
